//! Logging setup, health checks and statistics reporting

pub mod health;
pub mod logging;
pub mod stats;

pub use health::{ComponentHealth, HealthCheckResponse, HealthChecker, HealthStatus};
pub use logging::{default_directives, init_logging};
pub use stats::collect_stats;
