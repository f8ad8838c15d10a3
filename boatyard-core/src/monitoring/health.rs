//! Health checks for the cache store and the boat repository

use crate::boat::BoatRepository;
use crate::clock::SharedClock;
use crate::kvs::{KeyValueStore, PONG};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Health check status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// The worse of two statuses
    fn worst(self, other: HealthStatus) -> HealthStatus {
        match (self, other) {
            (HealthStatus::Unhealthy, _) | (_, HealthStatus::Unhealthy) => HealthStatus::Unhealthy,
            (HealthStatus::Degraded, _) | (_, HealthStatus::Degraded) => HealthStatus::Degraded,
            _ => HealthStatus::Healthy,
        }
    }

    /// Still able to serve requests
    pub fn is_operational(&self) -> bool {
        !matches!(self, HealthStatus::Unhealthy)
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResponse {
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub uptime_seconds: u64,
    pub checks: Vec<ComponentHealth>,
}

/// Individual component health
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentHealth {
    pub component: String,
    pub status: HealthStatus,
    pub message: Option<String>,
    pub last_check: DateTime<Utc>,
}

/// Health checker
pub struct HealthChecker {
    store: Arc<dyn KeyValueStore>,
    repository: Arc<dyn BoatRepository>,
    clock: SharedClock,
    started_at: DateTime<Utc>,
}

impl HealthChecker {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        repository: Arc<dyn BoatRepository>,
        clock: SharedClock,
    ) -> Self {
        let started_at = clock.now();
        Self {
            store,
            repository,
            clock,
            started_at,
        }
    }

    /// Check every component
    ///
    /// A cache outage only degrades the service since reads fall back to the
    /// repository. An unreachable repository makes it unhealthy.
    pub fn check_health(&self) -> HealthCheckResponse {
        let now = self.clock.now();
        let checks = vec![self.check_cache(now), self.check_repository(now)];
        let status = checks
            .iter()
            .fold(HealthStatus::Healthy, |acc, check| acc.worst(check.status));

        HealthCheckResponse {
            status,
            timestamp: now,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: (now - self.started_at).num_seconds().max(0) as u64,
            checks,
        }
    }

    fn check_cache(&self, now: DateTime<Utc>) -> ComponentHealth {
        let (status, message) = match self.store.ping() {
            Ok(reply) if reply == PONG => (HealthStatus::Healthy, None),
            Ok(reply) => (
                HealthStatus::Degraded,
                Some(format!("Unexpected ping reply: {}", reply)),
            ),
            Err(e) => {
                warn!(error = %e, "Cache store health check failed");
                (HealthStatus::Degraded, Some(e.to_string()))
            }
        };

        ComponentHealth {
            component: "cache".to_string(),
            status,
            message,
            last_check: now,
        }
    }

    fn check_repository(&self, now: DateTime<Utc>) -> ComponentHealth {
        let (status, message) = if self.repository.is_reachable() {
            (HealthStatus::Healthy, None)
        } else {
            warn!("Boat repository unreachable");
            (
                HealthStatus::Unhealthy,
                Some("Repository unreachable".to_string()),
            )
        };

        ComponentHealth {
            component: "repository".to_string(),
            status,
            message,
            last_check: now,
        }
    }
}
