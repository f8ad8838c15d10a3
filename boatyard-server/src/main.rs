//! Boatyard Server - boat REST API with response caching and rate limiting

use anyhow::{Context, Result};
use boatyard_core::boat::InMemoryBoatRepository;
use boatyard_core::cache_aside::CacheAside;
use boatyard_core::clock::{SharedClock, SystemClock};
use boatyard_core::config::{BoatyardConfig, ConfigManager, LogLevel};
use boatyard_core::kvs::{ExpirySweeper, MemoryStore};
use boatyard_core::monitoring::{init_logging, HealthChecker};
use boatyard_core::ratelimit::RateLimiter;
use boatyard_core::service::BoatService;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

mod http;

#[derive(Parser, Debug)]
#[command(name = "boatyard-server")]
#[command(about = "Boatyard - boat REST API with response caching and rate limiting")]
#[command(version)]
struct Args {
    /// Configuration file path (created with defaults if missing)
    #[arg(short = 'c', long, env = "BOATYARD_CONFIG", default_value = "boatyard.toml")]
    config: PathBuf,

    /// HTTP bind address
    #[arg(short = 'H', long, env = "BOATYARD_HOST")]
    host: Option<String>,

    /// HTTP port
    #[arg(short = 'p', long, env = "PORT")]
    port: Option<u16>,

    /// Disable per-client rate limiting
    #[arg(long)]
    no_rate_limit: bool,

    /// Enable debug logging
    #[arg(short = 'd', long)]
    debug: bool,
}

impl Args {
    fn apply(&self, config: &mut BoatyardConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if self.no_rate_limit {
            config.rate_limit.enabled = false;
        }
        if self.debug {
            config.logging.level = LogLevel::Debug;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config_manager = ConfigManager::new(args.config.clone())?;
    config_manager.update(|config| args.apply(config))?;
    let config = config_manager.config().clone();

    init_logging(&config.logging)?;

    info!("Boatyard Server v{} starting", env!("CARGO_PKG_VERSION"));
    info!("Configuration:");
    info!("  • Config File: {}", config_manager.config_path().display());
    info!("  • Listen Address: {}:{}", config.server.host, config.server.port);
    info!("  • Query Cache TTL: {}s", config.cache.query_ttl_secs);
    if config.rate_limit.enabled {
        info!(
            "  • Rate Limit: {} requests / {}s",
            config.rate_limit.max_requests, config.rate_limit.window_secs
        );
    } else {
        info!("  • Rate Limit: disabled");
    }

    let clock: SharedClock = Arc::new(SystemClock);
    let store = Arc::new(MemoryStore::new(clock.clone()));
    let sweeper = ExpirySweeper::spawn(
        store.clone(),
        Duration::from_millis(config.cache.sweep_interval_ms),
    );

    let repository = Arc::new(InMemoryBoatRepository::new(clock.clone()));
    let service = BoatService::new(
        repository.clone(),
        CacheAside::new(store.clone(), config.cache.query_ttl_secs),
        clock.clone(),
    );
    let limiter = config
        .rate_limit
        .enabled
        .then(|| RateLimiter::new(store.clone(), config.rate_limit.limiter_config()));

    let state = Arc::new(http::AppState {
        service,
        limiter,
        health: HealthChecker::new(store.clone(), repository, clock),
        store,
    });

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    let result = http::serve(addr, state, http::shutdown_signal()).await;

    sweeper.shutdown().await;
    info!("Boatyard Server shutdown complete");

    result
}
