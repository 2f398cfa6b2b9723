//! Guildhall Runtime Crate
//!
//! Service bootstrap shared by the server binary: configuration loading,
//! database initialization, telemetry, and the shutdown signal.

use anyhow::Context;
use sqlx::SqlitePool;
use tracing::info;

use guildhall_config::AppConfig;

pub mod telemetry;

/// The initialized backbone of the application.
pub struct Services {
    pub config: AppConfig,
    pub pool: SqlitePool,
}

impl Services {
    /// Load configuration, open the database pool, and apply migrations.
    pub async fn initialise() -> anyhow::Result<Self> {
        let config = guildhall_config::load().context("failed to load configuration")?;

        let pool = guildhall_database::initialize_database(&config.database)
            .await
            .context("failed to initialize database")?;

        info!(database = %config.database.url, "services initialised");

        Ok(Self { config, pool })
    }
}

/// Resolves when the process receives SIGINT or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => tracing::error!(%error, "failed to install sigterm handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received");
}
