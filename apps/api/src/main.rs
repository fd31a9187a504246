//! # Vitrina API Server
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Vitrina API Server                             │
//! │                                                                         │
//! │  env ──► ApiConfig ──► Database (SQLite, migrations) ──► AppState       │
//! │                                                             │           │
//! │                                                             ▼           │
//! │              Ctrl+C / SIGTERM ──► graceful shutdown ◄── axum::serve     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vitrina_api::config::ApiConfig;
use vitrina_api::{create_router, AppState};
use vitrina_core::PaymentRules;
use vitrina_db::{Database, DbConfig, EngineConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting Vitrina API server...");

    let config = ApiConfig::load()?;
    info!(
        addr = %config.bind_address(),
        db = %config.database_path.display(),
        branch = %config.default_branch,
        "Configuration loaded"
    );

    let db = Database::new(DbConfig::new(config.database_path.clone()).max_connections(config.max_connections)).await?;
    info!("Database ready");

    let engine_config = EngineConfig {
        payment_rules: PaymentRules::default().with_manual_labels(&config.manual_labels),
        ..EngineConfig::default()
    }
    .with_default_branch(config.default_branch.clone());

    let app = create_router(AppState::new(db.clone(), engine_config));

    let listener = TcpListener::bind(config.bind_address()).await?;
    info!(addr = %config.bind_address(), "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,vitrina=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
