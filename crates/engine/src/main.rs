//! bizflow engine server
//!
//! Serves the activity execution API over HTTP, backed by PostgreSQL.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bizflow_engine::{
    config::{AppConfig, DatabaseConfig, EngineConfig},
    db::{create_pool, init_schema, schema::missing_tables},
    engine::ActivityEngine,
    router::build_router,
    state::AppState,
    store::PgStore,
};
use bizflow_executors::default_registry;

/// Initialize tracing/logging.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,bizflow_engine=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting bizflow engine"
    );

    let app_config = AppConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load app config, using defaults");
        AppConfig::default()
    });

    let db_config = DatabaseConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load database config, using defaults");
        DatabaseConfig::default()
    });

    let engine_config = EngineConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load engine config, using defaults");
        EngineConfig::default()
    });

    tracing::info!(
        host = %app_config.host,
        port = app_config.port,
        debug = app_config.debug,
        context_update_retries = engine_config.context_update_retries,
        executor_timeout_ms = ?engine_config.executor_timeout_ms,
        "Configuration loaded"
    );

    let db_pool = create_pool(&db_config).await?;

    if app_config.init_schema {
        init_schema(&db_pool).await?;
    } else {
        let missing = missing_tables(&db_pool).await?;
        if !missing.is_empty() {
            tracing::warn!(missing = ?missing, "Database schema is incomplete");
        }
    }

    let registry = default_registry();
    tracing::info!(executors = ?registry.codes(), "Executors registered");

    let store = Arc::new(PgStore::new(db_pool.clone()));
    let engine = ActivityEngine::with_store(store, Arc::new(registry), engine_config);
    let state = AppState::new(Some(db_pool), engine, app_config.clone());

    let app = build_router(state);

    let addr: SocketAddr = app_config.bind_address().parse()?;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
