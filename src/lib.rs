pub mod api;
pub mod config;
pub mod model;
pub mod seed;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;

// Export all model types
pub use model::*;

// Export store types
pub use store::{PostgresStore, Store};

use std::sync::Arc;

use axum::serve;
use tokio::net::TcpListener;

use crate::config::AppConfig;

/// Build the pool, serve until a shutdown signal arrives, then close the pool.
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let database_url = config.database_url()?;
    let store = PostgresStore::connect(&database_url, &config.database).await?;
    log::info!(
        "Connected to PostgreSQL (max_connections={}, min_connections={})",
        config.database.max_connections,
        config.database.min_connections
    );

    if config.database.run_migrations {
        log::info!("Running database migrations...");
        store.migrate().await?;
    }

    // Load seed data for demonstration (optional)
    if std::env::var("LOAD_SEED_DATA").unwrap_or_default() == "true" {
        log::info!("Loading seed data...");
        seed::load_seed_data(store.pool()).await?;
    }

    let store = Arc::new(store);
    let app = routes::create_app(store.clone(), &config.server);

    let bind_address = config.server_address();
    let listener = TcpListener::bind(&bind_address).await?;
    log::info!("Northwind API listening on http://{}", bind_address);

    serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Shutting down, closing connection pool");
    store.close().await;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for ctrl-c: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to listen for SIGTERM: {}", e);
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
}
