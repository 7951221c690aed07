use anyhow::Result;
use tokio::net::TcpListener;
use tracing::{info, debug, trace, error};

use crate::config::initialize_app_state;
use crate::router::create_router;

pub async fn serve(database_url: &str, bind_address: &str) -> Result<()> {
    trace!("Entering serve function");
    info!("Adverts service starting up");
    debug!("Bind address: {}", bind_address);

    // Initialize application state
    let state = match initialize_app_state(database_url).await {
        Ok(state) => {
            debug!("Application state initialized successfully");
            state
        }
        Err(e) => {
            error!("Failed to initialize application state: {}", e);
            return Err(e);
        }
    };
    let db = state.db.clone();

    let app = create_router(state);

    info!("Starting server on {}", bind_address);
    let listener = match TcpListener::bind(&bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to address {}: {}", bind_address, e);
            return Err(e.into());
        }
    };

    info!("Adverts API server running on http://{}", bind_address);
    info!("Swagger UI available at http://{}/swagger-ui", bind_address);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    debug!("Closing database connection pool");
    db.close().await?;

    info!("Server shutdown gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        // Without a signal handler the server runs until killed
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
