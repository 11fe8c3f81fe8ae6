//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use super::{
    handler::{debug_queue_state, debug_session_state, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Matching-and-signaling WebSocket server
///
/// Encapsulates the shared application state plus the handle of the matching
/// scheduler task, which is stopped when the server shuts down.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(app_state, scheduler_handle);
/// server.run("127.0.0.1".to_string(), 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    scheduler_handle: JoinHandle<()>,
}

impl Server {
    /// Create a new Server instance
    ///
    /// # Arguments
    ///
    /// * `state` - shared application state (use cases, registry, repositories)
    /// * `scheduler_handle` - handle of the spawned matching scheduler
    pub fn new(state: Arc<AppState>, scheduler_handle: JoinHandle<()>) -> Self {
        Self {
            state,
            scheduler_handle,
        }
    }

    /// Run the server
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address
    /// or if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        // Define handlers
        let app = Router::new()
            // WebSocket endpoint (all matching/signaling events)
            .route("/ws", get(websocket_handler))
            // HTTP endpoints
            .route("/api/health", get(health_check))
            .route("/debug/queue", get(debug_queue_state))
            .route("/debug/sessions", get(debug_session_state))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state);

        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        // Start the server
        tracing::info!(
            "Matching server listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        // Set up graceful shutdown signal handler
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        // Stop the matching scheduler; every cycle mutation is all-or-nothing,
        // so aborting between cycles cannot corrupt the stores.
        self.scheduler_handle.abort();
        tracing::info!("Matching scheduler stopped");
        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
