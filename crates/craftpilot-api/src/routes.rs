//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, and all endpoint
//! handlers.

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS middleware: allow localhost origins for dashboard access.
    // Use the configured API port plus port+1 for a dev server.
    let port = state
        .config
        .lock()
        .map(|c| c.server.api_port)
        .unwrap_or(9877);
    let dev_port = port.saturating_add(1);
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([
            format!("http://127.0.0.1:{}", port)
                .parse::<HeaderValue>()
                .unwrap(),
            format!("http://localhost:{}", port)
                .parse::<HeaderValue>()
                .unwrap(),
            format!("http://127.0.0.1:{}", dev_port)
                .parse::<HeaderValue>()
                .unwrap(),
            format!("http://localhost:{}", dev_port)
                .parse::<HeaderValue>()
                .unwrap(),
        ]))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/status", get(handlers::status))
        .route("/api/prompt", post(handlers::prompt))
        .route("/api/stop", post(handlers::stop))
        .route("/api/instances", get(handlers::instances))
        .route("/api/instances/{id}/connect", post(handlers::connect))
        .route("/api/stream", get(handlers::stream))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server on the given port.
///
/// Binds to 127.0.0.1 (localhost only).
pub async fn start_server(port: u16, state: AppState) -> craftpilot_core::Result<()> {
    let addr = format!("127.0.0.1:{}", port);

    let router = create_router(state);

    tracing::info!("Starting API server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| craftpilot_core::CraftError::Api(format!("Failed to bind: {}", e)))?;

    axum::serve(listener, router)
        .await
        .map_err(|e| craftpilot_core::CraftError::Api(format!("Server error: {}", e)))?;

    Ok(())
}
