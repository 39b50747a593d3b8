//! Axum server setup and router construction

pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::board::BoardService;
use crate::config::ServerConfig;
use crate::error::{CoboardError, Result};

pub use handlers::AppState;

/// CORS policy for browser clients
///
/// An empty origin list allows any origin.
pub fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origin = if config.allowed_origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(
            config
                .allowed_origins
                .iter()
                .filter_map(|o| match o.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!("Ignoring invalid CORS origin: {}", o);
                        None
                    }
                }),
        )
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ])
}

/// Build the full axum router
///
/// The router serves:
/// - the chat and meta function endpoints under `/functions/v1`
/// - conversation, message and point management under `/api`
/// - `/health`
///
/// Unknown routes and unsupported methods answer with the JSON error body.
pub fn build_router(service: Arc<BoardService>) -> Router {
    let cors = cors_layer(&service.config().server);

    Router::new()
        .route("/functions/v1/chat", post(handlers::chat))
        .route("/functions/v1/meta", post(handlers::meta))
        .route(
            "/api/conversations",
            get(handlers::list_conversations).post(handlers::create_conversation),
        )
        .route(
            "/api/conversations/:id",
            patch(handlers::rename_conversation).delete(handlers::delete_conversation),
        )
        .route("/api/conversations/:id/messages", get(handlers::list_messages))
        .route("/api/conversations/:id/points", get(handlers::list_points))
        .route("/api/conversations/:id/export", get(handlers::export_analysis))
        .route("/api/points/:id", axum::routing::delete(handlers::delete_point))
        .route("/api/points/:id/hide", post(handlers::hide_point))
        .route("/api/points/:id/restore", post(handlers::restore_point))
        .route("/health", get(handlers::health))
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .fallback(handlers::route_not_found)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(service)
}

fn parse_bind_addr(bind_addr: &str) -> Result<SocketAddr> {
    bind_addr.parse().map_err(|_| {
        CoboardError::Config(format!("Invalid bind address: {}", bind_addr)).into()
    })
}

/// Bind the configured address and serve until Ctrl-C
pub async fn serve(service: Arc<BoardService>) -> Result<()> {
    let addr = parse_bind_addr(&service.config().server.bind_addr)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Co-Pilot Board listening on http://{}", listener.local_addr()?);

    axum::serve(listener, build_router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Start the server in the background and return the bound address
///
/// Binding port 0 picks a free port.
pub async fn start_server(service: Arc<BoardService>) -> Result<SocketAddr> {
    let addr = parse_bind_addr(&service.config().server.bind_addr)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    let router = build_router(service);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok(local)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
