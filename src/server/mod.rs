//! HTTP server for the estimation service
//!
//! Exposes the REST endpoints of the planning assistant plus the
//! `/api/invoke` command proxy. Both call into the same command layer.

mod proxy;
pub mod rest;
pub mod routes;
pub mod state;

pub use proxy::{invoke_handler, status_for, ApiError, InvokeRequest, InvokeResponse};
pub use state::ServerAppState;

use crate::config::ServerConfig;
use axum::{
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue,
    },
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Version information for the server
#[derive(serde::Serialize)]
struct VersionInfo {
    name: String,
    version: String,
}

fn cors_layer(cors_origins: &[String]) -> CorsLayer {
    if cors_origins.is_empty() {
        // Permissive CORS: allow any origin (default for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers([CONTENT_TYPE, ACCEPT])
    } else {
        let allowed_origins: Vec<HeaderValue> = cors_origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    log::warn!("Ignoring invalid CORS origin: {}", o);
                    None
                }
            })
            .collect();
        CorsLayer::new()
            .allow_origin(allowed_origins)
            .allow_methods(Any)
            .allow_headers([CONTENT_TYPE, ACCEPT])
    }
}

/// Build the application router with all routes and layers
pub fn build_router(state: ServerAppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/api", get(rest::root_handler))
        .route("/api/", get(rest::root_handler))
        .route("/api/chat/start", post(rest::start_conversation_handler))
        .route("/api/chat/:conversation_id", post(rest::post_message_handler))
        .route(
            "/api/chat/:conversation_id/decomposition",
            post(rest::submit_decomposition_handler),
        )
        .route("/api/analyze/:conversation_id", post(rest::analyze_handler))
        .route("/api/estimates/:project_id", get(rest::get_estimate_handler))
        .route(
            "/api/estimates/:project_id/export",
            get(rest::export_estimate_handler),
        )
        .route(
            "/api/conversations/:conversation_id",
            get(rest::get_conversation_handler).delete(rest::delete_conversation_handler),
        )
        .route("/api/invoke", post(proxy::invoke_handler))
        .route("/api/version", get(version_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .with_state(state)
}

/// Run the HTTP server until the shutdown flag is raised
pub async fn run_server(server: &ServerConfig, state: ServerAppState) -> Result<(), String> {
    let addr: SocketAddr = format!("{}:{}", server.bind, server.port)
        .parse()
        .map_err(|e| format!("Invalid address: {}", e))?;

    let cors_display = if server.cors_origins.is_empty() {
        "*".to_string()
    } else {
        server.cors_origins.join(", ")
    };
    let rate_count = state.config.rates.table.len();
    let shutdown_state = state.shutdown_state.clone();
    let app = build_router(state);

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                  Project Estimator Server                    ║");
    println!("╠══════════════════════════════════════════════════════════════╣");
    println!("║  Server URL: {:<48}║", format!("http://{}", addr));
    println!("║  CORS Origins: {:<46}║", cors_display);
    println!("║  Role rates loaded: {:<41}║", rate_count);
    println!("║                                                              ║");
    println!("║  Endpoints:                                                  ║");
    println!("║    POST /api/chat/start          - Start a conversation      ║");
    println!("║    POST /api/analyze/:id         - Run PERT/CPM analysis     ║");
    println!("║    GET  /api/estimates/:project  - Latest estimate           ║");
    println!("║    POST /api/invoke              - Command proxy             ║");
    println!("║    GET  /health                  - Health check              ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    log::info!("Server listening on http://{}", addr);

    let shutdown_signal = async move {
        while !shutdown_state.is_shutdown_requested() {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
        log::info!("Shutdown signal received, stopping server...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| format!("Server error: {}", e))
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

async fn version_handler() -> Json<VersionInfo> {
    Json(VersionInfo {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
