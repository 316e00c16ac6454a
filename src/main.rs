//! Identity reputation server HTTP entrypoint.
//!
//! This binary launches an Axum-based HTTP server exposing the trust-graph
//! surface: signed vouch/proof/punish actions, role management, and balance
//! queries.
//!
//! Endpoints:
//! - `POST /vouch/{user}` – signed vouch for a user
//! - `GET /idt/{user}` – read a user's IDT balance
//! - `POST /proof/{user}` – moderator sets a proof balance
//! - `POST /punish/{user}` – moderator issues a penalty
//! - `GET /is_moderator/{user}`, `GET /moderators` – moderator queries
//! - `POST /add_moderator/{user}`, `POST /remove_moderator/{user}` – admin role grants
//! - `GET /is_admin/{user}`, `GET /admins` – admin queries
//! - `POST /add_admin/{user}`, `POST /remove_admin/{user}` – admin set management
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `HOST`, `PORT` control the binding address (default 0.0.0.0:8000)
//! - `admins.json`, `moderators.json`, `genesis.json` seed state if present

use axum::Router;
use axum::http::Method;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tower_http::cors;

use idt_server::bootstrap;
use idt_server::config::Config;
use idt_server::handlers;
use idt_server::service::IdentityService;
use idt_server::telemetry::Telemetry;

/// Initializes the identity server.
///
/// - Loads `.env` variables.
/// - Registers tracing.
/// - Ingests bootstrap state files.
/// - Starts an Axum HTTP server with the trust-graph handlers.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env variables
    dotenv().ok();

    let telemetry = Telemetry::new()
        .with_name(env!("CARGO_PKG_NAME"))
        .with_version(env!("CARGO_PKG_VERSION"))
        .register();

    let config = Config::load()?;

    let service = Arc::new(IdentityService::new());
    bootstrap::load_state_files(&service, &config)?;

    let http_endpoints = Router::new()
        .merge(handlers::routes().with_state(service))
        .layer(telemetry.http_tracing())
        .layer(
            cors::CorsLayer::new()
                .allow_origin(cors::Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(cors::Any),
        );

    let addr = SocketAddr::new(config.host(), config.port());
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        });

    // Serve until SIGTERM or SIGINT, then drain in-flight requests.
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let graceful_shutdown = async move {
        tokio::select! {
            _ = sigterm.recv() => {}
            _ = sigint.recv() => {}
        }
        tracing::info!("shutdown signal received");
    };
    axum::serve(listener, http_endpoints)
        .with_graceful_shutdown(graceful_shutdown)
        .await?;

    Ok(())
}
