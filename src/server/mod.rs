//! HTTP scoring service
//!
//! `POST /score` and `GET /health` over an immutable [`ScoringContext`]
//! shared as axum state.

pub mod error;
pub mod routes;

pub use error::ApiError;
pub use routes::{router, ScoreResponse};

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::scoring::ScoringContext;

/// CORS policy: any origin when `origins` is empty, otherwise only those listed
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() {
        return Ok(layer.allow_origin(Any));
    }

    let values = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o).with_context(|| format!("Invalid CORS origin: '{}'", o))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(layer.allow_origin(AllowOrigin::list(values)))
}

/// Full application: routes plus CORS and request tracing
pub fn app(ctx: Arc<ScoringContext>, cors_origins: &[String]) -> Result<Router> {
    Ok(router(ctx)
        .layer(cors_layer(cors_origins)?)
        .layer(TraceLayer::new_for_http()))
}

/// Bind `addr` and serve until Ctrl-C
pub async fn serve(ctx: Arc<ScoringContext>, addr: SocketAddr, cors_origins: &[String]) -> Result<()> {
    if cors_origins.is_empty() {
        tracing::warn!("CORS allows any origin; pass --cors-origin to restrict it");
    }

    let app = app(ctx, cors_origins)?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(addr = %listener.local_addr()?, "scoring service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("scoring service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
