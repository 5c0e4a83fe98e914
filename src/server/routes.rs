use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::error::ApiError;
use crate::scoring::{RiskBand, ScoringContext};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub default_probability: f64,
    pub risk_band: RiskBand,
}

/// Routes over a shared scoring context (no middleware)
pub fn router(ctx: Arc<ScoringContext>) -> Router {
    Router::new()
        .route("/score", post(score))
        .route("/health", get(health))
        .with_state(ctx)
}

async fn score(
    State(ctx): State<Arc<ScoringContext>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ScoreResponse>, ApiError> {
    let Json(body) = body?;
    let outcome = ctx.score_json(&body)?;

    tracing::debug!(
        probability = outcome.probability,
        band = %outcome.risk_band,
        substitutions = outcome.substitutions.len(),
        "applicant scored"
    );

    Ok(Json(ScoreResponse {
        default_probability: outcome.probability,
        risk_band: outcome.risk_band,
    }))
}

async fn health(State(ctx): State<Arc<ScoringContext>>) -> Json<Value> {
    Json(json!({ "status": "ok", "features": ctx.feature_count() }))
}
