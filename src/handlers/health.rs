// src/handlers/health.rs

use axum::{Json, extract::State};
use serde_json::{Value, json};

use crate::{config::Config, services::generator::QuizGenerator};

/// Liveness probe reporting the configured model and free generation slots.
pub async fn health(
    State(config): State<Config>,
    State(generator): State<QuizGenerator>,
) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model": config.gemini_model,
        "timeout_secs": config.generation_timeout.as_secs(),
        "available_slots": generator.available_permits(),
    }))
}
