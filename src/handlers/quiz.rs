// src/handlers/quiz.rs

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde_json::Value;

use crate::{
    error::AppError,
    models::quiz::QuizRequest,
    services::{extract::extract_json_array, generator::QuizGenerator, prompt::build_quiz_prompt},
};

/// Generates a 5-question multiple-choice quiz about the requested topic.
///
/// * Builds the prompt and sends it to the model under the generation budget.
/// * Extracts the JSON array from the model text and relays it as-is.
/// * Any failure becomes a 500 with a one-question placeholder (see `AppError`).
pub async fn generate_quiz(
    State(generator): State<QuizGenerator>,
    payload: Result<Json<QuizRequest>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(req) = payload?;
    let topic = req.topic();
    tracing::info!("Generating quiz about {:?}", topic);

    let raw = generator.generate(build_quiz_prompt(&topic)).await?;

    let quiz: Value = serde_json::from_str(extract_json_array(&raw)).map_err(|e| {
        tracing::debug!("Unparsable model output: {}", raw);
        AppError::from(e)
    })?;

    tracing::info!(
        "Quiz generated with {} questions",
        quiz.as_array().map_or(0, Vec::len)
    );

    Ok(Json(quiz))
}
