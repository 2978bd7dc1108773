// src/error.rs

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use std::fmt;

use crate::models::quiz::{QuizQuestion, QuizResult};

/// Header carrying the machine-readable failure kind next to the placeholder body.
pub static ERROR_KIND_HEADER: HeaderName = HeaderName::from_static("x-quiz-error");

/// Failure kinds of the quiz endpoint.
///
/// Every variant is rendered as HTTP 500 with a one-element array holding a
/// synthetic question, so quiz clients can display it like any other quiz.
#[derive(Debug)]
pub enum AppError {
    /// The model call did not finish within the configured budget.
    Timeout,

    /// The model call failed (transport, API error, empty or blocked answer).
    ModelFailure(String),

    /// Anything else, including a model answer that is not valid JSON.
    UnexpectedFailure(String),
}

impl AppError {
    /// Machine-readable kind sent in the `x-quiz-error` header.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Timeout => "timeout",
            AppError::ModelFailure(_) => "model_error",
            AppError::UnexpectedFailure(_) => "unexpected_error",
        }
    }

    /// The placeholder question clients render for this failure.
    pub fn placeholder(&self) -> QuizQuestion {
        match self {
            AppError::Timeout => QuizQuestion::placeholder(
                "Server Timeout",
                ["Try Again", "Check Internet", "Reduce Topic Size", "Wait"],
            ),
            AppError::ModelFailure(_) => QuizQuestion::placeholder(
                "Gemini Error",
                ["Try Again", "Wrong API Key?", "Check Server Logs", "Unknown Error"],
            ),
            AppError::UnexpectedFailure(_) => QuizQuestion::placeholder(
                "Unexpected Server Error",
                ["Try Again", "Check Logs", "Restart Server", "Error"],
            ),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Timeout => write!(f, "model call timed out"),
            AppError::ModelFailure(msg) => write!(f, "model call failed: {}", msg),
            AppError::UnexpectedFailure(msg) => write!(f, "unexpected failure: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts the error into the 500 placeholder response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Timeout => tracing::warn!("Quiz generation timed out"),
            AppError::ModelFailure(msg) => tracing::error!("Gemini Error: {}", msg),
            AppError::UnexpectedFailure(msg) => {
                tracing::error!("Unexpected Server Error: {}", msg)
            }
        }

        let headers = [(
            ERROR_KIND_HEADER.clone(),
            HeaderValue::from_static(self.kind()),
        )];
        let body: QuizResult = vec![self.placeholder()];

        (StatusCode::INTERNAL_SERVER_ERROR, headers, Json(body)).into_response()
    }
}

/// Request bodies that fail to deserialize surface as unexpected failures.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::UnexpectedFailure(rejection.body_text())
    }
}

/// Model output that does not parse after extraction.
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::UnexpectedFailure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn render(err: AppError) -> (StatusCode, String, Vec<QuizQuestion>) {
        let response = err.into_response();
        let status = response.status();
        let kind = response.headers()[&ERROR_KIND_HEADER]
            .to_str()
            .unwrap()
            .to_string();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, kind, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn timeout_renders_server_timeout_placeholder() {
        let (status, kind, body) = render(AppError::Timeout).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(kind, "timeout");
        assert_eq!(body.len(), 1);
        assert_eq!(body[0].question, "Server Timeout");
        assert_eq!(body[0].options[2], "Reduce Topic Size");
        assert_eq!(body[0].correct_index, 0);
    }

    #[tokio::test]
    async fn model_failure_hides_the_cause_from_clients() {
        let (status, kind, body) =
            render(AppError::ModelFailure("API key not valid".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(kind, "model_error");
        assert_eq!(body[0].question, "Gemini Error");
        assert!(body[0].options.iter().all(|o| !o.contains("API key not valid")));
    }

    #[tokio::test]
    async fn parse_errors_become_unexpected_failures() {
        let err: AppError = serde_json::from_str::<serde_json::Value>("garbage")
            .unwrap_err()
            .into();
        let (_, kind, body) = render(err).await;
        assert_eq!(kind, "unexpected_error");
        assert_eq!(body[0].question, "Unexpected Server Error");
    }
}
