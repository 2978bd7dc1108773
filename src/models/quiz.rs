// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;

pub const DEFAULT_TOPIC: &str = "General Knowledge";

/// Body of `POST /generate-quiz`.
#[derive(Debug, Default, Deserialize)]
pub struct QuizRequest {
    /// Any JSON value; missing and `null` both fall back to [`DEFAULT_TOPIC`].
    #[serde(default)]
    pub topic: Option<Value>,
}

impl QuizRequest {
    /// The topic as prompt text. Strings are used verbatim, other values
    /// in their JSON form.
    pub fn topic(&self) -> Cow<'_, str> {
        match &self.topic {
            None | Some(Value::Null) => Cow::Borrowed(DEFAULT_TOPIC),
            Some(Value::String(topic)) => Cow::Borrowed(topic),
            Some(other) => Cow::Owned(other.to_string()),
        }
    }
}

/// One multiple-choice question as the model is asked to produce it.
///
/// The model output itself is relayed as parsed JSON without shape checks;
/// this type describes the contract and backs the placeholder payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    #[serde(rename = "correctIndex")]
    pub correct_index: i64,
}

pub type QuizResult = Vec<QuizQuestion>;

impl QuizQuestion {
    /// Builds a synthetic question used to carry an error to quiz clients.
    pub fn placeholder(question: &str, options: [&str; 4]) -> Self {
        Self {
            question: question.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_index: 0,
        }
    }
}
