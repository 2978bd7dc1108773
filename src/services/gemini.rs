// src/services/gemini.rs

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    config::Config,
    services::completion::{CompletionError, CompletionService},
};

/// `generateContent` client for the Gemini REST API.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    endpoint: Url,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl GeminiClient {
    pub fn new(client: Client, config: &Config) -> Result<Self, url::ParseError> {
        let base = format!("{}/", config.gemini_base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&base)?
            .join(&format!("models/{}:generateContent", config.gemini_model))?;

        Ok(Self {
            client,
            api_key: config.gemini_api_key.clone(),
            endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionService for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let body = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [RequestPart { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(CompletionError::Api {
                status: status.as_u16(),
                message: api_error_message(&bytes),
            });
        }

        let parsed: GenerateResponse = serde_json::from_slice(&bytes)
            .map_err(|e| CompletionError::Transport(format!("malformed response: {}", e)))?;

        response_text(parsed)
    }
}

fn api_error_message(bytes: &[u8]) -> String {
    match serde_json::from_slice::<ApiErrorBody>(bytes) {
        Ok(body) => body.error.message,
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Concatenates the text parts of the first candidate.
fn response_text(response: GenerateResponse) -> Result<String, CompletionError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(CompletionError::EmptyResponse(format!("prompt blocked: {}", reason)));
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(CompletionError::EmptyResponse("no candidates".to_string()));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
        return Err(CompletionError::EmptyResponse(format!("finish reason {}", reason)));
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{net::IpAddr, time::Duration};

    fn config(base: &str) -> Config {
        Config {
            gemini_api_key: "key".to_string(),
            gemini_model: "gemini-2.5-flash".to_string(),
            gemini_base_url: base.to_string(),
            ngrok_authtoken: None,
            ngrok_bin: "ngrok".to_string(),
            ngrok_api_url: "http://127.0.0.1:4040".to_string(),
            host: IpAddr::from([127, 0, 0, 1]),
            port: 5000,
            generation_timeout: Duration::from_secs(20),
            max_inflight_generations: 4,
            rust_log: "error".to_string(),
        }
    }

    #[test]
    fn endpoint_keeps_the_version_path() {
        for base in [
            "https://generativelanguage.googleapis.com/v1beta",
            "https://generativelanguage.googleapis.com/v1beta/",
        ] {
            let client = GeminiClient::new(Client::new(), &config(base)).unwrap();
            assert_eq!(
                client.endpoint().as_str(),
                "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
            );
        }
    }

    #[test]
    fn request_body_matches_generate_content_shape() {
        let body = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [RequestPart { text: "hi" }],
            }],
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"contents": [{"role": "user", "parts": [{"text": "hi"}]}]})
        );
    }

    #[test]
    fn joins_text_parts_of_first_candidate() {
        let response: GenerateResponse = serde_json::from_value(serde_json::json!({
            "candidates": [
                {"content": {"parts": [{"text": "[{\"a\":"}, {"text": "1}]"}]}, "finishReason": "STOP"},
                {"content": {"parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();
        assert_eq!(response_text(response).unwrap(), "[{\"a\":1}]");
    }

    #[test]
    fn blocked_prompt_is_an_error() {
        let response: GenerateResponse = serde_json::from_value(serde_json::json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap();
        let err = response_text(response).unwrap_err();
        assert_eq!(err.to_string(), "empty response: prompt blocked: SAFETY");
    }

    #[test]
    fn candidate_without_text_reports_finish_reason() {
        let response: GenerateResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{"finishReason": "MAX_TOKENS"}]
        }))
        .unwrap();
        let err = response_text(response).unwrap_err();
        assert_eq!(err.to_string(), "empty response: finish reason MAX_TOKENS");
    }

    #[test]
    fn api_errors_surface_the_provider_message() {
        let body = br#"{"error": {"code": 400, "message": "API key not valid.", "status": "INVALID_ARGUMENT"}}"#;
        assert_eq!(api_error_message(body), "API key not valid.");
        assert_eq!(api_error_message(b"Bad Gateway"), "Bad Gateway");
    }
}
