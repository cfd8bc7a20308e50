use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::retry::retry_with_backoff;
use crate::types::AnalysisRequest;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/";
const API_VERSION: &str = "2023-06-01";

/// Sends a prompt to a hosted language model and returns its text answer.
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    async fn complete(&self, request: &AnalysisRequest) -> Result<String, AnalysisError>;
}

/// Client for the Anthropic Messages API.
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicClient {
    /// # Errors
    ///
    /// Returns [`AnalysisError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
    ) -> Result<Self, AnalysisError> {
        Self::with_base_url(
            api_key,
            model,
            timeout_secs,
            user_agent,
            max_retries,
            backoff_base_secs,
            DEFAULT_BASE_URL,
        )
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Http`] if the `reqwest::Client` cannot be
    /// built, or [`AnalysisError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        user_agent: &str,
        max_retries: u32,
        backoff_base_secs: u64,
        base_url: &str,
    ) -> Result<Self, AnalysisError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| AnalysisError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            model: model.to_owned(),
            base_url,
            max_retries,
            backoff_base_ms: backoff_base_secs.saturating_mul(1000),
        })
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn send_once(&self, url: &Url, request: &AnalysisRequest) -> Result<String, AnalysisError> {
        let system = request.system.trim();
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            system: (!system.is_empty()).then_some(system),
            messages: [Message {
                role: "user",
                content: &request.prompt,
            }],
        };

        let response = self
            .client
            .post(url.clone())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnalysisError::Timeout
                } else {
                    AnalysisError::Http(e)
                }
            })?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(30);
            return Err(AnalysisError::RateLimited { retry_after_secs });
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AnalysisError::Auth {
                status: status.as_u16(),
            });
        }
        // 529 is the API's "overloaded" status.
        if status.is_server_error() || status.as_u16() == 529 {
            return Err(AnalysisError::Unavailable {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::UnexpectedStatus {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        let text = response.text().await?;
        extract_text(&text)
    }
}

/// Concatenate the text blocks of a Messages API response body.
fn extract_text(body: &str) -> Result<String, AnalysisError> {
    let parsed: MessagesResponse =
        serde_json::from_str(body).map_err(|e| AnalysisError::Malformed {
            reason: e.to_string(),
        })?;
    let text = parsed
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join("\n");
    let text = text.trim();
    if text.is_empty() {
        return Err(AnalysisError::Malformed {
            reason: "response contained no text".to_owned(),
        });
    }
    Ok(text.to_owned())
}

#[async_trait]
impl AnalysisClient for AnthropicClient {
    async fn complete(&self, request: &AnalysisRequest) -> Result<String, AnalysisError> {
        let url = self
            .base_url
            .join("v1/messages")
            .map_err(|e| AnalysisError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;

        let text = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            self.send_once(&url, request)
        })
        .await?;

        tracing::debug!(model = %self.model, chars = text.len(), "analysis completed");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_text_joins_text_blocks() {
        let body = r#"{"content":[
            {"type":"text","text":"first"},
            {"type":"tool_use","id":"x","name":"n","input":{}},
            {"type":"text","text":"second"}
        ]}"#;
        assert_eq!(extract_text(body).unwrap(), "first\nsecond");
    }

    #[test]
    fn extract_text_rejects_empty_content() {
        let result = extract_text(r#"{"content":[]}"#);
        assert!(matches!(result, Err(AnalysisError::Malformed { .. })));
    }

    #[test]
    fn extract_text_rejects_non_json() {
        let result = extract_text("<html>oops</html>");
        assert!(matches!(result, Err(AnalysisError::Malformed { .. })));
    }

    #[test]
    fn request_omits_blank_system() {
        let body = MessagesRequest {
            model: "m",
            max_tokens: 10,
            system: None,
            messages: [Message {
                role: "user",
                content: "hi",
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("system").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
