use super::error::RelayError;
use crate::ai::Message;
use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Value],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: Message,
}

/// Non-streaming client for an OpenAI-style chat completions endpoint.
pub struct UpstreamClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
    max_tokens: Option<u32>,
}

impl UpstreamClient {
    pub fn new(url: String, api_key: String, max_tokens: Option<u32>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url,
            api_key,
            max_tokens,
        })
    }

    /// Returns the first choice's message.
    pub async fn complete(&self, model: &str, messages: &[Value]) -> Result<Message, RelayError> {
        let request = CompletionRequest {
            model,
            messages,
            stream: false,
            max_tokens: self.max_tokens,
        };

        if tracing::enabled!(tracing::Level::DEBUG) {
            if let Ok(pretty) = serde_json::to_string_pretty(&request) {
                tracing::debug!("Sending to upstream: {}", crate::utils::truncate_string(&pretty, 2000));
            }
        }

        let response = self
            .http
            .post(&self.url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(RelayError::Transport)?;

        let status = response.status();
        let body = response.bytes().await.map_err(RelayError::Transport)?;

        if status.as_u16() >= 400 {
            let body = String::from_utf8_lossy(&body).into_owned();
            tracing::error!("Upstream error response ({}): {}", status, body);
            return Err(RelayError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse = serde_json::from_slice(&body).map_err(RelayError::Parse)?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or(RelayError::NoChoices)
    }
}
