use super::{ChatBackend, ChatRequest, Message};
use crate::config::AppConfig;
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, REFERER};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("endpoint answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid reply from endpoint: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("request task ended without a reply")]
    Cancelled,
}

/// Posts the whole conversation to the relay endpoint and returns its reply.
pub struct RelayClient {
    http: reqwest::Client,
    url: String,
    referer: Option<String>,
}

impl RelayClient {
    pub fn new(config: &AppConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(ClientError::Build)?;

        Ok(Self {
            http,
            url: config.api_url.clone(),
            referer: config.referer.clone().filter(|r| !r.trim().is_empty()),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ChatBackend for RelayClient {
    fn name(&self) -> &str {
        "relay"
    }

    async fn send(&self, request: &ChatRequest) -> Result<Message, ClientError> {
        let body = serde_json::to_vec(request)?;
        tracing::info!("POST {} ({} messages, {} bytes)", self.url, request.messages.len(), body.len());

        let mut req = self
            .http
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body);
        if let Some(referer) = &self.referer {
            req = req.header(REFERER, referer);
        }

        let transport = |source| ClientError::Transport {
            url: self.url.clone(),
            source,
        };
        let response = req.send().await.map_err(transport)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(transport)?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            tracing::warn!("Endpoint returned HTTP {}: {}", status, crate::utils::truncate_string(&body, 200));
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let message: Message = serde_json::from_slice(&bytes)?;
        Ok(message)
    }
}
