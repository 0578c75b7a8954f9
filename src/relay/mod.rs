//! HTTP relay between the chat window and the upstream completions API.
//!
//! The relay owns the API key, so clients never see it. It accepts the same
//! `{ model?, messages }` body the chat window sends and answers with a single
//! assistant message.

pub mod error;
pub mod upstream;

use crate::ai::Message;
use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use clap::Parser;
use serde::Deserialize;
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

pub use self::error::RelayError;
use self::upstream::UpstreamClient;

pub const DEFAULT_UPSTREAM_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o";

fn default_origins() -> Vec<String> {
    [
        "https://almg-walsh.github.io",
        "http://localhost:3000",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
        "http://127.0.0.1:3000",
    ]
    .iter()
    .map(|o| o.to_string())
    .collect()
}

#[derive(Debug, Clone, Parser)]
#[command(name = "plantfix-relay", about = "Relays chat requests to an OpenAI-compatible completions API")]
pub struct RelayConfig {
    /// Address to listen on
    #[arg(long, env = "RELAY_BIND", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Upstream API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: String,

    #[arg(long, env = "UPSTREAM_URL", default_value = DEFAULT_UPSTREAM_URL)]
    pub upstream_url: String,

    /// Model used when the request does not name one
    #[arg(long, env = "DEFAULT_MODEL", default_value = DEFAULT_MODEL)]
    pub default_model: String,

    /// Browser origins allowed by CORS; `*` mirrors any origin
    #[arg(long = "allow-origin", env = "ALLOWED_ORIGINS", value_delimiter = ',', default_values_t = default_origins())]
    pub allowed_origins: Vec<String>,

    /// Keep one process-wide history and forward all of it on every request
    #[arg(long, env = "SHARED_HISTORY")]
    pub shared_history: bool,

    #[arg(long, env = "MAX_TOKENS")]
    pub max_tokens: Option<u32>,

    #[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value_t = 120)]
    pub upstream_timeout_secs: u64,
}

/// Incoming body. Messages stay raw JSON so they reach the upstream exactly
/// as the caller sent them.
#[derive(Debug, Deserialize)]
struct RelayRequest {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    messages: Vec<Value>,
}

pub struct RelayState {
    upstream: UpstreamClient,
    default_model: String,
    shared_history: bool,
    history: Mutex<Vec<Value>>,
}

impl RelayState {
    pub fn new(config: &RelayConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(anyhow::anyhow!("OPENAI_API_KEY must be set"));
        }

        let upstream = UpstreamClient::new(
            config.upstream_url.clone(),
            config.api_key.clone(),
            config.max_tokens,
            Duration::from_secs(config.upstream_timeout_secs),
        )
        .context("building upstream HTTP client")?;

        Ok(Self {
            upstream,
            default_model: config.default_model.clone(),
            shared_history: config.shared_history,
            history: Mutex::new(Vec::new()),
        })
    }

    pub async fn history_len(&self) -> usize {
        self.history.lock().await.len()
    }

    async fn relay(&self, request: RelayRequest) -> Result<Message, RelayError> {
        let model = request
            .model
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.default_model.clone());

        let messages = if self.shared_history {
            let mut history = self.history.lock().await;
            history.extend(request.messages);
            history.clone()
        } else {
            request.messages
        };

        tracing::info!(model = %model, messages = messages.len(), "Relaying chat request");
        let reply = self.upstream.complete(&model, &messages).await?;

        if self.shared_history {
            let stored = serde_json::to_value(&reply).map_err(RelayError::Parse)?;
            self.history.lock().await.push(stored);
        }
        Ok(reply)
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        let values: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!("Ignoring invalid origin {:?}", o);
                    None
                }
            })
            .collect();
        AllowOrigin::list(values)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}

pub fn router(state: Arc<RelayState>, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/", post(chat_handler).options(|| async { StatusCode::OK }))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// The body is decoded by hand so a missing or wrong Content-Type is not an error.
async fn chat_handler(State(state): State<Arc<RelayState>>, body: Bytes) -> Result<Json<Message>, RelayError> {
    let request: RelayRequest = serde_json::from_slice(&body).map_err(RelayError::InvalidBody)?;
    let reply = state.relay(request).await?;
    Ok(Json(reply))
}

pub async fn serve(config: RelayConfig) -> Result<()> {
    let state = Arc::new(RelayState::new(&config)?);
    let app = router(state, &config.allowed_origins);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("binding {}", config.bind))?;
    tracing::info!("Relay running on http://{}", config.bind);
    tracing::info!(upstream = %config.upstream_url, model = %config.default_model, shared_history = config.shared_history, "Relay configured");

    axum::serve(listener, app).await.context("relay server failed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> RelayConfig {
        let mut argv = vec!["plantfix-relay"];
        argv.extend_from_slice(args);
        RelayConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_match_the_public_deployment() {
        let config = parse(&["--api-key", "sk-test", "--allow-origin", "http://localhost:5173"]);
        assert_eq!(config.bind, "0.0.0.0:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.default_model, DEFAULT_MODEL);
        assert_eq!(config.upstream_url, DEFAULT_UPSTREAM_URL);
        assert!(!config.shared_history);
        assert!(config.max_tokens.is_none());
        assert_eq!(config.allowed_origins, vec!["http://localhost:5173".to_string()]);
    }

    #[test]
    fn origins_split_on_commas() {
        let config = parse(&["--api-key", "k", "--allow-origin", "http://a.test,http://b.test"]);
        assert_eq!(config.allowed_origins, vec!["http://a.test".to_string(), "http://b.test".to_string()]);
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let config = parse(&["--api-key", " "]);
        assert!(RelayState::new(&config).is_err());
    }
}
