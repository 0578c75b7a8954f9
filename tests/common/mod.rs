#![allow(dead_code)]

use clap::Parser;
use plantfix_chat::ai::{display_items, DisplayItem, Message};
use plantfix_chat::config::AppConfig;
use plantfix_chat::relay::{router, RelayConfig, RelayState};
use std::sync::Arc;

pub const TEST_ORIGIN: &str = "http://localhost:5173";

/// Relay settings pointing at a mock upstream.
pub fn relay_config(upstream_url: &str, extra: &[&str]) -> RelayConfig {
    let mut argv = vec![
        "plantfix-relay",
        "--api-key",
        "sk-test",
        "--upstream-url",
        upstream_url,
        "--allow-origin",
        TEST_ORIGIN,
    ];
    argv.extend_from_slice(extra);
    RelayConfig::try_parse_from(argv).expect("valid relay args")
}

/// Serves the relay on an ephemeral port and returns its base URL.
pub async fn spawn_relay(config: RelayConfig) -> (String, Arc<RelayState>) {
    let state = Arc::new(RelayState::new(&config).expect("relay state"));
    let app = router(state.clone(), &config.allowed_origins);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("relay server");
    });

    (format!("http://{}", addr), state)
}

pub fn app_config(api_url: &str) -> AppConfig {
    AppConfig {
        api_url: api_url.to_string(),
        request_timeout_secs: 10,
        ..AppConfig::default()
    }
}

/// A port nothing is listening on.
pub async fn closed_port_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    format!("http://{}", addr)
}

pub fn upstream_reply(text: &str) -> String {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": text },
            "finish_reason": "stop"
        }]
    })
    .to_string()
}

/// Text parts of a message joined with newlines.
pub fn message_text(message: &Message) -> String {
    display_items(&message.content)
        .into_iter()
        .filter_map(|item| match item {
            DisplayItem::Text(text) => Some(text.to_string()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}
