pub mod attachment;
pub mod client;
pub mod session;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use self::client::ClientError;

pub const ROLE_USER: &str = "user";
pub const ROLE_ASSISTANT: &str = "assistant";
pub const ROLE_SYSTEM: &str = "system";

/// A conversation turn as it travels over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default = "Message::default_role")]
    pub role: String,
    #[serde(default)]
    pub content: MessageContent,
}

/// Content is either a plain string or a list of typed parts. Replies from
/// the endpoint are not validated, so anything else is kept verbatim,
/// including part lists that contain a part type not modelled here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
    /// Sibling fields such as `detail`, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ImageUrl {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            extra: serde_json::Map::new(),
        }
    }
}

/// Body of a single POST to the chat endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// A transcript row. Only `message` is ever sent.
#[derive(Debug, Clone)]
pub struct ChatEntry {
    pub id: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub message: Message,
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

impl Message {
    fn default_role() -> String {
        ROLE_ASSISTANT.to_string()
    }

    pub fn text(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: MessageContent::Parts(vec![ContentPart::Text { text: text.into() }]),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == ROLE_USER
    }
}

impl ChatEntry {
    pub fn new(message: Message) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now(),
            message,
        }
    }
}

/// What a bubble shows for one piece of content.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayItem<'a> {
    Text(&'a str),
    Image(&'a str),
    Raw(String),
}

pub fn display_items(content: &MessageContent) -> Vec<DisplayItem<'_>> {
    match content {
        MessageContent::Text(text) => vec![DisplayItem::Text(text)],
        MessageContent::Parts(parts) => parts
            .iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(DisplayItem::Text(text)),
                ContentPart::ImageUrl { image_url } => Some(DisplayItem::Image(&image_url.url)),
            })
            .collect(),
        MessageContent::Other(serde_json::Value::Array(parts)) => {
            let items: Vec<_> = parts.iter().filter_map(raw_part_item).collect();
            if items.is_empty() {
                vec![DisplayItem::Raw(serde_json::Value::Array(parts.clone()).to_string())]
            } else {
                items
            }
        }
        MessageContent::Other(value) => vec![DisplayItem::Raw(value.to_string())],
    }
}

/// Picks the text and image parts out of a part list that did not decode as
/// a whole. Part types this window cannot show are skipped.
fn raw_part_item(part: &serde_json::Value) -> Option<DisplayItem<'_>> {
    match part.get("type")?.as_str()? {
        "text" => part.get("text")?.as_str().map(DisplayItem::Text),
        "image_url" => part.get("image_url")?.get("url")?.as_str().map(DisplayItem::Image),
        _ => None,
    }
}

/// Anything able to answer a chat request with a single assistant message.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    fn name(&self) -> &str;
    async fn send(&self, request: &ChatRequest) -> Result<Message, ClientError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_string_and_part_content() {
        let plain: Message = serde_json::from_value(json!({
            "role": "assistant",
            "content": "Water it less."
        }))
        .unwrap();
        assert_eq!(plain.content, MessageContent::Text("Water it less.".into()));

        let parts: Message = serde_json::from_value(json!({
            "role": "user",
            "content": [
                {"type": "text", "text": "what is this spot?"},
                {"type": "image_url", "image_url": {"url": "data:image/png;base64,AAAA"}}
            ]
        }))
        .unwrap();
        assert!(parts.is_user());
        assert_eq!(
            display_items(&parts.content),
            vec![
                DisplayItem::Text("what is this spot?"),
                DisplayItem::Image("data:image/png;base64,AAAA"),
            ]
        );
    }

    #[test]
    fn unexpected_content_falls_back_to_json() {
        let msg: Message = serde_json::from_value(json!({"content": {"answer": 42}})).unwrap();
        assert_eq!(msg.role, ROLE_ASSISTANT);
        assert_eq!(
            display_items(&msg.content),
            vec![DisplayItem::Raw(r#"{"answer":42}"#.to_string())]
        );
    }

    #[test]
    fn unknown_part_types_are_skipped() {
        let msg: Message = serde_json::from_value(json!({
            "role": "assistant",
            "content": [{"type": "refusal", "refusal": "no"}, {"type": "text", "text": "ok"}]
        }))
        .unwrap();
        assert_eq!(display_items(&msg.content), vec![DisplayItem::Text("ok")]);

        let only_unknown: Message = serde_json::from_value(json!({
            "role": "assistant",
            "content": [{"type": "refusal", "refusal": "no"}]
        }))
        .unwrap();
        let items = display_items(&only_unknown.content);
        let [DisplayItem::Raw(raw)] = items.as_slice() else {
            panic!("expected raw JSON");
        };
        let shown: serde_json::Value = serde_json::from_str(raw).unwrap();
        assert_eq!(shown, json!([{"type": "refusal", "refusal": "no"}]));
    }

    #[test]
    fn parts_survive_a_round_trip_unchanged() {
        let input = json!({
            "role": "user",
            "content": [
                {"type": "text", "text": "look"},
                {"type": "image_url", "image_url": {"url": "https://x/y.png", "detail": "high"}},
                {"type": "input_audio", "input_audio": {"data": "AAAA", "format": "wav"}}
            ]
        });
        let msg: Message = serde_json::from_value(input.clone()).unwrap();
        assert_eq!(serde_json::to_value(&msg).unwrap(), input);

        let images: Message = serde_json::from_value(json!({
            "role": "user",
            "content": [{"type": "image_url", "image_url": {"url": "https://x/y.png", "detail": "low"}}]
        }))
        .unwrap();
        let MessageContent::Parts(parts) = &images.content else {
            panic!("expected typed parts");
        };
        let ContentPart::ImageUrl { image_url } = &parts[0] else {
            panic!("expected an image part");
        };
        assert_eq!(image_url.extra.get("detail"), Some(&json!("low")));
    }

    #[test]
    fn request_omits_missing_model() {
        let request = ChatRequest {
            model: None,
            messages: vec![Message::text(ROLE_USER, "hi")],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({"messages": [{"role": "user", "content": [{"type": "text", "text": "hi"}]}]})
        );
    }
}
