use super::attachment::ImageAttachment;
use super::client::ClientError;
use super::*;

pub const UNREACHABLE_REPLY: &str = "Error: Could not reach server.";

/// What the user is typing, plus an optional image.
#[derive(Debug, Clone, Default)]
pub struct Draft {
    pub input: String,
    pub attachment: Option<ImageAttachment>,
}

impl Draft {
    pub fn has_content(&self) -> bool {
        !self.input.trim().is_empty() || self.attachment.is_some()
    }

    pub fn clear(&mut self) {
        self.input.clear();
        self.attachment = None;
    }
}

/// A request that has been composed and is waiting for the endpoint.
#[derive(Debug, Clone)]
pub struct PendingTurn {
    pub user: Message,
    pub request: ChatRequest,
}

/// One conversation: the transcript, the draft, and whether a request is out.
#[derive(Debug, Default)]
pub struct ChatSession {
    entries: Vec<ChatEntry>,
    pub draft: Draft,
    loading: bool,
    model: Option<String>,
}

pub fn compose_user_message(draft: &Draft) -> Message {
    let mut parts = Vec::new();
    match &draft.attachment {
        Some(image) => {
            if !draft.input.trim().is_empty() {
                parts.push(ContentPart::Text {
                    text: draft.input.clone(),
                });
            }
            parts.push(ContentPart::ImageUrl {
                image_url: ImageUrl::new(image.to_data_url()),
            });
        }
        None => parts.push(ContentPart::Text {
            text: draft.input.clone(),
        }),
    }

    Message {
        role: ROLE_USER.to_string(),
        content: MessageContent::Parts(parts),
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(model: Option<String>) -> Self {
        Self {
            model,
            ..Self::default()
        }
    }

    pub fn set_model(&mut self, model: Option<String>) {
        self.model = model;
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Puts an image on the draft. Refused while a request is out, since a
    /// successful reply clears the draft.
    pub fn attach(&mut self, attachment: ImageAttachment) -> bool {
        if self.loading {
            return false;
        }
        self.draft.attachment = Some(attachment);
        true
    }

    pub fn can_send(&self) -> bool {
        !self.loading && self.draft.has_content()
    }

    /// Composes the next turn and marks the session busy. Returns `None` when
    /// there is nothing to send or a request is already in flight.
    pub fn begin_send(&mut self) -> Option<PendingTurn> {
        if !self.can_send() {
            return None;
        }

        let user = compose_user_message(&self.draft);
        let mut messages: Vec<Message> = self.entries.iter().map(|e| e.message.clone()).collect();
        messages.push(user.clone());

        self.loading = true;
        Some(PendingTurn {
            user,
            request: ChatRequest {
                model: self.model.clone(),
                messages,
            },
        })
    }

    pub fn finish_send(&mut self, turn: PendingTurn, outcome: Result<Message, ClientError>) {
        self.entries.push(ChatEntry::new(turn.user));
        match outcome {
            Ok(reply) => {
                self.entries.push(ChatEntry::new(reply));
                self.draft.clear();
            }
            Err(e) => {
                tracing::error!("Chat request failed: {}", e);
                self.entries
                    .push(ChatEntry::new(Message::text(ROLE_ASSISTANT, UNREACHABLE_REPLY)));
            }
        }
        self.loading = false;
    }

    /// Runs one full round trip against `backend`. Returns false if nothing was sent.
    pub async fn send<B: ChatBackend + ?Sized>(&mut self, backend: &B) -> bool {
        let Some(turn) = self.begin_send() else {
            return false;
        };
        tracing::debug!("Sending turn via {}", backend.name());
        let outcome = backend.send(&turn.request).await;
        self.finish_send(turn, outcome);
        true
    }
}
