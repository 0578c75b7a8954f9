use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Failures surfaced to the chat client as plain-text HTTP errors.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid request body: {0}")]
    InvalidBody(#[source] serde_json::Error),
    #[error("OpenAI API call failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("OpenAI API error: {body}")]
    Upstream { status: u16, body: String },
    #[error("Error parsing OpenAI response: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("No choices returned from OpenAI")]
    NoChoices,
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            RelayError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            RelayError::Transport(_) | RelayError::Parse(_) | RelayError::NoChoices => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::warn!(status = status.as_u16(), "{}", self);
        (status, self.to_string()).into_response()
    }
}
