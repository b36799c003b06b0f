use std::fmt;

use async_trait::async_trait;

use super::types::{
    Conversation, ConversationDetail, ErrorBody, Message, OutgoingMessage, SendMessageResponse,
};

/// Errors that can occur while talking to the chat server.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Network-level failure (DNS, connection refused, reset).
    Network(String),
    /// The server answered with a non-success status.
    Status { status: u16, message: String },
    /// A success response whose body could not be decoded.
    Parse(String),
    /// The request itself could not be built (bad MIME type, bad URL).
    Request(String),
}

impl ApiError {
    /// Builds a status error from a response body, taking the message from
    /// `{"error": "..."}` when present.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .map(|b| b.error)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| format!("API error {status}"));
        ApiError::Status { status, message }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(msg) => write!(f, "network error: {msg}"),
            ApiError::Status { message, .. } => write!(f, "{message}"),
            ApiError::Parse(msg) => write!(f, "parse error: {msg}"),
            ApiError::Request(msg) => write!(f, "invalid request: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// The REST surface the client state machine depends on.
///
/// `ApiClient` implements it over HTTP; tests swap in a scripted fake.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError>;

    async fn create_conversation(&self, title: &str) -> Result<Conversation, ApiError>;

    async fn get_conversation(&self, id: &str) -> Result<ConversationDetail, ApiError>;

    async fn rename_conversation(&self, id: &str, title: &str) -> Result<Conversation, ApiError>;

    async fn delete_conversation(&self, id: &str) -> Result<(), ApiError>;

    async fn send_message(&self, message: &OutgoingMessage)
    -> Result<SendMessageResponse, ApiError>;

    async fn regenerate(&self, message_id: &str) -> Result<Message, ApiError>;

    /// Downloads a generated asset. Relative URLs are resolved against the server.
    async fn fetch_media(&self, url: &str) -> Result<Vec<u8>, ApiError>;
}
