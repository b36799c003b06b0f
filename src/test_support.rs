//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::api::{
    ApiError, ChatBackend, Conversation, ConversationDetail, Message, OutgoingMessage, Role,
    SendMessageResponse,
};
use crate::core::state::DEFAULT_TITLE;

fn not_found() -> ApiError {
    ApiError::from_status(404, r#"{"error": "Conversation not found"}"#)
}

/// An in-memory server. Behaves like the real one (auto-titles on first
/// send, 404s for unknown ids) unless a failure is scripted.
#[derive(Default)]
pub struct FakeBackend {
    calls: Mutex<Vec<String>>,
    conversations: Mutex<Vec<Conversation>>,
    messages: Mutex<HashMap<String, Vec<Message>>>,
    media: HashMap<String, Vec<u8>>,
    send_failure: Mutex<Option<ApiError>>,
    regenerate_failure: Mutex<Option<ApiError>>,
    next_id: Mutex<usize>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conversations(self, conversations: Vec<Conversation>) -> Self {
        *self.conversations.lock().unwrap() = conversations;
        self
    }

    pub fn with_messages(self, conversation_id: &str, messages: Vec<Message>) -> Self {
        self.messages
            .lock()
            .unwrap()
            .insert(conversation_id.to_string(), messages);
        self
    }

    pub fn with_media(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.media.insert(url.to_string(), bytes);
        self
    }

    pub fn fail_sends(self, error: ApiError) -> Self {
        *self.send_failure.lock().unwrap() = Some(error);
        self
    }

    pub fn fail_regenerates(self, error: ApiError) -> Self {
        *self.regenerate_failure.lock().unwrap() = Some(error);
        self
    }

    pub fn clear_failures(&self) {
        *self.send_failure.lock().unwrap() = None;
        *self.regenerate_failure.lock().unwrap() = None;
    }

    /// Every backend call so far, e.g. `["create", "send:c1", "list"]`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    fn next_id(&self, prefix: &str) -> String {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        format!("{prefix}{next}")
    }
}

#[async_trait]
impl ChatBackend for FakeBackend {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        self.record("list");
        Ok(self.conversations.lock().unwrap().clone())
    }

    async fn create_conversation(&self, title: &str) -> Result<Conversation, ApiError> {
        self.record("create");
        let conversation = Conversation::new(self.next_id("c"), title);
        self.conversations
            .lock()
            .unwrap()
            .insert(0, conversation.clone());
        Ok(conversation)
    }

    async fn get_conversation(&self, id: &str) -> Result<ConversationDetail, ApiError> {
        self.record(format!("get:{id}"));
        let conversations = self.conversations.lock().unwrap();
        let conversation = conversations.iter().find(|c| c.id == id).ok_or_else(not_found)?;
        Ok(ConversationDetail {
            id: Some(id.to_string()),
            title: conversation.title.clone(),
            messages: self
                .messages
                .lock()
                .unwrap()
                .get(id)
                .cloned()
                .unwrap_or_default(),
        })
    }

    async fn rename_conversation(&self, id: &str, title: &str) -> Result<Conversation, ApiError> {
        self.record(format!("rename:{id}"));
        let mut conversations = self.conversations.lock().unwrap();
        let conversation = conversations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(not_found)?;
        conversation.title = title.to_string();
        Ok(conversation.clone())
    }

    async fn delete_conversation(&self, id: &str) -> Result<(), ApiError> {
        self.record(format!("delete:{id}"));
        let mut conversations = self.conversations.lock().unwrap();
        let before = conversations.len();
        conversations.retain(|c| c.id != id);
        if conversations.len() == before {
            return Err(not_found());
        }
        Ok(())
    }

    async fn send_message(
        &self,
        message: &OutgoingMessage,
    ) -> Result<SendMessageResponse, ApiError> {
        self.record(format!("send:{}", message.conversation_id));
        if let Some(error) = self.send_failure.lock().unwrap().clone() {
            return Err(error);
        }

        let mut conversations = self.conversations.lock().unwrap();
        let conversation = conversations
            .iter_mut()
            .find(|c| c.id == message.conversation_id)
            .ok_or_else(not_found)?;
        let conversation_title = (conversation.title == DEFAULT_TITLE).then(|| {
            conversation.title = message.content.chars().take(50).collect();
            conversation.title.clone()
        });

        let user_message = Message::new(self.next_id("u"), Role::User, message.content.clone());
        let assistant_message = Message::new(self.next_id("a"), Role::Assistant, "Here you go");
        let mut history = self.messages.lock().unwrap();
        let history = history.entry(message.conversation_id.clone()).or_default();
        history.push(user_message.clone());
        history.push(assistant_message.clone());

        Ok(SendMessageResponse {
            user_message,
            assistant_message,
            conversation_title,
        })
    }

    async fn regenerate(&self, message_id: &str) -> Result<Message, ApiError> {
        self.record(format!("regenerate:{message_id}"));
        if let Some(error) = self.regenerate_failure.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(Message::new(message_id, Role::Assistant, "regenerated"))
    }

    async fn fetch_media(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        self.record(format!("fetch:{url}"));
        self.media
            .get(url)
            .cloned()
            .ok_or_else(|| ApiError::from_status(404, ""))
    }
}
