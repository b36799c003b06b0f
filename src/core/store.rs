//! # Conversation Store
//!
//! In-memory list of conversation summaries plus the active-conversation
//! pointer. The list is always the server's list, in the server's order:
//! a refresh replaces it wholesale.

use crate::api::Conversation;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ConversationStore {
    conversations: Vec<Conversation>,
    active_id: Option<String>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole list with a fresh server snapshot. No merging.
    pub fn replace(&mut self, conversations: Vec<Conversation>) {
        self.conversations = conversations;
    }

    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn set_active(&mut self, id: impl Into<String>) {
        self.active_id = Some(id.into());
    }

    pub fn active(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.active() == Some(id)
    }

    pub fn clear_active(&mut self) {
        self.active_id = None;
    }

    /// Lists a just-created conversation ahead of the next refresh.
    pub fn insert_front(&mut self, conversation: Conversation) {
        self.conversations.retain(|c| c.id != conversation.id);
        self.conversations.insert(0, conversation);
    }

    pub fn update_title(&mut self, id: &str, title: &str) {
        if let Some(conversation) = self.conversations.iter_mut().find(|c| c.id == id) {
            conversation.title = title.to_string();
        }
    }

    /// Removes a conversation. Returns true if it was the active one, in
    /// which case the active pointer is cleared.
    pub fn remove(&mut self, id: &str) -> bool {
        self.conversations.retain(|c| c.id != id);
        if self.is_active(id) {
            self.active_id = None;
            true
        } else {
            false
        }
    }
}
