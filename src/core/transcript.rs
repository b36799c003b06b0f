//! # Transcript
//!
//! What the conversation pane shows: confirmed messages interleaved with
//! the client's own placeholders. Placeholders never reach the server.
//!
//! ```text
//! Transcript
//! ├── Message(m)            // server-confirmed, or the temp user message
//! ├── Typing                // assistant reply in flight
//! ├── Regenerating { .. }   // holds a snapshot of the message being replaced
//! └── Failed { .. }         // inline error, optionally holding a snapshot
//! ```

use crate::api::{Message, Role};

/// Shown in place of the assistant reply when a send fails.
pub const SEND_FAILURE_TEXT: &str = "Sorry, I encountered an error. Please try again.";
/// Shown in place of a message whose regeneration failed.
pub const REGENERATE_FAILURE_TEXT: &str = "Sorry, regeneration failed. Please try again.";

#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Message(Message),
    Typing,
    Regenerating { original: Message },
    Failed {
        id: String,
        text: String,
        /// Snapshot of the message this error replaced, if any.
        original: Option<Message>,
    },
}

impl Entry {
    /// Stable key used by renderers.
    pub fn key(&self) -> String {
        match self {
            Entry::Message(m) => m.id.clone(),
            Entry::Typing => "typing".to_string(),
            Entry::Regenerating { original } => original.id.clone(),
            Entry::Failed { id, .. } => id.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    entries: Vec<Entry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Replaces everything with a server-loaded history.
    pub fn load(&mut self, messages: Vec<Message>) {
        self.entries = messages.into_iter().map(Entry::Message).collect();
    }

    /// Replaces the history while a send to this conversation is still out.
    ///
    /// The typing placeholder stays. The temp user message stays unless the
    /// server history already ends its user turns with the same text.
    pub fn reload_keeping_pending(&mut self, messages: Vec<Message>) {
        let temp = self.entries.iter().find_map(|e| match e {
            Entry::Message(m) if m.is_temp() => Some(m.clone()),
            _ => None,
        });
        self.load(messages);
        if let Some(temp) = temp {
            let echoed = self
                .entries
                .iter()
                .filter_map(|e| match e {
                    Entry::Message(m) if m.role == Role::User => Some(m),
                    _ => None,
                })
                .last()
                .is_some_and(|m| m.content == temp.content);
            if !echoed {
                self.push_message(temp);
            }
        }
        self.show_typing();
    }

    pub fn push_message(&mut self, message: Message) {
        self.entries.push(Entry::Message(message));
    }

    /// Replaces the message with the same id in place, or appends it.
    pub fn upsert_message(&mut self, message: Message) {
        match self.position_of_message(&message.id) {
            Some(idx) => self.entries[idx] = Entry::Message(message),
            None => self.push_message(message),
        }
    }

    /// Adds the optimistic user message, dropping any stale one first.
    pub fn push_temp_user(&mut self, content: &str) {
        self.remove_temp();
        self.push_message(Message::temp_user(content));
    }

    pub fn remove_temp(&mut self) {
        self.entries
            .retain(|e| !matches!(e, Entry::Message(m) if m.is_temp()));
    }

    pub fn has_temp(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e, Entry::Message(m) if m.is_temp()))
    }

    pub fn show_typing(&mut self) {
        if !self.is_typing() {
            self.entries.push(Entry::Typing);
        }
    }

    pub fn remove_typing(&mut self) {
        self.entries.retain(|e| !matches!(e, Entry::Typing));
    }

    pub fn is_typing(&self) -> bool {
        self.entries.iter().any(|e| matches!(e, Entry::Typing))
    }

    /// Appends an assistant-side error entry with a fresh id.
    pub fn push_error(&mut self, text: &str) {
        self.entries.push(Entry::Failed {
            id: format!("error-{}", uuid::Uuid::new_v4()),
            text: text.to_string(),
            original: None,
        });
    }

    pub fn find_message(&self, id: &str) -> Option<&Message> {
        self.entries.iter().find_map(|e| match e {
            Entry::Message(m) if m.id == id => Some(m),
            _ => None,
        })
    }

    fn position_of_message(&self, id: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| matches!(e, Entry::Message(m) if m.id == id))
    }

    /// Swaps an assistant message for a regenerating placeholder that keeps
    /// a snapshot. Returns false if there is no such message.
    pub fn begin_regenerate(&mut self, id: &str) -> bool {
        let Some(idx) = self.position_of_message(id) else {
            return false;
        };
        let Entry::Message(original) = &self.entries[idx] else {
            return false;
        };
        if original.role != Role::Assistant {
            return false;
        }
        let original = original.clone();
        self.entries[idx] = Entry::Regenerating { original };
        true
    }

    /// Replaces the placeholder for `id` with the fresh message. Returns
    /// false if the placeholder is gone (e.g. the user switched conversations).
    pub fn finish_regenerate(&mut self, id: &str, message: Message) -> bool {
        let idx = self.entries.iter().position(
            |e| matches!(e, Entry::Regenerating { original } if original.id == id),
        );
        match idx {
            Some(idx) => {
                self.entries[idx] = Entry::Message(message);
                true
            }
            None => false,
        }
    }

    /// Replaces the placeholder with an inline error that keeps the snapshot.
    pub fn fail_regenerate(&mut self, id: &str) -> bool {
        let idx = self.entries.iter().position(
            |e| matches!(e, Entry::Regenerating { original } if original.id == id),
        );
        let Some(idx) = idx else {
            return false;
        };
        let Entry::Regenerating { original } = self.entries[idx].clone() else {
            return false;
        };
        self.entries[idx] = Entry::Failed {
            id: format!("error-{id}"),
            text: REGENERATE_FAILURE_TEXT.to_string(),
            original: Some(original),
        };
        true
    }

    /// Puts back the snapshot held by a failed regeneration of `id`.
    pub fn restore(&mut self, id: &str) -> bool {
        let idx = self.entries.iter().position(|e| {
            matches!(e, Entry::Failed { original: Some(original), .. } if original.id == id)
        });
        let Some(idx) = idx else {
            return false;
        };
        if let Entry::Failed {
            original: Some(original),
            ..
        } = self.entries[idx].clone()
        {
            self.entries[idx] = Entry::Message(original);
            return true;
        }
        false
    }
}
