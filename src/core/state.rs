//! # Application State
//!
//! Core business state for Vizzy. This module contains domain logic only -
//! no TUI-specific types. Presentation state lives in the `tui` module.
//!
//! ```text
//! App
//! ├── store: ConversationStore       // conversation list + active id
//! ├── transcript: Transcript         // what the conversation pane shows
//! ├── compose: Compose               // text, image, refinement, mode
//! ├── title: String                  // header title
//! ├── in_flight: HashSet<Operation>  // operations awaiting completion
//! ├── sending_to: Option<String>     // conversation of the send in flight
//! ├── lightbox: Option<Lightbox>     // full-size image viewer
//! ├── status_message: String         // status bar text
//! └── dictation_available: bool      // hides the control when false
//! ```
//!
//! State changes only happen through `update(state, action)` in action.rs.
//! This keeps things predictable, so no surprise mutations.

use std::collections::HashSet;

use crate::core::compose::Compose;
use crate::core::media::Lightbox;
use crate::core::store::ConversationStore;
use crate::core::transcript::Transcript;

/// Header title whenever no titled conversation is shown.
pub const DEFAULT_TITLE: &str = "New Chat";

/// A class of asynchronous work. At most one of each key is in flight.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Send and regenerate share this key.
    Generation,
    Create,
    Load(String),
    Delete(String),
    Rename(String),
    Download(String),
    Dictation,
}

#[derive(Debug, Clone)]
pub struct App {
    pub store: ConversationStore,
    pub transcript: Transcript,
    pub compose: Compose,
    pub title: String,
    pub in_flight: HashSet<Operation>,
    /// Conversation the outstanding send belongs to, once it is under way.
    pub sending_to: Option<String>,
    pub lightbox: Option<Lightbox>,
    pub status_message: String,
    pub dictation_available: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            store: ConversationStore::new(),
            transcript: Transcript::new(),
            compose: Compose::new(),
            title: DEFAULT_TITLE.to_string(),
            in_flight: HashSet::new(),
            sending_to: None,
            lightbox: None,
            status_message: String::from("Welcome to Vizzy!"),
            dictation_available: false,
        }
    }

    pub fn with_dictation(mut self, available: bool) -> Self {
        self.dictation_available = available;
        self
    }

    pub fn is_busy(&self, op: &Operation) -> bool {
        self.in_flight.contains(op)
    }

    /// Marks `op` as started. Returns false if it was already in flight.
    pub fn begin(&mut self, op: Operation) -> bool {
        self.in_flight.insert(op)
    }

    pub fn finish(&mut self, op: &Operation) {
        self.in_flight.remove(op);
    }

    /// True while a send or regenerate is outstanding.
    pub fn is_generating(&self) -> bool {
        self.is_busy(&Operation::Generation)
    }

    /// True while a send to `conversation_id` is outstanding.
    pub fn is_sending_to(&self, conversation_id: &str) -> bool {
        self.is_generating() && self.sending_to.as_deref() == Some(conversation_id)
    }

    pub fn is_loading(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Nothing to show: no active conversation and an empty transcript.
    pub fn is_welcome(&self) -> bool {
        self.store.active().is_none() && self.transcript.is_empty()
    }

    /// Drops everything tied to the shown conversation.
    pub fn reset_view(&mut self) {
        self.transcript.clear();
        self.title = DEFAULT_TITLE.to_string();
        self.lightbox = None;
    }
}
