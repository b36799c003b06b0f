//! # Compose Controller
//!
//! Owns everything the user is preparing to send: the text, an optional
//! uploaded image, an optional previously generated image selected for
//! refinement, and the generation mode.
//!
//! Selecting an image for refinement is a toggle. Only one image can be
//! selected at a time, and the placeholder text follows the selection.

use crate::api::{ImageAttachment, Mode, OutgoingMessage};

pub const DEFAULT_PLACEHOLDER: &str = "Describe what you want Vizzy to create...";
pub const REFINE_PLACEHOLDER: &str = "Describe how to change the selected image...";

/// A validated, ready-to-send compose snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub content: String,
    pub mode: Mode,
    pub refinement_url: Option<String>,
    pub image: Option<ImageAttachment>,
}

impl Submission {
    pub fn into_outgoing(self, conversation_id: &str) -> OutgoingMessage {
        OutgoingMessage {
            conversation_id: conversation_id.to_string(),
            content: self.content,
            mode: self.mode,
            refinement_url: self.refinement_url,
            image: self.image,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Compose {
    pub text: String,
    pub attached_image: Option<ImageAttachment>,
    pub selected_refinement: Option<String>,
    pub mode: Mode,
    pub placeholder: String,
}

impl Default for Compose {
    fn default() -> Self {
        Self::new()
    }
}

impl Compose {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            attached_image: None,
            selected_refinement: None,
            mode: Mode::default(),
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// Appends dictated text, separated from existing input by a space.
    pub fn append_text(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if !self.text.is_empty() && !self.text.ends_with(char::is_whitespace) {
            self.text.push(' ');
        }
        self.text.push_str(text);
    }

    pub fn attach_image(&mut self, image: ImageAttachment) {
        self.attached_image = Some(image);
    }

    pub fn clear_image(&mut self) {
        self.attached_image = None;
    }

    /// Toggles `url` as the refinement target. Returns whether it is now selected.
    pub fn select_refinement(&mut self, url: &str) -> bool {
        if self.selected_refinement.as_deref() == Some(url) {
            self.selected_refinement = None;
            self.placeholder = DEFAULT_PLACEHOLDER.to_string();
            return false;
        }
        self.selected_refinement = Some(url.to_string());
        self.placeholder = REFINE_PLACEHOLDER.to_string();
        true
    }

    pub fn clear_refinement(&mut self) {
        self.selected_refinement = None;
        self.placeholder = DEFAULT_PLACEHOLDER.to_string();
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn cycle_mode(&mut self) {
        self.mode = self.mode.next();
    }

    /// Snapshot for sending, or `None` when there is neither text nor an image.
    pub fn build_submission(&self) -> Option<Submission> {
        let content = self.text.trim();
        if content.is_empty() && self.attached_image.is_none() {
            return None;
        }
        Some(Submission {
            content: content.to_string(),
            mode: self.mode,
            refinement_url: self.selected_refinement.clone(),
            image: self.attached_image.clone(),
        })
    }

    /// Clears text, attachment and selection. The mode is a sticky preference.
    pub fn reset(&mut self) {
        self.text.clear();
        self.attached_image = None;
        self.selected_refinement = None;
        self.placeholder = DEFAULT_PLACEHOLDER.to_string();
    }
}
