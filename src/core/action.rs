//! # Actions
//!
//! Everything that can happen in Vizzy becomes an `Action`.
//! User presses Enter? That's `Action::Submit`.
//! The server answers? That's `Action::MessageSent { .. }`.
//!
//! The `update()` function takes the current state and an action, mutates
//! the state and returns an `Effect` describing the I/O to perform next.
//! No side effects here. I/O happens in `effects.rs`, and its outcome comes
//! back as another `Action`.
//!
//! ```text
//! State + Action  →  update()  →  New State + Effect
//!                                                │
//!             Action  ←  perform()  ←────────────┘
//! ```
//!
//! This makes everything testable: feed actions, assert on state and effects.

use std::path::PathBuf;

use log::{debug, info, warn};

use crate::api::{
    ApiError, Conversation, ConversationDetail, ImageAttachment, Message, Mode, OutgoingMessage,
    SendMessageResponse,
};
use crate::core::compose::Submission;
use crate::core::media::{DictationError, Lightbox, is_video_url};
use crate::core::state::{App, DEFAULT_TITLE, Operation};
use crate::core::transcript::SEND_FAILURE_TEXT;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // User intents
    Submit,
    NewChat,
    SelectConversation(String),
    DeleteConversation(String),
    RenameConversation { id: String, title: String },
    RefreshConversations,
    Regenerate(String),
    /// Puts back the message a failed regeneration replaced.
    Restore(String),
    Copy(String),
    OpenLightbox { url: String, title: String },
    CloseLightbox,
    Download(String),
    StartDictation,

    // Compose edits
    SetText(String),
    AttachImage(ImageAttachment),
    ClearImage,
    SelectRefinement(String),
    SetMode(Mode),
    CycleMode,

    // Completions
    ConversationsLoaded(Vec<Conversation>),
    ConversationsFailed(ApiError),
    ConversationCreated {
        conversation: Conversation,
        /// Present when the conversation was created to carry a send.
        pending: Option<Submission>,
    },
    CreateFailed { error: ApiError, for_send: bool },
    ConversationLoaded { id: String, detail: ConversationDetail },
    LoadFailed { id: String, error: ApiError },
    ConversationDeleted(String),
    DeleteFailed { id: String, error: ApiError },
    ConversationRenamed(Conversation),
    RenameFailed { id: String, error: ApiError },
    MessageSent {
        conversation_id: String,
        response: SendMessageResponse,
    },
    SendFailed { conversation_id: String, error: ApiError },
    Regenerated {
        conversation_id: String,
        id: String,
        message: Message,
    },
    RegenerateFailed {
        conversation_id: String,
        id: String,
        error: ApiError,
    },
    Downloaded { url: String, path: PathBuf },
    DownloadFailed { url: String, error: String },
    Dictated(String),
    DictationFailed(DictationError),

    /// Front-end message for the status line (e.g. a file that could not be read).
    Notify(String),
    Quit,
}

/// I/O requested by `update`. Executed by `effects::perform`.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    None,
    Quit,
    RefreshConversations,
    CreateConversation {
        title: String,
        pending: Option<Submission>,
    },
    LoadConversation(String),
    DeleteConversation(String),
    RenameConversation { id: String, title: String },
    SendMessage(OutgoingMessage),
    Regenerate {
        conversation_id: String,
        message_id: String,
    },
    Download(String),
    Copy(String),
    Listen,
}

pub fn update(app: &mut App, action: Action) -> Effect {
    debug!("update: {:?}", action);
    match action {
        Action::Submit => submit(app),

        Action::NewChat => {
            if !app.begin(Operation::Create) {
                return Effect::None;
            }
            Effect::CreateConversation {
                title: DEFAULT_TITLE.to_string(),
                pending: None,
            }
        }

        Action::SelectConversation(id) => {
            if !app.begin(Operation::Load(id.clone())) {
                return Effect::None;
            }
            app.store.set_active(id.clone());
            app.reset_view();
            if let Some(conversation) = app.store.get(&id) {
                app.title = conversation.title.clone();
            }
            app.compose.clear_refinement();
            Effect::LoadConversation(id)
        }

        Action::DeleteConversation(id) => {
            if !app.begin(Operation::Delete(id.clone())) {
                return Effect::None;
            }
            Effect::DeleteConversation(id)
        }

        Action::RenameConversation { id, title } => {
            let title = title.trim().to_string();
            if title.is_empty() || !app.begin(Operation::Rename(id.clone())) {
                return Effect::None;
            }
            Effect::RenameConversation { id, title }
        }

        Action::RefreshConversations => Effect::RefreshConversations,

        Action::Regenerate(id) => regenerate(app, id),

        Action::Restore(id) => {
            if app.transcript.restore(&id) {
                info!("Restored message {}", id);
            }
            Effect::None
        }

        Action::Copy(id) => match app.transcript.find_message(&id) {
            Some(message) => {
                app.status_message = "Copied to clipboard".to_string();
                Effect::Copy(message.content.clone())
            }
            None => Effect::None,
        },

        Action::OpenLightbox { url, title } => {
            app.lightbox = Lightbox::open(&url, &title);
            Effect::None
        }

        Action::CloseLightbox => {
            app.lightbox = None;
            Effect::None
        }

        Action::Download(url) => {
            if !app.begin(Operation::Download(url.clone())) {
                return Effect::None;
            }
            app.status_message = "Downloading...".to_string();
            Effect::Download(url)
        }

        Action::StartDictation => {
            if !app.dictation_available || !app.begin(Operation::Dictation) {
                return Effect::None;
            }
            app.status_message = "Listening...".to_string();
            Effect::Listen
        }

        Action::SetText(text) => {
            app.compose.set_text(text);
            Effect::None
        }

        Action::AttachImage(image) => {
            app.status_message = format!("Attached {}", image.file_name);
            app.compose.attach_image(image);
            Effect::None
        }

        Action::ClearImage => {
            app.compose.clear_image();
            Effect::None
        }

        Action::SelectRefinement(url) => {
            if !is_video_url(&url) {
                app.compose.select_refinement(&url);
            }
            Effect::None
        }

        Action::SetMode(mode) => {
            app.compose.set_mode(mode);
            Effect::None
        }

        Action::CycleMode => {
            app.compose.cycle_mode();
            app.status_message = format!("Mode: {}", app.compose.mode.label());
            Effect::None
        }

        Action::ConversationsLoaded(conversations) => {
            app.store.replace(conversations);
            if let Some(title) = app
                .store
                .active()
                .and_then(|id| app.store.get(id))
                .map(|c| c.title.clone())
            {
                app.title = title;
            }
            Effect::None
        }

        Action::ConversationsFailed(error) => {
            warn!("Failed to refresh conversations: {}", error);
            app.status_message = format!("Could not load conversations: {error}");
            Effect::None
        }

        Action::ConversationCreated {
            conversation,
            pending,
        } => {
            app.finish(&Operation::Create);
            info!("Conversation created: {}", conversation.id);
            let id = conversation.id.clone();
            app.store.set_active(id.clone());
            app.reset_view();
            app.title = conversation.title.clone();
            app.store.insert_front(conversation);
            match pending {
                Some(submission) => start_send(app, &id, submission),
                None => Effect::RefreshConversations,
            }
        }

        Action::CreateFailed { error, for_send } => {
            app.finish(&Operation::Create);
            if for_send {
                app.finish(&Operation::Generation);
            }
            warn!("Failed to create conversation: {}", error);
            app.status_message = format!("Could not create conversation: {error}");
            Effect::None
        }

        Action::ConversationLoaded { id, detail } => {
            app.finish(&Operation::Load(id.clone()));
            if !app.store.is_active(&id) {
                debug!("Ignoring stale load for {}", id);
                return Effect::None;
            }
            if app.is_sending_to(&id) {
                app.transcript.reload_keeping_pending(detail.messages);
            } else {
                app.transcript.load(detail.messages);
            }
            if !detail.title.is_empty() {
                app.title = detail.title;
            }
            Effect::None
        }

        Action::LoadFailed { id, error } => {
            app.finish(&Operation::Load(id.clone()));
            if error.is_not_found() {
                warn!("Conversation {} no longer exists", id);
            } else {
                warn!("Failed to load conversation {}: {}", id, error);
                app.status_message = format!("Could not load conversation: {error}");
            }
            Effect::None
        }

        Action::ConversationDeleted(id) => {
            app.finish(&Operation::Delete(id.clone()));
            info!("Conversation deleted: {}", id);
            if app.store.remove(&id) {
                app.reset_view();
            }
            Effect::RefreshConversations
        }

        Action::DeleteFailed { id, error } => {
            app.finish(&Operation::Delete(id.clone()));
            if error.is_not_found() {
                warn!("Conversation {} was already gone", id);
            } else {
                warn!("Failed to delete conversation {}: {}", id, error);
                app.status_message = format!("Could not delete conversation: {error}");
            }
            Effect::None
        }

        Action::ConversationRenamed(conversation) => {
            app.finish(&Operation::Rename(conversation.id.clone()));
            app.store.update_title(&conversation.id, &conversation.title);
            if app.store.is_active(&conversation.id) {
                app.title = conversation.title;
            }
            Effect::None
        }

        Action::RenameFailed { id, error } => {
            app.finish(&Operation::Rename(id.clone()));
            warn!("Failed to rename conversation {}: {}", id, error);
            app.status_message = format!("Could not rename conversation: {error}");
            Effect::None
        }

        Action::MessageSent {
            conversation_id,
            response,
        } => {
            app.finish(&Operation::Generation);
            if let Some(title) = &response.conversation_title {
                app.store.update_title(&conversation_id, title);
            }
            if app.store.is_active(&conversation_id) {
                app.transcript.remove_temp();
                app.transcript.remove_typing();
                app.transcript.upsert_message(response.user_message);
                app.transcript.upsert_message(response.assistant_message);
                if let Some(title) = response.conversation_title {
                    app.title = title;
                }
            } else {
                debug!("Reply for inactive conversation {} not shown", conversation_id);
            }
            Effect::RefreshConversations
        }

        Action::SendFailed {
            conversation_id,
            error,
        } => {
            app.finish(&Operation::Generation);
            warn!("Send failed in {}: {}", conversation_id, error);
            if app.store.is_active(&conversation_id) {
                app.transcript.remove_typing();
                app.transcript.push_error(SEND_FAILURE_TEXT);
            }
            Effect::None
        }

        Action::Regenerated {
            conversation_id,
            id,
            message,
        } => {
            app.finish(&Operation::Generation);
            if app.store.is_active(&conversation_id) {
                app.transcript.finish_regenerate(&id, message);
            }
            Effect::None
        }

        Action::RegenerateFailed {
            conversation_id,
            id,
            error,
        } => {
            app.finish(&Operation::Generation);
            warn!("Regenerate failed for {}: {}", id, error);
            if app.store.is_active(&conversation_id) {
                app.transcript.fail_regenerate(&id);
            }
            Effect::None
        }

        Action::Downloaded { url, path } => {
            app.finish(&Operation::Download(url));
            app.status_message = format!("Saved to {}", path.display());
            Effect::None
        }

        Action::DownloadFailed { url, error } => {
            warn!("Download of {} failed: {}", url, error);
            app.finish(&Operation::Download(url));
            app.status_message = format!("Download failed: {error}");
            Effect::None
        }

        Action::Dictated(text) => {
            app.finish(&Operation::Dictation);
            app.compose.append_text(&text);
            app.status_message.clear();
            Effect::None
        }

        Action::DictationFailed(error) => {
            app.finish(&Operation::Dictation);
            warn!("{}", error);
            app.status_message = error.to_string();
            Effect::None
        }

        Action::Notify(message) => {
            app.status_message = message;
            Effect::None
        }

        Action::Quit => Effect::Quit,
    }
}

/// Send, steps 1–2: validate, guard, and create a conversation if needed.
fn submit(app: &mut App) -> Effect {
    let Some(submission) = app.compose.build_submission() else {
        debug!("Empty submission ignored");
        return Effect::None;
    };
    let active = app.store.active().map(str::to_string);
    if active.is_none() && app.is_busy(&Operation::Create) {
        debug!("Submission dropped: a conversation is already being created");
        return Effect::None;
    }
    if !app.begin(Operation::Generation) {
        debug!("Submission dropped: generation already in flight");
        return Effect::None;
    }

    match active {
        Some(id) => start_send(app, &id, submission),
        None => {
            app.sending_to = None;
            app.begin(Operation::Create);
            Effect::CreateConversation {
                title: DEFAULT_TITLE.to_string(),
                pending: Some(submission),
            }
        }
    }
}

/// Send, steps 3–5: optimistic insert, compose reset, network call.
fn start_send(app: &mut App, conversation_id: &str, submission: Submission) -> Effect {
    app.sending_to = Some(conversation_id.to_string());
    app.transcript.push_temp_user(&submission.content);
    app.transcript.show_typing();
    app.compose.reset();
    info!(
        "Sending message to {} (mode={}, image={}, refinement={})",
        conversation_id,
        submission.mode.as_str(),
        submission.image.is_some(),
        submission.refinement_url.is_some()
    );
    Effect::SendMessage(submission.into_outgoing(conversation_id))
}

fn regenerate(app: &mut App, id: String) -> Effect {
    if app.is_generating() {
        debug!("Regenerate dropped: generation already in flight");
        return Effect::None;
    }
    let Some(conversation_id) = app.store.active().map(str::to_string) else {
        return Effect::None;
    };
    if !app.transcript.begin_regenerate(&id) {
        return Effect::None;
    }
    app.begin(Operation::Generation);
    app.sending_to = None;
    Effect::Regenerate {
        conversation_id,
        message_id: id,
    }
}
