//! # Effect Executor
//!
//! Runs the I/O an `Effect` asks for and turns the outcome into the
//! completion `Action` that `update` reconciles. Front ends decide how to
//! schedule this: the TUI spawns one tokio task per effect, while
//! [`Controller`] drives the loop inline for headless use and tests.

use std::path::PathBuf;
use std::sync::Arc;

use log::{info, warn};

use crate::api::ChatBackend;
use crate::core::action::{Action, Effect, update};
use crate::core::media::{Dictation, DictationError, save_download};
use crate::core::state::App;

/// Collaborators reached by effects.
#[derive(Clone)]
pub struct Services {
    pub backend: Arc<dyn ChatBackend>,
    pub dictation: Option<Arc<dyn Dictation>>,
    pub download_dir: PathBuf,
}

impl Services {
    pub fn new(backend: Arc<dyn ChatBackend>, download_dir: PathBuf) -> Self {
        Self {
            backend,
            dictation: None,
            download_dir,
        }
    }

    pub fn with_dictation(mut self, dictation: Option<Arc<dyn Dictation>>) -> Self {
        self.dictation = dictation;
        self
    }
}

/// Performs one effect. Returns the completion to feed back, if any.
///
/// `Copy` and `Quit` belong to the front end and yield nothing here.
pub async fn perform(services: &Services, effect: Effect) -> Option<Action> {
    let backend = &services.backend;
    match effect {
        Effect::None | Effect::Quit | Effect::Copy(_) => None,

        Effect::RefreshConversations => Some(match backend.list_conversations().await {
            Ok(conversations) => Action::ConversationsLoaded(conversations),
            Err(error) => Action::ConversationsFailed(error),
        }),

        Effect::CreateConversation { title, pending } => {
            Some(match backend.create_conversation(&title).await {
                Ok(conversation) => Action::ConversationCreated {
                    conversation,
                    pending,
                },
                Err(error) => Action::CreateFailed {
                    error,
                    for_send: pending.is_some(),
                },
            })
        }

        Effect::LoadConversation(id) => Some(match backend.get_conversation(&id).await {
            Ok(detail) => Action::ConversationLoaded { id, detail },
            Err(error) => Action::LoadFailed { id, error },
        }),

        Effect::DeleteConversation(id) => Some(match backend.delete_conversation(&id).await {
            Ok(()) => Action::ConversationDeleted(id),
            Err(error) => Action::DeleteFailed { id, error },
        }),

        Effect::RenameConversation { id, title } => {
            Some(match backend.rename_conversation(&id, &title).await {
                Ok(conversation) => Action::ConversationRenamed(conversation),
                Err(error) => Action::RenameFailed { id, error },
            })
        }

        Effect::SendMessage(message) => {
            let conversation_id = message.conversation_id.clone();
            Some(match backend.send_message(&message).await {
                Ok(response) => Action::MessageSent {
                    conversation_id,
                    response,
                },
                Err(error) => Action::SendFailed {
                    conversation_id,
                    error,
                },
            })
        }

        Effect::Regenerate {
            conversation_id,
            message_id,
        } => Some(match backend.regenerate(&message_id).await {
            Ok(message) => Action::Regenerated {
                conversation_id,
                id: message_id,
                message,
            },
            Err(error) => Action::RegenerateFailed {
                conversation_id,
                id: message_id,
                error,
            },
        }),

        Effect::Download(url) => {
            let bytes = match backend.fetch_media(&url).await {
                Ok(bytes) => bytes,
                Err(error) => {
                    return Some(Action::DownloadFailed {
                        url,
                        error: error.to_string(),
                    });
                }
            };
            Some(
                match save_download(&services.download_dir, &url, &bytes).await {
                    Ok(path) => Action::Downloaded { url, path },
                    Err(error) => Action::DownloadFailed {
                        url,
                        error: error.to_string(),
                    },
                },
            )
        }

        Effect::Listen => Some(match &services.dictation {
            Some(dictation) => match dictation.listen().await {
                Ok(text) => Action::Dictated(text),
                Err(error) => Action::DictationFailed(error),
            },
            None => {
                warn!("Listen requested without a dictation backend");
                Action::DictationFailed(DictationError::Capture("unavailable".to_string()))
            }
        }),
    }
}

/// Drives `update` and `perform` to quiescence, one action at a time.
pub struct Controller {
    pub app: App,
    services: Services,
    /// Last text handed to the clipboard.
    pub clipboard: Option<String>,
}

impl Controller {
    pub fn new(app: App, services: Services) -> Self {
        Self {
            app,
            services,
            clipboard: None,
        }
    }

    pub async fn dispatch(&mut self, action: Action) {
        let mut next = Some(action);
        while let Some(action) = next.take() {
            next = match update(&mut self.app, action) {
                Effect::Copy(text) => {
                    info!("Copied {} bytes", text.len());
                    self.clipboard = Some(text);
                    None
                }
                effect => perform(&self.services, effect).await,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiError, Conversation, Message, Role};
    use crate::core::state::{DEFAULT_TITLE, Operation};
    use crate::core::transcript::{Entry, SEND_FAILURE_TEXT};
    use crate::test_support::FakeBackend;

    fn controller(backend: Arc<FakeBackend>) -> Controller {
        let services = Services::new(backend, std::env::temp_dir());
        Controller::new(App::new(), services)
    }

    #[tokio::test]
    async fn test_first_send_creates_conversation_and_reconciles() {
        let backend = Arc::new(FakeBackend::new());
        let mut c = controller(backend.clone());

        c.dispatch(Action::SetText("Hello".into())).await;
        c.dispatch(Action::Submit).await;

        let active = c.app.store.active().unwrap().to_string();
        assert_eq!(
            backend.calls(),
            vec![
                "create".to_string(),
                format!("send:{active}"),
                "list".to_string()
            ]
        );
        let entries = c.app.transcript.entries();
        assert_eq!(entries.len(), 2);
        assert!(matches!(&entries[0], Entry::Message(m) if m.role == Role::User && !m.is_temp()));
        assert!(matches!(&entries[1], Entry::Message(m) if m.role == Role::Assistant));
        assert_eq!(c.app.title, "Hello");
        assert_eq!(c.app.store.conversations().len(), 1);
        assert!(c.app.in_flight.is_empty());
    }

    #[tokio::test]
    async fn test_empty_submit_makes_no_calls() {
        let backend = Arc::new(FakeBackend::new());
        let mut c = controller(backend.clone());

        c.dispatch(Action::SetText(" \n ".into())).await;
        c.dispatch(Action::Submit).await;

        assert!(backend.calls().is_empty());
        assert!(c.app.is_welcome());
    }

    #[tokio::test]
    async fn test_send_failure_appends_apology() {
        let backend = Arc::new(
            FakeBackend::new()
                .with_conversations(vec![Conversation::new("c1", "Chat")])
                .fail_sends(ApiError::Network("connection refused".into())),
        );
        let mut c = controller(backend);
        c.dispatch(Action::SelectConversation("c1".into())).await;
        c.dispatch(Action::SetText("Hello".into())).await;
        c.dispatch(Action::Submit).await;

        let entries = c.app.transcript.entries();
        assert!(matches!(&entries[0], Entry::Message(m) if m.is_temp() && m.content == "Hello"));
        assert!(matches!(&entries[1], Entry::Failed { text, .. } if text == SEND_FAILURE_TEXT));
        assert!(!c.app.is_generating());
    }

    #[tokio::test]
    async fn test_regenerate_failure_then_retry() {
        let backend = Arc::new(
            FakeBackend::new()
                .with_conversations(vec![Conversation::new("c1", "Chat")])
                .with_messages("c1", vec![Message::new("m1", Role::Assistant, "first")])
                .fail_regenerates(ApiError::Network("down".into())),
        );
        let mut c = controller(backend.clone());
        c.dispatch(Action::SelectConversation("c1".into())).await;

        c.dispatch(Action::Regenerate("m1".into())).await;
        assert!(c.app.transcript.find_message("m1").is_none());
        assert!(matches!(&c.app.transcript.entries()[0], Entry::Failed { id, .. } if id == "error-m1"));
        assert!(!c.app.is_busy(&Operation::Generation));

        c.dispatch(Action::Restore("m1".into())).await;
        backend.clear_failures();
        c.dispatch(Action::Regenerate("m1".into())).await;

        assert_eq!(c.app.transcript.find_message("m1").unwrap().content, "regenerated");
        assert_eq!(
            backend
                .calls()
                .iter()
                .filter(|call| call.as_str() == "regenerate:m1")
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn test_delete_active_returns_to_welcome() {
        let backend = Arc::new(
            FakeBackend::new().with_conversations(vec![
                Conversation::new("c1", "Cats"),
                Conversation::new("c2", "Dogs"),
            ]),
        );
        let mut c = controller(backend);
        c.dispatch(Action::RefreshConversations).await;
        c.dispatch(Action::SelectConversation("c1".into())).await;
        assert_eq!(c.app.title, "Cats");

        c.dispatch(Action::DeleteConversation("c1".into())).await;

        assert_eq!(c.app.store.active(), None);
        assert!(c.app.is_welcome());
        assert_eq!(c.app.title, DEFAULT_TITLE);
        let ids: Vec<&str> = c.app.store.conversations().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c2"]);
    }

    #[tokio::test]
    async fn test_missing_conversation_is_logged_only() {
        let backend = Arc::new(FakeBackend::new());
        let mut c = controller(backend);
        let status = c.app.status_message.clone();

        c.dispatch(Action::SelectConversation("ghost".into())).await;
        c.dispatch(Action::DeleteConversation("ghost".into())).await;

        assert_eq!(c.app.status_message, status);
        assert!(c.app.in_flight.is_empty());
    }

    #[tokio::test]
    async fn test_download_saves_file() {
        let dir = std::env::temp_dir().join(format!("vizzy-dl-{}", uuid::Uuid::new_v4()));
        let backend = Arc::new(FakeBackend::new().with_media("/media/a.png", b"PNG".to_vec()));
        let mut c = Controller::new(App::new(), Services::new(backend, dir.clone()));

        c.dispatch(Action::Download("/media/a.png".into())).await;
        assert!(c.app.status_message.starts_with("Saved to"));

        c.dispatch(Action::Download("/media/missing.png".into())).await;
        assert!(c.app.status_message.starts_with("Download failed"));
        assert!(c.app.in_flight.is_empty());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_copy_is_captured_by_controller() {
        let backend = Arc::new(FakeBackend::new());
        let mut c = controller(backend);
        c.app.store.set_active("c1");
        c.app
            .transcript
            .load(vec![Message::new("m1", Role::Assistant, "copy me")]);

        tokio_test::block_on(c.dispatch(Action::Copy("m1".into())));
        assert_eq!(c.clipboard.as_deref(), Some("copy me"));
    }

    #[test]
    fn test_listen_without_backend_fails_softly() {
        let backend = Arc::new(FakeBackend::new());
        let services = Services::new(backend, std::env::temp_dir());
        let action = tokio_test::block_on(perform(&services, Effect::Listen));
        assert!(matches!(action, Some(Action::DictationFailed(_))));
    }
}
