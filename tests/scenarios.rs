//! End-to-end flows through the reducer and the HTTP client against a mock server.

use std::sync::Arc;

use serde_json::json;
use vizzy::api::{ApiClient, Role, TEMP_USER_ID};
use vizzy::core::state::DEFAULT_TITLE;
use vizzy::core::transcript::Entry;
use vizzy::core::{Action, App, Controller, Effect, Services, perform, update};
use vizzy::render::{render_entry, to_html};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn services(server: &MockServer) -> Services {
    Services::new(
        Arc::new(ApiClient::new(server.uri())),
        std::env::temp_dir(),
    )
}

fn message_json(id: &str, role: &str, content: &str) -> serde_json::Value {
    json!({"id": id, "role": role, "content": content, "generated_contents": []})
}

#[tokio::test]
async fn test_first_message_creates_conversation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/conversations/"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"id": "c1", "title": "New Chat"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/messages/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_message": message_json("u1", "user", "Hello"),
            "assistant_message": message_json("a1", "assistant", "Hi! What should I draw?"),
            "conversation_title": "Hello"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/conversations/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversations": [{"id": "c1", "title": "Hello", "message_count": 2}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let services = services(&server);
    let mut app = App::new();

    update(&mut app, Action::SetText("Hello".into()));
    let effect = update(&mut app, Action::Submit);
    assert!(matches!(effect, Effect::CreateConversation { .. }));

    // Created: the temp message is shown before the server confirms it
    let created = perform(&services, effect).await.unwrap();
    let effect = update(&mut app, created);
    assert_eq!(app.store.active(), Some("c1"));
    assert!(matches!(
        &app.transcript.entries()[0],
        Entry::Message(m) if m.id == TEMP_USER_ID && m.content == "Hello"
    ));
    assert!(app.transcript.is_typing());
    assert!(app.compose.text.is_empty());

    // Sent: temp and typing replaced by the confirmed pair
    let sent = perform(&services, effect).await.unwrap();
    let effect = update(&mut app, sent);
    let entries = app.transcript.entries();
    assert_eq!(entries.len(), 2);
    assert!(matches!(&entries[0], Entry::Message(m) if m.id == "u1" && m.role == Role::User));
    assert!(matches!(&entries[1], Entry::Message(m) if m.id == "a1"));
    assert_eq!(app.title, "Hello");
    assert!(!app.is_loading());

    // Refreshed list includes the new conversation
    let refreshed = perform(&services, effect).await.unwrap();
    update(&mut app, refreshed);
    assert_eq!(app.store.conversations().len(), 1);
    assert_eq!(app.store.conversations()[0].title, "Hello");
}

#[tokio::test]
async fn test_deleting_active_conversation_returns_to_welcome() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/conversations/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversations": [{"id": "c1", "title": "Cats"}, {"id": "c2", "title": "Dogs"}]
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/conversations/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversations": [{"id": "c2", "title": "Dogs"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/conversations/c1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "c1",
            "title": "Cats",
            "messages": [message_json("m1", "user", "draw a cat")]
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/conversations/c1/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let mut c = Controller::new(App::new(), services(&server));
    c.dispatch(Action::RefreshConversations).await;
    c.dispatch(Action::SelectConversation("c1".into())).await;
    assert_eq!(c.app.title, "Cats");
    assert_eq!(c.app.transcript.len(), 1);

    c.dispatch(Action::DeleteConversation("c1".into())).await;

    assert_eq!(c.app.store.active(), None);
    assert!(c.app.is_welcome());
    assert_eq!(c.app.title, DEFAULT_TITLE);
    let ids: Vec<&str> = c.app.store.conversations().iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c2"]);
}

#[tokio::test]
async fn test_regenerate_network_failure_leaves_inline_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/conversations/c1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "c1",
            "title": "Cats",
            "messages": [
                message_json("m1", "assistant", "A cat"),
                message_json("m2", "assistant", "Another cat")
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/messages/m1/regenerate/"))
        .respond_with(ResponseTemplate::new(502))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/messages/m2/regenerate/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(message_json("m2", "assistant", "A new cat")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut c = Controller::new(App::new(), services(&server));
    c.dispatch(Action::SelectConversation("c1".into())).await;

    c.dispatch(Action::Regenerate("m1".into())).await;

    assert!(c.app.transcript.find_message("m1").is_none());
    assert!(matches!(&c.app.transcript.entries()[0], Entry::Failed { id, .. } if id == "error-m1"));
    assert!(!c.app.is_loading());

    // The guard was released, so the next regenerate goes out
    c.dispatch(Action::Regenerate("m2".into())).await;
    assert_eq!(c.app.transcript.find_message("m2").unwrap().content, "A new cat");
}

#[test]
fn test_rendering_is_idempotent() {
    let mut app = App::new();
    app.store.set_active("c1");
    app.transcript.load(vec![
        vizzy::api::Message::new("u1", Role::User, "draw **two** cats\nplease"),
        vizzy::api::Message::new("a1", Role::Assistant, "Here <they> are"),
    ]);

    let first: Vec<String> = app
        .transcript
        .entries()
        .iter()
        .map(|e| to_html(&render_entry(e, None)))
        .collect();
    let second: Vec<String> = app
        .transcript
        .entries()
        .iter()
        .map(|e| to_html(&render_entry(e, None)))
        .collect();

    assert_eq!(first, second);
    assert!(first[0].contains("<strong>two</strong>"));
    assert!(first[1].contains("&lt;they&gt;"));
}
