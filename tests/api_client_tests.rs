use serde_json::json;
use vizzy::api::{ApiClient, ApiError, ChatBackend, ImageAttachment, Mode, OutgoingMessage, Role};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, body_string_contains, header_exists, method, path},
};

// ============================================================================
// Helper Functions
// ============================================================================

fn message_json(id: &str, role: &str, content: &str) -> serde_json::Value {
    json!({
        "id": id,
        "role": role,
        "content": content,
        "created_at": "2024-01-15T10:30:00Z",
        "generated_contents": []
    })
}

fn outgoing(content: &str) -> OutgoingMessage {
    OutgoingMessage {
        conversation_id: "c1".to_string(),
        content: content.to_string(),
        mode: Mode::Auto,
        refinement_url: None,
        image: None,
    }
}

// ============================================================================
// Conversations
// ============================================================================

#[tokio::test]
async fn test_list_conversations() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/conversations/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversations": [
                {"id": "c1", "title": "Cats", "updated_at": "2024-01-15T10:30:00Z", "message_count": 4},
                {"id": "c2", "title": "Dogs"}
            ]
        })))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri());
    let conversations = client.list_conversations().await.unwrap();

    assert_eq!(conversations.len(), 2);
    assert_eq!(conversations[0].title, "Cats");
    assert_eq!(conversations[0].message_count, Some(4));
    assert!(conversations[0].updated_at.is_some());
    assert_eq!(conversations[1].id, "c2");
    assert!(conversations[1].updated_at.is_none());
}

#[tokio::test]
async fn test_create_conversation_sends_title() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/conversations/"))
        .and(body_json(json!({"title": "New Chat"})))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"id": "c9", "title": "New Chat"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri());
    let conversation = client.create_conversation("New Chat").await.unwrap();

    assert_eq!(conversation.id, "c9");
    assert_eq!(conversation.title, "New Chat");
}

#[tokio::test]
async fn test_get_conversation_with_media() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/conversations/c1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "c1",
            "title": "Cats",
            "messages": [
                message_json("m1", "user", "draw a cat"),
                {
                    "id": "m2",
                    "role": "assistant",
                    "content": "Here you go",
                    "generated_contents": [
                        {"image_url": "/media/cat.mp4", "title": "Cat", "content_type": "video"}
                    ]
                }
            ]
        })))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri());
    let detail = client.get_conversation("c1").await.unwrap();

    assert_eq!(detail.title, "Cats");
    assert_eq!(detail.messages.len(), 2);
    assert_eq!(detail.messages[0].role, Role::User);
    let media = &detail.messages[1].generated_contents[0];
    assert_eq!(media.image_url, "/media/cat.mp4");
    assert_eq!(media.content_type, "video");
}

#[tokio::test]
async fn test_get_missing_conversation_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/conversations/ghost/"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"error": "Conversation not found"})),
        )
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri());
    let err = client.get_conversation("ghost").await.unwrap_err();

    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Conversation not found");
}

#[tokio::test]
async fn test_rename_conversation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/conversations/c1/"))
        .and(body_json(json!({"title": "Felines"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "c1", "title": "Felines"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri());
    let conversation = client.rename_conversation("c1", "Felines").await.unwrap();

    assert_eq!(conversation.title, "Felines");
}

#[tokio::test]
async fn test_delete_conversation_ignores_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/conversations/c1/"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri());
    assert!(client.delete_conversation("c1").await.is_ok());
}

// ============================================================================
// Messages
// ============================================================================

#[tokio::test]
async fn test_send_message_as_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/messages/"))
        .and(body_json(json!({
            "conversation_id": "c1",
            "content": "draw a cat",
            "mode": "auto"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_message": message_json("u1", "user", "draw a cat"),
            "assistant_message": message_json("a1", "assistant", "Here you go"),
            "conversation_title": "Cat drawing"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri());
    let response = client.send_message(&outgoing("draw a cat")).await.unwrap();

    assert_eq!(response.user_message.id, "u1");
    assert_eq!(response.assistant_message.content, "Here you go");
    assert_eq!(response.conversation_title.as_deref(), Some("Cat drawing"));
}

#[tokio::test]
async fn test_send_message_with_refinement() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/messages/"))
        .and(body_json(json!({
            "conversation_id": "c1",
            "content": "make it blue",
            "mode": "image",
            "refinement_url": "/media/cat.png"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_message": message_json("u1", "user", "make it blue"),
            "assistant_message": message_json("a1", "assistant", "Done")
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri());
    let mut message = outgoing("make it blue");
    message.mode = Mode::Image;
    message.refinement_url = Some("/media/cat.png".to_string());
    let response = client.send_message(&message).await.unwrap();

    assert!(response.conversation_title.is_none());
}

#[tokio::test]
async fn test_send_message_with_image_is_multipart() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/messages/"))
        .and(header_exists("content-type"))
        .and(body_string_contains("name=\"image\""))
        .and(body_string_contains("filename=\"cat.png\""))
        .and(body_string_contains("name=\"mode\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "user_message": message_json("u1", "user", "like this"),
            "assistant_message": message_json("a1", "assistant", "Sure")
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri());
    let mut message = outgoing("like this");
    message.image = Some(ImageAttachment::from_bytes("cat.png", b"\x89PNG".to_vec()));
    let response = client.send_message(&message).await.unwrap();

    assert_eq!(response.assistant_message.content, "Sure");
}

#[tokio::test]
async fn test_regenerate() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/messages/m1/regenerate/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(message_json("m1", "assistant", "A different cat")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri());
    let message = client.regenerate("m1").await.unwrap();

    assert_eq!(message.id, "m1");
    assert_eq!(message.content, "A different cat");
}

// ============================================================================
// Errors
// ============================================================================

#[tokio::test]
async fn test_error_without_body_falls_back_to_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/messages/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri());
    let err = client.send_message(&outgoing("hi")).await.unwrap_err();

    assert_eq!(
        err,
        ApiError::Status {
            status: 500,
            message: "API error 500".to_string()
        }
    );
}

#[tokio::test]
async fn test_error_body_message_is_used() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/messages/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(
            json!({"error": "conversation_id and content are required"}),
        ))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri());
    let err = client.send_message(&outgoing("")).await.unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert_eq!(err.to_string(), "conversation_id and content are required");
}

#[tokio::test]
async fn test_malformed_success_body_is_parse_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/conversations/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri());
    let err = client.list_conversations().await.unwrap_err();

    assert!(matches!(err, ApiError::Parse(_)));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Nothing listens on the discard port
    let client = ApiClient::new("http://127.0.0.1:9");
    let err = client.list_conversations().await.unwrap_err();

    assert!(matches!(err, ApiError::Network(_)));
}

// ============================================================================
// Media
// ============================================================================

#[tokio::test]
async fn test_fetch_media_resolves_relative_url() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/media/cat.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PNGDATA".to_vec()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri());
    let bytes = client.fetch_media("/media/cat.png").await.unwrap();

    assert_eq!(bytes, b"PNGDATA".to_vec());
}

#[tokio::test]
async fn test_fetch_missing_media() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/media/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = ApiClient::new(mock_server.uri());
    let err = client
        .fetch_media(&format!("{}/media/gone.png", mock_server.uri()))
        .await
        .unwrap_err();

    assert!(err.is_not_found());
}
