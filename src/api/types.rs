use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Reserved id carried by the optimistic user message until the server answers.
pub const TEMP_USER_ID: &str = "temp-user";

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "system")]
    System,
}

/// Conversation summary as listed by the server.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Conversation {
    pub id: String,
    pub title: String,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_count: Option<usize>,
}

impl Conversation {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            created_at: None,
            updated_at: None,
            message_count: None,
        }
    }
}

/// Timestamps are display-only, so anything unreadable becomes `None`
/// instead of failing the whole payload. Naive values are taken as UTC.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(|v| v.as_str()).and_then(parse_timestamp))
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    s.replacen(' ', "T", 1)
        .parse::<NaiveDateTime>()
        .ok()
        .map(|naive| naive.and_utc())
}

/// A generated asset attached to an assistant message. `image_url` may
/// point at a video file; the extension decides how it is shown.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GeneratedContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub image_url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default)]
    pub description: String,
}

fn default_content_type() -> String {
    "image".to_string()
}

impl GeneratedContent {
    pub fn new(image_url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: None,
            image_url: image_url.into(),
            title: title.into(),
            content_type: default_content_type(),
            description: String::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub generated_contents: Vec<GeneratedContent>,
}

impl Message {
    pub fn new(id: impl Into<String>, role: Role, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role,
            content: content.into(),
            message_type: None,
            created_at: None,
            generated_contents: Vec::new(),
        }
    }

    /// The optimistic stand-in shown between submit and server acknowledgement.
    pub fn temp_user(content: impl Into<String>) -> Self {
        Self::new(TEMP_USER_ID, Role::User, content)
    }

    pub fn is_temp(&self) -> bool {
        self.id == TEMP_USER_ID
    }

    pub fn with_contents(mut self, contents: Vec<GeneratedContent>) -> Self {
        self.generated_contents = contents;
        self
    }
}

/// Hint sent with each message telling the server what kind of media to produce.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    #[serde(rename = "auto")]
    #[default]
    Auto,
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "video")]
    Video,
}

impl Mode {
    /// Cycles to the next mode (wraps around)
    pub fn next(self) -> Mode {
        match self {
            Mode::Auto => Mode::Image,
            Mode::Image => Mode::Video,
            Mode::Video => Mode::Auto,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Auto => "Auto",
            Mode::Image => "Image",
            Mode::Video => "Video",
        }
    }

    /// Wire value, as used in multipart forms.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Auto => "auto",
            Mode::Image => "image",
            Mode::Video => "video",
        }
    }
}

/// A binary image picked by the user for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ImageAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageAttachment")
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ImageAttachment {
    /// Guesses the MIME type from the file extension, defaulting to PNG.
    pub fn from_bytes(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let ext = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        let mime = match ext.as_str() {
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "webp" => "image/webp",
            _ => "image/png",
        };
        Self {
            file_name,
            mime: mime.to_string(),
            bytes,
        }
    }
}

/// Everything `POST /api/messages/` needs. Serialized as JSON when no image is
/// attached; otherwise the client switches to a multipart form.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    pub conversation_id: String,
    pub content: String,
    pub mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refinement_url: Option<String>,
    #[serde(skip)]
    pub image: Option<ImageAttachment>,
}

#[derive(Deserialize, Debug)]
pub struct ConversationList {
    pub conversations: Vec<Conversation>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ConversationDetail {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
}

#[derive(Serialize, Debug)]
pub struct TitleRequest<'a> {
    pub title: &'a str,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct SendMessageResponse {
    pub user_message: Message,
    pub assistant_message: Message,
    #[serde(default)]
    pub conversation_title: Option<String>,
}

/// Error body convention shared by every endpoint.
#[derive(Deserialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_message_deserializes_with_optional_fields_missing() {
        let json = r#"{"id":"m1","role":"assistant","content":"hi"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.generated_contents.is_empty());
        assert!(msg.created_at.is_none());
    }

    #[test]
    fn test_message_deserializes_server_shape() {
        let json = r#"{
            "id": "0b6c",
            "role": "assistant",
            "content": "Here you go",
            "message_type": "image_generation",
            "created_at": "2024-05-01T10:00:00+00:00",
            "generated_contents": [
                {"id": "g1", "content_type": "poster", "title": "Sunset", "description": "", "image_url": "/media/a.png"}
            ]
        }"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.message_type.as_deref(), Some("image_generation"));
        assert_eq!(msg.generated_contents.len(), 1);
        assert_eq!(msg.generated_contents[0].content_type, "poster");
        assert!(msg.created_at.is_some());
    }

    #[test]
    fn test_odd_timestamps_do_not_fail_decoding() {
        let json = r#"{"conversations": [
            {"id": "c1", "title": "Naive", "created_at": "2024-05-01T10:00:00.123456", "updated_at": "2024-05-01 11:00:00"},
            {"id": "c2", "title": "Junk", "created_at": "yesterday", "updated_at": null},
            {"id": "c3", "title": "Epoch", "created_at": 1714557600}
        ]}"#;
        let list: ConversationList = serde_json::from_str(json).unwrap();
        let [naive, junk, epoch] = &list.conversations[..] else {
            panic!("expected three conversations");
        };

        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 11, 0, 0).unwrap();
        assert_eq!(naive.updated_at, Some(expected));
        assert_eq!(
            naive.created_at.map(|ts| ts.timestamp()),
            Some(expected.timestamp() - 3600)
        );
        assert!(junk.created_at.is_none() && junk.updated_at.is_none());
        assert!(epoch.created_at.is_none());
    }

    #[test]
    fn test_generated_content_defaults_content_type() {
        let json = r#"{"image_url":"/media/a.mp4"}"#;
        let gc: GeneratedContent = serde_json::from_str(json).unwrap();
        assert_eq!(gc.content_type, "image");
        assert_eq!(gc.title, "");
    }

    #[test]
    fn test_outgoing_message_skips_absent_refinement_and_image() {
        let msg = OutgoingMessage {
            conversation_id: "c1".to_string(),
            content: "hello".to_string(),
            mode: Mode::Video,
            refinement_url: None,
            image: Some(ImageAttachment::from_bytes("a.png", vec![1, 2, 3])),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(
            json,
            r#"{"conversation_id":"c1","content":"hello","mode":"video"}"#
        );
    }

    #[test]
    fn test_mode_cycle() {
        assert_eq!(Mode::Auto.next(), Mode::Image);
        assert_eq!(Mode::Image.next(), Mode::Video);
        assert_eq!(Mode::Video.next(), Mode::Auto);
    }

    #[test]
    fn test_attachment_mime_guess() {
        assert_eq!(ImageAttachment::from_bytes("x.JPG", vec![]).mime, "image/jpeg");
        assert_eq!(ImageAttachment::from_bytes("x.webp", vec![]).mime, "image/webp");
        assert_eq!(ImageAttachment::from_bytes("noext", vec![]).mime, "image/png");
    }

    #[test]
    fn test_temp_user_message() {
        let msg = Message::temp_user("Hello");
        assert!(msg.is_temp());
        assert_eq!(msg.role, Role::User);
    }
}
