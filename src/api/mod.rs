pub mod backend;
pub mod client;
pub mod types;

pub use backend::{ApiError, ChatBackend};
pub use client::ApiClient;
pub use types::{
    Conversation, ConversationDetail, GeneratedContent, ImageAttachment, Message, Mode,
    OutgoingMessage, Role, SendMessageResponse, TEMP_USER_ID,
};
