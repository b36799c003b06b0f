//! HTTP implementation of [`ChatBackend`] over the server's JSON API.
//!
//! Every call is a single request: no retries, no caching, no timeouts.
//! Non-success statuses are turned into [`ApiError::Status`] with the message
//! taken from the `{"error": ...}` body when the server sends one.

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

use super::backend::{ApiError, ChatBackend};
use super::types::{
    Conversation, ConversationDetail, ConversationList, Message, OutgoingMessage,
    SendMessageResponse, TitleRequest,
};

pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Creates a client rooted at `base_url` (e.g. `http://localhost:8000`).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Resolves a media URL: absolute URLs pass through, paths are joined to the base.
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else if url.starts_with('/') {
            self.url(url)
        } else {
            format!("{}/{}", self.base_url, url)
        }
    }

    /// Sends the request and maps transport failures and non-success statuses.
    async fn execute(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        debug!("Response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("API error: {} - {}", status.as_u16(), body);
            return Err(ApiError::from_status(status.as_u16(), &body));
        }

        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }

    fn multipart_form(message: &OutgoingMessage) -> Result<Form, ApiError> {
        let mut form = Form::new()
            .text("conversation_id", message.conversation_id.clone())
            .text("content", message.content.clone())
            .text("mode", message.mode.as_str());

        if let Some(url) = &message.refinement_url {
            form = form.text("refinement_url", url.clone());
        }

        if let Some(image) = &message.image {
            let part = Part::bytes(image.bytes.clone())
                .file_name(image.file_name.clone())
                .mime_str(&image.mime)
                .map_err(|e| ApiError::Request(e.to_string()))?;
            form = form.part("image", part);
        }

        Ok(form)
    }
}

#[async_trait]
impl ChatBackend for ApiClient {
    async fn list_conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        debug!("GET /api/conversations/");
        let response = self
            .execute(self.client.get(self.url("/api/conversations/")))
            .await?;
        let list: ConversationList = Self::decode(response).await?;
        Ok(list.conversations)
    }

    async fn create_conversation(&self, title: &str) -> Result<Conversation, ApiError> {
        info!("Creating conversation '{}'", title);
        let response = self
            .execute(
                self.client
                    .post(self.url("/api/conversations/"))
                    .json(&TitleRequest { title }),
            )
            .await?;
        Self::decode(response).await
    }

    async fn get_conversation(&self, id: &str) -> Result<ConversationDetail, ApiError> {
        debug!("GET /api/conversations/{}/", id);
        let response = self
            .execute(self.client.get(self.url(&format!("/api/conversations/{id}/"))))
            .await?;
        Self::decode(response).await
    }

    async fn rename_conversation(&self, id: &str, title: &str) -> Result<Conversation, ApiError> {
        info!("Renaming conversation {} to '{}'", id, title);
        let response = self
            .execute(
                self.client
                    .put(self.url(&format!("/api/conversations/{id}/")))
                    .json(&TitleRequest { title }),
            )
            .await?;
        Self::decode(response).await
    }

    async fn delete_conversation(&self, id: &str) -> Result<(), ApiError> {
        info!("Deleting conversation {}", id);
        self.execute(
            self.client
                .delete(self.url(&format!("/api/conversations/{id}/"))),
        )
        .await?;
        Ok(())
    }

    async fn send_message(
        &self,
        message: &OutgoingMessage,
    ) -> Result<SendMessageResponse, ApiError> {
        let request = self.client.post(self.url("/api/messages/"));
        let request = if message.image.is_some() {
            info!(
                "Sending multipart message: conversation={}, mode={:?}",
                message.conversation_id, message.mode
            );
            request.multipart(Self::multipart_form(message)?)
        } else {
            info!(
                "Sending message: conversation={}, mode={:?}, refinement={}",
                message.conversation_id,
                message.mode,
                message.refinement_url.is_some()
            );
            request.json(message)
        };

        let response = self.execute(request).await?;
        Self::decode(response).await
    }

    async fn regenerate(&self, message_id: &str) -> Result<Message, ApiError> {
        info!("Regenerating message {}", message_id);
        let response = self
            .execute(
                self.client
                    .post(self.url(&format!("/api/messages/{message_id}/regenerate/"))),
            )
            .await?;
        Self::decode(response).await
    }

    async fn fetch_media(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let resolved = self.resolve_url(url);
        debug!("Fetching media {}", resolved);
        let response = self.execute(self.client.get(&resolved)).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
