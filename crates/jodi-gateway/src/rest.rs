//! REST client for the chat API.
//!
//! Thin request layer; every call attaches the bearer token and maps
//! authorization rejections to [`GatewayError::Forbidden`] so callers can
//! redirect to sign-in.

use jodi_chat::{
    ChatMessage, ConversationPage, CounterpartyProfile, MessageId, PageRequest, UserId,
};
use serde::Deserialize;

use crate::{config::GatewayConfig, error::GatewayError};

/// One file resolved from a photo selection, ready for multipart upload.
#[derive(Debug, Clone)]
pub struct UploadPart {
    /// File name sent to the server.
    pub file_name: String,
    /// MIME content type.
    pub content_type: String,
    /// File contents.
    pub bytes: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct UnreadCount {
    count: u32,
}

/// Authenticated client for the chat REST endpoints.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    config: GatewayConfig,
}

impl RestClient {
    /// Create a client over the given config.
    pub fn new(config: GatewayConfig) -> Self {
        Self { http: reqwest::Client::new(), config }
    }

    /// Fetch one page of the conversation listing.
    pub async fn conversations(
        &self,
        request: &PageRequest,
    ) -> Result<ConversationPage, GatewayError> {
        let response = self
            .http
            .get(self.url("/chat/conversations"))
            .bearer_auth(&self.config.token)
            .query(&[
                ("page", request.page.to_string()),
                ("size", request.size.to_string()),
                ("search", request.search.clone()),
                ("unreadOnly", request.unread_only.to_string()),
            ])
            .send()
            .await?;
        Ok(check(response)?.json().await?)
    }

    /// Fetch the full history of a conversation. The backend marks the
    /// conversation read as a side effect.
    pub async fn history(&self, user_id: UserId) -> Result<Vec<ChatMessage>, GatewayError> {
        let response = self
            .http
            .get(self.url(&format!("/chat/history/{user_id}")))
            .bearer_auth(&self.config.token)
            .send()
            .await?;
        Ok(check(response)?.json().await?)
    }

    /// Fetch the authoritative global unread total.
    pub async fn unread_count(&self) -> Result<u32, GatewayError> {
        let response = self
            .http
            .get(self.url("/chat/unread-count"))
            .bearer_auth(&self.config.token)
            .send()
            .await?;
        let body: UnreadCount = check(response)?.json().await?;
        Ok(body.count)
    }

    /// Fetch a counterparty's public profile.
    pub async fn profile(&self, user_id: UserId) -> Result<CounterpartyProfile, GatewayError> {
        let response = self
            .http
            .get(self.url(&format!("/profile/user/{user_id}")))
            .bearer_auth(&self.config.token)
            .send()
            .await?;
        Ok(check(response)?.json().await?)
    }

    /// Mark a conversation as read.
    pub async fn mark_read(&self, user_id: UserId) -> Result<(), GatewayError> {
        let response = self
            .http
            .put(self.url(&format!("/chat/read/{user_id}")))
            .bearer_auth(&self.config.token)
            .send()
            .await?;
        check(response)?;
        Ok(())
    }

    /// Mark messages from the given senders as delivered.
    pub async fn mark_delivered(&self, sender_ids: &[UserId]) -> Result<(), GatewayError> {
        let response = self
            .http
            .put(self.url("/chat/messages/deliver"))
            .bearer_auth(&self.config.token)
            .json(&serde_json::json!({ "senderIds": sender_ids }))
            .send()
            .await?;
        check(response)?;
        Ok(())
    }

    /// Mark all messages from one sender as seen.
    pub async fn mark_seen(&self, user_id: UserId) -> Result<(), GatewayError> {
        let response = self
            .http
            .put(self.url(&format!("/chat/messages/seen/{user_id}")))
            .bearer_auth(&self.config.token)
            .send()
            .await?;
        check(response)?;
        Ok(())
    }

    /// Delete one message server-side.
    pub async fn delete_message(&self, id: MessageId) -> Result<(), GatewayError> {
        let response = self
            .http
            .delete(self.url(&format!("/chat/message/{id}")))
            .bearer_auth(&self.config.token)
            .send()
            .await?;
        check(response)?;
        Ok(())
    }

    /// Delete a whole conversation server-side.
    pub async fn delete_conversation(&self, user_id: UserId) -> Result<(), GatewayError> {
        let response = self
            .http
            .delete(self.url(&format!("/chat/conversation/{user_id}")))
            .bearer_auth(&self.config.token)
            .send()
            .await?;
        check(response)?;
        Ok(())
    }

    /// Send a photo message via multipart upload. Returns the stored message
    /// with attachment metadata.
    pub async fn upload(
        &self,
        recipient_id: UserId,
        content: &str,
        parts: Vec<UploadPart>,
    ) -> Result<ChatMessage, GatewayError> {
        let mut form = reqwest::multipart::Form::new()
            .text("recipientId", recipient_id.to_string())
            .text("content", content.to_string());

        for part in parts {
            let file = reqwest::multipart::Part::bytes(part.bytes)
                .file_name(part.file_name)
                .mime_str(&part.content_type)
                .map_err(|e| GatewayError::Malformed(format!("invalid content type: {e}")))?;
            form = form.part("files", file);
        }

        let response = self
            .http
            .post(self.url("/chat/upload"))
            .bearer_auth(&self.config.token)
            .multipart(form)
            .send()
            .await?;
        Ok(check(response)?.json().await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url)
    }
}

/// Map an error response to the gateway taxonomy: 401/403 become
/// [`GatewayError::Forbidden`], other error codes keep their status.
fn check(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(GatewayError::Forbidden);
    }
    if !status.is_success() {
        return Err(GatewayError::Http { status: status.as_u16() });
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_paths_onto_the_api_base() {
        let client =
            RestClient::new(GatewayConfig::new("https://api.jodi.example", "wss://x", "t"));
        assert_eq!(
            client.url(&format!("/chat/history/{}", UserId(7))),
            "https://api.jodi.example/chat/history/7"
        );
    }
}
