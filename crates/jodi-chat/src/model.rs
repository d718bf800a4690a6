//! Wire and domain types shared by the chat core and the gateway.
//!
//! These mirror the JSON shapes the backend produces: REST responses use
//! camelCase field names and message timestamps are RFC 3339 strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable identifier of a platform user (the counterparty key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Server-assigned message identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Delivery lifecycle of a message.
///
/// Progresses `Sent -> Delivered -> Seen`; `Deleted` is terminal and removes
/// the message from visible history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryState {
    /// Accepted by the server, not yet delivered to the recipient device.
    #[default]
    Sent,
    /// Delivered to the recipient device, not yet viewed.
    Delivered,
    /// Viewed by the recipient.
    Seen,
    /// Deleted by the sender. Terminal.
    Deleted,
}

impl DeliveryState {
    /// Position in the Sent -> Delivered -> Seen progression.
    fn rank(self) -> u8 {
        match self {
            Self::Sent => 0,
            Self::Delivered => 1,
            Self::Seen => 2,
            Self::Deleted => 3,
        }
    }

    /// Apply a status transition, enforcing monotonic progression.
    ///
    /// A `Deleted` state never changes, and a stale update (e.g. `Delivered`
    /// arriving after `Seen`) is ignored. Status pushes and history refetches
    /// race freely, so regressions must be rejected here.
    pub fn advance(self, to: Self) -> Self {
        if self == Self::Deleted {
            return self;
        }
        if to.rank() > self.rank() { to } else { self }
    }
}

/// A photo attached to a message, as stored by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// Server-assigned attachment identifier.
    pub id: i64,
    /// Stored file name.
    pub file_name: String,
    /// File name as uploaded by the sender.
    pub original_name: String,
    /// File size in bytes.
    pub file_size: u64,
    /// MIME content type.
    pub content_type: String,
    /// Retrieval URL.
    pub url: String,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Server-assigned identifier. `None` only for optimistic local echoes
    /// that have not round-tripped yet.
    #[serde(default)]
    pub id: Option<MessageId>,
    /// Author of the message.
    pub sender_id: UserId,
    /// Recipient of the message.
    pub recipient_id: UserId,
    /// Message text.
    pub content: String,
    /// Server timestamp.
    pub timestamp: DateTime<Utc>,
    /// Delivery lifecycle state.
    #[serde(default)]
    pub status: DeliveryState,
    /// Attached photos, oldest first. Usually empty.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// One entry in the conversation roster, keyed by counterparty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Counterparty user. Unique within the roster.
    pub user_id: UserId,
    /// Counterparty display name.
    pub name: String,
    /// Counterparty avatar URL, if any.
    #[serde(default)]
    pub profile_picture: Option<String>,
    /// Preview of the most recent message.
    #[serde(default)]
    pub last_message: String,
    /// Timestamp of the most recent message. `None` for drafts that have no
    /// messages yet.
    #[serde(default)]
    pub last_message_time: Option<DateTime<Utc>>,
    /// Number of unread messages in this conversation.
    #[serde(default)]
    pub unread_count: u32,
    /// Counterparty presence.
    #[serde(default)]
    pub online: bool,
}

impl Conversation {
    /// Synthesize a draft conversation for a counterparty the server does not
    /// know about yet (deep link or "new chat" flow).
    pub fn draft(profile: &CounterpartyProfile) -> Self {
        Self {
            user_id: profile.user_id,
            name: profile.display_name(),
            profile_picture: profile.profile_picture.clone(),
            last_message: String::new(),
            last_message_time: None,
            unread_count: 0,
            online: profile.online,
        }
    }
}

/// One page of the paginated conversation listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationPage {
    /// Conversations in this page, most recent first.
    pub content: Vec<Conversation>,
    /// Whether this is the final page.
    pub last: bool,
}

/// Delivery status push for one or more messages.
///
/// Wire shape: `{"type": "STATUS_UPDATE", "messageIds": [...], "status": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    /// Messages the update applies to.
    pub message_ids: Vec<MessageId>,
    /// New delivery state.
    pub status: DeliveryState,
}

/// Outbound text message envelope published over the socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutgoingEnvelope {
    /// Local user.
    pub sender_id: UserId,
    /// Target counterparty.
    pub recipient_id: UserId,
    /// Message text.
    pub content: String,
}

/// Public profile of a counterparty, fetched to synthesize draft
/// conversations for deep links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterpartyProfile {
    /// Platform user id.
    pub user_id: UserId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Avatar URL, if any.
    #[serde(default)]
    pub profile_picture: Option<String>,
    /// Presence at fetch time.
    #[serde(default)]
    pub online: bool,
}

impl CounterpartyProfile {
    /// Full display name.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// A photo picked for the compose area, before upload.
///
/// The core only sees metadata; the gateway resolves selections to bytes when
/// it executes the upload action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoSelection {
    /// Local file name.
    pub file_name: String,
    /// MIME content type.
    pub content_type: String,
    /// File size in bytes.
    pub size: u64,
}
