//! Client events and actions.

use crate::model::{
    Attachment, ChatMessage, ConversationPage, CounterpartyProfile, MessageId, OutgoingEnvelope,
    PhotoSelection, StatusUpdate, UserId,
};

/// Which conversations the roster shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RosterFilter {
    /// Every conversation.
    #[default]
    All,
    /// Only conversations with unread messages.
    UnreadOnly,
}

/// Parameters of one paginated conversation fetch.
///
/// The `generation` ties a response back to the roster state that requested
/// it: filter or search changes bump the generation, so pages that were in
/// flight when the view changed are discarded instead of merged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Zero-based page index.
    pub page: u32,
    /// Page size.
    pub size: u32,
    /// Search term, empty for none.
    pub search: String,
    /// Restrict to conversations with unread messages.
    pub unread_only: bool,
    /// Roster generation this request belongs to.
    pub generation: u64,
}

/// Kind of receipt acknowledgment in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptKind {
    /// "Mark delivered" batch call.
    Delivered,
    /// "Mark seen" call.
    Seen,
}

/// Events the caller feeds into the client.
///
/// The caller is responsible for:
/// - Receiving pushes from the socket and forwarding them here
/// - Reporting REST call completions (success and failure) back as events
/// - Forwarding user intents (navigate, compose, send, delete)
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// Socket session established.
    Connected,

    /// Socket session lost. The transport retries on its own.
    Disconnected,

    /// Message push received on the per-user queue.
    MessageReceived(ChatMessage),

    /// Delivery status push received on the per-user status queue.
    StatusReceived(StatusUpdate),

    /// URL-driven navigation changed the target conversation.
    Navigate {
        /// Counterparty to open, or `None` to close the thread.
        target: Option<UserId>,
    },

    /// Roster tab switched.
    SetFilter(RosterFilter),

    /// Roster search term changed (already debounced by the caller).
    SetSearch(String),

    /// The last rendered roster row became visible (infinite scroll).
    LastRowVisible,

    /// A conversation page fetch completed.
    PageFetched {
        /// The request this page answers.
        request: PageRequest,
        /// Fetched page.
        page: ConversationPage,
    },

    /// A conversation page fetch failed.
    PageFetchFailed {
        /// The request that failed.
        request: PageRequest,
        /// Failure description.
        reason: String,
    },

    /// A chat history fetch completed.
    HistoryFetched {
        /// Conversation the history belongs to.
        user_id: UserId,
        /// History generation at request time.
        generation: u64,
        /// Full message history, oldest first.
        messages: Vec<ChatMessage>,
    },

    /// A chat history fetch failed.
    HistoryFetchFailed {
        /// Conversation the fetch was for.
        user_id: UserId,
        /// History generation at request time.
        generation: u64,
        /// Failure description.
        reason: String,
    },

    /// A counterparty profile fetch completed.
    ProfileFetched {
        /// Fetched profile.
        profile: CounterpartyProfile,
    },

    /// A counterparty profile fetch failed.
    ProfileFetchFailed {
        /// Counterparty the fetch was for.
        user_id: UserId,
        /// Failure description.
        reason: String,
    },

    /// The authoritative unread total was fetched.
    UnreadCountFetched {
        /// Total unread messages across all conversations.
        count: u32,
    },

    /// Compose buffer replaced with new text.
    ComposeInput(String),

    /// Photos picked for the compose area.
    PhotosSelected(Vec<PhotoSelection>),

    /// Photo removed from the compose area by index.
    PhotoRemoved(usize),

    /// User pressed send.
    SendRequested,

    /// A photo upload completed; the server returns the stored message.
    UploadCompleted {
        /// Stored message with attachment metadata.
        message: ChatMessage,
    },

    /// A photo upload failed.
    UploadFailed {
        /// Failure description.
        reason: String,
    },

    /// User confirmed deletion of a message.
    DeleteMessageRequested(MessageId),

    /// User confirmed deletion of a whole conversation.
    DeleteConversationRequested(UserId),

    /// A receipt call finished, successfully or not.
    ///
    /// Clears the in-flight marker either way; a failed receipt simply
    /// retries on the next inbound event.
    ReceiptSettled {
        /// Which receipt call settled.
        kind: ReceiptKind,
        /// Counterparty the call was for.
        user_id: UserId,
    },

    /// Lightbox opened on a message's attachments.
    LightboxOpened {
        /// Attachments to browse.
        attachments: Vec<Attachment>,
        /// Initially shown attachment.
        index: usize,
    },

    /// Lightbox dismissed.
    LightboxClosed,

    /// Lightbox advanced to the next photo.
    LightboxNext,

    /// Lightbox moved to the previous photo.
    LightboxPrev,
}

/// Actions the client produces for the caller to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum ChatAction {
    /// Fetch one page of conversations.
    FetchPage(PageRequest),

    /// Fetch the full history of a conversation.
    ///
    /// The backend marks the conversation read as a side effect.
    FetchHistory {
        /// Conversation to fetch.
        user_id: UserId,
        /// Generation to echo back in `HistoryFetched`.
        generation: u64,
    },

    /// Re-fetch the authoritative global unread total.
    FetchUnreadCount,

    /// Fetch a counterparty's public profile.
    FetchProfile {
        /// Counterparty to fetch.
        user_id: UserId,
    },

    /// Mark all messages from a sender as seen.
    MarkSeen {
        /// Sender whose messages were seen.
        user_id: UserId,
    },

    /// Mark a conversation as read.
    MarkRead {
        /// Conversation counterparty.
        user_id: UserId,
    },

    /// Mark messages from the given senders as delivered.
    MarkDelivered {
        /// Senders whose messages were delivered.
        sender_ids: Vec<UserId>,
    },

    /// Publish a text-only message over the socket.
    Publish(OutgoingEnvelope),

    /// Upload a photo message via multipart REST.
    Upload {
        /// Target counterparty.
        recipient_id: UserId,
        /// Optional caption text.
        content: String,
        /// Photos to upload, in selection order.
        photos: Vec<PhotoSelection>,
    },

    /// Delete a message server-side.
    DeleteMessage(MessageId),

    /// Delete a whole conversation server-side.
    DeleteConversation(UserId),

    /// Show a blocking alert for a user-initiated failure.
    Alert {
        /// Message to display.
        message: String,
    },

    /// Re-render the UI.
    Render,
}
