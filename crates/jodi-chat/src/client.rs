//! Chat client state machine.
//!
//! [`ChatClient`] is the top-level state machine tying together the roster,
//! the active thread, receipt tracking, and the compose area. It is pure: all
//! I/O happens in the caller, which executes the returned [`ChatAction`]s and
//! feeds completions back in as [`ChatEvent`]s.
//!
//! # Responsibilities
//!
//! - Routes inbound pushes to receipt acknowledgments (seen vs delivered).
//! - Reconciles URL-driven navigation with the in-memory roster, including
//!   draft conversations for counterparties the server has never seen.
//! - Guards against stale responses: history and page fetches carry a
//!   generation that is checked before the result is applied.
//! - Keeps the global unread counter authoritative by re-fetching it instead
//!   of doing decrement arithmetic.

use crate::{
    compose::{Composer, SendPlan},
    error::ChatError,
    event::{ChatAction, ChatEvent},
    lightbox::Lightbox,
    model::{
        ChatMessage, Conversation, CounterpartyProfile, DeliveryState, MessageId, StatusUpdate,
        UserId,
    },
    receipts::ReceiptTracker,
    roster::Roster,
    thread::ActiveThread,
};

/// Socket connection state, tracked for UI feedback.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected.
    #[default]
    Disconnected,
    /// Connection in progress.
    Connecting,
    /// Session established.
    Connected,
}

/// Chat client state machine.
///
/// Pure state machine that processes events and produces actions.
/// No I/O dependencies - fully testable without a network.
#[derive(Debug, Clone)]
pub struct ChatClient {
    /// Local authenticated user.
    local_user: UserId,
    /// Socket connection state.
    connection: ConnectionState,
    /// Conversation list reconciler.
    roster: Roster,
    /// History of the open conversation.
    thread: ActiveThread,
    /// In-flight receipt de-duplication.
    receipts: ReceiptTracker,
    /// Compose area.
    composer: Composer,
    /// Photo viewer.
    lightbox: Lightbox,
    /// Authoritative unread total, replaced by fetch only.
    unread_total: u32,
    /// Snapshot of the open conversation. Kept even when a list refresh on
    /// the unread filter drops the entry, so it can be re-spliced later.
    active: Option<Conversation>,
    /// Deep-link target awaiting a profile fetch.
    pending_nav: Option<UserId>,
    /// Generation of the newest history fetch; older responses are stale.
    history_generation: u64,
}

impl ChatClient {
    /// Create a client for the authenticated user with the given roster page
    /// size.
    pub fn new(local_user: UserId, page_size: u32) -> Self {
        Self {
            local_user,
            connection: ConnectionState::Disconnected,
            roster: Roster::new(page_size),
            thread: ActiveThread::new(),
            receipts: ReceiptTracker::new(),
            composer: Composer::new(),
            lightbox: Lightbox::new(),
            unread_total: 0,
            active: None,
            pending_nav: None,
            history_generation: 0,
        }
    }

    /// Initial actions when the messaging surface mounts: load the first
    /// conversation page while the socket connects.
    pub fn start(&mut self) -> Vec<ChatAction> {
        self.connection = ConnectionState::Connecting;
        vec![ChatAction::FetchPage(self.roster.first_page_request()), ChatAction::Render]
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: ChatEvent) -> Result<Vec<ChatAction>, ChatError> {
        match event {
            ChatEvent::Connected => {
                self.connection = ConnectionState::Connected;
                Ok(vec![ChatAction::FetchUnreadCount, ChatAction::Render])
            },
            ChatEvent::Disconnected => {
                self.connection = ConnectionState::Disconnected;
                Ok(vec![ChatAction::Render])
            },
            ChatEvent::MessageReceived(message) => Ok(self.handle_push(message)),
            ChatEvent::StatusReceived(update) => Ok(self.handle_status(&update)),
            ChatEvent::Navigate { target } => Ok(self.handle_navigate(target)),
            ChatEvent::SetFilter(filter) => {
                let request = self.roster.set_filter(filter);
                Ok(vec![ChatAction::FetchPage(request), ChatAction::Render])
            },
            ChatEvent::SetSearch(search) => {
                let request = self.roster.set_search(search);
                Ok(vec![ChatAction::FetchPage(request), ChatAction::Render])
            },
            ChatEvent::LastRowVisible => Ok(self
                .roster
                .next_page_request()
                .map(ChatAction::FetchPage)
                .into_iter()
                .collect()),
            ChatEvent::PageFetched { request, page } => {
                if self.roster.apply_page(&request, page, self.active.as_ref()) {
                    Ok(vec![ChatAction::Render])
                } else {
                    Ok(vec![])
                }
            },
            ChatEvent::PageFetchFailed { request, reason } => {
                tracing::warn!(%reason, page = request.page, "conversation page fetch failed");
                self.roster.fetch_failed(&request);
                Ok(vec![])
            },
            ChatEvent::HistoryFetched { user_id, generation, messages } => {
                Ok(self.handle_history(user_id, generation, messages))
            },
            ChatEvent::HistoryFetchFailed { user_id, generation, reason } => {
                tracing::warn!(%reason, %user_id, "chat history fetch failed");
                if generation == self.history_generation
                    && self.active.as_ref().is_some_and(|a| a.user_id == user_id)
                {
                    // Show an empty thread rather than spinning forever
                    self.thread.apply_history(Vec::new());
                    return Ok(vec![ChatAction::Render]);
                }
                Ok(vec![])
            },
            ChatEvent::ProfileFetched { profile } => Ok(self.handle_profile(profile)),
            ChatEvent::ProfileFetchFailed { user_id, reason } => {
                tracing::warn!(%reason, %user_id, "profile fetch for chat failed");
                if self.pending_nav == Some(user_id) {
                    self.pending_nav = None;
                }
                Ok(vec![])
            },
            ChatEvent::UnreadCountFetched { count } => {
                self.unread_total = count;
                Ok(vec![ChatAction::Render])
            },
            ChatEvent::ComposeInput(draft) => {
                self.composer.set_draft(draft);
                Ok(vec![ChatAction::Render])
            },
            ChatEvent::PhotosSelected(photos) => {
                let mut actions: Vec<ChatAction> = self
                    .composer
                    .add_photos(photos)
                    .into_iter()
                    .map(|message| ChatAction::Alert { message })
                    .collect();
                actions.push(ChatAction::Render);
                Ok(actions)
            },
            ChatEvent::PhotoRemoved(index) => {
                self.composer.remove_photo(index);
                Ok(vec![ChatAction::Render])
            },
            ChatEvent::SendRequested => self.handle_send(),
            ChatEvent::UploadCompleted { message } => Ok(self.handle_upload_completed(message)),
            ChatEvent::UploadFailed { reason } => {
                // Draft and photos stay in the composer for retry
                Ok(vec![ChatAction::Alert { message: reason }, ChatAction::Render])
            },
            ChatEvent::DeleteMessageRequested(id) => Ok(self.handle_delete_message(id)),
            ChatEvent::DeleteConversationRequested(user_id) => {
                self.handle_delete_conversation(user_id)
            },
            ChatEvent::ReceiptSettled { kind, user_id } => {
                self.receipts.settle(kind, user_id);
                Ok(vec![])
            },
            ChatEvent::LightboxOpened { attachments, index } => {
                self.lightbox.open(attachments, index);
                Ok(vec![ChatAction::Render])
            },
            ChatEvent::LightboxClosed => {
                self.lightbox.close();
                Ok(vec![ChatAction::Render])
            },
            ChatEvent::LightboxNext => {
                self.lightbox.next();
                Ok(vec![ChatAction::Render])
            },
            ChatEvent::LightboxPrev => {
                self.lightbox.prev();
                Ok(vec![ChatAction::Render])
            },
        }
    }

    /// Inbound message push: acknowledge receipt, append to the open thread
    /// if relevant, and reorder the roster.
    fn handle_push(&mut self, message: ChatMessage) -> Vec<ChatAction> {
        if message.status == DeliveryState::Deleted {
            if let Some(id) = message.id {
                // Idempotent against an earlier optimistic removal
                self.thread.remove(id);
            }
            self.roster.apply_deleted(&message.content);
            self.sync_active();
            return vec![ChatAction::Render];
        }

        let mut actions = Vec::new();
        let from_self = message.sender_id == self.local_user;
        let active_id = self.active.as_ref().map(|a| a.user_id);

        if !from_self {
            if active_id == Some(message.sender_id) {
                // Viewing this chat: mark seen directly
                if self.receipts.begin_seen(message.sender_id) {
                    actions.push(ChatAction::MarkSeen { user_id: message.sender_id });
                }
                actions.push(ChatAction::MarkRead { user_id: message.sender_id });
                self.roster.zero_unread(message.sender_id);
            } else {
                let batch = self.receipts.begin_delivered(&[message.sender_id]);
                if !batch.is_empty() {
                    actions.push(ChatAction::MarkDelivered { sender_ids: batch });
                }
                actions.push(ChatAction::FetchUnreadCount);
            }
        }

        if let Some(active) = active_id
            && (message.sender_id == active || from_self)
        {
            self.thread.append_if_new(message.clone());
        }

        let counterparty = if from_self { message.recipient_id } else { message.sender_id };
        let increment_unread = !from_self && active_id != Some(message.sender_id);
        if self.roster.apply_push(counterparty, &message, increment_unread) {
            actions.push(ChatAction::FetchProfile { user_id: counterparty });
        }
        self.sync_active();

        actions.push(ChatAction::Render);
        actions
    }

    fn handle_status(&mut self, update: &StatusUpdate) -> Vec<ChatAction> {
        self.thread.apply_status(update);
        vec![ChatAction::Render]
    }

    /// Reconcile URL-driven navigation with the in-memory state.
    fn handle_navigate(&mut self, target: Option<UserId>) -> Vec<ChatAction> {
        let Some(user_id) = target else {
            self.pending_nav = None;
            if self.active.take().is_some() {
                self.thread.close();
                return vec![ChatAction::Render];
            }
            return vec![];
        };

        if self.active.as_ref().is_some_and(|a| a.user_id == user_id) {
            // The link settled on the open thread; a profile fetch still
            // pending for an older link must not steal the selection
            self.pending_nav = None;
            return vec![];
        }

        if let Some(conversation) = self.roster.get(user_id).cloned() {
            // Supersedes any profile fetch still pending for an older link
            self.pending_nav = None;
            return self.select(conversation);
        }

        // Deep link to a counterparty the roster does not know: synthesize a
        // draft once the profile arrives
        if self.pending_nav == Some(user_id) {
            return vec![];
        }
        self.pending_nav = Some(user_id);
        vec![ChatAction::FetchProfile { user_id }]
    }

    fn handle_profile(&mut self, profile: CounterpartyProfile) -> Vec<ChatAction> {
        self.roster.fill_profile(&profile);

        if self.pending_nav == Some(profile.user_id) {
            self.pending_nav = None;
            // A concurrent push may have inserted the entry already
            let conversation = match self.roster.get(profile.user_id) {
                Some(existing) => existing.clone(),
                None => {
                    let draft = Conversation::draft(&profile);
                    self.roster.insert_front_if_absent(draft.clone());
                    draft
                },
            };
            return self.select(conversation);
        }

        vec![ChatAction::Render]
    }

    /// Open a conversation: history fetch plus immediate read mark.
    fn select(&mut self, conversation: Conversation) -> Vec<ChatAction> {
        let user_id = conversation.user_id;
        self.active = Some(conversation);
        self.thread.begin_loading();
        self.history_generation += 1;

        vec![
            ChatAction::FetchHistory { user_id, generation: self.history_generation },
            ChatAction::MarkRead { user_id },
            ChatAction::Render,
        ]
    }

    fn handle_history(
        &mut self,
        user_id: UserId,
        generation: u64,
        messages: Vec<ChatMessage>,
    ) -> Vec<ChatAction> {
        // A stale response after rapid conversation switching must not be
        // applied to the thread that is open now
        if generation != self.history_generation
            || self.active.as_ref().is_none_or(|a| a.user_id != user_id)
        {
            tracing::debug!(%user_id, generation, "discarding stale history response");
            return vec![];
        }

        self.thread.apply_history(messages);
        // The fetch marked the conversation read server-side
        self.roster.zero_unread(user_id);
        self.sync_active();
        vec![ChatAction::FetchUnreadCount, ChatAction::Render]
    }

    fn handle_send(&mut self) -> Result<Vec<ChatAction>, ChatError> {
        let Some(active) = &self.active else {
            if self.composer.is_empty() {
                return Ok(vec![]);
            }
            return Err(ChatError::NoActiveConversation);
        };
        let recipient_id = active.user_id;

        match self.composer.plan_send(self.local_user, recipient_id) {
            Some(SendPlan::Text(envelope)) => {
                Ok(vec![ChatAction::Publish(envelope), ChatAction::Render])
            },
            Some(SendPlan::Upload { recipient_id, content, photos }) => {
                Ok(vec![ChatAction::Upload { recipient_id, content, photos }, ChatAction::Render])
            },
            None => Ok(vec![]),
        }
    }

    fn handle_upload_completed(&mut self, message: ChatMessage) -> Vec<ChatAction> {
        self.composer.clear();

        let recipient = message.recipient_id;
        if self.active.as_ref().is_some_and(|a| a.user_id == recipient) {
            self.thread.append_if_new(message.clone());
        }
        self.roster.apply_push(recipient, &message, false);
        self.sync_active();

        vec![ChatAction::Render]
    }

    fn handle_delete_message(&mut self, id: MessageId) -> Vec<ChatAction> {
        // Optimistic: drop locally first, then tell the server. The
        // authoritative DELETED push that follows is a no-op.
        if self.thread.remove(id) {
            return vec![ChatAction::DeleteMessage(id), ChatAction::Render];
        }
        vec![]
    }

    fn handle_delete_conversation(
        &mut self,
        user_id: UserId,
    ) -> Result<Vec<ChatAction>, ChatError> {
        if self.roster.get(user_id).is_none() {
            return Err(ChatError::UnknownConversation { user_id });
        }

        self.roster.remove(user_id);
        if self.active.as_ref().is_some_and(|a| a.user_id == user_id) {
            self.active = None;
            self.thread.close();
        }
        Ok(vec![ChatAction::DeleteConversation(user_id), ChatAction::Render])
    }

    /// Refresh the active snapshot from the roster so re-splicing after a
    /// filtered refresh carries current preview data.
    fn sync_active(&mut self) {
        if let Some(active) = &self.active
            && let Some(current) = self.roster.get(active.user_id)
        {
            self.active = Some(current.clone());
        }
    }

    /// Local authenticated user.
    pub fn local_user(&self) -> UserId {
        self.local_user
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection
    }

    /// Conversation list, most recent first.
    pub fn conversations(&self) -> &[Conversation] {
        self.roster.conversations()
    }

    /// Roster accessor for pagination state.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// The open conversation's thread.
    pub fn thread(&self) -> &ActiveThread {
        &self.thread
    }

    /// The open conversation, if any.
    pub fn active_conversation(&self) -> Option<&Conversation> {
        self.active.as_ref()
    }

    /// Compose area state.
    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    /// Photo viewer state.
    pub fn lightbox(&self) -> &Lightbox {
        &self.lightbox
    }

    /// Authoritative global unread total.
    pub fn unread_total(&self) -> u32 {
        self.unread_total
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::{
        event::{PageRequest, ReceiptKind, RosterFilter},
        model::{ConversationPage, PhotoSelection},
    };

    const ME: UserId = UserId(10);

    fn client_with_conversations(ids: &[i64]) -> ChatClient {
        let mut client = ChatClient::new(ME, 15);
        let actions = client.start();
        let request = page_request_of(&actions);
        let content = ids.iter().map(|id| conversation(*id)).collect();
        let _ = client
            .handle(ChatEvent::PageFetched {
                request,
                page: ConversationPage { content, last: true },
            })
            .unwrap();
        client
    }

    fn page_request_of(actions: &[ChatAction]) -> PageRequest {
        actions
            .iter()
            .find_map(|a| match a {
                ChatAction::FetchPage(request) => Some(request.clone()),
                _ => None,
            })
            .unwrap()
    }

    fn conversation(user_id: i64) -> Conversation {
        Conversation {
            user_id: UserId(user_id),
            name: format!("User {user_id}"),
            profile_picture: None,
            last_message: "hi".to_string(),
            last_message_time: None,
            unread_count: 0,
            online: false,
        }
    }

    fn push_from(sender: i64, id: i64, content: &str) -> ChatMessage {
        ChatMessage {
            id: Some(MessageId(id)),
            sender_id: UserId(sender),
            recipient_id: ME,
            content: content.to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 2, 14, 13, 0, 0).single().unwrap(),
            status: DeliveryState::Sent,
            attachments: Vec::new(),
        }
    }

    fn open_conversation(client: &mut ChatClient, user_id: i64) {
        let actions = client.handle(ChatEvent::Navigate { target: Some(UserId(user_id)) }).unwrap();
        let generation = actions
            .iter()
            .find_map(|a| match a {
                ChatAction::FetchHistory { generation, .. } => Some(*generation),
                _ => None,
            })
            .unwrap();
        let _ = client
            .handle(ChatEvent::HistoryFetched {
                user_id: UserId(user_id),
                generation,
                messages: vec![],
            })
            .unwrap();
    }

    #[test]
    fn push_from_active_counterparty_marks_seen() {
        let mut client = client_with_conversations(&[1, 2]);
        open_conversation(&mut client, 1);

        let actions = client.handle(ChatEvent::MessageReceived(push_from(1, 100, "hey"))).unwrap();

        assert!(actions.contains(&ChatAction::MarkSeen { user_id: UserId(1) }));
        assert!(actions.contains(&ChatAction::MarkRead { user_id: UserId(1) }));
        assert!(!actions.iter().any(|a| matches!(a, ChatAction::MarkDelivered { .. })));
        assert_eq!(client.conversations()[0].unread_count, 0);
    }

    #[test]
    fn push_from_other_counterparty_marks_delivered_and_refreshes_unread() {
        let mut client = client_with_conversations(&[1, 2]);
        open_conversation(&mut client, 1);

        let actions = client.handle(ChatEvent::MessageReceived(push_from(2, 100, "hey"))).unwrap();

        assert!(actions.contains(&ChatAction::MarkDelivered { sender_ids: vec![UserId(2)] }));
        assert!(actions.contains(&ChatAction::FetchUnreadCount));
        assert!(!actions.iter().any(|a| matches!(a, ChatAction::MarkSeen { .. })));

        // Conversation moved to front with an unread badge
        assert_eq!(client.conversations()[0].user_id, UserId(2));
        assert_eq!(client.conversations()[0].unread_count, 1);
    }

    #[test]
    fn concurrent_delivered_receipt_is_skipped() {
        let mut client = client_with_conversations(&[1, 2]);

        let first = client.handle(ChatEvent::MessageReceived(push_from(2, 100, "a"))).unwrap();
        assert!(first.iter().any(|a| matches!(a, ChatAction::MarkDelivered { .. })));

        // Second push while the first receipt call is still in flight
        let second = client.handle(ChatEvent::MessageReceived(push_from(2, 101, "b"))).unwrap();
        assert!(!second.iter().any(|a| matches!(a, ChatAction::MarkDelivered { .. })));

        // Settling re-arms the receipt
        let _ = client
            .handle(ChatEvent::ReceiptSettled { kind: ReceiptKind::Delivered, user_id: UserId(2) })
            .unwrap();
        let third = client.handle(ChatEvent::MessageReceived(push_from(2, 102, "c"))).unwrap();
        assert!(third.iter().any(|a| matches!(a, ChatAction::MarkDelivered { .. })));
    }

    #[test]
    fn navigate_to_unknown_counterparty_synthesizes_draft() {
        let mut client = client_with_conversations(&[1]);

        let actions = client.handle(ChatEvent::Navigate { target: Some(UserId(99)) }).unwrap();
        assert_eq!(actions, vec![ChatAction::FetchProfile { user_id: UserId(99) }]);

        let profile = CounterpartyProfile {
            user_id: UserId(99),
            first_name: "Priya".into(),
            last_name: "Sharma".into(),
            profile_picture: None,
            online: false,
        };
        let actions = client.handle(ChatEvent::ProfileFetched { profile }).unwrap();

        assert!(actions.iter().any(|a| matches!(a, ChatAction::FetchHistory { .. })));
        assert_eq!(client.conversations()[0].user_id, UserId(99));
        assert_eq!(client.active_conversation().map(|c| c.user_id), Some(UserId(99)));
    }

    #[test]
    fn stale_history_response_is_discarded() {
        let mut client = client_with_conversations(&[1, 2]);

        let first = client.handle(ChatEvent::Navigate { target: Some(UserId(1)) }).unwrap();
        let first_generation = first
            .iter()
            .find_map(|a| match a {
                ChatAction::FetchHistory { generation, .. } => Some(*generation),
                _ => None,
            })
            .unwrap();

        // User switches away before the first fetch lands
        let _ = client.handle(ChatEvent::Navigate { target: Some(UserId(2)) }).unwrap();

        let actions = client
            .handle(ChatEvent::HistoryFetched {
                user_id: UserId(1),
                generation: first_generation,
                messages: vec![push_from(1, 5, "old")],
            })
            .unwrap();

        assert!(actions.is_empty());
        assert!(client.thread().messages().is_empty());
    }

    #[test]
    fn text_send_clears_buffer_and_publishes() {
        let mut client = client_with_conversations(&[1]);
        open_conversation(&mut client, 1);

        let _ = client.handle(ChatEvent::ComposeInput("namaste".into())).unwrap();
        let actions = client.handle(ChatEvent::SendRequested).unwrap();

        assert!(actions.iter().any(|a| matches!(
            a,
            ChatAction::Publish(envelope)
                if envelope.recipient_id == UserId(1) && envelope.content == "namaste"
        )));
        assert!(client.composer().draft().is_empty());
    }

    #[test]
    fn photo_send_clears_only_after_upload_confirms() {
        let mut client = client_with_conversations(&[1]);
        open_conversation(&mut client, 1);

        let _ = client.handle(ChatEvent::ComposeInput("look".into())).unwrap();
        let _ = client
            .handle(ChatEvent::PhotosSelected(vec![PhotoSelection {
                file_name: "a.jpg".into(),
                content_type: "image/jpeg".into(),
                size: 1024,
            }]))
            .unwrap();

        let actions = client.handle(ChatEvent::SendRequested).unwrap();
        assert!(actions.iter().any(|a| matches!(a, ChatAction::Upload { .. })));
        assert_eq!(client.composer().photos().len(), 1);

        // Failure keeps everything for retry
        let actions = client.handle(ChatEvent::UploadFailed { reason: "boom".into() }).unwrap();
        assert!(actions.iter().any(|a| matches!(a, ChatAction::Alert { .. })));
        assert_eq!(client.composer().photos().len(), 1);
        assert_eq!(client.composer().draft(), "look");

        // Success clears
        let mut stored = push_from(10, 200, "look");
        stored.sender_id = ME;
        stored.recipient_id = UserId(1);
        let _ = client.handle(ChatEvent::UploadCompleted { message: stored }).unwrap();
        assert!(client.composer().draft().is_empty());
        assert!(client.composer().photos().is_empty());
        assert!(client.thread().contains(MessageId(200)));
    }

    #[test]
    fn send_without_active_conversation_is_an_error() {
        let mut client = client_with_conversations(&[1]);
        let _ = client.handle(ChatEvent::ComposeInput("hello".into())).unwrap();

        assert_eq!(client.handle(ChatEvent::SendRequested), Err(ChatError::NoActiveConversation));
    }

    #[test]
    fn optimistic_delete_then_late_deleted_push() {
        let mut client = client_with_conversations(&[1]);
        open_conversation(&mut client, 1);
        let _ = client.handle(ChatEvent::MessageReceived(push_from(1, 7, "secret"))).unwrap();

        let actions = client.handle(ChatEvent::DeleteMessageRequested(MessageId(7))).unwrap();
        assert!(actions.contains(&ChatAction::DeleteMessage(MessageId(7))));
        assert!(!client.thread().contains(MessageId(7)));

        // Authoritative DELETED push arrives later
        let mut deleted = push_from(1, 7, "secret");
        deleted.status = DeliveryState::Deleted;
        let actions = client.handle(ChatEvent::MessageReceived(deleted)).unwrap();
        assert_eq!(actions, vec![ChatAction::Render]);
        assert!(!client.thread().contains(MessageId(7)));

        // Preview tombstone applied where the deleted content matched
        assert_eq!(client.conversations()[0].last_message, "Message deleted");
    }

    #[test]
    fn deleting_unknown_conversation_is_an_error() {
        let mut client = client_with_conversations(&[1]);
        assert_eq!(
            client.handle(ChatEvent::DeleteConversationRequested(UserId(42))),
            Err(ChatError::UnknownConversation { user_id: UserId(42) })
        );
    }

    #[test]
    fn deleting_active_conversation_closes_the_thread() {
        let mut client = client_with_conversations(&[1, 2]);
        open_conversation(&mut client, 1);

        let actions = client.handle(ChatEvent::DeleteConversationRequested(UserId(1))).unwrap();
        assert!(actions.contains(&ChatAction::DeleteConversation(UserId(1))));
        assert!(client.active_conversation().is_none());
        assert!(client.conversations().iter().all(|c| c.user_id != UserId(1)));
    }

    #[test]
    fn draft_survives_page_refresh_on_all_tab() {
        let mut client = client_with_conversations(&[1]);

        // Start a chat with someone the server has never seen
        let _ = client.handle(ChatEvent::Navigate { target: Some(UserId(99)) }).unwrap();
        let profile = CounterpartyProfile {
            user_id: UserId(99),
            first_name: "New".into(),
            last_name: "Match".into(),
            profile_picture: None,
            online: false,
        };
        let _ = client.handle(ChatEvent::ProfileFetched { profile }).unwrap();

        // Refresh page 0 on "All" without the draft present
        let actions = client.handle(ChatEvent::SetSearch(String::new())).unwrap();
        let request = page_request_of(&actions);
        let _ = client
            .handle(ChatEvent::PageFetched {
                request,
                page: ConversationPage { content: vec![conversation(1)], last: true },
            })
            .unwrap();
        assert_eq!(client.conversations()[0].user_id, UserId(99));

        // On the unread filter the draft may disappear
        let actions = client.handle(ChatEvent::SetFilter(RosterFilter::UnreadOnly)).unwrap();
        let request = page_request_of(&actions);
        let _ = client
            .handle(ChatEvent::PageFetched {
                request,
                page: ConversationPage { content: vec![conversation(1)], last: true },
            })
            .unwrap();
        assert!(client.conversations().iter().all(|c| c.user_id != UserId(99)));
    }

    #[test]
    fn navigate_away_clears_active_conversation() {
        let mut client = client_with_conversations(&[1]);
        open_conversation(&mut client, 1);
        assert!(client.active_conversation().is_some());

        let actions = client.handle(ChatEvent::Navigate { target: None }).unwrap();
        assert_eq!(actions, vec![ChatAction::Render]);
        assert!(client.active_conversation().is_none());

        // Already closed: no-op
        let actions = client.handle(ChatEvent::Navigate { target: None }).unwrap();
        assert!(actions.is_empty());
    }

    #[test]
    fn unread_total_is_replaced_not_decremented() {
        let mut client = client_with_conversations(&[1]);
        let _ = client.handle(ChatEvent::UnreadCountFetched { count: 12 }).unwrap();
        assert_eq!(client.unread_total(), 12);

        let _ = client.handle(ChatEvent::UnreadCountFetched { count: 3 }).unwrap();
        assert_eq!(client.unread_total(), 3);
    }
}
