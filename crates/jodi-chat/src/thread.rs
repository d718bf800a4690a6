//! Active thread controller.
//!
//! [`ActiveThread`] holds the message history of the conversation currently
//! open in the UI. History fetches and socket pushes race freely, so the
//! thread deduplicates by message id rather than relying on arrival order,
//! and remembers deleted ids so a late echo of a removed message cannot
//! resurrect it.

use std::collections::HashSet;

use crate::model::{ChatMessage, DeliveryState, MessageId, StatusUpdate};

/// Loading phase of the open conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThreadPhase {
    /// No conversation open.
    #[default]
    Closed,
    /// History fetch in flight.
    Loading,
    /// History applied; live pushes append.
    Ready,
}

/// Message history for the currently open conversation.
#[derive(Debug, Clone, Default)]
pub struct ActiveThread {
    phase: ThreadPhase,
    messages: Vec<ChatMessage>,
    /// Ids removed locally (optimistic delete) or via a `Deleted` push.
    /// Suppresses re-insertion by late echoes and history refetches.
    deleted: HashSet<MessageId>,
}

impl ActiveThread {
    /// Create a closed, empty thread.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    pub fn phase(&self) -> ThreadPhase {
        self.phase
    }

    /// Messages visible in the thread, oldest first. Deleted messages are
    /// excluded.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Whether a message id is present in the visible history.
    pub fn contains(&self, id: MessageId) -> bool {
        self.messages.iter().any(|m| m.id == Some(id))
    }

    /// Enter the loading phase for a newly selected conversation.
    pub fn begin_loading(&mut self) {
        self.phase = ThreadPhase::Loading;
        self.messages.clear();
        self.deleted.clear();
    }

    /// Close the thread (no conversation selected).
    pub fn close(&mut self) {
        self.phase = ThreadPhase::Closed;
        self.messages.clear();
        self.deleted.clear();
    }

    /// Replace the history with a fetched result and become ready.
    ///
    /// Messages already known to be deleted are filtered out, as are
    /// messages the server itself reports as deleted.
    pub fn apply_history(&mut self, messages: Vec<ChatMessage>) {
        self.messages = messages
            .into_iter()
            .filter(|m| m.status != DeliveryState::Deleted)
            .filter(|m| m.id.is_none_or(|id| !self.deleted.contains(&id)))
            .collect();
        self.phase = ThreadPhase::Ready;
    }

    /// Append an inbound message unless its id is already present or was
    /// deleted. The same message can arrive via the socket push and via a
    /// concurrent history refetch.
    ///
    /// Returns `true` if the message was appended.
    pub fn append_if_new(&mut self, message: ChatMessage) -> bool {
        if let Some(id) = message.id
            && (self.contains(id) || self.deleted.contains(&id))
        {
            return false;
        }
        self.messages.push(message);
        true
    }

    /// Remove a message (optimistic delete or authoritative `Deleted` push).
    /// Idempotent: removing an id that is already gone is a no-op.
    ///
    /// Returns `true` if a message was actually removed.
    pub fn remove(&mut self, id: MessageId) -> bool {
        self.deleted.insert(id);
        let before = self.messages.len();
        self.messages.retain(|m| m.id != Some(id));
        self.messages.len() != before
    }

    /// Apply a delivery status push to the named messages.
    ///
    /// Unknown ids are ignored; transitions are monotonic.
    pub fn apply_status(&mut self, update: &StatusUpdate) {
        for message in &mut self.messages {
            if let Some(id) = message.id
                && update.message_ids.contains(&id)
            {
                message.status = message.status.advance(update.status);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::model::UserId;

    fn message(id: i64, content: &str) -> ChatMessage {
        ChatMessage {
            id: Some(MessageId(id)),
            sender_id: UserId(1),
            recipient_id: UserId(2),
            content: content.to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 2, 14, 12, 0, 0).single().unwrap(),
            status: DeliveryState::Sent,
            attachments: Vec::new(),
        }
    }

    #[test]
    fn history_load_transitions_to_ready() {
        let mut thread = ActiveThread::new();
        assert_eq!(thread.phase(), ThreadPhase::Closed);

        thread.begin_loading();
        assert_eq!(thread.phase(), ThreadPhase::Loading);

        thread.apply_history(vec![message(1, "a"), message(2, "b")]);
        assert_eq!(thread.phase(), ThreadPhase::Ready);
        assert_eq!(thread.messages().len(), 2);
    }

    #[test]
    fn duplicate_push_is_suppressed() {
        let mut thread = ActiveThread::new();
        thread.begin_loading();
        thread.apply_history(vec![message(1, "a")]);

        // Same message arrives again via the socket
        assert!(!thread.append_if_new(message(1, "a")));
        assert!(thread.append_if_new(message(2, "b")));
        assert_eq!(thread.messages().len(), 2);
    }

    #[test]
    fn optimistic_delete_then_late_deleted_push_is_noop() {
        let mut thread = ActiveThread::new();
        thread.begin_loading();
        thread.apply_history(vec![message(1, "a"), message(2, "b")]);

        assert!(thread.remove(MessageId(1)));
        // Authoritative DELETED push arrives later
        assert!(!thread.remove(MessageId(1)));
        assert_eq!(thread.messages().len(), 1);

        // A late echo of the deleted message must not resurrect it
        assert!(!thread.append_if_new(message(1, "a")));
    }

    #[test]
    fn history_refetch_respects_local_deletes() {
        let mut thread = ActiveThread::new();
        thread.begin_loading();
        thread.apply_history(vec![message(1, "a")]);
        thread.remove(MessageId(1));

        // Refetch races the delete and still includes the message
        thread.apply_history(vec![message(1, "a"), message(2, "b")]);
        assert_eq!(thread.messages().len(), 1);
        assert!(!thread.contains(MessageId(1)));
    }

    #[test]
    fn status_update_is_monotonic_and_targeted() {
        let mut thread = ActiveThread::new();
        thread.begin_loading();
        let mut seen = message(1, "a");
        seen.status = DeliveryState::Seen;
        thread.apply_history(vec![seen, message(2, "b")]);

        thread.apply_status(&StatusUpdate {
            message_ids: vec![MessageId(1), MessageId(2)],
            status: DeliveryState::Delivered,
        });

        assert_eq!(thread.messages()[0].status, DeliveryState::Seen);
        assert_eq!(thread.messages()[1].status, DeliveryState::Delivered);
    }

    #[test]
    fn deleted_messages_are_filtered_from_history() {
        let mut thread = ActiveThread::new();
        thread.begin_loading();
        let mut tombstone = message(3, "gone");
        tombstone.status = DeliveryState::Deleted;
        thread.apply_history(vec![message(1, "a"), tombstone]);

        assert_eq!(thread.messages().len(), 1);
        assert!(!thread.contains(MessageId(3)));
    }
}
