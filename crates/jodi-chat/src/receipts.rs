//! In-flight receipt de-duplication.
//!
//! Delivered/seen acknowledgments are best-effort and at-least-once: a second
//! call for the same counterparty while one is in flight is skipped entirely,
//! not queued, and the in-flight marker clears when the call settles whether
//! it succeeded or failed. A missed mark self-heals on the next inbound event
//! or conversation open.

use std::collections::HashSet;

use crate::{event::ReceiptKind, model::UserId};

/// Tracks counterparties with receipt calls currently in flight.
#[derive(Debug, Clone, Default)]
pub struct ReceiptTracker {
    delivered: HashSet<UserId>,
    seen: HashSet<UserId>,
}

impl ReceiptTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a "mark delivered" batch, filtering out senders that already
    /// have a call in flight. The returned senders are marked pending; an
    /// empty result means the whole batch should be skipped.
    pub fn begin_delivered(&mut self, sender_ids: &[UserId]) -> Vec<UserId> {
        sender_ids.iter().copied().filter(|id| self.delivered.insert(*id)).collect()
    }

    /// Begin a "mark seen" call for one counterparty.
    ///
    /// Returns `false` if one is already in flight and the call should be
    /// skipped.
    pub fn begin_seen(&mut self, user_id: UserId) -> bool {
        self.seen.insert(user_id)
    }

    /// Clear the in-flight marker after a call settles, regardless of
    /// outcome.
    pub fn settle(&mut self, kind: ReceiptKind, user_id: UserId) {
        match kind {
            ReceiptKind::Delivered => self.delivered.remove(&user_id),
            ReceiptKind::Seen => self.seen.remove(&user_id),
        };
    }

    /// Whether a receipt call is in flight for the counterparty.
    pub fn is_pending(&self, kind: ReceiptKind, user_id: UserId) -> bool {
        match kind {
            ReceiptKind::Delivered => self.delivered.contains(&user_id),
            ReceiptKind::Seen => self.seen.contains(&user_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concurrent_delivered_calls_are_skipped() {
        let mut tracker = ReceiptTracker::new();

        let first = tracker.begin_delivered(&[UserId(1), UserId(2)]);
        assert_eq!(first, vec![UserId(1), UserId(2)]);

        // Second batch while the first is in flight
        let second = tracker.begin_delivered(&[UserId(1), UserId(3)]);
        assert_eq!(second, vec![UserId(3)]);
    }

    #[test]
    fn settle_allows_retry_after_failure() {
        let mut tracker = ReceiptTracker::new();
        assert!(tracker.begin_seen(UserId(1)));
        assert!(!tracker.begin_seen(UserId(1)));

        // Call failed; marker clears anyway
        tracker.settle(ReceiptKind::Seen, UserId(1));
        assert!(tracker.begin_seen(UserId(1)));
    }

    #[test]
    fn delivered_and_seen_are_tracked_independently() {
        let mut tracker = ReceiptTracker::new();
        assert!(tracker.begin_seen(UserId(1)));
        assert_eq!(tracker.begin_delivered(&[UserId(1)]), vec![UserId(1)]);

        assert!(tracker.is_pending(ReceiptKind::Seen, UserId(1)));
        assert!(tracker.is_pending(ReceiptKind::Delivered, UserId(1)));

        tracker.settle(ReceiptKind::Delivered, UserId(1));
        assert!(!tracker.is_pending(ReceiptKind::Delivered, UserId(1)));
        assert!(tracker.is_pending(ReceiptKind::Seen, UserId(1)));
    }
}
