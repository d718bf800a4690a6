//! Photo message composition.
//!
//! The [`Composer`] holds the draft text and picked photos for the open
//! conversation and decides the send route: text-only messages go over the
//! socket, anything with photos goes through the multipart upload endpoint.
//!
//! Clearing semantics differ by route: the text buffer clears as soon as a
//! socket send is initiated, while a photo send keeps both buffer and
//! selection until the upload is confirmed, so a failed upload can be
//! retried without re-picking files.

use crate::model::{OutgoingEnvelope, PhotoSelection, UserId};

/// Maximum photos per message.
pub const MAX_PHOTOS_PER_MESSAGE: usize = 10;

/// Maximum size of a single photo in bytes (5 MiB).
pub const MAX_PHOTO_BYTES: u64 = 5 * 1024 * 1024;

/// How a composed message should be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendPlan {
    /// Text-only: publish over the live socket.
    Text(OutgoingEnvelope),
    /// Photos present: multipart upload.
    Upload {
        /// Target counterparty.
        recipient_id: UserId,
        /// Optional caption text.
        content: String,
        /// Photos in selection order.
        photos: Vec<PhotoSelection>,
    },
}

/// Compose area state for the open conversation.
#[derive(Debug, Clone, Default)]
pub struct Composer {
    draft: String,
    photos: Vec<PhotoSelection>,
}

impl Composer {
    /// Create an empty composer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current draft text.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Currently selected photos.
    pub fn photos(&self) -> &[PhotoSelection] {
        &self.photos
    }

    /// Whether there is nothing to send.
    pub fn is_empty(&self) -> bool {
        self.draft.trim().is_empty() && self.photos.is_empty()
    }

    /// Replace the draft text.
    pub fn set_draft(&mut self, draft: String) {
        self.draft = draft;
    }

    /// Add picked photos, enforcing the per-message limits.
    ///
    /// If the batch would exceed [`MAX_PHOTOS_PER_MESSAGE`] the whole batch
    /// is rejected; individual photos over [`MAX_PHOTO_BYTES`] are skipped.
    /// Returns one alert message per rejection for the UI to display.
    pub fn add_photos(&mut self, photos: Vec<PhotoSelection>) -> Vec<String> {
        if self.photos.len() + photos.len() > MAX_PHOTOS_PER_MESSAGE {
            return vec![format!(
                "Maximum {MAX_PHOTOS_PER_MESSAGE} photos allowed per message"
            )];
        }

        let mut alerts = Vec::new();
        for photo in photos {
            if photo.size > MAX_PHOTO_BYTES {
                alerts.push(format!("{} exceeds 5MB limit", photo.file_name));
            } else {
                self.photos.push(photo);
            }
        }
        alerts
    }

    /// Remove a photo by index. Out-of-range indexes are ignored.
    pub fn remove_photo(&mut self, index: usize) {
        if index < self.photos.len() {
            self.photos.remove(index);
        }
    }

    /// Decide the send route for the current compose state, clearing the
    /// buffer according to the route's semantics.
    ///
    /// Returns `None` when there is nothing to send.
    pub fn plan_send(&mut self, sender_id: UserId, recipient_id: UserId) -> Option<SendPlan> {
        if self.is_empty() {
            return None;
        }

        if self.photos.is_empty() {
            let content = std::mem::take(&mut self.draft);
            return Some(SendPlan::Text(OutgoingEnvelope { sender_id, recipient_id, content }));
        }

        // Buffer and selection stay put until the upload is confirmed
        Some(SendPlan::Upload {
            recipient_id,
            content: self.draft.trim().to_string(),
            photos: self.photos.clone(),
        })
    }

    /// Clear both draft and photo selection after a confirmed upload.
    pub fn clear(&mut self) {
        self.draft.clear();
        self.photos.clear();
    }
}
