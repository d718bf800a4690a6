//! Photo lightbox state.
//!
//! Pure navigation state for viewing a message's photos full-screen. No
//! rendering; the UI reads [`Lightbox::current`] and the open flag.

use crate::model::Attachment;

/// Full-screen photo viewer state.
#[derive(Debug, Clone, Default)]
pub struct Lightbox {
    attachments: Vec<Attachment>,
    index: usize,
    open: bool,
}

impl Lightbox {
    /// Create a closed lightbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the lightbox is showing.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open on a message's attachments at the given index.
    ///
    /// An out-of-range index clamps to the last attachment; opening with no
    /// attachments is a no-op.
    pub fn open(&mut self, attachments: Vec<Attachment>, index: usize) {
        if attachments.is_empty() {
            return;
        }
        self.index = index.min(attachments.len() - 1);
        self.attachments = attachments;
        self.open = true;
    }

    /// Dismiss the lightbox.
    pub fn close(&mut self) {
        self.open = false;
        self.attachments.clear();
        self.index = 0;
    }

    /// Advance to the next photo, wrapping around.
    pub fn next(&mut self) {
        if self.open && !self.attachments.is_empty() {
            self.index = (self.index + 1) % self.attachments.len();
        }
    }

    /// Move to the previous photo, wrapping around.
    pub fn prev(&mut self) {
        if self.open && !self.attachments.is_empty() {
            self.index = (self.index + self.attachments.len() - 1) % self.attachments.len();
        }
    }

    /// Currently shown attachment, if open.
    pub fn current(&self) -> Option<&Attachment> {
        if self.open { self.attachments.get(self.index) } else { None }
    }
}
