//! Chat client core
//!
//! Action-based client state machine for the Jodi chat client. Manages the
//! conversation roster, the currently open thread, delivery receipts, and the
//! global unread counter.
//!
//! # Architecture
//!
//! The client is Sans-IO: it receives events ([`ChatEvent`]), processes them
//! through pure state machine logic, and returns actions ([`ChatAction`]) for
//! the caller to execute. Network completions are fed back in as further
//! events, so every reconciliation decision is made against a single current
//! state snapshot rather than captured closures.
//!
//! # Components
//!
//! - [`ChatClient`]: Top-level state machine tying the pieces together
//! - [`Roster`]: Paginated conversation list reconciler
//! - [`ActiveThread`]: Message history for the open conversation
//! - [`ReceiptTracker`]: In-flight delivered/seen receipt de-duplication
//! - [`Composer`] / [`Lightbox`]: Photo message composition and viewing

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod client;
mod compose;
mod error;
mod event;
mod lightbox;
mod model;
mod receipts;
mod roster;
mod thread;

pub use client::{ChatClient, ConnectionState};
pub use compose::{Composer, MAX_PHOTOS_PER_MESSAGE, MAX_PHOTO_BYTES, SendPlan};
pub use error::ChatError;
pub use event::{ChatAction, ChatEvent, PageRequest, ReceiptKind, RosterFilter};
pub use lightbox::Lightbox;
pub use model::{
    Attachment, ChatMessage, Conversation, ConversationPage, CounterpartyProfile, DeliveryState,
    MessageId, OutgoingEnvelope, PhotoSelection, StatusUpdate, UserId,
};
pub use receipts::ReceiptTracker;
pub use roster::Roster;
pub use thread::{ActiveThread, ThreadPhase};
