//! Error types for the chat client core.

use thiserror::Error;

use crate::model::UserId;

/// Errors produced by the chat client state machine.
///
/// These cover invalid caller intents only; network failures are reported
/// through events (`PageFetchFailed`, `UploadFailed`, ...) because the core
/// never performs I/O itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// A send or delete was requested with no conversation open.
    #[error("no active conversation")]
    NoActiveConversation,

    /// A request targeted a conversation the roster does not contain.
    #[error("unknown conversation for user {user_id}")]
    UnknownConversation {
        /// Counterparty that could not be resolved.
        user_id: UserId,
    },
}
