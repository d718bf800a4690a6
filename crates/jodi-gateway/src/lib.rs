//! REST and WebSocket gateway for the Jodi chat client core.
//!
//! Pairs the pure [`jodi_chat`] state machine with real transports:
//!
//! - [`SocketManager`]: WebSocket session with a fixed-delay reconnect loop
//!   and listener fan-out
//! - [`RestClient`]: authenticated chat API calls, including multipart photo
//!   upload
//! - [`ChatRuntime`]: the event loop that executes the state machine's
//!   actions and feeds completions back in as events

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod error;
mod rest;
mod runtime;
mod socket;

pub use config::{DEFAULT_RECONNECT_DELAY, GatewayConfig};
pub use error::GatewayError;
pub use rest::{RestClient, UploadPart};
pub use runtime::{ChatRuntime, PhotoLoader, UiNotice};
pub use socket::{ConnectionEvent, ListenerId, SocketManager};
