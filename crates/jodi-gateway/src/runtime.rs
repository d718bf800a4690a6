//! Event loop wiring the chat state machine to the transports.
//!
//! [`ChatRuntime`] owns the [`ChatClient`](jodi_chat::ChatClient) and drives
//! it from three sources: UI intents, socket pushes, and the completions of
//! REST calls it spawned for earlier actions. Every completion re-enters the
//! state machine as an event, so reconciliation always runs against current
//! state.

use std::sync::Arc;

use jodi_chat::{
    ChatAction, ChatClient, ChatEvent, OutgoingEnvelope, PhotoSelection, ReceiptKind, UserId,
};
use tokio::sync::mpsc;

use crate::{
    error::GatewayError,
    rest::{RestClient, UploadPart},
    socket::{ConnectionEvent, SocketManager},
};

/// Resolves a photo selection to its file contents at upload time.
///
/// The core state machine only tracks selection metadata; the embedding
/// platform knows where the picked files actually live.
pub trait PhotoLoader: Send + Sync + 'static {
    /// Load the file behind a selection.
    fn load(&self, selection: &PhotoSelection) -> Result<UploadPart, GatewayError>;
}

/// Outbound notifications for the embedding UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiNotice {
    /// Show a blocking alert.
    Alert(String),
    /// State changed; re-render.
    Render,
    /// The server rejected the credentials; redirect to sign-in.
    AuthExpired,
}

/// Owns the event loop around one chat session.
pub struct ChatRuntime<L: PhotoLoader> {
    client: ChatClient,
    rest: Arc<RestClient>,
    socket: Arc<SocketManager>,
    loader: Arc<L>,
    intents: mpsc::Receiver<ChatEvent>,
    notices: mpsc::Sender<UiNotice>,
    completions_tx: mpsc::Sender<ChatEvent>,
    completions_rx: mpsc::Receiver<ChatEvent>,
}

impl<L: PhotoLoader> ChatRuntime<L> {
    /// Wire a runtime around a client and its transports.
    ///
    /// `intents` carries UI-originated events in; `notices` carries render
    /// and alert notifications out.
    pub fn new(
        client: ChatClient,
        rest: RestClient,
        socket: SocketManager,
        loader: L,
        intents: mpsc::Receiver<ChatEvent>,
        notices: mpsc::Sender<UiNotice>,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::channel(64);
        Self {
            client,
            rest: Arc::new(rest),
            socket: Arc::new(socket),
            loader: Arc::new(loader),
            intents,
            notices,
            completions_tx,
            completions_rx,
        }
    }

    /// Read access to the client state, for rendering between events.
    pub fn client(&self) -> &ChatClient {
        &self.client
    }

    /// Run the event loop until the intent channel closes.
    pub async fn run(mut self) {
        self.socket.connect();
        let (message_listener, mut messages) = self.socket.add_message_listener();
        let (status_listener, mut statuses) = self.socket.add_status_listener();
        let (connection_listener, mut connections) = self.socket.add_connection_listener();

        let startup = self.client.start();
        self.execute(startup).await;

        loop {
            let event = tokio::select! {
                intent = self.intents.recv() => match intent {
                    Some(event) => event,
                    None => break,
                },
                Some(event) = self.completions_rx.recv() => event,
                Some(message) = messages.recv() => ChatEvent::MessageReceived(message),
                Some(update) = statuses.recv() => ChatEvent::StatusReceived(update),
                Some(change) = connections.recv() => match change {
                    ConnectionEvent::Connected => ChatEvent::Connected,
                    ConnectionEvent::Disconnected => ChatEvent::Disconnected,
                },
            };

            self.dispatch(event).await;
        }

        for listener in [message_listener, status_listener, connection_listener] {
            self.socket.remove_listener(listener);
        }
        self.socket.disconnect();
    }

    /// Feed one event through the state machine and execute the actions.
    async fn dispatch(&mut self, event: ChatEvent) {
        match self.client.handle(event) {
            Ok(actions) => self.execute(actions).await,
            Err(error) => {
                // Invalid intents (send with nothing open, unknown delete
                // target) surface as alerts, not crashes
                tracing::warn!(%error, "rejected chat intent");
                let _ = self.notices.send(UiNotice::Alert(error.to_string())).await;
            },
        }
    }

    /// Execute actions, spawning REST calls whose completions re-enter the
    /// loop as events.
    async fn execute(&mut self, actions: Vec<ChatAction>) {
        for action in actions {
            match action {
                ChatAction::FetchPage(request) => {
                    let rest = Arc::clone(&self.rest);
                    let events = self.completions_tx.clone();
                    let notices = self.notices.clone();
                    tokio::spawn(async move {
                        let event = match rest.conversations(&request).await {
                            Ok(page) => ChatEvent::PageFetched { request, page },
                            Err(error) => {
                                report_auth(&error, &notices).await;
                                ChatEvent::PageFetchFailed { request, reason: error.to_string() }
                            },
                        };
                        let _ = events.send(event).await;
                    });
                },
                ChatAction::FetchHistory { user_id, generation } => {
                    let rest = Arc::clone(&self.rest);
                    let events = self.completions_tx.clone();
                    let notices = self.notices.clone();
                    tokio::spawn(async move {
                        let event = match rest.history(user_id).await {
                            Ok(messages) => {
                                ChatEvent::HistoryFetched { user_id, generation, messages }
                            },
                            Err(error) => {
                                report_auth(&error, &notices).await;
                                ChatEvent::HistoryFetchFailed {
                                    user_id,
                                    generation,
                                    reason: error.to_string(),
                                }
                            },
                        };
                        let _ = events.send(event).await;
                    });
                },
                ChatAction::FetchUnreadCount => {
                    let rest = Arc::clone(&self.rest);
                    let events = self.completions_tx.clone();
                    tokio::spawn(async move {
                        match rest.unread_count().await {
                            Ok(count) => {
                                let _ = events.send(ChatEvent::UnreadCountFetched { count }).await;
                            },
                            Err(error) => tracing::warn!(%error, "unread count fetch failed"),
                        }
                    });
                },
                ChatAction::FetchProfile { user_id } => {
                    let rest = Arc::clone(&self.rest);
                    let events = self.completions_tx.clone();
                    tokio::spawn(async move {
                        let event = match rest.profile(user_id).await {
                            Ok(profile) => ChatEvent::ProfileFetched { profile },
                            Err(error) => ChatEvent::ProfileFetchFailed {
                                user_id,
                                reason: error.to_string(),
                            },
                        };
                        let _ = events.send(event).await;
                    });
                },
                ChatAction::MarkSeen { user_id } => {
                    let rest = Arc::clone(&self.rest);
                    let events = self.completions_tx.clone();
                    tokio::spawn(async move {
                        // Best effort; a miss self-heals on the next event
                        if let Err(error) = rest.mark_seen(user_id).await {
                            tracing::debug!(%error, %user_id, "mark seen failed");
                        }
                        let _ = events
                            .send(ChatEvent::ReceiptSettled { kind: ReceiptKind::Seen, user_id })
                            .await;
                    });
                },
                ChatAction::MarkRead { user_id } => {
                    let rest = Arc::clone(&self.rest);
                    tokio::spawn(async move {
                        if let Err(error) = rest.mark_read(user_id).await {
                            tracing::debug!(%error, %user_id, "mark read failed");
                        }
                    });
                },
                ChatAction::MarkDelivered { sender_ids } => {
                    let rest = Arc::clone(&self.rest);
                    let events = self.completions_tx.clone();
                    tokio::spawn(async move {
                        if let Err(error) = rest.mark_delivered(&sender_ids).await {
                            tracing::debug!(%error, "mark delivered failed");
                        }
                        for user_id in sender_ids {
                            let _ = events
                                .send(ChatEvent::ReceiptSettled {
                                    kind: ReceiptKind::Delivered,
                                    user_id,
                                })
                                .await;
                        }
                    });
                },
                ChatAction::Publish(envelope) => self.publish(&envelope),
                ChatAction::Upload { recipient_id, content, photos } => {
                    self.spawn_upload(recipient_id, content, photos);
                },
                ChatAction::DeleteMessage(id) => {
                    let rest = Arc::clone(&self.rest);
                    let notices = self.notices.clone();
                    tokio::spawn(async move {
                        if let Err(error) = rest.delete_message(id).await {
                            tracing::warn!(%error, %id, "message delete failed");
                            let _ = notices
                                .send(UiNotice::Alert("Failed to delete message".to_string()))
                                .await;
                        }
                    });
                },
                ChatAction::DeleteConversation(user_id) => {
                    let rest = Arc::clone(&self.rest);
                    let notices = self.notices.clone();
                    tokio::spawn(async move {
                        if let Err(error) = rest.delete_conversation(user_id).await {
                            tracing::warn!(%error, %user_id, "conversation delete failed");
                            let _ = notices
                                .send(UiNotice::Alert("Failed to delete conversation".to_string()))
                                .await;
                        }
                    });
                },
                ChatAction::Alert { message } => {
                    let _ = self.notices.send(UiNotice::Alert(message)).await;
                },
                ChatAction::Render => {
                    let _ = self.notices.send(UiNotice::Render).await;
                },
            }
        }
    }

    fn publish(&self, envelope: &OutgoingEnvelope) {
        self.socket.publish(envelope);
    }

    fn spawn_upload(&self, recipient_id: UserId, content: String, photos: Vec<PhotoSelection>) {
        let rest = Arc::clone(&self.rest);
        let loader = Arc::clone(&self.loader);
        let events = self.completions_tx.clone();

        tokio::spawn(async move {
            let mut parts = Vec::with_capacity(photos.len());
            for photo in &photos {
                match loader.load(photo) {
                    Ok(part) => parts.push(part),
                    Err(error) => {
                        let _ = events
                            .send(ChatEvent::UploadFailed {
                                reason: format!("could not read {}: {error}", photo.file_name),
                            })
                            .await;
                        return;
                    },
                }
            }

            let event = match rest.upload(recipient_id, &content, parts).await {
                Ok(message) => ChatEvent::UploadCompleted { message },
                Err(error) => ChatEvent::UploadFailed { reason: error.to_string() },
            };
            let _ = events.send(event).await;
        });
    }
}

/// Authorization failures are redirect-worthy for every call.
async fn report_auth(error: &GatewayError, notices: &mpsc::Sender<UiNotice>) {
    if matches!(error, GatewayError::Forbidden) {
        let _ = notices.send(UiNotice::AuthExpired).await;
    }
}
