//! WebSocket transport with automatic reconnection.
//!
//! [`SocketManager`] owns one connection task that reconnects forever on a
//! fixed delay. Inbound frames fan out to registered message and status
//! listeners; outbound publishes while disconnected are dropped with a
//! logged error, never queued.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use futures_util::{SinkExt, StreamExt};
use jodi_chat::{ChatMessage, OutgoingEnvelope, StatusUpdate};
use serde::Deserialize;
use tokio::{net::TcpStream, sync::mpsc};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Message, client::IntoClientRequest, http::HeaderValue},
};

use crate::{config::GatewayConfig, error::GatewayError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Handle identifying one registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Session lifecycle events delivered to connection listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Session established (initial connect or reconnect).
    Connected,
    /// Session lost; the manager keeps retrying on its own.
    Disconnected,
}

/// An inbound frame after classification.
#[derive(Debug, Clone)]
enum Frame {
    Message(ChatMessage),
    Status(StatusUpdate),
}

/// Listener registry. One id namespace across all three kinds so removal
/// does not need to know what it is removing.
#[derive(Default)]
struct Listeners {
    messages: HashMap<ListenerId, mpsc::Sender<ChatMessage>>,
    statuses: HashMap<ListenerId, mpsc::Sender<StatusUpdate>>,
    connections: HashMap<ListenerId, mpsc::Sender<ConnectionEvent>>,
}

type SharedListeners = Arc<Mutex<Listeners>>;

/// Owns the socket connection and its reconnect loop.
pub struct SocketManager {
    config: GatewayConfig,
    listeners: SharedListeners,
    next_listener: AtomicU64,
    connected: Arc<AtomicBool>,
    outbound: Mutex<mpsc::Sender<String>>,
    task: Mutex<Option<tokio::task::AbortHandle>>,
}

impl SocketManager {
    /// Create a manager. No connection is made until [`Self::connect`].
    pub fn new(config: GatewayConfig) -> Self {
        // Placeholder sender; each connect installs a fresh channel
        let (outbound, _) = mpsc::channel(32);
        Self {
            config,
            listeners: Arc::new(Mutex::new(Listeners::default())),
            next_listener: AtomicU64::new(0),
            connected: Arc::new(AtomicBool::new(false)),
            outbound: Mutex::new(outbound),
            task: Mutex::new(None),
        }
    }

    /// Whether a session is currently established.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Start the connection task. A no-op if one is already running.
    pub fn connect(&self) {
        let Ok(mut task) = self.task.lock() else { return };
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        // The channel lives and dies with the session task. A fresh pair per
        // connect means a disconnect never strands publishes in a receiver
        // nobody will drain again.
        let (sender, receiver) = mpsc::channel(32);
        if let Ok(mut outbound) = self.outbound.lock() {
            *outbound = sender;
        }

        let handle = tokio::spawn(run_connection(
            self.config.clone(),
            Arc::clone(&self.listeners),
            Arc::clone(&self.connected),
            receiver,
        ));
        *task = Some(handle.abort_handle());
    }

    /// Stop the connection task and drop the session.
    pub fn disconnect(&self) {
        if let Ok(mut task) = self.task.lock()
            && let Some(handle) = task.take()
        {
            handle.abort();
        }
        self.connected.store(false, Ordering::SeqCst);
    }

    /// Register a listener for inbound message pushes.
    pub fn add_message_listener(&self) -> (ListenerId, mpsc::Receiver<ChatMessage>) {
        let id = self.next_id();
        let (tx, rx) = mpsc::channel(64);
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.messages.insert(id, tx);
        }
        (id, rx)
    }

    /// Register a listener for delivery status pushes.
    pub fn add_status_listener(&self) -> (ListenerId, mpsc::Receiver<StatusUpdate>) {
        let id = self.next_id();
        let (tx, rx) = mpsc::channel(64);
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.statuses.insert(id, tx);
        }
        (id, rx)
    }

    /// Register a listener for session lifecycle events.
    pub fn add_connection_listener(&self) -> (ListenerId, mpsc::Receiver<ConnectionEvent>) {
        let id = self.next_id();
        let (tx, rx) = mpsc::channel(8);
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.connections.insert(id, tx);
        }
        (id, rx)
    }

    /// Remove a listener of any kind. Removing an unknown id is a no-op.
    pub fn remove_listener(&self, id: ListenerId) {
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.messages.remove(&id);
            listeners.statuses.remove(&id);
            listeners.connections.remove(&id);
        }
    }

    /// Publish a text message envelope.
    ///
    /// Dropped with a logged error when disconnected; there is no outbound
    /// queue.
    pub fn publish(&self, envelope: &OutgoingEnvelope) {
        if !self.is_connected() {
            tracing::error!(
                recipient = %envelope.recipient_id,
                "cannot publish message, socket is disconnected"
            );
            return;
        }

        let json = match serde_json::to_string(envelope) {
            Ok(json) => json,
            Err(error) => {
                tracing::error!(%error, "failed to encode outgoing message");
                return;
            },
        };
        let Ok(outbound) = self.outbound.lock() else { return };
        if outbound.try_send(json).is_err() {
            tracing::error!("outbound socket channel unavailable, message dropped");
        }
    }

    fn next_id(&self) -> ListenerId {
        ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed))
    }
}

/// Reconnect loop: connect, drive the session until it ends, wait the fixed
/// delay, repeat.
async fn run_connection(
    config: GatewayConfig,
    listeners: SharedListeners,
    connected: Arc<AtomicBool>,
    mut outbound: mpsc::Receiver<String>,
) {
    loop {
        match open_stream(&config).await {
            Ok(stream) => {
                // Publishes accepted during the race between the connected
                // flag flipping and the session actually ending are stale now
                while outbound.try_recv().is_ok() {}

                connected.store(true, Ordering::SeqCst);
                notify_connection(&listeners, ConnectionEvent::Connected).await;

                drive_session(stream, &listeners, &mut outbound).await;

                connected.store(false, Ordering::SeqCst);
                notify_connection(&listeners, ConnectionEvent::Disconnected).await;
                tracing::warn!("socket session ended, reconnecting");
            },
            Err(error) => {
                tracing::warn!(%error, "socket connect failed");
            },
        }

        tokio::time::sleep(config.reconnect_delay).await;
    }
}

/// Open a WebSocket session with the bearer token on the handshake.
async fn open_stream(config: &GatewayConfig) -> Result<WsStream, GatewayError> {
    let mut request = config
        .socket_url
        .as_str()
        .into_client_request()
        .map_err(|e| GatewayError::Transport(format!("invalid socket url: {e}")))?;

    let bearer = HeaderValue::from_str(&format!("Bearer {}", config.token))
        .map_err(|e| GatewayError::Transport(format!("invalid token: {e}")))?;
    request.headers_mut().insert("Authorization", bearer);

    let (stream, _response) = connect_async(request)
        .await
        .map_err(|e| GatewayError::Transport(format!("handshake failed: {e}")))?;
    Ok(stream)
}

/// Pump one session: fan inbound frames out to listeners, forward outbound
/// publishes. Returns when the session ends.
async fn drive_session(
    stream: WsStream,
    listeners: &SharedListeners,
    outbound: &mut mpsc::Receiver<String>,
) {
    let (mut sink, mut source) = stream.split();

    loop {
        tokio::select! {
            frame = source.next() => match frame {
                Some(Ok(Message::Text(text))) => match classify(text.as_str()) {
                    Ok(frame) => dispatch(listeners, frame).await,
                    Err(error) => tracing::warn!(%error, "unreadable socket frame"),
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {},
                Some(Err(error)) => {
                    tracing::warn!(%error, "socket read failed");
                    break;
                },
            },
            Some(text) = outbound.recv() => {
                if let Err(error) = sink.send(Message::text(text)).await {
                    tracing::warn!(%error, "socket send failed");
                    break;
                }
            },
        }
    }
}

/// Deliver one classified frame to every listener of its kind.
///
/// Senders are cloned out of the registry first so the lock is never held
/// across an await. A dropped receiver just means the listener went away
/// before calling `remove_listener`.
async fn dispatch(listeners: &SharedListeners, frame: Frame) {
    match frame {
        Frame::Message(message) => {
            let targets: Vec<mpsc::Sender<ChatMessage>> = match listeners.lock() {
                Ok(map) => map.messages.values().cloned().collect(),
                Err(_) => return,
            };
            for target in targets {
                let _ = target.send(message.clone()).await;
            }
        },
        Frame::Status(update) => {
            let targets: Vec<mpsc::Sender<StatusUpdate>> = match listeners.lock() {
                Ok(map) => map.statuses.values().cloned().collect(),
                Err(_) => return,
            };
            for target in targets {
                let _ = target.send(update.clone()).await;
            }
        },
    }
}

/// Deliver a session lifecycle event to every connection listener.
async fn notify_connection(listeners: &SharedListeners, event: ConnectionEvent) {
    let targets: Vec<mpsc::Sender<ConnectionEvent>> = match listeners.lock() {
        Ok(map) => map.connections.values().cloned().collect(),
        Err(_) => return,
    };
    for target in targets {
        let _ = target.send(event).await;
    }
}

/// Discriminator for inbound JSON frames.
#[derive(Debug, Deserialize)]
struct FrameTag {
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// Classify an inbound frame: status updates carry `"type": "STATUS_UPDATE"`,
/// everything else is a message push.
fn classify(text: &str) -> Result<Frame, GatewayError> {
    let tag: FrameTag =
        serde_json::from_str(text).map_err(|e| GatewayError::Malformed(e.to_string()))?;

    if tag.kind.as_deref() == Some("STATUS_UPDATE") {
        let update: StatusUpdate =
            serde_json::from_str(text).map_err(|e| GatewayError::Malformed(e.to_string()))?;
        return Ok(Frame::Status(update));
    }

    let message: ChatMessage =
        serde_json::from_str(text).map_err(|e| GatewayError::Malformed(e.to_string()))?;
    Ok(Frame::Message(message))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use jodi_chat::{DeliveryState, MessageId, UserId};

    use super::*;

    fn manager() -> SocketManager {
        SocketManager::new(GatewayConfig::new("http://api", "ws://api/ws", "token"))
    }

    #[test]
    fn status_frames_are_classified_by_type_tag() {
        let frame = r#"{"type":"STATUS_UPDATE","messageIds":[4,5],"status":"SEEN"}"#;

        match classify(frame).unwrap() {
            Frame::Status(update) => {
                assert_eq!(update.message_ids, vec![MessageId(4), MessageId(5)]);
                assert_eq!(update.status, DeliveryState::Seen);
            },
            Frame::Message(message) => panic!("expected status frame, got {message:?}"),
        }
    }

    #[test]
    fn untagged_frames_decode_as_messages() {
        let frame = r#"{
            "id": 9,
            "senderId": 1,
            "recipientId": 2,
            "content": "hello",
            "timestamp": "2026-02-14T10:30:00Z"
        }"#;

        match classify(frame).unwrap() {
            Frame::Message(message) => {
                assert_eq!(message.id, Some(MessageId(9)));
                assert_eq!(message.sender_id, UserId(1));
                assert_eq!(message.status, DeliveryState::Sent);
            },
            Frame::Status(update) => panic!("expected message frame, got {update:?}"),
        }
    }

    #[test]
    fn malformed_frames_are_rejected() {
        assert!(matches!(classify("not json"), Err(GatewayError::Malformed(_))));
        assert!(matches!(classify(r#"{"type":null}"#), Err(GatewayError::Malformed(_))));
    }

    #[tokio::test]
    async fn removing_one_listener_leaves_others_receiving() {
        let manager = manager();
        let (first, mut first_rx) = manager.add_status_listener();
        let (_second, mut second_rx) = manager.add_status_listener();

        let update = StatusUpdate {
            message_ids: vec![MessageId(1)],
            status: DeliveryState::Delivered,
        };
        dispatch(&manager.listeners, Frame::Status(update.clone())).await;
        assert_eq!(first_rx.recv().await, Some(update.clone()));
        assert_eq!(second_rx.recv().await, Some(update.clone()));

        manager.remove_listener(first);
        // Idempotent
        manager.remove_listener(first);

        dispatch(&manager.listeners, Frame::Status(update.clone())).await;
        assert!(first_rx.try_recv().is_err());
        assert_eq!(second_rx.recv().await, Some(update));
    }

    #[tokio::test]
    async fn message_and_status_listeners_are_independent() {
        let manager = manager();
        let (_m, mut messages) = manager.add_message_listener();
        let (_s, mut statuses) = manager.add_status_listener();

        let update =
            StatusUpdate { message_ids: vec![MessageId(2)], status: DeliveryState::Seen };
        dispatch(&manager.listeners, Frame::Status(update)).await;

        assert!(messages.try_recv().is_err());
        assert!(statuses.recv().await.is_some());
    }

    #[test]
    fn publish_while_disconnected_is_dropped() {
        let manager = manager();
        let (sender, mut outbound) = mpsc::channel(4);
        *manager.outbound.lock().unwrap() = sender;

        manager.publish(&OutgoingEnvelope {
            sender_id: UserId(1),
            recipient_id: UserId(2),
            content: "dropped".to_string(),
        });

        // Nothing was queued for a future session
        assert!(outbound.try_recv().is_err());

        manager.connected.store(true, Ordering::SeqCst);
        manager.publish(&OutgoingEnvelope {
            sender_id: UserId(1),
            recipient_id: UserId(2),
            content: "sent".to_string(),
        });
        assert!(outbound.try_recv().is_ok());
    }

    #[tokio::test]
    async fn connect_after_disconnect_starts_a_new_session_task() {
        let manager = manager();
        manager.connect();
        manager.disconnect();
        manager.connect();

        let running = manager
            .task
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished());
        assert!(running);

        // The new session task holds a live receiver, so publishes made once
        // the session comes up are not stranded
        assert!(!manager.outbound.lock().unwrap().is_closed());

        manager.disconnect();
    }
}
