//! WebSocket connection manager for one room session.
//!
//! LIFECYCLE
//! =========
//! `Disconnected → Connecting → Connected → Disconnected`, with
//! `Connecting → Disconnected` on failure. There is no automatic
//! reconnection: every failure path lands back in `Disconnected` and the
//! caller decides whether to retry.
//!
//! DESIGN
//! ======
//! One background task per live connection owns the socket exclusively and
//! runs a `select!` over three sources: the inbound stream, the outbound
//! queue, and a cancellation watch. Because that task is the only writer,
//! concurrent `send` calls are serialized by the queue rather than a lock on
//! the socket. The task has a single exit point which releases the
//! connection slot and emits exactly one [`SyncEvent::Disconnected`] per
//! completed connect, whether the session ended by local disconnect, peer
//! close, or transport error.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use wire::{
    ControlMessage, Envelope, MessageType, decode_envelope, encode_envelope, frame_message,
    unframe_message,
};

use crate::event::SyncEvent;

/// Upper bound on the graceful-close handshake at disconnect.
pub const GRACEFUL_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Outbound sends queued before the writer applies backpressure.
const OUTBOUND_QUEUE_DEPTH: usize = 256;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Where the session currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No session. The only state `connect` acts from.
    Disconnected,
    /// A connect attempt is in flight.
    Connecting,
    /// The receive loop is running.
    Connected,
}

/// Connection-level failures surfaced through [`SyncEvent::Error`] messages.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The server address could not be turned into a websocket URL.
    #[error("invalid server address: {0}")]
    InvalidAddress(String),
    /// The websocket handshake failed.
    #[error("websocket connect failed: {0}")]
    Connect(Box<tokio_tungstenite::tungstenite::Error>),
}

/// Handles for one live connection, held while the receive loop runs.
struct Live {
    /// Identifies this connection so a stale loop cannot release a newer one.
    id: Uuid,
    outbound: mpsc::Sender<Envelope>,
    cancel: watch::Sender<bool>,
    task: JoinHandle<()>,
}

struct Inner {
    state: ConnectionState,
    live: Option<Live>,
}

/// Client for one logical room session.
///
/// Owns the socket lifecycle and reports everything (connects, updates,
/// control notices, errors, disconnects) through the event channel given at
/// construction. Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct SyncClient {
    events: mpsc::Sender<SyncEvent>,
    inner: Arc<Mutex<Inner>>,
}

impl SyncClient {
    /// Create a client that reports through `events`.
    #[must_use]
    pub fn new(events: mpsc::Sender<SyncEvent>) -> Self {
        Self {
            events,
            inner: Arc::new(Mutex::new(Inner {
                state: ConnectionState::Disconnected,
                live: None,
            })),
        }
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> ConnectionState {
        self.inner.lock().await.state
    }

    /// Open a session to `address` scoped by `room_key`.
    ///
    /// Fast no-op unless currently `Disconnected`: a second connect while a
    /// session is live never races to replace the socket. `address` may use
    /// `ws`/`wss` or `http`/`https` schemes (mapped), or no scheme (`ws`
    /// assumed); the room key travels as an escaped `passphrase` query
    /// parameter. On failure, emits [`SyncEvent::Error`] followed by one
    /// [`SyncEvent::Disconnected`] and returns to `Disconnected`.
    pub async fn connect(&self, address: &str, room_key: &str) {
        {
            let mut inner = self.inner.lock().await;
            if inner.state != ConnectionState::Disconnected {
                debug!(state = ?inner.state, "connect ignored: session already active");
                return;
            }
            inner.state = ConnectionState::Connecting;
        }

        let url = match room_url(address, room_key) {
            Ok(url) => url,
            Err(e) => {
                self.fail_connect(e.to_string()).await;
                return;
            }
        };

        let stream = match connect_async(url.as_str()).await {
            Ok((stream, _response)) => stream,
            Err(e) => {
                self.fail_connect(SyncError::Connect(Box::new(e)).to_string()).await;
                return;
            }
        };

        let conn_id = Uuid::new_v4();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (outbound_tx, outbound_rx) = mpsc::channel::<Envelope>(OUTBOUND_QUEUE_DEPTH);
        let (ready_tx, ready_rx) = oneshot::channel();
        let task = tokio::spawn(run_connection(
            conn_id,
            Arc::clone(&self.inner),
            self.events.clone(),
            stream,
            cancel_rx,
            outbound_rx,
            ready_rx,
        ));

        {
            let mut inner = self.inner.lock().await;
            inner.state = ConnectionState::Connected;
            inner.live = Some(Live { id: conn_id, outbound: outbound_tx, cancel: cancel_tx, task });
        }

        info!(%conn_id, %address, "connected to room");
        let _ = self.events.send(SyncEvent::Connected).await;
        // The loop holds off until the slot is stored and Connected is
        // queued, so no session event can precede Connected.
        let _ = ready_tx.send(());
    }

    /// Queue one envelope for the connection's single writer. No-op unless
    /// `Connected`; fire-and-forget with no acknowledgement or retry. A write
    /// failure surfaces as [`SyncEvent::Error`] plus disconnect.
    pub async fn send(&self, envelope: Envelope) {
        let outbound = {
            let inner = self.inner.lock().await;
            if inner.state != ConnectionState::Connected {
                debug!(action = ?envelope.action, "send ignored: not connected");
                return;
            }
            inner.live.as_ref().map(|live| live.outbound.clone())
        };

        if let Some(outbound) = outbound {
            if outbound.send(envelope).await.is_err() {
                debug!("send dropped: connection is closing");
            }
        }
    }

    /// End the session. Idempotent: a disconnect with no live session does
    /// nothing and emits nothing. Cancellation is signalled first so the
    /// receive loop observes it before the socket is torn down; the loop then
    /// performs a bounded graceful close (a peer that already dropped cannot
    /// be closed gracefully, which is expected and swallowed) and emits the
    /// single [`SyncEvent::Disconnected`].
    pub async fn disconnect(&self) {
        let live = {
            let mut inner = self.inner.lock().await;
            inner.state = ConnectionState::Disconnected;
            inner.live.take()
        };
        let Some(live) = live else { return };

        let _ = live.cancel.send(true);

        // Wait out the loop's graceful close so callers observe Disconnected
        // after this returns; a loop that overruns is left to finish detached.
        let grace = GRACEFUL_CLOSE_TIMEOUT + Duration::from_secs(1);
        if tokio::time::timeout(grace, live.task).await.is_err() {
            warn!("receive loop did not stop within the close window");
        }
    }

    async fn fail_connect(&self, message: String) {
        warn!(%message, "connect failed");
        {
            let mut inner = self.inner.lock().await;
            inner.state = ConnectionState::Disconnected;
        }
        let _ = self.events.send(SyncEvent::Error(message)).await;
        let _ = self.events.send(SyncEvent::Disconnected).await;
    }
}

/// Build the room URL: scheme mapped to ws/wss, room key escaped into the
/// `passphrase` query parameter.
fn room_url(address: &str, room_key: &str) -> Result<Url, SyncError> {
    let base = if let Some(rest) = address.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if let Some(rest) = address.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if address.starts_with("ws://") || address.starts_with("wss://") {
        address.to_owned()
    } else {
        format!("ws://{address}")
    };

    let mut url =
        Url::parse(&base).map_err(|e| SyncError::InvalidAddress(format!("{address}: {e}")))?;
    url.query_pairs_mut().append_pair("passphrase", room_key);
    Ok(url)
}

/// The background receive loop: sole owner of the socket, sole writer, and
/// the one place that handles inbound traffic. Runs until cancellation, peer
/// close, or a transport error.
async fn run_connection(
    conn_id: Uuid,
    inner: Arc<Mutex<Inner>>,
    events: mpsc::Sender<SyncEvent>,
    mut stream: WsStream,
    mut cancel: watch::Receiver<bool>,
    mut outbound: mpsc::Receiver<Envelope>,
    ready: oneshot::Receiver<()>,
) {
    let _ = ready.await;

    loop {
        tokio::select! {
            _ = cancel.changed() => {
                let _ = tokio::time::timeout(GRACEFUL_CLOSE_TIMEOUT, stream.close(None)).await;
                break;
            }

            incoming = stream.next() => {
                match incoming {
                    None | Some(Ok(Message::Close(_))) => break,
                    Some(Err(e)) => {
                        let _ = events.send(SyncEvent::Error(format!("connection lost: {e}"))).await;
                        break;
                    }
                    Some(Ok(Message::Text(text))) => handle_control_text(text.as_str(), &events).await,
                    Some(Ok(Message::Binary(bytes))) => handle_state_message(&bytes, &events).await,
                    // Ping/pong bookkeeping is the transport's business.
                    Some(Ok(_)) => {}
                }
            }

            queued = outbound.recv() => {
                let Some(envelope) = queued else { break };
                let payload = frame_message(MessageType::StateUpdate, &encode_envelope(&envelope));
                if let Err(e) = stream.send(Message::Binary(payload.into())).await {
                    let _ = events.send(SyncEvent::Error(format!("send failed: {e}"))).await;
                    break;
                }
            }
        }
    }

    // Single exit point. Release the slot unless a newer connection already
    // replaced it, then emit the one Disconnected for this connect.
    {
        let mut inner = inner.lock().await;
        if inner.live.as_ref().is_some_and(|live| live.id == conn_id) {
            inner.live = None;
            inner.state = ConnectionState::Disconnected;
        }
    }
    info!(%conn_id, "room session ended");
    let _ = events.send(SyncEvent::Disconnected).await;
}

/// Classify and dispatch one binary state-channel message. Malformed input
/// is logged and dropped, never fatal to the session.
async fn handle_state_message(bytes: &[u8], events: &mpsc::Sender<SyncEvent>) {
    match unframe_message(bytes) {
        Ok((MessageType::StateUpdate, payload)) => match decode_envelope(payload) {
            Ok(envelope) => {
                let _ = events.send(SyncEvent::Update(envelope)).await;
            }
            Err(e) => warn!(error = %e, "dropping malformed state update"),
        },
        Ok((MessageType::RoomClosing, _)) => {
            let _ = events.send(SyncEvent::RoomClosing).await;
        }
        Err(e) => warn!(error = %e, "dropping malformed wire message"),
    }
}

/// Dispatch one text control-channel message. Unparseable text is logged and
/// discarded.
async fn handle_control_text(text: &str, events: &mpsc::Sender<SyncEvent>) {
    match ControlMessage::parse(text) {
        Ok(ControlMessage::HostStatus { payload }) => {
            let _ = events.send(SyncEvent::HostStatus { is_host: payload.is_host }).await;
        }
        Ok(ControlMessage::Error { message }) => {
            let _ = events.send(SyncEvent::Error(message)).await;
        }
        Ok(ControlMessage::RoomClosing) => {
            let _ = events.send(SyncEvent::RoomClosing).await;
        }
        Err(e) => warn!(error = %e, "dropping unparseable control message"),
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
