//! Typed events emitted by the connection manager.
//!
//! The owning application consumes a single mpsc channel of `SyncEvent`s;
//! every session notification, inbound update, and control notice arrives in
//! delivery order on that one channel.

use wire::Envelope;

/// Everything a [`crate::SyncClient`] can tell its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// The session reached `Connected`.
    Connected,
    /// The session ended. Emitted exactly once per completed connect.
    Disconnected,
    /// A human-readable failure: connect refused, transport dropped, or an
    /// error notice from the server's control channel. The session may or may
    /// not survive; watch for `Disconnected`.
    Error(String),
    /// The server reported whether this client hosts the room.
    HostStatus {
        /// True when this client is the room host.
        is_host: bool,
    },
    /// The room is about to close. Triggered identically by the binary
    /// room-closing tag and the JSON control message.
    RoomClosing,
    /// A state-channel envelope arrived and decoded cleanly.
    Update(Envelope),
}
