//! Control-channel messages.
//!
//! The control channel is the text side of the shared socket: small JSON
//! envelopes carrying host-status, error, and room-lifecycle notices,
//! independent of the binary state channel. A room-closing notice exists on
//! both channels (here and as [`crate::MessageType::RoomClosing`]) and both
//! must be handled identically by consumers.

use serde::{Deserialize, Serialize};

/// Host-status payload: whether this client currently hosts the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostStatus {
    /// True when the server considers this client the room host.
    #[serde(rename = "isHost")]
    pub is_host: bool,
}

/// An out-of-band control message carried as a text frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControlMessage {
    /// `{"type":"HOST_STATUS","payload":{"isHost":bool}}`
    #[serde(rename = "HOST_STATUS")]
    HostStatus {
        /// The host flag for this client.
        payload: HostStatus,
    },
    /// `{"type":"ERROR","message":string}`: a human-readable server error.
    #[serde(rename = "ERROR")]
    Error {
        /// Short description intended for display to the user.
        message: String,
    },
    /// `{"type":"ROOM_CLOSING_IMMINENTLY"}`: the room is about to close.
    #[serde(rename = "ROOM_CLOSING_IMMINENTLY")]
    RoomClosing,
}

impl ControlMessage {
    /// Parse a control message from the text of one frame.
    ///
    /// # Errors
    ///
    /// Returns the underlying serde error for unparseable or unknown text;
    /// callers log and discard rather than treating this as fatal.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
#[path = "control_test.rs"]
mod tests;
