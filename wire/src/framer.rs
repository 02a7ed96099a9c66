//! Single-byte message framing for the binary state channel.
//!
//! The transport (one WebSocket message per call) already delivers whole
//! messages, so the only framing needed is a leading type byte.

use crate::CodecError;

/// Type tag carried in byte 0 of every binary wire message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    /// The remaining bytes are exactly one encoded envelope.
    StateUpdate,
    /// The host is about to close the room. No payload.
    RoomClosing,
}

impl MessageType {
    /// Convert the tag into its wire byte.
    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            Self::StateUpdate => 0,
            Self::RoomClosing => 1,
        }
    }

    /// Parse a tag from its wire byte.
    fn from_u8(value: u8) -> Result<Self, CodecError> {
        match value {
            0 => Ok(Self::StateUpdate),
            1 => Ok(Self::RoomClosing),
            other => Err(CodecError::UnknownMessageType(other)),
        }
    }
}

/// Prepend the type byte to a payload, producing a complete wire message.
#[must_use]
pub fn frame_message(message_type: MessageType, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + payload.len());
    out.push(message_type.as_u8());
    out.extend_from_slice(payload);
    out
}

/// Split a wire message into its type tag and payload.
///
/// # Errors
///
/// Returns [`CodecError::EmptyMessage`] for zero-length input and
/// [`CodecError::UnknownMessageType`] for an unrecognized tag byte.
pub fn unframe_message(bytes: &[u8]) -> Result<(MessageType, &[u8]), CodecError> {
    let Some((&tag, payload)) = bytes.split_first() else {
        return Err(CodecError::EmptyMessage);
    };
    Ok((MessageType::from_u8(tag)?, payload))
}

#[cfg(test)]
#[path = "framer_test.rs"]
mod tests;
