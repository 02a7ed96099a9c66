//! Wire protocol for the shared-canvas sync channel.
//!
//! This crate owns the on-the-wire representation exchanged between canvas
//! clients: the one-byte message framing, the page-addressed action envelope,
//! and the JSON control-channel messages. It stays agnostic about
//! what a drawable *is*: shape geometry travels as opaque bytes owned by an
//! external drawable codec.
//!
//! Two channels share one socket:
//! - the **state channel** (binary frames): a type byte followed by exactly
//!   one encoded [`Envelope`] for [`MessageType::StateUpdate`];
//! - the **control channel** (text frames): small JSON messages such as
//!   host-status and room-lifecycle notices, parsed by [`ControlMessage`].

mod control;
mod envelope;
mod framer;

pub use control::{ControlMessage, HostStatus};
pub use envelope::{
    Action, Envelope, decode_envelope, decode_object_ids, encode_envelope, encode_object_ids,
};
pub use framer::{MessageType, frame_message, unframe_message};

/// Error returned by the framer and the payload codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// A wire message with zero bytes cannot carry a type tag.
    #[error("empty wire message")]
    EmptyMessage,
    /// The leading type byte does not map to a known [`MessageType`].
    #[error("unknown message type byte: {0}")]
    UnknownMessageType(u8),
    /// The action byte does not map to a known [`Action`].
    #[error("unknown action byte: {0}")]
    UnknownAction(u8),
    /// The envelope ended before its fixed-width header was complete.
    #[error("envelope truncated: need at least {needed} bytes, have {have}")]
    Truncated { needed: usize, have: usize },
    /// The declared data length does not match the bytes that follow.
    #[error("envelope data length mismatch: header declares {declared}, {actual} bytes follow")]
    DataLength { declared: usize, actual: usize },
    /// An object-id set must be a whole number of 16-byte UUIDs.
    #[error("object id set of {0} bytes is not a multiple of 16")]
    InvalidIdSet(usize),
    /// A typed payload accessor found the wrong number of bytes.
    #[error("{action} payload must be {expected} bytes, found {actual}")]
    BadPayload {
        action: &'static str,
        expected: usize,
        actual: usize,
    },
}
