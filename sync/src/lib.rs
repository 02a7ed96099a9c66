//! Real-time synchronization layer for the shared canvas.
//!
//! This crate turns local canvas edits into wire envelopes and remote
//! envelopes into local page mutations:
//!
//! - [`SyncClient`] owns the socket lifecycle (connect, one background
//!   receive loop, fire-and-forget sends, graceful disconnect) and reports
//!   everything through a channel of typed [`SyncEvent`]s.
//! - [`PageStore`] is the reconciliation side: it applies inbound envelopes
//!   to per-page drawable lists under last-write-wins rules and produces the
//!   envelope for each local edit. Shape geometry stays opaque behind the
//!   [`DrawableCodec`] seam.
//! - [`room`] derives the room key that scopes a session, either from a
//!   shared passphrase or from a hash of party-member identifiers.
//!
//! There is no conflict resolution beyond last-write-wins and no
//! delivery guarantee beyond the transport's in-order framing: no sequence
//! numbers, no acknowledgements, no automatic reconnection. Two clients that
//! edit the same object concurrently converge on whichever update each
//! receiver applied last.

pub mod client;
pub mod event;
pub mod pages;
pub mod room;

pub use client::{ConnectionState, SyncClient, SyncError};
pub use event::SyncEvent;
pub use pages::{ApplyError, DEFAULT_GRID_SPACING, Drawable, DrawableCodec, Page, PageStore};
