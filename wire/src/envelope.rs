//! Page-addressed action envelope codec.
//!
//! Layout (all multi-byte fields little-endian):
//!
//! ```text
//! u32  page_index
//! u8   action
//! u32  data_len
//! [u8] data (data_len bytes, consuming the remainder exactly)
//! ```
//!
//! Parsing rules follow the panic-free discipline of the binary lane: never
//! index into the buffer, always check `remaining()` first, never `unwrap()`
//! in production paths. The action tag is authoritative: `data` is an opaque
//! blob whose structure is fully determined by the action, and the codec
//! never inspects it.

use bytes::{Buf, BufMut};
use uuid::Uuid;

use crate::CodecError;

/// Fixed-width header size: page index + action byte + data length.
const HEADER_LEN: usize = 4 + 1 + 4;

/// The nine shared-canvas mutations carried over the state channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Append drawables to the page. Data: drawable-codec bytes.
    AddObjects,
    /// Remove drawables by id. Data: packed 16-byte UUIDs.
    DeleteObjects,
    /// Replace drawables by id; unknown ids are ignored. Data: drawable-codec bytes.
    UpdateObjects,
    /// Discard every drawable on the page. Data: empty.
    ClearPage,
    /// Replace the page's full drawable list. Data: drawable-codec bytes.
    ReplacePage,
    /// Insert a fresh page. Data: empty.
    AddNewPage,
    /// Remove the page. Data: empty.
    DeletePage,
    /// Set the page's grid spacing. Data: 4-byte IEEE-754 float.
    UpdateGrid,
    /// Show or hide the page's grid. Data: 1 byte, 0=false / 1=true.
    UpdateGridVisibility,
}

impl Action {
    /// Convert the action into its wire byte.
    #[must_use]
    pub fn as_u8(self) -> u8 {
        match self {
            Self::AddObjects => 0,
            Self::DeleteObjects => 1,
            Self::UpdateObjects => 2,
            Self::ClearPage => 3,
            Self::ReplacePage => 4,
            Self::AddNewPage => 5,
            Self::DeletePage => 6,
            Self::UpdateGrid => 7,
            Self::UpdateGridVisibility => 8,
        }
    }

    /// Parse an action from its wire byte.
    fn from_u8(value: u8) -> Result<Self, CodecError> {
        match value {
            0 => Ok(Self::AddObjects),
            1 => Ok(Self::DeleteObjects),
            2 => Ok(Self::UpdateObjects),
            3 => Ok(Self::ClearPage),
            4 => Ok(Self::ReplacePage),
            5 => Ok(Self::AddNewPage),
            6 => Ok(Self::DeletePage),
            7 => Ok(Self::UpdateGrid),
            8 => Ok(Self::UpdateGridVisibility),
            other => Err(CodecError::UnknownAction(other)),
        }
    }
}

/// The unit of synchronization: one action targeting one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Which page (canvas) the action targets. Always non-negative; the wire
    /// field is 32 bits wide.
    pub page_index: u32,
    /// What to do to that page.
    pub action: Action,
    /// Action-dependent payload, possibly empty.
    pub data: Vec<u8>,
}

impl Envelope {
    /// Create an envelope from its parts.
    #[must_use]
    pub fn new(page_index: u32, action: Action, data: Vec<u8>) -> Self {
        Self { page_index, action, data }
    }

    /// `ClearPage` for the given page.
    #[must_use]
    pub fn clear_page(page_index: u32) -> Self {
        Self::new(page_index, Action::ClearPage, Vec::new())
    }

    /// `AddNewPage` at the given index.
    #[must_use]
    pub fn add_new_page(page_index: u32) -> Self {
        Self::new(page_index, Action::AddNewPage, Vec::new())
    }

    /// `DeletePage` for the given page.
    #[must_use]
    pub fn delete_page(page_index: u32) -> Self {
        Self::new(page_index, Action::DeletePage, Vec::new())
    }

    /// `UpdateGrid` carrying the new spacing.
    #[must_use]
    pub fn update_grid(page_index: u32, spacing: f32) -> Self {
        let mut data = Vec::with_capacity(4);
        data.put_f32_le(spacing);
        Self::new(page_index, Action::UpdateGrid, data)
    }

    /// `UpdateGridVisibility` carrying the new flag.
    #[must_use]
    pub fn update_grid_visibility(page_index: u32, visible: bool) -> Self {
        Self::new(page_index, Action::UpdateGridVisibility, vec![u8::from(visible)])
    }

    /// Read the grid spacing out of an `UpdateGrid` payload.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::BadPayload`] unless the data is exactly 4 bytes.
    pub fn grid_spacing(&self) -> Result<f32, CodecError> {
        let Ok(bytes) = <[u8; 4]>::try_from(self.data.as_slice()) else {
            return Err(CodecError::BadPayload {
                action: "UpdateGrid",
                expected: 4,
                actual: self.data.len(),
            });
        };
        Ok(f32::from_le_bytes(bytes))
    }

    /// Read the visibility flag out of an `UpdateGridVisibility` payload.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::BadPayload`] unless the data is exactly 1 byte.
    pub fn grid_visible(&self) -> Result<bool, CodecError> {
        let [byte] = self.data.as_slice() else {
            return Err(CodecError::BadPayload {
                action: "UpdateGridVisibility",
                expected: 1,
                actual: self.data.len(),
            });
        };
        Ok(*byte != 0)
    }
}

/// Encode an envelope into wire bytes.
#[must_use]
pub fn encode_envelope(envelope: &Envelope) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + envelope.data.len());
    out.put_u32_le(envelope.page_index);
    out.put_u8(envelope.action.as_u8());
    out.put_u32_le(u32::try_from(envelope.data.len()).unwrap_or(u32::MAX));
    out.extend_from_slice(&envelope.data);
    out
}

/// Decode wire bytes into an envelope.
///
/// The input must be exactly one envelope: the declared data length has to
/// consume the remainder, so both truncated and trailing bytes are rejected.
///
/// # Errors
///
/// Returns [`CodecError::Truncated`] for a short header,
/// [`CodecError::UnknownAction`] for an out-of-range action byte, and
/// [`CodecError::DataLength`] when the declared length disagrees with the
/// bytes that follow.
pub fn decode_envelope(bytes: &[u8]) -> Result<Envelope, CodecError> {
    let mut buf = bytes;
    if buf.remaining() < HEADER_LEN {
        return Err(CodecError::Truncated { needed: HEADER_LEN, have: buf.remaining() });
    }

    let page_index = buf.get_u32_le();
    let action = Action::from_u8(buf.get_u8())?;
    let declared = buf.get_u32_le() as usize;

    if buf.remaining() != declared {
        return Err(CodecError::DataLength { declared, actual: buf.remaining() });
    }

    Ok(Envelope { page_index, action, data: buf.to_vec() })
}

/// Pack object ids into the 16-bytes-per-id set used by `DeleteObjects`.
#[must_use]
pub fn encode_object_ids(ids: &[Uuid]) -> Vec<u8> {
    let mut out = Vec::with_capacity(ids.len() * 16);
    for id in ids {
        out.extend_from_slice(id.as_bytes());
    }
    out
}

/// Unpack an object-id set.
///
/// # Errors
///
/// Returns [`CodecError::InvalidIdSet`] unless the input is a whole number of
/// 16-byte ids.
pub fn decode_object_ids(bytes: &[u8]) -> Result<Vec<Uuid>, CodecError> {
    if !bytes.len().is_multiple_of(16) {
        return Err(CodecError::InvalidIdSet(bytes.len()));
    }
    Ok(bytes
        .chunks_exact(16)
        .map(|chunk| {
            // chunks_exact guarantees 16 bytes per chunk.
            let mut raw = [0_u8; 16];
            raw.copy_from_slice(chunk);
            Uuid::from_bytes(raw)
        })
        .collect())
}

#[cfg(test)]
#[path = "envelope_test.rs"]
mod tests;
