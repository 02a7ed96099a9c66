//! Page state and the reconciliation rules for applying envelopes.
//!
//! ARCHITECTURE
//! ============
//! `PageStore` is the canonical implementation of the contract between the
//! sync channel and canvas state. Both directions go through it:
//!
//! - **Local edit**: mutate local state first, then send the single envelope
//!   the edit method returns. Sending never mutates state.
//! - **Remote envelope**: [`PageStore::apply`] mutates the addressed page
//!   directly, with no merge or diff step. Whichever envelope a receiver
//!   applies last wins: concurrent edits to the same object are resolved by
//!   arrival order alone, and receivers may transiently disagree until all
//!   envelopes are delivered.
//!
//! Undo is local-only: [`PageStore::snapshot`] / [`PageStore::restore`]
//! rewind a page without generating traffic. A client that wants peers to
//! see the revert sends the [`PageStore::share_page`] envelope explicitly.
//!
//! Shape geometry is opaque: drawables enter and leave as bytes through the
//! [`DrawableCodec`] seam, and the only thing this module ever asks of a
//! drawable is its identity.

use tracing::debug;
use uuid::Uuid;
use wire::{Action, CodecError, Envelope, decode_object_ids, encode_object_ids};

/// Grid spacing a freshly created page starts with.
pub const DEFAULT_GRID_SPACING: f32 = 50.0;

/// A shape the sync layer can identify. Geometry and rendering live
/// elsewhere.
pub trait Drawable {
    /// Stable identity used by delete-by-id and replace-by-id.
    fn drawable_id(&self) -> Uuid;
}

/// External collaborator that serializes shape geometry for the wire.
pub trait DrawableCodec {
    /// The concrete drawable type this codec understands.
    type Drawable: Drawable + Clone;
    /// Decode failure reported when inbound drawable bytes are malformed.
    type Error: std::fmt::Display;

    /// Serialize a set of drawables into envelope data.
    fn encode(&self, drawables: &[Self::Drawable]) -> Vec<u8>;

    /// Deserialize envelope data into drawables.
    ///
    /// # Errors
    ///
    /// Implementations return their own error for malformed bytes; the store
    /// surfaces it as [`ApplyError::Drawable`].
    fn decode(&self, bytes: &[u8]) -> Result<Vec<Self::Drawable>, Self::Error>;
}

/// One canvas: its drawables and grid settings.
#[derive(Debug, Clone)]
pub struct Page<D> {
    /// Draw-ordered shape list.
    pub drawables: Vec<D>,
    /// Grid spacing in canvas units.
    pub grid_spacing: f32,
    /// Whether the grid is shown.
    pub grid_visible: bool,
}

impl<D> Default for Page<D> {
    fn default() -> Self {
        Self {
            drawables: Vec::new(),
            grid_spacing: DEFAULT_GRID_SPACING,
            grid_visible: true,
        }
    }
}

/// Error applying an inbound envelope. The caller logs and drops the
/// envelope; apply failures never tear down the session.
#[derive(Debug, thiserror::Error)]
pub enum ApplyError {
    /// The drawable codec rejected the envelope's data.
    #[error("drawable decode failed: {0}")]
    Drawable(String),
    /// The envelope's data failed a wire-level check (id set, grid payload).
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// All pages of one shared canvas document.
pub struct PageStore<C: DrawableCodec> {
    codec: C,
    pages: Vec<Page<C::Drawable>>,
}

impl<C: DrawableCodec> PageStore<C> {
    /// Create a store with a single empty page, so page 0 exists before any
    /// traffic arrives.
    pub fn new(codec: C) -> Self {
        Self { codec, pages: vec![Page::default()] }
    }

    /// Number of pages currently in the document.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Borrow a page, if it exists.
    #[must_use]
    pub fn page(&self, page_index: u32) -> Option<&Page<C::Drawable>> {
        self.pages.get(page_index as usize)
    }

    // -------------------------------------------------------------------------
    // Inbound: remote envelope -> local mutation
    // -------------------------------------------------------------------------

    /// Apply one inbound envelope to the addressed page.
    ///
    /// An envelope for an unknown page is a graceful no-op (the page may have
    /// been deleted locally or not created yet). Last-write-wins: nothing is
    /// merged, versioned, or rejected as stale.
    ///
    /// # Errors
    ///
    /// Returns [`ApplyError`] when the envelope's data is malformed for its
    /// action. The page is left unchanged in that case.
    pub fn apply(&mut self, envelope: &Envelope) -> Result<(), ApplyError> {
        let index = envelope.page_index as usize;

        // Page-set actions first: they are the only ones that may target an
        // index that does not exist yet.
        match envelope.action {
            Action::AddNewPage => {
                self.pages.insert(index.min(self.pages.len()), Page::default());
                return Ok(());
            }
            Action::DeletePage => {
                if index < self.pages.len() {
                    self.pages.remove(index);
                } else {
                    debug!(page = envelope.page_index, "ignoring delete of unknown page");
                }
                return Ok(());
            }
            _ => {}
        }

        let Some(page) = self.pages.get_mut(index) else {
            debug!(page = envelope.page_index, action = ?envelope.action, "ignoring envelope for unknown page");
            return Ok(());
        };

        match envelope.action {
            Action::AddObjects => {
                let incoming = self
                    .codec
                    .decode(&envelope.data)
                    .map_err(|e| ApplyError::Drawable(e.to_string()))?;
                page.drawables.extend(incoming);
            }
            Action::UpdateObjects => {
                let incoming = self
                    .codec
                    .decode(&envelope.data)
                    .map_err(|e| ApplyError::Drawable(e.to_string()))?;
                for updated in incoming {
                    // Objects not present are ignored, not inserted.
                    if let Some(existing) = page
                        .drawables
                        .iter_mut()
                        .find(|d| d.drawable_id() == updated.drawable_id())
                    {
                        *existing = updated;
                    }
                }
            }
            Action::ReplacePage => {
                page.drawables = self
                    .codec
                    .decode(&envelope.data)
                    .map_err(|e| ApplyError::Drawable(e.to_string()))?;
            }
            Action::DeleteObjects => {
                let ids = decode_object_ids(&envelope.data)?;
                page.drawables.retain(|d| !ids.contains(&d.drawable_id()));
            }
            Action::ClearPage => page.drawables.clear(),
            Action::UpdateGrid => page.grid_spacing = envelope.grid_spacing()?,
            Action::UpdateGridVisibility => page.grid_visible = envelope.grid_visible()?,
            // Handled above.
            Action::AddNewPage | Action::DeletePage => {}
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Outbound: local edit -> envelope to send
    // -------------------------------------------------------------------------

    /// Append drawables locally; returns the envelope to send, or `None` if
    /// the page does not exist (nothing was mutated, nothing to send).
    pub fn add_objects(&mut self, page_index: u32, drawables: Vec<C::Drawable>) -> Option<Envelope> {
        let data = self.codec.encode(&drawables);
        let page = self.pages.get_mut(page_index as usize)?;
        page.drawables.extend(drawables);
        Some(Envelope::new(page_index, Action::AddObjects, data))
    }

    /// Replace drawables by id locally; drawables whose ids are absent are
    /// still carried in the envelope (peers may know them).
    pub fn update_objects(
        &mut self,
        page_index: u32,
        drawables: Vec<C::Drawable>,
    ) -> Option<Envelope> {
        let data = self.codec.encode(&drawables);
        let page = self.pages.get_mut(page_index as usize)?;
        for updated in drawables {
            if let Some(existing) = page
                .drawables
                .iter_mut()
                .find(|d| d.drawable_id() == updated.drawable_id())
            {
                *existing = updated;
            }
        }
        Some(Envelope::new(page_index, Action::UpdateObjects, data))
    }

    /// Remove drawables by id locally.
    pub fn delete_objects(&mut self, page_index: u32, ids: &[Uuid]) -> Option<Envelope> {
        let page = self.pages.get_mut(page_index as usize)?;
        page.drawables.retain(|d| !ids.contains(&d.drawable_id()));
        Some(Envelope::new(page_index, Action::DeleteObjects, encode_object_ids(ids)))
    }

    /// Discard every drawable on the page locally.
    pub fn clear_page(&mut self, page_index: u32) -> Option<Envelope> {
        let page = self.pages.get_mut(page_index as usize)?;
        page.drawables.clear();
        Some(Envelope::clear_page(page_index))
    }

    /// Set the page's grid spacing locally.
    pub fn set_grid_spacing(&mut self, page_index: u32, spacing: f32) -> Option<Envelope> {
        let page = self.pages.get_mut(page_index as usize)?;
        page.grid_spacing = spacing;
        Some(Envelope::update_grid(page_index, spacing))
    }

    /// Show or hide the page's grid locally.
    pub fn set_grid_visible(&mut self, page_index: u32, visible: bool) -> Option<Envelope> {
        let page = self.pages.get_mut(page_index as usize)?;
        page.grid_visible = visible;
        Some(Envelope::update_grid_visibility(page_index, visible))
    }

    /// Insert a fresh page at `page_index` (clamped to the page count).
    pub fn add_page(&mut self, page_index: u32) -> Envelope {
        let at = (page_index as usize).min(self.pages.len());
        self.pages.insert(at, Page::default());
        Envelope::add_new_page(page_index)
    }

    /// Remove a page locally.
    pub fn remove_page(&mut self, page_index: u32) -> Option<Envelope> {
        let index = page_index as usize;
        if index >= self.pages.len() {
            return None;
        }
        self.pages.remove(index);
        Some(Envelope::delete_page(page_index))
    }

    /// Envelope carrying the page's full current drawable list, for peers
    /// that should adopt this client's view (e.g. after a local undo).
    #[must_use]
    pub fn share_page(&self, page_index: u32) -> Option<Envelope> {
        let page = self.pages.get(page_index as usize)?;
        Some(Envelope::new(
            page_index,
            Action::ReplacePage,
            self.codec.encode(&page.drawables),
        ))
    }

    // -------------------------------------------------------------------------
    // Undo (local-only)
    // -------------------------------------------------------------------------

    /// Capture the page's drawable list for a later [`PageStore::restore`].
    #[must_use]
    pub fn snapshot(&self, page_index: u32) -> Option<Vec<C::Drawable>> {
        Some(self.pages.get(page_index as usize)?.drawables.clone())
    }

    /// Rewind the page to a snapshot. Local-only: no envelope is produced;
    /// peers only see the revert if the caller sends
    /// [`PageStore::share_page`] afterwards. Returns false for an unknown
    /// page.
    pub fn restore(&mut self, page_index: u32, snapshot: Vec<C::Drawable>) -> bool {
        let Some(page) = self.pages.get_mut(page_index as usize) else {
            return false;
        };
        page.drawables = snapshot;
        true
    }
}

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;
