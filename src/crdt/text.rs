//! Text element façade over the RGA-Split structure.
//!
//! This module contains the Text struct, the surface the surrounding
//! document works with: it resolves visible ranges into stable positions,
//! applies edits, and exposes the traversal used by persistence.

use tracing::debug;

use crate::crdt::error::TextError;
use crate::crdt::rga_split::{MaxCreatedAtMap, Nodes, RgaTreeSplit};
use crate::crdt::types::{TextNodePos, Ticket};

/// A collaborative plain-text element.
///
/// The `created_at` ticket identifies this element inside the enclosing
/// document; all content state lives in the wrapped [`RgaTreeSplit`].
///
/// Mutations on one `Text` must be serialized by its owner. Edits are
/// synchronous and never block.
#[derive(Debug, Clone)]
pub struct Text {
    rga: RgaTreeSplit,
    created_at: Ticket,
}

impl Text {
    /// Creates an empty text element.
    pub fn new(created_at: Ticket) -> Self {
        Text {
            rga: RgaTreeSplit::new(),
            created_at,
        }
    }

    /// The ticket identifying this element in the enclosing document.
    pub fn created_at(&self) -> Ticket {
        self.created_at
    }

    /// Visible length in bytes.
    pub fn len(&self) -> usize {
        self.rga.len()
    }

    /// Whether the text has no visible content.
    pub fn is_empty(&self) -> bool {
        self.rga.is_empty()
    }

    /// Resolves the visible range `[from, to)` into two stable positions
    /// suitable for [`edit`](Text::edit), now or after further concurrent
    /// edits.
    ///
    /// # Errors
    ///
    /// `InvalidPosition` when `from > to` or `to` exceeds the visible length.
    pub fn find_boundary(
        &mut self,
        from: usize,
        to: usize,
    ) -> Result<(TextNodePos, TextNodePos), TextError> {
        self.rga.create_range(from, to)
    }

    /// Replaces the range between `from` and `to` with `content`.
    ///
    /// Deletion is causally filtered by `max_created_at_map`; see
    /// [`RgaTreeSplit::edit`]. Returns the caret after the edit and the
    /// per-actor map of what was actually tombstoned, which the caller
    /// persists alongside the operation.
    pub fn edit(
        &mut self,
        from: &TextNodePos,
        to: &TextNodePos,
        max_created_at_map: Option<&MaxCreatedAtMap>,
        content: &str,
        edited_at: Ticket,
    ) -> Result<(TextNodePos, MaxCreatedAtMap), TextError> {
        debug!(element = %self.created_at, %from, %to, "edit");
        self.rga.edit(from, to, max_created_at_map, content, edited_at)
    }

    /// The visible string.
    pub fn marshal(&self) -> String {
        self.rga.marshal()
    }

    /// All nodes in traversal order, tombstones included.
    pub fn nodes(&self) -> Nodes<'_> {
        self.rga.nodes()
    }

    /// Fixture rendering: `[id value]` for live nodes, `{id value}` for
    /// tombstones.
    pub fn annotated_string(&self) -> String {
        self.rga.annotated_string()
    }

    /// An independent copy with an identical node graph and fresh indices.
    pub fn deep_copy(&self) -> Text {
        Text {
            rga: self.rga.deep_copy(),
            created_at: self.created_at,
        }
    }
}
