//! Node definition for the RGA-Split structure.
//!
//! This module contains the TextNode struct which represents one contiguous
//! run of text, together with the link fields that thread it into the
//! traversal list, the insertion-history chain, and the splay index.

use crate::crdt::types::{TextNodeId, Ticket};

/// Arena handle for a [`TextNode`]. All node graphs in the engine hold these
/// stable indices instead of references.
pub(crate) type NodeIdx = u32;

/// Represents one run of text within the RGA-Split structure.
///
/// Each node contains:
/// - A unique identifier that names the run and every fragment split from it
/// - The UTF-8 content of the run
/// - An optional deletion ticket that acts as a tombstone for logical deletion
///
/// # Tombstone deletion
///
/// Instead of physically removing nodes, the structure marks them deleted by
/// setting `deleted_at`. The node keeps its ID, content, and links, so
/// concurrent operations that captured positions inside it still resolve.
///
/// # Links
///
/// `prev`/`next` carry the visible traversal order. `ins_prev`/`ins_next`
/// carry insertion history: every fragment split from one original insertion
/// is chained there in offset order, and invariant 3 of the structure relies
/// on `ins_prev` being present whenever `id.offset() > 0`. The `parent`/
/// `left`/`right`/`weight` fields are owned by the splay index.
#[derive(Debug, Clone)]
pub struct TextNode {
    pub(crate) id: TextNodeId,
    pub(crate) value: String,
    pub(crate) deleted_at: Option<Ticket>,

    pub(crate) prev: Option<NodeIdx>,
    pub(crate) next: Option<NodeIdx>,
    pub(crate) ins_prev: Option<NodeIdx>,
    pub(crate) ins_next: Option<NodeIdx>,

    pub(crate) parent: Option<NodeIdx>,
    pub(crate) left: Option<NodeIdx>,
    pub(crate) right: Option<NodeIdx>,
    pub(crate) weight: usize,
}

impl TextNode {
    /// Creates a new live node with the given ID and content.
    pub(crate) fn new(id: TextNodeId, value: String) -> Self {
        TextNode {
            id,
            value,
            deleted_at: None,
            prev: None,
            next: None,
            ins_prev: None,
            ins_next: None,
            parent: None,
            left: None,
            right: None,
            weight: 0,
        }
    }

    /// Creates a node carrying an existing tombstone, used when copying a
    /// document and when splitting a deleted node.
    pub(crate) fn with_deleted(id: TextNodeId, value: String, deleted_at: Option<Ticket>) -> Self {
        let mut node = TextNode::new(id, value);
        node.deleted_at = deleted_at;
        node
    }

    /// The creation ticket of this node.
    pub(crate) fn created_at(&self) -> Ticket {
        self.id.created_at()
    }

    /// Visible length in bytes: zero for tombstones.
    pub(crate) fn len(&self) -> usize {
        if self.deleted_at.is_some() {
            0
        } else {
            self.value.len()
        }
    }

    /// Stored content length in bytes, tombstoned or not.
    pub(crate) fn content_len(&self) -> usize {
        self.value.len()
    }

    /// Whether this node has been logically deleted.
    pub(crate) fn is_removed(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Marks this node deleted if the causal filter allows it.
    ///
    /// Deletion succeeds iff the node's creation is not after the deleting
    /// actor's observed frontier `max_created_at`, and the node is either
    /// live or tombstoned by an earlier ticket than `edited_at`. Returns
    /// whether the tombstone was written.
    pub(crate) fn remove(&mut self, edited_at: &Ticket, max_created_at: &Ticket) -> bool {
        if !self.created_at().after(max_created_at)
            && self.deleted_at.is_none_or(|d| edited_at.after(&d))
        {
            self.deleted_at = Some(*edited_at);
            true
        } else {
            false
        }
    }
}
