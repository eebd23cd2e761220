//! Node identifier and position types for the RGA-Split structure.
//!
//! This module contains TextNodeId, which names a text node (and every
//! fragment a node may split into), and TextNodePos, the stable cursor type
//! callers hold across concurrent edits.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::crdt::types::ticket::Ticket;

/// A unique identifier for each text node in the RGA-Split structure.
///
/// The creation ticket identifies the original insertion; the offset names a
/// fragment within it. Splitting a node at relative position `k` produces a
/// child ID `(created_at, offset + k)` that shares the parent's ticket, which
/// is the only way IDs with non-zero offsets come into existence.
///
/// # Ordering
///
/// IDs order first by creation ticket, then by offset, so all fragments of
/// one insertion sort together in offset order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextNodeId {
    created_at: Ticket,
    offset: u32,
}

impl TextNodeId {
    /// Creates a new node ID.
    pub const fn new(created_at: Ticket, offset: u32) -> Self {
        TextNodeId { created_at, offset }
    }

    /// Gets the creation ticket.
    pub fn created_at(&self) -> Ticket {
        self.created_at
    }

    /// Gets the fragment offset.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Derives the ID of the fragment starting `relative` bytes into this one.
    pub fn split(&self, relative: u32) -> TextNodeId {
        TextNodeId::new(self.created_at, self.offset + relative)
    }
}

impl PartialOrd for TextNodeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TextNodeId {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.created_at.cmp(&other.created_at) {
            Ordering::Equal => self.offset.cmp(&other.offset),
            other => other,
        }
    }
}

impl fmt::Display for TextNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.created_at, self.offset)
    }
}

/// A cursor into the text: a node ID plus a relative offset within it.
///
/// Positions carry an ID instead of a node handle because the target node may
/// be split between when a position is captured and when it is used. A
/// `relative_offset` of 0 means "immediately before the first byte of the
/// node with that ID".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextNodePos {
    id: TextNodeId,
    relative_offset: u32,
}

impl TextNodePos {
    /// Creates a new position.
    pub const fn new(id: TextNodeId, relative_offset: u32) -> Self {
        TextNodePos {
            id,
            relative_offset,
        }
    }

    /// Gets the anchor node ID.
    pub fn id(&self) -> TextNodeId {
        self.id
    }

    /// Gets the offset relative to the anchor node.
    pub fn relative_offset(&self) -> u32 {
        self.relative_offset
    }

    /// The absolute ID naming the character boundary this position refers to.
    pub fn absolute_id(&self) -> TextNodeId {
        self.id.split(self.relative_offset)
    }
}

impl fmt::Display for TextNodePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.id, self.relative_offset)
    }
}
