//! Core RGA-Split CRDT implementation.
//!
//! This module contains the RgaTreeSplit struct: an intrusive doubly-linked
//! list of text runs carrying the visible sequence, indexed two ways: a
//! splay tree by visible offset and an LLRB tree by node ID. Together they
//! implement the edit algorithm that makes concurrent inserts and range
//! deletes converge under arbitrary delivery orders.
//!
//! # Design
//!
//! - Nodes live in an arena (`Vec<TextNode>`) and every link is a stable
//!   `u32` handle, so the four link chains and two trees can share nodes
//!   without cyclic ownership
//! - Positions are resolved by ID floor queries, never by raw handles, so a
//!   position stays valid across concurrent splits of its target
//! - Deletion is tombstone-based and causally filtered against per-actor
//!   creation frontiers
//! - A sentinel head node anchors the traversal and is never deleted

use std::collections::HashMap;

use tracing::{debug, error};

use crate::crdt::error::TextError;
use crate::crdt::llrb::IdIndex;
use crate::crdt::node::{NodeIdx, TextNode};
use crate::crdt::splay::IndexTree;
use crate::crdt::types::{ActorId, TextNodeId, TextNodePos, Ticket};

/// Arena handle of the initial head sentinel.
const HEAD: NodeIdx = 0;

/// Per-actor creation frontiers: the greatest creation ticket of each actor
/// observed (inbound) or tombstoned (outbound) by an edit.
pub type MaxCreatedAtMap = HashMap<ActorId, Ticket>;

/// The RGA-Split structure: a splittable-node replicated growable array over
/// UTF-8 text.
///
/// All offsets, lengths, and weights count bytes. Mutations must be
/// externally serialized by the owner; the structure contains no locks and
/// never blocks.
#[derive(Debug, Clone)]
pub struct RgaTreeSplit {
    nodes: Vec<TextNode>,
    index_tree: IndexTree,
    id_index: IdIndex,
}

impl RgaTreeSplit {
    /// Creates an empty structure holding only the head sentinel.
    pub fn new() -> Self {
        let head = TextNode::new(TextNodeId::new(Ticket::INITIAL, 0), String::new());
        let mut rga = RgaTreeSplit {
            nodes: vec![head],
            index_tree: IndexTree::new(),
            id_index: IdIndex::new(),
        };
        rga.index_tree.insert_root(&mut rga.nodes, HEAD);
        rga.id_index.put(rga.nodes[HEAD as usize].id, HEAD);
        rga
    }

    /// Visible length of the document in bytes.
    pub fn len(&self) -> usize {
        self.index_tree.total_weight(&self.nodes)
    }

    /// Whether the document has no visible content.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolves a visible byte offset into a stable position.
    pub fn find_node_pos(&mut self, index: usize) -> Result<TextNodePos, TextError> {
        let (node, offset) = self.index_tree.find(&mut self.nodes, index)?;
        Ok(TextNodePos::new(self.nodes[node as usize].id, offset as u32))
    }

    /// Resolves the visible range `[from, to)` into a pair of positions.
    pub fn create_range(
        &mut self,
        from: usize,
        to: usize,
    ) -> Result<(TextNodePos, TextNodePos), TextError> {
        let len = self.len();
        if from > to || to > len {
            return Err(TextError::invalid_position(format!(
                "range {from}..{to} out of bounds for length {len}"
            )));
        }
        let from_pos = self.find_node_pos(from)?;
        let to_pos = if from == to {
            from_pos
        } else {
            self.find_node_pos(to)?
        };
        Ok((from_pos, to_pos))
    }

    /// Applies one edit: tombstones the covered range under the causal
    /// filter, then inserts `content` at the left boundary.
    ///
    /// `max_created_at_map` is the originator's per-actor creation frontier.
    /// `None` means the edit executed locally and deletes unconditionally; a
    /// present map deletes an actor's nodes only up to its entry, and nothing
    /// of actors it omits.
    ///
    /// Returns the caret position after the edit and the per-actor map of
    /// the greatest creation ticket actually tombstoned.
    ///
    /// An edit whose boundary refers to an insertion this replica has not
    /// seen applies as a no-op: the caller's `from` position and an empty
    /// map come back unchanged.
    pub fn edit(
        &mut self,
        from: &TextNodePos,
        to: &TextNodePos,
        max_created_at_map: Option<&MaxCreatedAtMap>,
        content: &str,
        edited_at: Ticket,
    ) -> Result<(TextNodePos, MaxCreatedAtMap), TextError> {
        // Resolve `to` first so its boundary handles stay valid while the
        // left boundary splits.
        let Some((to_left, to_right)) = self.find_node_with_split(to, &edited_at)? else {
            return Ok((*from, MaxCreatedAtMap::new()));
        };
        let Some((from_left, from_right)) = self.find_node_with_split(from, &edited_at)? else {
            return Ok((*from, MaxCreatedAtMap::new()));
        };

        let candidates = self.find_between(from_right, to_right);
        let deleted = self.delete_nodes(&candidates, max_created_at_map, &edited_at);

        let caret_id = match to_right {
            Some(right) => self.nodes[right as usize].id,
            None => self.nodes[to_left as usize].id,
        };
        let mut caret = TextNodePos::new(caret_id, 0);

        if !content.is_empty() {
            let node = TextNode::new(TextNodeId::new(edited_at, 0), content.to_string());
            let inserted = self.insert_after(from_left, node);
            caret = TextNodePos::new(self.nodes[inserted as usize].id, content.len() as u32);
        }

        debug!(
            %edited_at,
            content_len = content.len(),
            deleted_actors = deleted.len(),
            "applied edit"
        );
        Ok((caret, deleted))
    }

    /// Concatenation of live content in traversal order.
    pub fn marshal(&self) -> String {
        let mut out = String::with_capacity(self.len());
        let mut cursor = self.nodes[HEAD as usize].next;
        while let Some(idx) = cursor {
            let node = &self.nodes[idx as usize];
            if !node.is_removed() {
                out.push_str(&node.value);
            }
            cursor = node.next;
        }
        out
    }

    /// Renders every node in traversal order, head included: live nodes as
    /// `[id value]` and tombstones as `{id value}`. Intended for fixtures.
    pub fn annotated_string(&self) -> String {
        let mut out = String::new();
        let mut cursor = Some(HEAD);
        while let Some(idx) = cursor {
            let node = &self.nodes[idx as usize];
            if node.is_removed() {
                out.push_str(&format!("{{{} {}}}", node.id, node.value));
            } else {
                out.push_str(&format!("[{} {}]", node.id, node.value));
            }
            cursor = node.next;
        }
        out
    }

    /// All non-sentinel nodes in traversal order, tombstones included.
    pub fn nodes(&self) -> Nodes<'_> {
        Nodes {
            rga: self,
            cursor: self.nodes[HEAD as usize].next,
        }
    }

    /// Builds an independent copy with identical traversal order, tombstones,
    /// and insertion-history chains, and freshly built indices.
    pub fn deep_copy(&self) -> Self {
        let mut copy = RgaTreeSplit::new();

        let mut prev = HEAD;
        let mut cursor = self.nodes[HEAD as usize].next;
        while let Some(idx) = cursor {
            let node = &self.nodes[idx as usize];
            prev = copy.insert_after(
                prev,
                TextNode::with_deleted(node.id, node.value.clone(), node.deleted_at),
            );
            cursor = node.next;
        }

        // Re-link insertion history by resolving IDs inside the copy.
        let mut cursor = self.nodes[HEAD as usize].next;
        while let Some(idx) = cursor {
            let node = &self.nodes[idx as usize];
            if let Some(ins_prev) = node.ins_prev {
                let prev_id = self.nodes[ins_prev as usize].id;
                if let (Some(to), Some(from)) =
                    (copy.find_node(&node.id), copy.find_node(&prev_id))
                {
                    copy.set_ins_prev(to, from);
                }
            }
            cursor = node.next;
        }
        copy
    }

    /// Resolves a position into its `(left, right)` boundary handles,
    /// splitting the containing node when the position falls inside it.
    ///
    /// Returns `None` when the position's creation is unknown to this
    /// replica (the target insertion has not arrived yet).
    fn find_node_with_split(
        &mut self,
        pos: &TextNodePos,
        edited_at: &Ticket,
    ) -> Result<Option<(NodeIdx, Option<NodeIdx>)>, TextError> {
        let absolute_id = pos.absolute_id();
        let Some(mut node) = self.find_floor_prefer_to_left(&absolute_id)? else {
            return Ok(None);
        };

        let relative = (absolute_id.offset() - self.nodes[node as usize].id.offset()) as usize;
        self.split_node(node, relative)?;

        // Slide right past concurrent inserts with greater tickets: they
        // already earned their place and the new content anchors after them.
        while let Some(next) = self.nodes[node as usize].next {
            if !self.nodes[next as usize].created_at().after(edited_at) {
                break;
            }
            node = next;
        }

        Ok(Some((node, self.nodes[node as usize].next)))
    }

    /// Floor lookup that prefers the left sibling at fragment seams: when the
    /// absolute ID lands exactly on a fragment's own starting offset, the
    /// split that may follow must happen on the fragment to its left.
    fn find_floor_prefer_to_left(
        &self,
        id: &TextNodeId,
    ) -> Result<Option<NodeIdx>, TextError> {
        let Some(node) = self.find_floor_node(id) else {
            return Ok(None);
        };

        if id.offset() > 0 && self.nodes[node as usize].id.offset() == id.offset() {
            let Some(ins_prev) = self.nodes[node as usize].ins_prev else {
                error!(id = %self.nodes[node as usize].id, "fragment has no ins_prev");
                return Err(TextError::corrupt(
                    "fragment with non-zero offset lacks an ins_prev link",
                ));
            };
            return Ok(Some(ins_prev));
        }
        Ok(Some(node))
    }

    /// Floor by ID, constrained to the same insertion: the result must be an
    /// exact match or share the creation ticket. Anything else means the
    /// insertion named by `id` is unknown here.
    fn find_floor_node(&self, id: &TextNodeId) -> Option<NodeIdx> {
        let (key, value) = self.id_index.floor(id)?;
        if key != *id && key.created_at() != id.created_at() {
            return None;
        }
        Some(value)
    }

    /// Exact ID lookup.
    fn find_node(&self, id: &TextNodeId) -> Option<NodeIdx> {
        self.id_index.get(id)
    }

    /// Splits `node` at `offset` bytes into its content, producing a sibling
    /// fragment that inherits the tombstone and joins the insertion-history
    /// chain. Offsets at either end are no-ops.
    fn split_node(&mut self, node: NodeIdx, offset: usize) -> Result<(), TextError> {
        let content_len = self.nodes[node as usize].content_len();
        if offset > content_len {
            error!(offset, content_len, "split offset beyond content");
            return Err(TextError::corrupt(format!(
                "split offset {offset} exceeds content length {content_len}"
            )));
        }
        if offset == 0 || offset == content_len {
            return Ok(());
        }
        if !self.nodes[node as usize].value.is_char_boundary(offset) {
            return Err(TextError::invalid_position(format!(
                "offset {offset} is not a char boundary"
            )));
        }

        // Shrink the original and republish its weight path.
        let tail = self.nodes[node as usize].value.split_off(offset);
        self.index_tree.splay(&mut self.nodes, node);

        let id = self.nodes[node as usize].id.split(offset as u32);
        let deleted_at = self.nodes[node as usize].deleted_at;
        let split = self.insert_after(node, TextNode::with_deleted(id, tail, deleted_at));

        // Splice the fragment between the original and its former ins_next.
        if let Some(ins_next) = self.nodes[node as usize].ins_next {
            self.set_ins_prev(ins_next, split);
        }
        self.set_ins_prev(split, node);
        Ok(())
    }

    /// Links a fresh node after `prev` in the list and both indices.
    fn insert_after(&mut self, prev: NodeIdx, node: TextNode) -> NodeIdx {
        let idx = self.nodes.len() as NodeIdx;
        self.nodes.push(node);

        let next = self.nodes[prev as usize].next;
        self.nodes[idx as usize].prev = Some(prev);
        self.nodes[idx as usize].next = next;
        self.nodes[prev as usize].next = Some(idx);
        if let Some(next) = next {
            self.nodes[next as usize].prev = Some(idx);
        }

        self.id_index.put(self.nodes[idx as usize].id, idx);
        self.index_tree.insert_after(&mut self.nodes, prev, idx);
        idx
    }

    fn set_ins_prev(&mut self, node: NodeIdx, prev: NodeIdx) {
        self.nodes[node as usize].ins_prev = Some(prev);
        self.nodes[prev as usize].ins_next = Some(node);
    }

    /// The `next`-chain from `from` up to but excluding `to`.
    fn find_between(&self, from: Option<NodeIdx>, to: Option<NodeIdx>) -> Vec<NodeIdx> {
        let mut out = Vec::new();
        let mut cursor = from;
        while let Some(idx) = cursor {
            if Some(idx) == to {
                break;
            }
            out.push(idx);
            cursor = self.nodes[idx as usize].next;
        }
        out
    }

    /// Tombstones every candidate the causal filter admits, splaying each so
    /// the index weights reflect the lost length. Returns the greatest
    /// creation ticket tombstoned per actor.
    fn delete_nodes(
        &mut self,
        candidates: &[NodeIdx],
        max_created_at_map: Option<&MaxCreatedAtMap>,
        edited_at: &Ticket,
    ) -> MaxCreatedAtMap {
        let mut deleted = MaxCreatedAtMap::new();
        for &idx in candidates {
            let actor = self.nodes[idx as usize].created_at().actor;
            let max_created_at = match max_created_at_map {
                None => Ticket::MAX,
                Some(map) => map.get(&actor).copied().unwrap_or(Ticket::INITIAL),
            };

            if self.nodes[idx as usize].remove(edited_at, &max_created_at) {
                self.index_tree.splay(&mut self.nodes, idx);
                let created_at = self.nodes[idx as usize].created_at();
                deleted
                    .entry(actor)
                    .and_modify(|latest| {
                        if created_at.after(latest) {
                            *latest = created_at;
                        }
                    })
                    .or_insert(created_at);
            }
        }
        deleted
    }

    /// IDs reachable from the head via `next`, head included.
    #[cfg(test)]
    fn traversal_ids(&self) -> Vec<TextNodeId> {
        let mut out = Vec::new();
        let mut cursor = Some(HEAD);
        while let Some(idx) = cursor {
            out.push(self.nodes[idx as usize].id);
            cursor = self.nodes[idx as usize].next;
        }
        out
    }
}

impl Default for RgaTreeSplit {
    fn default() -> Self {
        RgaTreeSplit::new()
    }
}

/// Iterator over the non-sentinel nodes of a document in traversal order.
pub struct Nodes<'a> {
    rga: &'a RgaTreeSplit,
    cursor: Option<NodeIdx>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<NodeRef<'a>> {
        let idx = self.cursor?;
        self.cursor = self.rga.nodes[idx as usize].next;
        Some(NodeRef { rga: self.rga, idx })
    }
}

/// Read-only view of one text node, as exposed to persistence and tests.
pub struct NodeRef<'a> {
    rga: &'a RgaTreeSplit,
    idx: NodeIdx,
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> TextNodeId {
        self.rga.nodes[self.idx as usize].id
    }

    pub fn value(&self) -> &'a str {
        &self.rga.nodes[self.idx as usize].value
    }

    pub fn deleted_at(&self) -> Option<Ticket> {
        self.rga.nodes[self.idx as usize].deleted_at
    }

    pub fn is_removed(&self) -> bool {
        self.rga.nodes[self.idx as usize].is_removed()
    }

    /// The ID of the node that sat immediately left when this node was
    /// created by a split, if any.
    pub fn ins_prev_id(&self) -> Option<TextNodeId> {
        self.rga.nodes[self.idx as usize]
            .ins_prev
            .map(|p| self.rga.nodes[p as usize].id)
    }
}
