//! Order-statistics splay index over the text node arena.
//!
//! The index answers "which node contains visible offset `k`" in amortized
//! O(log n). Tree links and subtree weights live intrusively inside
//! [`TextNode`], so every operation takes the arena alongside the handles it
//! manipulates. A node's own contribution to its subtree weight is its
//! visible length, which is zero once it is tombstoned.

use crate::crdt::error::TextError;
use crate::crdt::node::{NodeIdx, TextNode};

/// The splay index: a self-adjusting BST over the arena, keyed implicitly by
/// traversal order and weighted by visible byte length.
#[derive(Debug, Clone, Default)]
pub(crate) struct IndexTree {
    root: Option<NodeIdx>,
}

impl IndexTree {
    pub(crate) fn new() -> Self {
        IndexTree { root: None }
    }

    /// Total visible length of the document.
    pub(crate) fn total_weight(&self, arena: &[TextNode]) -> usize {
        self.root.map_or(0, |r| arena[r as usize].weight)
    }

    /// Makes `node` the first entry of an empty tree. Used once, for the
    /// initial head sentinel.
    pub(crate) fn insert_root(&mut self, arena: &mut [TextNode], node: NodeIdx) {
        debug_assert!(self.root.is_none());
        update_weight(arena, node);
        self.root = Some(node);
    }

    /// Links `node` into traversal order just after `prev` and splays it to
    /// the root, refreshing weights along the way.
    pub(crate) fn insert_after(&mut self, arena: &mut [TextNode], prev: NodeIdx, node: NodeIdx) {
        self.splay(arena, prev);

        let pi = prev as usize;
        let ni = node as usize;
        arena[ni].right = arena[pi].right;
        if let Some(r) = arena[pi].right {
            arena[r as usize].parent = Some(node);
        }
        arena[ni].left = Some(prev);
        arena[pi].right = None;
        arena[pi].parent = Some(node);
        arena[ni].parent = None;
        self.root = Some(node);

        update_weight(arena, prev);
        update_weight(arena, node);
    }

    /// Splays `node` to the root with bottom-up zig / zig-zig / zig-zag
    /// rotations. Also recomputes the node's weight at the top, so callers
    /// that changed its visible length can splay to republish the weight.
    pub(crate) fn splay(&mut self, arena: &mut [TextNode], node: NodeIdx) {
        while let Some(p) = arena[node as usize].parent {
            match arena[p as usize].parent {
                None => self.rotate(arena, node), // zig
                Some(g) => {
                    let p_is_left = arena[g as usize].left == Some(p);
                    let n_is_left = arena[p as usize].left == Some(node);
                    if p_is_left == n_is_left {
                        // zig-zig: rotate the parent first
                        self.rotate(arena, p);
                        self.rotate(arena, node);
                    } else {
                        // zig-zag: rotate the node twice
                        self.rotate(arena, node);
                        self.rotate(arena, node);
                    }
                }
            }
        }
        update_weight(arena, node);
    }

    /// Finds the node containing visible offset `index` and the remainder
    /// within it, splaying the hit to the root.
    ///
    /// Boundary offsets resolve leftward: an `index` equal to the weight of
    /// everything up to and including a node returns that node with offset
    /// equal to its length, which also skips runs of zero-weight tombstones.
    /// `index == total` returns the last visible node the same way.
    pub(crate) fn find(
        &mut self,
        arena: &mut [TextNode],
        index: usize,
    ) -> Result<(NodeIdx, usize), TextError> {
        let Some(root) = self.root else {
            return Err(TextError::corrupt("find on an empty index tree"));
        };

        let mut node = root;
        let mut offset = index;
        loop {
            let n = &arena[node as usize];
            let left_weight = n.left.map_or(0, |l| arena[l as usize].weight);
            if n.left.is_some() && offset <= left_weight {
                node = n.left.expect("left child checked above");
            } else if n.right.is_some() && left_weight + n.len() < offset {
                offset -= left_weight + n.len();
                node = n.right.expect("right child checked above");
            } else {
                offset -= left_weight;
                break;
            }
        }

        if offset > arena[node as usize].len() {
            return Err(TextError::corrupt(format!(
                "offset {offset} exceeds node length {}",
                arena[node as usize].len()
            )));
        }

        self.splay(arena, node);
        Ok((node, offset))
    }

    /// Promotes `node` one level, preserving the in-order sequence and
    /// refreshing the two touched weights.
    fn rotate(&mut self, arena: &mut [TextNode], node: NodeIdx) {
        let Some(p) = arena[node as usize].parent else {
            return;
        };
        let g = arena[p as usize].parent;

        if arena[p as usize].left == Some(node) {
            let b = arena[node as usize].right;
            arena[p as usize].left = b;
            if let Some(b) = b {
                arena[b as usize].parent = Some(p);
            }
            arena[node as usize].right = Some(p);
        } else {
            let b = arena[node as usize].left;
            arena[p as usize].right = b;
            if let Some(b) = b {
                arena[b as usize].parent = Some(p);
            }
            arena[node as usize].left = Some(p);
        }
        arena[p as usize].parent = Some(node);
        arena[node as usize].parent = g;

        match g {
            Some(g) => {
                if arena[g as usize].left == Some(p) {
                    arena[g as usize].left = Some(node);
                } else {
                    arena[g as usize].right = Some(node);
                }
            }
            None => self.root = Some(node),
        }

        update_weight(arena, p);
        update_weight(arena, node);
    }

    /// In-order handle sequence, for coherence checks.
    #[cfg(test)]
    pub(crate) fn collect(&self, arena: &[TextNode]) -> Vec<NodeIdx> {
        fn walk(arena: &[TextNode], node: Option<NodeIdx>, out: &mut Vec<NodeIdx>) {
            let Some(n) = node else { return };
            walk(arena, arena[n as usize].left, out);
            out.push(n);
            walk(arena, arena[n as usize].right, out);
        }
        let mut out = Vec::new();
        walk(arena, self.root, &mut out);
        out
    }
}

/// Recomputes one node's subtree weight from its length and children.
fn update_weight(arena: &mut [TextNode], node: NodeIdx) {
    let n = &arena[node as usize];
    let weight = n.len()
        + n.left.map_or(0, |l| arena[l as usize].weight)
        + n.right.map_or(0, |r| arena[r as usize].weight);
    arena[node as usize].weight = weight;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crdt::types::{ACTOR_ID_SIZE, ActorId, TextNodeId, Ticket};

    fn push(arena: &mut Vec<TextNode>, lamport: u64, value: &str) -> NodeIdx {
        let ticket = Ticket::new(lamport, 0, ActorId::new([1; ACTOR_ID_SIZE]));
        arena.push(TextNode::new(TextNodeId::new(ticket, 0), value.to_string()));
        (arena.len() - 1) as NodeIdx
    }

    /// Arena with a head sentinel plus the given runs, linked in order.
    fn build(values: &[&str]) -> (Vec<TextNode>, IndexTree) {
        let mut arena = Vec::new();
        let head = push(&mut arena, 0, "");
        let mut tree = IndexTree::new();
        tree.insert_root(&mut arena, head);

        let mut prev = head;
        for (i, value) in values.iter().enumerate() {
            let node = push(&mut arena, i as u64 + 1, value);
            tree.insert_after(&mut arena, prev, node);
            prev = node;
        }
        (arena, tree)
    }

    #[test]
    fn test_find_walks_visible_offsets() {
        let (mut arena, mut tree) = build(&["He", "llo", "!"]);
        assert_eq!(tree.total_weight(&arena), 6);

        let (node, offset) = tree.find(&mut arena, 0).unwrap();
        assert_eq!((arena[node as usize].value.as_str(), offset), ("", 0));

        let (node, offset) = tree.find(&mut arena, 1).unwrap();
        assert_eq!((arena[node as usize].value.as_str(), offset), ("He", 1));

        let (node, offset) = tree.find(&mut arena, 3).unwrap();
        assert_eq!((arena[node as usize].value.as_str(), offset), ("llo", 1));

        // The boundary at the very end lands on the last node, at its length.
        let (node, offset) = tree.find(&mut arena, 6).unwrap();
        assert_eq!((arena[node as usize].value.as_str(), offset), ("!", 1));
    }

    #[test]
    fn test_boundary_offsets_resolve_leftward() {
        let (mut arena, mut tree) = build(&["ab", "cd"]);

        // Offset 2 is the seam: it belongs to the left node.
        let (node, offset) = tree.find(&mut arena, 2).unwrap();
        assert_eq!((arena[node as usize].value.as_str(), offset), ("ab", 2));
    }

    #[test]
    fn test_tombstones_carry_no_weight() {
        let (mut arena, mut tree) = build(&["ab", "cd", "ef"]);
        let victim = tree.find(&mut arena, 3).unwrap().0; // "cd"

        let edited_at = Ticket::new(9, 0, ActorId::new([2; ACTOR_ID_SIZE]));
        assert!(arena[victim as usize].remove(&edited_at, &Ticket::MAX));
        tree.splay(&mut arena, victim);

        assert_eq!(tree.total_weight(&arena), 4);

        // Offset 2 now sits between "ab" and "ef"; the tombstone is skipped
        // leftward.
        let (node, offset) = tree.find(&mut arena, 2).unwrap();
        assert_eq!((arena[node as usize].value.as_str(), offset), ("ab", 2));
        let (node, offset) = tree.find(&mut arena, 3).unwrap();
        assert_eq!((arena[node as usize].value.as_str(), offset), ("ef", 1));
    }

    #[test]
    fn test_find_past_the_end_is_corrupt() {
        let (mut arena, mut tree) = build(&["abc"]);
        assert!(matches!(
            tree.find(&mut arena, 4),
            Err(TextError::CorruptState(_))
        ));
    }

    #[test]
    fn test_weights_survive_splaying() {
        let (mut arena, mut tree) = build(&["a", "b", "c", "d", "e"]);

        // Splay every node in turn; the root weight must stay the total.
        for node in tree.collect(&arena) {
            tree.splay(&mut arena, node);
            assert_eq!(tree.total_weight(&arena), 5);
        }

        // In-order sequence is unchanged by splaying.
        let values: Vec<_> = tree
            .collect(&arena)
            .into_iter()
            .map(|n| arena[n as usize].value.clone())
            .collect();
        assert_eq!(values, ["", "a", "b", "c", "d", "e"]);
    }
}
