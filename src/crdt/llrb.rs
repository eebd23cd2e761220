//! Left-leaning red-black index from node IDs to arena handles.
//!
//! The ID index exists for one query: `floor(id)`, the node with the
//! greatest ID not exceeding `id`, which is how a position captured before
//! a split finds the fragment that now carries it. Text nodes are never
//! physically removed, so the tree only ever inserts (idempotently) and
//! reads.

use std::cmp::Ordering;

use crate::crdt::node::NodeIdx;
use crate::crdt::types::TextNodeId;

#[derive(Debug, Clone)]
struct Entry {
    key: TextNodeId,
    value: NodeIdx,
    left: Option<u32>,
    right: Option<u32>,
    red: bool,
}

/// Arena-backed left-leaning red-black tree keyed by [`TextNodeId`].
#[derive(Debug, Clone, Default)]
pub(crate) struct IdIndex {
    entries: Vec<Entry>,
    root: Option<u32>,
}

impl IdIndex {
    pub(crate) fn new() -> Self {
        IdIndex {
            entries: Vec::new(),
            root: None,
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Inserts `key → value`, replacing the value if the key is present.
    pub(crate) fn put(&mut self, key: TextNodeId, value: NodeIdx) {
        let root = self.insert(self.root, key, value);
        self.entries[root as usize].red = false;
        self.root = Some(root);
    }

    /// Exact lookup.
    pub(crate) fn get(&self, key: &TextNodeId) -> Option<NodeIdx> {
        let mut node = self.root;
        while let Some(i) = node {
            let entry = &self.entries[i as usize];
            match key.cmp(&entry.key) {
                Ordering::Equal => return Some(entry.value),
                Ordering::Less => node = entry.left,
                Ordering::Greater => node = entry.right,
            }
        }
        None
    }

    /// The greatest entry with key ≤ `key`, if any.
    pub(crate) fn floor(&self, key: &TextNodeId) -> Option<(TextNodeId, NodeIdx)> {
        let mut node = self.root;
        let mut best = None;
        while let Some(i) = node {
            let entry = &self.entries[i as usize];
            match key.cmp(&entry.key) {
                Ordering::Equal => return Some((entry.key, entry.value)),
                Ordering::Less => node = entry.left,
                Ordering::Greater => {
                    best = Some((entry.key, entry.value));
                    node = entry.right;
                }
            }
        }
        best
    }

    /// All keys in ascending order, for coherence checks.
    #[cfg(test)]
    pub(crate) fn keys(&self) -> Vec<TextNodeId> {
        fn walk(entries: &[Entry], node: Option<u32>, out: &mut Vec<TextNodeId>) {
            let Some(i) = node else { return };
            walk(entries, entries[i as usize].left, out);
            out.push(entries[i as usize].key);
            walk(entries, entries[i as usize].right, out);
        }
        let mut out = Vec::new();
        walk(&self.entries, self.root, &mut out);
        out
    }

    fn insert(&mut self, node: Option<u32>, key: TextNodeId, value: NodeIdx) -> u32 {
        let Some(i) = node else {
            self.entries.push(Entry {
                key,
                value,
                left: None,
                right: None,
                red: true,
            });
            return (self.entries.len() - 1) as u32;
        };

        match key.cmp(&self.entries[i as usize].key) {
            Ordering::Less => {
                let left = self.insert(self.entries[i as usize].left, key, value);
                self.entries[i as usize].left = Some(left);
            }
            Ordering::Greater => {
                let right = self.insert(self.entries[i as usize].right, key, value);
                self.entries[i as usize].right = Some(right);
            }
            Ordering::Equal => {
                self.entries[i as usize].value = value;
                return i;
            }
        }

        self.fixup(i)
    }

    fn is_red(&self, node: Option<u32>) -> bool {
        node.map(|i| self.entries[i as usize].red).unwrap_or(false)
    }

    fn rotate_left(&mut self, h: u32) -> u32 {
        let x = self.entries[h as usize]
            .right
            .expect("rotate_left requires a right child");
        self.entries[h as usize].right = self.entries[x as usize].left;
        self.entries[x as usize].left = Some(h);
        self.entries[x as usize].red = self.entries[h as usize].red;
        self.entries[h as usize].red = true;
        x
    }

    fn rotate_right(&mut self, h: u32) -> u32 {
        let x = self.entries[h as usize]
            .left
            .expect("rotate_right requires a left child");
        self.entries[h as usize].left = self.entries[x as usize].right;
        self.entries[x as usize].right = Some(h);
        self.entries[x as usize].red = self.entries[h as usize].red;
        self.entries[h as usize].red = true;
        x
    }

    fn color_flip(&mut self, h: u32) {
        self.entries[h as usize].red = !self.entries[h as usize].red;
        if let Some(l) = self.entries[h as usize].left {
            self.entries[l as usize].red = !self.entries[l as usize].red;
        }
        if let Some(r) = self.entries[h as usize].right {
            self.entries[r as usize].red = !self.entries[r as usize].red;
        }
    }

    fn fixup(&mut self, mut h: u32) -> u32 {
        if self.is_red(self.entries[h as usize].right) && !self.is_red(self.entries[h as usize].left)
        {
            h = self.rotate_left(h);
        }
        let left = self.entries[h as usize].left;
        let left_left = left.and_then(|l| self.entries[l as usize].left);
        if self.is_red(left) && self.is_red(left_left) {
            h = self.rotate_right(h);
        }
        if self.is_red(self.entries[h as usize].left) && self.is_red(self.entries[h as usize].right)
        {
            self.color_flip(h);
        }
        h
    }
}
