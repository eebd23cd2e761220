//! # RGA-Split CRDT - splittable-node replicated text
//!
//! A Conflict-free Replicated Data Type (CRDT) implementation of a text
//! sequence with splittable nodes, suitable for collaborative editing where
//! concurrent insertions and range deletions need to merge consistently
//! across distributed replicas.
//!
//! ## Features
//!
//! - **Conflict-free**: edits can be applied in any order and will converge
//! - **Causally filtered deletion**: a range delete carries the originator's
//!   per-actor creation frontier, so it never erases inserts it did not see
//! - **Splittable nodes**: deleting or editing inside a run fragments it
//!   without copying, and positions captured before a split stay valid
//! - **Indexed two ways**: a splay tree answers offset lookups, a
//!   left-leaning red-black tree answers ID floor queries
//!
//! ## Example
//!
//! ```rust
//! use crdt_rga_split::{ActorId, LamportClock, Text};
//!
//! let clock = LamportClock::new(ActorId::new([1; 12]));
//! let mut text = Text::new(clock.tick());
//!
//! let (from, to) = text.find_boundary(0, 0).unwrap();
//! text.edit(&from, &to, None, "Hello", clock.tick()).unwrap();
//! assert_eq!(text.marshal(), "Hello");
//! ```

pub mod crdt;

// Re-export the main public API from the CRDT module
pub use crdt::{MaxCreatedAtMap, NodeRef, Nodes, RgaTreeSplit, Text, TextError};
pub use crdt::{ACTOR_ID_SIZE, ActorId, LamportClock, TextNodeId, TextNodePos, Ticket};
