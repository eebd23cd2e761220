//! Lamport ticket implementation for causal ordering in distributed systems.
//!
//! This module contains the Ticket struct which provides a total ordering
//! of events across actors in the CRDT system.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::crdt::types::actor::ActorId;

/// A Lamport ticket, consisting of a logical clock value, a delimiter, and
/// the originating actor's ID.
///
/// This allows for a total ordering of events across actors, which is
/// essential for ensuring convergence in the CRDT. The delimiter separates
/// multiple operations minted at the same lamport value by one actor, so no
/// two operations ever share a ticket.
///
/// # Ordering
///
/// Tickets are ordered first by lamport value, then by actor (lexicographic
/// bytes), then by delimiter. This gives a deterministic global ordering of
/// all operations across all actors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticket {
    /// The logical clock value when this ticket was created
    pub lamport: u64,
    /// Distinguishes operations minted at the same lamport value
    pub delimiter: u32,
    /// The ID of the actor that created this ticket
    pub actor: ActorId,
}

impl Ticket {
    /// The smallest ticket: zero lamport, zero delimiter, zero actor.
    pub const INITIAL: Ticket = Ticket {
        lamport: 0,
        delimiter: 0,
        actor: ActorId::INITIAL,
    };

    /// The largest ticket: every field saturated.
    pub const MAX: Ticket = Ticket {
        lamport: u64::MAX,
        delimiter: u32::MAX,
        actor: ActorId::MAX,
    };

    /// Creates a new ticket.
    pub const fn new(lamport: u64, delimiter: u32, actor: ActorId) -> Self {
        Ticket {
            lamport,
            delimiter,
            actor,
        }
    }

    /// Returns true if this ticket is strictly greater than `other`.
    pub fn after(&self, other: &Ticket) -> bool {
        self > other
    }
}

impl PartialOrd for Ticket {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ticket {
    fn cmp(&self, other: &Self) -> Ordering {
        // First compare by lamport (logical time)
        match self.lamport.cmp(&other.lamport) {
            Ordering::Equal => {
                // If lamport values are equal, compare by actor bytes
                match self.actor.cmp(&other.actor) {
                    Ordering::Equal => {
                        // Same actor and lamport, the delimiter decides
                        self.delimiter.cmp(&other.delimiter)
                    }
                    other => other,
                }
            }
            other => other,
        }
    }
}

impl fmt::Display for Ticket {
    /// Renders as `lamport:delimiter:xx` where `xx` is the last byte of the
    /// actor in hex, the short form used by annotated strings.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let last = self.actor.as_bytes()[super::actor::ACTOR_ID_SIZE - 1];
        write!(f, "{}:{}:{:02x}", self.lamport, self.delimiter, last)
    }
}
