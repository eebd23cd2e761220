//! Thread-safe Lamport clock implementation for generating tickets.
//!
//! This module contains the LamportClock struct which provides thread-safe
//! generation of edit tickets for maintaining causal ordering in the CRDT.
//! The CRDT engine itself never mints tickets; callers own a clock per actor
//! and pass the minted tickets into edit operations.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering as AtomicOrdering};

use crate::crdt::types::actor::ActorId;
use crate::crdt::types::ticket::Ticket;

/// A thread-safe clock for generating Lamport tickets for one actor.
pub struct LamportClock {
    lamport: AtomicU64,
    delimiter: AtomicU32,
    actor: ActorId,
}

impl LamportClock {
    /// Creates a new Lamport clock for the given actor.
    pub fn new(actor: ActorId) -> Self {
        LamportClock {
            lamport: AtomicU64::new(0),
            delimiter: AtomicU32::new(0),
            actor,
        }
    }

    /// Generates the next ticket for this actor.
    ///
    /// Successive ticks produce strictly increasing tickets: the lamport
    /// value always advances, and the delimiter separates tickets that would
    /// otherwise collide.
    pub fn tick(&self) -> Ticket {
        let lamport = self.lamport.fetch_add(1, AtomicOrdering::SeqCst) + 1;
        let delimiter = self.delimiter.fetch_add(1, AtomicOrdering::SeqCst);

        Ticket::new(lamport, delimiter, self.actor)
    }

    /// Updates the clock based on a received ticket (for causal consistency).
    pub fn update(&self, received: &Ticket) {
        let current = self.lamport.load(AtomicOrdering::SeqCst);
        let new_lamport = current.max(received.lamport);

        // Use compare_and_swap in a loop to ensure we don't go backwards
        let mut current_val = current;
        while current_val < new_lamport {
            match self.lamport.compare_exchange_weak(
                current_val,
                new_lamport,
                AtomicOrdering::SeqCst,
                AtomicOrdering::SeqCst,
            ) {
                Ok(_) => break,
                Err(actual) => current_val = actual,
            }
        }
    }

    /// Gets the current lamport value (for debugging)
    pub fn current_lamport(&self) -> u64 {
        self.lamport.load(AtomicOrdering::SeqCst)
    }

    /// Gets the actor ID
    pub fn actor(&self) -> ActorId {
        self.actor
    }
}
