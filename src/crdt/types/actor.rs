//! Actor identifier type for the distributed editing system.
//!
//! This module contains the definition of ActorId, which uniquely identifies
//! each participant (client or server) whose edits flow through the CRDT.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Number of bytes in an [`ActorId`].
pub const ACTOR_ID_SIZE: usize = 12;

/// A unique identifier for each actor (collaborator) in the distributed system.
///
/// Each participant in the collaborative editing system carries a unique
/// 12-byte actor ID. Actor IDs order lexicographically by their bytes, which
/// is the tie-breaking component of the [`Ticket`](super::Ticket) total order.
///
/// On the wire an actor ID travels as a 24-character lowercase hex string,
/// which is also how it keys the per-actor max-creation map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActorId([u8; ACTOR_ID_SIZE]);

/// Error returned when a hex string does not decode to an actor ID.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid actor id hex: {0:?}")]
pub struct ParseActorIdError(String);

impl ActorId {
    /// The zero actor, used by [`Ticket::INITIAL`](super::Ticket::INITIAL).
    pub const INITIAL: ActorId = ActorId([0; ACTOR_ID_SIZE]);

    /// The saturated actor, used by [`Ticket::MAX`](super::Ticket::MAX).
    pub const MAX: ActorId = ActorId([0xff; ACTOR_ID_SIZE]);

    /// Creates an actor ID from its raw bytes.
    pub const fn new(bytes: [u8; ACTOR_ID_SIZE]) -> Self {
        ActorId(bytes)
    }

    /// Returns the raw bytes of this actor ID.
    pub fn as_bytes(&self) -> &[u8; ACTOR_ID_SIZE] {
        &self.0
    }

    /// Encodes this actor ID as a 24-character lowercase hex string.
    pub fn to_hex(&self) -> String {
        let mut out = String::with_capacity(ACTOR_ID_SIZE * 2);
        for byte in self.0 {
            out.push_str(&format!("{byte:02x}"));
        }
        out
    }

    /// Decodes an actor ID from its hex string form.
    pub fn from_hex(hex: &str) -> Result<Self, ParseActorIdError> {
        if hex.len() != ACTOR_ID_SIZE * 2 {
            return Err(ParseActorIdError(hex.to_string()));
        }
        let mut bytes = [0u8; ACTOR_ID_SIZE];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|_| ParseActorIdError(hex.to_string()))?;
        }
        Ok(ActorId(bytes))
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for ActorId {
    type Err = ParseActorIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActorId::from_hex(s)
    }
}

impl Serialize for ActorId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ActorId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        ActorId::from_hex(&hex).map_err(D::Error::custom)
    }
}
