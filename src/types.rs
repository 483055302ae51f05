//! Core types for the undo store.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an entry in the object store.
///
/// Ids are assigned once, by a monotonically increasing counter, and are
/// never reused while any open or historical transaction references them.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(pub u64);

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryId({})", self.0)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable generation number for a transaction.
///
/// Generations increase monotonically and are never reused, even after the
/// transaction they name is evicted from the bounded history.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionId(pub u64);

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({})", self.0)
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Net effect an entry delta carries within a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl Default for Operation {
    fn default() -> Self {
        Operation::Create
    }
}

/// A single versioned record: identity, opaque payload, and operation tag.
///
/// Every copy that crosses the store/transaction boundary is a deep copy
/// (`Clone` here clones the payload bytes), so later mutation of the live
/// row never rewrites recorded history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Unique identifier (assigned by the store).
    pub id: EntryId,

    /// Application-defined kind discriminator (e.g. "Rect", "Connector").
    pub kind: String,

    /// Application-defined payload, JSON-encoded.
    pub payload: Vec<u8>,

    /// Operation that produced the net effect for this id.
    pub op: Operation,

    /// Set when a live row has been overwritten since it was first saved.
    pub dirty: bool,
}

impl Entry {
    /// Decode the payload as JSON into a concrete type.
    pub fn payload_json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }
}

/// Input for saving an entry (before an id is assigned).
///
/// `id: None` stands for the source's `-1` "not yet assigned" sentinel.
#[derive(Clone, Debug)]
pub struct EntryInput {
    pub id: Option<EntryId>,
    pub kind: String,
    pub payload: Vec<u8>,
    pub op: Operation,
}

impl EntryInput {
    /// Create an input with a JSON payload.
    pub fn json(
        kind: impl Into<String>,
        payload: &impl Serialize,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: None,
            kind: kind.into(),
            payload: serde_json::to_vec(payload)?,
            op: Operation::Create,
        })
    }

    /// Create an input with raw payload bytes.
    pub fn raw(kind: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            id: None,
            kind: kind.into(),
            payload,
            op: Operation::Create,
        }
    }

    /// Address an existing row.
    pub fn with_id(mut self, id: EntryId) -> Self {
        self.id = Some(id);
        self
    }

    /// Tag the operation this input represents.
    pub fn with_op(mut self, op: Operation) -> Self {
        self.op = op;
        self
    }
}

/// Whether undo and redo are currently available.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UndoAvailability {
    pub can_undo: bool,
    pub can_redo: bool,
}
