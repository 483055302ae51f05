//! The canonical table of live entries.

use crate::error::{Result, StoreError};
use crate::types::{Entry, EntryId, EntryInput, Operation};
use serde::{Deserialize, Serialize};

/// The live, canonical collection of entries — one row per id, ordered by
/// insertion.
///
/// The store itself never talks to the state engine; recording a mutation
/// into the open transaction is coordinated by [`Document`](crate::Document).
/// Lookups are linear: object counts are diagram scale, and behavior rather
/// than data structure is the contract here.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ObjectStore {
    /// Next id to assign. The first entry ever saved gets id 0.
    next_id: u64,

    /// Live rows in insertion order, unique by id.
    entries: Vec<Entry>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save an entry, returning a copy of the stored row.
    ///
    /// An input addressing a live id overwrites that row's `kind`, `payload`,
    /// and `op` in place and marks it dirty; the same row keeps representing
    /// the id. An input addressing an unknown id is inserted under that id
    /// (the replay path depends on ids surviving re-insertion). An input with
    /// no id is assigned the next counter value and appended.
    pub fn save(&mut self, input: EntryInput) -> Result<Entry> {
        if input.kind.is_empty() {
            return Err(StoreError::InvalidArgument("entry kind is unset".into()));
        }

        match input.id {
            Some(id) => match self.entries.iter().position(|e| e.id == id) {
                Some(pos) => {
                    let row = &mut self.entries[pos];
                    row.kind = input.kind;
                    row.payload = input.payload;
                    row.op = input.op;
                    row.dirty = true;
                    Ok(row.clone())
                }
                None => {
                    // Keep the counter ahead of explicitly supplied ids so
                    // they are never handed out again.
                    self.next_id = self.next_id.max(id.0 + 1);
                    let entry = Entry {
                        id,
                        kind: input.kind,
                        payload: input.payload,
                        op: input.op,
                        dirty: true,
                    };
                    self.entries.push(entry.clone());
                    Ok(entry)
                }
            },
            None => {
                let id = EntryId(self.next_id);
                self.next_id += 1;
                let entry = Entry {
                    id,
                    kind: input.kind,
                    payload: input.payload,
                    op: input.op,
                    dirty: false,
                };
                self.entries.push(entry.clone());
                Ok(entry)
            }
        }
    }

    /// Get a live row by id.
    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Whether a live row exists for this id.
    pub fn contains(&self, id: EntryId) -> bool {
        self.get(id).is_some()
    }

    /// All live rows in insertion order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Live rows matching a kind.
    pub fn entries_of_kind(&self, kind: &str) -> Vec<&Entry> {
        self.entries.iter().filter(|e| e.kind == kind).collect()
    }

    /// Delete a live row, returning a `Delete`-tagged copy of it.
    ///
    /// Deleting a missing id is a silent no-op and returns `None`.
    pub fn delete(&mut self, id: EntryId) -> Option<Entry> {
        let pos = self.entries.iter().position(|e| e.id == id)?;
        let mut copy = self.entries.remove(pos);
        copy.op = Operation::Delete;
        Some(copy)
    }

    /// Insert or overwrite a row under its own id, preserving insertion
    /// position for a live row. Replay-only: never advances the counter.
    pub(crate) fn insert(&mut self, entry: Entry) {
        match self.entries.iter().position(|e| e.id == entry.id) {
            Some(pos) => self.entries[pos] = entry,
            None => self.entries.push(entry),
        }
    }

    /// Mutable access to every row, for payload re-hydration on load.
    pub(crate) fn entries_mut(&mut self) -> impl Iterator<Item = &mut Entry> {
        self.entries.iter_mut()
    }

    /// Remove a row without tagging a delete. Replay-only.
    pub(crate) fn remove(&mut self, id: EntryId) -> Option<Entry> {
        let pos = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(pos))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current value of the id counter.
    pub fn next_seq_id(&self) -> u64 {
        self.next_id
    }

    /// Reset the id counter (exception rollback and persistence load).
    pub(crate) fn set_next_seq_id(&mut self, next_id: u64) {
        self.next_id = next_id;
    }
}
