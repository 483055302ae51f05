//! The document context: an object store and a state engine wired together.

use crate::error::Result;
use crate::state::StateEngine;
use crate::store::ObjectStore;
use crate::types::{Entry, EntryId, EntryInput, Operation, UndoAvailability};
use serde::Serialize;

/// Document configuration.
#[derive(Clone, Debug)]
pub struct DocumentConfig {
    /// Upper bound on retained undo transactions.
    pub max_history: usize,

    /// Tag stamped on transactions this document opens.
    pub origin: String,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            max_history: 25,
            origin: "editor".into(),
        }
    }
}

/// One editing session's state: the live object table plus its undo history.
///
/// The two components are siblings; every mutation goes through the document
/// so the engine sees a deep copy of each touched row. There is no global
/// instance — callers create one per document session and replace it
/// wholesale on reload.
#[derive(Clone, Debug)]
pub struct Document {
    store: ObjectStore,
    engine: StateEngine,
}

impl Document {
    pub fn new(config: DocumentConfig) -> Self {
        Self {
            store: ObjectStore::new(),
            engine: StateEngine::new(config.max_history, config.origin),
        }
    }

    /// Reassemble a document from persisted parts.
    pub fn from_parts(store: ObjectStore, engine: StateEngine) -> Self {
        Self { store, engine }
    }

    /// Save an entry and record the resulting delta into the current
    /// transaction.
    pub fn save(&mut self, input: EntryInput) -> Result<EntryId> {
        let mark = self.store.next_seq_id();
        let entry = self.store.save(input)?;
        let id = entry.id;
        self.engine.record(entry, mark);
        Ok(id)
    }

    /// Save an entry without touching the undo history.
    pub fn save_untracked(&mut self, input: EntryInput) -> Result<EntryId> {
        Ok(self.store.save(input)?.id)
    }

    /// Create and register a new entry of a kind in one step.
    ///
    /// Construction is a pure value operation; registration into the store
    /// and the open transaction happens here, explicitly.
    pub fn create(&mut self, kind: impl Into<String>, payload: &impl Serialize) -> Result<EntryId> {
        let input = EntryInput::json(kind, payload)?;
        self.save(input)
    }

    /// Record the current row for an id as this transaction's update
    /// baseline.
    ///
    /// Call before overwriting a row that predates the transaction: the
    /// merge rules keep this first Update delta, and replay swaps against it
    /// so undo lands on the pre-edit payload. No-op for missing ids.
    pub fn preserve(&mut self, id: EntryId) {
        let mark = self.store.next_seq_id();
        if let Some(row) = self.store.get(id) {
            let mut baseline = row.clone();
            baseline.op = Operation::Update;
            self.engine.record(baseline, mark);
        }
    }

    /// Delete an entry, recording the deletion. Missing ids are a silent
    /// no-op.
    pub fn delete(&mut self, id: EntryId) {
        let mark = self.store.next_seq_id();
        if let Some(copy) = self.store.delete(id) {
            self.engine.record(copy, mark);
        }
    }

    /// Delete an entry without touching the undo history.
    pub fn delete_untracked(&mut self, id: EntryId) {
        self.store.delete(id);
    }

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.store.get(id)
    }

    pub fn entries(&self) -> &[Entry] {
        self.store.entries()
    }

    pub fn entries_of_kind(&self, kind: &str) -> Vec<&Entry> {
        self.store.entries_of_kind(kind)
    }

    /// Close the current transaction, making it an undoable unit.
    pub fn preserve_state(&mut self) {
        self.engine.preserve_state(&self.store);
    }

    pub fn undo_availability(&self) -> UndoAvailability {
        self.engine.undo_availability()
    }

    /// Undo the transaction at the cursor. Returns whether anything
    /// happened.
    pub fn undo(&mut self) -> bool {
        self.engine.undo(&mut self.store)
    }

    /// Redo the next transaction past the cursor. Returns whether anything
    /// happened.
    pub fn redo(&mut self) -> bool {
        self.engine.redo(&mut self.store)
    }

    /// Discard the redo branch past the cursor.
    pub fn clear_redo(&mut self) {
        self.engine.clear_redo();
    }

    /// Collapse history to the single transaction at `index`.
    pub fn reset_history_to(&mut self, index: usize) -> Result<()> {
        self.engine.reset_to_state(index)
    }

    /// Roll back a transaction that failed partway through.
    ///
    /// Restores the store, the cursor, and the id counter to their
    /// pre-transaction values and drops the failed transaction from history.
    /// Callers that catch an error mid-edit must invoke this before
    /// continuing.
    pub fn exception_cleanup(&mut self) {
        if let Some(seq) = self.engine.exception_cleanup(&mut self.store) {
            self.store.set_next_seq_id(seq);
        }
    }

    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    pub fn engine(&self) -> &StateEngine {
        &self.engine
    }
}
