//! A single undoable edit unit and its delta merge rules.

use crate::types::{Entry, EntryId, Operation, TransactionId};
use serde::{Deserialize, Serialize};

/// An ordered list of per-id deltas recorded since the transaction opened.
///
/// Deltas are unique by id: a second mutation of the same id within the open
/// transaction is merged into the existing delta rather than appended.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    /// Stable generation number, never reused.
    pub id: TransactionId,

    /// Tag identifying what opened this transaction.
    pub created_by: String,

    /// Open transactions absorb further deltas; closed ones are history.
    pub is_open: bool,

    /// Object id counter captured when the transaction opened, restored by
    /// exception cleanup.
    pub seq_id_at_open: u64,

    /// Deltas in first-touch order.
    pub deltas: Vec<Entry>,
}

impl Transaction {
    pub fn new(id: TransactionId, created_by: impl Into<String>, seq_id_at_open: u64) -> Self {
        Self {
            id,
            created_by: created_by.into(),
            is_open: true,
            seq_id_at_open,
            deltas: Vec::new(),
        }
    }

    /// Find the delta recorded for an id, if any.
    pub fn delta(&self, id: EntryId) -> Option<&Entry> {
        self.deltas.iter().find(|d| d.id == id)
    }

    fn position(&self, id: EntryId) -> Option<usize> {
        self.deltas.iter().position(|d| d.id == id)
    }

    /// Merge an incoming delta with whatever this transaction already holds
    /// for the same id. The outcome per (existing, incoming) operation pair:
    ///
    /// | E\N    | Create              | Update  | Delete              |
    /// |--------|---------------------|---------|---------------------|
    /// | Create | replace             | no-op   | drop the delta      |
    /// | Update | replace as Update   | no-op   | replace as Update   |
    /// | Delete | replace as Update   | replace as Update | replace   |
    ///
    /// Update/Update deliberately keeps the first delta seen: that delta is
    /// the pre-transaction baseline the replay algorithm swaps against. An
    /// id already present before the transaction can never net out as a
    /// Create, hence the Update retags. Create followed by Delete nets to
    /// nothing, as if the id never existed in this transaction.
    pub fn merge(&mut self, incoming: Entry) {
        let Some(pos) = self.position(incoming.id) else {
            self.deltas.push(incoming);
            return;
        };

        use Operation::*;
        match (self.deltas[pos].op, incoming.op) {
            (Create, Create) => {
                self.deltas[pos] = incoming;
            }
            (Create, Update) => {
                // The Create delta keeps standing in for the row; its final
                // payload is synced when the transaction closes.
            }
            (Create, Delete) => {
                self.deltas.remove(pos);
            }
            (Update, Create) | (Update, Delete) | (Delete, Create) | (Delete, Update) => {
                let mut entry = incoming;
                entry.op = Update;
                self.deltas[pos] = entry;
            }
            (Update, Update) => {
                // Keep the first Update: it carries the pre-transaction
                // baseline needed for replay.
            }
            (Delete, Delete) => {
                self.deltas[pos] = incoming;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EntryId;

    fn entry(id: u64, op: Operation, payload: &[u8]) -> Entry {
        Entry {
            id: EntryId(id),
            kind: "Rect".into(),
            payload: payload.to_vec(),
            op,
            dirty: false,
        }
    }

    fn tx() -> Transaction {
        Transaction::new(TransactionId(0), "test", 0)
    }

    #[test]
    fn test_first_delta_is_appended() {
        let mut t = tx();
        t.merge(entry(0, Operation::Create, b"a"));
        t.merge(entry(1, Operation::Update, b"b"));
        assert_eq!(t.deltas.len(), 2);
        assert_eq!(t.deltas[0].id, EntryId(0));
    }

    #[test]
    fn test_create_then_create_replaces() {
        let mut t = tx();
        t.merge(entry(0, Operation::Create, b"a"));
        t.merge(entry(0, Operation::Create, b"b"));
        assert_eq!(t.deltas.len(), 1);
        assert_eq!(t.deltas[0].payload, b"b");
        assert_eq!(t.deltas[0].op, Operation::Create);
    }

    #[test]
    fn test_create_then_update_keeps_create() {
        let mut t = tx();
        t.merge(entry(0, Operation::Create, b"a"));
        t.merge(entry(0, Operation::Update, b"b"));
        assert_eq!(t.deltas.len(), 1);
        assert_eq!(t.deltas[0].op, Operation::Create);
        assert_eq!(t.deltas[0].payload, b"a");
    }

    #[test]
    fn test_create_then_delete_collapses() {
        let mut t = tx();
        t.merge(entry(0, Operation::Create, b"a"));
        t.merge(entry(0, Operation::Delete, b"a"));
        assert!(t.deltas.is_empty());
    }

    #[test]
    fn test_update_then_update_keeps_first() {
        let mut t = tx();
        t.merge(entry(0, Operation::Update, b"baseline"));
        t.merge(entry(0, Operation::Update, b"later"));
        assert_eq!(t.deltas[0].payload, b"baseline");
    }

    #[test]
    fn test_update_then_delete_retags_update() {
        let mut t = tx();
        t.merge(entry(0, Operation::Update, b"baseline"));
        t.merge(entry(0, Operation::Delete, b"tombstone"));
        assert_eq!(t.deltas[0].op, Operation::Update);
        assert_eq!(t.deltas[0].payload, b"tombstone");
    }

    #[test]
    fn test_update_then_create_retags_update() {
        let mut t = tx();
        t.merge(entry(0, Operation::Update, b"baseline"));
        t.merge(entry(0, Operation::Create, b"recreated"));
        assert_eq!(t.deltas[0].op, Operation::Update);
        assert_eq!(t.deltas[0].payload, b"recreated");
    }

    #[test]
    fn test_delete_then_create_retags_update() {
        let mut t = tx();
        t.merge(entry(0, Operation::Delete, b"gone"));
        t.merge(entry(0, Operation::Create, b"back"));
        assert_eq!(t.deltas[0].op, Operation::Update);
        assert_eq!(t.deltas[0].payload, b"back");
    }

    #[test]
    fn test_delete_then_delete_replaces() {
        let mut t = tx();
        t.merge(entry(0, Operation::Delete, b"a"));
        t.merge(entry(0, Operation::Delete, b"b"));
        assert_eq!(t.deltas[0].op, Operation::Delete);
        assert_eq!(t.deltas[0].payload, b"b");
    }
}
