//! The state engine: bounded transaction history, cursor, and replay.

use crate::error::{Result, StoreError};
use crate::state::transaction::Transaction;
use crate::store::ObjectStore;
use crate::types::{Entry, EntryId, Operation, TransactionId, UndoAvailability};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, trace};

/// Owner of the bounded, ordered transaction history and the undo/redo
/// cursor.
///
/// The engine never owns the object store. The two are kept consistent only
/// through [`restore_store_from_state`](StateEngine::restore_store_from_state),
/// which replays the transaction at the cursor against a store passed in by
/// the caller; every value crossing that boundary is a deep copy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateEngine {
    /// Upper bound on retained transactions; at least 1.
    max_history: usize,

    /// Tag stamped on transactions this engine opens.
    origin: String,

    /// Retained transactions, oldest first. A ring: eviction pops the front
    /// without renumbering anything.
    history: VecDeque<Transaction>,

    /// Offset of the current transaction within `history`; `None` means the
    /// cursor sits before all retained history (the empty baseline).
    cursor: Option<usize>,

    /// Next generation to assign. Generations are never reused.
    next_gen: u64,

    /// Transactions evicted from the front of the ring so far.
    dropped: u64,
}

impl StateEngine {
    pub fn new(max_history: usize, origin: impl Into<String>) -> Self {
        Self {
            max_history: max_history.max(1),
            origin: origin.into(),
            history: VecDeque::new(),
            cursor: None,
            next_gen: 0,
            dropped: 0,
        }
    }

    /// Record a delta into the current transaction, opening one if needed.
    ///
    /// With an open transaction at the cursor, the delta is merged per the
    /// rules on [`Transaction::merge`]. Otherwise any redo branch past the
    /// cursor is discarded, and a fresh transaction containing exactly this
    /// delta is appended and becomes current. `seq_mark` is the object id
    /// counter value before the mutation that produced `entry`; a newly
    /// opened transaction records it for exception rollback.
    pub fn record(&mut self, entry: Entry, seq_mark: u64) {
        if let Some(c) = self.cursor {
            if self.history[c].is_open {
                self.history[c].merge(entry);
                return;
            }
        }

        // A fresh edit after undos destroys the redo branch.
        let keep = self.cursor.map_or(0, |c| c + 1);
        if self.history.len() > keep {
            trace!(discarded = self.history.len() - keep, "truncating redo branch");
            self.history.truncate(keep);
        }

        let id = TransactionId(self.next_gen);
        self.next_gen += 1;
        let mut tx = Transaction::new(id, self.origin.clone(), seq_mark);
        tx.deltas.push(entry);
        debug!(transaction = %id, "opening transaction");
        self.history.push_back(tx);
        self.cursor = Some(self.history.len() - 1);

        if self.history.len() > self.max_history {
            let evicted = self.history.pop_front();
            self.dropped += 1;
            self.cursor = Some(self.history.len() - 1);
            if let Some(evicted) = evicted {
                debug!(transaction = %evicted.id, dropped = self.dropped, "evicted oldest transaction");
            }
        }
    }

    /// Close the current transaction.
    ///
    /// Every delta still tagged `Create` is replaced with a deep copy of the
    /// current store row for that id (retagged `Create`), so newly created
    /// rows capture their final post-edit payload rather than whatever
    /// intermediate payload the merge steps kept.
    pub fn preserve_state(&mut self, store: &ObjectStore) {
        let Some(c) = self.cursor else { return };
        let tx = &mut self.history[c];
        for delta in &mut tx.deltas {
            if delta.op == Operation::Create {
                if let Some(row) = store.get(delta.id) {
                    let mut copy = row.clone();
                    copy.op = Operation::Create;
                    *delta = copy;
                }
            }
        }
        tx.is_open = false;
        debug!(transaction = %tx.id, deltas = tx.deltas.len(), "closed transaction");
    }

    /// Whether undo and redo are currently available.
    ///
    /// Undo is available whenever the cursor rests on a transaction; undoing
    /// the oldest one moves the cursor before all history (an empty document
    /// starts there). Redo is available whenever transactions remain past
    /// the cursor.
    pub fn undo_availability(&self) -> UndoAvailability {
        let next = self.cursor.map_or(0, |c| c + 1);
        UndoAvailability {
            can_undo: self.cursor.is_some(),
            can_redo: next < self.history.len(),
        }
    }

    /// Undo: apply the inverse of the transaction at the cursor, then step
    /// the cursor back. Returns whether anything happened.
    pub fn undo(&mut self, store: &mut ObjectStore) -> bool {
        if !self.undo_availability().can_undo {
            return false;
        }
        self.restore_store_from_state(store);
        self.cursor = match self.cursor {
            Some(0) | None => None,
            Some(c) => Some(c - 1),
        };
        debug!(cursor = ?self.cursor, "undo");
        true
    }

    /// Redo: step the cursor forward, then apply the transaction it lands
    /// on. Returns whether anything happened.
    pub fn redo(&mut self, store: &mut ObjectStore) -> bool {
        if !self.undo_availability().can_redo {
            return false;
        }
        self.cursor = Some(self.cursor.map_or(0, |c| c + 1));
        self.restore_store_from_state(store);
        debug!(cursor = ?self.cursor, "redo");
        true
    }

    /// Replay the transaction at the cursor against the store.
    ///
    /// Each delta toggles the store between the states on either side of the
    /// transaction: a `Create` removes the row if present and re-inserts it
    /// otherwise; a `Delete` does the same, retagging the re-inserted copy as
    /// `Create`; an `Update` swaps payloads — the store receives a copy of
    /// the delta, and the delta slot receives a copy of the displaced store
    /// row (retagged `Update` when that row was a `Create`, so a later undo
    /// does not mistake a pre-existing row for one this transaction made).
    ///
    /// Not designed to be called outside the undo/redo protocol: it is an
    /// involution only while the store is not mutated in between.
    pub fn restore_store_from_state(&mut self, store: &mut ObjectStore) {
        let Some(c) = self.cursor else { return };
        let tx = &mut self.history[c];

        for i in 0..tx.deltas.len() {
            let delta = tx.deltas[i].clone();
            match delta.op {
                Operation::Create => {
                    if store.contains(delta.id) {
                        store.remove(delta.id);
                    } else {
                        store.insert(delta);
                    }
                }
                Operation::Delete => {
                    if store.contains(delta.id) {
                        store.remove(delta.id);
                    } else {
                        let mut copy = delta;
                        copy.op = Operation::Create;
                        store.insert(copy);
                    }
                }
                Operation::Update => {
                    if let Some(row) = store.get(delta.id) {
                        let mut displaced = row.clone();
                        if displaced.op == Operation::Create {
                            displaced.op = Operation::Update;
                        }
                        store.insert(delta);
                        tx.deltas[i] = displaced;
                    } else {
                        store.insert(delta);
                    }
                }
            }
        }
    }

    /// Roll back a transaction that failed partway through.
    ///
    /// If the transaction at the cursor is open, it is closed, its effects
    /// are replayed out of the store, the cursor steps back, and the failed
    /// transaction (plus any redo branch) is dropped from history — as if it
    /// never happened. Returns the object id counter captured when the
    /// transaction opened, for the caller to restore.
    pub fn exception_cleanup(&mut self, store: &mut ObjectStore) -> Option<u64> {
        let c = self.cursor?;
        if !self.history[c].is_open {
            return None;
        }
        self.history[c].is_open = false;
        let seq = self.history[c].seq_id_at_open;
        debug!(transaction = %self.history[c].id, "exception cleanup");
        self.restore_store_from_state(store);
        self.cursor = if c == 0 { None } else { Some(c - 1) };
        let keep = self.cursor.map_or(0, |k| k + 1);
        self.history.truncate(keep);
        Some(seq)
    }

    /// Collapse history to the single transaction at `index` (used when a
    /// document loads: the survivor becomes the baseline).
    pub fn reset_to_state(&mut self, index: usize) -> Result<()> {
        if index >= self.history.len() {
            return Err(StoreError::InvalidArgument(format!(
                "state index {} out of range (history length {})",
                index,
                self.history.len()
            )));
        }
        let survivor = self.history[index].clone();
        self.history.clear();
        self.history.push_back(survivor);
        self.cursor = Some(0);
        self.dropped = 0;
        Ok(())
    }

    /// Discard all history. Generations keep counting and are never reused.
    pub fn reset(&mut self) {
        self.history.clear();
        self.cursor = None;
        self.dropped = 0;
    }

    /// Discard the redo branch past the cursor.
    pub fn clear_redo(&mut self) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        self.history.truncate(keep);
    }

    /// Cursor offset into retained history, `None` before all history.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Transactions evicted from the ring so far.
    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }

    /// Retained transactions, oldest first.
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
        self.history.iter()
    }

    /// Mutable access to retained transactions, for payload re-hydration on
    /// load.
    pub(crate) fn transactions_mut(&mut self) -> impl Iterator<Item = &mut Transaction> {
        self.history.iter_mut()
    }

    /// Transaction at a history offset.
    pub fn transaction(&self, index: usize) -> Option<&Transaction> {
        self.history.get(index)
    }

    /// Transaction at the cursor.
    pub fn current_transaction(&self) -> Option<&Transaction> {
        self.cursor.and_then(|c| self.history.get(c))
    }

    /// Look up the delta recorded for an id in the transaction at a history
    /// offset.
    pub fn delta_from_state(&self, index: usize, id: EntryId) -> Option<&Entry> {
        self.history.get(index)?.delta(id)
    }
}
