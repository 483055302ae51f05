//! Transactional undo/redo history.
//!
//! A transaction is a diff, not a snapshot: it holds one delta per touched
//! id, merged per the rules in [`transaction`]. The engine owns a bounded
//! ring of closed transactions and replays the one at the cursor to move the
//! object store through history.

mod engine;
mod transaction;

pub use engine::StateEngine;
pub use transaction::Transaction;
