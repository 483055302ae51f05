//! # Undo Store
//!
//! A versioned object store with transactional undo/redo, built for diagram
//! documents: a canonical table of live entries plus a bounded, ordered log
//! of per-transaction deltas that replays forward or backward to reconstruct
//! any retained point in history.
//!
//! ## Core Concepts
//!
//! - **Entries**: versioned records — identity, opaque payload, operation tag
//! - **ObjectStore**: the live table of current entries, unique by id
//! - **Transactions**: one undoable edit unit, holding only the touched deltas
//! - **StateEngine**: the bounded history ring and the undo/redo cursor
//! - **Persistence**: whole-aggregate snapshots over an opaque key/value backend
//!
//! ## Example
//!
//! ```ignore
//! use undo_store::{Document, DocumentConfig};
//! use serde_json::json;
//!
//! let mut doc = Document::new(DocumentConfig::default());
//!
//! let id = doc.create("Rect", &json!({ "w": 10, "h": 5 }))?;
//! doc.preserve_state();
//!
//! doc.undo();          // store is empty again
//! doc.redo();          // the rectangle is back
//! ```

pub mod document;
pub mod error;
pub mod persist;
pub mod state;
pub mod store;
pub mod types;

// Re-exports
pub use document::{Document, DocumentConfig};
pub use error::{Result, StoreError};
pub use persist::{
    clear, load_clipboard, load_document, save_clipboard, save_document, DecodeRegistry,
    FileBackend, MemoryBackend, StorageBackend, CLIPBOARD_KEY, OBJECT_STORE_KEY, SEQ_ID_KEY,
    STATE_KEY,
};
pub use state::{StateEngine, Transaction};
pub use store::ObjectStore;
pub use types::{Entry, EntryId, EntryInput, Operation, TransactionId, UndoAvailability};
