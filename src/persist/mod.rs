//! Persistence: opaque key/value snapshots of the store and engine.

mod backend;
mod snapshot;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use snapshot::{
    clear, load_clipboard, load_document, save_clipboard, save_document, DecodeRegistry,
    CLIPBOARD_KEY, OBJECT_STORE_KEY, SEQ_ID_KEY, STATE_KEY,
};
