//! Snapshot save/load of whole aggregates, plus payload re-hydration.

use crate::document::Document;
use crate::error::{Result, StoreError};
use crate::persist::backend::StorageBackend;
use crate::state::StateEngine;
use crate::store::ObjectStore;
use crate::types::Entry;
use std::collections::HashMap;
use tracing::debug;

/// Key for the opaque clipboard snapshot.
pub const CLIPBOARD_KEY: &str = "clipboard";

/// Key for the serialized state engine.
pub const STATE_KEY: &str = "state";

/// Key for the serialized object store.
pub const OBJECT_STORE_KEY: &str = "objectStore";

/// Key for the next-id counter, persisted separately for fast boot.
pub const SEQ_ID_KEY: &str = "currentObjSeqId";

type DecodeFn = Box<dyn Fn(&[u8]) -> Result<Vec<u8>>>;

/// Pluggable `kind -> decode` registry for polymorphic payloads.
///
/// On load, each entry's payload runs through the decoder registered for its
/// kind, which may validate or normalize the bytes into the concrete domain
/// shape. Kinds with no registered decoder pass through untouched. The
/// engine itself never probes payloads; this registry is the only seam where
/// kinds are interpreted.
#[derive(Default)]
pub struct DecodeRegistry {
    decoders: HashMap<String, DecodeFn>,
}

impl DecodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a decoder for a kind, replacing any previous one.
    pub fn register<F>(&mut self, kind: impl Into<String>, decode: F)
    where
        F: Fn(&[u8]) -> Result<Vec<u8>> + 'static,
    {
        self.decoders.insert(kind.into(), Box::new(decode));
    }

    /// Re-hydrate one payload by kind.
    pub fn decode(&self, kind: &str, payload: &[u8]) -> Result<Vec<u8>> {
        match self.decoders.get(kind) {
            Some(decode) => decode(payload),
            None => Ok(payload.to_vec()),
        }
    }

    fn rehydrate(&self, entry: &mut Entry) -> Result<()> {
        entry.payload = self.decode(&entry.kind, &entry.payload)?;
        Ok(())
    }
}

impl std::fmt::Debug for DecodeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodeRegistry")
            .field("kinds", &self.decoders.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Save a document's aggregates: object store, state engine, and the id
/// counter under its own key.
pub fn save_document(backend: &mut dyn StorageBackend, document: &Document) -> Result<()> {
    let store_bytes = serde_json::to_vec(document.store())?;
    let state_bytes = serde_json::to_vec(document.engine())?;
    let seq_bytes = serde_json::to_vec(&document.store().next_seq_id())?;

    backend.save(OBJECT_STORE_KEY, &store_bytes)?;
    backend.save(STATE_KEY, &state_bytes)?;
    backend.save(SEQ_ID_KEY, &seq_bytes)?;
    debug!(
        store_bytes = store_bytes.len(),
        state_bytes = state_bytes.len(),
        "saved document snapshot"
    );
    Ok(())
}

/// Load a document from its persisted aggregates.
///
/// Returns `None` when no object store has been persisted. Every store row
/// and every transaction delta is re-hydrated through the registry. The
/// separately persisted counter, when present, overrides the one inside the
/// store aggregate.
pub fn load_document(
    backend: &dyn StorageBackend,
    registry: &DecodeRegistry,
) -> Result<Option<Document>> {
    let Some(store_bytes) = backend.load(OBJECT_STORE_KEY)? else {
        return Ok(None);
    };

    let mut store: ObjectStore = serde_json::from_slice(&store_bytes)
        .map_err(|e| StoreError::Deserialization(e.to_string()))?;
    for row in store.entries_mut() {
        registry.rehydrate(row)?;
    }

    let mut engine: StateEngine = match backend.load(STATE_KEY)? {
        Some(bytes) => serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Deserialization(e.to_string()))?,
        None => {
            let config = crate::document::DocumentConfig::default();
            StateEngine::new(config.max_history, config.origin)
        }
    };
    rehydrate_engine(&mut engine, registry)?;

    if let Some(bytes) = backend.load(SEQ_ID_KEY)? {
        let next_id: u64 = serde_json::from_slice(&bytes)
            .map_err(|e| StoreError::Deserialization(e.to_string()))?;
        store.set_next_seq_id(next_id);
    }

    debug!(
        entries = store.len(),
        transactions = engine.len(),
        "loaded document snapshot"
    );
    Ok(Some(Document::from_parts(store, engine)))
}

fn rehydrate_engine(engine: &mut StateEngine, registry: &DecodeRegistry) -> Result<()> {
    for tx in engine.transactions_mut() {
        for delta in &mut tx.deltas {
            registry.rehydrate(delta)?;
        }
    }
    Ok(())
}

/// Save an opaque clipboard snapshot.
pub fn save_clipboard(backend: &mut dyn StorageBackend, bytes: &[u8]) -> Result<()> {
    backend.save(CLIPBOARD_KEY, bytes)
}

/// Load the opaque clipboard snapshot, if any.
pub fn load_clipboard(backend: &dyn StorageBackend) -> Result<Option<Vec<u8>>> {
    backend.load(CLIPBOARD_KEY)
}

/// Remove every persisted aggregate.
pub fn clear(backend: &mut dyn StorageBackend) -> Result<()> {
    backend.remove(CLIPBOARD_KEY)?;
    backend.remove(STATE_KEY)?;
    backend.remove(OBJECT_STORE_KEY)?;
    backend.remove(SEQ_ID_KEY)?;
    Ok(())
}
