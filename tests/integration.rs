//! Integration tests for the undo store.

use serde_json::json;
use std::collections::BTreeMap;
use undo_store::{Document, DocumentConfig, EntryId, EntryInput, Operation};

fn doc_with(max_history: usize) -> Document {
    Document::new(DocumentConfig {
        max_history,
        origin: "test".into(),
    })
}

/// Store contents by id and payload, the equality the undo contract promises.
fn contents(doc: &Document) -> BTreeMap<u64, Vec<u8>> {
    doc.entries()
        .iter()
        .map(|e| (e.id.0, e.payload.clone()))
        .collect()
}

// --- The concrete scenario from the design notes ---

#[test]
fn test_create_then_overwrite_then_undo_redo() {
    let mut doc = doc_with(10);

    let id = doc
        .save(EntryInput::json("Rect", &json!({"w": 10, "h": 5})).unwrap())
        .unwrap();
    assert_eq!(id, EntryId(0));
    assert_eq!(doc.engine().len(), 1);
    assert_eq!(doc.engine().cursor(), Some(0));

    // Overwriting the same row stays in the same transaction and keeps the
    // delta tagged Create.
    let same = doc
        .save(EntryInput::json("Rect", &json!({"w": 20, "h": 5})).unwrap().with_id(id))
        .unwrap();
    assert_eq!(same, id);
    doc.preserve_state();

    let delta = doc.engine().transaction(0).unwrap().delta(id).unwrap();
    assert_eq!(delta.op, Operation::Create);
    let value: serde_json::Value = delta.payload_json().unwrap();
    assert_eq!(value["w"], 20);

    assert!(doc.undo());
    assert!(doc.entries().is_empty());
    assert_eq!(doc.engine().cursor(), None);

    assert!(doc.redo());
    assert_eq!(doc.engine().cursor(), Some(0));
    let value: serde_json::Value = doc.get(id).unwrap().payload_json().unwrap();
    assert_eq!(value["w"], 20);
    assert_eq!(value["h"], 5);
}

// --- Round-trip ---

#[test]
fn test_round_trip_save_delete_sequence() {
    let mut doc = doc_with(10);

    let a = doc.create("Rect", &json!({"w": 1})).unwrap();
    let b = doc.create("Line", &json!({"len": 9})).unwrap();
    doc.create("Rect", &json!({"w": 3})).unwrap();
    doc.delete(b);
    doc.save(
        EntryInput::json("Rect", &json!({"w": 4}))
            .unwrap()
            .with_id(a)
            .with_op(Operation::Update),
    )
    .unwrap();
    doc.preserve_state();

    let after = contents(&doc);
    assert!(doc.undo());
    assert!(doc.entries().is_empty());
    assert!(doc.redo());
    assert_eq!(contents(&doc), after);

    // And again: the replay is an involution.
    assert!(doc.undo());
    assert!(doc.redo());
    assert_eq!(contents(&doc), after);
}

// --- Idempotent delete ---

#[test]
fn test_delete_of_missing_id_changes_nothing() {
    let mut doc = doc_with(10);
    doc.create("Rect", &json!({"w": 1})).unwrap();
    let deltas_before = doc.engine().current_transaction().unwrap().deltas.len();

    doc.delete(EntryId(77));
    assert_eq!(doc.entries().len(), 1);
    assert_eq!(
        doc.engine().current_transaction().unwrap().deltas.len(),
        deltas_before
    );
}

// --- Create + Delete collapse ---

#[test]
fn test_create_then_delete_collapses_in_transaction() {
    let mut doc = doc_with(10);
    let keep = doc.create("Rect", &json!({"w": 1})).unwrap();
    let gone = doc.create("Rect", &json!({"w": 2})).unwrap();
    doc.delete(gone);
    doc.preserve_state();

    let tx = doc.engine().transaction(0).unwrap();
    assert!(tx.delta(gone).is_none());
    assert!(tx.delta(keep).is_some());

    // Undoing the transaction is a no-op for the collapsed id.
    doc.undo();
    assert!(doc.get(gone).is_none());
    doc.redo();
    assert!(doc.get(gone).is_none());
    assert!(doc.get(keep).is_some());
}

// --- Bounded history ---

#[test]
fn test_bounded_history_evicts_oldest() {
    let n = 6;
    let mut doc = doc_with(n);
    for w in 0..(n + 5) {
        doc.create("Rect", &json!({ "w": w })).unwrap();
        doc.preserve_state();
    }

    assert_eq!(doc.engine().len(), n);
    assert_eq!(doc.engine().dropped_count(), 5);
    // Generations are stable across eviction: the oldest survivor carries
    // the generation equal to the number of drops, and nothing is renumbered.
    let ids: Vec<u64> = doc.engine().transactions().map(|t| t.id.0).collect();
    assert_eq!(ids, (5..(n as u64 + 5)).collect::<Vec<_>>());
}

// --- Redo truncation ---

#[test]
fn test_new_edit_after_undo_destroys_redo_branch() {
    let mut doc = doc_with(10);
    for w in 0..3 {
        doc.create("Rect", &json!({ "w": w })).unwrap();
        doc.preserve_state();
    }

    doc.undo();
    doc.undo();
    assert!(doc.undo_availability().can_redo);

    doc.create("Rect", &json!({"w": 99})).unwrap();
    doc.preserve_state();
    assert!(!doc.undo_availability().can_redo);
    assert_eq!(doc.engine().len(), 2);
}

// --- Editor workflows ---

#[test]
fn test_multi_step_edit_session() {
    let mut doc = doc_with(10);

    // Draw a rectangle and a connector.
    let rect = doc.create("Rect", &json!({"w": 10, "h": 5})).unwrap();
    let conn = doc.create("Connector", &json!({"from": rect.0})).unwrap();
    doc.preserve_state();

    // Resize the rectangle.
    doc.preserve(rect);
    doc.save(
        EntryInput::json("Rect", &json!({"w": 40, "h": 5}))
            .unwrap()
            .with_id(rect)
            .with_op(Operation::Update),
    )
    .unwrap();
    doc.preserve_state();

    // Delete the connector.
    doc.delete(conn);
    doc.preserve_state();

    let final_state = contents(&doc);
    assert_eq!(doc.entries().len(), 1);

    // Undo delete: connector back.
    doc.undo();
    assert!(doc.get(conn).is_some());

    // Undo resize: original width.
    doc.undo();
    let value: serde_json::Value = doc.get(rect).unwrap().payload_json().unwrap();
    assert_eq!(value["w"], 10);

    // Undo the drawing: empty document.
    doc.undo();
    assert!(doc.entries().is_empty());
    assert!(!doc.undo_availability().can_undo);

    // Redo everything.
    doc.redo();
    doc.redo();
    doc.redo();
    assert_eq!(contents(&doc), final_state);
    assert!(!doc.undo_availability().can_redo);
}

#[test]
fn test_kind_queries_follow_history() {
    let mut doc = doc_with(10);
    doc.create("Rect", &json!({"w": 1})).unwrap();
    doc.preserve_state();
    let line = doc.create("Line", &json!({"len": 2})).unwrap();
    doc.preserve_state();

    assert_eq!(doc.entries_of_kind("Line").len(), 1);
    doc.undo();
    assert_eq!(doc.entries_of_kind("Line").len(), 0);
    assert_eq!(doc.entries_of_kind("Rect").len(), 1);
    doc.redo();
    assert_eq!(doc.entries_of_kind("Line")[0].id, line);
}

#[test]
fn test_reset_history_to_baseline() {
    let mut doc = doc_with(10);
    for w in 0..4 {
        doc.create("Rect", &json!({ "w": w })).unwrap();
        doc.preserve_state();
    }

    doc.reset_history_to(3).unwrap();
    assert_eq!(doc.engine().len(), 1);
    assert_eq!(doc.engine().dropped_count(), 0);
    assert_eq!(doc.engine().cursor(), Some(0));
    // The collapsed baseline still undoes and redoes.
    assert!(doc.undo_availability().can_undo);
    assert!(!doc.undo_availability().can_redo);
}
