// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property-based tests for `signoff-canonical`.

use proptest::prelude::*;
use serde_json::{Map, Value, json};
use signoff_canonical::canonical_json;
use signoff_core::Record;

fn record_with(id: &str, field: &str, value: Value) -> Record {
    Record(json!({"id": id, field: value}).as_object().unwrap().clone())
}

fn record_id() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,7}".prop_map(|s| s.to_string())
}

// ── 1. Reordering records in the input never changes the output ───────

proptest! {
    #[test]
    fn record_order_does_not_affect_output(
        ids in prop::collection::hash_set(record_id(), 1..8),
    ) {
        let mut ids: Vec<String> = ids.into_iter().collect();
        let forward: Vec<Record> = ids.iter().map(|id| record_with(id, "v", json!(1))).collect();
        let a = canonical_json(forward, 1);

        ids.reverse();
        let backward: Vec<Record> = ids.iter().map(|id| record_with(id, "v", json!(1))).collect();
        let b = canonical_json(backward, 1);

        prop_assert_eq!(a, b);
    }
}

// ── 2. Field order inside a record never changes the output ───────────

proptest! {
    #[test]
    fn field_order_does_not_affect_output(id in record_id(), a_val in any::<i32>(), b_val in any::<i32>()) {
        let mut fwd = Map::new();
        fwd.insert("id".into(), Value::String(id.clone()));
        fwd.insert("a".into(), json!(a_val));
        fwd.insert("b".into(), json!(b_val));

        let mut rev = Map::new();
        rev.insert("b".into(), json!(b_val));
        rev.insert("a".into(), json!(a_val));
        rev.insert("id".into(), Value::String(id));

        let out_fwd = canonical_json(vec![Record(fwd)], 1);
        let out_rev = canonical_json(vec![Record(rev)], 1);
        prop_assert_eq!(out_fwd, out_rev);
    }
}

// ── 3. Tombstones never appear in canonical bytes ──────────────────────

proptest! {
    #[test]
    fn tombstones_never_appear_in_output(id in record_id(), live_id in record_id()) {
        prop_assume!(id != live_id);
        let mut tombstone = Map::new();
        tombstone.insert("id".into(), Value::String(id.clone()));
        tombstone.insert("deleted".into(), Value::Bool(true));

        let live = record_with(&live_id, "v", json!(1));
        let out = canonical_json(vec![Record(tombstone), live], 1);

        prop_assert!(!out.contains(&format!("\"id\":\"{id}\"")));
    }
}

// ── 4. Output is deterministic across repeated calls ───────────────────

proptest! {
    #[test]
    fn canonicalization_is_deterministic(ids in prop::collection::vec(record_id(), 0..6), ts in any::<i64>()) {
        let records: Vec<Record> = ids.iter().map(|id| record_with(id, "v", json!(1))).collect();
        let records2 = records.clone();
        prop_assert_eq!(canonical_json(records, ts), canonical_json(records2, ts));
    }
}
