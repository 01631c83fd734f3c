use cloudhook_model::{CloudObject, Error, FieldOp, FieldUpdate};
use pretty_assertions::assert_eq;
use serde_json::json;

fn object_with(field: &str, value: serde_json::Value) -> CloudObject {
    let mut o = CloudObject::new("Widget");
    o.set(field, value);
    o
}

fn apply(object: &mut CloudObject, patch: serde_json::Value) {
    FieldUpdate::decode(patch).unwrap().apply_to(object).unwrap();
}

// ── Decoding ────────────────────────────────────────────────────

#[test]
fn plain_object_without_op_is_a_set() {
    let op = FieldOp::decode("meta", json!({"a": 1})).unwrap();
    assert_eq!(op, FieldOp::Set(json!({"a": 1})));
}

#[test]
fn unknown_op_is_unsupported() {
    let err = FieldOp::decode("friends", json!({"__op": "AddRelation", "objects": []})).unwrap_err();
    assert!(matches!(err, Error::UnsupportedOp(ref op) if op == "AddRelation"));
}

#[test]
fn increment_without_amount_is_malformed() {
    let err = FieldOp::decode("count", json!({"__op": "Increment"})).unwrap_err();
    assert_eq!(
        err.to_string(),
        "malformed Increment operation on field 'count': amount must be a number, found nothing"
    );
}

#[test]
fn add_requires_objects_array() {
    let err = FieldOp::decode("tags", json!({"__op": "Add", "objects": "x"})).unwrap_err();
    assert!(matches!(err, Error::MalformedOp { .. }));
}

// ── Increment ───────────────────────────────────────────────────

#[test]
fn increment_existing_integer() {
    let mut o = object_with("count", json!(5));
    apply(&mut o, json!({"count": {"__op": "Increment", "amount": 3}}));
    assert_eq!(o.get("count"), Some(&json!(8)));
}

#[test]
fn increment_missing_field_starts_from_amount() {
    let mut o = CloudObject::new("Widget");
    apply(&mut o, json!({"count": {"__op": "Increment", "amount": -2}}));
    assert_eq!(o.get_i64("count"), Some(-2));
}

#[test]
fn increment_mixed_float() {
    let mut o = object_with("score", json!(1));
    apply(&mut o, json!({"score": {"__op": "Increment", "amount": 0.5}}));
    assert_eq!(o.get_f64("score"), Some(1.5));
}

#[test]
fn increment_non_number_fails() {
    let mut o = object_with("count", json!("three"));
    let update = FieldUpdate::decode(json!({"count": {"__op": "Increment", "amount": 1}})).unwrap();
    assert!(update.apply_to(&mut o).is_err());
}

// ── Array ops ───────────────────────────────────────────────────

#[test]
fn add_appends_including_duplicates() {
    let mut o = object_with("tags", json!(["a"]));
    apply(&mut o, json!({"tags": {"__op": "Add", "objects": ["a", "b"]}}));
    assert_eq!(o.get("tags"), Some(&json!(["a", "a", "b"])));
}

#[test]
fn add_unique_skips_existing() {
    let mut o = object_with("tags", json!(["a"]));
    apply(&mut o, json!({"tags": {"__op": "AddUnique", "objects": ["a", "b", "b"]}}));
    assert_eq!(o.get("tags"), Some(&json!(["a", "b"])));
}

#[test]
fn remove_drops_all_matches() {
    let mut o = object_with("tags", json!(["a", "b", "a", "c"]));
    apply(&mut o, json!({"tags": {"__op": "Remove", "objects": ["a"]}}));
    assert_eq!(o.get("tags"), Some(&json!(["b", "c"])));
}

#[test]
fn add_on_missing_field_creates_array() {
    let mut o = CloudObject::new("Widget");
    apply(&mut o, json!({"tags": {"__op": "Add", "objects": [1]}}));
    assert_eq!(o.get("tags"), Some(&json!([1])));
}

#[test]
fn add_on_scalar_field_fails() {
    let mut o = object_with("tags", json!(7));
    let update = FieldUpdate::decode(json!({"tags": {"__op": "Add", "objects": [1]}})).unwrap();
    let err = update.apply_to(&mut o).unwrap_err();
    assert_eq!(
        err.to_string(),
        "cannot apply Add to field 'tags': field holds a number, not an array"
    );
}

// ── Delete & Batch ──────────────────────────────────────────────

#[test]
fn delete_removes_field_and_marks_dirty() {
    let mut o = object_with("name", json!("x"));
    apply(&mut o, json!({"name": {"__op": "Delete"}}));
    assert!(!o.has("name"));
    assert!(o.is_dirty("name"));
}

#[test]
fn batch_applies_in_order() {
    let mut o = object_with("tags", json!(["a"]));
    apply(
        &mut o,
        json!({"tags": {"__op": "Batch", "ops": [
            {"__op": "Add", "objects": ["b"]},
            {"__op": "Remove", "objects": ["a"]}
        ]}}),
    );
    assert_eq!(o.get("tags"), Some(&json!(["b"])));
}

#[test]
fn reserved_keys_take_set_and_delete() {
    let mut o = CloudObject::with_id("Widget", "w1");
    apply(&mut o, json!({"objectId": "w2", "updatedAt": {"__op": "Delete"}}));
    assert_eq!(o.object_id(), Some("w2"));
    assert_eq!(o.updated_at(), None);
    assert!(o.fields().is_empty());
}

#[test]
fn reserved_keys_reject_other_ops() {
    let mut o = CloudObject::with_id("Widget", "w1");
    let update = FieldUpdate::decode(json!({"objectId": {"__op": "Increment", "amount": 1}})).unwrap();
    let err = update.apply_to(&mut o).unwrap_err();
    assert!(matches!(err, Error::TypeMismatch { op: "Increment", .. }));
    assert_eq!(o.object_id(), Some("w1"));
}

#[test]
fn empty_update_changes_nothing() {
    let update = FieldUpdate::decode(json!({})).unwrap();
    assert!(update.is_empty());
    let mut o = object_with("name", json!("x"));
    let before = o.clone();
    update.apply_to(&mut o).unwrap();
    assert_eq!(o, before);
}
