//! Field-level update operations.
//!
//! An update patch maps field names to either a plain value (set) or an
//! operation object such as `{"__op": "Increment", "amount": 1}`.

use crate::{CloudObject, Error, Result, kind_of};
use serde_json::{Map, Number, Value};

/// A single decoded operation on one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOp {
    Set(Value),
    Delete,
    Increment(Number),
    Add(Vec<Value>),
    AddUnique(Vec<Value>),
    Remove(Vec<Value>),
    Batch(Vec<FieldOp>),
}

impl FieldOp {
    /// Decodes the value stored under `field` in an update patch.
    pub fn decode(field: &str, value: Value) -> Result<Self> {
        let mut map = match value {
            Value::Object(map) => map,
            other => return Ok(FieldOp::Set(other)),
        };
        let op = match map.get("__op") {
            Some(Value::String(op)) => op.clone(),
            _ => return Ok(FieldOp::Set(Value::Object(map))),
        };

        match op.as_str() {
            "Delete" => Ok(FieldOp::Delete),
            "Increment" => match map.remove("amount") {
                Some(Value::Number(n)) => Ok(FieldOp::Increment(n)),
                other => {
                    let found = other.as_ref().map_or("nothing", kind_of);
                    let reason = format!("amount must be a number, found {found}");
                    Err(malformed(&op, field, reason))
                }
            },
            "Add" => Ok(FieldOp::Add(objects(&op, field, &mut map)?)),
            "AddUnique" => Ok(FieldOp::AddUnique(objects(&op, field, &mut map)?)),
            "Remove" => Ok(FieldOp::Remove(objects(&op, field, &mut map)?)),
            "Batch" => match map.remove("ops") {
                Some(Value::Array(ops)) => ops
                    .into_iter()
                    .map(|nested| FieldOp::decode(field, nested))
                    .collect::<Result<Vec<_>>>()
                    .map(FieldOp::Batch),
                _ => Err(malformed(&op, field, "ops must be an array".into())),
            },
            _ => Err(Error::UnsupportedOp(op)),
        }
    }

    /// Wire name of the operation; `Set` for plain values.
    pub fn name(&self) -> &'static str {
        match self {
            FieldOp::Set(_) => "Set",
            FieldOp::Delete => "Delete",
            FieldOp::Increment(_) => "Increment",
            FieldOp::Add(_) => "Add",
            FieldOp::AddUnique(_) => "AddUnique",
            FieldOp::Remove(_) => "Remove",
            FieldOp::Batch(_) => "Batch",
        }
    }

    /// Applies this operation to `field` of `object`.
    ///
    /// Reserved keys only take Set and Delete.
    pub fn apply(&self, field: &str, object: &mut CloudObject) -> Result<()> {
        if CloudObject::is_reserved_key(field)
            && !matches!(self, FieldOp::Set(_) | FieldOp::Delete | FieldOp::Batch(_))
        {
            return Err(Error::TypeMismatch {
                op: self.name(),
                field: field.to_string(),
                reason: "reserved keys can only be set or deleted".into(),
            });
        }
        match self {
            FieldOp::Set(value) => {
                object.put(field.to_string(), value.clone());
            }
            FieldOp::Delete => {
                object.take(field);
            }
            FieldOp::Increment(amount) => {
                let next = match object.get(field) {
                    None | Some(Value::Null) => Value::Number(amount.clone()),
                    Some(Value::Number(current)) => Value::Number(add_numbers(current, amount)),
                    Some(other) => {
                        return Err(mismatch("Increment", field, other));
                    }
                };
                object.fields_mut().insert(field.to_string(), next);
            }
            FieldOp::Add(items) => {
                let list = array_field("Add", field, object)?;
                list.extend(items.iter().cloned());
            }
            FieldOp::AddUnique(items) => {
                let list = array_field("AddUnique", field, object)?;
                for item in items {
                    if !list.contains(item) {
                        list.push(item.clone());
                    }
                }
            }
            FieldOp::Remove(items) => {
                let list = array_field("Remove", field, object)?;
                list.retain(|existing| !items.contains(existing));
            }
            FieldOp::Batch(ops) => {
                for op in ops {
                    op.apply(field, object)?;
                }
            }
        }
        object.mark_dirty(field);
        Ok(())
    }
}

/// A decoded update patch, one operation per field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldUpdate {
    ops: Vec<(String, FieldOp)>,
}

impl FieldUpdate {
    /// Decodes a JSON update patch.
    pub fn decode(patch: Value) -> Result<Self> {
        let map = match patch {
            Value::Object(map) => map,
            other => return Err(Error::NotAnObject(kind_of(&other))),
        };
        let ops = map
            .into_iter()
            .map(|(field, value)| {
                let op = FieldOp::decode(&field, value)?;
                Ok((field, op))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { ops })
    }

    /// Applies every operation onto `object`, overlaying the existing fields.
    pub fn apply_to(&self, object: &mut CloudObject) -> Result<()> {
        for (field, op) in &self.ops {
            op.apply(field, object)?;
        }
        Ok(())
    }

    pub fn get(&self, field: &str) -> Option<&FieldOp> {
        self.ops.iter().find(|(name, _)| name == field).map(|(_, op)| op)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

fn objects(op: &str, field: &str, map: &mut Map<String, Value>) -> Result<Vec<Value>> {
    match map.remove("objects") {
        Some(Value::Array(items)) => Ok(items),
        _ => Err(malformed(op, field, "objects must be an array".into())),
    }
}

fn array_field<'a>(
    op: &'static str,
    field: &str,
    object: &'a mut CloudObject,
) -> Result<&'a mut Vec<Value>> {
    let slot = object
        .fields_mut()
        .entry(field.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if slot.is_null() {
        *slot = Value::Array(Vec::new());
    }
    let kind = kind_of(slot);
    slot.as_array_mut().ok_or_else(|| Error::TypeMismatch {
        op,
        field: field.to_string(),
        reason: format!("field holds a {kind}, not an array"),
    })
}

fn add_numbers(current: &Number, amount: &Number) -> Number {
    if let (Some(a), Some(b)) = (current.as_i64(), amount.as_i64()) {
        if let Some(sum) = a.checked_add(b) {
            return Number::from(sum);
        }
    }
    let sum = current.as_f64().unwrap_or(0.0) + amount.as_f64().unwrap_or(0.0);
    Number::from_f64(sum).unwrap_or_else(|| current.clone())
}

fn malformed(op: &str, field: &str, reason: String) -> Error {
    Error::MalformedOp {
        op: op.to_string(),
        field: field.to_string(),
        reason,
    }
}

fn mismatch(op: &'static str, field: &str, found: &Value) -> Error {
    Error::TypeMismatch {
        op,
        field: field.to_string(),
        reason: format!("field holds a {}, not a number", kind_of(found)),
    }
}
