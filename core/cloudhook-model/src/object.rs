use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Class name the SDK assigns to user objects.
pub const USER_CLASS: &str = "_User";

/// Keys held in their own fields rather than in the field map.
pub const RESERVED_KEYS: [&str; 4] = ["className", "objectId", "createdAt", "updatedAt"];

/// A domain object as delivered in a webhook body.
///
/// The reserved keys (`className`, `objectId`, `createdAt`, `updatedAt`) are
/// lifted into their own fields; everything else lives in `fields`. Keys
/// changed through [`CloudObject::set`], [`CloudObject::unset`] or an applied
/// update are tracked as dirty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudObject {
    #[serde(default)]
    class_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    object_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<String>,
    #[serde(flatten)]
    fields: Map<String, Value>,
    #[serde(skip)]
    dirty: BTreeSet<String>,
}

impl CloudObject {
    /// Creates an empty, unsaved object of the given class.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            object_id: None,
            created_at: None,
            updated_at: None,
            fields: Map::new(),
            dirty: BTreeSet::new(),
        }
    }

    /// Creates a reference to an existing object.
    pub fn with_id(class_name: impl Into<String>, object_id: impl Into<String>) -> Self {
        let mut object = Self::new(class_name);
        object.object_id = Some(object_id.into());
        object
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn object_id(&self) -> Option<&str> {
        self.object_id.as_deref()
    }

    /// Server-assigned creation time, if the object has been saved.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_iso)
    }

    /// Server-assigned last-update time, if the object has been saved.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at.as_deref().and_then(parse_iso)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn get_array(&self, key: &str) -> Option<&Vec<Value>> {
        self.get(key).and_then(Value::as_array)
    }

    /// Reads a `{"__type": "Date", "iso": ...}` field.
    pub fn get_date(&self, key: &str) -> Option<DateTime<Utc>> {
        let value = self.get(key)?.as_object()?;
        if value.get("__type").and_then(Value::as_str) != Some("Date") {
            return None;
        }
        value.get("iso").and_then(Value::as_str).and_then(parse_iso)
    }

    /// Reads a `{"__type": "Pointer", ...}` field as an unfetched object.
    pub fn get_pointer(&self, key: &str) -> Option<CloudObject> {
        let value = self.get(key)?.as_object()?;
        if value.get("__type").and_then(Value::as_str) != Some("Pointer") {
            return None;
        }
        let class_name = value.get("className").and_then(Value::as_str)?;
        let object_id = value.get("objectId").and_then(Value::as_str)?;
        Some(Self::with_id(class_name, object_id))
    }

    /// Sets a field and marks it dirty.
    ///
    /// Reserved keys are stored as text: a string, or the `iso` of a Date
    /// value. Any other value clears them.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        self.dirty.insert(key.clone());
        self.put(key, value.into());
    }

    /// Removes a field and marks it dirty. Returns the previous value.
    pub fn unset(&mut self, key: &str) -> Option<Value> {
        self.dirty.insert(key.to_string());
        self.take(key)
    }

    pub fn is_reserved_key(key: &str) -> bool {
        RESERVED_KEYS.contains(&key)
    }

    pub(crate) fn put(&mut self, key: String, value: Value) {
        match key.as_str() {
            "className" => self.class_name = text_of(&value).unwrap_or_default(),
            "objectId" => self.object_id = text_of(&value),
            "createdAt" => self.created_at = text_of(&value),
            "updatedAt" => self.updated_at = text_of(&value),
            _ => {
                self.fields.insert(key, value);
            }
        }
    }

    pub(crate) fn take(&mut self, key: &str) -> Option<Value> {
        let previous = match key {
            "className" => Some(std::mem::take(&mut self.class_name)).filter(|c| !c.is_empty()),
            "objectId" => self.object_id.take(),
            "createdAt" => self.created_at.take(),
            "updatedAt" => self.updated_at.take(),
            _ => return self.fields.remove(key),
        };
        previous.map(Value::String)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub(crate) fn fields_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.fields
    }

    pub(crate) fn mark_dirty(&mut self, key: &str) {
        self.dirty.insert(key.to_string());
    }

    /// Keys changed since the object was decoded.
    pub fn dirty_keys(&self) -> impl Iterator<Item = &str> {
        self.dirty.iter().map(String::as_str)
    }

    pub fn is_dirty(&self, key: &str) -> bool {
        self.dirty.contains(key)
    }

    /// Returns a `{"__type": "Pointer"}` value for this object, if it has an id.
    pub fn to_pointer(&self) -> Option<Value> {
        let object_id = self.object_id.as_ref()?;
        Some(serde_json::json!({
            "__type": "Pointer",
            "className": self.class_name,
            "objectId": object_id,
        }))
    }

    /// Encodes the object back into the SDK JSON shape.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Object(map) if map.get("__type").and_then(Value::as_str) == Some("Date") => {
            map.get("iso").and_then(Value::as_str).map(str::to_string)
        }
        _ => None,
    }
}

fn parse_iso(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
