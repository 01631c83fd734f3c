use crate::{CloudObject, Error, FieldUpdate, Result, kind_of};
use serde_json::Value;

/// Converts raw webhook JSON into domain objects.
///
/// The webhook pipeline only needs these two operations; an application
/// with its own object encoding can supply a different implementation.
pub trait ObjectCodec: Send + Sync {
    /// Builds an object from its JSON encoding.
    fn materialize(&self, raw: Value) -> Result<CloudObject>;

    /// Decodes an update patch so it can be applied onto a materialized object.
    fn decode_update(&self, patch: Value) -> Result<FieldUpdate>;

    /// Materializes `original` and overlays the decoded `update` onto it.
    fn merge(&self, original: Value, update: Value) -> Result<CloudObject> {
        let mut object = self.materialize(original)?;
        self.decode_update(update)?.apply_to(&mut object)?;
        Ok(object)
    }
}

/// Codec for the SDK's JSON object format (`className`, `objectId`, ... plus fields).
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl ObjectCodec for JsonCodec {
    fn materialize(&self, raw: Value) -> Result<CloudObject> {
        let object = decode_object(raw)?;
        if object.class_name().is_empty() {
            return Err(Error::MissingClassName);
        }
        Ok(object)
    }

    fn decode_update(&self, patch: Value) -> Result<FieldUpdate> {
        FieldUpdate::decode(patch)
    }
}

fn decode_object(raw: Value) -> Result<CloudObject> {
    let mut map = match raw {
        Value::Object(map) => map,
        other => return Err(Error::NotAnObject(kind_of(&other))),
    };
    // Full objects are tagged `"__type": "Object"`; the tag is not a field.
    map.remove("__type");
    Ok(serde_json::from_value(Value::Object(map))?)
}
