//! JSON merge patch (RFC 7386) computation.
//!
//! The typed `Shoot` only models part of the real object, so updates must
//! never send the whole object back. Instead the mutated copy is diffed
//! against the fetched one and only the difference is sent.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::crd::Shoot;
use crate::framework::error::Result;

/// Compute the merge patch that turns `before` into `after`.
///
/// Objects are diffed key by key, removed keys become `null`, everything else
/// is replaced wholesale. Returns `Value::Null` when nothing changed.
pub fn merge_diff(before: &Value, after: &Value) -> Value {
    match (before, after) {
        (Value::Object(b), Value::Object(a)) => {
            let mut patch = Map::new();
            for (key, old) in b {
                match a.get(key) {
                    None => {
                        patch.insert(key.clone(), Value::Null);
                    }
                    Some(new) if new != old => {
                        let nested = merge_diff(old, new);
                        patch.insert(key.clone(), nested);
                    }
                    Some(_) => {}
                }
            }
            for (key, new) in a {
                if !b.contains_key(key) {
                    patch.insert(key.clone(), new.clone());
                }
            }
            if patch.is_empty() {
                Value::Null
            } else {
                Value::Object(patch)
            }
        }
        (b, a) if b == a => Value::Null,
        (_, a) => a.clone(),
    }
}

fn to_value<T: Serialize>(value: &T) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}

/// Merge patch for the metadata and spec changes between two shoots.
///
/// Status is never patched. The patch carries the `resourceVersion` of
/// `before`, so a concurrent writer makes the API server reject it with a
/// conflict. Returns `None` when nothing changed.
pub fn shoot_patch(before: &Shoot, after: &Shoot) -> Result<Option<Value>> {
    let mut b = to_value(before)?;
    let mut a = to_value(after)?;
    for doc in [&mut b, &mut a] {
        if let Value::Object(map) = doc {
            map.remove("status");
            if let Some(Value::Object(meta)) = map.get_mut("metadata") {
                meta.remove("resourceVersion");
                meta.remove("managedFields");
            }
        }
    }

    let mut patch = merge_diff(&b, &a);
    if patch.is_null() {
        return Ok(None);
    }

    if let (Some(version), Value::Object(map)) =
        (before.metadata.resource_version.as_ref(), &mut patch)
    {
        let meta = map
            .entry("metadata")
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(meta) = meta {
            meta.insert("resourceVersion".to_string(), Value::String(version.clone()));
        }
    }
    Ok(Some(patch))
}
