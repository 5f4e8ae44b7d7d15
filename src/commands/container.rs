use anyhow::Result;
use pimbridge_core::store::RecordKind;
use serde_json::{Value, json};

use super::open_store;

pub fn list(kind: RecordKind) -> Result<Value> {
    let (_, store) = open_store()?;
    Ok(json!(store.containers(kind)?))
}

pub fn create(kind: RecordKind, name: &str) -> Result<Value> {
    let (_, store) = open_store()?;
    store.create_container(kind, name)?;
    Ok(json!({ "container": name }))
}

/// Removes the container together with every record in it.
pub fn delete(kind: RecordKind, name: &str) -> Result<Value> {
    let (_, store) = open_store()?;
    let removed = store.delete_container(kind, name)?;
    Ok(json!({ "container": name, "removed": removed }))
}
