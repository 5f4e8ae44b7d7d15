use anyhow::Result;
use pimbridge_core::batch::{Change, process_changes};
use pimbridge_core::store::RecordKind;
use serde_json::{Value, json};

use super::open_store;
use crate::input::read_json;

pub fn run(kind: RecordKind, container: &str, data: &str) -> Result<Value> {
    let (_, store) = open_store()?;
    let changes: Vec<Change> = read_json(data)?;

    let result = process_changes(&store, kind, container, &changes)?;
    tracing::info!(kind = kind.noun(), count = result.len(), "batch applied");

    Ok(json!(result))
}
