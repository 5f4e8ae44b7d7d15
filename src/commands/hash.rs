use anyhow::Result;
use pimbridge_core::calendar::{Event, Reminder};
use pimbridge_core::contact::Contact;
use pimbridge_core::date_range::DateRange;
use pimbridge_core::error::BridgeError;
use pimbridge_core::hash;
use pimbridge_core::store::RecordKind;
use serde_json::{Value, json};

use super::open_store;

pub fn one(kind: RecordKind, id: &str, container: &str) -> Result<Value> {
    let (_, store) = open_store()?;

    let hash = match kind {
        RecordKind::Contact => hash::hash_contact(&store.get::<Contact>(container, id)?)?,
        RecordKind::Event => hash::hash_event(&store.get::<Event>(container, id)?)?,
        RecordKind::Reminder => hash::hash_reminder(&store.get::<Reminder>(container, id)?)?,
    };

    Ok(json!({ "id": id, "hash": hash }))
}

/// `from`/`to` only apply to events; other kinds are listed in full.
pub fn all(kind: RecordKind, container: &str, from: Option<&str>, to: Option<&str>) -> Result<Value> {
    let (config, store) = open_store()?;

    let pairs = match kind {
        RecordKind::Contact => hash::calculate_hashes_for_contacts(&store, container)?,
        RecordKind::Reminder => hash::calculate_hashes_for_reminders(&store, container)?,
        RecordKind::Event => {
            let range = DateRange::from_args(from, to, config.hash_window_days)
                .map_err(|e| BridgeError::invalid("range", e))?;
            hash::calculate_hashes_for_events(&store, container, &range)?
        }
    };

    Ok(json!(pairs))
}
