use anyhow::Result;
use pimbridge_core::calendar::{Event, Reminder};
use pimbridge_core::error::BridgeError;
use pimbridge_core::ics;
use pimbridge_core::store::RecordKind;
use serde_json::{Value, json};

use super::open_store;

pub fn run(kind: RecordKind, id: &str, container: &str) -> Result<Value> {
    let (_, store) = open_store()?;

    let ics = match kind {
        RecordKind::Event => ics::generate_event_ics(&store.get::<Event>(container, id)?)?,
        RecordKind::Reminder => ics::generate_reminder_ics(&store.get::<Reminder>(container, id)?)?,
        RecordKind::Contact => {
            return Err(BridgeError::invalid("kind", "contacts have no .ics form").into());
        }
    };

    Ok(json!({ "id": id, "ics": ics }))
}
