use anyhow::Result;
use pimbridge_core::calendar::{CalendarEventCodec, Event, Reminder};
use pimbridge_core::fields::FieldMap;
use pimbridge_core::hash::{hash_event, hash_reminder};
use serde_json::{Value, json};

use super::open_store;
use crate::input::read_json;

pub fn apply_event(id: Option<String>, calendar: &str, data: &str) -> Result<Value> {
    let (_, store) = open_store()?;
    let details: FieldMap = read_json(data)?;

    let mut event: Event = match id {
        Some(id) => store.get(calendar, &id)?,
        None => store.create(calendar),
    };

    CalendarEventCodec.deserialize_event(&mut event, &details)?;
    store.save(calendar, &mut event)?;

    Ok(json!({
        "hash": hash_event(&event)?,
        "event": event,
    }))
}

pub fn apply_reminder(id: Option<String>, calendar: &str, data: &str) -> Result<Value> {
    let (_, store) = open_store()?;
    let details: FieldMap = read_json(data)?;

    let mut reminder: Reminder = match id {
        Some(id) => store.get(calendar, &id)?,
        None => store.create(calendar),
    };

    CalendarEventCodec.deserialize_reminder(&mut reminder, &details)?;
    store.save(calendar, &mut reminder)?;

    Ok(json!({
        "hash": hash_reminder(&reminder)?,
        "reminder": reminder,
    }))
}
