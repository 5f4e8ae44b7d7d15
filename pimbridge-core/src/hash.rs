//! Content hashes for change detection.
//!
//! A hash covers what a user can edit. Local identifiers, the owning
//! container and modification stamps are left out, so moving or merely
//! re-saving a record does not change its hash.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::calendar::{CalendarItem, Event, Reminder};
use crate::contact::Contact;
use crate::date_range::DateRange;
use crate::error::BridgeResult;
use crate::store::{LocalStore, RecordKind};

pub fn hash_event(event: &Event) -> BridgeResult<String> {
    digest(&(
        item_content(&event.item),
        &event.attendees,
        event.availability,
        event.start_date,
        event.end_date,
        event.all_day,
    ))
}

pub fn hash_reminder(reminder: &Reminder) -> BridgeResult<String> {
    digest(&(
        item_content(&reminder.item),
        reminder.start_date,
        reminder.due_date,
        reminder.completed,
        reminder.completion_date,
        reminder.priority,
    ))
}

pub fn hash_contact(contact: &Contact) -> BridgeResult<String> {
    let content = Contact {
        id: String::new(),
        ..contact.clone()
    };
    digest(&content)
}

/// `(id, hash)` for every event in `calendar` that overlaps `range`.
/// A calendar that does not exist is `NotFound`, not an empty listing.
pub fn calculate_hashes_for_events(
    store: &LocalStore,
    calendar: &str,
    range: &DateRange,
) -> BridgeResult<Vec<(String, String)>> {
    store.require_container(RecordKind::Event, calendar)?;
    store
        .events_in_range(calendar, range)?
        .iter()
        .map(|event| Ok((event.id.clone(), hash_event(event)?)))
        .collect()
}

pub fn calculate_hashes_for_reminders(
    store: &LocalStore,
    calendar: &str,
) -> BridgeResult<Vec<(String, String)>> {
    store.require_container(RecordKind::Reminder, calendar)?;
    store
        .list::<Reminder>(calendar)?
        .iter()
        .map(|reminder| Ok((reminder.id.clone(), hash_reminder(reminder)?)))
        .collect()
}

pub fn calculate_hashes_for_contacts(
    store: &LocalStore,
    container: &str,
) -> BridgeResult<Vec<(String, String)>> {
    store.require_container(RecordKind::Contact, container)?;
    store
        .list::<Contact>(container)?
        .iter()
        .map(|contact| Ok((contact.id.clone(), hash_contact(contact)?)))
        .collect()
}

fn item_content(item: &CalendarItem) -> impl Serialize + '_ {
    (
        &item.title,
        &item.location,
        &item.time_zone,
        &item.url,
        &item.notes,
        &item.alarms,
        &item.recurrence_rule,
    )
}

fn digest<T: Serialize + ?Sized>(content: &T) -> BridgeResult<String> {
    let mut hasher = Sha256::new();
    serde_json::to_writer(&mut hasher, content)?;
    Ok(hex::encode(hasher.finalize()))
}
