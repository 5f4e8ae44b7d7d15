//! Applying a batch of add/change/delete requests to the store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::calendar::{CalendarEventCodec, Event, Reminder};
use crate::contact::{Contact, apply_contact_fields};
use crate::error::{BridgeError, BridgeResult};
use crate::fields::{self, FieldMap};
use crate::hash::{hash_contact, hash_event, hash_reminder};
use crate::store::{LocalStore, RecordKind, StoredRecord};

/// What to do with one item of a batch. Accepts the numeric codes
/// 1 (add), 2 (change) and 3 (delete) as well as the names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "ActionRepr")]
pub enum BatchAction {
    Add,
    Change,
    Delete,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ActionRepr {
    Code(u8),
    Name(String),
}

impl TryFrom<ActionRepr> for BatchAction {
    type Error = String;

    fn try_from(repr: ActionRepr) -> Result<Self, Self::Error> {
        match repr {
            ActionRepr::Code(1) => Ok(BatchAction::Add),
            ActionRepr::Code(2) => Ok(BatchAction::Change),
            ActionRepr::Code(3) => Ok(BatchAction::Delete),
            ActionRepr::Code(n) => Err(format!("unknown batch action {}", n)),
            ActionRepr::Name(name) => match name.to_ascii_lowercase().as_str() {
                "add" => Ok(BatchAction::Add),
                "change" => Ok(BatchAction::Change),
                "delete" => Ok(BatchAction::Delete),
                _ => Err(format!("unknown batch action '{}'", name)),
            },
        }
    }
}

/// One item of a batch.
#[derive(Debug, Clone, Deserialize)]
pub struct Change {
    pub action: BatchAction,
    #[serde(default)]
    pub item: FieldMap,
}

/// Outcome per item, keyed by the item's `uid` (or `id`): the local id and,
/// unless the item was deleted, its new content hash.
pub type BatchResult = BTreeMap<String, (String, Option<String>)>;

/// Apply `changes` in order. The first failure stops the batch; items
/// processed before it stay saved.
pub fn process_changes(
    store: &LocalStore,
    kind: RecordKind,
    container: &str,
    changes: &[Change],
) -> BridgeResult<BatchResult> {
    let mut result = BatchResult::new();

    for (index, change) in changes.iter().enumerate() {
        let (key, outcome) = match kind {
            RecordKind::Contact => process_one::<Contact>(store, container, change)?,
            RecordKind::Event => process_one::<Event>(store, container, change)?,
            RecordKind::Reminder => process_one::<Reminder>(store, container, change)?,
        };
        tracing::debug!(index, kind = kind.noun(), action = ?change.action, key = %key, "processed change");
        result.insert(key, outcome);
    }

    Ok(result)
}

/// A record that a batch can apply mappings to and hash.
trait BatchRecord: StoredRecord {
    fn apply(&mut self, fields: &FieldMap) -> BridgeResult<()>;
    fn content_hash(&self) -> BridgeResult<String>;
}

impl BatchRecord for Contact {
    fn apply(&mut self, fields: &FieldMap) -> BridgeResult<()> {
        apply_contact_fields(self, fields)
    }

    fn content_hash(&self) -> BridgeResult<String> {
        hash_contact(self)
    }
}

impl BatchRecord for Event {
    fn apply(&mut self, fields: &FieldMap) -> BridgeResult<()> {
        CalendarEventCodec.deserialize_event(self, fields).map(|_| ())
    }

    fn content_hash(&self) -> BridgeResult<String> {
        hash_event(self)
    }
}

impl BatchRecord for Reminder {
    fn apply(&mut self, fields: &FieldMap) -> BridgeResult<()> {
        CalendarEventCodec.deserialize_reminder(self, fields).map(|_| ())
    }

    fn content_hash(&self) -> BridgeResult<String> {
        hash_reminder(self)
    }
}

fn process_one<T: BatchRecord>(
    store: &LocalStore,
    container: &str,
    change: &Change,
) -> BridgeResult<(String, (String, Option<String>))> {
    let uid = optional_key(&change.item, "uid")?;

    let (id, hash) = match change.action {
        BatchAction::Add => {
            let mut record: T = store.create(container);
            record.apply(&change.item)?;
            store.save(container, &mut record)?;
            (record.id().to_string(), Some(record.content_hash()?))
        }
        BatchAction::Change => {
            let id = required_id(T::KIND, &change.item)?;
            let mut record: T = store.get(container, &id)?;
            record.apply(&change.item)?;
            store.save(container, &mut record)?;
            (id, Some(record.content_hash()?))
        }
        BatchAction::Delete => {
            let id = required_id(T::KIND, &change.item)?;
            store.delete::<T>(container, &id)?;
            (id, None)
        }
    };

    Ok((uid.unwrap_or_else(|| id.clone()), (id, hash)))
}

fn optional_key(item: &FieldMap, key: &str) -> BridgeResult<Option<String>> {
    match item.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => fields::string(key, value).map(Some),
    }
}

fn required_id(kind: RecordKind, item: &FieldMap) -> BridgeResult<String> {
    optional_key(item, "id")?.ok_or_else(|| BridgeError::MissingField {
        record: kind.noun(),
        field: "id".into(),
    })
}
