//! Reminders (tasks) and their reminder-only properties.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::item::{CalendarItem, CalendarItemHandle, ItemField, ItemKey};
use crate::error::{BridgeError, BridgeResult};
use crate::fields;

/// Highest priority value; 0 means no priority, 1 is the most urgent.
pub const MAX_PRIORITY: u8 = 9;

/// A writable reminder as held by the record store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub calendar_id: String,
    #[serde(flatten)]
    pub item: CalendarItem,
    pub start_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
    pub completion_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: u8,
    pub last_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReminderKey {
    StartDate,
    DueDate,
    Completed,
    CompletionDate,
    Priority,
}

impl ReminderKey {
    pub fn from_mapping_key(key: &str) -> Option<Self> {
        Some(match key {
            "startDate" => ReminderKey::StartDate,
            "dueDate" => ReminderKey::DueDate,
            "completed" => ReminderKey::Completed,
            "completionDate" => ReminderKey::CompletionDate,
            "priority" => ReminderKey::Priority,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ReminderField {
    StartDate(Option<DateTime<Utc>>),
    DueDate(Option<DateTime<Utc>>),
    Completed(bool),
    CompletionDate(Option<DateTime<Utc>>),
    Priority(u8),
}

/// Read and write access to a reminder the caller does not own.
pub trait ReminderHandle: CalendarItemHandle {
    fn get(&self, key: ReminderKey) -> ReminderField;
    fn set(&mut self, field: ReminderField);
}

impl CalendarItemHandle for Reminder {
    fn get_item(&self, key: ItemKey) -> ItemField {
        self.item.get_item(key)
    }

    fn set_item(&mut self, field: ItemField) {
        self.item.set_item(field)
    }
}

impl ReminderHandle for Reminder {
    fn get(&self, key: ReminderKey) -> ReminderField {
        match key {
            ReminderKey::StartDate => ReminderField::StartDate(self.start_date),
            ReminderKey::DueDate => ReminderField::DueDate(self.due_date),
            ReminderKey::Completed => ReminderField::Completed(self.completed),
            ReminderKey::CompletionDate => ReminderField::CompletionDate(self.completion_date),
            ReminderKey::Priority => ReminderField::Priority(self.priority),
        }
    }

    fn set(&mut self, field: ReminderField) {
        match field {
            ReminderField::StartDate(v) => self.start_date = v,
            ReminderField::DueDate(v) => self.due_date = v,
            ReminderField::Completed(v) => self.completed = v,
            ReminderField::CompletionDate(v) => self.completion_date = v,
            ReminderField::Priority(v) => self.priority = v,
        }
    }
}

pub fn decode_reminder_field(key: ReminderKey, value: &Value) -> BridgeResult<ReminderField> {
    let field = match key {
        ReminderKey::StartDate => {
            ReminderField::StartDate(fields::opt_timestamp("startDate", value)?)
        }
        ReminderKey::DueDate => ReminderField::DueDate(fields::opt_timestamp("dueDate", value)?),
        ReminderKey::Completed => ReminderField::Completed(match value {
            Value::Null => false,
            other => fields::boolean("completed", other)?,
        }),
        ReminderKey::CompletionDate => {
            ReminderField::CompletionDate(fields::opt_timestamp("completionDate", value)?)
        }
        ReminderKey::Priority => ReminderField::Priority(match value {
            Value::Null => 0,
            other => {
                let priority = fields::integer("priority", other)?;
                u8::try_from(priority)
                    .ok()
                    .filter(|p| *p <= MAX_PRIORITY)
                    .ok_or_else(|| {
                        BridgeError::invalid(
                            "priority",
                            format!("expected 0..={}, got {}", MAX_PRIORITY, priority),
                        )
                    })?
            }
        }),
    };

    Ok(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_priority_range() {
        assert_eq!(
            decode_reminder_field(ReminderKey::Priority, &json!(5)).unwrap(),
            ReminderField::Priority(5)
        );
        assert!(decode_reminder_field(ReminderKey::Priority, &json!(10)).is_err());
        assert!(decode_reminder_field(ReminderKey::Priority, &json!(-1)).is_err());
    }

    #[test]
    fn test_completed_must_be_boolean() {
        assert!(decode_reminder_field(ReminderKey::Completed, &json!("yes")).is_err());
    }
}
