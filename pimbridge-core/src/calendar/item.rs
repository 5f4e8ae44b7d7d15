//! Properties shared by events and reminders.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::recurrence::RecurrenceRule;
use crate::error::{BridgeError, BridgeResult};
use crate::fields;

/// An alarm fires either at a fixed time or relative to the item's start
/// (events) or due date (reminders).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    /// Minutes relative to the anchor date; negative fires before it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_offset: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absolute_date: Option<DateTime<Utc>>,
}

/// The part of a calendar item that events and reminders have in common.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CalendarItem {
    pub title: String,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub url: Option<String>,
    pub time_zone: Option<String>,
    pub alarms: Vec<Alarm>,
    pub recurrence_rule: Option<RecurrenceRule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKey {
    Title,
    Location,
    Notes,
    Url,
    TimeZone,
    Alarms,
    RecurrenceRule,
}

impl ItemKey {
    pub fn from_mapping_key(key: &str) -> Option<Self> {
        Some(match key {
            "title" => ItemKey::Title,
            "location" => ItemKey::Location,
            "notes" => ItemKey::Notes,
            "url" => ItemKey::Url,
            "timeZone" => ItemKey::TimeZone,
            "alarms" => ItemKey::Alarms,
            "recurrenceRule" => ItemKey::RecurrenceRule,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemField {
    Title(String),
    Location(Option<String>),
    Notes(Option<String>),
    Url(Option<String>),
    TimeZone(Option<String>),
    Alarms(Vec<Alarm>),
    RecurrenceRule(Option<RecurrenceRule>),
}

/// Read and write access to the shared properties of a calendar item.
pub trait CalendarItemHandle {
    fn get_item(&self, key: ItemKey) -> ItemField;
    fn set_item(&mut self, field: ItemField);
}

impl CalendarItemHandle for CalendarItem {
    fn get_item(&self, key: ItemKey) -> ItemField {
        match key {
            ItemKey::Title => ItemField::Title(self.title.clone()),
            ItemKey::Location => ItemField::Location(self.location.clone()),
            ItemKey::Notes => ItemField::Notes(self.notes.clone()),
            ItemKey::Url => ItemField::Url(self.url.clone()),
            ItemKey::TimeZone => ItemField::TimeZone(self.time_zone.clone()),
            ItemKey::Alarms => ItemField::Alarms(self.alarms.clone()),
            ItemKey::RecurrenceRule => ItemField::RecurrenceRule(self.recurrence_rule.clone()),
        }
    }

    fn set_item(&mut self, field: ItemField) {
        match field {
            ItemField::Title(v) => self.title = v,
            ItemField::Location(v) => self.location = v,
            ItemField::Notes(v) => self.notes = v,
            ItemField::Url(v) => self.url = v,
            ItemField::TimeZone(v) => self.time_zone = v,
            ItemField::Alarms(v) => self.alarms = v,
            ItemField::RecurrenceRule(v) => self.recurrence_rule = v,
        }
    }
}

/// Convert one shared-property value from its mapping form.
pub fn decode_item_field(key: ItemKey, value: &Value) -> BridgeResult<ItemField> {
    let field = match key {
        ItemKey::Title => ItemField::Title(fields::opt_string("title", value)?.unwrap_or_default()),
        ItemKey::Location => ItemField::Location(fields::opt_string("location", value)?),
        ItemKey::Notes => ItemField::Notes(fields::opt_string("notes", value)?),
        ItemKey::Url => ItemField::Url(fields::opt_string("url", value)?),
        ItemKey::TimeZone => {
            let tz = fields::opt_string("timeZone", value)?;
            if let Some(name) = &tz {
                name.parse::<chrono_tz::Tz>().map_err(|_| {
                    BridgeError::invalid("timeZone", format!("unknown time zone '{}'", name))
                })?;
            }
            ItemField::TimeZone(tz)
        }
        ItemKey::Alarms => ItemField::Alarms(match value {
            Value::Null => Vec::new(),
            other => fields::array("alarms", other)?
                .iter()
                .map(decode_alarm)
                .collect::<BridgeResult<_>>()?,
        }),
        ItemKey::RecurrenceRule => ItemField::RecurrenceRule(match value {
            Value::Null => None,
            other => Some(RecurrenceRule::decode(other)?),
        }),
    };

    Ok(field)
}

fn decode_alarm(value: &Value) -> BridgeResult<Alarm> {
    let entry = fields::object("alarms", value)?;

    let relative_offset = match entry.get("relativeOffset") {
        None | Some(Value::Null) => None,
        Some(v) => Some(fields::minutes_offset("alarms.relativeOffset", v)?),
    };
    let absolute_date = match entry.get("absoluteDate") {
        None => None,
        Some(v) => fields::opt_timestamp("alarms.absoluteDate", v)?,
    };

    if relative_offset.is_none() && absolute_date.is_none() {
        return Err(BridgeError::invalid(
            "alarms",
            "an alarm needs a relativeOffset or an absoluteDate",
        ));
    }

    Ok(Alarm {
        relative_offset,
        absolute_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_alarms() {
        let field = decode_item_field(
            ItemKey::Alarms,
            &json!([{ "relativeOffset": -15 }, { "relativeOffset": "-PT1H" }]),
        )
        .unwrap();

        assert_eq!(
            field,
            ItemField::Alarms(vec![
                Alarm {
                    relative_offset: Some(-15),
                    absolute_date: None
                },
                Alarm {
                    relative_offset: Some(-60),
                    absolute_date: None
                },
            ])
        );
    }

    #[test]
    fn test_empty_alarm_is_invalid() {
        assert!(decode_item_field(ItemKey::Alarms, &json!([{}])).is_err());
    }

    #[test]
    fn test_time_zone_is_validated() {
        assert_eq!(
            decode_item_field(ItemKey::TimeZone, &json!("Europe/Berlin")).unwrap(),
            ItemField::TimeZone(Some("Europe/Berlin".into()))
        );
        assert!(decode_item_field(ItemKey::TimeZone, &json!("Mars/Olympus")).is_err());
    }

    #[test]
    fn test_null_title_becomes_empty() {
        assert_eq!(
            decode_item_field(ItemKey::Title, &Value::Null).unwrap(),
            ItemField::Title(String::new())
        );
    }
}
