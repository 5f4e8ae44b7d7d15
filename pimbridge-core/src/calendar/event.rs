//! Events and their event-only properties.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

use super::item::{CalendarItem, CalendarItemHandle, ItemField, ItemKey};
use crate::error::{BridgeError, BridgeResult};
use crate::fields;

/// How the event shows on a free/busy view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Availability {
    NotSupported,
    #[default]
    Busy,
    Free,
    Tentative,
    Unavailable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttendeeRole {
    #[default]
    Unknown,
    Required,
    Optional,
    Chair,
    NonParticipant,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttendeeStatus {
    #[default]
    Unknown,
    Pending,
    Accepted,
    Declined,
    Tentative,
    Delegated,
    Completed,
    InProcess,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AttendeeType {
    #[default]
    Unknown,
    Person,
    Room,
    Resource,
    Group,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub role: AttendeeRole,
    #[serde(default)]
    pub status: AttendeeStatus,
    #[serde(default, rename = "type")]
    pub attendee_type: AttendeeType,
}

/// A writable event as held by the record store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub calendar_id: String,
    #[serde(flatten)]
    pub item: CalendarItem,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub availability: Availability,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
    pub last_modified: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKey {
    StartDate,
    EndDate,
    AllDay,
    Availability,
    Attendees,
}

impl EventKey {
    pub fn from_mapping_key(key: &str) -> Option<Self> {
        Some(match key {
            "startDate" => EventKey::StartDate,
            "endDate" => EventKey::EndDate,
            "allDay" => EventKey::AllDay,
            "availability" => EventKey::Availability,
            "attendees" => EventKey::Attendees,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventField {
    StartDate(Option<DateTime<Utc>>),
    EndDate(Option<DateTime<Utc>>),
    AllDay(bool),
    Availability(Availability),
    Attendees(Vec<Attendee>),
}

/// Read and write access to an event the caller does not own.
pub trait EventHandle: CalendarItemHandle {
    fn get(&self, key: EventKey) -> EventField;
    fn set(&mut self, field: EventField);
}

impl CalendarItemHandle for Event {
    fn get_item(&self, key: ItemKey) -> ItemField {
        self.item.get_item(key)
    }

    fn set_item(&mut self, field: ItemField) {
        self.item.set_item(field)
    }
}

impl EventHandle for Event {
    fn get(&self, key: EventKey) -> EventField {
        match key {
            EventKey::StartDate => EventField::StartDate(self.start_date),
            EventKey::EndDate => EventField::EndDate(self.end_date),
            EventKey::AllDay => EventField::AllDay(self.all_day),
            EventKey::Availability => EventField::Availability(self.availability),
            EventKey::Attendees => EventField::Attendees(self.attendees.clone()),
        }
    }

    fn set(&mut self, field: EventField) {
        match field {
            EventField::StartDate(v) => self.start_date = v,
            EventField::EndDate(v) => self.end_date = v,
            EventField::AllDay(v) => self.all_day = v,
            EventField::Availability(v) => self.availability = v,
            EventField::Attendees(v) => self.attendees = v,
        }
    }
}

pub fn decode_event_field(key: EventKey, value: &Value) -> BridgeResult<EventField> {
    let field = match key {
        EventKey::StartDate => EventField::StartDate(fields::opt_timestamp("startDate", value)?),
        EventKey::EndDate => EventField::EndDate(fields::opt_timestamp("endDate", value)?),
        EventKey::AllDay => EventField::AllDay(match value {
            Value::Null => false,
            other => fields::boolean("allDay", other)?,
        }),
        EventKey::Availability => EventField::Availability(match value {
            Value::Null => Availability::default(),
            other => decode_enum("availability", other)?,
        }),
        EventKey::Attendees => EventField::Attendees(match value {
            Value::Null => Vec::new(),
            other => fields::array("attendees", other)?
                .iter()
                .map(decode_attendee)
                .collect::<BridgeResult<_>>()?,
        }),
    };

    Ok(field)
}

fn decode_attendee(value: &Value) -> BridgeResult<Attendee> {
    let entry = fields::object("attendees", value)?;

    // Platforms report attendees by URL; accept a mailto: URL in place of an email.
    let email = match (entry.get("email"), entry.get("url")) {
        (Some(v), _) => fields::string("attendees.email", v)?,
        (None, Some(v)) => {
            let url = fields::string("attendees.url", v)?;
            url.strip_prefix("mailto:").unwrap_or(&url).to_string()
        }
        (None, None) => {
            return Err(BridgeError::invalid("attendees", "an attendee needs an email"));
        }
    };
    if email.is_empty() {
        return Err(BridgeError::invalid("attendees", "an attendee needs an email"));
    }

    let name = match entry.get("name") {
        Some(v) => fields::opt_string("attendees.name", v)?,
        None => None,
    };
    let present = |key: &str| entry.get(key).filter(|v| !v.is_null());

    Ok(Attendee {
        name,
        email,
        role: match present("role") {
            Some(v) => decode_enum("attendees.role", v)?,
            None => AttendeeRole::default(),
        },
        status: match present("status") {
            Some(v) => decode_enum("attendees.status", v)?,
            None => AttendeeStatus::default(),
        },
        attendee_type: match present("type") {
            Some(v) => decode_enum("attendees.type", v)?,
            None => AttendeeType::default(),
        },
    })
}

fn decode_enum<T: DeserializeOwned>(field: &str, value: &Value) -> BridgeResult<T> {
    serde_json::from_value(value.clone())
        .map_err(|_| BridgeError::invalid(field, format!("unsupported value {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_availability() {
        assert_eq!(
            decode_event_field(EventKey::Availability, &json!("free")).unwrap(),
            EventField::Availability(Availability::Free)
        );
        assert!(decode_event_field(EventKey::Availability, &json!("sleeping")).is_err());
    }

    #[test]
    fn test_decode_attendee_from_url() {
        let field = decode_event_field(
            EventKey::Attendees,
            &json!([{ "name": "Bob", "url": "mailto:bob@example.com", "role": "required", "status": "accepted", "type": "person" }]),
        )
        .unwrap();

        assert_eq!(
            field,
            EventField::Attendees(vec![Attendee {
                name: Some("Bob".into()),
                email: "bob@example.com".into(),
                role: AttendeeRole::Required,
                status: AttendeeStatus::Accepted,
                attendee_type: AttendeeType::Person,
            }])
        );
    }

    #[test]
    fn test_attendee_with_bad_status_is_invalid() {
        let err = decode_event_field(
            EventKey::Attendees,
            &json!([{ "email": "bob@example.com", "status": "maybe" }]),
        )
        .unwrap_err();
        assert_eq!(err.code(), "E_INVALID_VALUE");
    }

    #[test]
    fn test_event_serializes_flat() {
        let event = Event {
            id: "abc".into(),
            item: CalendarItem {
                title: "Standup".into(),
                ..Default::default()
            },
            ..Default::default()
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["title"], "Standup");
        assert_eq!(json["calendarId"], "");
        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
