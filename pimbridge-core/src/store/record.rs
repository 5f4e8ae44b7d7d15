use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};

use crate::calendar::{Event, Reminder};
use crate::contact::Contact;

/// Which family of records a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Contact,
    Event,
    Reminder,
}

impl RecordKind {
    pub fn dir_name(self) -> &'static str {
        match self {
            RecordKind::Contact => "contacts",
            RecordKind::Event => "events",
            RecordKind::Reminder => "reminders",
        }
    }

    pub fn noun(self) -> &'static str {
        match self {
            RecordKind::Contact => "contact",
            RecordKind::Event => "event",
            RecordKind::Reminder => "reminder",
        }
    }
}

/// A record the store can persist.
pub trait StoredRecord: Serialize + DeserializeOwned + Default {
    const KIND: RecordKind;

    fn id(&self) -> &str;

    /// Give a new record its id and owning container.
    fn assign(&mut self, id: String, container: &str);

    /// Stamp the modification time, for records that carry one.
    fn touch(&mut self, _now: DateTime<Utc>) {}
}

impl StoredRecord for Contact {
    const KIND: RecordKind = RecordKind::Contact;

    fn id(&self) -> &str {
        &self.id
    }

    fn assign(&mut self, id: String, _container: &str) {
        self.id = id;
    }
}

impl StoredRecord for Event {
    const KIND: RecordKind = RecordKind::Event;

    fn id(&self) -> &str {
        &self.id
    }

    fn assign(&mut self, id: String, container: &str) {
        self.id = id;
        self.calendar_id = container.to_string();
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.last_modified = Some(now);
    }
}

impl StoredRecord for Reminder {
    const KIND: RecordKind = RecordKind::Reminder;

    fn id(&self) -> &str {
        &self.id
    }

    fn assign(&mut self, id: String, container: &str) {
        self.id = id;
        self.calendar_id = container.to_string();
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.last_modified = Some(now);
    }
}
