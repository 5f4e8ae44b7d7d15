//! ICS generation for events and reminders (RFC 5545).

mod generate;

pub use generate::{generate_event_ics, generate_reminder_ics};
