//! Field-mapping adapters for contact, event and reminder records.
//!
//! Callers describe changes as loosely typed mappings (`FieldMap`). The
//! adapters validate a whole mapping, convert each value to its native
//! form and only then write it into a borrowed record:
//! - [`ContactMutator`] is lenient about unknown keys
//! - [`CalendarEventCodec`] is strict and rejects them
//!
//! Around the adapters sit a JSON record store, content hashing for change
//! detection, change batches and ICS export.

pub mod batch;
pub mod calendar;
pub mod config;
pub mod constants;
pub mod contact;
pub mod date_range;
pub mod error;
pub mod fields;
pub mod hash;
pub mod ics;
pub mod protocol;
pub mod resolver;
pub mod store;

pub use calendar::{CalendarEventCodec, Event, Reminder};
pub use config::BridgeConfig;
pub use contact::{Contact, ContactMutator};
pub use error::{BridgeError, BridgeResult, ErrorKind};
pub use fields::FieldMap;
pub use store::{LocalStore, RecordKind};
