//! Events and reminders, and the codec that applies detail mappings to them.

mod codec;
mod event;
mod item;
mod recurrence;
mod reminder;

pub use codec::CalendarEventCodec;
pub use event::{
    Attendee, AttendeeRole, AttendeeStatus, AttendeeType, Availability, Event, EventField,
    EventHandle, EventKey, decode_event_field,
};
pub use item::{Alarm, CalendarItem, CalendarItemHandle, ItemField, ItemKey, decode_item_field};
pub use recurrence::{DayOfWeek, Frequency, RecurrenceRule};
pub use reminder::{
    MAX_PRIORITY, Reminder, ReminderField, ReminderHandle, ReminderKey, decode_reminder_field,
};
