//! Translating detail mappings into event and reminder properties.
//!
//! Unlike contact mutation this is strict: a key the codec does not know is
//! an error, as is any value it cannot convert. All details are decoded and
//! checked before the first property is written, so a rejected call leaves
//! the record as it was.

use chrono::{DateTime, Utc};

use super::event::{EventField, EventHandle, EventKey, decode_event_field};
use super::item::{CalendarItemHandle, ItemField, ItemKey, decode_item_field};
use super::recurrence::RecurrenceRule;
use super::reminder::{ReminderField, ReminderHandle, ReminderKey, decode_reminder_field};
use crate::error::{BridgeError, BridgeResult};
use crate::fields::FieldMap;

/// Keys every calendar item carries that a mapping cannot change.
const ITEM_READ_ONLY_KEYS: &[&str] = &["id", "uid", "calendarId", "creationDate", "lastModifiedDate"];

/// Event-only keys that a mapping cannot change.
const EVENT_READ_ONLY_KEYS: &[&str] = &["status", "organizer", "isDetached", "originalStartDate"];

/// Applies detail mappings to events and reminders.
#[derive(Debug, Default, Clone, Copy)]
pub struct CalendarEventCodec;

impl CalendarEventCodec {
    /// Apply `details` to `event` and hand the same event back.
    pub fn deserialize_event<'a, E>(
        &self,
        event: &'a mut E,
        details: &FieldMap,
    ) -> BridgeResult<&'a mut E>
    where
        E: EventHandle + ?Sized,
    {
        let mut item = Vec::new();
        let mut own = Vec::new();

        for (name, value) in details {
            if let Some(key) = ItemKey::from_mapping_key(name) {
                item.push(decode_item_field(key, value)?);
            } else if let Some(key) = EventKey::from_mapping_key(name) {
                own.push(decode_event_field(key, value)?);
            } else if !ITEM_READ_ONLY_KEYS.contains(&name.as_str())
                && !EVENT_READ_ONLY_KEYS.contains(&name.as_str())
            {
                return Err(BridgeError::UnknownField(name.clone()));
            }
        }

        let start = own
            .iter()
            .find_map(|f| match f {
                EventField::StartDate(v) => Some(*v),
                _ => None,
            })
            .unwrap_or_else(|| match event.get(EventKey::StartDate) {
                EventField::StartDate(v) => v,
                _ => None,
            });
        let end = own
            .iter()
            .find_map(|f| match f {
                EventField::EndDate(v) => Some(*v),
                _ => None,
            })
            .unwrap_or_else(|| match event.get(EventKey::EndDate) {
                EventField::EndDate(v) => v,
                _ => None,
            });

        let start = start.ok_or_else(|| missing("event", "startDate"))?;
        let end = end.ok_or_else(|| missing("event", "endDate"))?;
        if end < start {
            return Err(BridgeError::invalid(
                "endDate",
                format!("event ends ({}) before it starts ({})", end, start),
            ));
        }

        if let Some(rule) = effective_rule(&*event, &item) {
            rule.check(start)?;
        }

        for field in item {
            event.set_item(field);
        }
        for field in own {
            event.set(field);
        }

        Ok(event)
    }

    /// Apply `details` to `reminder` and hand the same reminder back.
    pub fn deserialize_reminder<'a, R>(
        &self,
        reminder: &'a mut R,
        details: &FieldMap,
    ) -> BridgeResult<&'a mut R>
    where
        R: ReminderHandle + ?Sized,
    {
        let mut item = Vec::new();
        let mut own = Vec::new();

        for (name, value) in details {
            if let Some(key) = ItemKey::from_mapping_key(name) {
                item.push(decode_item_field(key, value)?);
            } else if let Some(key) = ReminderKey::from_mapping_key(name) {
                own.push(decode_reminder_field(key, value)?);
            } else if !ITEM_READ_ONLY_KEYS.contains(&name.as_str()) {
                return Err(BridgeError::UnknownField(name.clone()));
            }
        }

        let completed = own.iter().find_map(|f| match f {
            ReminderField::Completed(v) => Some(*v),
            _ => None,
        });
        let completion_date = own.iter().find_map(|f| match f {
            ReminderField::CompletionDate(v) => Some(*v),
            _ => None,
        });
        let was_completed = match reminder.get(ReminderKey::Completed) {
            ReminderField::Completed(v) => v,
            _ => false,
        };
        match (completed.unwrap_or(was_completed), completion_date) {
            (false, Some(Some(_))) => {
                return Err(BridgeError::invalid(
                    "completionDate",
                    "an incomplete reminder cannot have a completion date",
                ));
            }
            (true, None) if completed == Some(true) => {
                let current = match reminder.get(ReminderKey::CompletionDate) {
                    ReminderField::CompletionDate(v) => v,
                    _ => None,
                };
                own.push(ReminderField::CompletionDate(Some(
                    current.unwrap_or_else(Utc::now),
                )));
            }
            (false, None) if completed == Some(false) => {
                own.push(ReminderField::CompletionDate(None))
            }
            _ => {}
        }

        let rule = effective_rule(&*reminder, &item);
        let due = own
            .iter()
            .find_map(|f| match f {
                ReminderField::DueDate(v) => Some(*v),
                _ => None,
            })
            .unwrap_or_else(|| match reminder.get(ReminderKey::DueDate) {
                ReminderField::DueDate(v) => v,
                _ => None,
            });

        if let Some(rule) = &rule {
            let due: DateTime<Utc> = due.ok_or_else(|| missing("reminder", "dueDate"))?;
            rule.check(due)?;
        }

        for field in item {
            reminder.set_item(field);
        }
        for field in own {
            reminder.set(field);
        }

        Ok(reminder)
    }

    /// Like [`CalendarEventCodec::deserialize_event`], but failures go to
    /// `reject` instead of being returned. Exactly one of the two happens.
    pub fn deserialize_event_with_reject<'a, E>(
        &self,
        event: &'a mut E,
        details: &FieldMap,
        reject: impl FnOnce(BridgeError),
    ) -> Option<&'a mut E>
    where
        E: EventHandle + ?Sized,
    {
        match self.deserialize_event(event, details) {
            Ok(event) => Some(event),
            Err(err) => {
                tracing::debug!(code = err.code(), error = %err, "rejecting event details");
                reject(err);
                None
            }
        }
    }

    /// Reminder counterpart of [`CalendarEventCodec::deserialize_event_with_reject`].
    pub fn deserialize_reminder_with_reject<'a, R>(
        &self,
        reminder: &'a mut R,
        details: &FieldMap,
        reject: impl FnOnce(BridgeError),
    ) -> Option<&'a mut R>
    where
        R: ReminderHandle + ?Sized,
    {
        match self.deserialize_reminder(reminder, details) {
            Ok(reminder) => Some(reminder),
            Err(err) => {
                tracing::debug!(code = err.code(), error = %err, "rejecting reminder details");
                reject(err);
                None
            }
        }
    }
}

/// The rule the record will carry once `item` is applied: the one the
/// mapping sets or clears, else the stored one.
fn effective_rule<H>(handle: &H, item: &[ItemField]) -> Option<RecurrenceRule>
where
    H: CalendarItemHandle + ?Sized,
{
    let pending = item.iter().find_map(|f| match f {
        ItemField::RecurrenceRule(v) => Some(v.clone()),
        _ => None,
    });

    pending.unwrap_or_else(|| match handle.get_item(ItemKey::RecurrenceRule) {
        ItemField::RecurrenceRule(v) => v,
        _ => None,
    })
}

fn missing(record: &'static str, field: &str) -> BridgeError {
    BridgeError::MissingField {
        record,
        field: field.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{Event, Frequency, RecurrenceRule, Reminder};
    use crate::error::ErrorKind;
    use chrono::TimeZone;
    use serde_json::{Value, json};

    fn details(value: Value) -> FieldMap {
        value.as_object().cloned().expect("test details must be an object")
    }

    #[test]
    fn test_standup_event_round_trip() {
        let mut event = Event::default();
        let details = details(json!({
            "title": "Standup",
            "startDate": "2025-03-20T09:00:00Z",
            "endDate": "2025-03-20T09:15:00Z",
        }));

        let mut rejected = false;
        let returned = CalendarEventCodec
            .deserialize_event_with_reject(&mut event, &details, |_| rejected = true)
            .expect("details are valid");

        assert_eq!(returned.item.title, "Standup");
        assert_eq!(
            returned.start_date,
            Some(Utc.with_ymd_and_hms(2025, 3, 20, 9, 0, 0).unwrap())
        );
        assert_eq!(
            returned.end_date,
            Some(Utc.with_ymd_and_hms(2025, 3, 20, 9, 15, 0).unwrap())
        );
        assert!(!rejected);
    }

    #[test]
    fn test_returned_reference_is_the_same_record() {
        let mut event = Event::default();
        let details = details(json!({
            "startDate": "2025-03-20T09:00:00Z",
            "endDate": "2025-03-20T10:00:00Z",
        }));

        let ptr: *const Event = &event;
        let returned = CalendarEventCodec
            .deserialize_event(&mut event, &details)
            .unwrap();
        assert!(std::ptr::eq(ptr, returned));
    }

    #[test]
    fn test_bad_recurrence_rejects_and_leaves_record_alone() {
        let mut event = Event::default();
        event.item.title = "Original".into();
        let details = details(json!({
            "title": "Changed",
            "startDate": "2025-03-20T09:00:00Z",
            "endDate": "2025-03-20T10:00:00Z",
            "recurrenceRule": { "frequency": "sometimes" },
        }));

        let mut rejection = None;
        let returned = CalendarEventCodec.deserialize_event_with_reject(
            &mut event,
            &details,
            |err| rejection = Some(err),
        );

        assert!(returned.is_none());
        assert!(matches!(rejection, Some(BridgeError::InvalidRecurrence(_))));
        assert_eq!(event.item.title, "Original");
        assert_eq!(event.start_date, None);
    }

    #[test]
    fn test_unknown_event_key_is_rejected() {
        let mut event = Event::default();
        let details = details(json!({
            "startDate": "2025-03-20T09:00:00Z",
            "endDate": "2025-03-20T10:00:00Z",
            "mood": "optimistic",
        }));

        let err = CalendarEventCodec
            .deserialize_event(&mut event, &details)
            .unwrap_err();
        assert!(matches!(err, BridgeError::UnknownField(ref key) if key == "mood"));
    }

    #[test]
    fn test_read_only_keys_are_skipped() {
        let mut event = Event {
            id: "local-1".into(),
            ..Default::default()
        };
        let details = details(json!({
            "id": "something-else",
            "uid": "etesync-uid",
            "calendarId": "other",
            "startDate": "2025-03-20T09:00:00Z",
            "endDate": "2025-03-20T10:00:00Z",
        }));

        CalendarEventCodec
            .deserialize_event(&mut event, &details)
            .unwrap();
        assert_eq!(event.id, "local-1");
    }

    #[test]
    fn test_event_without_end_is_missing_field() {
        let mut event = Event::default();
        let details = details(json!({ "startDate": "2025-03-20T09:00:00Z" }));

        let err = CalendarEventCodec
            .deserialize_event(&mut event, &details)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingField);
        assert!(matches!(err, BridgeError::MissingField { ref field, .. } if field == "endDate"));
    }

    #[test]
    fn test_existing_dates_satisfy_requirements() {
        let mut event = Event {
            start_date: Some(Utc.with_ymd_and_hms(2025, 3, 20, 9, 0, 0).unwrap()),
            end_date: Some(Utc.with_ymd_and_hms(2025, 3, 20, 10, 0, 0).unwrap()),
            ..Default::default()
        };

        CalendarEventCodec
            .deserialize_event(&mut event, &details(json!({ "location": "Room 4" })))
            .unwrap();
        assert_eq!(event.item.location.as_deref(), Some("Room 4"));
    }

    #[test]
    fn test_event_ending_before_start_is_invalid() {
        let mut event = Event::default();
        let details = details(json!({
            "startDate": "2025-03-20T10:00:00Z",
            "endDate": "2025-03-20T09:00:00Z",
        }));

        let err = CalendarEventCodec
            .deserialize_event(&mut event, &details)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_malformed_date_is_invalid_date() {
        let mut event = Event::default();
        let details = details(json!({
            "startDate": "the twentieth",
            "endDate": "2025-03-20T09:00:00Z",
        }));

        let err = CalendarEventCodec
            .deserialize_event(&mut event, &details)
            .unwrap_err();
        assert_eq!(err.code(), "E_INVALID_DATE");
    }

    #[test]
    fn test_recurring_event_with_alarm() {
        let mut event = Event::default();
        let details = details(json!({
            "title": "Gym",
            "startDate": "2025-03-17T18:00:00Z",
            "endDate": "2025-03-17T19:00:00Z",
            "alarms": [{ "relativeOffset": -30 }],
            "recurrenceRule": { "frequency": "weekly", "daysOfTheWeek": [{ "dayOfTheWeek": 2 }] },
            "availability": "busy",
        }));

        CalendarEventCodec
            .deserialize_event(&mut event, &details)
            .unwrap();

        let rule = event.item.recurrence_rule.as_ref().unwrap();
        assert_eq!(rule.frequency, Frequency::Weekly);
        assert_eq!(event.item.alarms[0].relative_offset, Some(-30));
    }

    #[test]
    fn test_rrule_level_conflict_is_rejected() {
        // BYWEEKNO is only meaningful for yearly rules
        let mut event = Event::default();
        let details = details(json!({
            "startDate": "2025-03-17T18:00:00Z",
            "endDate": "2025-03-17T19:00:00Z",
            "recurrenceRule": { "frequency": "daily", "weeksOfTheYear": [10] },
        }));

        let err = CalendarEventCodec
            .deserialize_event(&mut event, &details)
            .unwrap_err();
        assert!(matches!(err, BridgeError::InvalidRecurrence(_)));
    }

    #[test]
    fn test_reminder_round_trip() {
        let mut reminder = Reminder::default();
        let details = details(json!({
            "title": "Pay rent",
            "dueDate": "2025-04-01T09:00:00Z",
            "priority": 1,
            "notes": "transfer before noon",
        }));

        let returned = CalendarEventCodec
            .deserialize_reminder(&mut reminder, &details)
            .unwrap();

        assert_eq!(returned.item.title, "Pay rent");
        assert_eq!(
            returned.due_date,
            Some(Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap())
        );
        assert_eq!(returned.priority, 1);
        assert_eq!(returned.item.notes.as_deref(), Some("transfer before noon"));
    }

    #[test]
    fn test_recurring_reminder_without_due_date_is_missing_field() {
        let mut reminder = Reminder::default();
        let details = details(json!({
            "title": "Water plants",
            "recurrenceRule": { "frequency": "weekly" },
        }));

        let mut rejection = None;
        let returned = CalendarEventCodec.deserialize_reminder_with_reject(
            &mut reminder,
            &details,
            |err| rejection = Some(err),
        );

        assert!(returned.is_none());
        let err = rejection.expect("should reject");
        assert_eq!(err.kind(), ErrorKind::MissingField);
        assert_eq!(reminder.item.title, "");
    }

    #[test]
    fn test_reminder_without_recurrence_needs_no_due_date() {
        let mut reminder = Reminder::default();
        CalendarEventCodec
            .deserialize_reminder(&mut reminder, &details(json!({ "title": "Someday" })))
            .unwrap();
        assert_eq!(reminder.due_date, None);
    }

    #[test]
    fn test_completing_reminder_stamps_completion_date() {
        let mut reminder = Reminder::default();
        CalendarEventCodec
            .deserialize_reminder(&mut reminder, &details(json!({ "completed": true })))
            .unwrap();
        assert!(reminder.completed);
        assert!(reminder.completion_date.is_some());

        CalendarEventCodec
            .deserialize_reminder(&mut reminder, &details(json!({ "completed": false })))
            .unwrap();
        assert!(!reminder.completed);
        assert_eq!(reminder.completion_date, None);
    }

    #[test]
    fn test_incomplete_reminder_with_completion_date_is_invalid() {
        let mut reminder = Reminder::default();
        let err = CalendarEventCodec
            .deserialize_reminder(
                &mut reminder,
                &details(json!({ "completed": false, "completionDate": "2025-04-01T09:00:00Z" })),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_event_only_keys_are_unknown_for_reminders() {
        let mut reminder = Reminder::default();
        let err = CalendarEventCodec
            .deserialize_reminder(&mut reminder, &details(json!({ "allDay": true })))
            .unwrap_err();
        assert!(matches!(err, BridgeError::UnknownField(_)));
    }

    #[test]
    fn test_moving_start_past_stored_rule_end_is_rejected() {
        let mut event = Event {
            start_date: Some(Utc.with_ymd_and_hms(2025, 3, 20, 9, 0, 0).unwrap()),
            end_date: Some(Utc.with_ymd_and_hms(2025, 3, 20, 10, 0, 0).unwrap()),
            ..Default::default()
        };
        event.item.recurrence_rule = Some(RecurrenceRule {
            end_date: Some(Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap()),
            ..RecurrenceRule::new(Frequency::Daily)
        });
        let before = event.clone();

        let err = CalendarEventCodec
            .deserialize_event(
                &mut event,
                &details(json!({
                    "startDate": "2026-01-01T09:00:00Z",
                    "endDate": "2026-01-01T10:00:00Z",
                })),
            )
            .unwrap_err();

        assert!(matches!(err, BridgeError::InvalidRecurrence(_)));
        assert_eq!(event, before);

        // clearing the rule in the same mapping makes the move valid
        CalendarEventCodec
            .deserialize_event(
                &mut event,
                &details(json!({
                    "startDate": "2026-01-01T09:00:00Z",
                    "endDate": "2026-01-01T10:00:00Z",
                    "recurrenceRule": null,
                })),
            )
            .unwrap();
        assert_eq!(event.item.recurrence_rule, None);
    }

    #[test]
    fn test_moving_due_date_past_stored_rule_end_is_rejected() {
        let mut reminder = Reminder {
            due_date: Some(Utc.with_ymd_and_hms(2025, 3, 20, 9, 0, 0).unwrap()),
            ..Default::default()
        };
        reminder.item.recurrence_rule = Some(RecurrenceRule {
            end_date: Some(Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap()),
            ..RecurrenceRule::new(Frequency::Weekly)
        });

        let err = CalendarEventCodec
            .deserialize_reminder(&mut reminder, &details(json!({ "dueDate": "2026-01-01T09:00:00Z" })))
            .unwrap_err();

        assert!(matches!(err, BridgeError::InvalidRecurrence(_)));
        assert_eq!(
            reminder.due_date,
            Some(Utc.with_ymd_and_hms(2025, 3, 20, 9, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_completion_date_on_open_reminder_is_invalid() {
        let mut reminder = Reminder::default();
        let err = CalendarEventCodec
            .deserialize_reminder(
                &mut reminder,
                &details(json!({ "completionDate": "2025-04-01T09:00:00Z" })),
            )
            .unwrap_err();

        assert_eq!(err.code(), "E_INVALID_VALUE");
        assert_eq!(reminder.completion_date, None);
    }

    #[test]
    fn test_completion_date_on_completed_reminder_is_applied() {
        let mut reminder = Reminder {
            completed: true,
            completion_date: Some(Utc.with_ymd_and_hms(2025, 4, 2, 9, 0, 0).unwrap()),
            ..Default::default()
        };
        CalendarEventCodec
            .deserialize_reminder(
                &mut reminder,
                &details(json!({ "completionDate": "2025-04-01T09:00:00Z" })),
            )
            .unwrap();

        assert!(reminder.completed);
        assert_eq!(
            reminder.completion_date,
            Some(Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap())
        );
    }
}
