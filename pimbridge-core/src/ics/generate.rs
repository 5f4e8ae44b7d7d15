//! ICS file generation.

use chrono::{DateTime, Duration, Utc};
use icalendar::{Alarm as IcsAlarm, Calendar, Component, EventLike, Property, Trigger, ValueType};

use crate::calendar::{
    Alarm, AttendeeRole, AttendeeStatus, Availability, CalendarItem, Event, Reminder,
};
use crate::error::BridgeResult;

/// Generate .ics content holding a single VEVENT.
pub fn generate_event_ics(event: &Event) -> BridgeResult<String> {
    let mut cal = Calendar::new();
    let tz = item_tz(&event.item);

    let mut ics_event = icalendar::Event::new();
    ics_event.uid(&event.id);
    ics_event.summary(&event.item.title);
    add_stamps(&mut ics_event, event.last_modified);

    if let Some(start) = event.start_date {
        if event.all_day {
            add_date_property(&mut ics_event, "DTSTART", start, tz);
        } else {
            add_datetime_property(&mut ics_event, "DTSTART", start, tz);
        }
    }
    if let Some(end) = event.end_date {
        if event.all_day {
            // DTEND is exclusive for all-day events
            add_date_property(&mut ics_event, "DTEND", end + Duration::days(1), tz);
        } else {
            add_datetime_property(&mut ics_event, "DTEND", end, tz);
        }
    }

    add_item_properties(&mut ics_event, &event.item);

    // TRANSP - only emit if TRANSPARENT (OPAQUE is the default)
    if event.availability == Availability::Free {
        ics_event.add_property("TRANSP", "TRANSPARENT");
    }

    for alarm in &event.item.alarms {
        if let Some(trigger) = relative_trigger(alarm, false) {
            ics_event.alarm(IcsAlarm::display(&event.item.title, trigger));
        }
    }

    for attendee in &event.attendees {
        let mut prop = Property::new("ATTENDEE", format!("mailto:{}", attendee.email));
        if let Some(ref name) = attendee.name {
            prop.add_parameter("CN", name);
        }
        if let Some(role) = role_str(attendee.role) {
            prop.add_parameter("ROLE", role);
        }
        if let Some(partstat) = partstat_str(attendee.status) {
            prop.add_parameter("PARTSTAT", partstat);
        }
        ics_event.append_multi_property(prop);
    }

    cal.push(ics_event.done());
    Ok(strip_ics_bloat(&cal.done().to_string()))
}

/// Generate .ics content holding a single VTODO.
pub fn generate_reminder_ics(reminder: &Reminder) -> BridgeResult<String> {
    let mut cal = Calendar::new();
    let tz = item_tz(&reminder.item);

    let mut todo = icalendar::Todo::new();
    todo.uid(&reminder.id);
    todo.summary(&reminder.item.title);
    add_stamps(&mut todo, reminder.last_modified);

    if let Some(start) = reminder.start_date {
        add_datetime_property(&mut todo, "DTSTART", start, tz);
    }
    if let Some(due) = reminder.due_date {
        add_datetime_property(&mut todo, "DUE", due, tz);
    }

    if reminder.completed {
        todo.add_property("STATUS", "COMPLETED");
        if let Some(done) = reminder.completion_date {
            todo.add_property("COMPLETED", format_utc(done));
        }
    } else {
        todo.add_property("STATUS", "NEEDS-ACTION");
    }

    if reminder.priority > 0 {
        todo.add_property("PRIORITY", reminder.priority.to_string());
    }

    add_item_properties(&mut todo, &reminder.item);

    for alarm in &reminder.item.alarms {
        if let Some(trigger) = relative_trigger(alarm, true) {
            todo.alarm(IcsAlarm::display(&reminder.item.title, trigger));
        }
    }

    cal.push(todo.done());
    Ok(strip_ics_bloat(&cal.done().to_string()))
}

fn add_item_properties<C: Component>(component: &mut C, item: &CalendarItem) {
    if let Some(ref loc) = item.location {
        component.add_property("LOCATION", loc);
    }
    if let Some(ref notes) = item.notes {
        component.description(notes);
    }
    if let Some(ref url) = item.url {
        component.add_property("URL", url);
    }
    if let Some(ref rule) = item.recurrence_rule {
        component.add_property("RRULE", rule.to_rrule_string());
    }
}

/// DTSTAMP is required; LAST-MODIFIED only when known.
fn add_stamps<C: Component>(component: &mut C, last_modified: Option<DateTime<Utc>>) {
    let dtstamp = format_utc(last_modified.unwrap_or_else(Utc::now));
    component.add_property("DTSTAMP", &dtstamp);

    if let Some(updated) = last_modified {
        component.add_property("LAST-MODIFIED", format_utc(updated));
    }
}

/// Relative alarms anchor on the start (events) or the due date (reminders).
/// Absolute alarms have no relative trigger and are left out.
fn relative_trigger(alarm: &Alarm, anchor_is_due: bool) -> Option<Trigger> {
    let offset = alarm.relative_offset?;
    let duration = Duration::minutes(offset.abs());

    Some(match (offset < 0, anchor_is_due) {
        (true, false) => Trigger::before_start(duration),
        (false, false) => Trigger::after_start(duration),
        (true, true) => Trigger::before_end(duration),
        (false, true) => Trigger::after_end(duration),
    })
}

fn item_tz(item: &CalendarItem) -> Option<chrono_tz::Tz> {
    item.time_zone.as_deref().and_then(|name| name.parse().ok())
}

fn format_utc(dt: DateTime<Utc>) -> String {
    dt.format("%Y%m%dT%H%M%SZ").to_string()
}

/// UTC with a Z suffix, or local time with TZID when the item has a zone.
fn add_datetime_property<C: Component>(
    component: &mut C,
    name: &str,
    dt: DateTime<Utc>,
    tz: Option<chrono_tz::Tz>,
) {
    match tz {
        Some(tz) => {
            let local = dt.with_timezone(&tz);
            let mut prop = Property::new(name, local.format("%Y%m%dT%H%M%S").to_string());
            prop.add_parameter("TZID", tz.name());
            component.append_property(prop);
        }
        None => {
            component.add_property(name, format_utc(dt));
        }
    }
}

fn add_date_property<C: Component>(
    component: &mut C,
    name: &str,
    dt: DateTime<Utc>,
    tz: Option<chrono_tz::Tz>,
) {
    let date = match tz {
        Some(tz) => dt.with_timezone(&tz).date_naive(),
        None => dt.date_naive(),
    };
    let mut prop = Property::new(name, date.format("%Y%m%d").to_string());
    prop.append_parameter(ValueType::Date);
    component.append_property(prop);
}

fn role_str(role: AttendeeRole) -> Option<&'static str> {
    match role {
        AttendeeRole::Unknown => None,
        AttendeeRole::Required => Some("REQ-PARTICIPANT"),
        AttendeeRole::Optional => Some("OPT-PARTICIPANT"),
        AttendeeRole::Chair => Some("CHAIR"),
        AttendeeRole::NonParticipant => Some("NON-PARTICIPANT"),
    }
}

fn partstat_str(status: AttendeeStatus) -> Option<&'static str> {
    match status {
        AttendeeStatus::Unknown => None,
        AttendeeStatus::Pending => Some("NEEDS-ACTION"),
        AttendeeStatus::Accepted => Some("ACCEPTED"),
        AttendeeStatus::Declined => Some("DECLINED"),
        AttendeeStatus::Tentative => Some("TENTATIVE"),
        AttendeeStatus::Delegated => Some("DELEGATED"),
        AttendeeStatus::Completed => Some("COMPLETED"),
        AttendeeStatus::InProcess => Some("IN-PROCESS"),
    }
}

/// Clean up ICS output from the icalendar crate
/// - Replace PRODID with PIMBRIDGE
/// - Remove CALSCALE:GREGORIAN (it's the default)
/// - Remove DTSTAMP and UID inside VALARM sections (not required by RFC 5545)
fn strip_ics_bloat(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());
    let mut in_valarm = false;

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:PIMBRIDGE\r\n");
            continue;
        }

        if line == "CALSCALE:GREGORIAN" {
            continue;
        }

        if line == "BEGIN:VALARM" {
            in_valarm = true;
        } else if line == "END:VALARM" {
            in_valarm = false;
        }

        if in_valarm && (line.starts_with("DTSTAMP:") || line.starts_with("UID:")) {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}
