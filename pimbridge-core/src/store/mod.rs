//! On-disk record store.
//!
//! Records live as pretty-printed JSON files, one per record:
//! `<root>/<kind>/<container>/<id>.json`. The store hands out owned records;
//! callers mutate them through the adapters and save them back.

mod record;

use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};

use crate::calendar::Event;
use crate::date_range::DateRange;
use crate::error::{BridgeError, BridgeResult};

pub use record::{RecordKind, StoredRecord};

#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> BridgeResult<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(LocalStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// A fresh record with a new id, belonging to `container`. Not saved yet.
    pub fn create<T: StoredRecord>(&self, container: &str) -> T {
        let mut record = T::default();
        record.assign(uuid::Uuid::new_v4().to_string(), container);
        record
    }

    pub fn get<T: StoredRecord>(&self, container: &str, id: &str) -> BridgeResult<T> {
        let path = self.record_path(T::KIND, container, id)?;
        if !path.exists() {
            return Err(BridgeError::NotFound(format!(
                "{} '{}' in '{}'",
                T::KIND.noun(),
                id,
                container
            )));
        }

        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|e| {
            BridgeError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Write `record` into `container`, stamping its modification time.
    pub fn save<T: StoredRecord>(&self, container: &str, record: &mut T) -> BridgeResult<()> {
        let path = self.record_path(T::KIND, container, record.id())?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        record.touch(Utc::now());
        let content = serde_json::to_string_pretty(record)?;
        std::fs::write(&path, content)?;

        tracing::debug!(kind = T::KIND.noun(), id = record.id(), path = %path.display(), "saved record");
        Ok(())
    }

    pub fn delete<T: StoredRecord>(&self, container: &str, id: &str) -> BridgeResult<()> {
        let path = self.record_path(T::KIND, container, id)?;
        if !path.exists() {
            return Err(BridgeError::NotFound(format!(
                "{} '{}' in '{}'",
                T::KIND.noun(),
                id,
                container
            )));
        }

        std::fs::remove_file(&path)?;
        tracing::debug!(kind = T::KIND.noun(), id, "deleted record");
        Ok(())
    }

    /// All records in `container`, ordered by id. A missing container is empty.
    pub fn list<T: StoredRecord>(&self, container: &str) -> BridgeResult<Vec<T>> {
        let dir = self.container_dir(T::KIND, container)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        paths
            .iter()
            .map(|path| {
                let content = std::fs::read_to_string(path)?;
                serde_json::from_str(&content).map_err(|e| {
                    BridgeError::Serialization(format!(
                        "Failed to parse {}: {}",
                        path.display(),
                        e
                    ))
                })
            })
            .collect()
    }

    /// Names of the containers holding records of `kind`, sorted.
    pub fn containers(&self, kind: RecordKind) -> BridgeResult<Vec<String>> {
        let dir = self.root.join(kind.dir_name());
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut names: Vec<String> = std::fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        names.sort();
        Ok(names)
    }

    pub fn has_container(&self, kind: RecordKind, container: &str) -> BridgeResult<bool> {
        Ok(self.container_dir(kind, container)?.is_dir())
    }

    /// `NotFound` unless `container` exists for `kind`.
    pub fn require_container(&self, kind: RecordKind, container: &str) -> BridgeResult<()> {
        if self.has_container(kind, container)? {
            return Ok(());
        }
        Err(BridgeError::NotFound(format!(
            "{} container '{}'",
            kind.noun(),
            container
        )))
    }

    /// Create an empty container. Creating one that exists is a no-op.
    pub fn create_container(&self, kind: RecordKind, container: &str) -> BridgeResult<()> {
        std::fs::create_dir_all(self.container_dir(kind, container)?)?;
        Ok(())
    }

    /// Remove a container and every record in it. Returns how many records
    /// were removed.
    pub fn delete_container(&self, kind: RecordKind, container: &str) -> BridgeResult<usize> {
        self.require_container(kind, container)?;
        let dir = self.container_dir(kind, container)?;

        let removed = std::fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "json"))
            .count();
        std::fs::remove_dir_all(&dir)?;

        tracing::debug!(kind = kind.noun(), container, removed, "deleted container");
        Ok(removed)
    }

    /// Events in `calendar` that overlap `range`. A recurring event counts
    /// when any of its occurrences does.
    pub fn events_in_range(&self, calendar: &str, range: &DateRange) -> BridgeResult<Vec<Event>> {
        let events = self.list::<Event>(calendar)?;

        Ok(events
            .into_iter()
            .filter(|event| event_overlaps(event, range))
            .collect())
    }

    fn container_dir(&self, kind: RecordKind, container: &str) -> BridgeResult<PathBuf> {
        check_path_segment("container", container)?;
        Ok(self.root.join(kind.dir_name()).join(container))
    }

    fn record_path(&self, kind: RecordKind, container: &str, id: &str) -> BridgeResult<PathBuf> {
        check_path_segment("id", id)?;
        Ok(self
            .container_dir(kind, container)?
            .join(format!("{}.json", id)))
    }
}

fn event_overlaps(event: &Event, range: &DateRange) -> bool {
    let (Some(start), Some(end)) = (event.start_date, event.end_date) else {
        return false;
    };

    let Some(rule) = &event.item.recurrence_rule else {
        return range.overlaps(start, end);
    };

    // An occurrence that starts up to one event-length before the range
    // still reaches into it.
    let length = end - start;
    let from = range.from.map_or(start, |from| (from - length).max(start));
    let to = range.to.unwrap_or_else(|| Utc::now() + Duration::days(365 * 100));

    match rule.occurrences_between(start, from, to, 1) {
        Ok(found) => !found.is_empty(),
        Err(e) => {
            tracing::warn!(id = %event.id, error = %e, "could not expand recurrence, using first occurrence");
            range.overlaps(start, end)
        }
    }
}

/// Ids and container names become path segments; keep them to one.
fn check_path_segment(what: &str, segment: &str) -> BridgeResult<()> {
    if segment.is_empty()
        || segment == "."
        || segment == ".."
        || segment.contains(['/', '\\'])
    {
        return Err(BridgeError::Store(format!("invalid {} '{}'", what, segment)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{CalendarItem, Frequency, RecurrenceRule, Reminder};
    use crate::contact::Contact;
    use crate::error::ErrorKind;
    use chrono::TimeZone;

    fn store() -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(dir.path().join("store")).unwrap();
        (dir, store)
    }

    fn event_on(store: &LocalStore, day: u32) -> Event {
        let mut event: Event = store.create("work");
        event.item = CalendarItem {
            title: format!("Event on {}", day),
            ..Default::default()
        };
        event.start_date = Some(Utc.with_ymd_and_hms(2025, 3, day, 9, 0, 0).unwrap());
        event.end_date = Some(Utc.with_ymd_and_hms(2025, 3, day, 10, 0, 0).unwrap());
        event
    }

    #[test]
    fn test_save_and_get() {
        let (_dir, store) = store();
        let mut reminder: Reminder = store.create("todo");
        reminder.item.title = "Buy milk".into();
        store.save("todo", &mut reminder).unwrap();

        let loaded: Reminder = store.get("todo", &reminder.id).unwrap();
        assert_eq!(loaded.item.title, "Buy milk");
        assert_eq!(loaded.calendar_id, "todo");
        assert!(loaded.last_modified.is_some());
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let (_dir, store) = store();
        let err = store.get::<Contact>("friends", "nobody").unwrap_err();
        assert!(matches!(err, BridgeError::NotFound(_)));
        assert_eq!(err.kind(), ErrorKind::Store);
    }

    #[test]
    fn test_delete_removes_record() {
        let (_dir, store) = store();
        let mut contact: Contact = store.create("friends");
        store.save("friends", &mut contact).unwrap();

        store.delete::<Contact>("friends", &contact.id).unwrap();
        assert!(store.list::<Contact>("friends").unwrap().is_empty());
        assert!(store.delete::<Contact>("friends", &contact.id).is_err());
    }

    #[test]
    fn test_path_traversal_is_rejected() {
        let (_dir, store) = store();
        assert!(store.get::<Contact>("friends", "../../etc/passwd").is_err());
        assert!(store.list::<Contact>("..").is_err());
    }

    #[test]
    fn test_containers_are_listed_and_deleted_with_members() {
        let (_dir, store) = store();
        store.create_container(RecordKind::Contact, "work").unwrap();
        for _ in 0..2 {
            let mut contact: Contact = store.create("friends");
            store.save("friends", &mut contact).unwrap();
        }

        assert_eq!(
            store.containers(RecordKind::Contact).unwrap(),
            vec!["friends".to_string(), "work".to_string()]
        );
        assert!(store.containers(RecordKind::Event).unwrap().is_empty());
        assert!(store.has_container(RecordKind::Contact, "work").unwrap());

        assert_eq!(store.delete_container(RecordKind::Contact, "friends").unwrap(), 2);
        assert_eq!(store.containers(RecordKind::Contact).unwrap(), vec!["work".to_string()]);
        assert!(!store.has_container(RecordKind::Contact, "friends").unwrap());

        let err = store.delete_container(RecordKind::Contact, "friends").unwrap_err();
        assert!(matches!(err, BridgeError::NotFound(_)));
    }

    #[test]
    fn test_events_in_range() {
        let (_dir, store) = store();
        for day in [1, 10, 20] {
            let mut event = event_on(&store, day);
            store.save("work", &mut event).unwrap();
        }

        let range = DateRange::from_args(Some("2025-03-05"), Some("2025-03-15"), 0).unwrap();
        let found = store.events_in_range("work", &range).unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].item.title, "Event on 10");
    }

    #[test]
    fn test_recurring_event_starting_before_range_is_included() {
        let (_dir, store) = store();
        let mut event = event_on(&store, 1);
        event.item.recurrence_rule = Some(RecurrenceRule::new(Frequency::Weekly));
        store.save("work", &mut event).unwrap();

        let range = DateRange::from_args(Some("2025-04-01"), Some("2025-04-06"), 0).unwrap();
        let found = store.events_in_range("work", &range).unwrap();
        assert_eq!(found.len(), 1);

        let mut ended = found[0].clone();
        ended.item.recurrence_rule = Some(RecurrenceRule {
            occurrence: Some(2),
            ..RecurrenceRule::new(Frequency::Weekly)
        });
        store.save("work", &mut ended).unwrap();
        assert!(store.events_in_range("work", &range).unwrap().is_empty());
    }
}
