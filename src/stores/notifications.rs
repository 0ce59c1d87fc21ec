//! Per-recipient notification inbox
//!
//! Inboxes are keyed by recipient; nothing in the public API reads across
//! recipients. Unread counts are always derived from the records.

use crate::clock::Clock;
use crate::storage::{keys, read_json, write_json, KeyValueStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

const DEFAULT_TITLE: &str = "Reminder";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    pub id: String,
    pub recipient_key: String,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub meta: Value,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

type Inboxes = BTreeMap<String, Vec<NotificationRecord>>;

pub struct NotificationStore {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    inboxes: Inboxes,
}

impl NotificationStore {
    /// Load persisted inboxes. Unreadable data starts empty.
    pub fn load(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        let inboxes = read_json(store.as_ref(), keys::NOTIFICATIONS).unwrap_or_else(|e| {
            warn!(key = keys::NOTIFICATIONS, error = %e, "Could not load notifications, starting empty");
            Inboxes::new()
        });
        Self {
            store,
            clock,
            inboxes,
        }
    }

    /// Add an unread notification at the front of `recipient`'s inbox.
    ///
    /// Returns `None` without storing anything when `recipient` is blank.
    pub fn append(
        &mut self,
        recipient: &str,
        title: &str,
        message: &str,
        meta: Value,
    ) -> Option<NotificationRecord> {
        let recipient = recipient.trim();
        if recipient.is_empty() {
            debug!("Dropping notification without a recipient");
            return None;
        }

        let title = title.trim();
        let record = NotificationRecord {
            id: Uuid::new_v4().to_string(),
            recipient_key: recipient.to_string(),
            title: if title.is_empty() { DEFAULT_TITLE } else { title }.to_string(),
            message: message.to_string(),
            meta,
            created_at: self.clock.now(),
            read: false,
        };

        self.inboxes
            .entry(recipient.to_string())
            .or_default()
            .insert(0, record.clone());
        self.persist();
        debug!(recipient = %recipient, id = %record.id, "Notification appended");
        Some(record)
    }

    /// `recipient`'s notifications, newest first
    pub fn list(&self, recipient: &str) -> Vec<NotificationRecord> {
        let mut records = self.inbox(recipient).to_vec();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    pub fn unread_count(&self, recipient: &str) -> usize {
        self.inbox(recipient).iter().filter(|n| !n.read).count()
    }

    /// Returns whether a notification with `id` was found
    pub fn mark_read(&mut self, recipient: &str, id: &str) -> bool {
        let found = self
            .inbox_mut(recipient)
            .and_then(|inbox| inbox.iter_mut().find(|n| n.id == id))
            .map(|n| n.read = true)
            .is_some();
        if found {
            self.persist();
        }
        found
    }

    /// Returns how many notifications changed
    pub fn mark_all_read(&mut self, recipient: &str) -> usize {
        let changed = self
            .inbox_mut(recipient)
            .map(|inbox| {
                inbox
                    .iter_mut()
                    .filter(|n| !n.read)
                    .map(|n| n.read = true)
                    .count()
            })
            .unwrap_or(0);
        if changed > 0 {
            self.persist();
        }
        changed
    }

    pub fn remove(&mut self, recipient: &str, id: &str) -> bool {
        let removed = self
            .inbox_mut(recipient)
            .map(|inbox| {
                let before = inbox.len();
                inbox.retain(|n| n.id != id);
                inbox.len() != before
            })
            .unwrap_or(false);
        if removed {
            self.persist();
        }
        removed
    }

    pub fn clear(&mut self, recipient: &str) {
        if self.inboxes.remove(recipient.trim()).is_some() {
            self.persist();
        }
    }

    fn inbox(&self, recipient: &str) -> &[NotificationRecord] {
        self.inboxes
            .get(recipient.trim())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn inbox_mut(&mut self, recipient: &str) -> Option<&mut Vec<NotificationRecord>> {
        self.inboxes.get_mut(recipient.trim())
    }

    fn persist(&self) {
        if let Err(e) = write_json(self.store.as_ref(), keys::NOTIFICATIONS, &self.inboxes) {
            warn!(key = keys::NOTIFICATIONS, error = %e, "Failed to persist notifications");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn store() -> (NotificationStore, Arc<ManualClock>, Arc<MemoryStore>) {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        let kv = Arc::new(MemoryStore::new());
        (NotificationStore::load(kv.clone(), clock.clone()), clock, kv)
    }

    #[test]
    fn test_append_then_count() {
        let (mut inbox, _, _) = store();
        assert_eq!(inbox.unread_count("a@x.com"), 0);
        let record = inbox.append("a@x.com", "", "hello", Value::Null).unwrap();
        assert_eq!(record.title, "Reminder");
        assert_eq!(inbox.unread_count("a@x.com"), 1);
    }

    #[test]
    fn test_blank_recipient_is_ignored() {
        let (mut inbox, _, kv) = store();
        assert!(inbox.append("  ", "t", "m", Value::Null).is_none());
        assert!(kv.is_empty());
    }

    #[test]
    fn test_recipients_are_isolated() {
        let (mut inbox, _, _) = store();
        let record = inbox.append("a@x.com", "t", "m", Value::Null).unwrap();
        inbox.append("b@x.com", "t", "m", Value::Null);

        assert!(!inbox.mark_read("b@x.com", &record.id));
        assert_eq!(inbox.mark_all_read("c@x.com"), 0);
        inbox.clear("b@x.com");
        assert_eq!(inbox.unread_count("a@x.com"), 1);
        assert!(inbox.list("a@x.com").iter().all(|n| n.recipient_key == "a@x.com"));
    }

    #[test]
    fn test_list_is_newest_first() {
        let (mut inbox, clock, _) = store();
        let first = inbox.append("a@x.com", "one", "", Value::Null).unwrap();
        clock.advance(Duration::seconds(5));
        let second = inbox.append("a@x.com", "two", "", Value::Null).unwrap();

        let ids: Vec<_> = inbox.list("a@x.com").into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn test_mark_all_read_and_remove() {
        let (mut inbox, _, _) = store();
        let a = inbox.append("a@x.com", "t", "m", Value::Null).unwrap();
        inbox.append("a@x.com", "t", "m", Value::Null).unwrap();

        assert_eq!(inbox.mark_all_read("a@x.com"), 2);
        assert_eq!(inbox.unread_count("a@x.com"), 0);
        assert_eq!(inbox.mark_all_read("a@x.com"), 0);

        assert!(inbox.remove("a@x.com", &a.id));
        assert!(!inbox.remove("a@x.com", &a.id));
        assert_eq!(inbox.list("a@x.com").len(), 1);
    }

    #[test]
    fn test_persisted_shape() {
        let (mut inbox, clock, kv) = store();
        inbox
            .append("a@x.com", "New order", "3 kg of Tomato", json!({"productId": 7, "qty": 3}))
            .unwrap();

        let raw: Value = serde_json::from_str(&kv.get(keys::NOTIFICATIONS).unwrap().unwrap()).unwrap();
        let stored = &raw["a@x.com"][0];
        assert_eq!(stored["createdAt"], json!(clock.now().timestamp_millis()));
        assert_eq!(stored["read"], json!(false));
        assert_eq!(stored["meta"]["qty"], json!(3));

        let reloaded = NotificationStore::load(kv.clone(), clock.clone());
        assert_eq!(reloaded.list("a@x.com"), inbox.list("a@x.com"));
    }
}
