//! The persistent outbound delivery queue, one file per entry under
//! `queue/`. Entries survive process restart; the queue worker in
//! `a2a-node` polls [`QueueStore::pending_in_order`] on a backoff schedule.

use std::path::{Path, PathBuf};

use a2a_types::QueueEntry;
use chrono::Utc;
use uuid::Uuid;

use crate::fs_store::{ensure_dir, list_json_files, read_json, remove_if_exists, write_atomic_json};
use crate::Result;

pub struct QueueStore {
    dir: PathBuf,
}

impl QueueStore {
    pub fn open(data_dir: &Path) -> Result<Self> {
        let dir = data_dir.join("queue");
        ensure_dir(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    pub fn enqueue(&self, entry: &QueueEntry) -> Result<()> {
        write_atomic_json(&self.path(entry.id), entry)
    }

    pub fn get(&self, id: Uuid) -> Result<Option<QueueEntry>> {
        read_json(&self.path(id))
    }

    pub fn update(&self, entry: &QueueEntry) -> Result<()> {
        write_atomic_json(&self.path(entry.id), entry)
    }

    pub fn remove(&self, id: Uuid) -> Result<()> {
        remove_if_exists(&self.path(id))
    }

    pub fn all(&self) -> Result<Vec<QueueEntry>> {
        list_json_files(&self.dir)
    }

    /// Entries not yet terminal, highest priority first and oldest first
    /// within a priority tier — the order the queue worker should attempt
    /// delivery in.
    pub fn pending_in_order(&self) -> Result<Vec<QueueEntry>> {
        use a2a_types::QueueStatus;
        let mut all = self.all()?;
        all.retain(|e| matches!(e.status, QueueStatus::Pending | QueueStatus::Retrying));
        all.sort_by_key(|e| (std::cmp::Reverse(e.priority), e.created_at));
        Ok(all)
    }

    /// Mark every entry whose `expiresAt` has passed as expired, in place.
    pub fn sweep_expired(&self) -> Result<usize> {
        use a2a_types::QueueStatus;
        let now = Utc::now();
        let mut expired = 0;
        for mut entry in self.all()? {
            if matches!(entry.status, QueueStatus::Pending | QueueStatus::Retrying) && entry.is_expired(now) {
                entry.status = QueueStatus::Expired;
                self.update(&entry)?;
                expired += 1;
            }
        }
        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use a2a_types::envelope::{EnvelopeType, From, Payload, To};
    use a2a_types::QueueStatus;
    use chrono::Duration;

    fn sample_entry() -> QueueEntry {
        let envelope = a2a_types::Envelope {
            proto_version: "1.0".to_string(),
            id: Uuid::new_v4(),
            nonce: "abcd1234abcd1234abcd1234abcd1234".to_string(),
            timestamp: Utc::now(),
            expires_at: None,
            from: From {
                agent: "agent://alice.example".to_string(),
                human: "Alice".to_string(),
            },
            to: To {
                agent: "agent://bob.example".to_string(),
            },
            conversation: Uuid::new_v4(),
            envelope_type: EnvelopeType::Message,
            intent: Some("schedule.meeting".to_string()),
            payload: Payload::Plain(serde_json::json!({"text": "hi"})),
            requires_human_approval: false,
            signature: None,
        };
        QueueEntry::new(envelope, "https://bob.example/ai2ai".to_string(), 0)
    }

    #[test]
    fn test_enqueue_then_get() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = QueueStore::open(dir.path()).expect("open");
        let entry = sample_entry();
        store.enqueue(&entry).expect("enqueue");

        let restored = store.get(entry.id).expect("get").expect("present");
        assert_eq!(restored.id, entry.id);
        assert_eq!(restored.attempts, 0);
    }

    #[test]
    fn test_survives_reopen_with_attempt_count() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = QueueStore::open(dir.path()).expect("open");
        let mut entry = sample_entry();
        entry.record_failure("connection refused".to_string(), Utc::now());
        store.enqueue(&entry).expect("enqueue");

        let reopened = QueueStore::open(dir.path()).expect("reopen");
        let restored = reopened.get(entry.id).expect("get").expect("present");
        assert_eq!(restored.attempts, 1);
        assert_eq!(restored.status, QueueStatus::Retrying);
    }

    #[test]
    fn test_pending_in_order_excludes_delivered() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = QueueStore::open(dir.path()).expect("open");

        let mut delivered = sample_entry();
        delivered.status = QueueStatus::Delivered;
        let pending = sample_entry();

        store.enqueue(&delivered).expect("enqueue");
        store.enqueue(&pending).expect("enqueue");

        let result = store.pending_in_order().expect("pending");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, pending.id);
    }

    #[test]
    fn test_pending_in_order_ranks_higher_priority_first() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = QueueStore::open(dir.path()).expect("open");

        let mut low = sample_entry();
        low.priority = 1;
        let mut high = sample_entry();
        high.priority = 9;

        store.enqueue(&low).expect("enqueue");
        store.enqueue(&high).expect("enqueue");

        let result = store.pending_in_order().expect("pending");
        assert_eq!(result[0].id, high.id);
        assert_eq!(result[1].id, low.id);
    }

    #[test]
    fn test_sweep_expired() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = QueueStore::open(dir.path()).expect("open");

        let mut entry = sample_entry();
        entry.expires_at = Some(Utc::now() - Duration::seconds(1));
        store.enqueue(&entry).expect("enqueue");

        let expired = store.sweep_expired().expect("sweep");
        assert_eq!(expired, 1);

        let restored = store.get(entry.id).expect("get").expect("present");
        assert_eq!(restored.status, QueueStatus::Expired);
    }
}
