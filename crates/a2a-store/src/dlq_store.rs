//! Dead-letter queue: terminal storage for envelopes that exhausted all
//! retry attempts. No automatic retry; an operator must act explicitly.

use std::path::{Path, PathBuf};

use a2a_types::DlqEntry;

use crate::fs_store::{ensure_dir, list_json_files, remove_if_exists, write_atomic_json};
use crate::Result;

pub struct DlqStore {
    dir: PathBuf,
}

impl DlqStore {
    pub fn open(data_dir: &Path) -> Result<Self> {
        let dir = data_dir.join("dlq");
        ensure_dir(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    pub fn record(&self, entry: &DlqEntry) -> Result<()> {
        write_atomic_json(&self.path(&entry.id), entry)
    }

    pub fn all(&self) -> Result<Vec<DlqEntry>> {
        list_json_files(&self.dir)
    }

    /// Operator-triggered removal; there is no automatic retry path.
    pub fn discard(&self, id: &str) -> Result<()> {
        remove_if_exists(&self.path(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use a2a_types::envelope::{EnvelopeType, From, Payload, To};
    use a2a_types::QueueEntry;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_dlq_entry() -> DlqEntry {
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
        let mut queue_entry = QueueEntry::new(envelope, "https://bob.example/ai2ai".to_string(), 0);
        queue_entry.record_failure("timeout".to_string(), Utc::now());
        DlqEntry::from_queue_entry(queue_entry, "retry budget exhausted".to_string())
    }

    #[test]
    fn test_record_then_list() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DlqStore::open(dir.path()).expect("open");
        let entry = sample_dlq_entry();
        store.record(&entry).expect("record");

        let all = store.all().expect("list");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, entry.id);
    }

    #[test]
    fn test_no_automatic_retry_discard_is_explicit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DlqStore::open(dir.path()).expect("open");
        let entry = sample_dlq_entry();
        store.record(&entry).expect("record");

        store.discard(&entry.id).expect("discard");
        assert!(store.all().expect("list").is_empty());
    }
}
