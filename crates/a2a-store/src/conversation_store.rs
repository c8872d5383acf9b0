//! Conversation metadata and its append-only envelope log.
//!
//! Each conversation gets `conversations/<id>.meta.json` (the current
//! [`Conversation`] record, write-then-rename) and `conversations/<id>.jsonl`
//! (one envelope per line, append-only — the full history of the
//! negotiation for audit/replay purposes).

use std::io::Write;
use std::path::{Path, PathBuf};

use a2a_types::{Conversation, Envelope};
use uuid::Uuid;

use crate::fs_store::{ensure_dir, list_json_files, read_json, remove_if_exists, write_atomic_json};
use crate::{Result, StoreError};

pub struct ConversationStore {
    dir: PathBuf,
}

impl ConversationStore {
    pub fn open(data_dir: &Path) -> Result<Self> {
        let dir = data_dir.join("conversations");
        ensure_dir(&dir)?;
        Ok(Self { dir })
    }

    fn meta_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.meta.json"))
    }

    fn log_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.jsonl"))
    }

    pub fn get(&self, id: Uuid) -> Result<Option<Conversation>> {
        read_json(&self.meta_path(id))
    }

    pub fn save(&self, conversation: &Conversation) -> Result<()> {
        write_atomic_json(&self.meta_path(conversation.id), conversation)
    }

    /// Append `envelope` to the conversation's audit log.
    pub fn append_envelope(&self, conversation_id: Uuid, envelope: &Envelope) -> Result<()> {
        let line = serde_json::to_string(envelope)?;
        let path = self.log_path(conversation_id);
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| StoreError::Io {
                path: path.display().to_string(),
                source: e,
            })?;
        writeln!(file, "{line}").map_err(|e| StoreError::Io {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Read every envelope appended to a conversation's log, in order.
    pub fn read_log(&self, conversation_id: Uuid) -> Result<Vec<Envelope>> {
        let path = self.log_path(conversation_id);
        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StoreError::Io {
                    path: path.display().to_string(),
                    source: e,
                })
            }
        };
        contents
            .lines()
            .filter(|l| !l.is_empty())
            .map(|l| serde_json::from_str(l).map_err(StoreError::from))
            .collect()
    }

    pub fn all(&self) -> Result<Vec<Conversation>> {
        list_json_files(&self.dir)
    }

    pub fn remove(&self, id: Uuid) -> Result<()> {
        remove_if_exists(&self.meta_path(id))?;
        remove_if_exists(&self.log_path(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use a2a_types::envelope::{EnvelopeType, From, Payload, To};
    use chrono::Utc;

    fn sample_conversation() -> Conversation {
        Conversation::new(
            Uuid::new_v4(),
            "schedule.meeting".to_string(),
            "agent://alice.example".to_string(),
            "agent://bob.example".to_string(),
        )
    }

    fn sample_envelope(conversation: Uuid) -> Envelope {
        Envelope {
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
            conversation,
            envelope_type: EnvelopeType::Request,
            intent: Some("schedule.meeting".to_string()),
            payload: Payload::Plain(serde_json::json!({"proposed_times": []})),
            requires_human_approval: false,
            signature: None,
        }
    }

    #[test]
    fn test_save_then_get() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ConversationStore::open(dir.path()).expect("open");
        let conv = sample_conversation();
        store.save(&conv).expect("save");

        let restored = store.get(conv.id).expect("get").expect("present");
        assert_eq!(restored.id, conv.id);
    }

    #[test]
    fn test_append_and_read_log_preserves_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ConversationStore::open(dir.path()).expect("open");
        let conv = sample_conversation();

        let e1 = sample_envelope(conv.id);
        let e2 = sample_envelope(conv.id);
        store.append_envelope(conv.id, &e1).expect("append 1");
        store.append_envelope(conv.id, &e2).expect("append 2");

        let log = store.read_log(conv.id).expect("read log");
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].id, e1.id);
        assert_eq!(log[1].id, e2.id);
    }

    #[test]
    fn test_read_log_missing_conversation_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ConversationStore::open(dir.path()).expect("open");
        assert!(store.read_log(Uuid::new_v4()).expect("read").is_empty());
    }

    #[test]
    fn test_remove_deletes_both_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = ConversationStore::open(dir.path()).expect("open");
        let conv = sample_conversation();
        store.save(&conv).expect("save");
        store.append_envelope(conv.id, &sample_envelope(conv.id)).expect("append");

        store.remove(conv.id).expect("remove");
        assert!(store.get(conv.id).expect("get").is_none());
        assert!(store.read_log(conv.id).expect("read log").is_empty());
    }
}
