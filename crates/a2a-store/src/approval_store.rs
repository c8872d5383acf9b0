//! Pending human-approval records, one file per approval under `pending/`.

use std::path::{Path, PathBuf};

use a2a_types::PendingApproval;
use chrono::Utc;
use uuid::Uuid;

use crate::fs_store::{ensure_dir, list_json_files, read_json, remove_if_exists, write_atomic_json};
use crate::Result;

pub struct ApprovalStore {
    dir: PathBuf,
}

impl ApprovalStore {
    pub fn open(data_dir: &Path) -> Result<Self> {
        let dir = data_dir.join("pending");
        ensure_dir(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    pub fn get(&self, id: Uuid) -> Result<Option<PendingApproval>> {
        read_json(&self.path(id))
    }

    pub fn save(&self, approval: &PendingApproval) -> Result<()> {
        write_atomic_json(&self.path(approval.id), approval)
    }

    pub fn remove(&self, id: Uuid) -> Result<()> {
        remove_if_exists(&self.path(id))
    }

    pub fn all(&self) -> Result<Vec<PendingApproval>> {
        list_json_files(&self.dir)
    }

    /// Unresolved approvals in creation order, the order the orchestrator
    /// must process same-conversation approvals in.
    pub fn pending_in_order(&self) -> Result<Vec<PendingApproval>> {
        let mut all = self.all()?;
        all.retain(|a| !a.resolved);
        all.sort_by_key(|a| a.created_at);
        Ok(all)
    }

    /// Purge resolved approvals past their retention window.
    pub fn sweep_purgeable(&self) -> Result<usize> {
        let now = Utc::now();
        let mut purged = 0;
        for approval in self.all()? {
            if approval.is_purgeable(now) {
                self.remove(approval.id)?;
                purged += 1;
            }
        }
        Ok(purged)
    }
}
