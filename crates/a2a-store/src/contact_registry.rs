//! The contact map and blocklist.
//!
//! `contacts.json` is a single file holding every known contact, replaced
//! atomically on each write. `blocklist.json` is a flat set of blocked agent
//! ids, kept separately so the security filter chain's blocklist check can
//! stay a cheap set lookup without touching the full contact map.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use a2a_types::Contact;

use crate::fs_store::write_atomic_json;
use crate::Result;

pub struct ContactRegistry {
    contacts_path: PathBuf,
    blocklist_path: PathBuf,
    contacts: RwLock<HashMap<String, Contact>>,
    blocklist: RwLock<HashSet<String>>,
}

impl ContactRegistry {
    pub fn open(data_dir: &Path) -> Result<Self> {
        let contacts_path = data_dir.join("contacts.json");
        let blocklist_path = data_dir.join("blocklist.json");

        let contacts: HashMap<String, Contact> =
            crate::fs_store::read_json(&contacts_path)?.unwrap_or_default();
        let blocklist: HashSet<String> = crate::fs_store::read_json(&blocklist_path)?.unwrap_or_default();

        Ok(Self {
            contacts_path,
            blocklist_path,
            contacts: RwLock::new(contacts),
            blocklist: RwLock::new(blocklist),
        })
    }

    pub fn get(&self, agent_id: &str) -> Option<Contact> {
        self.contacts.read().expect("contacts lock poisoned").get(agent_id).cloned()
    }

    pub fn upsert(&self, contact: Contact) -> Result<()> {
        let mut contacts = self.contacts.write().expect("contacts lock poisoned");
        contacts.insert(contact.agent_id.clone(), contact);
        write_atomic_json(&self.contacts_path, &*contacts)
    }

    pub fn remove(&self, agent_id: &str) -> Result<Option<Contact>> {
        let mut contacts = self.contacts.write().expect("contacts lock poisoned");
        let removed = contacts.remove(agent_id);
        write_atomic_json(&self.contacts_path, &*contacts)?;
        Ok(removed)
    }

    pub fn all(&self) -> Vec<Contact> {
        self.contacts
            .read()
            .expect("contacts lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    pub fn is_blocked(&self, agent_id: &str) -> bool {
        self.blocklist.read().expect("blocklist lock poisoned").contains(agent_id)
    }

    pub fn block(&self, agent_id: &str) -> Result<()> {
        {
            let mut contacts = self.contacts.write().expect("contacts lock poisoned");
            if let Some(contact) = contacts.get_mut(agent_id) {
                contact.blocked = true;
            }
            write_atomic_json(&self.contacts_path, &*contacts)?;
        }
        let mut blocklist = self.blocklist.write().expect("blocklist lock poisoned");
        blocklist.insert(agent_id.to_string());
        write_atomic_json(&self.blocklist_path, &*blocklist)
    }

    pub fn unblock(&self, agent_id: &str) -> Result<()> {
        {
            let mut contacts = self.contacts.write().expect("contacts lock poisoned");
            if let Some(contact) = contacts.get_mut(agent_id) {
                contact.blocked = false;
            }
            write_atomic_json(&self.contacts_path, &*contacts)?;
        }
        let mut blocklist = self.blocklist.write().expect("blocklist lock poisoned");
        blocklist.remove(agent_id);
        write_atomic_json(&self.blocklist_path, &*blocklist)
    }

    pub fn set_trust(&self, agent_id: &str, trust: a2a_types::TrustLevel) -> Result<()> {
        let mut contacts = self.contacts.write().expect("contacts lock poisoned");
        if let Some(contact) = contacts.get_mut(agent_id) {
            contact.trust_level = trust;
        }
        write_atomic_json(&self.contacts_path, &*contacts)
    }
}
