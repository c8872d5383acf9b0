//! Node identity keys: Ed25519 signing keypair and X25519 agreement
//! keypair, generated on first use and persisted thereafter.
//!
//! Key bytes are stored raw (not PEM/DER-wrapped) under the file names the
//! persistent-state layout specifies (`agent.pub`, `agent.key`, etc.) — a
//! systems-language binary encoding is simpler and no less secure than a
//! text envelope format here, and avoids pulling in a PEM-handling
//! dependency purely for file naming symmetry with the reference layout.

use std::path::{Path, PathBuf};

use a2a_crypto::ed25519::{self, KeyPair as Ed25519KeyPair, SigningKey, VerifyingKey};
use a2a_crypto::x25519::{X25519PublicKey, X25519StaticSecret};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::fs_store::{read_json, restrict_to_owner, write_atomic_json};
use crate::Result;

/// Default cadence between key rotations.
pub const DEFAULT_ROTATION_INTERVAL: Duration = Duration::days(30);

/// Previous signing keys are retained for this many rotations, so a
/// signature made just before a rotation still verifies.
pub const RETAINED_PREVIOUS_KEYS: usize = 3;

/// An archived signing key, retained so in-flight signatures still verify.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArchivedKey {
    pub public_key_base64: String,
    pub retired_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct RotationMeta {
    last_rotation_at: DateTime<Utc>,
    previous_keys: Vec<ArchivedKey>,
}

/// The result of a successful rotation.
pub struct RotationResult {
    pub new_public_key: VerifyingKey,
    pub previous_public_key: VerifyingKey,
}

/// Owns the node's Ed25519 and X25519 keypairs and their rotation history.
pub struct KeyStore {
    data_dir: PathBuf,
    signing_key: SigningKey,
    agreement_secret: X25519StaticSecret,
    rotation_meta: RotationMeta,
}

impl KeyStore {
    /// Open the key store at `data_dir`, generating and persisting a fresh
    /// keypair if none exists yet.
    pub fn open(data_dir: &Path) -> Result<Self> {
        let keys_dir = data_dir.join("keys");
        let ed_pub_path = keys_dir.join("agent.pub");
        let ed_key_path = keys_dir.join("agent.key");
        let x_pub_path = keys_dir.join("x25519.pub");
        let x_key_path = keys_dir.join("x25519.key");
        let meta_path = keys_dir.join("rotation-meta.json");

        let ed_secret: Option<[u8; 32]> = read_json(&ed_key_path)?;
        let x_secret: Option<[u8; 32]> = read_json(&x_key_path)?;

        let (signing_key, agreement_secret) = match (ed_secret, x_secret) {
            (Some(ed), Some(x)) => (SigningKey::from_bytes(&ed), X25519StaticSecret::from_bytes(x)),
            _ => {
                let ed_kp = Ed25519KeyPair::generate();
                let x_secret = X25519StaticSecret::random();
                write_atomic_json(&ed_key_path, &ed_kp.signing_key.to_bytes())?;
                restrict_to_owner(&ed_key_path)?;
                write_atomic_json(&ed_pub_path, &ed_kp.verifying_key.to_base64())?;
                write_atomic_json(&x_key_path, &x_secret.to_bytes())?;
                restrict_to_owner(&x_key_path)?;
                write_atomic_json(&x_pub_path, &x_secret.public_key().to_base64())?;
                (ed_kp.signing_key, x_secret)
            }
        };

        let rotation_meta = read_json(&meta_path)?.unwrap_or(RotationMeta {
            last_rotation_at: Utc::now(),
            previous_keys: Vec::new(),
        });

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            signing_key,
            agreement_secret,
            rotation_meta,
        })
    }

    fn meta_path(&self) -> PathBuf {
        self.data_dir.join("keys").join("rotation-meta.json")
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    pub fn agreement_secret(&self) -> &X25519StaticSecret {
        &self.agreement_secret
    }

    pub fn agreement_public_key(&self) -> X25519PublicKey {
        self.agreement_secret.public_key()
    }

    /// SHA-256-derived human-comparable fingerprint of the current Ed25519
    /// public key.
    pub fn fingerprint(&self) -> String {
        self.verifying_key().fingerprint()
    }

    /// Verifying keys a peer's signature may legitimately have been made
    /// with: the current key plus any retained previous keys.
    pub fn candidate_verifying_keys(&self) -> Vec<VerifyingKey> {
        let mut keys = vec![self.verifying_key()];
        for archived in &self.rotation_meta.previous_keys {
            if let Ok(key) = VerifyingKey::from_base64(&archived.public_key_base64) {
                keys.push(key);
            }
        }
        keys
    }

    /// Pure predicate: has at least `rotation_interval` elapsed since the
    /// last rotation?
    pub fn needs_rotation(&self, now: DateTime<Utc>, rotation_interval: Duration) -> bool {
        now - self.rotation_meta.last_rotation_at > rotation_interval
    }

    /// Archive the current signing key, generate a fresh one, and persist
    /// both the new keypair and the updated rotation history. Only the last
    /// [`RETAINED_PREVIOUS_KEYS`] archived keys are kept.
    pub fn rotate(&mut self) -> Result<RotationResult> {
        let previous_public_key = self.verifying_key();
        let now = Utc::now();

        self.rotation_meta.previous_keys.push(ArchivedKey {
            public_key_base64: previous_public_key.to_base64(),
            retired_at: now,
        });
        if self.rotation_meta.previous_keys.len() > RETAINED_PREVIOUS_KEYS {
            let excess = self.rotation_meta.previous_keys.len() - RETAINED_PREVIOUS_KEYS;
            self.rotation_meta.previous_keys.drain(0..excess);
        }
        self.rotation_meta.last_rotation_at = now;

        let new_keypair = Ed25519KeyPair::generate();
        let ed_key_path = self.data_dir.join("keys").join("agent.key");
        let ed_pub_path = self.data_dir.join("keys").join("agent.pub");
        write_atomic_json(&ed_key_path, &new_keypair.signing_key.to_bytes())?;
        restrict_to_owner(&ed_key_path)?;
        write_atomic_json(&ed_pub_path, &new_keypair.verifying_key.to_base64())?;
        write_atomic_json(&self.meta_path(), &self.rotation_meta)?;

        let new_public_key = new_keypair.verifying_key.clone();
        self.signing_key = new_keypair.signing_key;

        Ok(RotationResult {
            new_public_key,
            previous_public_key,
        })
    }
}

/// Fingerprint helper re-exported for callers that only have raw public key
/// bytes (e.g. from a freshly-parsed contact record) and no `KeyStore`.
pub fn fingerprint_of(public_key: &[u8; 32]) -> String {
    ed25519::fingerprint(public_key)
}
