//! Hybrid X25519 + HKDF-SHA256 + AES-256-GCM payload encryption.
//!
//! This is the envelope codec's encrypted-payload construction: a fresh
//! ephemeral X25519 keypair is generated per message, ECDH'd against the
//! recipient's long-lived X25519 public key, and the shared secret is run
//! through HKDF to derive a one-time AEAD key.
//!
//! ## Algorithm
//!
//! ```text
//! Encrypt(recipient_pk, plaintext):
//!   1. (eph_sk, eph_pk) = X25519.generate()
//!   2. shared_secret = X25519(eph_sk, recipient_pk)
//!   3. key = HKDF-SHA256(salt=empty, ikm=shared_secret, info="ai2ai-payload-encryption")
//!   4. nonce = random 96 bits
//!   5. (ciphertext, tag) = AES-256-GCM.Encrypt(key, nonce, plaintext)
//!   6. return (eph_pk, nonce, ciphertext, tag)
//! ```

use rand::RngCore;

use crate::aes_gcm;
use crate::hkdf::{self, PAYLOAD_ENCRYPTION_INFO};
use crate::x25519::{X25519PublicKey, X25519StaticSecret};
use crate::{CryptoError, Result};

/// An encrypted payload: ephemeral public key, nonce, and ciphertext+tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncryptedPayload {
    pub ephemeral_pub: [u8; 32],
    pub nonce: [u8; aes_gcm::NONCE_SIZE],
    pub ciphertext_and_tag: Vec<u8>,
}

impl EncryptedPayload {
    /// Split the trailing GCM tag off the ciphertext.
    pub fn ciphertext(&self) -> &[u8] {
        let len = self.ciphertext_and_tag.len();
        &self.ciphertext_and_tag[..len.saturating_sub(aes_gcm::TAG_SIZE)]
    }

    pub fn tag(&self) -> &[u8] {
        let len = self.ciphertext_and_tag.len();
        &self.ciphertext_and_tag[len.saturating_sub(aes_gcm::TAG_SIZE)..]
    }
}

fn derive_payload_key(shared_secret: &[u8]) -> Result<[u8; 32]> {
    hkdf::derive_key_32(shared_secret, PAYLOAD_ENCRYPTION_INFO)
}

/// Encrypt a payload with explicit ephemeral secret and nonce (for
/// deterministic test vectors).
pub fn encrypt_deterministic(
    recipient_pk: &X25519PublicKey,
    plaintext: &[u8],
    ephemeral_secret: &[u8; 32],
    nonce: &[u8; aes_gcm::NONCE_SIZE],
) -> Result<EncryptedPayload> {
    let eph_sk = X25519StaticSecret::from_bytes(*ephemeral_secret);
    let eph_pk = eph_sk.public_key();
    let shared_secret = eph_sk.diffie_hellman(recipient_pk);

    let key = derive_payload_key(shared_secret.as_bytes())?;
    let ciphertext_and_tag = aes_gcm::encrypt_no_aad(&key, nonce, plaintext)?;

    Ok(EncryptedPayload {
        ephemeral_pub: eph_pk.to_bytes(),
        nonce: *nonce,
        ciphertext_and_tag,
    })
}

/// Encrypt a payload to the recipient's X25519 public key with a fresh
/// ephemeral keypair and random nonce.
pub fn encrypt(recipient_pk: &X25519PublicKey, plaintext: &[u8]) -> Result<EncryptedPayload> {
    let mut ephemeral_secret = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut ephemeral_secret);
    let mut nonce = [0u8; aes_gcm::NONCE_SIZE];
    rand::rngs::OsRng.fill_bytes(&mut nonce);
    encrypt_deterministic(recipient_pk, plaintext, &ephemeral_secret, &nonce)
}

/// Decrypt a payload with the recipient's X25519 static secret.
///
/// Returns [`CryptoError::AeadDecryption`] if the AEAD tag does not verify —
/// this is treated by callers as a hard reject, never a partial plaintext.
pub fn decrypt(recipient_sk: &X25519StaticSecret, payload: &EncryptedPayload) -> Result<Vec<u8>> {
    let eph_pk = X25519PublicKey::from_bytes(payload.ephemeral_pub);
    let shared_secret = recipient_sk.diffie_hellman(&eph_pk);
    let key = derive_payload_key(shared_secret.as_bytes())?;
    aes_gcm::decrypt_no_aad(&key, &payload.nonce, &payload.ciphertext_and_tag)
        .map_err(|_| CryptoError::AeadDecryption)
}
