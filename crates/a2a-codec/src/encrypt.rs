//! Payload encryption/decryption between the wire's base64 fields and
//! `a2a-crypto`'s hybrid encryption primitive.

use a2a_crypto::aes_gcm::NONCE_SIZE;
use a2a_crypto::ecies;
use a2a_crypto::x25519::{X25519PublicKey, X25519StaticSecret};
use a2a_types::envelope::{EncryptedPayload as WireEncryptedPayload, Payload};
use base64::Engine;

use crate::{CodecError, Result};

fn b64_decode(field: &str, value: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(value)
        .map_err(|e| CodecError::Base64(format!("{field}: {e}")))
}

/// Encrypt `plaintext_payload` to `recipient_x_pub`, producing the wire
/// encrypted-payload variant (base64 `ephemeralPub`/`nonce`/`ciphertext`/`tag`).
pub fn encrypt_payload(
    recipient_x_pub: &X25519PublicKey,
    plaintext_payload: &serde_json::Value,
) -> Result<Payload> {
    let plaintext =
        serde_json::to_vec(plaintext_payload).map_err(|e| CodecError::Serialization(e.to_string()))?;
    let encrypted = ecies::encrypt(recipient_x_pub, &plaintext).map_err(|e| CodecError::Crypto(e.to_string()))?;

    let b64 = base64::engine::general_purpose::STANDARD;
    Ok(Payload::Encrypted(WireEncryptedPayload {
        encrypted: true,
        ephemeral_pub: b64.encode(encrypted.ephemeral_pub),
        nonce: b64.encode(encrypted.nonce),
        ciphertext: b64.encode(encrypted.ciphertext()),
        tag: b64.encode(encrypted.tag()),
    }))
}

/// Decrypt `payload` with `recipient_x_secret`. Returns the payload
/// unchanged if it was never encrypted.
///
/// A failed AEAD verification is a hard reject — [`CodecError::DecryptionFailed`]
/// — never a partial or garbled plaintext.
pub fn decrypt_payload(
    recipient_x_secret: &X25519StaticSecret,
    payload: &Payload,
) -> Result<serde_json::Value> {
    let wire = match payload {
        Payload::Plain(value) => return Ok(value.clone()),
        Payload::Encrypted(wire) => wire,
    };

    let ephemeral_pub: [u8; 32] = b64_decode("ephemeralPub", &wire.ephemeral_pub)?
        .try_into()
        .map_err(|v: Vec<u8>| {
            CodecError::InvalidEnvelope(format!("ephemeralPub: expected 32 bytes, got {}", v.len()))
        })?;
    let nonce: [u8; NONCE_SIZE] = b64_decode("nonce", &wire.nonce)?
        .try_into()
        .map_err(|v: Vec<u8>| CodecError::InvalidEnvelope(format!("nonce: expected 12 bytes, got {}", v.len())))?;
    let ciphertext = b64_decode("ciphertext", &wire.ciphertext)?;
    let tag = b64_decode("tag", &wire.tag)?;

    let mut ciphertext_and_tag = ciphertext;
    ciphertext_and_tag.extend_from_slice(&tag);

    let encrypted = ecies::EncryptedPayload {
        ephemeral_pub,
        nonce,
        ciphertext_and_tag,
    };

    let plaintext = ecies::decrypt(recipient_x_secret, &encrypted).map_err(|_| CodecError::DecryptionFailed)?;
    serde_json::from_slice(&plaintext).map_err(|e| CodecError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt_round_trip() {
        let sk = X25519StaticSecret::random();
        let pk = sk.public_key();

        let plaintext = serde_json::json!({"text": "hi", "intent": "schedule.meeting"});
        let encrypted = encrypt_payload(&pk, &plaintext).expect("encrypt");
        assert!(matches!(encrypted, Payload::Encrypted(_)));

        let decrypted = decrypt_payload(&sk, &encrypted).expect("decrypt");
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_plain_payload_passes_through() {
        let sk = X25519StaticSecret::random();
        let plaintext = serde_json::json!({"text": "hi"});
        let payload = Payload::Plain(plaintext.clone());
        let result = decrypt_payload(&sk, &payload).expect("pass through");
        assert_eq!(result, plaintext);
    }

    #[test]
    fn test_decrypt_with_wrong_key_fails() {
        let sk1 = X25519StaticSecret::random();
        let sk2 = X25519StaticSecret::random();
        let pk1 = sk1.public_key();

        let plaintext = serde_json::json!({"text": "hi"});
        let encrypted = encrypt_payload(&pk1, &plaintext).expect("encrypt");

        assert!(matches!(
            decrypt_payload(&sk2, &encrypted),
            Err(CodecError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_decrypt_with_invalid_base64_rejected() {
        let sk = X25519StaticSecret::random();
        let bad = Payload::Encrypted(WireEncryptedPayload {
            encrypted: true,
            ephemeral_pub: "not-base64!!".to_string(),
            nonce: "bm9u".to_string(),
            ciphertext: "Y3Q=".to_string(),
            tag: "dGFn".to_string(),
        });
        assert!(matches!(decrypt_payload(&sk, &bad), Err(CodecError::Base64(_))));
    }
}
