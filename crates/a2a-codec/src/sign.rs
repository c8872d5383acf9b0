//! Envelope signing and signature verification.

use a2a_crypto::ed25519::{Signature, SigningKey, VerifyingKey};
use a2a_types::Envelope;

use crate::canonical::canonical_bytes;
use crate::{CodecError, Result};

/// Sign `envelope` over its canonical signed-field subset and store the
/// result (base64) in `envelope.signature`.
///
/// If the payload was encrypted, the caller must encrypt it before calling
/// `sign` — signing is always over whatever `payload` currently holds
/// (sign-over-ciphertext when encryption applies).
pub fn sign(envelope: &mut Envelope, signing_key: &SigningKey) -> Result<()> {
    let bytes = canonical_bytes(envelope)?;
    let signature = signing_key.sign(&bytes);
    envelope.signature = Some(signature.to_base64());
    Ok(())
}

/// Verify `envelope.signature` against any of `candidate_keys`.
///
/// Callers pass a contact's current public key plus any keys retained from
/// recent rotations, since an in-flight envelope may be signed with a key
/// that has since been rotated out.
pub fn verify(envelope: &Envelope, candidate_keys: &[VerifyingKey]) -> Result<()> {
    let signature_b64 = envelope
        .signature
        .as_ref()
        .ok_or_else(|| CodecError::InvalidEnvelope("missing signature".to_string()))?;
    let signature = Signature::from_base64(signature_b64).map_err(|_| CodecError::InvalidSignature)?;
    let bytes = canonical_bytes(envelope)?;

    for key in candidate_keys {
        if key.verify(&bytes, &signature).is_ok() {
            return Ok(());
        }
    }
    Err(CodecError::InvalidSignature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use a2a_crypto::ed25519::KeyPair;
    use a2a_types::envelope::{EnvelopeType, From, Payload, To};
    use chrono::Utc;
    use uuid::Uuid;

    fn unsigned_envelope() -> Envelope {
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
            conversation: Uuid::new_v4(),
            envelope_type: EnvelopeType::Message,
            intent: Some("schedule.meeting".to_string()),
            payload: Payload::Plain(serde_json::json!({"text": "hi"})),
            requires_human_approval: false,
            signature: None,
        }
    }

    #[test]
    fn test_sign_then_verify_succeeds() {
        let kp = KeyPair::generate();
        let mut env = unsigned_envelope();
        sign(&mut env, &kp.signing_key).expect("sign");
        assert!(env.signature.is_some());
        verify(&env, &[kp.verifying_key]).expect("verify");
    }

    #[test]
    fn test_verify_without_signature_fails() {
        let kp = KeyPair::generate();
        let env = unsigned_envelope();
        assert!(verify(&env, &[kp.verifying_key]).is_err());
    }

    #[test]
    fn test_verify_against_wrong_key_fails() {
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::generate();
        let mut env = unsigned_envelope();
        sign(&mut env, &kp1.signing_key).expect("sign");
        assert!(matches!(
            verify(&env, &[kp2.verifying_key]),
            Err(CodecError::InvalidSignature)
        ));
    }

    #[test]
    fn test_verify_accepts_any_candidate_key() {
        // Simulates verifying against {current, previous} keys after rotation.
        let kp_old = KeyPair::generate();
        let kp_new = KeyPair::generate();
        let mut env = unsigned_envelope();
        sign(&mut env, &kp_old.signing_key).expect("sign");

        verify(&env, &[kp_new.verifying_key, kp_old.verifying_key]).expect("verify against candidate set");
    }

    #[test]
    fn test_mutation_after_signing_invalidates_signature() {
        let kp = KeyPair::generate();
        let mut env = unsigned_envelope();
        sign(&mut env, &kp.signing_key).expect("sign");

        env.conversation = Uuid::new_v4();
        assert!(verify(&env, &[kp.verifying_key]).is_err());
    }

    #[test]
    fn test_unsigned_fields_may_change_without_invalidating() {
        let kp = KeyPair::generate();
        let mut env = unsigned_envelope();
        sign(&mut env, &kp.signing_key).expect("sign");

        // nonce, expiresAt, requiresHumanApproval are not in the signed subset.
        env.nonce = "ffff0000ffff0000ffff0000ffff0000".to_string();
        env.requires_human_approval = true;
        verify(&env, &[kp.verifying_key.clone()]).expect("verify still succeeds");
    }
}
