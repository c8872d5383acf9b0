//! HKDF-SHA256 key derivation (RFC 5869).
//!
//! Used exclusively to derive the per-message payload encryption key from an
//! X25519 shared secret in [`crate::ecies`].

use hkdf::Hkdf;
use sha2::Sha256;

use crate::{CryptoError, Result};

/// Info label mandated for payload-encryption key derivation.
pub const PAYLOAD_ENCRYPTION_INFO: &[u8] = b"ai2ai-payload-encryption";

/// Derive a 32-byte key from input key material using HKDF-SHA256 with an
/// empty salt and the given info label.
pub fn derive_key_32(ikm: &[u8], info: &[u8]) -> Result<[u8; 32]> {
    let hk = Hkdf::<Sha256>::new(None, ikm);
    let mut out = [0u8; 32];
    hk.expand(info, &mut out)
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_key_deterministic() {
        let ikm = [0x11u8; 32];
        let k1 = derive_key_32(&ikm, PAYLOAD_ENCRYPTION_INFO).expect("derive");
        let k2 = derive_key_32(&ikm, PAYLOAD_ENCRYPTION_INFO).expect("derive");
        assert_eq!(k1, k2);
    }

    #[test]
    fn test_derive_key_varies_by_info() {
        let ikm = [0x11u8; 32];
        let k1 = derive_key_32(&ikm, PAYLOAD_ENCRYPTION_INFO).expect("derive");
        let k2 = derive_key_32(&ikm, b"other-context").expect("derive");
        assert_ne!(k1, k2);
    }

    #[test]
    fn test_derive_key_varies_by_ikm() {
        let k1 = derive_key_32(&[0x01u8; 32], PAYLOAD_ENCRYPTION_INFO).expect("derive");
        let k2 = derive_key_32(&[0x02u8; 32], PAYLOAD_ENCRYPTION_INFO).expect("derive");
        assert_ne!(k1, k2);
    }
}
