//! # a2a-codec
//!
//! Envelope canonicalization, signing, signature verification, and the
//! encrypt/decrypt orchestration layer over `a2a-crypto`'s hybrid encryption
//! primitive.
//!
//! ## Modules
//!
//! - [`canonical`] — deterministic lexicographic-key JSON of the signed
//!   field subset
//! - [`sign`] — Ed25519 signing and multi-key verification
//! - [`encrypt`] — payload encryption/decryption to/from the wire shape
//! - [`validate`] — structural envelope checks independent of security
//!   policy (replay, expiry, blocklist — those live in `a2a-security`)

pub mod canonical;
pub mod encrypt;
pub mod sign;
pub mod validate;

pub use canonical::canonical_bytes;
pub use encrypt::{decrypt_payload, encrypt_payload};
pub use sign::{sign, verify};
pub use validate::validate_shape;

/// Errors surfaced by envelope codec operations. Variants correspond to the
/// wire-level status strings an ingress handler reports back to a peer.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("decryption failed")]
    DecryptionFailed,

    #[error("canonicalization failed: {0}")]
    Canonicalization(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("base64 decode error: {0}")]
    Base64(String),

    #[error("cryptographic error: {0}")]
    Crypto(String),
}

pub type Result<T> = std::result::Result<T, CodecError>;
