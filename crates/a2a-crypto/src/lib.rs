//! # a2a-crypto
//!
//! Cryptographic primitives for the ai2ai agent-to-agent protocol.
//!
//! The protocol fixes its cryptographic suite: no algorithm negotiation is
//! exposed to callers.
//!
//! ## Modules
//!
//! - [`blake3`] — Domain-separated BLAKE3 hashing and fingerprinting
//! - [`ed25519`] — Ed25519 signing and verification (RFC 8032), node identity
//! - [`x25519`] — X25519 key agreement (RFC 7748)
//! - [`aes_gcm`] — AES-256-GCM AEAD encryption (NIST SP 800-38D)
//! - [`hkdf`] — HKDF-SHA256 key derivation for payload encryption
//! - [`ecies`] — Hybrid X25519 + HKDF + AES-256-GCM payload encryption

pub mod aes_gcm;
pub mod blake3;
pub mod ecies;
pub mod ed25519;
pub mod hkdf;
pub mod x25519;

/// Error types for cryptographic operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Ed25519 signature verification failed.
    #[error("signature verification failed")]
    SignatureVerification,

    /// AEAD decryption failed (authentication tag mismatch).
    #[error("AEAD decryption failed")]
    AeadDecryption,

    /// Key derivation failed.
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Invalid key length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// ECIES encryption/decryption failed.
    #[error("ECIES error: {0}")]
    Ecies(String),

    /// Invalid input data.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
