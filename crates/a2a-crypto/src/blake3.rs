//! Domain-separated BLAKE3 hashing for the ai2ai protocol.
//!
//! BLAKE3 is used wherever the protocol needs a fast, keyless hash (agent id
//! derivation) or a derived key tied to a specific purpose (domain
//! separation via BLAKE3's keyed-derivation mode prevents a value computed
//! for one purpose from being reinterpreted as valid for another).
//!
//! ## Modes
//!
//! - [`hash`] — Pure hashing: agent id derivation, content addressing
//! - [`derive_key`] — Key derivation tied to a registered context string

/// Registered BLAKE3 context strings for this protocol. Using an
/// unregistered context string anywhere `derive_key` is called is a defect.
pub mod contexts {
    pub const AGENT_ID: &str = "ai2ai v1 agent-id";
    pub const DEAD_LETTER_ENTRY_ID: &str = "ai2ai v1 dlq-entry-id";

    /// All registered context strings. Used for validation.
    pub const ALL_CONTEXTS: &[&str] = &[AGENT_ID, DEAD_LETTER_ENTRY_ID];
}

/// Compute a BLAKE3 hash of the input data.
pub fn hash(data: &[u8]) -> [u8; 32] {
    *::blake3::hash(data).as_bytes()
}

/// Derive a key using BLAKE3's built-in key derivation mode.
///
/// # Arguments
///
/// * `context` - A registered context string (see [`contexts`])
/// * `key_material` - The input key material
pub fn derive_key(context: &str, key_material: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut hasher = ::blake3::Hasher::new_derive_key(context);
    hasher.update(key_material);
    let hash = hasher.finalize();
    out.copy_from_slice(hash.as_bytes());
    out
}

/// Verify that a context string is registered.
pub fn is_registered_context(context: &str) -> bool {
    contexts::ALL_CONTEXTS.contains(&context)
}
