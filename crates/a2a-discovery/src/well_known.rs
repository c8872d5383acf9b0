//! Fetches a peer's `/.well-known/ai2ai.json` discovery descriptor.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The descriptor served at `/.well-known/ai2ai.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WellKnownDescriptor {
    pub ai2ai: String,
    pub endpoint: String,
    pub agent: String,
    pub human: String,
    #[serde(rename = "publicKey")]
    pub public_key: String,
    pub fingerprint: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

pub struct WellKnownClient {
    http: reqwest::Client,
}

impl WellKnownClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Fetches `https://<domain>/.well-known/ai2ai.json`. Returns `None` on
    /// any network, status, or parse failure rather than propagating an
    /// error — discovery methods are tried in sequence and a miss here just
    /// falls through to the next one.
    pub async fn fetch(&self, domain: &str) -> Option<WellKnownDescriptor> {
        let url = format!("https://{domain}/.well-known/ai2ai.json");
        let response = self.http.get(&url).timeout(FETCH_TIMEOUT).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.json::<WellKnownDescriptor>().await.ok()
    }
}

impl Default for WellKnownClient {
    fn default() -> Self {
        Self::new()
    }
}
