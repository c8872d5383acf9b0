//! Resolves an agent id to an endpoint URL, trying each discovery method in
//! order and caching the first hit.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::dns::DnsClient;
use crate::registry::RegistryClient;
use crate::well_known::WellKnownClient;

const CACHE_TTL: Duration = Duration::hours(1);

/// Extracts the domain portion of an `agent://` id, e.g.
/// `agent://alice.example/path` → `alice.example`.
fn domain_of(agent_id: &str) -> &str {
    let without_scheme = agent_id.rsplit("://").next().unwrap_or(agent_id);
    without_scheme.split('/').next().unwrap_or(without_scheme)
}

pub struct DiscoveryClient {
    dns: DnsClient,
    well_known: WellKnownClient,
    registry: Option<RegistryClient>,
    cache: DashMap<String, (String, DateTime<Utc>)>,
}

impl DiscoveryClient {
    pub fn new(registry_url: Option<String>) -> Self {
        Self {
            dns: DnsClient::new(),
            well_known: WellKnownClient::new(),
            registry: registry_url.map(RegistryClient::new),
            cache: DashMap::new(),
        }
    }

    /// Resolves `agent_id` to an endpoint URL, in order: DNS TXT, DNS SRV,
    /// `/.well-known/ai2ai.json`, then the registry (if configured).
    /// Successful resolutions are cached for an hour.
    pub async fn resolve(&self, agent_id: &str, now: DateTime<Utc>) -> Option<String> {
        if let Some(entry) = self.cache.get(agent_id) {
            if now - entry.1 <= CACHE_TTL {
                return Some(entry.0.clone());
            }
        }

        let domain = domain_of(agent_id);

        if let Some(endpoint) = self.dns.lookup_txt_endpoint(domain).await {
            self.cache.insert(agent_id.to_string(), (endpoint.clone(), now));
            return Some(endpoint);
        }
        if let Some(endpoint) = self.dns.lookup_srv_endpoint(domain).await {
            self.cache.insert(agent_id.to_string(), (endpoint.clone(), now));
            return Some(endpoint);
        }
        if let Some(descriptor) = self.well_known.fetch(domain).await {
            self.cache.insert(agent_id.to_string(), (descriptor.endpoint.clone(), now));
            return Some(descriptor.endpoint);
        }
        if let Some(registry) = &self.registry {
            if let Ok(Some(record)) = registry.get(agent_id).await {
                self.cache.insert(agent_id.to_string(), (record.endpoint.clone(), now));
                return Some(record.endpoint);
            }
        }
        None
    }
}
