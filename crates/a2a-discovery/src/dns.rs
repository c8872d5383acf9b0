//! DNS-based peer discovery: `_ai2ai.<domain>` TXT records and
//! `_ai2ai._tcp.<domain>` SRV records.

use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;

pub struct DnsClient {
    resolver: TokioAsyncResolver,
}

impl DnsClient {
    /// Uses the system resolver configuration (`/etc/resolv.conf` on unix),
    /// falling back to `ResolverConfig::default()` (a set of public
    /// resolvers) if the system config can't be read.
    pub fn new() -> Self {
        let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());
        Self { resolver }
    }

    /// Looks up `_ai2ai.<domain>` and extracts the endpoint from a
    /// `endpoint=<url>` or legacy `ai2ai=<url>` TXT value.
    pub async fn lookup_txt_endpoint(&self, domain: &str) -> Option<String> {
        let name = format!("_ai2ai.{domain}");
        let response = self.resolver.txt_lookup(&name).await.ok()?;
        for record in response.iter() {
            let value: String = record.txt_data().iter().map(|chunk| String::from_utf8_lossy(chunk)).collect();
            if let Some(endpoint) = parse_txt_value(&value) {
                return Some(endpoint);
            }
        }
        None
    }

    /// Looks up `_ai2ai._tcp.<domain>` and builds an HTTPS endpoint from the
    /// first SRV target and port.
    pub async fn lookup_srv_endpoint(&self, domain: &str) -> Option<String> {
        let name = format!("_ai2ai._tcp.{domain}");
        let response = self.resolver.srv_lookup(&name).await.ok()?;
        let srv = response.iter().next()?;
        let target = srv.target().to_utf8();
        let target = target.trim_end_matches('.');
        Some(format!("https://{target}:{}/ai2ai", srv.port()))
    }
}

impl Default for DnsClient {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_txt_value(value: &str) -> Option<String> {
    for pair in value.split(';') {
        let pair = pair.trim();
        if let Some(endpoint) = pair.strip_prefix("endpoint=") {
            return Some(endpoint.to_string());
        }
        if let Some(endpoint) = pair.strip_prefix("ai2ai=") {
            return Some(endpoint.to_string());
        }
    }
    None
}
