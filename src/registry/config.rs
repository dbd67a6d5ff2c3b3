//! Configuration for registry lookups

use super::error::RegistryError;
use super::methods::AsnMethod;
use std::time::Duration;

/// Default timeout for a single registry query in milliseconds
pub const DEFAULT_REGISTRY_TIMEOUT_MS: u64 = 5000;
/// Default Team Cymru WHOIS server
pub const DEFAULT_WHOIS_SERVER: &str = "whois.cymru.com:43";
/// Default RIPEstat endpoint used by the HTTP method
pub const DEFAULT_RIPESTAT_URL: &str = "https://stat.ripe.net/data/network-info/data.json";
/// RDAP bootstrap redirector used when the registry is unknown
pub const DEFAULT_RDAP_BOOTSTRAP_URL: &str = "https://rdap.org/ip/";

/// Configuration for [`RdapBackend`](super::RdapBackend)
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// ASN lookup methods, tried in order until one succeeds
    /// (default: dns, whois, http)
    pub asn_methods: Vec<AsnMethod>,
    /// Timeout for each individual query (default: 5000ms)
    pub timeout: Duration,
    /// WHOIS server as `host:port`
    pub whois_server: String,
    /// RIPEstat network-info endpoint
    pub ripestat_url: String,
    /// RDAP URL prefix used when the address's registry is unknown
    pub rdap_bootstrap_url: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            asn_methods: AsnMethod::default_order().to_vec(),
            timeout: Duration::from_millis(DEFAULT_REGISTRY_TIMEOUT_MS),
            whois_server: DEFAULT_WHOIS_SERVER.to_string(),
            ripestat_url: DEFAULT_RIPESTAT_URL.to_string(),
            rdap_bootstrap_url: DEFAULT_RDAP_BOOTSTRAP_URL.to_string(),
        }
    }
}

impl RegistryConfig {
    /// Set the ASN method order, dropping repeated entries
    pub fn with_asn_methods(mut self, methods: impl IntoIterator<Item = AsnMethod>) -> Self {
        let mut ordered = Vec::new();
        for method in methods {
            if !ordered.contains(&method) {
                ordered.push(method);
            }
        }
        self.asn_methods = ordered;
        self
    }

    /// Set the per-query timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the WHOIS server (`host:port`)
    pub fn with_whois_server(mut self, server: impl Into<String>) -> Self {
        self.whois_server = server.into();
        self
    }

    /// Set the RIPEstat endpoint
    pub fn with_ripestat_url(mut self, url: impl Into<String>) -> Self {
        self.ripestat_url = url.into();
        self
    }

    /// Set the RDAP bootstrap URL prefix
    pub fn with_rdap_bootstrap_url(mut self, url: impl Into<String>) -> Self {
        self.rdap_bootstrap_url = url.into();
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), RegistryError> {
        if self.asn_methods.is_empty() {
            return Err(RegistryError::ConfigError(
                "at least one ASN lookup method is required".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(RegistryError::ConfigError(
                "registry timeout must be greater than 0".to_string(),
            ));
        }
        if self.whois_server.is_empty() {
            return Err(RegistryError::ConfigError(
                "WHOIS server must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
