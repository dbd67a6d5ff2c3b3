//! Registry lookup transport

use super::config::RegistryConfig;
use super::error::RegistryError;
use super::methods::{self, AsnMethod, AsnRecord};
use super::rdap::{self, NetworkRecord};
use super::reserved::reserved_block;
use async_trait::async_trait;
use hickory_resolver::TokioResolver;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::net::Ipv4Addr;
use std::time::Duration;
use tracing::{debug, warn};

/// Everything the registries told us about one address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryRecord {
    /// Origin AS number, or "NA"
    pub asn: String,
    /// Announced prefix
    pub asn_cidr: Option<String>,
    /// Country the AS is registered in
    pub asn_country_code: Option<String>,
    /// Registry holding the address
    pub asn_registry: Option<String>,
    /// AS description
    pub asn_description: Option<String>,
    /// RDAP network object
    pub network: NetworkRecord,
}

impl RegistryRecord {
    fn from_parts(asn: AsnRecord, network: NetworkRecord) -> Self {
        Self {
            asn: asn.asn,
            asn_cidr: asn.cidr,
            asn_country_code: asn.country,
            asn_registry: asn.registry,
            asn_description: asn.description,
            network,
        }
    }
}

/// Maps an address to its registry record
///
/// Implementations must report addresses from special-purpose blocks as
/// [`RegistryError::AddressDefined`] rather than as a lookup failure.
#[async_trait]
pub trait RegistryBackend: Send + Sync {
    /// Look up registry data for `ip`
    async fn lookup(&self, ip: Ipv4Addr) -> Result<RegistryRecord, RegistryError>;
}

/// Try each method in order and return the first successful record
pub async fn first_success<F, Fut>(
    methods: &[AsnMethod],
    mut attempt: F,
) -> Result<AsnRecord, RegistryError>
where
    F: FnMut(AsnMethod) -> Fut,
    Fut: Future<Output = Result<AsnRecord, RegistryError>>,
{
    let mut failures = Vec::with_capacity(methods.len());
    for &method in methods {
        match attempt(method).await {
            Ok(record) => {
                debug!(%method, asn = %record.asn, "ASN lookup succeeded");
                return Ok(record);
            }
            Err(e) => {
                debug!(%method, error = %e, "ASN lookup method failed");
                failures.push(format!("{method}: {e}"));
            }
        }
    }
    Err(RegistryError::AsnLookupFailed(if failures.is_empty() {
        "no methods configured".to_string()
    } else {
        failures.join("; ")
    }))
}

async fn with_timeout<T>(
    timeout: Duration,
    fut: impl Future<Output = Result<T, RegistryError>>,
) -> Result<T, RegistryError> {
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| RegistryError::Timeout)?
}

/// Production backend: ASN origin via DNS/WHOIS/HTTP, then RDAP
///
/// Holds no per-lookup state, so one instance can serve any number of
/// concurrent lookups.
#[derive(Debug)]
pub struct RdapBackend {
    config: RegistryConfig,
    resolver: TokioResolver,
    client: reqwest::Client,
}

impl RdapBackend {
    /// Create a backend from configuration
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        Self::with_resolver(config, methods::create_default_resolver())
    }

    /// Create a backend with a specific DNS resolver
    pub fn with_resolver(
        config: RegistryConfig,
        resolver: TokioResolver,
    ) -> Result<Self, RegistryError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("astrace/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| RegistryError::Http(e.to_string()))?;

        Ok(Self {
            config,
            resolver,
            client,
        })
    }

    /// The configuration this backend was built with
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    async fn lookup_asn(&self, ip: Ipv4Addr) -> Result<AsnRecord, RegistryError> {
        first_success(&self.config.asn_methods, |method| async move {
            let timeout = self.config.timeout;
            match method {
                AsnMethod::Dns => {
                    with_timeout(timeout, methods::lookup_dns(ip, &self.resolver)).await
                }
                AsnMethod::Whois => {
                    with_timeout(timeout, methods::lookup_whois(ip, &self.config.whois_server))
                        .await
                }
                AsnMethod::Http => {
                    with_timeout(
                        timeout,
                        methods::lookup_http(ip, &self.client, &self.config.ripestat_url),
                    )
                    .await
                }
            }
        })
        .await
    }
}

#[async_trait]
impl RegistryBackend for RdapBackend {
    async fn lookup(&self, ip: Ipv4Addr) -> Result<RegistryRecord, RegistryError> {
        if let Some(name) = reserved_block(ip) {
            return Err(RegistryError::AddressDefined { address: ip, name });
        }

        let asn = self.lookup_asn(ip).await?;

        let url = rdap::network_url(
            ip,
            asn.registry.as_deref(),
            &self.config.rdap_bootstrap_url,
        );
        let network = match with_timeout(
            self.config.timeout,
            rdap::lookup_network(&self.client, &url),
        )
        .await
        {
            Ok(network) => network,
            Err(e) => {
                warn!(%ip, %url, error = %e, "RDAP network lookup failed, keeping ASN only");
                NetworkRecord::default()
            }
        };

        Ok(RegistryRecord::from_parts(asn, network))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(asn: &str) -> AsnRecord {
        AsnRecord {
            asn: asn.to_string(),
            ..AsnRecord::default()
        }
    }

    #[tokio::test]
    async fn test_first_success_stops_at_first_hit() {
        let mut tried = Vec::new();
        let result = first_success(AsnMethod::default_order(), |method| {
            tried.push(method);
            async move {
                match method {
                    AsnMethod::Dns => Err(RegistryError::Dns("SERVFAIL".to_string())),
                    _ => Ok(record("15169")),
                }
            }
        })
        .await;

        assert_eq!(result.unwrap().asn, "15169");
        assert_eq!(tried, vec![AsnMethod::Dns, AsnMethod::Whois]);
    }

    #[tokio::test]
    async fn test_first_success_respects_configured_order() {
        let mut tried = Vec::new();
        let result = first_success(&[AsnMethod::Http, AsnMethod::Dns], |method| {
            tried.push(method);
            async move { Ok(record(method.as_str())) }
        })
        .await;

        assert_eq!(result.unwrap().asn, "http");
        assert_eq!(tried, vec![AsnMethod::Http]);
    }

    #[tokio::test]
    async fn test_first_success_exhausted() {
        let result = first_success(AsnMethod::default_order(), |method| async move {
            Err::<AsnRecord, _>(RegistryError::InvalidFormat(method.to_string()))
        })
        .await;

        match result {
            Err(RegistryError::AsnLookupFailed(msg)) => {
                assert!(msg.contains("dns:"));
                assert!(msg.contains("whois:"));
                assert!(msg.contains("http:"));
            }
            other => panic!("Expected AsnLookupFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_with_timeout_expires() {
        let result: Result<(), _> = with_timeout(Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(RegistryError::Timeout)));
    }

    #[tokio::test]
    async fn test_reserved_address_short_circuits() {
        // Endpoints that cannot answer: reaching any of them would fail the
        // lookup with something other than AddressDefined
        let config = RegistryConfig::default()
            .with_whois_server("127.0.0.1:1")
            .with_ripestat_url("http://127.0.0.1:1/")
            .with_rdap_bootstrap_url("http://127.0.0.1:1/ip/");
        let backend = RdapBackend::new(config).unwrap();
        assert_eq!(backend.config().whois_server, "127.0.0.1:1");

        for ip in ["192.168.1.1", "10.0.0.1", "127.0.0.1", "100.64.1.1"] {
            let ip: Ipv4Addr = ip.parse().unwrap();
            match backend.lookup(ip).await {
                Err(e @ RegistryError::AddressDefined { address, .. }) => {
                    assert_eq!(address, ip);
                    assert!(e.is_address_defined());
                }
                other => panic!("Expected AddressDefined for {ip}, got {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let config = RegistryConfig::default().with_asn_methods([]);
        assert!(matches!(
            RdapBackend::new(config),
            Err(RegistryError::ConfigError(_))
        ));
    }
}
