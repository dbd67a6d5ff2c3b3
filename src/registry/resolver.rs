//! Hop owner resolution
//!
//! Turns a registry record into the three display fields of a hop. Lookups
//! never fail from the caller's point of view: any field the registries could
//! not provide comes back as [`UNKNOWN`].

use super::backend::{RdapBackend, RegistryBackend, RegistryRecord};
use super::config::RegistryConfig;
use super::error::RegistryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::{debug, warn};

/// Placeholder for any field the registries could not provide
pub const UNKNOWN: &str = "Unknown";

/// Registry sentinel for "no AS announces this address"
const NO_ASN: &str = "NA";

/// AS number, country and provider of an address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsOwner {
    /// AS number or "Unknown"
    pub as_number: String,
    /// Country code or "Unknown"
    pub country: String,
    /// Provider description or "Unknown"
    pub provider: String,
}

impl AsOwner {
    /// The all-"Unknown" triple
    pub fn unknown() -> Self {
        Self {
            as_number: UNKNOWN.to_string(),
            country: UNKNOWN.to_string(),
            provider: UNKNOWN.to_string(),
        }
    }

    /// Whether every field is "Unknown"
    pub fn is_unknown(&self) -> bool {
        self.as_number == UNKNOWN && self.country == UNKNOWN && self.provider == UNKNOWN
    }

    /// Extract the display fields from a registry record
    pub fn from_record(record: &RegistryRecord) -> Self {
        let as_number = match record.asn.trim() {
            "" | NO_ASN => UNKNOWN.to_string(),
            asn => asn.to_string(),
        };

        let country = record
            .network
            .country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(UNKNOWN)
            .to_string();

        let provider = record
            .network
            .remarks
            .first()
            .and_then(|remark| remark.description.as_deref())
            .map(normalize_description)
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| UNKNOWN.to_string());

        Self {
            as_number,
            country,
            provider,
        }
    }
}

impl fmt::Display for AsOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AS{} {} {}", self.as_number, self.country, self.provider)
    }
}

/// Collapse a multi-line registry description onto one line
pub fn normalize_description(description: &str) -> String {
    description
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_string()
}

/// Resolves the owner of hop addresses through a [`RegistryBackend`]
///
/// Cloning is cheap and clones share the backend.
///
/// # Examples
///
/// ```no_run
/// use astrace::registry::{RegistryConfig, RegistryResolver};
/// use std::net::Ipv4Addr;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let resolver = RegistryResolver::new(RegistryConfig::default())?;
/// let owner = resolver.resolve(Ipv4Addr::new(8, 8, 8, 8)).await;
/// println!("AS{} ({}) {}", owner.as_number, owner.country, owner.provider);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RegistryResolver {
    backend: Arc<dyn RegistryBackend>,
}

impl RegistryResolver {
    /// Create a resolver backed by [`RdapBackend`]
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        Ok(Self::with_backend(Arc::new(RdapBackend::new(config)?)))
    }

    /// Create a resolver over a custom backend
    pub fn with_backend(backend: Arc<dyn RegistryBackend>) -> Self {
        Self { backend }
    }

    /// Resolve the owner of `ip`
    ///
    /// Addresses in special-purpose blocks resolve to [`AsOwner::unknown`]
    /// without further lookups. Any other registry failure is logged and
    /// also degrades to [`AsOwner::unknown`].
    pub async fn resolve(&self, ip: Ipv4Addr) -> AsOwner {
        match self.backend.lookup(ip).await {
            Ok(record) => AsOwner::from_record(&record),
            Err(e) if e.is_address_defined() => {
                debug!(%ip, reason = %e, "address has no registry owner");
                AsOwner::unknown()
            }
            Err(e) => {
                warn!(%ip, error = %e, "registry lookup failed");
                AsOwner::unknown()
            }
        }
    }
}

impl fmt::Debug for RegistryResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryResolver").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::rdap::{NetworkRecord, Remark};
    use async_trait::async_trait;

    struct FixedBackend(fn(Ipv4Addr) -> Result<RegistryRecord, RegistryError>);

    #[async_trait]
    impl RegistryBackend for FixedBackend {
        async fn lookup(&self, ip: Ipv4Addr) -> Result<RegistryRecord, RegistryError> {
            (self.0)(ip)
        }
    }

    fn fixed(f: fn(Ipv4Addr) -> Result<RegistryRecord, RegistryError>) -> RegistryResolver {
        RegistryResolver::with_backend(Arc::new(FixedBackend(f)))
    }

    #[tokio::test]
    async fn test_google_record() {
        let resolver = fixed(|_| {
            Ok(RegistryRecord {
                asn: "15169".to_string(),
                network: NetworkRecord {
                    country: Some("US".to_string()),
                    remarks: vec![Remark {
                        title: None,
                        description: Some("Google\nLLC".to_string()),
                    }],
                    ..NetworkRecord::default()
                },
                ..RegistryRecord::default()
            })
        });

        let owner = resolver.resolve(Ipv4Addr::new(8, 8, 8, 8)).await;
        assert_eq!(owner.as_number, "15169");
        assert_eq!(owner.country, "US");
        assert_eq!(owner.provider, "Google LLC");
    }

    #[tokio::test]
    async fn test_na_record_is_unknown() {
        let resolver = fixed(|_| {
            Ok(RegistryRecord {
                asn: "NA".to_string(),
                network: NetworkRecord {
                    country: Some(String::new()),
                    ..NetworkRecord::default()
                },
                ..RegistryRecord::default()
            })
        });

        let owner = resolver.resolve(Ipv4Addr::new(45, 0, 0, 1)).await;
        assert_eq!(owner, AsOwner::unknown());
        assert!(owner.is_unknown());
    }

    #[tokio::test]
    async fn test_address_defined_is_unknown() {
        let resolver = fixed(|ip| {
            Err(RegistryError::AddressDefined {
                address: ip,
                name: "Private-Use Networks",
            })
        });
        let owner = resolver.resolve(Ipv4Addr::new(192, 168, 1, 1)).await;
        assert_eq!(owner, AsOwner::unknown());
    }

    #[tokio::test]
    async fn test_lookup_failure_is_unknown() {
        let resolver = fixed(|_| Err(RegistryError::Timeout));
        let owner = resolver.resolve(Ipv4Addr::new(1, 1, 1, 1)).await;
        assert_eq!(owner, AsOwner::unknown());

        let resolver =
            fixed(|_| Err(RegistryError::AsnLookupFailed("dns: SERVFAIL".to_string())));
        let owner = resolver.resolve(Ipv4Addr::new(1, 1, 1, 1)).await;
        assert_eq!(owner, AsOwner::unknown());
    }

    #[tokio::test]
    async fn test_private_address_with_real_backend() {
        let config = RegistryConfig::default()
            .with_whois_server("127.0.0.1:1")
            .with_ripestat_url("http://127.0.0.1:1/")
            .with_rdap_bootstrap_url("http://127.0.0.1:1/ip/");
        let resolver = RegistryResolver::new(config).unwrap();
        let owner = resolver.resolve(Ipv4Addr::new(192, 168, 1, 1)).await;
        assert_eq!(owner, AsOwner::unknown());
    }

    #[test]
    fn test_asn_kept_when_network_missing() {
        let record = RegistryRecord {
            asn: "13238".to_string(),
            ..RegistryRecord::default()
        };
        let owner = AsOwner::from_record(&record);
        assert_eq!(owner.as_number, "13238");
        assert_eq!(owner.country, UNKNOWN);
        assert_eq!(owner.provider, UNKNOWN);
    }

    #[test]
    fn test_only_first_remark_used() {
        let record = RegistryRecord {
            asn: "3356".to_string(),
            network: NetworkRecord {
                remarks: vec![
                    Remark {
                        title: None,
                        description: Some("  Level 3 Parent, LLC \r\n".to_string()),
                    },
                    Remark {
                        title: None,
                        description: Some("ignored".to_string()),
                    },
                ],
                ..NetworkRecord::default()
            },
            ..RegistryRecord::default()
        };
        assert_eq!(AsOwner::from_record(&record).provider, "Level 3 Parent, LLC");
    }

    #[test]
    fn test_blank_description_is_unknown() {
        let record = RegistryRecord {
            asn: "64512".to_string(),
            network: NetworkRecord {
                remarks: vec![Remark {
                    title: Some("remarks".to_string()),
                    description: Some(" \n ".to_string()),
                }],
                ..NetworkRecord::default()
            },
            ..RegistryRecord::default()
        };
        assert_eq!(AsOwner::from_record(&record).provider, UNKNOWN);
    }

    #[test]
    fn test_normalize_description() {
        assert_eq!(normalize_description("Google\nLLC"), "Google LLC");
        assert_eq!(normalize_description(" a\r\nb\n"), "a b");
    }
}
