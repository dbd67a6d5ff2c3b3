//! Error types for registry lookups

use std::net::Ipv4Addr;
use thiserror::Error;

/// Errors that can occur while looking up registry data for an address
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The address belongs to a special-purpose block and has no registry owner
    ///
    /// This is the expected outcome for private-network hops, not a failure.
    #[error("{address} is defined as {name}")]
    AddressDefined {
        /// The queried address
        address: Ipv4Addr,
        /// Name of the special-purpose block (e.g. "Private-Use Networks")
        name: &'static str,
    },

    /// DNS query failed
    #[error("DNS lookup failed: {0}")]
    Dns(String),

    /// WHOIS query failed
    #[error("WHOIS lookup failed: {0}")]
    Whois(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The registry answered with something we could not parse
    #[error("Invalid registry response: {0}")]
    InvalidFormat(String),

    /// A lookup method did not answer in time
    #[error("Registry lookup timed out")]
    Timeout,

    /// Every configured ASN lookup method failed
    #[error("All ASN lookup methods failed: {0}")]
    AsnLookupFailed(String),

    /// RDAP network lookup failed
    #[error("RDAP lookup failed: {0}")]
    Rdap(String),

    /// Invalid registry configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl RegistryError {
    /// Whether the address has no registry owner by definition
    pub fn is_address_defined(&self) -> bool {
        matches!(self, RegistryError::AddressDefined { .. })
    }
}

impl From<reqwest::Error> for RegistryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RegistryError::Timeout
        } else {
            RegistryError::Http(e.to_string())
        }
    }
}
