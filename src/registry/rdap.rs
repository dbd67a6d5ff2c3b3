//! RDAP network lookups
//!
//! The ASN lookup tells us which regional registry holds the address; the
//! registry's RDAP service then describes the network block itself.

use super::error::RegistryError;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// One remark attached to an RDAP network object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remark {
    /// Remark title, if any
    pub title: Option<String>,
    /// Remark text, lines joined with `\n`
    pub description: Option<String>,
}

/// The parts of an RDAP IP network object we care about
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRecord {
    /// Registry handle (e.g. "NET-8-8-8-0-2")
    pub handle: Option<String>,
    /// Network name (e.g. "GOGL")
    pub name: Option<String>,
    /// Registered country code
    pub country: Option<String>,
    /// Remarks in registry order
    pub remarks: Vec<Remark>,
}

#[derive(Debug, Deserialize)]
struct RdapNetwork {
    handle: Option<String>,
    name: Option<String>,
    country: Option<String>,
    #[serde(default)]
    remarks: Vec<RdapRemark>,
}

#[derive(Debug, Deserialize)]
struct RdapRemark {
    title: Option<String>,
    #[serde(default)]
    description: Vec<String>,
}

impl From<RdapNetwork> for NetworkRecord {
    fn from(network: RdapNetwork) -> Self {
        Self {
            handle: network.handle,
            name: network.name,
            country: network.country.filter(|c| !c.trim().is_empty()),
            remarks: network
                .remarks
                .into_iter()
                .map(|remark| Remark {
                    title: remark.title,
                    description: if remark.description.is_empty() {
                        None
                    } else {
                        Some(remark.description.join("\n"))
                    },
                })
                .collect(),
        }
    }
}

/// Parse an RDAP `ip network` JSON object
pub fn parse_network(body: &str) -> Result<NetworkRecord, RegistryError> {
    let network: RdapNetwork =
        serde_json::from_str(body).map_err(|e| RegistryError::InvalidFormat(e.to_string()))?;
    Ok(network.into())
}

/// RDAP base URL of a regional registry, by its Team Cymru name
pub fn rir_base_url(registry: &str) -> Option<&'static str> {
    match registry.to_ascii_lowercase().as_str() {
        "arin" => Some("https://rdap.arin.net/registry/ip/"),
        "ripencc" => Some("https://rdap.db.ripe.net/ip/"),
        "apnic" => Some("https://rdap.apnic.net/ip/"),
        "lacnic" => Some("https://rdap.lacnic.net/rdap/ip/"),
        "afrinic" => Some("https://rdap.afrinic.net/rdap/ip/"),
        _ => None,
    }
}

/// The RDAP URL to query for `ip`
pub fn network_url(ip: Ipv4Addr, registry: Option<&str>, bootstrap_url: &str) -> String {
    let base = registry.and_then(rir_base_url).unwrap_or(bootstrap_url);
    format!("{base}{ip}")
}

/// Fetch the RDAP network object for `ip`
pub async fn lookup_network(
    client: &reqwest::Client,
    url: &str,
) -> Result<NetworkRecord, RegistryError> {
    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT, "application/rdap+json")
        .send()
        .await
        .map_err(|e| RegistryError::Rdap(e.to_string()))?;

    if !response.status().is_success() {
        return Err(RegistryError::Rdap(format!(
            "{url} returned {}",
            response.status()
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| RegistryError::Rdap(e.to_string()))?;
    parse_network(&body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_network_with_remarks() {
        let body = r#"{
            "objectClassName": "ip network",
            "handle": "NET-8-8-8-0-2",
            "name": "GOGL",
            "country": "US",
            "remarks": [
                {"title": "description", "description": ["Google", "LLC"]},
                {"description": ["second remark"]}
            ]
        }"#;
        let network = parse_network(body).unwrap();
        assert_eq!(network.handle.as_deref(), Some("NET-8-8-8-0-2"));
        assert_eq!(network.country.as_deref(), Some("US"));
        assert_eq!(network.remarks.len(), 2);
        assert_eq!(
            network.remarks[0].description.as_deref(),
            Some("Google\nLLC")
        );
        assert_eq!(network.remarks[1].title, None);
    }

    #[test]
    fn test_parse_network_minimal() {
        let network = parse_network(r#"{"handle": "X", "country": ""}"#).unwrap();
        assert_eq!(network.country, None);
        assert!(network.remarks.is_empty());
    }

    #[test]
    fn test_parse_network_remark_without_description() {
        let network = parse_network(r#"{"remarks": [{"title": "empty"}]}"#).unwrap();
        assert_eq!(network.remarks[0].description, None);
    }

    #[test]
    fn test_parse_network_invalid() {
        assert!(matches!(
            parse_network("not json"),
            Err(RegistryError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_network_url_by_registry() {
        let ip = Ipv4Addr::new(77, 88, 8, 8);
        assert_eq!(
            network_url(ip, Some("ripencc"), "https://rdap.org/ip/"),
            "https://rdap.db.ripe.net/ip/77.88.8.8"
        );
        assert_eq!(
            network_url(ip, Some("ARIN"), "https://rdap.org/ip/"),
            "https://rdap.arin.net/registry/ip/77.88.8.8"
        );
        assert_eq!(
            network_url(ip, None, "https://rdap.org/ip/"),
            "https://rdap.org/ip/77.88.8.8"
        );
        assert_eq!(
            network_url(ip, Some("unknown"), "http://127.0.0.1:1/ip/"),
            "http://127.0.0.1:1/ip/77.88.8.8"
        );
    }
}
