//! ASN origin lookup methods
//!
//! Each method answers the same question (which AS announces this address)
//! through a different service:
//!
//! * `Dns` - Team Cymru's `origin.asn.cymru.com` TXT records
//! * `Whois` - Team Cymru's WHOIS server on port 43
//! * `Http` - RIPEstat's `network-info` JSON API

use super::error::RegistryError;
use hickory_resolver::config::ResolverConfig;
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// A way of finding the origin AS of an address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AsnMethod {
    /// Team Cymru DNS TXT lookup
    Dns,
    /// Team Cymru WHOIS lookup
    Whois,
    /// RIPEstat HTTP lookup
    Http,
}

impl AsnMethod {
    /// The default fallback order: dns, then whois, then http
    pub fn default_order() -> &'static [AsnMethod] {
        &[AsnMethod::Dns, AsnMethod::Whois, AsnMethod::Http]
    }

    /// Short lowercase name of the method
    pub fn as_str(&self) -> &'static str {
        match self {
            AsnMethod::Dns => "dns",
            AsnMethod::Whois => "whois",
            AsnMethod::Http => "http",
        }
    }
}

impl fmt::Display for AsnMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AsnMethod {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dns" => Ok(AsnMethod::Dns),
            "whois" => Ok(AsnMethod::Whois),
            "http" => Ok(AsnMethod::Http),
            other => Err(RegistryError::ConfigError(format!(
                "unknown ASN lookup method '{other}' (expected dns, whois or http)"
            ))),
        }
    }
}

/// Result of one ASN origin lookup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AsnRecord {
    /// Origin AS number, or "NA" when the address is not announced
    pub asn: String,
    /// Announced prefix (e.g. "8.8.8.0/24")
    pub cidr: Option<String>,
    /// Country code the AS is registered in
    pub country: Option<String>,
    /// Lowercase registry name (arin, ripencc, apnic, lacnic, afrinic)
    pub registry: Option<String>,
    /// AS description (e.g. "GOOGLE, US")
    pub description: Option<String>,
}

/// Build the Team Cymru origin query name for an address
pub fn form_dns_query(ip: Ipv4Addr) -> String {
    let octets = ip.octets();
    format!(
        "{}.{}.{}.{}.origin.asn.cymru.com",
        octets[3], octets[2], octets[1], octets[0]
    )
}

fn non_empty(field: Option<&&str>) -> Option<String> {
    field
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Parse an origin TXT answer: `ASN | prefix | CC | registry | allocated`
///
/// Multi-origin prefixes list several space-separated AS numbers; the first
/// one is kept.
pub fn parse_origin_txt(txt: &str) -> Result<AsnRecord, RegistryError> {
    let txt = txt.trim().trim_matches('"');
    let parts: Vec<&str> = txt.split('|').map(str::trim).collect();
    if parts.len() < 3 {
        return Err(RegistryError::InvalidFormat(txt.to_string()));
    }
    let asn = parts[0]
        .split_whitespace()
        .next()
        .ok_or_else(|| RegistryError::InvalidFormat(txt.to_string()))?;

    Ok(AsnRecord {
        asn: asn.to_string(),
        cidr: non_empty(parts.get(1)),
        country: non_empty(parts.get(2)),
        registry: non_empty(parts.get(3)).map(|r| r.to_ascii_lowercase()),
        description: None,
    })
}

/// Parse an AS name TXT answer: `ASN | CC | registry | allocated | name`
pub fn parse_as_name_txt(txt: &str) -> Option<String> {
    let txt = txt.trim().trim_matches('"');
    let parts: Vec<&str> = txt.split('|').map(str::trim).collect();
    non_empty(parts.get(4))
}

/// Parse a verbose Team Cymru WHOIS answer
///
/// ```text
/// AS      | IP               | BGP Prefix          | CC | Registry | Allocated  | AS Name
/// 15169   | 8.8.8.8          | 8.8.8.0/24          | US | arin     | 2023-12-28 | GOOGLE, US
/// ```
pub fn parse_whois_response(response: &str) -> Result<AsnRecord, RegistryError> {
    let line = response
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .find(|l| !l.starts_with("AS ") && !l.starts_with("AS|") && !l.starts_with("Bulk mode"))
        .ok_or_else(|| RegistryError::InvalidFormat("empty WHOIS response".to_string()))?;

    if line.starts_with("Error") {
        return Err(RegistryError::Whois(line.to_string()));
    }

    let parts: Vec<&str> = line.split('|').map(str::trim).collect();
    if parts.len() < 5 || parts[0].is_empty() {
        return Err(RegistryError::InvalidFormat(line.to_string()));
    }

    Ok(AsnRecord {
        asn: parts[0].to_string(),
        cidr: non_empty(parts.get(2)).filter(|c| c != "NA"),
        country: non_empty(parts.get(3)),
        registry: non_empty(parts.get(4)).map(|r| r.to_ascii_lowercase()),
        description: non_empty(parts.get(6)).filter(|d| d != "NA"),
    })
}

#[derive(Debug, Deserialize)]
struct RipeStatResponse {
    data: RipeStatNetworkInfo,
}

#[derive(Debug, Deserialize)]
struct RipeStatNetworkInfo {
    #[serde(default)]
    asns: Vec<String>,
    prefix: Option<String>,
}

/// Parse a RIPEstat `network-info` JSON body
pub fn parse_ripestat_response(body: &str) -> Result<AsnRecord, RegistryError> {
    let response: RipeStatResponse =
        serde_json::from_str(body).map_err(|e| RegistryError::InvalidFormat(e.to_string()))?;
    let asn = response
        .data
        .asns
        .into_iter()
        .next()
        .unwrap_or_else(|| "NA".to_string());

    Ok(AsnRecord {
        asn,
        cidr: response.data.prefix.filter(|p| !p.is_empty()),
        ..AsnRecord::default()
    })
}

fn join_txt(record: &hickory_resolver::proto::rr::rdata::TXT) -> String {
    record
        .iter()
        .map(|data| String::from_utf8_lossy(data))
        .collect::<Vec<_>>()
        .join("")
}

/// Look up the origin AS through Team Cymru DNS
pub async fn lookup_dns(
    ip: Ipv4Addr,
    resolver: &TokioResolver,
) -> Result<AsnRecord, RegistryError> {
    let lookup = resolver
        .txt_lookup(form_dns_query(ip))
        .await
        .map_err(|e| RegistryError::Dns(e.to_string()))?;

    let record = lookup
        .iter()
        .next()
        .ok_or_else(|| RegistryError::Dns("empty TXT answer".to_string()))?;
    let mut asn_record = parse_origin_txt(&join_txt(record))?;

    // The AS name is a separate query; losing it only loses the description
    if asn_record.asn != "NA" {
        let as_query = format!("AS{}.asn.cymru.com", asn_record.asn);
        if let Ok(as_lookup) = resolver.txt_lookup(as_query).await {
            asn_record.description = as_lookup
                .iter()
                .next()
                .and_then(|r| parse_as_name_txt(&join_txt(r)));
        }
    }

    Ok(asn_record)
}

/// Look up the origin AS through Team Cymru WHOIS
pub async fn lookup_whois(ip: Ipv4Addr, server: &str) -> Result<AsnRecord, RegistryError> {
    let mut stream = TcpStream::connect(server)
        .await
        .map_err(|e| RegistryError::Whois(format!("connect to {server}: {e}")))?;

    stream
        .write_all(format!(" -v {ip}\r\n").as_bytes())
        .await
        .map_err(|e| RegistryError::Whois(e.to_string()))?;

    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .await
        .map_err(|e| RegistryError::Whois(e.to_string()))?;

    parse_whois_response(&String::from_utf8_lossy(&response))
}

/// Look up the origin AS through RIPEstat
pub async fn lookup_http(
    ip: Ipv4Addr,
    client: &reqwest::Client,
    url: &str,
) -> Result<AsnRecord, RegistryError> {
    let body = client
        .get(url)
        .query(&[("resource", ip.to_string())])
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;

    parse_ripestat_response(&body)
}

/// Create the DNS resolver used for Team Cymru queries
pub fn create_default_resolver() -> TokioResolver {
    TokioResolver::builder_with_config(
        ResolverConfig::cloudflare(),
        TokioConnectionProvider::default(),
    )
    .build()
}
