//! Extraction of hop addresses from path-discovery output lines
//!
//! The discovery utility prints one line per hop in a layout that depends on
//! the platform and on the console locale. Only ASCII digits, dots and
//! whitespace matter here, so lines decoded lossily from any code page parse
//! the same way.

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// Where the hop address sits in a line of discovery output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LineFormat {
    /// Address is the last whitespace-delimited token (Windows `tracert -d`)
    #[default]
    LastToken,
    /// Hop index followed by the address (`traceroute -n -q 1`)
    HopColumn,
}

/// Extract the hop address from a `tracert`-style line.
///
/// Returns `None` for lines that carry no address, such as headers and
/// timeout markers. These are expected and are not errors.
///
/// ```
/// use astrace::parser::extract_ipv4;
/// use std::net::Ipv4Addr;
///
/// let line = "  2    10 ms    <1 ms    <1 ms  192.168.1.1\r\n";
/// assert_eq!(extract_ipv4(line), Some(Ipv4Addr::new(192, 168, 1, 1)));
/// assert_eq!(extract_ipv4("  3     *        *        *     Request timed out."), None);
/// ```
pub fn extract_ipv4(line: &str) -> Option<Ipv4Addr> {
    extract_ipv4_with(LineFormat::LastToken, line)
}

/// Extract the hop address from a line laid out as `format`.
pub fn extract_ipv4_with(format: LineFormat, line: &str) -> Option<Ipv4Addr> {
    let mut tokens = line.split_whitespace();
    match format {
        LineFormat::LastToken => tokens.next_back().and_then(parse_ipv4_token),
        LineFormat::HopColumn => {
            tokens.next()?.parse::<u8>().ok()?;
            tokens.next().and_then(parse_ipv4_token)
        }
    }
}

/// The discovery tool's own hop number, taken from the first column.
pub fn hop_index(line: &str) -> Option<u8> {
    line.split_whitespace().next()?.parse().ok()
}

/// Validate a dotted-quad token.
///
/// Each of the four segments must be ASCII digits with a value in 0..=255.
/// Zero padding is accepted, so `"010.001.0.1"` parses as `10.1.0.1`, which
/// `Ipv4Addr::from_str` would reject.
pub fn parse_ipv4_token(token: &str) -> Option<Ipv4Addr> {
    let mut octets = [0u8; 4];
    let mut segments = token.split('.');
    for octet in &mut octets {
        *octet = parse_octet(segments.next()?)?;
    }
    if segments.next().is_some() {
        return None;
    }
    Some(Ipv4Addr::from(octets))
}

fn parse_octet(segment: &str) -> Option<u8> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let significant = segment.trim_start_matches('0');
    if significant.len() > 3 {
        return None;
    }
    if significant.is_empty() {
        return Some(0);
    }
    significant.parse::<u16>().ok()?.try_into().ok()
}
