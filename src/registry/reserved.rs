//! IPv4 special-purpose address blocks
//!
//! Addresses in these blocks are never allocated to an organisation, so a
//! registry lookup for them is pointless.

use ipnet::Ipv4Net;
use once_cell::sync::Lazy;
use std::net::Ipv4Addr;

const RESERVED_BLOCKS: &[(&str, &str)] = &[
    ("0.0.0.0/8", "\"This\" Network"),
    ("10.0.0.0/8", "Private-Use Networks"),
    ("100.64.0.0/10", "Shared Address Space"),
    ("127.0.0.0/8", "Loopback"),
    ("169.254.0.0/16", "Link Local"),
    ("172.16.0.0/12", "Private-Use Networks"),
    ("192.0.0.0/24", "IETF Protocol Assignments"),
    ("192.0.2.0/24", "TEST-NET-1"),
    ("192.88.99.0/24", "6to4 Relay Anycast"),
    ("192.168.0.0/16", "Private-Use Networks"),
    ("198.18.0.0/15", "Network Interconnect Device Benchmark Testing"),
    ("198.51.100.0/24", "TEST-NET-2"),
    ("203.0.113.0/24", "TEST-NET-3"),
    ("224.0.0.0/4", "Multicast"),
    ("255.255.255.255/32", "Limited Broadcast"),
    ("240.0.0.0/4", "Reserved for Future Use"),
];

static RESERVED_NETS: Lazy<Vec<(Ipv4Net, &'static str)>> = Lazy::new(|| {
    RESERVED_BLOCKS
        .iter()
        .filter_map(|(cidr, name)| cidr.parse::<Ipv4Net>().ok().map(|net| (net, *name)))
        .collect()
});

/// Name of the special-purpose block containing `ip`, if any.
pub fn reserved_block(ip: Ipv4Addr) -> Option<&'static str> {
    RESERVED_NETS
        .iter()
        .find(|(net, _)| net.contains(&ip))
        .map(|(_, name)| *name)
}
