//! Tests for argument handling in main.rs

use super::*;

#[test]
fn test_parse_target_ipv4() {
    assert_eq!(parse_target("8.8.8.8").unwrap(), "8.8.8.8");
    assert_eq!(parse_target(" 192.168.1.1 ").unwrap(), "192.168.1.1");
}

#[test]
fn test_parse_target_hostname() {
    assert_eq!(parse_target("example.com").unwrap(), "example.com");
    assert_eq!(parse_target("one-one.one").unwrap(), "one-one.one");
    assert_eq!(parse_target("localhost").unwrap(), "localhost");
}

#[test]
fn test_parse_target_rejects_invalid() {
    assert!(parse_target("").is_err());
    assert!(parse_target("   ").is_err());
    assert!(parse_target("256.1.1.1").is_err());
    assert!(parse_target("1.2.3").is_err());
    assert!(parse_target("::1").is_err());
    assert!(parse_target("-d").is_err());
    assert!(parse_target("bad host").is_err());
    assert!(parse_target("a..b").is_err());
    assert!(parse_target("evil;rm").is_err());
}

#[test]
fn test_default_args() {
    let args = Args::try_parse_from(["astrace", "8.8.8.8"]).unwrap();
    assert_eq!(args.address, "8.8.8.8");
    assert_eq!(
        args.asn_methods,
        vec![AsnMethodArg::Dns, AsnMethodArg::Whois, AsnMethodArg::Http]
    );
    assert_eq!(args.wait_ms, 500);
    assert_eq!(args.registry_timeout_ms, 5000);
    assert!(args.program.is_none());
    assert!(args.limit.is_none());
    assert!(!args.json);
    assert_eq!(args.verbose, 0);
}

#[test]
fn test_asn_methods_order() {
    let args =
        Args::try_parse_from(["astrace", "--asn-methods", "http,dns", "8.8.8.8"]).unwrap();
    let config = args.registry_config();
    assert_eq!(config.asn_methods, vec![AsnMethod::Http, AsnMethod::Dns]);

    assert!(Args::try_parse_from(["astrace", "--asn-methods", "ftp", "8.8.8.8"]).is_err());
}

#[test]
fn test_trace_config_from_args() {
    let args = Args::try_parse_from([
        "astrace",
        "--program",
        "/usr/sbin/traceroute",
        "-w",
        "1000",
        "1.1.1.1",
    ])
    .unwrap();
    let config = args.trace_config().unwrap();
    assert_eq!(config.program, "/usr/sbin/traceroute");
    assert_eq!(config.wait_timeout, Duration::from_millis(1000));

    let args = Args::try_parse_from(["astrace", "-w", "0", "1.1.1.1"]).unwrap();
    assert!(args.trace_config().is_err());
}

#[test]
fn test_registry_timeout_from_args() {
    let args =
        Args::try_parse_from(["astrace", "--registry-timeout-ms", "1500", "1.1.1.1"]).unwrap();
    assert_eq!(
        args.registry_config().timeout,
        Duration::from_millis(1500)
    );
}

#[test]
fn test_missing_address_rejected() {
    assert!(Args::try_parse_from(["astrace", "--json"]).is_err());
}

#[test]
fn test_verbose_count() {
    let args = Args::try_parse_from(["astrace", "-vv", "--json", "-n", "3", "1.1.1.1"]).unwrap();
    assert_eq!(args.verbose, 2);
    assert!(args.json);
    assert_eq!(args.limit, Some(3));
}
