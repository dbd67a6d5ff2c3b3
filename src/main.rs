//! astrace - traceroute with autonomous-system annotations.
//!
//! This is the command-line interface for the astrace library.

#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use astrace::display::{JsonLinesWriter, TableWriter};
use astrace::{AsnMethod, HopRecord, RegistryConfig, RegistryResolver, TraceConfig, TraceError};
use clap::{CommandFactory, Parser};
use std::io::{self, Stdout};
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Get the version string for astrace
fn get_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(env!("CARGO_PKG_VERSION"), "-UNRELEASED")
    } else {
        env!("CARGO_PKG_VERSION")
    }
}

/// Command-line arguments for astrace.
#[derive(Parser, Debug)]
#[clap(
    author,
    version = get_version(),
    about = "Trace the route to an address and show the autonomous system of every hop",
    long_about = None
)]
struct Args {
    /// Address (IPv4 or hostname) to trace the route to
    #[clap(value_parser = parse_target)]
    address: String,

    /// ASN lookup methods, tried in this order until one succeeds
    #[clap(
        long,
        value_enum,
        value_delimiter = ',',
        default_values = ["dns", "whois", "http"]
    )]
    asn_methods: Vec<AsnMethodArg>,

    /// Time the discovery tool waits for each hop in milliseconds
    #[clap(short = 'w', long, default_value_t = 500)]
    wait_ms: u64,

    /// Timeout for each registry query in milliseconds
    #[clap(long, default_value_t = 5000)]
    registry_timeout_ms: u64,

    /// Discovery program to run instead of the platform traceroute
    #[clap(long)]
    program: Option<String>,

    /// Stop after this many hops
    #[clap(short = 'n', long)]
    limit: Option<u32>,

    /// Output hops as JSON lines
    #[clap(long)]
    json: bool,

    /// Enable verbose logging (use -vv for debug output)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum AsnMethodArg {
    Dns,
    Whois,
    Http,
}

impl From<AsnMethodArg> for AsnMethod {
    fn from(arg: AsnMethodArg) -> Self {
        match arg {
            AsnMethodArg::Dns => AsnMethod::Dns,
            AsnMethodArg::Whois => AsnMethod::Whois,
            AsnMethodArg::Http => AsnMethod::Http,
        }
    }
}

/// Validate the target: an IPv4 literal or a plausible hostname
fn parse_target(s: &str) -> Result<String, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("address must not be empty".to_string());
    }
    if s.parse::<Ipv4Addr>().is_ok() {
        return Ok(s.to_string());
    }
    if s.parse::<IpAddr>().is_ok() {
        return Err("only IPv4 targets are supported".to_string());
    }

    let labels: Vec<&str> = s.split('.').collect();
    if labels
        .iter()
        .all(|l| !l.is_empty() && l.bytes().all(|b| b.is_ascii_digit()))
    {
        return Err(format!("'{}' is not a valid IPv4 address", s));
    }

    let valid_host = !s.starts_with('-')
        && s.len() <= 253
        && labels.iter().all(|label| {
            !label.is_empty()
                && label.len() <= 63
                && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        });
    if valid_host {
        Ok(s.to_string())
    } else {
        Err(format!("'{}' is not a valid IPv4 address or hostname", s))
    }
}

impl Args {
    fn trace_config(&self) -> Result<TraceConfig, TraceError> {
        let mut builder = TraceConfig::builder().wait_timeout(Duration::from_millis(self.wait_ms));
        if let Some(program) = &self.program {
            builder = builder.program(program);
        }
        builder.build()
    }

    fn registry_config(&self) -> RegistryConfig {
        RegistryConfig::default()
            .with_asn_methods(self.asn_methods.iter().map(|&m| AsnMethod::from(m)))
            .with_timeout(Duration::from_millis(self.registry_timeout_ms))
    }
}

/// Where hops are rendered
enum HopWriter {
    Table(TableWriter<Stdout>),
    Json(JsonLinesWriter<Stdout>),
}

impl HopWriter {
    fn new(json: bool) -> Self {
        if json {
            HopWriter::Json(JsonLinesWriter::new(io::stdout()))
        } else {
            HopWriter::Table(TableWriter::new(io::stdout()))
        }
    }

    fn write_hop(&mut self, hop: &HopRecord) -> io::Result<()> {
        match self {
            HopWriter::Table(table) => table.write_hop(hop),
            HopWriter::Json(json) => json.write_hop(hop),
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("astrace={}", level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    // No arguments at all: show usage instead of a missing-argument error
    if std::env::args_os().len() <= 1 {
        let _ = Args::command().print_help();
        println!();
        return;
    }

    let args = Args::parse();
    init_logging(args.verbose);

    // Hops are resolved one after another, a single thread is enough
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to create Tokio runtime");

    let result = runtime.block_on(async_main(args));

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        if let Some(TraceError::ProcessLaunch { program, .. }) = e.downcast_ref::<TraceError>() {
            eprintln!(
                "Make sure '{}' is installed and on your PATH, or choose another program with --program.",
                program
            );
        }
        std::process::exit(1);
    }
}

async fn async_main(args: Args) -> Result<()> {
    let trace_config = args.trace_config()?;
    let resolver = RegistryResolver::new(args.registry_config())?;

    let mut hops = astrace::trace(args.address.clone(), trace_config, resolver);
    let mut writer = HopWriter::new(args.json);

    if !args.json {
        println!("Tracing route to {}", args.address);
    }

    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    loop {
        if args.limit.is_some_and(|limit| hops.hops_emitted() >= limit) {
            hops.close().await;
            break;
        }

        let next = tokio::select! {
            next = hops.next_hop() => Some(next),
            _ = &mut interrupt => None,
        };

        let Some(next) = next else {
            eprintln!("Interrupted");
            hops.close().await;
            break;
        };

        match next? {
            Some(hop) => writer.write_hop(&hop)?,
            None => break,
        }
    }

    if !args.json {
        println!("Trace complete");
    }
    Ok(())
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod main_tests;
