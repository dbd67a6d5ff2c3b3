//! Rendering of hop records
//!
//! Both writers emit one hop at a time and flush after each, so rows appear
//! while the trace is still running.

use crate::traceroute::HopRecord;
use std::io::{self, Write};

/// Column labels of the hop table
pub const HEADER_LABELS: [&str; 5] = ["№", "IP", "AS", "Country", "Provider"];

/// Format the header row
pub fn format_header() -> String {
    format!(
        "|{:<3}|{:<16}|{:<8}|{:<8}|{:<15}|",
        HEADER_LABELS[0], HEADER_LABELS[1], HEADER_LABELS[2], HEADER_LABELS[3], HEADER_LABELS[4]
    )
}

/// Format one hop row
pub fn format_row(hop: &HopRecord) -> String {
    format!(
        "|{:>3}|{:<16}|{:<8}|{:<8}|{:<15}|",
        hop.sequence_number,
        hop.address.to_string(),
        hop.as_number,
        hop.country,
        hop.provider
    )
}

/// Writes hops as a text table, header first
#[derive(Debug)]
pub struct TableWriter<W: Write> {
    out: W,
    header_written: bool,
}

impl<W: Write> TableWriter<W> {
    /// Create a table writer
    pub fn new(out: W) -> Self {
        Self {
            out,
            header_written: false,
        }
    }

    /// Write one hop, preceded by the header and rule on the first call
    pub fn write_hop(&mut self, hop: &HopRecord) -> io::Result<()> {
        if !self.header_written {
            let header = format_header();
            writeln!(self.out, "{header}")?;
            writeln!(self.out, "{}", "-".repeat(header.chars().count()))?;
            self.header_written = true;
        }
        writeln!(self.out, "{}", format_row(hop))?;
        self.out.flush()
    }

    /// Whether any row has been written
    pub fn has_rows(&self) -> bool {
        self.header_written
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Writes hops as newline-delimited JSON
#[derive(Debug)]
pub struct JsonLinesWriter<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesWriter<W> {
    /// Create a JSON lines writer
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Write one hop as a JSON object on its own line
    pub fn write_hop(&mut self, hop: &HopRecord) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, hop)?;
        writeln!(self.out)?;
        self.out.flush()
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.out
    }
}
