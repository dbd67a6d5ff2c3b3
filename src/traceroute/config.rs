//! Configuration types for traceroute operations

use super::error::TraceError;
use crate::parser::LineFormat;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default per-hop wait timeout in milliseconds
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 500;

/// How to run the path-discovery program
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceConfig {
    /// Discovery program (default: `tracert` on Windows, `traceroute` elsewhere)
    pub program: String,
    /// Explicit arguments placed before the target; `None` uses the
    /// platform defaults built from `wait_timeout`
    pub args: Option<Vec<String>>,
    /// How long the tool waits for each hop reply (default: 500ms)
    pub wait_timeout: Duration,
    /// Layout of the tool's hop lines
    pub line_format: LineFormat,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            program: default_program().to_string(),
            args: None,
            wait_timeout: Duration::from_millis(DEFAULT_WAIT_TIMEOUT_MS),
            line_format: default_line_format(),
        }
    }
}

impl TraceConfig {
    /// Create a new TraceConfig builder
    pub fn builder() -> TraceConfigBuilder {
        TraceConfigBuilder::new()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.program.trim().is_empty() {
            return Err("program must be specified".to_string());
        }
        if self.wait_timeout.is_zero() {
            return Err("wait_timeout must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Full argument list for tracing to `target`; the target is always last
    pub fn command_args(&self, target: &str) -> Vec<String> {
        let mut args = match &self.args {
            Some(args) => args.clone(),
            None => platform_args(self.wait_timeout),
        };
        args.push(target.to_string());
        args
    }
}

/// Platform discovery program
pub fn default_program() -> &'static str {
    if cfg!(windows) {
        "tracert"
    } else {
        "traceroute"
    }
}

/// Line layout of the platform discovery program
pub fn default_line_format() -> LineFormat {
    if cfg!(windows) {
        LineFormat::LastToken
    } else {
        LineFormat::HopColumn
    }
}

/// Platform arguments: numeric output, per-hop wait, IPv4 only
#[cfg(windows)]
pub fn platform_args(wait_timeout: Duration) -> Vec<String> {
    vec![
        "-d".to_string(),
        "-w".to_string(),
        wait_timeout.as_millis().to_string(),
        "-4".to_string(),
    ]
}

/// Platform arguments: numeric output, one query per hop, per-hop wait, IPv4 only
#[cfg(target_os = "linux")]
pub fn platform_args(wait_timeout: Duration) -> Vec<String> {
    vec![
        "-n".to_string(),
        "-q".to_string(),
        "1".to_string(),
        "-w".to_string(),
        format!("{}", wait_timeout.as_secs_f64()),
        "-4".to_string(),
    ]
}

/// Platform arguments: numeric output, one query per hop, per-hop wait
///
/// BSD traceroute is IPv4-only and takes whole seconds.
#[cfg(all(unix, not(target_os = "linux")))]
pub fn platform_args(wait_timeout: Duration) -> Vec<String> {
    let secs = wait_timeout.as_secs_f64().ceil().max(1.0) as u64;
    vec![
        "-n".to_string(),
        "-q".to_string(),
        "1".to_string(),
        "-w".to_string(),
        secs.to_string(),
    ]
}

/// Builder for TraceConfig
pub struct TraceConfigBuilder {
    config: TraceConfig,
}

impl TraceConfigBuilder {
    /// Create a new builder with platform defaults
    pub fn new() -> Self {
        Self {
            config: TraceConfig::default(),
        }
    }

    /// Set the discovery program
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.config.program = program.into();
        self
    }

    /// Replace the platform arguments; the target is still appended last
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Set the per-hop wait timeout
    pub fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.config.wait_timeout = timeout;
        self
    }

    /// Set the hop line layout
    pub fn line_format(mut self, format: LineFormat) -> Self {
        self.config.line_format = format;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<TraceConfig, TraceError> {
        self.config.validate().map_err(TraceError::ConfigError)?;
        Ok(self.config)
    }
}

impl Default for TraceConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
