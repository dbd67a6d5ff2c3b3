//! Error types for traceroute operations

use thiserror::Error;

/// Errors that abort a trace
///
/// Registry failures never show up here; they only degrade the affected
/// hop's fields to "Unknown".
#[derive(Debug, Error)]
pub enum TraceError {
    /// The path-discovery program could not be started
    ///
    /// Usually the executable is missing from `PATH` or is not executable.
    #[error("Failed to start {program}: {source}")]
    ProcessLaunch {
        /// Program that failed to start (e.g. "tracert")
        program: String,
        /// Underlying spawn error
        #[source]
        source: std::io::Error,
    },

    /// The discovery program started without a readable stdout
    #[error("{program} has no output stream")]
    MissingOutput {
        /// Program that was started
        program: String,
    },

    /// Invalid configuration provided
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl TraceError {
    /// Whether the error came from starting the discovery program
    pub fn is_launch_failure(&self) -> bool {
        matches!(
            self,
            TraceError::ProcessLaunch { .. } | TraceError::MissingOutput { .. }
        )
    }
}
