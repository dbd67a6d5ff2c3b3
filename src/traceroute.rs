//! Path tracing through the system discovery program

pub mod config;
pub mod error;
pub mod stream;
pub mod types;

// Re-export commonly used types
pub use config::{TraceConfig, TraceConfigBuilder, DEFAULT_WAIT_TIMEOUT_MS};
pub use error::TraceError;
pub use stream::{trace, HopStream, TraceSession};
pub use types::{HopRecord, StreamState};
