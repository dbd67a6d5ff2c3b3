//! astrace - traceroute with autonomous-system annotations
//!
//! This library runs the system path-discovery program, picks the hop
//! addresses out of its output as they appear and resolves the AS number,
//! country and provider of each hop through registry lookups.

pub mod display;
pub mod parser;
pub mod registry;
pub mod traceroute;

// Re-export core types for library users
pub use parser::{extract_ipv4, extract_ipv4_with, LineFormat};
pub use registry::{AsOwner, AsnMethod, RegistryConfig, RegistryError, RegistryResolver};
pub use traceroute::{trace, HopRecord, HopStream, TraceConfig, TraceError};
