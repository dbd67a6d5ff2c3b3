//! Registry (AS ownership) lookups for hop addresses

pub mod backend;
pub mod config;
pub mod error;
pub mod methods;
pub mod rdap;
pub mod reserved;
pub mod resolver;

pub use backend::{RdapBackend, RegistryBackend, RegistryRecord};
pub use config::RegistryConfig;
pub use error::RegistryError;
pub use methods::{AsnMethod, AsnRecord};
pub use rdap::{NetworkRecord, Remark};
pub use resolver::{AsOwner, RegistryResolver, UNKNOWN};
