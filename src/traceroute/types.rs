//! Core types for traceroute operations

use crate::registry::AsOwner;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// One resolved hop, as handed to the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HopRecord {
    /// 1-based position in emission order
    pub sequence_number: u32,
    /// Address of the hop
    pub address: Ipv4Addr,
    /// AS number or "Unknown"
    pub as_number: String,
    /// Country code or "Unknown"
    pub country: String,
    /// Provider description or "Unknown"
    pub provider: String,
    /// Hop number printed by the discovery tool, if the line had one
    pub hop_index: Option<u8>,
}

impl HopRecord {
    /// Build a record from a resolved owner
    pub fn new(sequence_number: u32, address: Ipv4Addr, owner: AsOwner) -> Self {
        Self {
            sequence_number,
            address,
            as_number: owner.as_number,
            country: owner.country,
            provider: owner.provider,
            hop_index: None,
        }
    }

    /// Attach the tool's own hop number
    pub fn with_hop_index(mut self, hop_index: Option<u8>) -> Self {
        self.hop_index = hop_index;
        self
    }

    /// Whether this is the first record of its trace
    pub fn is_first(&self) -> bool {
        self.sequence_number == 1
    }
}

/// Lifecycle of a [`HopStream`](super::HopStream)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamState {
    /// Discovery process not started yet
    NotStarted,
    /// Reading discovery output
    Running,
    /// Output ended; waiting for the process to exit
    Draining,
    /// Process released; no more records
    Terminated,
}
