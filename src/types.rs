//! Entities addressed by the key space.
//!
//! Only identity and ordering fields live here; the serialized records stored
//! under primary keys are opaque bytes to this crate.

use crate::config::GovernorsConfig;

/// A staked participant, ranked by delegated stake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Governor {
    /// Bech32 operator address.
    pub operator_address: String,
    /// Bonded stake in token units.
    pub tokens: u128,
}

impl Governor {
    pub fn new(operator_address: impl Into<String>, tokens: u128) -> Self {
        Self {
            operator_address: operator_address.into(),
            tokens,
        }
    }

    /// Stake reduced to consensus power under `config`.
    pub fn consensus_power(&self, config: &GovernorsConfig) -> u64 {
        config.tokens_to_consensus_power(self.tokens)
    }
}
