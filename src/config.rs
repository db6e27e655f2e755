//! Configuration for the governors key space.
//!
//! Holds the module parameters key construction depends on.

use crate::error::{Error, Result};

/// Default number of token units per unit of consensus power.
pub const DEFAULT_POWER_REDUCTION: u128 = 1_000_000;

/// Default human-readable part of governor operator addresses.
pub const DEFAULT_GOVERNOR_HRP: &str = "valoper";

/// Parameters shared by the key builders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GovernorsConfig {
    /// Token units per unit of consensus power.
    ///
    /// Power-rank keys encode `tokens / power_reduction`, so changing this
    /// reorders the power index and requires rebuilding it.
    pub power_reduction: u128,

    /// Bech32 human-readable part expected on operator addresses.
    pub governor_hrp: String,
}

impl GovernorsConfig {
    /// Creates a validated configuration.
    ///
    /// # Arguments
    /// * `power_reduction` - Token units per unit of power (must be > 0)
    /// * `governor_hrp` - Bech32 prefix of operator addresses (must be non-empty)
    pub fn new(power_reduction: u128, governor_hrp: impl Into<String>) -> Result<Self> {
        if power_reduction == 0 {
            return Err(Error::InvalidConfig(
                "power reduction must be greater than 0".to_string(),
            ));
        }

        let governor_hrp = governor_hrp.into();
        if governor_hrp.is_empty() {
            return Err(Error::InvalidConfig(
                "governor address prefix must not be empty".to_string(),
            ));
        }

        Ok(Self {
            power_reduction,
            governor_hrp,
        })
    }

    /// Reduces raw stake to consensus power, saturating at `u64::MAX`.
    pub fn tokens_to_consensus_power(&self, tokens: u128) -> u64 {
        u64::try_from(tokens / self.power_reduction).unwrap_or(u64::MAX)
    }
}

impl Default for GovernorsConfig {
    fn default() -> Self {
        Self {
            power_reduction: DEFAULT_POWER_REDUCTION,
            governor_hrp: DEFAULT_GOVERNOR_HRP.to_string(),
        }
    }
}
