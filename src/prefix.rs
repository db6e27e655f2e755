//! Prefix registry for the governors key space.
//!
//! Every key written by this crate starts with exactly one byte from this
//! table. The byte values are part of the on-disk format: reassigning one
//! orphans every row already stored under it.

/// Name of the module.
pub const MODULE_NAME: &str = "governors";

/// Store key, also used as the redb table name.
pub const STORE_KEY: &str = "rdkgovernors";

/// Querier route of the module.
pub const QUERIER_ROUTE: &str = MODULE_NAME;

/// Message router key of the module.
pub const ROUTER_KEY: &str = MODULE_NAME;

/// Single-byte namespace tags partitioning the key space.
///
/// `Last*` rows are constant during a block.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Prefix {
    /// Bonded governor power, keyed by operator address.
    LastGovernorPower = 0x11,
    /// Total bonded power.
    LastTotalPower = 0x12,

    /// Governor records, keyed by operator address.
    Governors = 0x21,
    /// Governor index by consensus address.
    GovernorsByConsAddr = 0x22,
    /// Governor index sorted by power.
    GovernorsByPower = 0x23,

    /// Delegations, keyed by (delegator, governor).
    Delegation = 0x31,
    /// Unbonding delegations, keyed by (delegator, governor).
    UnbondingDelegation = 0x32,
    /// Unbonding delegation index by governor.
    UnbondingDelegationByGovernorIndex = 0x33,
    /// Redelegations, keyed by (delegator, source, destination).
    Redelegation = 0x34,
    /// Redelegation index by source governor.
    RedelegationByGovernorSrcIndex = 0x35,
    /// Redelegation index by destination governor.
    RedelegationByGovernorDstIndex = 0x36,

    /// Unbonding queue, keyed by maturity time.
    UnbondingQueue = 0x41,
    /// Redelegation queue, keyed by maturity time.
    RedelegationQueue = 0x42,
    /// Governor queue, keyed by maturity time and height.
    GovernorQueue = 0x43,

    /// Historical info, keyed by height.
    HistoricalInfo = 0x50,
}

impl Prefix {
    /// Every registered prefix in byte order.
    pub const ALL: [Prefix; 15] = [
        Prefix::LastGovernorPower,
        Prefix::LastTotalPower,
        Prefix::Governors,
        Prefix::GovernorsByConsAddr,
        Prefix::GovernorsByPower,
        Prefix::Delegation,
        Prefix::UnbondingDelegation,
        Prefix::UnbondingDelegationByGovernorIndex,
        Prefix::Redelegation,
        Prefix::RedelegationByGovernorSrcIndex,
        Prefix::RedelegationByGovernorDstIndex,
        Prefix::UnbondingQueue,
        Prefix::RedelegationQueue,
        Prefix::GovernorQueue,
        Prefix::HistoricalInfo,
    ];

    /// The reserved byte for this kind.
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// The prefix as a one-byte key, suitable as a scan start.
    pub const fn as_key(self) -> [u8; 1] {
        [self as u8]
    }

    /// Resolves a leading byte back to its kind.
    pub fn from_byte(byte: u8) -> Option<Prefix> {
        Self::ALL.iter().copied().find(|prefix| prefix.byte() == byte)
    }

    /// Serialized form of the whole table, persisted to detect reassignment.
    pub fn layout_fingerprint() -> Vec<u8> {
        Self::ALL.iter().map(|prefix| prefix.byte()).collect()
    }
}

impl From<Prefix> for u8 {
    fn from(prefix: Prefix) -> u8 {
        prefix.byte()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_prefixes_are_pairwise_distinct() {
        let bytes: HashSet<u8> = Prefix::ALL.iter().map(|p| p.byte()).collect();
        assert_eq!(bytes.len(), Prefix::ALL.len());
    }

    #[test]
    fn test_prefix_table_is_sorted_and_reserved() {
        for pair in Prefix::ALL.windows(2) {
            assert!(pair[0].byte() < pair[1].byte());
        }
        // zero is never handed out
        assert!(Prefix::ALL.iter().all(|p| p.byte() != 0x00));
    }

    #[test]
    fn test_from_byte() {
        for prefix in Prefix::ALL {
            assert_eq!(Prefix::from_byte(prefix.byte()), Some(prefix));
        }
        assert_eq!(Prefix::from_byte(0x00), None);
        assert_eq!(Prefix::from_byte(0x44), None);
    }

    #[test]
    fn test_fixed_byte_values() {
        assert_eq!(Prefix::LastGovernorPower.byte(), 0x11);
        assert_eq!(Prefix::GovernorsByPower.byte(), 0x23);
        assert_eq!(Prefix::RedelegationByGovernorDstIndex.byte(), 0x36);
        assert_eq!(Prefix::GovernorQueue.byte(), 0x43);
        assert_eq!(Prefix::HistoricalInfo.byte(), 0x50);
        assert_eq!(
            Prefix::layout_fingerprint(),
            vec![
                0x11, 0x12, 0x21, 0x22, 0x23, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x41, 0x42,
                0x43, 0x50
            ]
        );
    }
}
