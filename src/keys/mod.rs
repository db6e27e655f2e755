//! Key builders and parsers for every governors entity.
//!
//! Builders return fresh buffers and fail only on construction preconditions
//! (an address over 255 bytes, an unresolvable operator address, a timestamp
//! with no sortable form). Parsers never read past the end of their input.

pub mod delegation;
pub mod governor;
pub mod queue;

use crate::encoding::key::KeyReader;
use crate::error::KeyError;
use crate::prefix::Prefix;

pub type Result<T> = std::result::Result<T, KeyError>;

pub use delegation::{
    delegation_key, delegations_key, parse_delegation_key, parse_red_key, parse_ubd_key,
    red_by_governor_dst_index_key, red_by_governor_src_index_key, red_key,
    red_key_from_governor_dst_index_key, red_key_from_governor_src_index_key,
    reds_by_delegator_to_governor_dst_index_key, reds_from_governor_src_index_key, reds_key,
    reds_to_governor_dst_index_key, ubd_by_governor_index_key, ubd_key,
    ubd_key_from_governor_index_key, ubds_by_governor_index_key, ubds_key, DelegationAddrs,
    RedelegationAddrs,
};
pub use governor::{
    address_from_governors_key, address_from_last_governor_power_key, governor_by_cons_addr_key,
    governor_key, governors_by_power_index_key, historical_info_key, last_governor_power_key,
    last_total_power_key, parse_governor_power_rank_key, power_from_power_rank_key,
    power_rank_key,
};
pub use queue::{
    governor_queue_key, governor_queue_key_with, parse_governor_queue_key,
    parse_governor_queue_key_with, parse_time_key, parse_time_key_with,
    redelegation_time_key, time_key, time_key_with, unbonding_delegation_time_key,
};

/// Reads the single length-prefixed address that follows `prefix`.
///
/// The declared length must account for every remaining byte, so a truncated
/// or overlong key fails instead of yielding a shortened address.
pub fn address_after_prefix(key: &[u8], prefix: Prefix) -> Result<&[u8]> {
    KeyReader::with_prefix(key, prefix)?.last_field()
}
