//! Governor keys and the power-rank index.
//!
//! Power-rank layout: [0x23][power: u64 BE][len: u8][!operator]
//!
//! Power is stored big-endian so byte order equals numeric order and the
//! index scans ascending by power; callers wanting the strongest governors
//! first iterate it in reverse. The operator bytes are bit-inverted, so among
//! equal powers a reverse scan yields ascending operator addresses. Keep the
//! inversion: existing stores depend on it.

use super::{address_after_prefix, Result};
use crate::address::decode_bech32;
use crate::config::GovernorsConfig;
use crate::encoding::key::{KeyReader, KeyWriter};
use crate::prefix::Prefix;
use crate::types::Governor;

/// Width of the power field in a power-rank key.
pub const POWER_BYTES_LEN: usize = 8;

/// Key of the governor record for `operator`.
pub fn governor_key(operator: &[u8]) -> Result<Vec<u8>> {
    Ok(KeyWriter::with_capacity(Prefix::Governors, 1 + operator.len())
        .field(operator)?
        .finish())
}

/// Operator address from a [`governor_key`].
pub fn address_from_governors_key(key: &[u8]) -> Result<&[u8]> {
    address_after_prefix(key, Prefix::Governors)
}

/// Bonded power key for `operator`.
pub fn last_governor_power_key(operator: &[u8]) -> Result<Vec<u8>> {
    Ok(KeyWriter::with_capacity(Prefix::LastGovernorPower, 1 + operator.len())
        .field(operator)?
        .finish())
}

/// Operator address from a [`last_governor_power_key`].
pub fn address_from_last_governor_power_key(key: &[u8]) -> Result<&[u8]> {
    address_after_prefix(key, Prefix::LastGovernorPower)
}

/// Key of the total bonded power.
pub fn last_total_power_key() -> Vec<u8> {
    Prefix::LastTotalPower.as_key().to_vec()
}

/// Index key from consensus address to governor.
pub fn governor_by_cons_addr_key(cons_addr: &[u8]) -> Result<Vec<u8>> {
    Ok(
        KeyWriter::with_capacity(Prefix::GovernorsByConsAddr, 1 + cons_addr.len())
            .field(cons_addr)?
            .finish(),
    )
}

/// Power-rank key for a raw operator address and consensus power.
pub fn power_rank_key(operator: &[u8], power: u64) -> Result<Vec<u8>> {
    let inverted: Vec<u8> = operator.iter().map(|b| !b).collect();

    Ok(KeyWriter::with_capacity(
        Prefix::GovernorsByPower,
        POWER_BYTES_LEN + 1 + inverted.len(),
    )
    .u64_be(power)
    .field(&inverted)?
    .finish())
}

/// Power-rank key of `governor`.
///
/// Resolves the bech32 operator address and reduces tokens to consensus
/// power first. An address that does not resolve fails with a precondition
/// error, see [`crate::KeyError::is_precondition`].
pub fn governors_by_power_index_key(
    governor: &Governor,
    config: &GovernorsConfig,
) -> Result<Vec<u8>> {
    let operator = decode_bech32(&config.governor_hrp, &governor.operator_address)?;
    power_rank_key(&operator, governor.consensus_power(config))
}

/// Recovers the operator address from a power-rank key.
pub fn parse_governor_power_rank_key(key: &[u8]) -> Result<Vec<u8>> {
    let mut reader = KeyReader::with_prefix(key, Prefix::GovernorsByPower)?;
    reader.skip(POWER_BYTES_LEN)?;
    let inverted = reader.last_field()?;
    Ok(inverted.iter().map(|b| !b).collect())
}

/// Recovers the consensus power from a power-rank key.
pub fn power_from_power_rank_key(key: &[u8]) -> Result<u64> {
    KeyReader::with_prefix(key, Prefix::GovernorsByPower)?.u64_be()
}

/// Historical info key for `height`.
///
/// The height is ASCII decimal, so these keys support point lookups only;
/// they do not sort numerically.
pub fn historical_info_key(height: u64) -> Vec<u8> {
    KeyWriter::new(Prefix::HistoricalInfo)
        .raw(height.to_string().as_bytes())
        .finish()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_address() -> impl Strategy<Value = Vec<u8>> {
        prop::collection::vec(any::<u8>(), 0..=255)
    }

    proptest! {
        #[test]
        fn proptest_simple_keys_roundtrip(addr in arb_address()) {
            let key = governor_key(&addr).unwrap();
            prop_assert_eq!(key.len(), 2 + addr.len());
            prop_assert_eq!(address_from_governors_key(&key).unwrap(), addr.as_slice());

            let key = last_governor_power_key(&addr).unwrap();
            prop_assert_eq!(address_from_last_governor_power_key(&key).unwrap(), addr.as_slice());
        }

        #[test]
        fn proptest_power_rank_roundtrip(addr in arb_address(), power in any::<u64>()) {
            let key = power_rank_key(&addr, power).unwrap();
            prop_assert_eq!(parse_governor_power_rank_key(&key).unwrap(), addr);
            prop_assert_eq!(power_from_power_rank_key(&key).unwrap(), power);
        }

        #[test]
        fn proptest_power_dominates_address(
            a in arb_address(),
            b in arb_address(),
            p in any::<u64>(),
            q in any::<u64>(),
        ) {
            prop_assume!(p != q);
            let ka = power_rank_key(&a, p).unwrap();
            let kb = power_rank_key(&b, q).unwrap();
            prop_assert_eq!(ka < kb, p < q);
        }

        #[test]
        fn proptest_equal_power_reverse_order_is_address_order(
            a in prop::collection::vec(any::<u8>(), 20),
            b in prop::collection::vec(any::<u8>(), 20),
            power in any::<u64>(),
        ) {
            prop_assume!(a != b);
            let ka = power_rank_key(&a, power).unwrap();
            let kb = power_rank_key(&b, power).unwrap();
            prop_assert_eq!(ka > kb, a < b);
        }
    }
}
