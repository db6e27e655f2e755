//! Delegation, unbonding delegation and redelegation keys.
//!
//! Primary keys lead with the delegator; the secondary indexes lead with a
//! governor so a prefix scan over one governor finds its entries. Index rows
//! store no value. The primary key is recovered by reading the index key's
//! fields and writing them back in primary order:
//!
//! Unbonding:          [0x32][del][gov]        index [0x33][gov][del]
//! Redelegation:       [0x34][del][src][dst]   index [0x35][src][del][dst]
//!                                             index [0x36][dst][del][src]
//!
//! Every `[..]` after the prefix is a `[len: u8][bytes]` field.

use super::Result;
use crate::encoding::key::{KeyReader, KeyWriter};
use crate::prefix::Prefix;

/// Delegator and governor parsed from a two-address key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelegationAddrs<'a> {
    pub delegator: &'a [u8],
    pub governor: &'a [u8],
}

/// Delegator and both governors parsed from a redelegation key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedelegationAddrs<'a> {
    pub delegator: &'a [u8],
    pub src: &'a [u8],
    pub dst: &'a [u8],
}

fn key1(prefix: Prefix, a: &[u8]) -> Result<Vec<u8>> {
    Ok(KeyWriter::with_capacity(prefix, 1 + a.len())
        .field(a)?
        .finish())
}

fn key2(prefix: Prefix, a: &[u8], b: &[u8]) -> Result<Vec<u8>> {
    Ok(KeyWriter::with_capacity(prefix, 2 + a.len() + b.len())
        .field(a)?
        .field(b)?
        .finish())
}

fn key3(prefix: Prefix, a: &[u8], b: &[u8], c: &[u8]) -> Result<Vec<u8>> {
    Ok(
        KeyWriter::with_capacity(prefix, 3 + a.len() + b.len() + c.len())
            .field(a)?
            .field(b)?
            .field(c)?
            .finish(),
    )
}

fn read2(key: &[u8], prefix: Prefix) -> Result<(&[u8], &[u8])> {
    let mut reader = KeyReader::with_prefix(key, prefix)?;
    let a = reader.field()?;
    let b = reader.last_field()?;
    Ok((a, b))
}

fn read3(key: &[u8], prefix: Prefix) -> Result<(&[u8], &[u8], &[u8])> {
    let mut reader = KeyReader::with_prefix(key, prefix)?;
    let a = reader.field()?;
    let b = reader.field()?;
    let c = reader.last_field()?;
    Ok((a, b, c))
}

/// Prefix of every delegation from `delegator`.
pub fn delegations_key(delegator: &[u8]) -> Result<Vec<u8>> {
    key1(Prefix::Delegation, delegator)
}

/// Key of the delegation from `delegator` to `governor`.
pub fn delegation_key(delegator: &[u8], governor: &[u8]) -> Result<Vec<u8>> {
    key2(Prefix::Delegation, delegator, governor)
}

pub fn parse_delegation_key(key: &[u8]) -> Result<DelegationAddrs<'_>> {
    let (delegator, governor) = read2(key, Prefix::Delegation)?;
    Ok(DelegationAddrs {
        delegator,
        governor,
    })
}

/// Prefix of every unbonding delegation from `delegator`.
pub fn ubds_key(delegator: &[u8]) -> Result<Vec<u8>> {
    key1(Prefix::UnbondingDelegation, delegator)
}

/// Key of the unbonding delegation from `delegator` out of `governor`.
pub fn ubd_key(delegator: &[u8], governor: &[u8]) -> Result<Vec<u8>> {
    key2(Prefix::UnbondingDelegation, delegator, governor)
}

pub fn parse_ubd_key(key: &[u8]) -> Result<DelegationAddrs<'_>> {
    let (delegator, governor) = read2(key, Prefix::UnbondingDelegation)?;
    Ok(DelegationAddrs {
        delegator,
        governor,
    })
}

/// Prefix of the unbonding index entries of `governor`.
pub fn ubds_by_governor_index_key(governor: &[u8]) -> Result<Vec<u8>> {
    key1(Prefix::UnbondingDelegationByGovernorIndex, governor)
}

/// Index key of an unbonding delegation, stored under its governor.
pub fn ubd_by_governor_index_key(delegator: &[u8], governor: &[u8]) -> Result<Vec<u8>> {
    key2(Prefix::UnbondingDelegationByGovernorIndex, governor, delegator)
}

/// Rearranges a [`ubd_by_governor_index_key`] into its [`ubd_key`].
pub fn ubd_key_from_governor_index_key(index_key: &[u8]) -> Result<Vec<u8>> {
    let (governor, delegator) = read2(index_key, Prefix::UnbondingDelegationByGovernorIndex)?;
    ubd_key(delegator, governor)
}

/// Prefix of every redelegation from `delegator`.
pub fn reds_key(delegator: &[u8]) -> Result<Vec<u8>> {
    key1(Prefix::Redelegation, delegator)
}

/// Key of the redelegation by `delegator` from `src` to `dst`.
pub fn red_key(delegator: &[u8], src: &[u8], dst: &[u8]) -> Result<Vec<u8>> {
    key3(Prefix::Redelegation, delegator, src, dst)
}

pub fn parse_red_key(key: &[u8]) -> Result<RedelegationAddrs<'_>> {
    let (delegator, src, dst) = read3(key, Prefix::Redelegation)?;
    Ok(RedelegationAddrs {
        delegator,
        src,
        dst,
    })
}

/// Prefix of the redelegation index entries leaving `src`.
pub fn reds_from_governor_src_index_key(src: &[u8]) -> Result<Vec<u8>> {
    key1(Prefix::RedelegationByGovernorSrcIndex, src)
}

/// Prefix of the redelegation index entries arriving at `dst`.
pub fn reds_to_governor_dst_index_key(dst: &[u8]) -> Result<Vec<u8>> {
    key1(Prefix::RedelegationByGovernorDstIndex, dst)
}

/// Prefix of the redelegations by `delegator` arriving at `dst`.
pub fn reds_by_delegator_to_governor_dst_index_key(
    delegator: &[u8],
    dst: &[u8],
) -> Result<Vec<u8>> {
    key2(Prefix::RedelegationByGovernorDstIndex, dst, delegator)
}

/// Index key of a redelegation, stored under its source governor.
pub fn red_by_governor_src_index_key(delegator: &[u8], src: &[u8], dst: &[u8]) -> Result<Vec<u8>> {
    key3(Prefix::RedelegationByGovernorSrcIndex, src, delegator, dst)
}

/// Index key of a redelegation, stored under its destination governor.
pub fn red_by_governor_dst_index_key(delegator: &[u8], src: &[u8], dst: &[u8]) -> Result<Vec<u8>> {
    key3(Prefix::RedelegationByGovernorDstIndex, dst, delegator, src)
}

/// Rearranges a [`red_by_governor_src_index_key`] into its [`red_key`].
pub fn red_key_from_governor_src_index_key(index_key: &[u8]) -> Result<Vec<u8>> {
    let (src, delegator, dst) = read3(index_key, Prefix::RedelegationByGovernorSrcIndex)?;
    red_key(delegator, src, dst)
}

/// Rearranges a [`red_by_governor_dst_index_key`] into its [`red_key`].
pub fn red_key_from_governor_dst_index_key(index_key: &[u8]) -> Result<Vec<u8>> {
    let (dst, delegator, src) = read3(index_key, Prefix::RedelegationByGovernorDstIndex)?;
    red_key(delegator, src, dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KeyError;

    const DEL: &[u8] = &[0xD1, 0xD2, 0xD3];
    const SRC: &[u8] = &[0x51];
    const DST: &[u8] = &[0xE1, 0xE2];

    #[test]
    fn test_delegation_key_layout() {
        let key = delegation_key(DEL, SRC).unwrap();
        assert_eq!(key, vec![0x31, 3, 0xD1, 0xD2, 0xD3, 1, 0x51]);
        assert!(key.starts_with(&delegations_key(DEL).unwrap()));

        let addrs = parse_delegation_key(&key).unwrap();
        assert_eq!(addrs.delegator, DEL);
        assert_eq!(addrs.governor, SRC);
    }

    #[test]
    fn test_ubd_index_rearranges_to_primary() {
        let index = ubd_by_governor_index_key(DEL, SRC).unwrap();
        assert_eq!(index, vec![0x33, 1, 0x51, 3, 0xD1, 0xD2, 0xD3]);
        assert!(index.starts_with(&ubds_by_governor_index_key(SRC).unwrap()));

        let primary = ubd_key_from_governor_index_key(&index).unwrap();
        assert_eq!(primary, ubd_key(DEL, SRC).unwrap());
        assert!(primary.starts_with(&ubds_key(DEL).unwrap()));

        let addrs = parse_ubd_key(&primary).unwrap();
        assert_eq!(addrs.delegator, DEL);
        assert_eq!(addrs.governor, SRC);
    }

    #[test]
    fn test_red_key_layout() {
        let key = red_key(DEL, SRC, DST).unwrap();
        assert_eq!(
            key,
            vec![0x34, 3, 0xD1, 0xD2, 0xD3, 1, 0x51, 2, 0xE1, 0xE2]
        );
        assert!(key.starts_with(&reds_key(DEL).unwrap()));
        assert_eq!(
            parse_red_key(&key).unwrap(),
            RedelegationAddrs {
                delegator: DEL,
                src: SRC,
                dst: DST
            }
        );
    }

    #[test]
    fn test_red_indexes_rearrange_to_primary() {
        let cases: [(&[u8], &[u8], &[u8]); 4] = [
            (DEL, SRC, DST),
            (&[0x01; 20], &[0x02; 32], &[0x03; 20]),
            (&[], &[0x09], &[]),
            (&[0xFF; 255], &[0x00; 255], &[0x7F; 1]),
        ];

        for (del, src, dst) in cases {
            let primary = red_key(del, src, dst).unwrap();

            let by_src = red_by_governor_src_index_key(del, src, dst).unwrap();
            assert!(by_src.starts_with(&reds_from_governor_src_index_key(src).unwrap()));
            assert_eq!(red_key_from_governor_src_index_key(&by_src).unwrap(), primary);

            let by_dst = red_by_governor_dst_index_key(del, src, dst).unwrap();
            assert!(by_dst.starts_with(&reds_to_governor_dst_index_key(dst).unwrap()));
            assert!(by_dst
                .starts_with(&reds_by_delegator_to_governor_dst_index_key(del, dst).unwrap()));
            assert_eq!(red_key_from_governor_dst_index_key(&by_dst).unwrap(), primary);
        }
    }

    #[test]
    fn test_index_keys_are_distinct_per_variant() {
        let by_src = red_by_governor_src_index_key(DEL, SRC, DST).unwrap();
        let by_dst = red_by_governor_dst_index_key(DEL, SRC, DST).unwrap();
        assert_eq!(by_src[0], 0x35);
        assert_eq!(by_dst[0], 0x36);
        assert_eq!(&by_src[1..3], &[1, 0x51]);
        assert_eq!(&by_dst[1..4], &[2, 0xE1, 0xE2]);
    }

    #[test]
    fn test_truncated_index_keys_fail() {
        let index = red_by_governor_src_index_key(DEL, SRC, DST).unwrap();
        for cut in 0..index.len() {
            assert!(
                red_key_from_governor_src_index_key(&index[..cut]).is_err(),
                "accepted key cut at {}",
                cut
            );
        }

        assert!(matches!(
            ubd_key_from_governor_index_key(&[0x33]),
            Err(KeyError::KeyTooShort { .. })
        ));
        assert!(matches!(
            ubd_key_from_governor_index_key(&[0x33, 4, 0xAA]),
            Err(KeyError::KeyTooShort { .. })
        ));
    }

    #[test]
    fn test_index_key_with_wrong_prefix_fails() {
        let by_dst = red_by_governor_dst_index_key(DEL, SRC, DST).unwrap();
        assert!(matches!(
            red_key_from_governor_src_index_key(&by_dst),
            Err(KeyError::InvalidPrefix { .. })
        ));
    }

    #[test]
    fn test_address_too_long_is_precondition() {
        let err = red_key(&[0; 256], SRC, DST).unwrap_err();
        assert_eq!(err, KeyError::AddressTooLong(256));
        assert!(err.is_precondition());
    }
}
