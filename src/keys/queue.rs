//! Maturity queue keys.
//!
//! Time key:          [prefix][time bytes]
//! Governor queue key: [0x43][time len: u64 BE][time bytes][height: u64 BE]
//!
//! Earlier timestamps sort first, so the matured entries of a queue are the
//! range from its prefix up to the key of "now". The explicit length in the
//! governor queue key lets the parser find the height without assuming a
//! time width.

use super::Result;
use crate::encoding::key::{KeyReader, KeyWriter};
use crate::encoding::time::{SortableTime, TimeCodec};
use crate::error::KeyError;
use crate::prefix::Prefix;
use chrono::{DateTime, Utc};

/// `prefix ‖ time` using `codec`.
pub fn time_key_with<C: TimeCodec + ?Sized>(
    codec: &C,
    prefix: Prefix,
    timestamp: &DateTime<Utc>,
) -> Result<Vec<u8>> {
    let time_bz = codec.encode(timestamp)?;
    Ok(KeyWriter::with_capacity(prefix, time_bz.len())
        .raw(&time_bz)
        .finish())
}

/// `prefix ‖ time` using the default sortable encoding.
pub fn time_key(prefix: Prefix, timestamp: &DateTime<Utc>) -> Result<Vec<u8>> {
    time_key_with(&SortableTime, prefix, timestamp)
}

/// Timestamp from a key built by [`time_key_with`].
pub fn parse_time_key_with<C: TimeCodec + ?Sized>(
    codec: &C,
    prefix: Prefix,
    key: &[u8],
) -> Result<DateTime<Utc>> {
    let mut reader = KeyReader::with_prefix(key, prefix)?;
    codec.decode(reader.rest())
}

/// Timestamp from a key built by [`time_key`].
pub fn parse_time_key(prefix: Prefix, key: &[u8]) -> Result<DateTime<Utc>> {
    parse_time_key_with(&SortableTime, prefix, key)
}

/// Unbonding queue key for entries maturing at `timestamp`.
pub fn unbonding_delegation_time_key(timestamp: &DateTime<Utc>) -> Result<Vec<u8>> {
    time_key(Prefix::UnbondingQueue, timestamp)
}

/// Redelegation queue key for entries maturing at `timestamp`.
pub fn redelegation_time_key(timestamp: &DateTime<Utc>) -> Result<Vec<u8>> {
    time_key(Prefix::RedelegationQueue, timestamp)
}

/// Governor queue key for governors unbonding at `timestamp` and `height`.
pub fn governor_queue_key_with<C: TimeCodec + ?Sized>(
    codec: &C,
    timestamp: &DateTime<Utc>,
    height: u64,
) -> Result<Vec<u8>> {
    let time_bz = codec.encode(timestamp)?;

    Ok(
        KeyWriter::with_capacity(Prefix::GovernorQueue, 8 + time_bz.len() + 8)
            .u64_be(time_bz.len() as u64)
            .raw(&time_bz)
            .u64_be(height)
            .finish(),
    )
}

/// Governor queue key using the default sortable encoding.
pub fn governor_queue_key(timestamp: &DateTime<Utc>, height: u64) -> Result<Vec<u8>> {
    governor_queue_key_with(&SortableTime, timestamp, height)
}

/// Time and height from a key built by [`governor_queue_key_with`].
pub fn parse_governor_queue_key_with<C: TimeCodec + ?Sized>(
    codec: &C,
    bz: &[u8],
) -> Result<(DateTime<Utc>, u64)> {
    let mut reader = KeyReader::with_prefix(bz, Prefix::GovernorQueue)?;

    let time_len = reader.u64_be()?;
    let time_len = usize::try_from(time_len).map_err(|_| KeyError::KeyTooShort {
        expected: usize::MAX,
        actual: bz.len(),
    })?;
    let timestamp = codec.decode(reader.take(time_len)?)?;

    if reader.remaining() > 8 {
        return Err(KeyError::LengthMismatch {
            declared: 8,
            remaining: reader.remaining(),
        });
    }
    let height = reader.u64_be()?;

    Ok((timestamp, height))
}

/// Time and height from a key built by [`governor_queue_key`].
pub fn parse_governor_queue_key(bz: &[u8]) -> Result<(DateTime<Utc>, u64)> {
    parse_governor_queue_key_with(&SortableTime, bz)
}
