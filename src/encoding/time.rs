//! Sortable timestamp encoding for the maturity queues.
//!
//! Queue scans rely on byte order matching chronological order, so the
//! encoding must be monotonic under lexicographic comparison and either fixed
//! width or self-delimited. Whatever codec a store starts with, it keeps:
//! switching codecs reorders every queue already written.

use crate::error::KeyError;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

pub type Result<T> = std::result::Result<T, KeyError>;

/// Format written by [`SortableTime`]. Fractional seconds are always nine digits.
pub const SORTABLE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9f";

/// Width of a [`SortableTime`] encoding in bytes.
pub const SORTABLE_TIME_LEN: usize = 29;

/// Encodes and decodes timestamps embedded in keys.
pub trait TimeCodec {
    /// Encodes `timestamp`; failures mean it has no sortable representation.
    fn encode(&self, timestamp: &DateTime<Utc>) -> Result<Vec<u8>>;

    /// Decodes bytes produced by [`TimeCodec::encode`].
    fn decode(&self, bytes: &[u8]) -> Result<DateTime<Utc>>;
}

/// UTC as `YYYY-MM-DDTHH:MM:SS.nnnnnnnnn`, 29 ASCII bytes.
///
/// Only years 0000 through 9999 fit the fixed width; anything else is
/// rejected at encode time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortableTime;

impl TimeCodec for SortableTime {
    fn encode(&self, timestamp: &DateTime<Utc>) -> Result<Vec<u8>> {
        let formatted = timestamp.format(SORTABLE_TIME_FORMAT).to_string();
        if formatted.len() != SORTABLE_TIME_LEN {
            return Err(KeyError::InvalidTime(format!(
                "{} has no fixed-width encoding",
                formatted
            )));
        }
        Ok(formatted.into_bytes())
    }

    fn decode(&self, bytes: &[u8]) -> Result<DateTime<Utc>> {
        if bytes.len() != SORTABLE_TIME_LEN {
            return Err(KeyError::InvalidTime(format!(
                "expected {} bytes, got {}",
                SORTABLE_TIME_LEN,
                bytes.len()
            )));
        }

        let text = std::str::from_utf8(bytes)
            .map_err(|err| KeyError::InvalidTime(err.to_string()))?;
        if !text.as_bytes()[0].is_ascii_digit() || text.as_bytes()[19] != b'.' {
            return Err(KeyError::InvalidTime(format!("malformed timestamp {:?}", text)));
        }

        let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
            .map_err(|err| KeyError::InvalidTime(format!("{:?}: {}", text, err)))?;
        Ok(Utc.from_utc_datetime(&naive))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(secs: i64, nanos: u32) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, nanos).unwrap()
    }

    #[test]
    fn test_encoding_is_fixed_width() {
        let encoded = SortableTime.encode(&at(1_700_000_000, 5)).unwrap();
        assert_eq!(encoded.len(), SORTABLE_TIME_LEN);
        assert_eq!(encoded, b"2023-11-14T22:13:20.000000005".to_vec());
    }

    #[test]
    fn test_decode_recovers_nanoseconds() {
        let ts = at(1_650_000_000, 123_456_789);
        let encoded = SortableTime.encode(&ts).unwrap();
        assert_eq!(SortableTime.decode(&encoded).unwrap(), ts);

        let epoch = at(0, 0);
        let encoded = SortableTime.encode(&epoch).unwrap();
        assert_eq!(encoded, b"1970-01-01T00:00:00.000000000".to_vec());
        assert_eq!(SortableTime.decode(&encoded).unwrap(), epoch);
    }

    #[test]
    fn test_byte_order_follows_time_order() {
        let base = at(1_600_000_000, 999_999_999);
        let steps = [
            Duration::nanoseconds(1),
            Duration::seconds(1),
            Duration::days(1),
            Duration::days(400),
        ];

        let earlier = SortableTime.encode(&base).unwrap();
        for step in steps {
            let later = SortableTime.encode(&(base + step)).unwrap();
            assert!(earlier < later, "step {:?} did not sort later", step);
        }
    }

    #[test]
    fn test_rejects_out_of_range_year() {
        let far = Utc.with_ymd_and_hms(10_000, 1, 1, 0, 0, 0).unwrap();
        assert!(matches!(
            SortableTime.encode(&far),
            Err(KeyError::InvalidTime(_))
        ));
    }

    #[test]
    fn test_rejects_malformed_bytes() {
        assert!(SortableTime.decode(b"").is_err());
        assert!(SortableTime.decode(b"2023-11-14T22:13:20").is_err());
        assert!(SortableTime.decode(b"2023-11-14T22:13:20,000000005").is_err());
        assert!(SortableTime.decode(b"2023-13-14T22:13:20.000000005").is_err());
        assert!(SortableTime.decode(&[0xFF; SORTABLE_TIME_LEN]).is_err());
    }
}
