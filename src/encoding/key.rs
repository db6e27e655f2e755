//! Key encoding and decoding primitives.
//!
//! Keys are sequences of fields behind a one-byte prefix:
//!
//! Length-prefixed field: [len: u8][bytes]
//! Integer field:         [u64 big-endian]
//!
//! `KeyWriter` builds them and `KeyReader` walks them back with an explicit
//! length check before every slice.

use crate::error::KeyError;
use crate::prefix::Prefix;

pub type Result<T> = std::result::Result<T, KeyError>;

/// Maximum length of a length-prefixed field.
pub const MAX_ADDR_LEN: usize = u8::MAX as usize;

/// Returns `[len][bytes]` for a field of at most 255 bytes.
pub fn length_prefixed(bytes: &[u8]) -> Result<Vec<u8>> {
    let len: u8 = bytes
        .len()
        .try_into()
        .map_err(|_| KeyError::AddressTooLong(bytes.len()))?;

    let mut buf = Vec::with_capacity(1 + bytes.len());
    buf.push(len);
    buf.extend_from_slice(bytes);
    Ok(buf)
}

/// Builder for keys of the form `prefix ‖ field ‖ field ...`.
#[derive(Debug, Clone)]
pub struct KeyWriter {
    buf: Vec<u8>,
}

impl KeyWriter {
    /// Starts a key with the given prefix byte.
    pub fn new(prefix: Prefix) -> Self {
        Self::with_capacity(prefix, 0)
    }

    /// Starts a key, reserving room for `capacity` bytes after the prefix.
    pub fn with_capacity(prefix: Prefix, capacity: usize) -> Self {
        let mut buf = Vec::with_capacity(1 + capacity);
        buf.push(prefix.byte());
        Self { buf }
    }

    /// Appends `[len][bytes]`.
    pub fn field(mut self, bytes: &[u8]) -> Result<Self> {
        self.buf.extend_from_slice(&length_prefixed(bytes)?);
        Ok(self)
    }

    /// Appends an 8-byte big-endian integer.
    pub fn u64_be(mut self, value: u64) -> Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    /// Appends bytes without a length prefix.
    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over an encoded key.
///
/// Every read checks the remaining length first and fails with
/// [`KeyError::KeyTooShort`] instead of reading out of bounds.
#[derive(Debug, Clone)]
pub struct KeyReader<'a> {
    key: &'a [u8],
    pos: usize,
}

impl<'a> KeyReader<'a> {
    /// Starts reading at byte zero without checking any prefix.
    pub fn new(key: &'a [u8]) -> Self {
        Self { key, pos: 0 }
    }

    /// Starts reading after `prefix`, failing if the key does not begin with it.
    pub fn with_prefix(key: &'a [u8], prefix: Prefix) -> Result<Self> {
        let mut reader = Self::new(key);
        reader.expect_prefix(&prefix.as_key())?;
        Ok(reader)
    }

    /// Consumes `expected` or fails with both byte strings in the error.
    pub fn expect_prefix(&mut self, expected: &[u8]) -> Result<()> {
        let got = self.take(expected.len())?;
        if got != expected {
            return Err(KeyError::InvalidPrefix {
                expected: expected.to_vec(),
                got: got.to_vec(),
            });
        }
        Ok(())
    }

    /// Skips `n` bytes whatever they hold.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    /// Reads exactly `n` bytes.
    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or(KeyError::KeyTooShort {
            expected: usize::MAX,
            actual: self.key.len(),
        })?;
        if end > self.key.len() {
            return Err(KeyError::KeyTooShort {
                expected: end,
                actual: self.key.len(),
            });
        }
        let bytes = &self.key[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    /// Reads a `[len][bytes]` field.
    pub fn field(&mut self) -> Result<&'a [u8]> {
        let len = self.take(1)?[0] as usize;
        self.take(len)
    }

    /// Reads an 8-byte big-endian integer.
    pub fn u64_be(&mut self) -> Result<u64> {
        let bytes = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(bytes);
        Ok(u64::from_be_bytes(buf))
    }

    /// Returns everything not yet consumed.
    pub fn rest(&mut self) -> &'a [u8] {
        let bytes = &self.key[self.pos..];
        self.pos = self.key.len();
        bytes
    }

    /// Number of bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.key.len() - self.pos
    }

    /// Reads the final `[len][bytes]` field, which must end the key.
    pub fn last_field(&mut self) -> Result<&'a [u8]> {
        let len = self.take(1)?[0] as usize;
        if len != self.remaining() {
            return Err(KeyError::LengthMismatch {
                declared: len,
                remaining: self.remaining(),
            });
        }
        self.take(len)
    }
}

/// Smallest key strictly greater than every key starting with `prefix`.
///
/// Returns `None` when no such bound exists (empty or all `0xFF`), in which
/// case the scan is unbounded above.
pub fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

/// Smallest key strictly greater than `key` itself.
pub fn inclusive_end(key: &[u8]) -> Vec<u8> {
    let mut end = Vec::with_capacity(key.len() + 1);
    end.extend_from_slice(key);
    end.push(0x00);
    end
}
