//! Display-format addresses.
//!
//! Keys embed raw address bytes. Governors carry their operator address as a
//! bech32 string, so it is resolved here before any key is built. A string
//! that does not resolve is a caller bug and surfaces as
//! [`KeyError::InvalidAddress`].

use crate::encoding::key::MAX_ADDR_LEN;
use crate::error::KeyError;
use bech32::{FromBase32, ToBase32, Variant};

/// Decodes `address`, requiring the human-readable part `expected_hrp`.
pub fn decode_bech32(expected_hrp: &str, address: &str) -> Result<Vec<u8>, KeyError> {
    if address.trim().is_empty() {
        return Err(KeyError::InvalidAddress(
            "empty address string is not allowed".to_string(),
        ));
    }

    let (hrp, data, variant) = bech32::decode(address)
        .map_err(|err| KeyError::InvalidAddress(format!("{}: {}", address, err)))?;

    if variant != Variant::Bech32 {
        return Err(KeyError::InvalidAddress(format!(
            "{}: bech32m addresses are not accepted",
            address
        )));
    }
    if hrp != expected_hrp {
        return Err(KeyError::InvalidAddress(format!(
            "invalid Bech32 prefix; expected {}, got {}",
            expected_hrp, hrp
        )));
    }

    let bytes = Vec::<u8>::from_base32(&data)
        .map_err(|err| KeyError::InvalidAddress(format!("{}: {}", address, err)))?;
    if bytes.is_empty() {
        return Err(KeyError::InvalidAddress(format!("{}: no address bytes", address)));
    }
    if bytes.len() > MAX_ADDR_LEN {
        return Err(KeyError::AddressTooLong(bytes.len()));
    }

    Ok(bytes)
}

/// Encodes raw address bytes under `hrp`.
pub fn encode_bech32(hrp: &str, bytes: &[u8]) -> Result<String, KeyError> {
    bech32::encode(hrp, bytes.to_base32(), Variant::Bech32)
        .map_err(|err| KeyError::InvalidAddress(format!("{}: {}", hrp, err)))
}
