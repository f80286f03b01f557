use alloy::primitives::U256;
use camino::Utf8Path;
use eyre::{Result as EyreResult, WrapErr};
use thiserror::Error as ThisError;
use tokio::fs::read;

#[derive(Debug, ThisError)]
#[non_exhaustive]
pub enum QuantityError {
    #[error("invalid {name}: {value:?} is neither a 0x-prefixed hex nor a decimal number")]
    Malformed { name: &'static str, value: String },

    #[error("invalid {name}: {value:?} does not fit in {bits} bits")]
    Overflow {
        name: &'static str,
        value: String,
        bits: u32,
    },

    #[error("invalid {name}: {source}")]
    Hex {
        name: &'static str,
        source: hex::FromHexError,
    },

    #[error("invalid {name}: expected {expected} hex characters, got {actual}")]
    HexLength {
        name: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Splits a quantity into its digits and radix, rejecting anything that is
/// not a plain run of digits in that radix.
fn digits<'a>(name: &'static str, value: &'a str) -> Result<(&'a str, u32), QuantityError> {
    let (digits, radix) = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(digits) => (digits, 16),
        None => (value, 10),
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(QuantityError::Malformed {
            name,
            value: value.to_owned(),
        });
    }

    Ok((digits, radix))
}

pub fn parse_u256(name: &'static str, value: &str) -> Result<U256, QuantityError> {
    let (digits, radix) = digits(name, value)?;

    U256::from_str_radix(digits, u64::from(radix)).map_err(|_| QuantityError::Overflow {
        name,
        value: value.to_owned(),
        bits: 256,
    })
}

pub fn parse_u128(name: &'static str, value: &str) -> Result<u128, QuantityError> {
    let (digits, radix) = digits(name, value)?;

    u128::from_str_radix(digits, radix).map_err(|_| QuantityError::Overflow {
        name,
        value: value.to_owned(),
        bits: 128,
    })
}

/// `0x`-prefixed input is hex, anything else is taken as raw UTF-8 bytes.
pub fn parse_calldata(value: &str) -> Result<Vec<u8>, QuantityError> {
    match value.strip_prefix("0x") {
        Some(encoded) => hex::decode(encoded).map_err(|source| QuantityError::Hex {
            name: "calldata",
            source,
        }),
        None => Ok(value.as_bytes().to_vec()),
    }
}

pub fn parse_hex32(name: &'static str, value: &str) -> Result<[u8; 32], QuantityError> {
    let mut out = [0; 32];

    if value.len() != out.len() * 2 {
        return Err(QuantityError::HexLength {
            name,
            expected: out.len() * 2,
            actual: value.len(),
        });
    }

    hex::decode_to_slice(value, &mut out).map_err(|source| QuantityError::Hex { name, source })?;

    Ok(out)
}

pub async fn read_payload(path: &Utf8Path) -> EyreResult<Vec<u8>> {
    read(path)
        .await
        .wrap_err_with(|| format!("failed to read blob file {path}"))
}
