use num_bigint::{BigInt, BigUint};
use thiserror::Error;

const HEX_PREFIX: &str = "0x";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed hex value {input:?}: {reason}")]
pub struct MalformedHexError {
    pub input: String,
    pub reason: &'static str,
}

impl MalformedHexError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

/// Parse a `0x`-prefixed quantity as returned by the node into an unbounded integer.
///
/// Digits are case-insensitive. The result is always non-negative; it is a
/// `BigInt` so callers can subtract from it without converting.
pub fn parse_big_hex(input: &str) -> Result<BigInt, MalformedHexError> {
    let digits = input
        .strip_prefix(HEX_PREFIX)
        .ok_or_else(|| MalformedHexError::new(input, "missing 0x prefix"))?;

    if digits.is_empty() {
        return Err(MalformedHexError::new(input, "no digits after 0x prefix"));
    }

    // from_str_radix tolerates `_` separators and a leading `+`, the node never sends those
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(MalformedHexError::new(input, "invalid base-16 digit"));
    }

    BigUint::parse_bytes(digits.as_bytes(), 16)
        .map(BigInt::from)
        .ok_or_else(|| MalformedHexError::new(input, "invalid base-16 digit"))
}

/// Parse a block number quantity, rejecting values that do not fit in 64 bits.
pub fn parse_block_number(input: &str) -> Result<u64, MalformedHexError> {
    let value = parse_big_hex(input)?;
    u64::try_from(&value).map_err(|_| MalformedHexError::new(input, "exceeds 64 bits"))
}

/// Minimal-width `0x` encoding, e.g. `0x0`, `0x64`.
pub fn to_hex(number: u64) -> String {
    format!("{number:#x}")
}
