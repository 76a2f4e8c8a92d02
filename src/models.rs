use crate::hex::{MalformedHexError, parse_big_hex, parse_block_number};
use num_bigint::BigInt;
use num_traits::Zero;
use serde::{Deserialize, Deserializer};

/// Addresses are compared verbatim, no checksum or length validation.
pub type Address = String;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub from: Address,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub value: BigInt,
}

impl Transfer {
    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub hash: String,
    pub number: u64,
    pub transactions: Vec<Transfer>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawBlock {
    pub hash: String,
    pub number: String,
    pub transactions: Vec<RawTransaction>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawTransaction {
    pub from: String,
    // present-but-null is allowed, absent is not
    #[serde(deserialize_with = "nullable")]
    pub to: Option<String>,
    pub value: String,
}

fn nullable<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)
}

impl TryFrom<RawTransaction> for Transfer {
    type Error = MalformedHexError;

    fn try_from(raw: RawTransaction) -> Result<Self, Self::Error> {
        Ok(Transfer {
            value: parse_big_hex(&raw.value)?,
            from: raw.from,
            to: raw.to,
        })
    }
}

impl TryFrom<RawBlock> for Block {
    type Error = MalformedHexError;

    fn try_from(raw: RawBlock) -> Result<Self, Self::Error> {
        let transactions = raw
            .transactions
            .into_iter()
            .map(Transfer::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Block {
            hash: raw.hash,
            number: parse_block_number(&raw.number)?,
            transactions,
        })
    }
}
