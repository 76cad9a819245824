//! Chain-domain scalar types with hex wire encodings.
//!
//! Each type here is an exemplar in the override table. Their [`JsonSchema`] impls return
//! the same literal the table holds, so a struct field of type [`Hash`] reflects to the
//! keccak schema just like a top-level `Hash` parameter does.

use crate::type_mapper::reflected_override;
use schemars::{JsonSchema, SchemaGenerator};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Failure to decode a hex-encoded primitive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexError(String);

impl fmt::Display for HexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid hex value: {}", self.0)
    }
}

impl std::error::Error for HexError {}

fn strip_prefix(s: &str) -> Result<&str, HexError> {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .ok_or_else(|| HexError(format!("{:?} is missing the 0x prefix", s)))
}

fn decode_even(digits: &str) -> Result<Vec<u8>, HexError> {
    let padded: Cow<str> = if digits.len() % 2 == 1 {
        Cow::Owned(format!("0{}", digits))
    } else {
        Cow::Borrowed(digits)
    };
    hex::decode(padded.as_ref()).map_err(|e| HexError(format!("{:?}: {}", digits, e)))
}

macro_rules! json_schema_from_override {
    ($ty:ty, $name:literal) => {
        impl JsonSchema for $ty {
            fn inline_schema() -> bool {
                true
            }

            fn schema_name() -> Cow<'static, str> {
                Cow::Borrowed($name)
            }

            fn json_schema(_: &mut SchemaGenerator) -> schemars::Schema {
                reflected_override::<$ty>()
            }
        }
    };
}

macro_rules! serde_via_str {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(self)
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = String::deserialize(deserializer)?;
                text.parse().map_err(D::Error::custom)
            }
        }
    };
}

macro_rules! fixed_bytes {
    ($(#[$meta:meta])* $name:ident, $len:expr, $schema_name:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name([0u8; $len])
            }
        }

        impl From<[u8; $len]> for $name {
            fn from(bytes: [u8; $len]) -> Self {
                $name(bytes)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "0x{}", hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = HexError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let digits = strip_prefix(s)?;
                let mut bytes = [0u8; $len];
                hex::decode_to_slice(digits, &mut bytes)
                    .map_err(|e| HexError(format!("{:?}: {}", s, e)))?;
                Ok($name(bytes))
            }
        }

        serde_via_str!($name);
        json_schema_from_override!($name, $schema_name);
    };
}

fixed_bytes!(
    /// A 20-byte account address
    Address,
    20,
    "address"
);

fixed_bytes!(
    /// A 32-byte Keccak-256 hash
    Hash,
    32,
    "keccak"
);

fixed_bytes!(
    /// An 8-byte proof-of-work nonce
    BlockNonce,
    8,
    "integer"
);

impl BlockNonce {
    pub fn from_u64(n: u64) -> Self {
        BlockNonce(n.to_be_bytes())
    }

    pub fn to_u64(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }
}

/// Arbitrary-precision signed integer, encoded as a `0x` quantity
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BigInt {
    negative: bool,
    /// Big-endian magnitude without leading zero bytes
    magnitude: Vec<u8>,
}

impl BigInt {
    /// Builds a value from a sign and big-endian magnitude bytes
    pub fn from_be_bytes(negative: bool, bytes: &[u8]) -> Self {
        let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        let magnitude = bytes[start..].to_vec();
        BigInt {
            negative: negative && !magnitude.is_empty(),
            magnitude,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.magnitude.is_empty()
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    /// Big-endian magnitude bytes, empty for zero
    pub fn magnitude(&self) -> &[u8] {
        &self.magnitude
    }

    /// The value as `u128`, if non-negative and small enough
    pub fn to_u128(&self) -> Option<u128> {
        if self.negative || self.magnitude.len() > 16 {
            return None;
        }
        Some(
            self.magnitude
                .iter()
                .fold(0u128, |acc, b| (acc << 8) | u128::from(*b)),
        )
    }
}

impl From<u64> for BigInt {
    fn from(n: u64) -> Self {
        BigInt::from_be_bytes(false, &n.to_be_bytes())
    }
}

impl From<u128> for BigInt {
    fn from(n: u128) -> Self {
        BigInt::from_be_bytes(false, &n.to_be_bytes())
    }
}

impl From<i64> for BigInt {
    fn from(n: i64) -> Self {
        BigInt::from_be_bytes(n < 0, &n.unsigned_abs().to_be_bytes())
    }
}

impl fmt::Display for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        let digits = hex::encode(&self.magnitude);
        let trimmed = digits.trim_start_matches('0');
        if trimmed.is_empty() {
            f.write_str("0x0")
        } else {
            write!(f, "0x{}", trimmed)
        }
    }
}

impl FromStr for BigInt {
    type Err = HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (negative, unsigned) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let digits = strip_prefix(unsigned)?;
        if digits.is_empty() {
            return Err(HexError(format!("{:?} has no digits", s)));
        }
        Ok(BigInt::from_be_bytes(negative, &decode_even(digits)?))
    }
}

serde_via_str!(BigInt);
json_schema_from_override!(BigInt, "integer");

/// A big integer in its JSON-RPC quantity wrapper
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct HexBig(pub BigInt);

impl From<BigInt> for HexBig {
    fn from(n: BigInt) -> Self {
        HexBig(n)
    }
}

impl fmt::Display for HexBig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for HexBig {
    type Err = HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(HexBig)
    }
}

serde_via_str!(HexBig);
json_schema_from_override!(HexBig, "integer");

/// An opaque byte blob
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Bytes(pub Vec<u8>);

impl From<Vec<u8>> for Bytes {
    fn from(bytes: Vec<u8>) -> Self {
        Bytes(bytes)
    }
}

impl fmt::Display for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

impl FromStr for Bytes {
    type Err = HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = strip_prefix(s)?;
        hex::decode(digits)
            .map(Bytes)
            .map_err(|e| HexError(format!("{:?}: {}", s, e)))
    }
}

serde_via_str!(Bytes);
json_schema_from_override!(Bytes, "dataWord");

/// A block height, either a named tag or an explicit number
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockNumber {
    Earliest,
    Latest,
    Pending,
    Number(u64),
}

impl fmt::Display for BlockNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockNumber::Earliest => f.write_str("earliest"),
            BlockNumber::Latest => f.write_str("latest"),
            BlockNumber::Pending => f.write_str("pending"),
            BlockNumber::Number(n) => write!(f, "{:#x}", n),
        }
    }
}

impl FromStr for BlockNumber {
    type Err = HexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "earliest" => Ok(BlockNumber::Earliest),
            "latest" => Ok(BlockNumber::Latest),
            "pending" => Ok(BlockNumber::Pending),
            _ => {
                let digits = strip_prefix(s)?;
                u64::from_str_radix(digits, 16)
                    .map(BlockNumber::Number)
                    .map_err(|e| HexError(format!("{:?}: {}", s, e)))
            }
        }
    }
}

serde_via_str!(BlockNumber);
json_schema_from_override!(BlockNumber, "blockNumber");

/// Selects a block by number or by hash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockNumberOrHash {
    Number(BlockNumber),
    Hash {
        hash: Hash,
        require_canonical: bool,
    },
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    block_number: Option<BlockNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    block_hash: Option<Hash>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    require_canonical: bool,
}

impl Serialize for BlockNumberOrHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BlockNumberOrHash::Number(number) => number.serialize(serializer),
            BlockNumberOrHash::Hash {
                hash,
                require_canonical: false,
            } => hash.serialize(serializer),
            BlockNumberOrHash::Hash {
                hash,
                require_canonical: true,
            } => BlockSelector {
                block_number: None,
                block_hash: Some(*hash),
                require_canonical: true,
            }
            .serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for BlockNumberOrHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Text(String),
            Object(BlockSelector),
        }

        match Wire::deserialize(deserializer)? {
            Wire::Text(text) => {
                // 32-byte hashes are 66 characters with the prefix
                if text.len() == 66 {
                    text.parse()
                        .map(|hash| BlockNumberOrHash::Hash {
                            hash,
                            require_canonical: false,
                        })
                        .map_err(D::Error::custom)
                } else {
                    text.parse()
                        .map(BlockNumberOrHash::Number)
                        .map_err(D::Error::custom)
                }
            }
            Wire::Object(selector) => match (selector.block_number, selector.block_hash) {
                (Some(number), None) => Ok(BlockNumberOrHash::Number(number)),
                (None, Some(hash)) => Ok(BlockNumberOrHash::Hash {
                    hash,
                    require_canonical: selector.require_canonical,
                }),
                _ => Err(D::Error::custom(
                    "exactly one of blockNumber and blockHash must be set",
                )),
            },
        }
    }
}

json_schema_from_override!(BlockNumberOrHash, "blockNumberOrHash");

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_address_hex() {
        let text = "0x00000000000000000000000000000000deadbeef";
        let address: Address = text.parse().unwrap();
        assert_eq!(&address.0[16..], &[0xde, 0xad, 0xbe, 0xef][..]);
        assert_eq!(address.to_string(), text);
        assert_eq!(serde_json::to_value(address).unwrap(), json!(text));
    }

    #[test]
    fn test_fixed_bytes_reject_wrong_length() {
        assert!("0xdeadbeef".parse::<Hash>().is_err());
        assert!("deadbeef".parse::<BlockNonce>().is_err());
    }

    #[test]
    fn test_block_nonce_u64() {
        let nonce = BlockNonce::from_u64(0x42);
        assert_eq!(nonce.to_string(), "0x0000000000000042");
        assert_eq!(nonce.to_u64(), 0x42);
    }

    #[test]
    fn test_big_int_quantity_encoding() {
        assert_eq!(BigInt::from(0u64).to_string(), "0x0");
        assert_eq!(BigInt::from(255u64).to_string(), "0xff");
        assert_eq!(BigInt::from(256u64).to_string(), "0x100");
        assert_eq!(BigInt::from(-16i64).to_string(), "-0x10");

        let parsed: BigInt = "0x1bc16d674ec80000".parse().unwrap();
        assert_eq!(parsed.to_u128(), Some(2_000_000_000_000_000_000));
        assert!("-0x0".parse::<BigInt>().unwrap().is_zero());
        assert!(!"-0x0".parse::<BigInt>().unwrap().is_negative());
        assert!("0x".parse::<BigInt>().is_err());
    }

    #[test]
    fn test_bytes_allow_empty() {
        let empty: Bytes = serde_json::from_value(json!("0x")).unwrap();
        assert!(empty.0.is_empty());
        assert_eq!(Bytes(vec![1, 2]).to_string(), "0x0102");
    }

    #[test]
    fn test_block_number_tags() {
        assert_eq!(
            serde_json::from_value::<BlockNumber>(json!("latest")).unwrap(),
            BlockNumber::Latest
        );
        assert_eq!(
            serde_json::from_value::<BlockNumber>(json!("0x10")).unwrap(),
            BlockNumber::Number(16)
        );
        assert_eq!(
            serde_json::to_value(BlockNumber::Number(255)).unwrap(),
            json!("0xff")
        );
    }

    #[test]
    fn test_block_number_or_hash_forms() {
        let hash = format!("0x{}", "ab".repeat(32));

        let by_number: BlockNumberOrHash = serde_json::from_value(json!("pending")).unwrap();
        assert_eq!(by_number, BlockNumberOrHash::Number(BlockNumber::Pending));

        let by_hash: BlockNumberOrHash = serde_json::from_value(json!(hash)).unwrap();
        assert!(matches!(
            by_hash,
            BlockNumberOrHash::Hash {
                require_canonical: false,
                ..
            }
        ));

        let canonical: BlockNumberOrHash =
            serde_json::from_value(json!({"blockHash": hash, "requireCanonical": true})).unwrap();
        assert_eq!(
            serde_json::to_value(canonical).unwrap(),
            json!({"blockHash": hash, "requireCanonical": true})
        );

        assert!(serde_json::from_value::<BlockNumberOrHash>(json!({})).is_err());
    }

    #[test]
    fn test_nested_fields_reflect_override_literals() {
        #[derive(JsonSchema)]
        #[allow(dead_code)]
        struct Receipt {
            block_hash: Hash,
            from: Address,
        }

        let schema = schemars::generate::SchemaSettings::draft07()
            .into_generator()
            .into_root_schema_for::<Receipt>();
        let value = serde_json::to_value(&schema).unwrap();

        assert_eq!(value["properties"]["block_hash"]["title"], "keccak");
        assert_eq!(
            value["properties"]["from"]["pattern"],
            "^0x[a-fA-F\\d]{40}$"
        );
    }
}
