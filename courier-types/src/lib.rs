//! Common Courier data structures used across the stack (configuration,
//! coordination core, agents)

mod error;
pub use error::*;

mod macros;

use ethers::prelude::{H256, U256};
use serde::{de, Deserializer};
use std::{fmt, ops::Deref, str::FromStr};

/// Strip a leading `0x` if present
pub fn strip_0x_prefix(s: &str) -> &str {
    s.strip_prefix("0x").unwrap_or(s)
}

/// Parse a U256 from a decimal string or a 0x-prepended hex string
pub fn parse_u256(s: &str) -> Result<U256, CourierTypeError> {
    let parsed = match s.strip_prefix("0x") {
        Some("") => Ok(U256::zero()),
        Some(hex) => U256::from_str_radix(hex, 16).map_err(|_| ()),
        None => U256::from_dec_str(s).map_err(|_| ()),
    };
    parsed.map_err(|_| CourierTypeError::InvalidU256(s.to_owned()))
}

/// The content-addressed identifier of a job: keccak256 of its canonical
/// payload bytes
#[derive(Debug, Clone, Copy, Eq, PartialEq, PartialOrd, Ord, serde::Serialize, Default, Hash)]
pub struct JobId(H256);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.as_bytes()))
    }
}

impl Deref for JobId {
    type Target = H256;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<H256> for JobId {
    fn from(h: H256) -> Self {
        Self(h)
    }
}

impl From<[u8; 32]> for JobId {
    fn from(buf: [u8; 32]) -> Self {
        Self(H256::from(buf))
    }
}

impl From<JobId> for H256 {
    fn from(id: JobId) -> Self {
        id.0
    }
}

impl AsRef<[u8]> for JobId {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl FromStr for JobId {
    type Err = CourierTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = strip_0x_prefix(s);
        if stripped.len() != 64 {
            return Err(CourierTypeError::InvalidJobId(s.to_owned()));
        }
        let bytes = hex::decode(stripped).map_err(|_| CourierTypeError::InvalidJobId(s.to_owned()))?;
        Ok(Self(H256::from_slice(&bytes)))
    }
}

impl<'de> serde::Deserialize<'de> for JobId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

// Implement deser_courier_number for all uint types
impl_deser_courier_number!(u128, u64, u32, u16, u8);

struct U256Visitor;

impl<'de> de::Visitor<'de> for U256Visitor {
    type Value = U256;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an integer, a decimal string, or a 0x-prepended hexadecimal string")
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(U256::from(v))
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        parse_u256(v).map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

/// Permissive deserialization of U256. Allows numbers, hex strings, and
/// decimal strings
pub fn deser_courier_u256<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(U256Visitor)
}

/// Permissive deserialization of an optional U256
pub fn deser_courier_opt_u256<'de, D>(deserializer: D) -> Result<Option<U256>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(serde::Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "deser_courier_u256")] U256);

    let opt: Option<Wrapper> = serde::Deserialize::deserialize(deserializer)?;
    Ok(opt.map(|Wrapper(v)| v))
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    #[test]
    fn it_sers_and_desers_job_ids() {
        let raw = json! {"0x00000000000000000000000000000000000000000000000000000000000000ff"};
        let id: JobId = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(id, JobId::from(H256::from_low_u64_be(255)));
        assert_eq!(serde_json::to_value(id).unwrap(), raw);
        assert_eq!(id.to_string(), raw.as_str().unwrap());
    }

    #[test]
    fn it_rejects_short_job_ids() {
        assert!("0xdeadbeef".parse::<JobId>().is_err());
        assert!(serde_json::from_value::<JobId>(json! {"nothex"}).is_err());
    }

    #[test]
    fn it_sers_and_desers_numbers() {
        let five = 5u32;

        let val = json! { 5 };
        let n = deser_courier_u32(val).unwrap();
        assert_eq!(n, five);

        let val = json! { "5" };
        let n = deser_courier_u32(val).unwrap();
        assert_eq!(n, five);

        let val = json! { "0x5" };
        let n = deser_courier_u32(val).unwrap();
        assert_eq!(n, five);

        let val = json! { " 0X5 " };
        let n = deser_courier_u32(val).unwrap();
        assert_eq!(n, five);

        let val = json! { 300 };
        assert!(deser_courier_u8(val).is_err());
        assert!(deser_courier_u8(json! { -1 }).is_err());
    }

    #[test]
    fn it_desers_u256_from_strings() {
        let gwei = U256::from(30_000_000_000u64);
        assert_eq!(deser_courier_u256(json! { 30_000_000_000u64 }).unwrap(), gwei);
        assert_eq!(deser_courier_u256(json! { "30000000000" }).unwrap(), gwei);
        assert_eq!(deser_courier_u256(json! { "0x6fc23ac00" }).unwrap(), gwei);
        assert!(deser_courier_u256(json! { "thirty" }).is_err());

        assert_eq!(deser_courier_opt_u256(json! { null }).unwrap(), None);
        assert_eq!(deser_courier_opt_u256(json! { "0x10" }).unwrap(), Some(U256::from(16)));
    }
}
