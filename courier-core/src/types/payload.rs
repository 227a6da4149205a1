use crate::{utils::keccak, Decode, Encode};
use courier_types::JobId;
use ethers::{
    abi::{self, ParamType, Token},
    core::types::{Address, Bytes, U256},
};

/// Versioned signature whose selector prefixes every canonical payload.
/// Changing the layout means changing the version suffix.
pub const PAYLOAD_SIGNATURE: &str = "courierJobV1(uint32,address,uint256,bytes,uint256,uint256)";

/// Selector of [`PAYLOAD_SIGNATURE`]
pub fn payload_selector() -> [u8; 4] {
    ethers::utils::id(PAYLOAD_SIGNATURE)
}

fn payload_params() -> [ParamType; 6] {
    [
        ParamType::Uint(32),
        ParamType::Address,
        ParamType::Uint(256),
        ParamType::Bytes,
        ParamType::Uint(256),
        ParamType::Uint(256),
    ]
}

/// Payload decoding failures
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    /// IO error from Read/Write usage
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    /// Payload is shorter than a selector
    #[error("Payload of {0} bytes is too short to carry a selector")]
    TooShort(usize),
    /// Selector does not match the supported payload version
    #[error("Unknown payload selector 0x{0}")]
    UnknownSelector(String),
    /// ABI body could not be decoded
    #[error("Malformed payload body: {0}")]
    Abi(#[from] abi::Error),
    /// A field does not fit its declared width
    #[error("Payload field {0} is out of range")]
    OutOfRange(&'static str),
}

/// A fully assembled job payload, as carried by the transport
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPayload {
    /// Chain the job was emitted on
    pub source_chain: u32,
    /// Destination contract the effect is applied to
    pub target: Address,
    /// Per-source nonce, keeps otherwise identical jobs apart
    pub nonce: U256,
    /// Encoded call data for the target
    pub data: Bytes,
    /// Gas budget the fee was computed against
    pub gas_limit: u64,
    /// Gas price the fee was computed against
    pub gas_price: U256,
}

impl JobPayload {
    /// Replace the embedded gas parameters. Changes the job id
    pub fn with_gas(mut self, gas_limit: u64, gas_price: U256) -> Self {
        self.gas_limit = gas_limit;
        self.gas_price = gas_price;
        self
    }

    /// Content-addressed identifier of this payload
    pub fn job_id(&self) -> JobId {
        keccak([self.to_vec().as_slice()]).into()
    }

    /// Decode a payload from its canonical bytes
    pub fn from_bytes(mut bytes: &[u8]) -> Result<Self, PayloadError> {
        Self::read_from(&mut bytes)
    }

    /// Canonical bytes as an ethers `Bytes`
    pub fn to_bytes(&self) -> Bytes {
        self.to_vec().into()
    }
}

impl std::fmt::Display for JobPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "JobPayload {{ source_chain: {}, target: {:?}, nonce: {}, gas_limit: {}, gas_price: {} }}",
            self.source_chain, self.target, self.nonce, self.gas_limit, self.gas_price
        )
    }
}

impl Encode for JobPayload {
    fn write_to<W>(&self, writer: &mut W) -> std::io::Result<usize>
    where
        W: std::io::Write,
    {
        let body = abi::encode(&[
            Token::Uint(self.source_chain.into()),
            Token::Address(self.target),
            Token::Uint(self.nonce),
            Token::Bytes(self.data.to_vec()),
            Token::Uint(self.gas_limit.into()),
            Token::Uint(self.gas_price),
        ]);
        writer.write_all(&payload_selector())?;
        writer.write_all(&body)?;
        Ok(4 + body.len())
    }
}

impl Decode for JobPayload {
    fn read_from<R>(reader: &mut R) -> Result<Self, PayloadError>
    where
        R: std::io::Read,
    {
        let mut buf = vec![];
        reader.read_to_end(&mut buf)?;
        if buf.len() < 4 {
            return Err(PayloadError::TooShort(buf.len()));
        }

        let (selector, body) = buf.split_at(4);
        if selector != payload_selector() {
            return Err(PayloadError::UnknownSelector(hex::encode(selector)));
        }

        let mut tokens = abi::decode(&payload_params(), body)?.into_iter();
        let source_chain = next_uint(&mut tokens, "sourceChain")?;
        if source_chain > U256::from(u32::MAX) {
            return Err(PayloadError::OutOfRange("sourceChain"));
        }
        let target = tokens
            .next()
            .and_then(Token::into_address)
            .ok_or(PayloadError::OutOfRange("target"))?;
        let nonce = next_uint(&mut tokens, "nonce")?;
        let data = tokens
            .next()
            .and_then(Token::into_bytes)
            .ok_or(PayloadError::OutOfRange("data"))?;
        let gas_limit = next_uint(&mut tokens, "gasLimit")?;
        if gas_limit > U256::from(u64::MAX) {
            return Err(PayloadError::OutOfRange("gasLimit"));
        }
        let gas_price = next_uint(&mut tokens, "gasPrice")?;

        Ok(Self {
            source_chain: source_chain.as_u32(),
            target,
            nonce,
            data: data.into(),
            gas_limit: gas_limit.as_u64(),
            gas_price,
        })
    }
}

fn next_uint(
    tokens: &mut impl Iterator<Item = Token>,
    field: &'static str,
) -> Result<U256, PayloadError> {
    tokens
        .next()
        .and_then(Token::into_uint)
        .ok_or(PayloadError::OutOfRange(field))
}

/// Source-side payload assembly, the transport's pure `dispatch` encode
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    source_chain: u32,
    next_nonce: U256,
}

/// A payload bound for a destination chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    /// Destination chain id, used by the transport for routing
    pub destination: u32,
    /// The assembled payload
    pub payload: JobPayload,
}

impl PayloadBuilder {
    /// Start assembling payloads for `source_chain` at nonce `start`
    pub fn new(source_chain: u32, start: U256) -> Self {
        Self {
            source_chain,
            next_nonce: start,
        }
    }

    /// Assemble the next payload and advance the nonce
    pub fn dispatch(
        &mut self,
        destination: u32,
        target: Address,
        gas_limit: u64,
        gas_price: U256,
        data: impl Into<Bytes>,
    ) -> Dispatch {
        let payload = JobPayload {
            source_chain: self.source_chain,
            target,
            nonce: self.next_nonce,
            data: data.into(),
            gas_limit,
            gas_price,
        };
        self.next_nonce = self.next_nonce.saturating_add(U256::one());
        Dispatch {
            destination,
            payload,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn payload() -> JobPayload {
        JobPayload {
            source_chain: 5,
            target: Address::repeat_byte(0x11),
            nonce: U256::from(7),
            data: vec![0xde, 0xad, 0xbe, 0xef].into(),
            gas_limit: 250_000,
            gas_price: U256::from(30_000_000_000u64),
        }
    }

    #[test]
    fn it_decodes_its_own_encoding() {
        let original = payload();
        let decoded = JobPayload::from_bytes(&original.to_vec()).unwrap();
        assert_eq!(decoded, original);
        assert_eq!(decoded.job_id(), original.job_id());
    }

    #[test]
    fn gas_parameters_change_the_job_id() {
        let original = payload();
        let repriced = original.clone().with_gas(250_000, U256::from(30_000_000_001u64));
        let regassed = original.clone().with_gas(250_001, original.gas_price);
        assert_ne!(original.job_id(), repriced.job_id());
        assert_ne!(original.job_id(), regassed.job_id());
        assert_ne!(repriced.job_id(), regassed.job_id());
    }

    #[test]
    fn canonical_bytes_start_with_the_versioned_selector() {
        let bytes = payload().to_vec();
        assert_eq!(&bytes[..4], &payload_selector());
        // selector + 6 head words + length word + one padded data word
        assert_eq!(bytes.len(), 4 + 32 * 8);
    }

    #[test]
    fn it_rejects_foreign_selectors_and_short_input() {
        let mut bytes = payload().to_vec();
        bytes[0] ^= 0xff;
        assert!(matches!(
            JobPayload::from_bytes(&bytes),
            Err(PayloadError::UnknownSelector(_))
        ));
        assert!(matches!(
            JobPayload::from_bytes(&[0x01, 0x02]),
            Err(PayloadError::TooShort(2))
        ));
    }

    #[test]
    fn it_rejects_truncated_bodies() {
        let bytes = payload().to_vec();
        assert!(JobPayload::from_bytes(&bytes[..100]).is_err());
    }

    fn encode_raw(source_chain: U256, gas_limit: U256) -> Vec<u8> {
        let original = payload();
        let body = abi::encode(&[
            Token::Uint(source_chain),
            Token::Address(original.target),
            Token::Uint(original.nonce),
            Token::Bytes(original.data.to_vec()),
            Token::Uint(gas_limit),
            Token::Uint(original.gas_price),
        ]);
        [payload_selector().to_vec(), body].concat()
    }

    #[test]
    fn it_rejects_oversized_source_chains() {
        let bytes = encode_raw(U256::from(u32::MAX) + 1, U256::from(250_000));
        assert!(matches!(
            JobPayload::from_bytes(&bytes),
            Err(PayloadError::OutOfRange("sourceChain"))
        ));
    }

    #[test]
    fn it_rejects_oversized_gas_limits() {
        let bytes = encode_raw(U256::from(5), U256::from(u64::MAX) + 1);
        assert!(matches!(
            JobPayload::from_bytes(&bytes),
            Err(PayloadError::OutOfRange("gasLimit"))
        ));
        // the widest limit that still fits decodes
        let bytes = encode_raw(U256::from(5), U256::from(u64::MAX));
        assert_eq!(JobPayload::from_bytes(&bytes).unwrap().gas_limit, u64::MAX);
    }

    #[test]
    fn builder_advances_nonces() {
        let mut builder = PayloadBuilder::new(5, U256::zero());
        let first = builder.dispatch(10, Address::zero(), 100_000, U256::one(), vec![1u8]);
        let second = builder.dispatch(10, Address::zero(), 100_000, U256::one(), vec![1u8]);
        assert_eq!(first.destination, 10);
        assert_eq!(second.payload.nonce, U256::one());
        assert_ne!(first.payload.job_id(), second.payload.job_id());
    }
}
