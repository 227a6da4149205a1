/// Type conversion errors
#[derive(thiserror::Error, Debug)]
pub enum CourierTypeError {
    /// Job ids are 32 bytes of hex
    #[error("Expected a 0x-prefixed 32-byte hex job id, got: {0}")]
    InvalidJobId(String),
    /// U256 strings must be decimal or 0x-prefixed hex
    #[error("Unable to parse U256 from string: {0}")]
    InvalidU256(String),
}
