use courier_core::ChainCommunicationError;
use ethers::core::types::H256;
use ethers::prelude::ProviderError;

/// Ethereum-specific error wrapper
#[derive(Debug, thiserror::Error)]
pub enum EthereumError {
    /// Ethers provider error
    #[error("{0}")]
    ProviderError(#[from] ProviderError),
    /// Middleware error, flattened to its message
    #[error("{0}")]
    MiddlewareError(String),
    /// A transaction was dropped from the mempool
    #[error("Transaction dropped from mempool {0:?}")]
    DroppedError(H256),
    /// Transaction was not executed successfully
    #[error("Transaction was not executed successfully {0:?}")]
    TxNotExecuted(H256),
}

/// Node rejection messages that a resubmission can fix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rejection {
    FeeTooLow,
    NonceUsed,
    OutOfGas,
}

const FEE_TOO_LOW: &[&str] = &[
    "fee too low",
    "underpriced",
    "max fee per gas less than block base fee",
];
const NONCE_USED: &[&str] = &["nonce too low", "already known", "nonce has already been used"];
const OUT_OF_GAS: &[&str] = &["out of gas", "gas required exceeds allowance", "intrinsic gas too low"];

/// Classify a node error message. Geth, Erigon and Nethermind word these
/// differently, so match on fragments
pub(crate) fn classify(message: &str) -> Option<Rejection> {
    let message = message.to_lowercase();
    let any = |needles: &[&str]| needles.iter().any(|n| message.contains(n));
    if any(FEE_TOO_LOW) {
        Some(Rejection::FeeTooLow)
    } else if any(NONCE_USED) {
        Some(Rejection::NonceUsed)
    } else if any(OUT_OF_GAS) {
        Some(Rejection::OutOfGas)
    } else {
        None
    }
}

impl From<EthereumError> for ChainCommunicationError {
    fn from(e: EthereumError) -> Self {
        if let EthereumError::TxNotExecuted(txid) = e {
            return ChainCommunicationError::NotExecuted(txid);
        }
        let message = e.to_string();
        match classify(&message) {
            Some(Rejection::FeeTooLow) => ChainCommunicationError::FeeTooLow(message),
            Some(Rejection::NonceUsed) => ChainCommunicationError::NonceUsed(message),
            _ => ChainCommunicationError::CustomError(Box::new(e)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_classifies_node_rejections() {
        assert_eq!(
            classify("replacement transaction underpriced"),
            Some(Rejection::FeeTooLow)
        );
        assert_eq!(classify("Nonce too low"), Some(Rejection::NonceUsed));
        assert_eq!(classify("already known"), Some(Rejection::NonceUsed));
        assert_eq!(
            classify("gas required exceeds allowance (100000)"),
            Some(Rejection::OutOfGas)
        );
        assert_eq!(classify("execution reverted: paused"), None);
    }

    #[test]
    fn transient_rejections_become_retryable() {
        let err: ChainCommunicationError =
            EthereumError::ProviderError(ProviderError::CustomError("nonce too low".into())).into();
        assert!(matches!(err, ChainCommunicationError::NonceUsed(_)));
        assert!(err.is_transient());

        let err: ChainCommunicationError =
            EthereumError::MiddlewareError("transaction underpriced".into()).into();
        assert!(matches!(err, ChainCommunicationError::FeeTooLow(_)));

        let err: ChainCommunicationError = EthereumError::TxNotExecuted(H256::zero()).into();
        assert!(matches!(err, ChainCommunicationError::NotExecuted(_)));

        let err: ChainCommunicationError =
            EthereumError::MiddlewareError("execution reverted".into()).into();
        assert!(!err.is_transient());
    }
}
