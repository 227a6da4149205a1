/// Log the destination and calldata of a transaction about to be sent
macro_rules! log_tx_details {
    ($tx:expr) => {
        // "0x..."
        let data = format!(
            "0x{}",
            hex::encode(&$tx.data().map(|b| b.to_vec()).unwrap_or_default())
        );

        let to = $tx
            .to()
            .cloned()
            .unwrap_or_else(|| ethers::types::NameOrAddress::Address(Default::default()));

        tracing::info!(
            to = ?to,
            data = %data,
            value = ?$tx.value(),
            nonce = ?$tx.nonce(),
            "Dispatching transaction"
        );
    };
}
