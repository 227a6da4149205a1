use courier_base::{
    DispatchError, Dispatcher, FeeCalculator, GasEstimator, RetryingSubmitter,
};
use courier_configuration::{RetryConfig, POLYGON_DEFAULT};
use courier_core::{
    ChainCommunicationError, DispatchRequest, FeeQuote, JobPayload, PayloadBuilder, Simulation,
    TxOutcome,
};
use courier_test::mocks::{MockDestinationChain, MockFeeOracle, MockSubmitter};
use ethers::core::types::{Address, H256, U256};
use std::sync::{Arc, Mutex};

const DESTINATION: u32 = 137;

fn destination() -> MockDestinationChain {
    let mut chain = MockDestinationChain::new();
    chain
        .expect__gas_price()
        .returning(|| Ok(U256::from(40_000_000_000u64)));
    // the effect costs 80k plus 16 per calldata byte
    chain.expect__simulate().returning(|payload, allowance| {
        let used = 80_000 + 16 * payload.data.len() as u64;
        Ok(Simulation {
            gas_left: allowance.saturating_sub(used),
        })
    });
    chain
}

fn oracle() -> MockFeeOracle {
    let mut oracle = MockFeeOracle::new();
    oracle
        .expect__estimate_fee()
        .returning(|_, gas_limit, gas_price, _| {
            Ok(FeeQuote {
                service_fee: gas_price * U256::from(gas_limit),
                transport_fee: U256::from(1_000),
            })
        });
    oracle
}

fn retry() -> RetryConfig {
    RetryConfig {
        max_attempts: 3,
        backoff_ms: 0,
        price_bump_bps: 1_250,
    }
}

fn draft() -> JobPayload {
    PayloadBuilder::new(5, U256::zero())
        .dispatch(DESTINATION, Address::repeat_byte(0xaa), 0, U256::zero(), vec![0u8; 4])
        .payload
}

fn dispatcher(submitter: MockSubmitter) -> Dispatcher<MockDestinationChain, MockFeeOracle, MockSubmitter> {
    Dispatcher::new(
        DESTINATION,
        GasEstimator::new(Arc::new(destination()), POLYGON_DEFAULT),
        FeeCalculator::new(Arc::new(oracle()), POLYGON_DEFAULT),
        RetryingSubmitter::new(Arc::new(submitter), retry()),
    )
}

#[tokio::test]
async fn it_submits_the_estimated_payload_with_its_fee() {
    let submitted: Arc<Mutex<Vec<DispatchRequest>>> = Default::default();
    let seen = submitted.clone();

    let mut submitter = MockSubmitter::new();
    submitter.expect__gas_price().returning(|| Ok(U256::from(1_000)));
    submitter.expect__next_nonce().returning(|| Ok(U256::from(9)));
    submitter.expect__submit().returning(move |request| {
        let mut seen = seen.lock().unwrap();
        seen.push(request.clone());
        if seen.len() == 1 {
            Err(ChainCommunicationError::FeeTooLow("replacement transaction underpriced".into()))
        } else {
            Ok(TxOutcome {
                txid: H256::repeat_byte(0x77),
            })
        }
    });

    let receipt = dispatcher(submitter).dispatch(draft()).await.unwrap();

    // 80_064 used, padded by 10%
    assert_eq!(receipt.estimate.gas_limit, 88_070);
    // 40 gwei observed, 1.5x multiplier clears the 30 gwei floor
    assert_eq!(receipt.estimate.gas_price, U256::from(60_000_000_000u64));
    assert_eq!(receipt.job_id, receipt.estimate.payload.job_id());
    assert_eq!(receipt.outcome.txid, H256::repeat_byte(0x77));

    let expected_quote = U256::from(60_000_000_000u64) * U256::from(88_070) + U256::from(1_000);
    assert_eq!(receipt.fee.quote.total(), expected_quote);
    assert_eq!(receipt.fee.total, expected_quote * U256::from(5) / U256::from(4));

    let submitted = submitted.lock().unwrap();
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[0].tx_gas_price, U256::from(1_000));
    assert_eq!(submitted[1].tx_gas_price, U256::from(1_125));
    for request in submitted.iter() {
        assert_eq!(request.destination, DESTINATION);
        assert_eq!(request.nonce, U256::from(9));
        assert_eq!(request.fee, receipt.fee.total);
        assert_eq!(request.payload, receipt.estimate.payload);
    }
}

#[tokio::test]
async fn persistent_contention_exhausts_retries() {
    let mut submitter = MockSubmitter::new();
    submitter.expect__gas_price().returning(|| Ok(U256::from(1_000)));
    submitter.expect__next_nonce().returning(|| Ok(U256::zero()));
    submitter
        .expect__submit()
        .times(3)
        .returning(|_| Err(ChainCommunicationError::NonceUsed("nonce too low".into())));

    let err = dispatcher(submitter).dispatch(draft()).await.unwrap_err();
    match err.downcast_ref::<DispatchError>() {
        Some(DispatchError::RetriesExhausted { attempts: 3, .. }) => {}
        other => panic!("unexpected error {:?}", other),
    }
}
