use courier_base::{CoreMetrics, Flow, Operator};
use courier_configuration::{agent::OperatorConfig, ProtocolConfig};
use courier_core::{
    models::{ManualClock, MemoryCoordinator, MemoryToken, RecordingEffect, StaticOwners},
    Coordinator, Encode, JobDetails, JobPayload, JobStatus, SharedCoordinator,
};
use ethers::core::types::{Address, U256};
use prometheus::Registry;
use std::{collections::HashSet, sync::Arc, time::Duration};

type Shared = SharedCoordinator<MemoryToken, ManualClock, RecordingEffect>;

const SOURCE: u32 = 5;
const DESTINATION: u32 = 10;

fn addr(n: u8) -> Address {
    Address::repeat_byte(n)
}

fn sender() -> Address {
    addr(0x5e)
}

fn coordinator(operators: u8) -> Shared {
    let ledger = addr(0xee);
    let mut token = MemoryToken::default();
    for n in 1..=operators {
        token.mint(addr(n), U256::from(1_000));
        token.approve(addr(n), ledger, U256::MAX);
    }
    let mut coordinator: MemoryCoordinator = Coordinator::new(
        DESTINATION,
        ProtocolConfig {
            bond_unit: U256::from(100),
            ..Default::default()
        },
        ledger,
        token,
        ManualClock::default(),
        RecordingEffect::default(),
        Arc::new(StaticOwners::default()),
    );
    coordinator.register_source(SOURCE, sender());
    for n in 1..=operators {
        coordinator
            .bond(addr(n), addr(n), U256::from(100), 1)
            .unwrap();
    }
    SharedCoordinator::new(coordinator)
}

fn config(operator: Address) -> OperatorConfig {
    OperatorConfig {
        operator,
        interval: 1,
        execute_as_fallback: true,
        pods: None,
    }
}

fn metrics() -> Arc<CoreMetrics> {
    Arc::new(CoreMetrics::new("operator", None, Arc::new(Registry::new())).unwrap())
}

fn payload(nonce: u64) -> JobPayload {
    JobPayload {
        source_chain: SOURCE,
        target: addr(0xaa),
        nonce: nonce.into(),
        data: vec![0x01].into(),
        gas_limit: 150_000,
        gas_price: U256::from(5_000_000_000u64),
    }
}

async fn deliver(shared: &Shared, payload: &JobPayload) -> JobDetails {
    shared
        .write()
        .await
        .deliver(&payload.to_vec(), SOURCE, sender())
        .unwrap()
}

async fn status(shared: &Shared, details: &JobDetails) -> JobStatus {
    shared.read().await.job_details(&details.id).unwrap().status
}

#[tokio::test]
async fn it_executes_jobs_in_its_primary_window() {
    let shared = coordinator(1);
    let metrics = metrics();
    let mut operator = Operator::new(Arc::new(shared.clone()), config(addr(1)), metrics.clone());

    let details = deliver(&shared, &payload(0)).await;
    assert_eq!(details.primary, addr(1));

    assert_eq!(operator.tick().await.unwrap(), Flow::Advance);
    assert_eq!(operator.tracked(), 0);
    assert_eq!(status(&shared, &details).await, JobStatus::Completed);
    assert_eq!(metrics.executions("10", "completed").get(), 1);
    assert_eq!(metrics.jobs_seen("10").get(), 1);

    // nothing left to do
    assert_eq!(operator.tick().await.unwrap(), Flow::Repeat);
}

#[tokio::test]
async fn it_ignores_pods_it_is_not_configured_for() {
    let shared = coordinator(1);
    let mut operator = Operator::new(
        Arc::new(shared.clone()),
        OperatorConfig {
            pods: Some(HashSet::from([2])),
            ..config(addr(1))
        },
        metrics(),
    );

    let details = deliver(&shared, &payload(0)).await;
    assert_eq!(operator.tick().await.unwrap(), Flow::Repeat);
    assert_eq!(operator.tracked(), 0);
    assert_eq!(status(&shared, &details).await, JobStatus::Pending);
}

#[tokio::test]
async fn it_waits_out_other_primaries_and_forgets_completed_jobs() {
    let shared = coordinator(2);
    let mut operators: Vec<_> = [addr(1), addr(2)]
        .into_iter()
        .map(|address| {
            let metrics = metrics();
            let operator = Operator::new(
                Arc::new(shared.clone()),
                OperatorConfig {
                    execute_as_fallback: false,
                    ..config(address)
                },
                metrics.clone(),
            );
            (address, operator, metrics)
        })
        .collect();

    let details = deliver(&shared, &payload(0)).await;
    let primary_index = operators
        .iter()
        .position(|(address, _, _)| *address == details.primary)
        .unwrap();
    let (waiting, primary) = if primary_index == 0 {
        let (head, tail) = operators.split_at_mut(1);
        (&mut tail[0], &mut head[0])
    } else {
        let (head, tail) = operators.split_at_mut(1);
        (&mut head[0], &mut tail[0])
    };

    // primary window belongs to someone else
    assert_eq!(waiting.1.tick().await.unwrap(), Flow::Repeat);
    assert_eq!(waiting.1.tracked(), 1);
    assert_eq!(waiting.2.rejections("10", "operator has time").get(), 1);

    assert_eq!(primary.1.tick().await.unwrap(), Flow::Advance);
    assert_eq!(status(&shared, &details).await, JobStatus::Completed);

    // the completion event settles the job for everyone else
    assert_eq!(waiting.1.tick().await.unwrap(), Flow::Repeat);
    assert_eq!(waiting.1.tracked(), 0);
    assert_eq!(waiting.2.executions("10", "completed").get(), 0);
}

#[tokio::test]
async fn it_drops_jobs_once_every_window_has_lapsed() {
    let shared = coordinator(1);
    let metrics = metrics();
    // never bonded, so no window is ever its own
    let mut operator = Operator::new(Arc::new(shared.clone()), config(addr(9)), metrics.clone());

    let details = deliver(&shared, &payload(0)).await;
    let window = details.window_duration;
    assert_eq!(operator.tick().await.unwrap(), Flow::Repeat);
    assert_eq!(metrics.rejections("10", "operator has time").get(), 1);

    shared.write().await.chain_mut().advance(window);
    assert_eq!(operator.tick().await.unwrap(), Flow::Repeat);
    assert_eq!(operator.tracked(), 1);
    assert_eq!(metrics.rejections("10", "invalid fallback").get(), 1);

    shared
        .write()
        .await
        .chain_mut()
        .advance(window * details.fallbacks.len() as u64);
    assert_eq!(operator.tick().await.unwrap(), Flow::Advance);
    assert_eq!(operator.tracked(), 0);
    assert_eq!(metrics.rejections("10", "not bonded").get(), 1);
    assert_eq!(status(&shared, &details).await, JobStatus::Pending);

    // evicted jobs are not retried
    assert_eq!(operator.tick().await.unwrap(), Flow::Repeat);
    assert_eq!(metrics.rejections("10", "not bonded").get(), 1);
}

#[tokio::test]
async fn it_runs_until_aborted() {
    let shared = coordinator(1);
    let handle = Operator::new(Arc::new(shared.clone()), config(addr(1)), metrics()).run();

    let details = deliver(&shared, &payload(7)).await;
    tokio::time::timeout(Duration::from_secs(10), async {
        while status(&shared, &details).await != JobStatus::Completed {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await
    .expect("operator never executed the job");

    handle.abort();
    assert!(handle.await.unwrap_err().is_cancelled());
}
