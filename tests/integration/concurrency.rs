//! Concurrency behavior of the engine.

use crate::common::chain;
use std::time::{Duration, Instant};
use stepwise::Engine;

/// Two chains that each sleep then exit zero should take about as long
/// as the slower one, not the sum.
#[tokio::test]
async fn test_independent_chains_overlap() {
    let start = Instant::now();
    let report = Engine::new()
        .run(vec![
            chain(&[("nap-a", "sleep 0.3"), ("done-a", "exit 0")]),
            chain(&[("nap-b", "sleep 0.3"), ("done-b", "exit 0")]),
        ])
        .await;
    let elapsed = start.elapsed();

    assert!(report.success);
    assert!(
        elapsed < Duration::from_millis(550),
        "Expected wall clock near the slower chain, got {:?}",
        elapsed
    );
}

/// Within a chain, a step never starts before the previous step's
/// process has terminated, even while other chains are running.
#[tokio::test]
async fn test_steps_are_sequential_across_concurrent_chains() {
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("order.txt");
    let marker = marker.to_str().unwrap();

    let ordered = stepwise::Chain::new("a1", format!("sleep 0.1; echo a1 >> {marker}"))
        .unwrap()
        .then("a2", format!("echo a2 >> {marker}"))
        .unwrap();

    let report = Engine::new()
        .run(vec![ordered, chain(&[("b1", "sleep 0.05")])])
        .await;

    assert!(report.success);
    let contents = std::fs::read_to_string(marker).unwrap();
    assert_eq!(contents, "a1\na2\n");
}

/// A failing chain never interrupts a sibling already in flight.
#[tokio::test]
async fn test_no_cross_chain_cancellation() {
    let report = Engine::new()
        .run(vec![
            chain(&[("doomed", "exit 1")]),
            chain(&[("survivor", "sleep 0.2 && echo alive")]),
        ])
        .await;

    assert!(!report.success);
    let survivor = &report.chains[1];
    assert!(survivor.ok());
    assert_eq!(survivor.steps[0].stdout.trim(), "alive");
}

/// With a concurrency cap of one, chains run back to back.
#[tokio::test]
async fn test_chain_concurrency_limit() {
    let start = Instant::now();
    let report = Engine::new()
        .with_max_concurrent_chains(1)
        .run(vec![
            chain(&[("a", "sleep 0.15")]),
            chain(&[("b", "sleep 0.15")]),
        ])
        .await;
    let elapsed = start.elapsed();

    assert!(report.success);
    assert!(
        elapsed >= Duration::from_millis(280),
        "Expected serialized execution, got {:?}",
        elapsed
    );
}

/// Many trivial chains all complete and all report.
#[tokio::test]
async fn test_many_chains_all_report() {
    let chains = (0..16)
        .map(|i| stepwise::Chain::new("echo", format!("echo {i}")).unwrap())
        .collect();

    let report = Engine::new().run(chains).await;

    assert!(report.success);
    assert_eq!(report.chains.len(), 16);
    for (i, c) in report.chains.iter().enumerate() {
        assert_eq!(c.steps[0].stdout.trim(), i.to_string());
    }
}
