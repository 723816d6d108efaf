// tests/scheduler_staged.rs

mod common;
use crate::common::init_tracing;

use std::time::Duration;

use devstrap::scheduler::StagedScheduler;
use devstrap_test_utils::builders::{consumer, producer};
use devstrap_test_utils::fake_executor::ScriptedExecutor;
use devstrap_test_utils::with_timeout;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn failing_producer_skips_every_consumer() {
    init_tracing();
    let executor = ScriptedExecutor::new().with_exit("libs/shared", 5);
    let scheduler = StagedScheduler::new(executor.clone(), 4, CancellationToken::new());

    let summary = with_timeout(scheduler.run(vec![
        producer("libs/shared"),
        consumer("services/api"),
        consumer("apis/web"),
    ]))
    .await
    .unwrap();

    assert_eq!(executor.executed(), vec!["libs/shared".to_string()]);
    assert_eq!(summary.producer_failed.as_deref(), Some("libs/shared"));
    assert_eq!(summary.consumers_executed, 0);
    assert_eq!(summary.failure_for("libs/shared").unwrap().exit_code, 5);
    assert_eq!(summary.exit_code(), 1);
    assert!(summary.render().contains("consumer stage skipped (0 consumers executed)"));
}

#[tokio::test]
async fn producers_run_in_order_and_stop_at_first_failure() {
    let executor = ScriptedExecutor::new().with_exit("libs/b", 1);
    let scheduler = StagedScheduler::new(executor.clone(), 4, CancellationToken::new());

    let summary = with_timeout(scheduler.run(vec![
        producer("libs/a"),
        producer("libs/b"),
        producer("libs/c"),
        consumer("apis/x"),
    ]))
    .await
    .unwrap();

    assert_eq!(executor.executed(), vec!["libs/a".to_string(), "libs/b".to_string()]);
    assert_eq!(summary.successes, vec!["libs/a".to_string()]);
    assert_eq!(summary.producer_failed.as_deref(), Some("libs/b"));
}

#[tokio::test]
async fn consumer_failures_are_isolated() {
    init_tracing();
    let executor = ScriptedExecutor::new()
        .with_exit("c2", 2)
        .with_exit("c4", 4)
        .with_delay(Duration::from_millis(10));
    let scheduler = StagedScheduler::new(executor.clone(), 3, CancellationToken::new());

    let tasks = (1..=5).map(|i| consumer(&format!("c{i}"))).collect();
    let summary = with_timeout(scheduler.run(tasks)).await.unwrap();

    assert_eq!(executor.executed().len(), 5);
    assert_eq!(summary.consumers_executed, 5);
    assert_eq!(summary.passed(), 3);
    assert_eq!(summary.failed(), 2);
    assert_eq!(summary.successes, vec!["c1", "c3", "c5"]);

    let c2 = summary.failure_for("c2").unwrap();
    assert_eq!(c2.exit_code, 2);
    assert!(c2.log.contains("c2: scripted output"));
    let c4 = summary.failure_for("c4").unwrap();
    assert_eq!(c4.exit_code, 4);
    assert!(c4.log.contains("c4: scripted output"));
    assert!(!c4.log.contains("c2"));

    assert_eq!(summary.exit_code(), 1);
}

#[tokio::test]
async fn consumer_concurrency_is_capped_by_jobs() {
    let executor = ScriptedExecutor::new().with_delay(Duration::from_millis(30));
    let scheduler = StagedScheduler::new(executor.clone(), 2, CancellationToken::new());

    let tasks = (0..6).map(|i| consumer(&format!("services/s{i}"))).collect();
    let summary = with_timeout(scheduler.run(tasks)).await.unwrap();

    assert!(summary.is_success());
    assert_eq!(summary.passed(), 6);
    assert!(executor.max_concurrency() <= 2);
    assert!(executor.max_concurrency() >= 1);
}

#[tokio::test]
async fn all_passing_run_exits_zero() {
    let executor = ScriptedExecutor::new();
    let scheduler = StagedScheduler::new(executor, 8, CancellationToken::new());

    let summary = with_timeout(scheduler.run(vec![producer("libs/core"), consumer("apis/rest")]))
        .await
        .unwrap();

    assert_eq!(summary.exit_code(), 0);
    assert!(summary.render().ends_with("verify: 2 passed, 0 failed -> OK\n"));
}

#[tokio::test]
async fn interrupt_discards_the_run() {
    let executor = ScriptedExecutor::new().with_delay(Duration::from_secs(60));
    let cancel = CancellationToken::new();
    let scheduler = StagedScheduler::new(executor, 2, cancel.clone());

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let tasks = (0..4).map(|i| consumer(&format!("c{i}"))).collect();
    let err = with_timeout(scheduler.run(tasks)).await.unwrap_err();

    assert!(err.is_interrupted());
}
