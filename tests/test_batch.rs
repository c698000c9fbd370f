//! Batch passes: single-flight per source, coalescing, triggers.

mod common;

use common::{minutes_ago, msg, setup, setup_with, FakeArbitrator};
use tickerwatch::application::process_batch::{PassOutcome, PassReport};
use tickerwatch::domain::entities::message::Message;
use tickerwatch::infrastructure::triggers::notifier::Notification;
use tokio::sync::watch;

const BORDERLINE: &str = "XPON ww here for next leg up";

fn completed(outcome: PassOutcome) -> PassReport {
    match outcome {
        PassOutcome::Completed(report) => report,
        PassOutcome::Coalesced { source_id } => panic!("pass for {source_id} was coalesced"),
    }
}

#[tokio::test]
async fn test_concurrent_pass_is_coalesced() {
    let arbitrator = FakeArbitrator::slow(100);
    let tw = setup_with(arbitrator.clone());
    tw.ingest(&msg("m1", BORDERLINE, minutes_ago(5))).unwrap();

    let (first, second) = tokio::join!(tw.run_pass("all"), tw.run_pass("all"));

    let report = completed(first.unwrap());
    assert!(matches!(second.unwrap(), PassOutcome::Coalesced { ref source_id } if source_id == "all"));
    assert_eq!(report.sweeps, 2);
    assert_eq!(report.processed, 1);
    assert_eq!(report.detections, 1);
    assert_eq!(arbitrator.calls(), 1);
    assert!(!tw.batch_use_case().is_running("all"));
}

#[tokio::test]
async fn test_pushed_batch_joins_running_pass() {
    let arbitrator = FakeArbitrator::slow(100);
    let tw = setup_with(arbitrator);
    tw.ingest(&msg("m1", BORDERLINE, minutes_ago(5))).unwrap();

    let late = msg("m2", "$SLDP breakout", minutes_ago(1));
    let (first, second) = tokio::join!(
        tw.run_pass("all"),
        tw.process_batch("all", vec![late])
    );

    let report = completed(first.unwrap());
    assert!(matches!(second.unwrap(), PassOutcome::Coalesced { .. }));
    assert_eq!(report.sweeps, 2);
    assert_eq!(report.processed, 2);
    assert_eq!(report.detections, 2);
    assert_eq!(report.cursor.unwrap().message_id, "m2");
}

#[tokio::test]
async fn test_separate_sources_run_independently() {
    let arbitrator = FakeArbitrator::slow(50);
    let tw = setup_with(arbitrator);
    tw.ingest(&Message::new("a1", "chan-a", "u1", BORDERLINE, minutes_ago(5)))
        .unwrap();
    tw.ingest(&Message::new("b1", "chan-b", "u2", BORDERLINE, minutes_ago(4)))
        .unwrap();

    let (a, b) = tokio::join!(tw.run_pass("chan-a"), tw.run_pass("chan-b"));

    assert_eq!(completed(a.unwrap()).processed, 1);
    assert_eq!(completed(b.unwrap()).processed, 1);
}

#[tokio::test]
async fn test_process_batch_sorts_and_persists_messages() {
    let (tw, _) = setup();
    let batch = vec![
        msg("m3", "$ZETA breakout", minutes_ago(1)),
        msg("m1", "$SLDP breakout", minutes_ago(3)),
        msg("m2", "$XPON breakout", minutes_ago(2)),
    ];

    let report = completed(tw.process_batch("all", batch).await.unwrap());
    assert_eq!(report.processed, 3);
    assert_eq!(report.cursor.unwrap().message_id, "m3");

    // Already stored and behind the cursor, so a sweep has nothing to do.
    let sweep = completed(tw.run_pass("all").await.unwrap());
    assert_eq!(sweep.fetched, 0);
    assert_eq!(tw.detection_count().unwrap(), 3);
}

#[tokio::test]
async fn test_pass_reports_arbitration_counts() {
    let arbitrator = FakeArbitrator::failing();
    let tw = setup_with(arbitrator);
    tw.ingest(&msg("m1", BORDERLINE, minutes_ago(5))).unwrap();

    let report = completed(tw.run_pass("all").await.unwrap());
    assert_eq!(report.arbitration_calls, 1);
    assert_eq!(report.arbitration_failures, 1);
    assert_eq!(report.errors, 0);
    assert_eq!(report.detections, 0);
    assert_eq!(tw.cursor("all").unwrap().unwrap().pointer.message_id, "m1");
}

#[tokio::test]
async fn test_notifier_processes_pushed_messages() {
    let (tw, _) = setup();
    let (tx, notifier) = tw.notifier(4);
    let handle = notifier.spawn();

    tx.send(Notification::with_messages(
        "all",
        vec![msg("m1", "$SLDP breakout", minutes_ago(2))],
    ))
    .await
    .unwrap();
    drop(tx);
    handle.await.unwrap();

    assert_eq!(tw.detection_count().unwrap(), 1);
    assert_eq!(tw.cursor("all").unwrap().unwrap().pointer.message_id, "m1");
}

#[tokio::test]
async fn test_poller_runs_until_shutdown() {
    let (tw, _) = setup();
    tw.ingest(&msg("m1", "$SLDP breakout", minutes_ago(2))).unwrap();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tw.poller("all").spawn(shutdown_rx);

    tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    shutdown_tx.send(true).unwrap();
    handle.await.unwrap();

    assert_eq!(tw.detection_count().unwrap(), 1);
}
