//! Cursor persistence: monotonic advance, catch-up window, resume after restart.

mod common;

use chrono::{Duration, Utc};
use common::{minutes_ago, msg, setup, test_config, FakeArbitrator};
use tickerwatch::application::process_batch::{PassOutcome, PassReport};
use tickerwatch::domain::entities::message::Message;
use tickerwatch::domain::values::cursor_pointer::CursorPointer;
use tickerwatch::TickerWatch;

fn completed(outcome: PassOutcome) -> PassReport {
    match outcome {
        PassOutcome::Completed(report) => report,
        PassOutcome::Coalesced { source_id } => panic!("pass for {source_id} was coalesced"),
    }
}

#[tokio::test]
async fn test_fresh_source_starts_at_catch_up_window() {
    let (tw, _) = setup();
    let pointer = tw.load_cursor("all").unwrap();
    let expected = Utc::now() - Duration::hours(24);
    assert!((pointer.observed_at - expected).num_seconds().abs() < 60);
    assert!(tw.cursor("all").unwrap().is_none());
}

#[tokio::test]
async fn test_cursor_never_moves_backwards() {
    let (tw, _) = setup();
    let later = CursorPointer::new(minutes_ago(5), "m2");
    let earlier = CursorPointer::new(minutes_ago(10), "m1");

    assert!(tw.advance_cursor("all", &later).unwrap());
    assert!(!tw.advance_cursor("all", &earlier).unwrap());
    assert!(!tw.advance_cursor("all", &later).unwrap());

    assert_eq!(tw.cursor("all").unwrap().unwrap().pointer, later);
}

#[tokio::test]
async fn test_same_timestamp_orders_by_message_id() {
    let (tw, _) = setup();
    let at = minutes_ago(5);
    assert!(tw.advance_cursor("all", &CursorPointer::new(at, "a")).unwrap());
    assert!(tw.advance_cursor("all", &CursorPointer::new(at, "b")).unwrap());
    assert!(!tw.advance_cursor("all", &CursorPointer::new(at, "a")).unwrap());
}

#[tokio::test]
async fn test_pass_processes_new_messages_once() {
    let (tw, _) = setup();
    tw.ingest_all(&[
        msg("m1", "$SLDP breakout", minutes_ago(30)),
        msg("m2", "lunch anyone?", minutes_ago(20)),
        msg("m3", "$XPON ripping", minutes_ago(10)),
    ])
    .unwrap();

    let first = completed(tw.run_pass("all").await.unwrap());
    assert_eq!(first.fetched, 3);
    assert_eq!(first.processed, 3);
    assert_eq!(first.detections, 2);
    assert_eq!(first.cursor.as_ref().unwrap().message_id, "m3");

    let cursor = tw.cursor("all").unwrap().unwrap();
    assert_eq!(cursor.messages_processed_count, 3);
    assert_eq!(cursor.detections_count, 2);
    assert_eq!(cursor.error_count, 0);

    let second = completed(tw.run_pass("all").await.unwrap());
    assert_eq!(second.fetched, 0);
    assert_eq!(tw.detection_count().unwrap(), 2);
}

#[tokio::test]
async fn test_messages_before_window_are_ignored() {
    let (tw, _) = setup();
    tw.ingest(&msg("old", "$SLDP breakout", Utc::now() - Duration::hours(30)))
        .unwrap();
    tw.ingest(&msg("new", "$XPON breakout", minutes_ago(5))).unwrap();

    let report = completed(tw.run_pass("all").await.unwrap());
    assert_eq!(report.fetched, 1);
    assert_eq!(report.cursor.unwrap().message_id, "new");
}

#[tokio::test]
async fn test_skipped_message_still_advances_cursor() {
    let (tw, _) = setup();
    tw.ingest(&msg("blank", "", minutes_ago(5))).unwrap();

    let report = completed(tw.run_pass("all").await.unwrap());
    assert_eq!(report.skipped, 1);
    assert_eq!(report.processed, 0);

    let cursor = tw.cursor("all").unwrap().unwrap();
    assert_eq!(cursor.pointer.message_id, "blank");
    assert_eq!(cursor.messages_processed_count, 1);
}

#[tokio::test]
async fn test_sources_keep_separate_cursors() {
    let (tw, _) = setup();
    tw.ingest(&Message::new("a1", "chan-a", "u1", "$SLDP breakout", minutes_ago(10)))
        .unwrap();
    tw.ingest(&Message::new("b1", "chan-b", "u2", "$XPON breakout", minutes_ago(5)))
        .unwrap();

    let a = completed(tw.run_pass("chan-a").await.unwrap());
    assert_eq!(a.fetched, 1);
    assert_eq!(a.cursor.unwrap().message_id, "a1");

    let b = completed(tw.run_pass("chan-b").await.unwrap());
    assert_eq!(b.fetched, 1);

    let sources: Vec<String> = tw.cursors().unwrap().into_iter().map(|c| c.source_id).collect();
    assert_eq!(sources.len(), 2);
}

#[tokio::test]
async fn test_edit_behind_cursor_is_reprocessed() {
    let (tw, _) = setup();
    let at = minutes_ago(10);
    tw.ingest(&msg("m1", "nothing here yet", at)).unwrap();
    let first = completed(tw.run_pass("all").await.unwrap());
    assert_eq!(first.detections, 0);

    assert_eq!(tw.ingest(&msg("m1", "edited: $SLDP breakout", at)).unwrap(), 1);
    let second = completed(tw.run_pass("all").await.unwrap());
    assert_eq!(second.fetched, 1);
    assert_eq!(second.detections, 1);

    let detections = tw.detections(&Default::default()).unwrap();
    assert_eq!(detections.len(), 1);
    assert_eq!(detections[0].symbol, "SLDP");
    assert_eq!(detections[0].message_id, "m1");

    let third = completed(tw.run_pass("all").await.unwrap());
    assert_eq!(third.fetched, 0);
}

#[tokio::test]
async fn test_unchanged_resend_is_not_reprocessed() {
    let (tw, _) = setup();
    let original = msg("m1", "$SLDP breakout", minutes_ago(10));
    tw.ingest(&original).unwrap();
    completed(tw.run_pass("all").await.unwrap());

    assert_eq!(tw.ingest(&original).unwrap(), 0);
    let report = completed(tw.run_pass("all").await.unwrap());
    assert_eq!(report.fetched, 0);
    assert_eq!(tw.detection_count().unwrap(), 1);
}

#[tokio::test]
async fn test_edit_keeps_existing_detection_once() {
    let (tw, _) = setup();
    let at = minutes_ago(10);
    tw.ingest(&msg("m1", "$SLDP breakout", at)).unwrap();
    completed(tw.run_pass("all").await.unwrap());

    tw.ingest(&msg("m1", "$SLDP breakout (edited: stopped out)", at))
        .unwrap();
    let report = completed(tw.run_pass("all").await.unwrap());
    assert_eq!(report.fetched, 1);
    assert_eq!(report.duplicates, 1);
    assert_eq!(tw.detection_count().unwrap(), 1);
}

#[tokio::test]
async fn test_resume_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tickerwatch.db");
    let config = || {
        let mut config = test_config();
        config.database_path = path.to_string_lossy().into_owned();
        config
    };

    {
        let tw = TickerWatch::with_providers(config(), FakeArbitrator::agreeing(0.9)).unwrap();
        tw.ingest_all(&[
            msg("m1", "$SLDP breakout", minutes_ago(30)),
            msg("m2", "$XPON breakout", minutes_ago(20)),
        ])
        .unwrap();
        let report = completed(tw.run_pass("all").await.unwrap());
        assert_eq!(report.processed, 2);
    }

    let tw = TickerWatch::with_providers(config(), FakeArbitrator::agreeing(0.9)).unwrap();
    assert_eq!(tw.load_cursor("all").unwrap().message_id, "m2");

    tw.ingest(&msg("m3", "$ZETA breakout", minutes_ago(10))).unwrap();
    let report = completed(tw.run_pass("all").await.unwrap());
    assert_eq!(report.fetched, 1);
    assert_eq!(report.detections, 1);

    let cursor = tw.cursor("all").unwrap().unwrap();
    assert_eq!(cursor.messages_processed_count, 3);
    assert_eq!(cursor.detections_count, 3);
    assert_eq!(tw.detection_count().unwrap(), 3);
}
