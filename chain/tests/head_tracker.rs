use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use quill_chain::HeadTracker;
use quill_nullables::NullHeadSource;
use quill_types::HeadNotification;
use tokio::sync::{broadcast, mpsc};

#[tokio::test]
async fn reconnects_after_close_and_failure() {
    let source = Arc::new(NullHeadSource::new());
    source.push_session(&[10, 11]);
    source.push_failure("connection refused");
    source.push_session(&[12]);

    let reconnects = Arc::new(AtomicU64::new(0));
    let counter = reconnects.clone();
    let tracker = HeadTracker::new(source.clone())
        .with_reconnect_delay(Duration::from_millis(5))
        .with_reconnect_hook(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

    let (heads_tx, mut heads_rx) = mpsc::channel(16);
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let task = tokio::spawn(tracker.run(heads_tx, shutdown_rx));

    let mut heights = Vec::new();
    for _ in 0..3 {
        heights.push(heads_rx.recv().await.unwrap().height);
    }
    assert_eq!(heights, vec![10, 11, 12]);

    shutdown_tx.send(()).unwrap();
    task.await.unwrap();
    assert!(source.subscriptions() >= 3);
    assert!(reconnects.load(Ordering::SeqCst) >= 2);
}

#[tokio::test]
async fn malformed_heights_are_dropped() {
    let source = Arc::new(NullHeadSource::new());
    source.push_raw_session(vec![
        HeadNotification {
            number: "not-hex".into(),
            hash: "0x1".into(),
        },
        HeadNotification {
            number: "0x20".into(),
            hash: "0x2".into(),
        },
    ]);

    let tracker = HeadTracker::new(source).with_reconnect_delay(Duration::from_millis(5));
    let (heads_tx, mut heads_rx) = mpsc::channel(16);
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let task = tokio::spawn(tracker.run(heads_tx, shutdown_rx));

    let head = heads_rx.recv().await.unwrap();
    assert_eq!(head.height, 32);
    assert_eq!(head.hash, "0x2");

    shutdown_tx.send(()).unwrap();
    task.await.unwrap();
}
