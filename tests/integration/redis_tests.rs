//! Redis/Queue integration tests.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use vpipe_models::{FieldTransition, FieldValue, StatusField, VideoId, VideoStatusSnapshot};
use vpipe_monitor::{SnapshotStore, TriggerCause, WorkflowRequest};
use vpipe_queue::{EnqueueOutcome, QueueConfig, RedisSnapshotStore, WorkflowJob, WorkflowQueue};

fn test_queue(stream: &str) -> WorkflowQueue {
    dotenvy::dotenv().ok();

    let config = QueueConfig {
        stream_name: format!("vpipe:test:{stream}"),
        dedup_prefix: format!("vpipe:test:{stream}:dedup"),
        dedup_ttl: Duration::from_secs(5),
        snapshot_key: format!("vpipe:test:{stream}:snapshots"),
        ..QueueConfig::from_env()
    };
    WorkflowQueue::new(config).expect("Failed to create queue")
}

/// Test Redis connection and basic operations.
#[tokio::test]
#[ignore = "requires Redis"]
async fn test_redis_connection() {
    let queue = test_queue("connection");
    queue.ping().await.expect("Failed to ping Redis");

    let len = queue.len().await.expect("Failed to get stream length");
    println!("Stream length: {}", len);
}

/// Identical jobs within the dedup TTL are enqueued once.
#[tokio::test]
#[ignore = "requires Redis"]
async fn test_enqueue_dedup() {
    let queue = test_queue("dedup");
    let micros = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_micros())
        .unwrap_or_default();
    let video_id = VideoId::from_number(micros);

    let request = WorkflowRequest::SyncStatus {
        video_id,
        main_status: FieldValue::set("Error"),
        cause: TriggerCause::new(
            StatusField::MainStatus,
            &FieldTransition::new("Processing", "Error"),
            None,
        ),
    };

    let first = queue
        .enqueue(&WorkflowJob::new(request.clone()))
        .await
        .expect("Failed to enqueue");
    assert!(matches!(first, EnqueueOutcome::Enqueued(_)));

    let second = queue
        .enqueue(&WorkflowJob::new(request.clone()))
        .await
        .expect("Failed to enqueue");
    assert_eq!(second, EnqueueOutcome::Duplicate);

    // Once the dedup key expires the request goes through again.
    tokio::time::sleep(Duration::from_secs(6)).await;
    let third = queue
        .enqueue(&WorkflowJob::new(request))
        .await
        .expect("Failed to enqueue");
    assert!(matches!(third, EnqueueOutcome::Enqueued(_)));
}

/// Test snapshot cache persistence round trip.
#[tokio::test]
#[ignore = "requires Redis"]
async fn test_snapshot_store() {
    let queue = test_queue("store");
    let store = RedisSnapshotStore::for_queue(&queue);

    let snapshots = vec![
        VideoStatusSnapshot::new(VideoId::from_number(1), "Launch")
            .with(StatusField::MainStatus, "Processing"),
        VideoStatusSnapshot::new(VideoId::from_number(2), "Teaser"),
    ]
    .into();

    store.save(&snapshots).await.expect("Failed to save snapshots");
    let loaded = store.load().await.expect("Failed to load snapshots");

    assert_eq!(loaded, Some(snapshots));
}
