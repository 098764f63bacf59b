//! Google Sheets integration tests.
//!
//! Run against a scratch copy of the tracking sheet: the write test changes
//! the first data row.

use vpipe_monitor::SnapshotSource;
use vpipe_sheets::{SheetsClient, VideoSheet};

/// Test Sheets connection and header mapping.
#[tokio::test]
#[ignore = "requires Sheets credentials"]
async fn test_sheets_connection() {
    dotenvy::dotenv().ok();

    let client = SheetsClient::from_env()
        .await
        .expect("Failed to create Sheets client");

    let range = client.config().range.clone();
    let values = client.get_values(&range).await.expect("Failed to read range");
    println!("Read {} rows from {:?}", values.values.len(), values.range);
}

/// Test snapshot fetch through the collaborator trait.
#[tokio::test]
#[ignore = "requires Sheets credentials"]
async fn test_fetch_snapshots() {
    dotenvy::dotenv().ok();

    let client = SheetsClient::from_env()
        .await
        .expect("Failed to create Sheets client");
    let sheet = VideoSheet::new(client);

    let snapshots = sheet
        .fetch_all_video_snapshots()
        .await
        .expect("Failed to fetch snapshots");

    for snapshot in snapshots.iter().take(5) {
        println!("{} {:?}", snapshot.video_id, snapshot.main_status);
    }
}

/// Rewrite the first video's current Main Status, leaving the sheet as it was.
#[tokio::test]
#[ignore = "requires Sheets credentials"]
async fn test_write_fields_is_idempotent() {
    use vpipe_models::{FieldUpdates, StatusField};

    dotenvy::dotenv().ok();

    let client = SheetsClient::from_env()
        .await
        .expect("Failed to create Sheets client");
    let sheet = VideoSheet::new(client);

    let snapshots = sheet.fetch().await.expect("Failed to fetch snapshots");
    let Some(first) = snapshots.iter().next() else {
        println!("Sheet has no videos, nothing to write");
        return;
    };

    let Some(main_status) = first.main_status.as_deref() else {
        println!("First video has no Main Status, nothing to write");
        return;
    };
    let updates = FieldUpdates::new().with(StatusField::MainStatus, main_status);

    sheet
        .write_fields(&first.video_id, &updates)
        .await
        .expect("Failed to write fields");

    let after = sheet.fetch().await.expect("Failed to re-fetch snapshots");
    assert_eq!(
        after.get(&first.video_id).map(|s| &s.main_status),
        Some(&first.main_status)
    );
}
