//! Repository over the video status sheet.
//!
//! Reads the whole configured range, maps the header row to columns and turns
//! every data row into a [`VideoStatusSnapshot`]. Writes go cell by cell in a
//! single `values:batchUpdate`, addressed from the row positions seen by the
//! most recent read.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use vpipe_models::{FieldUpdates, FieldValue, SnapshotSet, StatusField, VideoId, VideoStatusSnapshot};
use vpipe_monitor::{CollaboratorError, MonitorResult, SheetUpdater, SnapshotSource};

use crate::client::SheetsClient;
use crate::error::{SheetsError, SheetsResult};
use crate::layout::{RangeOrigin, SheetLayout};
use crate::metrics::record_malformed_row;
use crate::types::ValueRange;

// =============================================================================
// Parsing
// =============================================================================

/// Where each video lives in the sheet.
#[derive(Debug, Clone)]
pub struct SheetIndex {
    pub origin: RangeOrigin,
    pub layout: SheetLayout,
    /// Sheet row number per video.
    pub rows: HashMap<VideoId, u32>,
}

impl SheetIndex {
    /// A1 address of one status cell of a video.
    pub fn cell(&self, video_id: &VideoId, field: StatusField) -> Option<String> {
        let row = *self.rows.get(video_id)?;
        Some(self.origin.cell(self.layout.status_column(field), row))
    }
}

/// Result of parsing one read of the sheet.
#[derive(Debug, Clone)]
pub struct ParsedSheet {
    pub snapshots: SnapshotSet,
    pub index: SheetIndex,
    /// Non-blank rows that could not be used.
    pub skipped: usize,
}

/// Why a row was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowProblem {
    MissingVideoId,
    InvalidVideoId,
    DuplicateVideoId,
}

impl RowProblem {
    fn as_str(&self) -> &'static str {
        match self {
            RowProblem::MissingVideoId => "missing_video_id",
            RowProblem::InvalidVideoId => "invalid_video_id",
            RowProblem::DuplicateVideoId => "duplicate_video_id",
        }
    }
}

/// Parse a read of the configured range.
///
/// The first row is the header. Blank rows are ignored; rows with a missing,
/// invalid or repeated video ID are skipped with a warning.
pub fn parse_sheet(values: &ValueRange, origin: RangeOrigin) -> SheetsResult<ParsedSheet> {
    let mut rows = values.rows();
    let header = rows
        .next()
        .ok_or_else(|| SheetsError::layout("sheet has no header row"))?;
    let layout = SheetLayout::from_header(&header)?;

    let mut snapshots = SnapshotSet::new();
    let mut positions = HashMap::new();
    let mut skipped = 0;

    for (index, row) in rows.enumerate() {
        let sheet_row = origin.data_row(index);

        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let problem = match parse_row(&layout, &row) {
            Ok(snapshot) if snapshots.contains(&snapshot.video_id) => {
                Some((RowProblem::DuplicateVideoId, snapshot.video_id.to_string()))
            }
            Ok(snapshot) => {
                positions.insert(snapshot.video_id.clone(), sheet_row);
                snapshots.upsert(snapshot);
                None
            }
            Err((problem, raw)) => Some((problem, raw)),
        };

        if let Some((problem, raw)) = problem {
            warn!(
                row = sheet_row,
                reason = problem.as_str(),
                video_id = %raw,
                "Skipping malformed sheet row"
            );
            record_malformed_row(problem.as_str());
            skipped += 1;
        }
    }

    Ok(ParsedSheet {
        snapshots,
        index: SheetIndex {
            origin,
            layout,
            rows: positions,
        },
        skipped,
    })
}

fn parse_row(layout: &SheetLayout, row: &[String]) -> Result<VideoStatusSnapshot, (RowProblem, String)> {
    let cell = |column: usize| row.get(column).map(String::as_str);
    let text = |column: Option<usize>| {
        column
            .and_then(|c| cell(c))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let raw_id = cell(layout.video_id).unwrap_or_default();
    if raw_id.trim().is_empty() {
        return Err((RowProblem::MissingVideoId, String::new()));
    }
    let video_id = VideoId::parse(raw_id).map_err(|_| (RowProblem::InvalidVideoId, raw_id.to_string()))?;

    let mut snapshot = VideoStatusSnapshot::new(video_id, text(layout.title).unwrap_or_default());
    for field in StatusField::ALL {
        snapshot = snapshot.with(field, FieldValue::from_cell(cell(layout.status_column(field))));
    }
    snapshot.drive_folder_url = text(layout.drive_folder_url);
    snapshot.workbook_url = text(layout.workbook_url);
    snapshot.last_edited_time = text(layout.last_edited_time).and_then(|s| parse_timestamp(&s));

    Ok(snapshot)
}

/// RFC 3339 or the sheet's `YYYY-MM-DD HH:MM:SS` display format (UTC).
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%m/%d/%Y %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

// =============================================================================
// Repository
// =============================================================================

/// The video status sheet.
pub struct VideoSheet {
    client: SheetsClient,
    range: String,
    index: RwLock<Option<SheetIndex>>,
}

impl VideoSheet {
    /// Repository over the client's configured range.
    pub fn new(client: SheetsClient) -> Self {
        let range = client.config().range.clone();
        Self::with_range(client, range)
    }

    pub fn with_range(client: SheetsClient, range: impl Into<String>) -> Self {
        Self {
            client,
            range: range.into(),
            index: RwLock::new(None),
        }
    }

    /// Read and parse every video row.
    pub async fn fetch(&self) -> SheetsResult<SnapshotSet> {
        let values = self.client.get_values(&self.range).await?;
        let parsed = parse_sheet(&values, RangeOrigin::parse(&self.range))?;

        info!(
            videos = parsed.snapshots.len(),
            skipped = parsed.skipped,
            "Fetched video status sheet"
        );

        *self.index.write().await = Some(parsed.index);
        Ok(parsed.snapshots)
    }

    /// Sheet row of a video, reading the sheet if it was not seen yet.
    pub async fn find_row(&self, video_id: &VideoId) -> SheetsResult<u32> {
        if let Some(row) = self.cached_row(video_id).await {
            return Ok(row);
        }

        debug!(video_id = %video_id, "Video not in row index, re-reading sheet");
        self.fetch().await?;
        self.cached_row(video_id)
            .await
            .ok_or_else(|| SheetsError::VideoNotFound(video_id.to_string()))
    }

    /// Write status cells of one video.
    pub async fn write_fields(&self, video_id: &VideoId, updates: &FieldUpdates) -> SheetsResult<()> {
        if updates.is_empty() {
            return Ok(());
        }

        self.find_row(video_id).await?;
        let data: Vec<ValueRange> = {
            let guard = self.index.read().await;
            let index = guard
                .as_ref()
                .ok_or_else(|| SheetsError::VideoNotFound(video_id.to_string()))?;

            updates
                .iter()
                .map(|(field, value)| {
                    index
                        .cell(video_id, field)
                        .map(|address| ValueRange::cell(address, value))
                        .ok_or_else(|| SheetsError::VideoNotFound(video_id.to_string()))
                })
                .collect::<SheetsResult<_>>()?
        };

        let response = self.client.batch_update_values(data).await?;
        info!(
            video_id = %video_id,
            fields = updates.len(),
            cells = response.total_updated_cells.unwrap_or_default(),
            "Updated sheet status columns"
        );
        Ok(())
    }

    async fn cached_row(&self, video_id: &VideoId) -> Option<u32> {
        self.index
            .read()
            .await
            .as_ref()
            .and_then(|index| index.rows.get(video_id).copied())
    }
}

#[async_trait]
impl SnapshotSource for VideoSheet {
    async fn fetch_all_video_snapshots(&self) -> MonitorResult<SnapshotSet> {
        Ok(self.fetch().await?)
    }
}

#[async_trait]
impl SheetUpdater for VideoSheet {
    async fn update_fields(
        &self,
        video_id: &VideoId,
        updates: &FieldUpdates,
    ) -> Result<(), CollaboratorError> {
        Ok(self.write_fields(video_id, updates).await?)
    }
}
