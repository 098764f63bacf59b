//! Header-to-column mapping and A1 addressing for the status sheet.

use std::collections::BTreeMap;

use vpipe_models::StatusField;

use crate::error::{SheetsError, SheetsResult};

const VIDEO_ID_HEADERS: &[&str] = &["video id", "id"];
const TITLE_HEADERS: &[&str] = &["title", "video title"];
const DRIVE_FOLDER_HEADERS: &[&str] = &["drive folder", "drive folder url", "folder"];
const WORKBOOK_HEADERS: &[&str] = &["workbook", "workbook url", "script workbook"];
const LAST_EDITED_HEADERS: &[&str] = &["last edited time", "last edited", "updated at"];

// =============================================================================
// Range origin
// =============================================================================

/// Where a configured range starts: `Videos!B3:Z` is sheet `Videos`,
/// column index 1, row 3.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeOrigin {
    /// Sheet name as written in the range, quotes included.
    pub sheet: String,
    pub column: usize,
    pub row: u32,
}

impl RangeOrigin {
    pub fn parse(range: &str) -> Self {
        let (sheet, cells) = match range.split_once('!') {
            Some((sheet, cells)) => (sheet.to_string(), cells),
            None => (range.to_string(), ""),
        };
        let start = cells.split(':').next().unwrap_or_default().trim();

        let letters: String = start.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
        let digits = &start[letters.len()..];

        Self {
            sheet,
            column: column_index(&letters).unwrap_or(0),
            row: digits.parse().ok().filter(|r| *r > 0).unwrap_or(1),
        }
    }

    /// A1 address of a cell, given its offset inside the range.
    pub fn cell(&self, column_offset: usize, sheet_row: u32) -> String {
        format!(
            "{}!{}{}",
            self.sheet,
            column_letters(self.column + column_offset),
            sheet_row
        )
    }

    /// Sheet row number of the `index`-th data row (0-based, after the header).
    pub fn data_row(&self, index: usize) -> u32 {
        self.row + 1 + index as u32
    }
}

/// `0 → A`, `25 → Z`, `26 → AA`.
pub fn column_letters(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Inverse of [`column_letters`]. `None` for an empty or non-letter input.
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let n = letters
        .to_ascii_uppercase()
        .bytes()
        .fold(0usize, |acc, b| acc * 26 + (b - b'A' + 1) as usize);
    Some(n - 1)
}

// =============================================================================
// Layout
// =============================================================================

/// Column offsets (inside the range) of every field the monitor reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetLayout {
    pub video_id: usize,
    pub title: Option<usize>,
    pub status: BTreeMap<StatusField, usize>,
    pub drive_folder_url: Option<usize>,
    pub workbook_url: Option<usize>,
    pub last_edited_time: Option<usize>,
}

impl SheetLayout {
    /// Map header labels to columns. Matching ignores case and surrounding
    /// whitespace. The ID column and all four status columns are required.
    pub fn from_header(header: &[String]) -> SheetsResult<Self> {
        let normalized: Vec<String> = header.iter().map(|h| normalize(h)).collect();
        let find = |names: &[&str]| normalized.iter().position(|h| names.contains(&h.as_str()));

        let video_id = find(VIDEO_ID_HEADERS)
            .ok_or_else(|| SheetsError::layout("no 'Video ID' column in header row"))?;

        let mut status = BTreeMap::new();
        for field in StatusField::ALL {
            let wanted = normalize(field.column_header());
            let column = normalized
                .iter()
                .position(|h| *h == wanted)
                .ok_or_else(|| {
                    SheetsError::layout(format!("no '{}' column in header row", field.column_header()))
                })?;
            status.insert(field, column);
        }

        Ok(Self {
            video_id,
            title: find(TITLE_HEADERS),
            status,
            drive_folder_url: find(DRIVE_FOLDER_HEADERS),
            workbook_url: find(WORKBOOK_HEADERS),
            last_edited_time: find(LAST_EDITED_HEADERS),
        })
    }

    pub fn status_column(&self, field: StatusField) -> usize {
        // from_header inserts every field
        self.status.get(&field).copied().unwrap_or(self.video_id)
    }
}

fn normalize(header: &str) -> String {
    header.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}
