//! Sheets REST v4 request and response bodies.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A rectangular block of cell values.
///
/// Trailing empty cells and rows are omitted by the API, so rows can be
/// shorter than the header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_dimension: Option<String>,

    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

impl ValueRange {
    /// A single-cell write.
    pub fn cell(range: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            range: Some(range.into()),
            major_dimension: Some("ROWS".to_string()),
            values: vec![vec![Value::String(value.into())]],
        }
    }

    /// Rows as display strings.
    pub fn rows(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        self.values
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
    }
}

/// Text of one cell. Numbers and booleans are rendered, null is empty.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Body of `values:batchUpdate`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateValuesRequest {
    /// `RAW` or `USER_ENTERED`.
    pub value_input_option: String,
    pub data: Vec<ValueRange>,
}

impl BatchUpdateValuesRequest {
    /// Values are parsed as if typed into the UI, so dropdown labels and
    /// dates stay consistent with hand edits.
    pub fn user_entered(data: Vec<ValueRange>) -> Self {
        Self {
            value_input_option: "USER_ENTERED".to_string(),
            data,
        }
    }
}

/// Response of `values:batchUpdate`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateValuesResponse {
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    #[serde(default)]
    pub total_updated_rows: Option<u64>,
    #[serde(default)]
    pub total_updated_cells: Option<u64>,
}

impl BatchUpdateValuesResponse {
    pub fn empty() -> Self {
        Self::default()
    }
}
