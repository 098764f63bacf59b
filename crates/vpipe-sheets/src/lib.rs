//! Google Sheets REST client.
//!
//! This crate provides:
//! - A Sheets v4 values client with service account authentication via gcp_auth
//! - Token caching, retry with backoff, request metrics
//! - The video status sheet repository used as snapshot source and updater

pub mod client;
pub mod error;
pub mod layout;
pub mod metrics;
pub mod retry;
pub mod token_cache;
pub mod types;
pub mod video_sheet;


pub use client::{SheetsClient, SheetsConfig};
pub use error::{SheetsError, SheetsResult};
pub use layout::{RangeOrigin, SheetLayout};
pub use retry::RetryConfig;
pub use types::{BatchUpdateValuesRequest, BatchUpdateValuesResponse, ValueRange};
pub use video_sheet::{parse_sheet, ParsedSheet, SheetIndex, VideoSheet};
