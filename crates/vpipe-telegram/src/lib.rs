//! Telegram notifications.
//!
//! This crate provides:
//! - A minimal Bot API client for `sendMessage`
//! - HTML rendering of monitor notifications
//! - `Notifier` implementations for Telegram and for log-only operation

pub mod client;
pub mod error;
pub mod format;
pub mod notifier;

pub use client::{TelegramClient, TelegramConfig};
pub use error::{TelegramError, TelegramResult};
pub use format::{escape_html, render};
pub use notifier::{LoggingNotifier, TelegramNotifier};
