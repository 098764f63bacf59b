//! HTML rendering for Telegram messages.

use std::borrow::Cow;

use vpipe_models::Priority;
use vpipe_monitor::{Notification, NotificationKind};

/// Bot API hard limit on message text, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Longest headline or bullet line, in characters, before escaping.
///
/// Escaping grows text at most sixfold, so a clipped headline plus the
/// header lines always fits in one message.
const MAX_FIELD_CHARS: usize = 512;

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn priority_badge(priority: Priority) -> &'static str {
    match priority {
        Priority::Critical => "🔴",
        Priority::High => "🟠",
        Priority::Medium => "🟡",
        Priority::Normal => "⚪",
    }
}

fn kind_label(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::ChangeReport => "Status change",
        NotificationKind::EditingReady => "Editing ready",
        NotificationKind::FinalCompletion => "Completed",
    }
}

/// Render a notification as HTML message text.
pub fn render(notification: &Notification) -> String {
    let mut text = format!(
        "{} <b>{}</b> · {}\n<b>{}</b>\n<code>{}</code>",
        priority_badge(notification.priority),
        notification.priority,
        kind_label(notification.kind),
        escape_html(&clip(&notification.headline)),
        escape_html(notification.video_id.as_str()),
    );

    if !notification.lines.is_empty() {
        text.push('\n');
        for line in &notification.lines {
            text.push('\n');
            text.push_str("• ");
            text.push_str(&escape_html(&clip(line)));
        }
    }

    if let Some(link) = &notification.link {
        text.push_str(&format!("\n\n<a href=\"{}\">Open</a>", escape_html(link)));
    }

    truncate(text)
}

/// Cut plain text to `MAX_FIELD_CHARS`, before it is escaped.
fn clip(text: &str) -> Cow<'_, str> {
    match text.char_indices().nth(MAX_FIELD_CHARS) {
        Some((cut, _)) => Cow::Owned(format!("{}…", &text[..cut])),
        None => Cow::Borrowed(text),
    }
}

/// Cut at a line boundary so no HTML tag is split.
fn truncate(text: String) -> String {
    if text.chars().count() <= MAX_MESSAGE_CHARS {
        return text;
    }

    const MARKER: &str = "\n…";
    let budget = MAX_MESSAGE_CHARS - MARKER.chars().count();
    let mut out = String::new();
    let mut used = 0;
    for line in text.split('\n') {
        let cost = line.chars().count() + usize::from(!out.is_empty());
        if used + cost > budget {
            break;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
        used += cost;
    }
    out.push_str(MARKER);
    out
}
