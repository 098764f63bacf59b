//! Telegram integration tests.

use vpipe_models::{Priority, VideoId};
use vpipe_monitor::{Notification, NotificationKind, Notifier};
use vpipe_telegram::{TelegramClient, TelegramConfig, TelegramNotifier};

/// Send one rendered change report to the configured chat.
#[tokio::test]
#[ignore = "requires Telegram bot credentials"]
async fn test_send_change_report() {
    dotenvy::dotenv().ok();

    let config = TelegramConfig::from_env()
        .expect("Invalid Telegram config")
        .expect("TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID must be set");
    let notifier = TelegramNotifier::new(TelegramClient::new(config).expect("Failed to build client"));

    let notification = Notification::new(
        NotificationKind::ChangeReport,
        Priority::Normal,
        VideoId::from_number(9999),
        "Integration test <ignore>",
    )
    .line("Main Status: Processing → Approved");

    notifier.notify(&notification).await.expect("Failed to send message");
}
