//! `Notifier` implementations.

use async_trait::async_trait;
use tracing::{info, warn};

use vpipe_monitor::{CollaboratorError, Notification, Notifier};

use crate::client::TelegramClient;
use crate::format::render;

/// Delivers notifications to a Telegram chat.
#[derive(Clone)]
pub struct TelegramNotifier {
    client: TelegramClient,
}

impl TelegramNotifier {
    pub fn new(client: TelegramClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), CollaboratorError> {
        let text = render(notification);
        self.client.send_message(&text).await.map_err(|e| {
            warn!(
                video_id = %notification.video_id,
                kind = ?notification.kind,
                error = %e,
                "Telegram delivery failed"
            );
            CollaboratorError::from(e)
        })
    }
}

/// Writes notifications to the log instead of a chat.
///
/// Used when no Telegram bot is configured.
#[derive(Debug, Clone, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn notify(&self, notification: &Notification) -> Result<(), CollaboratorError> {
        info!(
            video_id = %notification.video_id,
            kind = ?notification.kind,
            priority = %notification.priority,
            headline = %notification.headline,
            details = %notification.lines.join("; "),
            link = notification.link.as_deref().unwrap_or(""),
            "Notification"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use vpipe_models::{Priority, VideoId};
    use vpipe_monitor::{CollaboratorKind, NotificationKind};
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::client::TelegramConfig;

    fn notification() -> Notification {
        Notification::new(
            NotificationKind::EditingReady,
            Priority::Medium,
            VideoId::from_number(4),
            "Ready for editing: Recap",
        )
    }

    fn notifier(server: &MockServer) -> TelegramNotifier {
        let mut config = TelegramConfig::new("1:x", "99");
        config.api_base = server.uri();
        config.max_retries = 0;
        TelegramNotifier::new(TelegramClient::new(config).unwrap())
    }

    #[tokio::test]
    async fn test_telegram_notifier_delivers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        notifier(&server).notify(&notification()).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert!(body["text"].as_str().unwrap().contains("Ready for editing: Recap"));
    }

    #[tokio::test]
    async fn test_telegram_failure_becomes_collaborator_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "ok": false,
                "error_code": 403,
                "description": "Forbidden: bot was blocked by the user"
            })))
            .mount(&server)
            .await;

        let err = notifier(&server).notify(&notification()).await.unwrap_err();

        assert_eq!(err.kind, CollaboratorKind::Notification);
        assert!(err.message.contains("bot was blocked"));
        assert!(!err.retryable);
    }

    #[tokio::test]
    async fn test_logging_notifier_always_succeeds() {
        assert!(LoggingNotifier.notify(&notification()).await.is_ok());
    }
}
