//! Outbound notification channels.
//!
//! The service only needs to hand a message to someone else; delivery is not
//! guaranteed by any implementation here.

mod error;
mod mail;
mod webhook;

pub use error::NotifyError;
pub use mail::MailCommandNotifier;
pub use webhook::{WebhookNotifier, WebhookPayload};

use async_trait::async_trait;
use tracing::info;

/// Delivers a message to an identity.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send `body` with `subject` to `identity`.
    async fn notify(&self, identity: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Writes notifications to the log instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, identity: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        info!(
            recipient = %identity,
            subject = %subject,
            body_len = body.len(),
            "Notification recorded (log delivery)"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        let notifier = LogNotifier;
        assert!(notifier.notify("a@x.com", "Subject", "Body").await.is_ok());
    }

    #[tokio::test]
    async fn test_webhook_posts_payload() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/notify"))
            .and(body_partial_json(serde_json::json!({
                "recipient": "a@x.com",
                "subject": "Restore your phone",
                "body": "Your phone: +1-555-0100"
            })))
            .respond_with(ResponseTemplate::new(202))
            .expect(1)
            .mount(&mock_server)
            .await;

        let notifier = WebhookNotifier::new(format!("{}/notify", mock_server.uri())).unwrap();
        let result = notifier
            .notify("a@x.com", "Restore your phone", "Your phone: +1-555-0100")
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_webhook_rejection() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/notify"))
            .respond_with(ResponseTemplate::new(503).set_body_string("mail relay down"))
            .mount(&mock_server)
            .await;

        let notifier = WebhookNotifier::new(format!("{}/notify", mock_server.uri())).unwrap();
        let result = notifier.notify("a@x.com", "Subject", "Body").await;

        match result {
            Err(NotifyError::Rejected { status, body }) => {
                assert_eq!(status, 503);
                assert_eq!(body, "mail relay down");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_webhook_unreachable() {
        let notifier = WebhookNotifier::new("http://127.0.0.1:9/notify").unwrap();
        let result = notifier.notify("a@x.com", "Subject", "Body").await;

        assert!(matches!(result, Err(NotifyError::Http(_))));
    }

    #[tokio::test]
    async fn test_notifier_as_trait_object() {
        let notifiers: Vec<Box<dyn Notifier>> =
            vec![Box::new(LogNotifier), Box::new(MailCommandNotifier::default())];
        assert_eq!(notifiers.len(), 2);
        assert!(notifiers[0].notify("a@x.com", "s", "b").await.is_ok());
    }
}
