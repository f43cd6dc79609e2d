use std::sync::Arc;

use chrono::Utc;

use crate::domain::email::model::{EmailAddress, OutgoingEmail};
use crate::domain::email::service::EmailService;
use crate::domain::email::templates::{
    self, NotificationContext, ADMIN_NOTIFICATION_SUBJECT,
};
use crate::utils::config::{AppConfig, ConfigError};

/// Best-effort secondary send announcing a new subscriber to an internal
/// address. Failure here never affects the primary response.
pub struct AdminNotifier {
    mailer: Arc<dyn EmailService>,
    recipient: Option<EmailAddress>,
}

impl std::fmt::Debug for AdminNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminNotifier")
            .field("recipient", &self.recipient)
            .finish_non_exhaustive()
    }
}

impl AdminNotifier {

    pub fn new(mailer: Arc<dyn EmailService>, recipient: Option<EmailAddress>) -> AdminNotifier {
        AdminNotifier { mailer, recipient }
    }

    pub fn from_config(
        mailer: Arc<dyn EmailService>,
        config: &AppConfig,
    ) -> Result<AdminNotifier, ConfigError> {
        let recipient = if config.notify_admin {
            match &config.admin_recipient {
                Some(address) => {
                    let parsed = EmailAddress::parse(address).map_err(|_| ConfigError::Invalid {
                        name: "ADMIN_RECIPIENT",
                        value: address.clone(),
                        reason: "not a valid email address".to_string(),
                    })?;
                    Some(parsed)
                }
                None => {
                    log::warn!("ADMIN_NOTIFY is enabled but ADMIN_RECIPIENT is not set");
                    None
                }
            }
        } else {
            None
        };

        Ok(AdminNotifier::new(mailer, recipient))
    }

    pub fn is_enabled(&self) -> bool {
        self.recipient.is_some()
    }

    pub async fn notify(&self, subscriber: &EmailAddress, client: Option<&str>) {
        let recipient = match &self.recipient {
            Some(recipient) => recipient,
            None => {
                log::debug!("admin notification skipped: not configured");
                return;
            }
        };

        let rendered = templates::render_admin_notification(&NotificationContext {
            subscriber: subscriber.as_str(),
            timestamp: Utc::now(),
            client,
            source: None,
        });

        let email = OutgoingEmail {
            to: recipient.clone(),
            subject: ADMIN_NOTIFICATION_SUBJECT.to_string(),
            html_body: Some(rendered.html),
            text_body: Some(rendered.text),
            reply_to: None,
            from_name: None,
            from_address: None,
            category: "admin-notification".to_string(),
        };

        if let Err(e) = self.mailer.send(&email).await {
            log::warn!("admin notification for {} failed: {}", subscriber, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::email::service::mock::MockEmailService;
    use std::time::Duration;

    fn test_config() -> AppConfig {
        AppConfig {
            bind_address: "127.0.0.1:8080".to_string(),
            smtp_host: "mail.example.com".to_string(),
            smtp_port: 465,
            implicit_tls: true,
            smtp_user: None,
            smtp_pass: None,
            allow_invalid_certs: false,
            verify_connection: false,
            connect_timeout: Duration::from_secs(60),
            greeting_timeout: Duration::from_secs(30),
            socket_timeout: Duration::from_secs(60),
            from_name: "Newsletter".to_string(),
            from_address: "news@example.com".to_string(),
            reply_to: None,
            admin_recipient: None,
            notify_admin: false,
            allowed_origins: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_notify_sends_to_configured_recipient() {
        let mock = Arc::new(MockEmailService::new());
        let recipient = EmailAddress::parse("admin@example.com").unwrap();
        let notifier = AdminNotifier::new(mock.clone(), Some(recipient));

        let subscriber = EmailAddress::parse("user@example.com").unwrap();
        notifier.notify(&subscriber, Some("Mozilla/5.0")).await;

        let sent = mock.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to.as_str(), "admin@example.com");
        assert_eq!(sent[0].subject, ADMIN_NOTIFICATION_SUBJECT);
        assert_eq!(sent[0].category, "admin-notification");
        assert!(sent[0].html_body.as_ref().unwrap().contains("user@example.com"));
        assert!(sent[0].text_body.as_ref().unwrap().contains("Mozilla/5.0"));
    }

    #[tokio::test]
    async fn test_notify_skips_when_not_configured() {
        let mock = Arc::new(MockEmailService::new());
        let notifier = AdminNotifier::new(mock.clone(), None);

        let subscriber = EmailAddress::parse("user@example.com").unwrap();
        notifier.notify(&subscriber, None).await;

        assert_eq!(mock.send_count(), 0);
    }

    #[tokio::test]
    async fn test_notify_swallows_transport_failure() {
        let mock = Arc::new(MockEmailService::new());
        mock.fail_next(1);
        let recipient = EmailAddress::parse("admin@example.com").unwrap();
        let notifier = AdminNotifier::new(mock.clone(), Some(recipient));

        let subscriber = EmailAddress::parse("user@example.com").unwrap();
        notifier.notify(&subscriber, None).await;

        assert_eq!(mock.send_count(), 1);
    }

    #[test]
    fn test_from_config_requires_toggle_and_recipient() {
        let mock = Arc::new(MockEmailService::new());

        let mut config = test_config();
        config.notify_admin = true;
        config.admin_recipient = Some("admin@example.com".to_string());
        let notifier = AdminNotifier::from_config(mock.clone(), &config).unwrap();
        assert!(notifier.is_enabled());

        let mut config = test_config();
        config.notify_admin = false;
        config.admin_recipient = Some("admin@example.com".to_string());
        let notifier = AdminNotifier::from_config(mock.clone(), &config).unwrap();
        assert!(!notifier.is_enabled());

        let mut config = test_config();
        config.notify_admin = true;
        config.admin_recipient = None;
        let notifier = AdminNotifier::from_config(mock.clone(), &config).unwrap();
        assert!(!notifier.is_enabled());
    }

    #[test]
    fn test_from_config_rejects_invalid_recipient() {
        let mock = Arc::new(MockEmailService::new());

        let mut config = test_config();
        config.notify_admin = true;
        config.admin_recipient = Some("not-an-address".to_string());

        let err = AdminNotifier::from_config(mock, &config).unwrap_err();
        match err {
            ConfigError::Invalid { name, .. } => assert_eq!(name, "ADMIN_RECIPIENT"),
            other => panic!("Expected Invalid, got {:?}", other),
        }
    }
}
