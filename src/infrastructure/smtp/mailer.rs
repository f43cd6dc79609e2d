use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::{Mailbox, Message, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use uuid::Uuid;

use crate::domain::email::model::{EmailAddress, MailEnvelope, OutgoingEmail, SendReceipt};
use crate::domain::email::service::EmailService;
use crate::utils::config::AppConfig;
use crate::utils::errors::ApiError;

pub struct SmtpMailer {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
    port: u16,
    from_name: String,
    from_address: String,
    default_reply_to: Option<String>,
    verify_on_send: bool,
    send_deadline: Duration,
}

impl SmtpMailer {

    pub fn new(config: &AppConfig) -> Result<SmtpMailer, ApiError> {
        // An unusable default identity stops the service at startup rather
        // than failing every request.
        config.from_address.parse::<Address>().map_err(|e| {
            ApiError::Configuration(format!(
                "MAIL_FROM_ADDRESS `{}`: {}",
                config.from_address, e
            ))
        })?;
        if let Some(reply_to) = &config.reply_to {
            reply_to.parse::<Address>().map_err(|e| {
                ApiError::Configuration(format!("MAIL_REPLY_TO `{}`: {}", reply_to, e))
            })?;
        }

        let mut tls_builder = TlsParameters::builder(config.smtp_host.clone());
        if config.allow_invalid_certs {
            log::warn!(
                "accepting invalid TLS certificates for {}",
                config.smtp_host
            );
            tls_builder = tls_builder.dangerous_accept_invalid_certs(true);
        }
        let tls_parameters = tls_builder.build().map_err(|e| {
            ApiError::Configuration(format!("TLS setup for {} failed: {}", config.smtp_host, e))
        })?;

        let tls = if config.implicit_tls {
            Tls::Wrapper(tls_parameters)
        } else {
            Tls::Required(tls_parameters)
        };

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(config.smtp_host.clone())
                .port(config.smtp_port)
                .tls(tls)
                .timeout(Some(config.socket_timeout));

        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_pass) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(SmtpMailer {
            mailer: builder.build(),
            host: config.smtp_host.clone(),
            port: config.smtp_port,
            from_name: config.from_name.clone(),
            from_address: config.from_address.clone(),
            default_reply_to: config.reply_to.clone(),
            verify_on_send: config.verify_connection,
            // lettre exposes one socket timeout knob; connect and greeting
            // are bounded by an outer deadline spanning the whole
            // conversation.
            send_deadline: config.connect_timeout
                + config.greeting_timeout
                + config.socket_timeout,
        })
    }

    fn effective_from<'a>(&'a self, email: &'a OutgoingEmail) -> &'a str {
        email
            .from_address
            .as_ref()
            .map(EmailAddress::as_str)
            .unwrap_or(&self.from_address)
    }

    fn build_message(
        &self,
        email: &OutgoingEmail,
        from_address: &str,
        message_id: &str,
    ) -> Result<Message, ApiError> {
        let from_name = email.from_name.as_deref().unwrap_or(&self.from_name);
        let from_addr = from_address
            .parse::<Address>()
            .map_err(|e| ApiError::Validation(format!("Invalid from address: {}", e)))?;
        let to_addr = email
            .to
            .as_str()
            .parse::<Address>()
            .map_err(|e| ApiError::Validation(format!("Invalid recipient address: {}", e)))?;

        let mut builder = Message::builder()
            // Mailbox::new quotes display names as needed; never splice the
            // name into a parsed string.
            .from(Mailbox::new(Some(from_name.to_string()), from_addr))
            .to(Mailbox::new(None, to_addr))
            .subject(&email.subject)
            .message_id(Some(message_id.to_string()));

        let reply_to = email
            .reply_to
            .as_ref()
            .map(|address| address.as_str().to_string())
            .or_else(|| self.default_reply_to.clone());
        if let Some(reply_to) = reply_to {
            let addr = reply_to
                .parse::<Address>()
                .map_err(|e| ApiError::Validation(format!("Invalid reply-to address: {}", e)))?;
            builder = builder.reply_to(Mailbox::new(None, addr));
        }

        match (&email.html_body, &email.text_body) {
            (Some(html), Some(text)) => builder.multipart(
                MultiPart::alternative_plain_html(text.clone(), html.clone()),
            ),
            (Some(html), None) => builder.singlepart(SinglePart::html(html.clone())),
            (None, Some(text)) => builder.singlepart(SinglePart::plain(text.clone())),
            (None, None) => {
                return Err(ApiError::Validation(
                    "Missing required fields (to, subject, html/text)".to_string(),
                ))
            }
        }
        .map_err(|e| ApiError::Transport(format!("failed to build message: {}", e)))
    }
}

#[async_trait]
impl EmailService for SmtpMailer {

    async fn send(&self, email: &OutgoingEmail) -> Result<SendReceipt, ApiError> {
        if self.verify_on_send {
            // Diagnostic only: a failed handshake must not abort delivery.
            if let Err(e) = self.verify().await {
                log::warn!(
                    "SMTP verification failed, attempting delivery anyway: {}",
                    e
                );
            }
        }

        let from_address = self.effective_from(email).to_string();
        let message_id = generate_message_id(&from_address);
        let message = self.build_message(email, &from_address, &message_id)?;

        match tokio::time::timeout(self.send_deadline, self.mailer.send(message)).await {
            Err(_) => Err(ApiError::Transport(format!(
                "send to {} via {}:{} timed out after {}s",
                email.to,
                self.host,
                self.port,
                self.send_deadline.as_secs()
            ))),
            Ok(Err(e)) => Err(ApiError::Transport(e.to_string())),
            Ok(Ok(_)) => {
                log::info!(
                    "email dispatched to {} (category {}, {})",
                    email.to,
                    email.category,
                    message_id
                );
                Ok(SendReceipt {
                    accepted: vec![email.to.to_string()],
                    rejected: Vec::new(),
                    message_id,
                    envelope: MailEnvelope {
                        from: from_address,
                        to: vec![email.to.to_string()],
                    },
                })
            }
        }
    }

    async fn verify(&self) -> Result<(), ApiError> {
        match self.mailer.test_connection().await {
            Ok(true) => Ok(()),
            Ok(false) => Err(ApiError::Transport(format!(
                "SMTP server {}:{} refused the connection test",
                self.host, self.port
            ))),
            Err(e) => Err(ApiError::Transport(e.to_string())),
        }
    }
}

// The transport holds credentials; keep them out of debug dumps.
impl fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("from_address", &self.from_address)
            .field("verify_on_send", &self.verify_on_send)
            .field("send_deadline", &self.send_deadline)
            .finish_non_exhaustive()
    }
}

/// Client-side Message-ID in the `<uuid@from-domain>` shape; the receipt
/// echoes the same value the header carries.
fn generate_message_id(from_address: &str) -> String {
    let domain = from_address.rsplit('@').next().unwrap_or("localhost");
    format!("<{}@{}>", Uuid::new_v4(), domain)
}
