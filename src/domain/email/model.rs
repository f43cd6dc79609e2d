use std::fmt;

use serde::Deserialize;

use crate::utils::errors::ApiError;

/// A syntactically valid, normalized (trimmed, ASCII-lowercased) address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress(String);

impl EmailAddress {

    /// Accepts `localpart@domain.tld`: ASCII only, exactly one `@`, a
    /// non-empty local part, at least one `.` after the `@`, no whitespace.
    pub fn parse(input: &str) -> Result<EmailAddress, ApiError> {
        let normalized = input.trim().to_ascii_lowercase();
        if !Self::is_valid(&normalized) {
            return Err(ApiError::Validation("Invalid email".to_string()));
        }
        Ok(EmailAddress(normalized))
    }

    fn is_valid(address: &str) -> bool {
        if address.is_empty() || !address.is_ascii() {
            return false;
        }
        if address.chars().any(|c| c.is_whitespace()) {
            return false;
        }
        if address.matches('@').count() != 1 {
            return false;
        }
        let (local, domain) = match address.split_once('@') {
            Some(parts) => parts,
            None => return false,
        };
        !local.is_empty() && !domain.is_empty() && domain.contains('.')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of `POST /send-email`. Every field is optional at the wire level;
/// the required-field rules are applied by `into_outgoing` so that a
/// missing field produces the endpoint's own error message rather than a
/// deserializer message.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendEmailRequest {
    pub to: Option<String>,
    pub subject: Option<String>,
    pub html: Option<String>,
    pub text: Option<String>,
    pub reply_to: Option<String>,
    pub from_name: Option<String>,
    pub from_address: Option<String>,
    #[serde(rename = "type")]
    pub category: Option<String>,
}

impl SendEmailRequest {

    pub fn into_outgoing(self) -> Result<OutgoingEmail, ApiError> {
        let has_body = present(&self.html) || present(&self.text);
        if !present(&self.to) || !present(&self.subject) || !has_body {
            return Err(ApiError::Validation(
                "Missing required fields (to, subject, html/text)".to_string(),
            ));
        }

        let to = EmailAddress::parse(self.to.as_deref().unwrap_or(""))?;
        let reply_to = match self.reply_to.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => Some(EmailAddress::parse(value)?),
            _ => None,
        };
        let from_address = match self.from_address.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => Some(EmailAddress::parse(value)?),
            _ => None,
        };

        Ok(OutgoingEmail {
            to,
            subject: self.subject.unwrap_or_default().trim().to_string(),
            html_body: self.html.filter(|body| !body.trim().is_empty()),
            text_body: self.text.filter(|body| !body.trim().is_empty()),
            reply_to,
            from_name: self
                .from_name
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty()),
            from_address,
            category: self
                .category
                .map(|tag| tag.trim().to_string())
                .filter(|tag| !tag.is_empty())
                .unwrap_or_else(|| "transactional".to_string()),
        })
    }
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false)
}

/// Body of `POST /send-welcome`. `email` stays optional so that `{}` and
/// `{"email": null}` reach the handler's validation path.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionRequest {
    pub email: Option<String>,
}

/// A fully validated message, ready for the transport. At least one of
/// `html_body`/`text_body` is set by construction.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: EmailAddress,
    pub subject: String,
    pub html_body: Option<String>,
    pub text_body: Option<String>,
    pub reply_to: Option<EmailAddress>,
    pub from_name: Option<String>,
    pub from_address: Option<EmailAddress>,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEmail {
    pub html: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailEnvelope {
    pub from: String,
    pub to: Vec<String>,
}

/// Outcome of a single delivery attempt. There is no retry state; one
/// invocation makes at most one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    pub accepted: Vec<String>,
    pub rejected: Vec<String>,
    pub message_id: String,
    pub envelope: MailEnvelope,
}
