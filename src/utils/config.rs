use dotenv::dotenv;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value `{value}`: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("SMTP_USER and SMTP_PASS must be provided together")]
    PartialCredentials,
}

/// Process configuration, read once at startup. Every setting has exactly
/// one environment variable name; there are no legacy alias fallbacks.
#[derive(Clone)]
pub struct AppConfig {
    pub bind_address: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Encrypt from the first byte (port 465 style) instead of STARTTLS.
    pub implicit_tls: bool,
    pub smtp_user: Option<String>,
    pub smtp_pass: Option<String>,
    /// Accept self-signed or mismatched certificates on the SMTP host.
    /// Off unless explicitly enabled.
    pub allow_invalid_certs: bool,
    /// Run a diagnostic connection handshake before sending.
    pub verify_connection: bool,
    pub connect_timeout: Duration,
    pub greeting_timeout: Duration,
    pub socket_timeout: Duration,
    pub from_name: String,
    pub from_address: String,
    pub reply_to: Option<String>,
    pub admin_recipient: Option<String>,
    pub notify_admin: bool,
    pub allowed_origins: Vec<String>,
}

impl AppConfig {

    pub fn from_env() -> Result<AppConfig, ConfigError> {
        dotenv().ok();

        let smtp_user = optional("SMTP_USER");
        let smtp_pass = optional("SMTP_PASS");
        if smtp_user.is_some() != smtp_pass.is_some() {
            return Err(ConfigError::PartialCredentials);
        }

        Ok(AppConfig {
            bind_address: optional("BIND_ADDRESS")
                .unwrap_or_else(|| "127.0.0.1:8080".to_string()),
            smtp_host: required("SMTP_HOST")?,
            smtp_port: port("SMTP_PORT", 465)?,
            implicit_tls: flag("SMTP_IMPLICIT_TLS", true)?,
            smtp_user,
            smtp_pass,
            allow_invalid_certs: flag("SMTP_ALLOW_INVALID_CERTS", false)?,
            verify_connection: flag("SMTP_VERIFY_CONNECTION", false)?,
            connect_timeout: seconds("SMTP_CONNECT_TIMEOUT_SECS", 60)?,
            greeting_timeout: seconds("SMTP_GREETING_TIMEOUT_SECS", 30)?,
            socket_timeout: seconds("SMTP_SOCKET_TIMEOUT_SECS", 60)?,
            from_name: optional("MAIL_FROM_NAME")
                .unwrap_or_else(|| "Newsletter".to_string()),
            from_address: required("MAIL_FROM_ADDRESS")?,
            reply_to: optional("MAIL_REPLY_TO"),
            admin_recipient: optional("ADMIN_RECIPIENT"),
            notify_admin: flag("ADMIN_NOTIFY", false)?,
            allowed_origins: optional("CORS_ALLOWED_ORIGINS")
                .map(|value| {
                    value
                        .split(',')
                        .map(|origin| origin.trim().to_string())
                        .filter(|origin| !origin.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

// Credentials must never reach the log through a config dump.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_address", &self.bind_address)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("implicit_tls", &self.implicit_tls)
            .field("smtp_user", &self.smtp_user.as_ref().map(|_| "***"))
            .field("smtp_pass", &self.smtp_pass.as_ref().map(|_| "***"))
            .field("allow_invalid_certs", &self.allow_invalid_certs)
            .field("verify_connection", &self.verify_connection)
            .field("connect_timeout", &self.connect_timeout)
            .field("greeting_timeout", &self.greeting_timeout)
            .field("socket_timeout", &self.socket_timeout)
            .field("from_name", &self.from_name)
            .field("from_address", &self.from_address)
            .field("reply_to", &self.reply_to)
            .field("admin_recipient", &self.admin_recipient)
            .field("notify_admin", &self.notify_admin)
            .field("allowed_origins", &self.allowed_origins)
            .finish()
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

fn optional(name: &'static str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn flag(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match optional(name) {
        None => Ok(default),
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid {
                name,
                value,
                reason: "expected a boolean".to_string(),
            }),
        },
    }
}

fn port(name: &'static str, default: u16) -> Result<u16, ConfigError> {
    match optional(name) {
        None => Ok(default),
        Some(value) => value.parse::<u16>().map_err(|_| ConfigError::Invalid {
            name,
            value: value.clone(),
            reason: "expected a port number".to_string(),
        }),
    }
}

fn seconds(name: &'static str, default: u64) -> Result<Duration, ConfigError> {
    match optional(name) {
        None => Ok(Duration::from_secs(default)),
        Some(value) => value
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::Invalid {
                name,
                value: value.clone(),
                reason: "expected a number of seconds".to_string(),
            }),
    }
}
