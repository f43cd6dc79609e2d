use chrono::{DateTime, SecondsFormat, Utc};

use crate::domain::email::model::RenderedEmail;

pub const WELCOME_SUBJECT: &str = "Welcome to the newsletter!";
pub const ADMIN_NOTIFICATION_SUBJECT: &str = "New newsletter subscriber";

const DEFAULT_NAME: &str = "Developer";
const DEFAULT_SOURCE: &str = "website";
const DEFAULT_CLIENT: &str = "unknown";

pub struct NotificationContext<'a> {
    pub subscriber: &'a str,
    pub timestamp: DateTime<Utc>,
    /// Originating client signal, usually the User-Agent header.
    pub client: Option<&'a str>,
    pub source: Option<&'a str>,
}

/// Subscription confirmation pair. Standalone HTML document with inline
/// styles only; email clients do not reliably fetch external CSS.
pub fn render_welcome(name: Option<&str>) -> RenderedEmail {
    let name = match name.map(str::trim) {
        Some(value) if !value.is_empty() => value,
        _ => DEFAULT_NAME,
    };
    let name = escape_html(name);

    let html = format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head><meta charset=\"utf-8\"></head>\n\
         <body style=\"margin:0;padding:0;background-color:#f4f4f7;font-family:Arial,Helvetica,sans-serif;\">\n\
         <div style=\"max-width:600px;margin:0 auto;padding:32px 24px;\">\n\
         <div style=\"background-color:#ffffff;border-radius:8px;padding:32px;\">\n\
         <h1 style=\"margin:0 0 16px;color:#1a1a2e;font-size:24px;\">Welcome aboard!</h1>\n\
         <p style=\"margin:0 0 12px;color:#444444;font-size:16px;line-height:1.5;\">Hi {},</p>\n\
         <p style=\"margin:0 0 12px;color:#444444;font-size:16px;line-height:1.5;\">\
         Thanks for subscribing to the newsletter. You will get an email whenever \
         a new article or project goes live. No spam, and you can unsubscribe at \
         any time.</p>\n\
         <p style=\"margin:0;color:#444444;font-size:16px;line-height:1.5;\">Until then, happy coding!</p>\n\
         </div>\n\
         <p style=\"margin:16px 0 0;color:#999999;font-size:12px;text-align:center;\">\
         You are receiving this because you subscribed on the website.</p>\n\
         </div>\n\
         </body>\n\
         </html>\n",
        name
    );

    let text = format!(
        "Hi {},\n\n\
         Thanks for subscribing to the newsletter. You will get an email whenever \
         a new article or project goes live. No spam, and you can unsubscribe at \
         any time.\n\n\
         Until then, happy coding!\n",
        name
    );

    RenderedEmail { html, text }
}

/// Internal alert pair announcing a new subscriber.
pub fn render_admin_notification(context: &NotificationContext<'_>) -> RenderedEmail {
    let subscriber = escape_html(context.subscriber);
    let timestamp = context.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true);
    let source = escape_html(context.source.unwrap_or(DEFAULT_SOURCE));
    let client = escape_html(context.client.unwrap_or(DEFAULT_CLIENT));

    let html = format!(
        "<!DOCTYPE html>\n\
         <html>\n\
         <head><meta charset=\"utf-8\"></head>\n\
         <body style=\"margin:0;padding:0;background-color:#f4f4f7;font-family:Arial,Helvetica,sans-serif;\">\n\
         <div style=\"max-width:600px;margin:0 auto;padding:32px 24px;\">\n\
         <div style=\"background-color:#ffffff;border-radius:8px;padding:32px;\">\n\
         <h1 style=\"margin:0 0 16px;color:#1a1a2e;font-size:20px;\">New newsletter subscriber</h1>\n\
         <table style=\"border-collapse:collapse;width:100%;font-size:14px;color:#444444;\">\n\
         <tr><td style=\"padding:6px 12px 6px 0;font-weight:bold;\">Email</td><td style=\"padding:6px 0;\">{}</td></tr>\n\
         <tr><td style=\"padding:6px 12px 6px 0;font-weight:bold;\">Date</td><td style=\"padding:6px 0;\">{}</td></tr>\n\
         <tr><td style=\"padding:6px 12px 6px 0;font-weight:bold;\">Source</td><td style=\"padding:6px 0;\">{}</td></tr>\n\
         <tr><td style=\"padding:6px 12px 6px 0;font-weight:bold;\">Client</td><td style=\"padding:6px 0;\">{}</td></tr>\n\
         </table>\n\
         </div>\n\
         </div>\n\
         </body>\n\
         </html>\n",
        subscriber, timestamp, source, client
    );

    let text = format!(
        "New newsletter subscriber\n\n\
         Email:  {}\n\
         Date:   {}\n\
         Source: {}\n\
         Client: {}\n",
        subscriber, timestamp, source, client
    );

    RenderedEmail { html, text }
}

pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
