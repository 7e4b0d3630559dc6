//! Gmail API response normalization
//!
//! Converts a full Gmail message into a [`MessageRecord`]:
//! - `From` and `Subject` headers are taken verbatim
//! - `Date` is parsed as RFC 2822 and re-emitted as RFC 3339, or left empty
//! - the body prefers `text/plain` parts; `text/html` parts are converted to
//!   text only when the message has no plain part at all. Non-empty parts of
//!   the chosen kind are joined with a blank line, in source order.

use anyhow::{Context, Result};
use base64::prelude::*;
use chrono::DateTime;
use log::warn;

use super::api::{GmailMessage, Header, MessagePart};
use crate::models::{MessageId, MessageRecord};

/// Column width handed to the HTML renderer; wide enough to avoid wrapping prose
const HTML_TEXT_WIDTH: usize = 4096;

/// Separator between body parts of the same kind
const PART_SEPARATOR: &str = "\n\n";

/// Normalize a Gmail API message to a MessageRecord
pub fn normalize_message(gmail_msg: GmailMessage) -> Result<MessageRecord> {
    anyhow::ensure!(!gmail_msg.id.is_empty(), "Message has no id");
    let id = MessageId::new(gmail_msg.id);

    let payload = gmail_msg.payload.as_ref().context("Message has no payload")?;
    let headers = payload.headers.as_deref().unwrap_or_default();

    let sender = extract_header(headers, "From").unwrap_or_default();
    let subject = extract_header(headers, "Subject").unwrap_or_default();

    let iso_date = match extract_header(headers, "Date") {
        Some(raw) => parse_date(&raw).unwrap_or_else(|| {
            warn!("Could not parse date header for message {}: {:?}", id, raw);
            String::new()
        }),
        None => String::new(),
    };

    let body = extract_body(payload);

    Ok(MessageRecord::new(id)
        .sender(sender)
        .subject(subject)
        .iso_date(iso_date)
        .body(body))
}

/// Extract a header value by name
fn extract_header(headers: &[Header], name: &str) -> Option<String> {
    headers.iter().find_map(|h| {
        if h.name.eq_ignore_ascii_case(name) {
            Some(h.value.clone())
        } else {
            None
        }
    })
}

/// Parse an RFC 2822 date, tolerating a trailing zone comment like `(UTC)`
fn parse_date(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let without_comment = match trimmed.rfind('(') {
        Some(idx) if trimmed.ends_with(')') => trimmed[..idx].trim_end(),
        _ => trimmed,
    };

    DateTime::parse_from_rfc2822(without_comment)
        .ok()
        .map(|dt| dt.to_rfc3339())
}

/// Pick the body text for a message payload
fn extract_body(payload: &MessagePart) -> String {
    let mut plain = Vec::new();
    let mut html = Vec::new();
    collect_text_parts(payload, &mut plain, &mut html);

    // An empty plain part still wins over HTML
    if !plain.is_empty() {
        return join_non_empty(plain.iter().map(|text| text.trim().to_string()));
    }

    join_non_empty(html.iter().map(|markup| html_to_text(markup)))
}

/// Walk the MIME tree in source order, collecting decoded text leaves.
/// Attachments (parts with a filename) are skipped.
fn collect_text_parts(part: &MessagePart, plain: &mut Vec<String>, html: &mut Vec<String>) {
    if let Some(children) = part.parts.as_deref()
        && !children.is_empty()
    {
        for child in children {
            collect_text_parts(child, plain, html);
        }
        return;
    }

    if part.filename.as_deref().is_some_and(|f| !f.is_empty()) {
        return;
    }

    let mime_type = part
        .mime_type
        .as_deref()
        .unwrap_or_default()
        .to_ascii_lowercase();
    let decoded = part
        .body
        .as_ref()
        .and_then(|b| b.data.as_deref())
        .and_then(decode_base64_body);

    if mime_type.starts_with("text/plain") {
        plain.push(decoded.unwrap_or_default());
    } else if mime_type.starts_with("text/html")
        && let Some(markup) = decoded
    {
        html.push(markup);
    }
}

fn join_non_empty(parts: impl Iterator<Item = String>) -> String {
    parts
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(PART_SEPARATOR)
}

/// Render HTML as plain text; on renderer failure the markup is kept as-is
fn html_to_text(markup: &str) -> String {
    match html2text::from_read(markup.as_bytes(), HTML_TEXT_WIDTH) {
        Ok(text) => text
            .lines()
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string(),
        Err(e) => {
            warn!("Failed to convert HTML body to text: {}", e);
            markup.trim().to_string()
        }
    }
}

/// Decode base64-encoded body data
///
/// Gmail uses URL-safe base64 but padding can vary, so we try multiple decoders.
/// Invalid UTF-8 sequences are replaced rather than dropping the part.
fn decode_base64_body(data: &str) -> Option<String> {
    use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE};

    let decoders: &[&base64::engine::GeneralPurpose] =
        &[&BASE64_URL_SAFE_NO_PAD, &URL_SAFE, &STANDARD, &STANDARD_NO_PAD];

    decoders
        .iter()
        .find_map(|decoder| decoder.decode(data).ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
}
