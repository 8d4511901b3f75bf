//! PII redaction for log fields.
//!
//! User-authored text never reaches a log line unmasked: emails, phone
//! numbers, professional-network profile URLs and http(s) URLs are replaced
//! with a marker before emission. Redaction is observability-only and never
//! feeds back into the pipeline.

use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Default replacement marker.
pub const REDACTED: &str = "[REDACTED]";

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Z|a-z]{2,}\b").unwrap()
});

static PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\+?1[-.\s]?)?\(?([0-9]{3})\)?[-.\s]?([0-9]{3})[-.\s]?([0-9]{4})\b").unwrap()
});

static LINKEDIN_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"https?://(www\.)?linkedin\.com/in/[a-zA-Z0-9-]+/?").unwrap()
});

static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"{}|\\^`\[\]]+"#).unwrap());

/// Which kinds of PII to mask.
#[derive(Debug, Clone)]
pub struct RedactOptions {
    pub mask_emails: bool,
    pub mask_phones: bool,
    pub mask_urls: bool,
    pub mask_linkedin: bool,
    pub replacement: String,
}

impl Default for RedactOptions {
    fn default() -> Self {
        Self {
            mask_emails: true,
            mask_phones: true,
            mask_urls: true,
            mask_linkedin: true,
            replacement: REDACTED.to_string(),
        }
    }
}

/// Mask PII in `text` with the default options.
pub fn redact(text: &str) -> String {
    redact_with(text, &RedactOptions::default())
}

/// Mask PII in `text`.
///
/// Profile URLs are handled before generic URLs; with `mask_linkedin` off
/// they survive the URL pass untouched.
pub fn redact_with(text: &str, opts: &RedactOptions) -> String {
    let mut result = text.to_string();
    let replacement = opts.replacement.as_str();

    if opts.mask_emails {
        result = EMAIL_REGEX.replace_all(&result, replacement).into_owned();
    }
    if opts.mask_phones {
        result = PHONE_REGEX.replace_all(&result, replacement).into_owned();
    }
    if opts.mask_linkedin {
        result = LINKEDIN_REGEX.replace_all(&result, replacement).into_owned();
    }
    if opts.mask_urls {
        result = URL_REGEX
            .replace_all(&result, |caps: &Captures<'_>| {
                let matched = &caps[0];
                if !opts.mask_linkedin && LINKEDIN_REGEX.is_match(matched) {
                    matched.to_string()
                } else {
                    replacement.to_string()
                }
            })
            .into_owned();
    }
    result
}

/// Recursively mask every string inside a JSON value.
pub fn redact_value(value: &serde_json::Value) -> serde_json::Value {
    redact_value_with(value, &RedactOptions::default())
}

pub fn redact_value_with(value: &serde_json::Value, opts: &RedactOptions) -> serde_json::Value {
    use serde_json::Value;
    match value {
        Value::String(s) => Value::String(redact_with(s, opts)),
        Value::Array(items) => Value::Array(items.iter().map(|v| redact_value_with(v, opts)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), redact_value_with(v, opts)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Short, redacted preview of user text for log fields.
pub fn preview(text: &str, max_chars: usize) -> String {
    let truncated: String = text.chars().take(max_chars).collect();
    let mut out = redact(&truncated);
    if text.chars().count() > max_chars {
        out.push('…');
    }
    out
}
