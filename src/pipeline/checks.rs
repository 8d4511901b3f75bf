//! Rule-based quality checks over a finished draft.
//!
//! Five independent checks run over all text fields; the warnings are
//! deduplicated and folded into the four gating booleans of [`CheckResult`].
//! Consistency warnings are advisory and never flip a boolean.

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::config::{DraftResources, Guardrails};
use crate::pipeline::types::{CheckResult, DraftOutput};

pub const MISSING_SUBJECT: &str = "COMPLETENESS_MISSING_SUBJECT";
pub const MISSING_GREETING: &str = "COMPLETENESS_MISSING_GREETING";
pub const MISSING_CLOSING: &str = "COMPLETENESS_MISSING_CLOSING";
pub const MISSING_CTA: &str = "COMPLETENESS_MISSING_CTA";
pub const SLANG_DETECTED: &str = "PROFESSIONALISM_SLANG_DETECTED";
pub const EMOJI_DETECTED: &str = "PROFESSIONALISM_EMOJI_DETECTED";
pub const LONG_SENTENCES: &str = "CLARITY_LONG_SENTENCES";
pub const RUN_ON_SENTENCE: &str = "CLARITY_RUN_ON_SENTENCE";
pub const OVERPROMISE_DETECTED: &str = "ETHICAL_OVERPROMISE_DETECTED";
pub const INAPPROPRIATE_TERM: &str = "ETHICAL_INAPPROPRIATE_TERM";
pub const ATTACHMENT_REFERENCED: &str = "CONSISTENCY_ATTACHMENT_REFERENCED";
pub const LINK_DETECTED: &str = "CONSISTENCY_LINK_DETECTED";

/// Mean words per sentence above which the draft reads as long-winded.
pub const MAX_AVG_SENTENCE_WORDS: f64 = 20.0;
/// A single sentence above this many words is a run-on.
pub const MAX_SENTENCE_WORDS: usize = 30;

const INAPPROPRIATE_TERMS: &[&str] = &[
    "desperate",
    "begging",
    "please hire me",
    "i need this job",
    "i'll do anything",
];

/// Call-to-action patterns, matched against the lower-cased body.
static CTA_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\bcall\b",
        r"\bmeet\b",
        r"\bschedule\b",
        r"\bconnect\b",
        r"\blet me know\b",
        r"\bplease\b",
        r"\bwould you\b",
        r"\bcan you\b",
        r"\bcould you\b",
        r"\blook forward\b",
        r"\bhope to hear\b",
        r"\bthank you\b",
        r"\bfeel free\b",
    ]
    .into_iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static SENTENCE_SPLIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+").unwrap());

/// Split text into trimmed, non-empty sentences.
pub fn sentences(text: &str) -> Vec<&str> {
    SENTENCE_SPLIT
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Runs the rule-based checks against configured guardrails.
pub struct QualityChecker {
    resources: Arc<DraftResources>,
}

impl QualityChecker {
    pub fn new(resources: Arc<DraftResources>) -> Self {
        Self { resources }
    }

    pub fn run(&self, draft: &DraftOutput) -> CheckResult {
        let guardrails = &self.resources.guardrails;
        let all_text = draft.all_text();

        let mut warnings = Vec::new();
        warnings.extend(check_completeness(draft));
        warnings.extend(check_professionalism(&all_text, guardrails));
        warnings.extend(check_clarity(&all_text));
        warnings.extend(check_ethical(&all_text, guardrails));
        warnings.extend(check_consistency(&all_text, guardrails));

        CheckResult::from_warnings(warnings.into_iter().map(str::to_string))
    }
}

pub fn check_completeness(draft: &DraftOutput) -> Vec<&'static str> {
    let mut warnings = Vec::new();
    if draft.subject.trim().is_empty() {
        warnings.push(MISSING_SUBJECT);
    }
    if draft.greeting.trim().is_empty() {
        warnings.push(MISSING_GREETING);
    }
    if draft.closing.trim().is_empty() {
        warnings.push(MISSING_CLOSING);
    }

    let body = draft.body_sections.join(" ").to_lowercase();
    if !CTA_PATTERNS.iter().any(|p| p.is_match(&body)) {
        warnings.push(MISSING_CTA);
    }
    warnings
}

pub fn check_professionalism(text: &str, guardrails: &Guardrails) -> Vec<&'static str> {
    let mut warnings = Vec::new();
    if guardrails.slang.is_match(text) {
        warnings.push(SLANG_DETECTED);
    }
    if guardrails.emoji.is_match(text) {
        warnings.push(EMOJI_DETECTED);
    }
    warnings
}

pub fn check_clarity(text: &str) -> Vec<&'static str> {
    let counts: Vec<usize> = sentences(text)
        .iter()
        .map(|s| s.split_whitespace().count())
        .collect();
    if counts.is_empty() {
        return Vec::new();
    }

    let mut warnings = Vec::new();
    let avg = counts.iter().sum::<usize>() as f64 / counts.len() as f64;
    if avg > MAX_AVG_SENTENCE_WORDS {
        warnings.push(LONG_SENTENCES);
    }
    if counts.iter().any(|&n| n > MAX_SENTENCE_WORDS) {
        warnings.push(RUN_ON_SENTENCE);
    }
    warnings
}

pub fn check_ethical(text: &str, guardrails: &Guardrails) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    let mut warnings = Vec::new();
    if guardrails
        .blacklist_phrases
        .iter()
        .any(|p| lower.contains(p.as_str()))
    {
        warnings.push(OVERPROMISE_DETECTED);
    }
    if INAPPROPRIATE_TERMS.iter().any(|t| lower.contains(t)) {
        warnings.push(INAPPROPRIATE_TERM);
    }
    warnings
}

pub fn check_consistency(text: &str, guardrails: &Guardrails) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    let mut warnings = Vec::new();
    if guardrails
        .attachment_keywords
        .iter()
        .any(|k| lower.contains(k.as_str()))
    {
        warnings.push(ATTACHMENT_REFERENCED);
    }
    if guardrails.link.is_match(text) {
        warnings.push(LINK_DETECTED);
    }
    warnings
}
