//! Shared types for the drafting pipeline.
//!
//! Wire names are camelCase so the JSON contract matches what the web
//! front end already sends and reads (`bodySections`, `matchedRules`, ...).

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ── Tone ────────────────────────────────────────────────────────────

/// Seniority of the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seniority {
    Student,
    Professional,
}

impl Seniority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Professional => "professional",
        }
    }
}

/// Target length of the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Length {
    Short,
    Medium,
    Long,
}

impl Length {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
        }
    }
}

/// Four-axis tone configuration driving every style decision.
///
/// `formality` and `confidence` are 1–5; range checks happen at the HTTP
/// boundary, the pipeline treats anything ≥4 as "high" and ≤2 as "low".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToneSettings {
    pub formality: u8,
    pub confidence: u8,
    pub seniority: Seniority,
    pub length: Length,
}

impl Default for ToneSettings {
    fn default() -> Self {
        Self {
            formality: 3,
            confidence: 3,
            seniority: Seniority::Student,
            length: Length::Medium,
        }
    }
}

// ── Input ───────────────────────────────────────────────────────────

/// A drafting request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftInput {
    /// Short informal description of what the email should say.
    pub text: String,
    pub tone: ToneSettings,
    /// Placeholder substitutions for the template strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<HashMap<String, String>>,
}

impl DraftInput {
    pub fn new(text: impl Into<String>, tone: ToneSettings) -> Self {
        Self {
            text: text.into(),
            tone,
            overrides: None,
        }
    }

    pub fn with_overrides(mut self, overrides: HashMap<String, String>) -> Self {
        self.overrides = Some(overrides);
        self
    }
}

// ── Category ────────────────────────────────────────────────────────

/// Intent category of an email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailCategory {
    Networking,
    Followup,
    Referral,
    Thankyou,
    Other,
}

impl EmailCategory {
    /// All categories, in declaration (tie-break) order.
    pub const ALL: [EmailCategory; 5] = [
        Self::Networking,
        Self::Followup,
        Self::Referral,
        Self::Thankyou,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Networking => "networking",
            Self::Followup => "followup",
            Self::Referral => "referral",
            Self::Thankyou => "thankyou",
            Self::Other => "other",
        }
    }
}

impl Default for EmailCategory {
    fn default() -> Self {
        Self::Other
    }
}

impl fmt::Display for EmailCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of the categorizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Categorization {
    pub category: EmailCategory,
    /// 0.0–1.0, rounded to two decimals.
    pub confidence: f64,
    /// Unique matched phrases of the winning category.
    pub matched_rules: Vec<String>,
}

// ── Draft ───────────────────────────────────────────────────────────

/// Structured email draft.
///
/// `body_sections` order is meaningful: intro, context, purpose, call to action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftOutput {
    pub subject: String,
    pub greeting: String,
    pub body_sections: Vec<String>,
    pub closing: String,
}

impl DraftOutput {
    /// Every text field joined by single spaces, in reading order.
    pub fn all_text(&self) -> String {
        let mut parts: Vec<&str> = Vec::with_capacity(self.body_sections.len() + 3);
        parts.push(&self.subject);
        parts.push(&self.greeting);
        parts.extend(self.body_sections.iter().map(String::as_str));
        parts.push(&self.closing);
        parts.join(" ")
    }

    /// Plain-text rendering used in prompts and logs.
    pub fn render(&self) -> String {
        format!(
            "Subject: {}\n\n{}\n\n{}\n\n{}",
            self.subject,
            self.greeting,
            self.body_sections.join("\n\n"),
            self.closing
        )
    }
}

// ── Checks ──────────────────────────────────────────────────────────

/// Warning code prefixes. A boolean in [`CheckResult`] is false iff a warning
/// with its prefix exists. `CONSISTENCY_` is advisory and gates nothing.
pub const COMPLETENESS_PREFIX: &str = "COMPLETENESS_";
pub const PROFESSIONALISM_PREFIX: &str = "PROFESSIONALISM_";
pub const CLARITY_PREFIX: &str = "CLARITY_";
pub const ETHICAL_PREFIX: &str = "ETHICAL_";
pub const CONSISTENCY_PREFIX: &str = "CONSISTENCY_";

/// Result of the rule-based quality checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub completeness: bool,
    pub professionalism: bool,
    pub clarity: bool,
    pub ethical: bool,
    /// Deduplicated, in first-seen order.
    pub warnings: Vec<String>,
}

impl CheckResult {
    /// Build a result from raw warnings, deduplicating and deriving booleans.
    pub fn from_warnings(raw: impl IntoIterator<Item = String>) -> Self {
        let mut warnings: Vec<String> = Vec::new();
        for w in raw {
            if !warnings.contains(&w) {
                warnings.push(w);
            }
        }
        let clean = |prefix: &str| !warnings.iter().any(|w| w.starts_with(prefix));
        Self {
            completeness: clean(COMPLETENESS_PREFIX),
            professionalism: clean(PROFESSIONALISM_PREFIX),
            clarity: clean(CLARITY_PREFIX),
            ethical: clean(ETHICAL_PREFIX),
            warnings,
        }
    }

    /// Number of warnings carrying `prefix`.
    pub fn count_with_prefix(&self, prefix: &str) -> usize {
        self.warnings.iter().filter(|w| w.starts_with(prefix)).count()
    }
}

// ── Evaluation ──────────────────────────────────────────────────────

/// Coarse word-count bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WordCountBand {
    Short,
    Medium,
    Long,
    VeryLong,
}

impl WordCountBand {
    pub fn for_count(word_count: usize) -> Self {
        match word_count {
            0..=50 => Self::Short,
            51..=150 => Self::Medium,
            151..=300 => Self::Long,
            _ => Self::VeryLong,
        }
    }
}

/// Numeric quality scores plus the raw counts they derive from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvalMetrics {
    pub word_count: usize,
    pub word_count_band: WordCountBand,
    pub long_sentence_count: usize,
    /// Mean words per sentence, rounded to one decimal.
    pub avg_sentence_length: f64,
    pub slang_hits: usize,
    pub emoji_hits: usize,
    pub overpromise_hits: usize,
    pub attachment_refs: usize,
    pub link_refs: usize,
    /// 0–100.
    pub readability_score: f64,
    /// 0–100.
    pub professionalism_score: u32,
    /// 0–100.
    pub overall_score: u32,
}

// ── Refinement ──────────────────────────────────────────────────────

/// Outcome of an LLM refinement attempt.
///
/// `was_refined == !used_fallback` always holds; when `used_fallback` is set,
/// `draft`, `checks` and `eval_metrics` are the untouched baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefineResult {
    pub draft: DraftOutput,
    pub checks: CheckResult,
    pub eval_metrics: EvalMetrics,
    pub was_refined: bool,
    pub used_fallback: bool,
    pub refine_warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_result_dedups_and_derives_booleans() {
        let result = CheckResult::from_warnings(vec![
            "ETHICAL_OVERPROMISE_DETECTED".to_string(),
            "CONSISTENCY_LINK_DETECTED".to_string(),
            "ETHICAL_OVERPROMISE_DETECTED".to_string(),
        ]);
        assert_eq!(result.warnings.len(), 2);
        assert!(!result.ethical);
        assert!(result.completeness);
        assert!(result.professionalism);
        assert!(result.clarity);
    }

    #[test]
    fn consistency_warnings_gate_nothing() {
        let result = CheckResult::from_warnings(vec![
            "CONSISTENCY_ATTACHMENT_REFERENCED".to_string(),
        ]);
        assert!(result.completeness && result.professionalism && result.clarity && result.ethical);
        assert_eq!(result.count_with_prefix(CONSISTENCY_PREFIX), 1);
    }

    #[test]
    fn word_count_band_boundaries() {
        assert_eq!(WordCountBand::for_count(0), WordCountBand::Short);
        assert_eq!(WordCountBand::for_count(50), WordCountBand::Short);
        assert_eq!(WordCountBand::for_count(51), WordCountBand::Medium);
        assert_eq!(WordCountBand::for_count(150), WordCountBand::Medium);
        assert_eq!(WordCountBand::for_count(300), WordCountBand::Long);
        assert_eq!(WordCountBand::for_count(301), WordCountBand::VeryLong);
    }

    #[test]
    fn draft_serializes_camel_case() {
        let draft = DraftOutput {
            subject: "Hi".into(),
            greeting: "Hello,".into(),
            body_sections: vec!["Body.".into()],
            closing: "Thanks".into(),
        };
        let json = serde_json::to_value(&draft).unwrap();
        assert!(json.get("bodySections").is_some());
    }

    #[test]
    fn band_serializes_kebab_case() {
        let json = serde_json::to_string(&WordCountBand::VeryLong).unwrap();
        assert_eq!(json, "\"very-long\"");
    }

    #[test]
    fn tone_deserializes_from_wire_shape() {
        let tone: ToneSettings = serde_json::from_str(
            r#"{"formality": 4, "confidence": 2, "seniority": "professional", "length": "short"}"#,
        )
        .unwrap();
        assert_eq!(tone.seniority, Seniority::Professional);
        assert_eq!(tone.length, Length::Short);
    }

    #[test]
    fn all_text_joins_in_reading_order() {
        let draft = DraftOutput {
            subject: "S".into(),
            greeting: "G".into(),
            body_sections: vec!["B1".into(), "B2".into()],
            closing: "C".into(),
        };
        assert_eq!(draft.all_text(), "S G B1 B2 C");
    }
}
