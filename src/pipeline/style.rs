//! Tone-driven style passes.
//!
//! Applied in a fixed order, each on the output of the previous one:
//! formality → warmth → confidence → seniority → length. Formality,
//! confidence and length touch every text field; warmth and seniority only
//! the body.

use std::sync::{Arc, LazyLock};

use regex::{Captures, Regex};

use crate::config::{DraftResources, StyleLexicons};
use crate::pipeline::types::{DraftOutput, Length, Seniority, ToneSettings};

/// Named contractions, expanded before the generic suffix rule.
static NAMED_CONTRACTIONS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        ("can't", "cannot"),
        ("won't", "will not"),
        ("doesn't", "does not"),
        ("don't", "do not"),
        ("isn't", "is not"),
        ("aren't", "are not"),
        ("wasn't", "was not"),
        ("weren't", "were not"),
        ("hasn't", "has not"),
        ("haven't", "have not"),
        ("hadn't", "had not"),
    ]
    .into_iter()
    .map(|(c, e)| (Regex::new(&format!(r"(?i)\b{c}\b")).unwrap(), e))
    .collect()
});

static GENERIC_CONTRACTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w+)'(ll|ve|re|d|s|m)\b").unwrap());

/// Fixed substitutions for high confidence, after hedges are stripped.
static ASSERTIVE_REWRITES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"(?i)\bI was wondering if\b").unwrap(), "I recommend"),
        (Regex::new(r"(?i)\bI think\b").unwrap(), "I am confident"),
        (Regex::new(r"(?i)\bmaybe\b").unwrap(), "I suggest"),
    ]
});

static HORIZONTAL_WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]{2,}").unwrap());
static SPACE_BEFORE_NEWLINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[ \t]+\n").unwrap());

static SHORT_REWRITES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (
            Regex::new(r"(?i)\b(very|quite|really|extremely|incredibly|absolutely)\s+").unwrap(),
            "",
        ),
        (
            Regex::new(r"(?i)\b(beautiful|wonderful|amazing|fantastic|excellent|outstanding)\b")
                .unwrap(),
            "good",
        ),
        (
            Regex::new(r"(?i)\bI would really appreciate it if you could\b").unwrap(),
            "please",
        ),
        (Regex::new(r"(?i)\bI would appreciate it if you could\b").unwrap(), "please"),
        (Regex::new(r"(?i)\bit would be great if we could\b").unwrap(), "please we could"),
        (Regex::new(r"(?i)\bin order to\b").unwrap(), "to"),
        (Regex::new(r"(?i)\bdue to the fact that\b").unwrap(), "because"),
    ]
});

static LONG_REWRITES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"(?i)\bgood\b").unwrap(), "excellent and valuable"),
        (Regex::new(r"(?i)\bhelp\b").unwrap(), "valuable assistance and guidance"),
        (Regex::new(r"(?i)\bthanks?\b").unwrap(), "sincere appreciation and gratitude"),
        (Regex::new(r"(?i)\bplease\b").unwrap(), "I would be most grateful if you could"),
        (Regex::new(r"(?i)\bI think\b").unwrap(), "I genuinely believe and feel confident"),
    ]
});

/// Low-confidence hedges for assertive phrases that don't take the default.
const PHRASE_HEDGES: &[(&str, &str)] = &[("I propose", "might")];

const STUDENT_VOCABULARY: &[&str] = &["learn", "guidance", "experience"];
const PROFESSIONAL_VOCABULARY: &[&str] = &["collaborate", "align", "working together"];

/// Applies the five style passes using the configured lexicons.
pub struct StyleTransformer {
    resources: Arc<DraftResources>,
}

impl StyleTransformer {
    pub fn new(resources: Arc<DraftResources>) -> Self {
        Self { resources }
    }

    /// Produce a styled copy of `draft`.
    pub fn apply(&self, draft: &DraftOutput, tone: &ToneSettings) -> DraftOutput {
        let lex = &self.resources.style;
        let mut out = draft.clone();

        map_fields(&mut out, |t| apply_formality(t, tone.formality, lex));
        out.body_sections = apply_warmth(out.body_sections, tone, lex);
        map_fields(&mut out, |t| apply_confidence(t, tone.confidence, lex));
        out.body_sections = apply_seniority(out.body_sections, tone.seniority, lex);
        map_fields(&mut out, |t| apply_length(t, tone.length));

        out
    }
}

fn map_fields(draft: &mut DraftOutput, f: impl Fn(&str) -> String) {
    draft.subject = f(&draft.subject);
    draft.greeting = f(&draft.greeting);
    for section in draft.body_sections.iter_mut() {
        *section = f(section);
    }
    draft.closing = f(&draft.closing);
}

fn replace_each(text: &str, rules: &[(Regex, &str)]) -> String {
    rules.iter().fold(text.to_string(), |acc, (pattern, replacement)| {
        pattern.replace_all(&acc, *replacement).into_owned()
    })
}

// ── Passes ──────────────────────────────────────────────────────────

/// Formality ≥4: casual→formal lexicon, then named contractions, then the
/// generic `'ll/'ve/'re/'d/'s/'m` expansion. Lower levels pass through.
pub fn apply_formality(text: &str, formality: u8, lex: &StyleLexicons) -> String {
    if formality < 4 {
        return text.to_string();
    }

    let mut result = text.to_string();
    for rule in &lex.casual_to_formal {
        result = rule
            .pattern
            .replace_all(&result, rule.replacement.as_str())
            .into_owned();
    }
    result = replace_each(&result, &NAMED_CONTRACTIONS);
    GENERIC_CONTRACTION
        .replace_all(&result, |caps: &Captures<'_>| {
            let expansion = match &caps[2] {
                "ll" => "will",
                "ve" => "have",
                "re" => "are",
                "d" => "would",
                "s" => "is",
                _ => "am",
            };
            format!("{} {}", &caps[1], expansion)
        })
        .into_owned()
}

/// Warmth is intentionally inert.
///
/// The pass was keyed on formality instead of a warmth setting and never
/// inserted anything; the niceties lexicon is loaded but unused until the
/// tone model grows a warmth axis.
pub fn apply_warmth(sections: Vec<String>, _tone: &ToneSettings, _lex: &StyleLexicons) -> Vec<String> {
    sections
}

/// Confidence ≤2 swaps assertive phrases for hedges (the first hedge unless
/// the phrase has its own entry); ≥4 strips hedges, applies assertive
/// rewrites and squeezes the leftover spaces.
pub fn apply_confidence(text: &str, confidence: u8, lex: &StyleLexicons) -> String {
    match confidence {
        0..=2 => {
            let Some(default_hedge) = lex.hedges.first() else {
                return text.to_string();
            };
            lex.assertive
                .iter()
                .zip(&lex.assertive_patterns)
                .fold(text.to_string(), |acc, (phrase, pattern)| {
                    let hedge = hedge_for(phrase).unwrap_or(default_hedge.as_str());
                    pattern.replace_all(&acc, hedge).into_owned()
                })
        }
        3 => text.to_string(),
        _ => {
            let stripped = lex
                .hedge_patterns
                .iter()
                .fold(text.to_string(), |acc, pattern| {
                    pattern.replace_all(&acc, "").into_owned()
                });
            let rewritten = replace_each(&stripped, &ASSERTIVE_REWRITES);
            let squeezed = HORIZONTAL_WS.replace_all(&rewritten, " ");
            SPACE_BEFORE_NEWLINE
                .replace_all(&squeezed, "\n")
                .trim()
                .to_string()
        }
    }
}

fn hedge_for(phrase: &str) -> Option<&'static str> {
    PHRASE_HEDGES
        .iter()
        .find(|(assertive, _)| assertive.eq_ignore_ascii_case(phrase))
        .map(|(_, hedge)| *hedge)
}

/// Append the seniority phrase to the last body section, once.
pub fn apply_seniority(
    mut sections: Vec<String>,
    seniority: Seniority,
    lex: &StyleLexicons,
) -> Vec<String> {
    let (additions, vocabulary) = match seniority {
        Seniority::Student => (&lex.student_additions, STUDENT_VOCABULARY),
        Seniority::Professional => (&lex.professional_additions, PROFESSIONAL_VOCABULARY),
    };
    let Some(addition) = additions.first() else {
        return sections;
    };
    if let Some(last) = sections.last_mut()
        && !vocabulary.iter().any(|w| last.contains(w))
    {
        last.push(' ');
        last.push_str(addition);
    }
    sections
}

/// Short compresses intensifiers and wordy phrases; long elaborates.
pub fn apply_length(text: &str, length: Length) -> String {
    match length {
        Length::Short => replace_each(text, &SHORT_REWRITES),
        Length::Medium => text.to_string(),
        Length::Long => replace_each(text, &LONG_REWRITES),
    }
}
