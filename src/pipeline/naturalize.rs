//! Post-generation cleanup of body sections.
//!
//! Four passes, in order:
//! 1. repair known-awkward introduction sentences
//! 2. grammar and capitalization (pronoun `I`, proper nouns, spacing)
//! 3. redundancy: the first occurrence of a tracked concept in a section is
//!    swapped for a synonym when an earlier section already used it
//! 4. flow: merge a bare well-wish into a following self-introduction and
//!    insert transitions between sections that read as a sequence
//!
//! Every pass is total. Pass 4 depends on the text produced
//! by passes 1–3.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::pipeline::context::{COMPANIES, SCHOOLS};
use crate::pipeline::types::DraftOutput;

const WELL_WISH: &str = "I hope this message finds you well.";

/// Literal awkward sentences and what replaces them.
const AWKWARD_INTROS: &[&str] = &[
    "I'm a professional reaching out to connect with you.",
    "I'm a student reaching out to connect with you.",
];

static AWKWARD_INTRO_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^I am a (professional|student) reaching out to connect with you\.").unwrap()
});

static PRONOUN_I: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bi\b").unwrap());
static MULTI_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" {2,}").unwrap());
static MULTI_PERIOD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.{2,}").unwrap());
static NEXT_STEPS_FILLER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*Happy to collaborate on next steps\.").unwrap());

/// Lower-case proper nouns and their display form.
static PROPER_NOUNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    COMPANIES
        .iter()
        .chain(SCHOOLS.iter())
        .map(|n| {
            let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(n.key))).unwrap();
            (pattern, n.display)
        })
        .collect()
});

/// Concepts whose repetition across sections is replaced by a synonym.
static TRACKED_CONCEPTS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"reaching out").unwrap(), "writing"),
        (Regex::new(r"\bconnect\b").unwrap(), "get in touch"),
        (Regex::new(r"\bopportunities\b").unwrap(), "openings"),
    ]
});

/// Transition inserted when a section matching `current` precedes one
/// matching `next`.
struct Transition {
    current: &'static str,
    next: &'static str,
    prefix: &'static str,
}

const TRANSITIONS: &[Transition] = &[
    Transition {
        current: "discovered",
        next: "interested",
        prefix: "Given this connection, ",
    },
    Transition {
        current: "currently at",
        next: "interested",
        prefix: "As someone looking to advance my career, ",
    },
];

/// Run all four passes over the draft's body sections.
pub fn naturalize(mut draft: DraftOutput) -> DraftOutput {
    draft.body_sections = naturalize_sections(draft.body_sections);
    draft
}

pub fn naturalize_sections(sections: Vec<String>) -> Vec<String> {
    let sections = repair_introductions(sections);
    let sections = fix_grammar(sections);
    let sections = reduce_redundancy(sections);
    ensure_flow(sections)
}

// ── Pass 1 ──────────────────────────────────────────────────────────

fn repair_introductions(sections: Vec<String>) -> Vec<String> {
    sections
        .into_iter()
        .map(|section| {
            if let Some(awkward) = AWKWARD_INTROS.iter().find(|a| section.contains(*a)) {
                return section.replacen(awkward, WELL_WISH, 1);
            }
            AWKWARD_INTRO_PATTERN.replace(&section, WELL_WISH).into_owned()
        })
        .collect()
}

// ── Pass 2 ──────────────────────────────────────────────────────────

fn fix_grammar(sections: Vec<String>) -> Vec<String> {
    sections.into_iter().map(|s| fix_section_grammar(&s)).collect()
}

fn fix_section_grammar(section: &str) -> String {
    let mut improved = PRONOUN_I.replace_all(section, "I").into_owned();
    for (pattern, display) in PROPER_NOUNS.iter() {
        improved = pattern.replace_all(&improved, *display).into_owned();
    }

    if improved.contains("I'm very interested in") && improved.contains("and would love to") {
        improved = improved.replacen("and would love to", "and I would appreciate the opportunity to", 1);
    }

    improved = NEXT_STEPS_FILLER.replace_all(&improved, "").into_owned();
    improved = MULTI_SPACE.replace_all(&improved, " ").into_owned();
    improved = MULTI_PERIOD.replace_all(&improved, ".").into_owned();
    improved.trim().to_string()
}

// ── Pass 3 ──────────────────────────────────────────────────────────

fn reduce_redundancy(sections: Vec<String>) -> Vec<String> {
    let mut seen = vec![false; TRACKED_CONCEPTS.len()];
    sections
        .into_iter()
        .map(|section| {
            let mut processed = section.clone();
            for (idx, (pattern, synonym)) in TRACKED_CONCEPTS.iter().enumerate() {
                if !pattern.is_match(&section) {
                    continue;
                }
                if seen[idx] {
                    processed = pattern.replace(&processed, *synonym).into_owned();
                }
                seen[idx] = true;
            }
            processed
        })
        .collect()
}

// ── Pass 4 ──────────────────────────────────────────────────────────

fn ensure_flow(mut sections: Vec<String>) -> Vec<String> {
    if sections.len() < 2 {
        return sections;
    }

    if sections.len() > 2
        && sections[0].contains("I hope this message finds you well")
        && (sections[1].contains("I'm a") || sections[1].contains("I am a"))
    {
        let intro = sections.remove(1);
        sections[0] = format!("{} {}", sections[0], intro);
    }

    for i in 0..sections.len().saturating_sub(1) {
        let already_linked = TRANSITIONS
            .iter()
            .any(|t| sections[i + 1].starts_with(t.prefix));
        if already_linked {
            continue;
        }
        if let Some(t) = TRANSITIONS
            .iter()
            .find(|t| sections[i].contains(t.current) && sections[i + 1].contains(t.next))
        {
            sections[i + 1] = format!("{}{}", t.prefix, decapitalize(&sections[i + 1]));
        }
    }

    sections
}

/// Lower-case the first character unless it starts the pronoun `I`.
fn decapitalize(s: &str) -> String {
    let starts_with_pronoun = s == "I"
        || s.starts_with("I ")
        || s.starts_with("I'");
    if starts_with_pronoun {
        return s.to_string();
    }
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ── Quality report ──────────────────────────────────────────────────

/// Advisory feedback on a finished draft. Used for debug logging only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub improvements: Vec<String>,
}

/// Words longer than this that occur more than [`OVERUSE_THRESHOLD`] times
/// are reported as overused.
const OVERUSE_MIN_LEN: usize = 4;
const OVERUSE_THRESHOLD: usize = 3;

pub fn validate_email_quality(draft: &DraftOutput) -> QualityReport {
    let mut issues = Vec::new();
    let mut improvements = Vec::new();
    let all_text = draft.all_text();

    if all_text.contains("reaching out to connect with you") {
        issues.push("Awkward introduction phrase".to_string());
        improvements.push(format!("Use more natural opening like '{WELL_WISH}'"));
    }

    if all_text.contains("I am a professional") || all_text.contains("I'm a professional") {
        issues.push("Vague professional reference".to_string());
        improvements.push("Be more specific about role/background".to_string());
    }

    let lowered = all_text.to_lowercase();
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for word in lowered.split_whitespace() {
        match counts.iter_mut().find(|(w, _)| *w == word) {
            Some((_, n)) => *n += 1,
            None => counts.push((word, 1)),
        }
    }
    let overused: Vec<&str> = counts
        .iter()
        .filter(|(w, n)| *n > OVERUSE_THRESHOLD && w.chars().count() > OVERUSE_MIN_LEN)
        .map(|(w, _)| *w)
        .collect();
    if !overused.is_empty() {
        issues.push(format!("Overused words: {}", overused.join(", ")));
        improvements.push("Vary vocabulary to avoid repetition".to_string());
    }

    match draft.body_sections.len() {
        0 => issues.push("No body content".to_string()),
        1 => improvements.push("Consider adding more context or details".to_string()),
        _ => {}
    }

    QualityReport {
        is_valid: issues.is_empty(),
        issues,
        improvements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sections(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_awkward_intro_repaired() {
        let out = naturalize_sections(sections(&[
            "I'm a student reaching out to connect with you. Hi.",
            "Would you be open to a call?",
        ]));
        assert_eq!(out[0], "I hope this message finds you well. Hi.");
    }

    #[test]
    fn test_awkward_intro_pattern_repaired() {
        let out = naturalize_sections(sections(&[
            "I am a professional reaching out to connect with you. More.",
        ]));
        assert_eq!(out[0], "I hope this message finds you well. More.");
    }

    #[test]
    fn test_grammar_fixes() {
        let out = naturalize_sections(sections(&[
            "i think i'd like  to work at google..  and meet at mit.",
        ]));
        assert_eq!(out[0], "I think I'd like to work at Google. and meet at MIT.");
    }

    #[test]
    fn test_proper_nouns_need_word_boundaries() {
        let out = naturalize_sections(sections(&["please submit the metadata"]));
        assert_eq!(out[0], "please submit the metadata");
    }

    #[test]
    fn test_filler_removed() {
        let out = naturalize_sections(sections(&["Sounds good. Happy to collaborate on next steps."]));
        assert_eq!(out[0], "Sounds good.");
    }

    #[test]
    fn test_redundancy_uses_synonyms() {
        let out = naturalize_sections(sections(&[
            "I am reaching out to connect about opportunities.",
            "I am reaching out again to connect about opportunities.",
        ]));
        assert_eq!(out[0], "I am reaching out to connect about opportunities.");
        assert_eq!(out[1], "I am writing again to get in touch about openings.");
    }

    #[test]
    fn test_redundancy_swaps_first_repeat_only() {
        let out = naturalize_sections(sections(&[
            "Hoping to connect.",
            "We could connect soon and connect again later.",
        ]));
        assert_eq!(out[1], "We could get in touch soon and connect again later.");
    }

    #[test]
    fn test_connect_is_tracked_as_word() {
        let out = naturalize_sections(sections(&["Let's connect.", "That was a connection."]));
        assert_eq!(out[1], "That was a connection.");
    }

    #[test]
    fn test_merge_well_wish_with_intro() {
        let out = naturalize_sections(sections(&[
            "I hope this message finds you well.",
            "I'm a student at Rutgers.",
            "Would you be open to a call?",
        ]));
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], "I hope this message finds you well. I'm a student at Rutgers.");
    }

    #[test]
    fn test_no_merge_with_two_sections() {
        let out = naturalize_sections(sections(&[
            "I hope this message finds you well.",
            "I'm a student at Rutgers.",
        ]));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn test_transition_inserted() {
        let out = naturalize_sections(sections(&[
            "I just discovered that you work at Google.",
            "I am very interested in contributing to Google.",
            "Would you be open to a call?",
        ]));
        assert_eq!(
            out[1],
            "Given this connection, I am very interested in contributing to Google."
        );
    }

    #[test]
    fn test_transition_decapitalizes() {
        let out = naturalize_sections(sections(&[
            "I'm a student currently at Stanford.",
            "Being interested in research, I wrote this.",
        ]));
        assert_eq!(
            out[1],
            "As someone looking to advance my career, being interested in research, I wrote this."
        );
    }

    #[test]
    fn test_naturalize_is_idempotent() {
        let input = sections(&[
            "I hope this message finds you well.",
            "I am a student. I just discovered that you work at google.",
            "I'm interested in opportunities to connect..",
            "Could we connect about opportunities?",
        ]);
        let once = naturalize_sections(input);
        let twice = naturalize_sections(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_quality_report_flags_issues() {
        let draft = DraftOutput {
            subject: "Hello".into(),
            greeting: "Hi,".into(),
            body_sections: vec![
                "I'm a professional reaching out to connect with you.".into(),
            ],
            closing: "Thanks".into(),
        };
        let report = validate_email_quality(&draft);
        assert!(!report.is_valid);
        assert!(report.issues.contains(&"Awkward introduction phrase".to_string()));
        assert!(report.issues.contains(&"Vague professional reference".to_string()));
        assert!(report.improvements.contains(&"Consider adding more context or details".to_string()));
    }

    #[test]
    fn test_quality_report_overused_words() {
        let draft = DraftOutput {
            subject: "S".into(),
            greeting: "G".into(),
            body_sections: vec!["research research research research".into(), "ok".into()],
            closing: "C".into(),
        };
        let report = validate_email_quality(&draft);
        assert_eq!(report.issues, vec!["Overused words: research".to_string()]);
    }

    #[test]
    fn test_quality_report_empty_body() {
        let report = validate_email_quality(&DraftOutput::default());
        assert!(report.issues.contains(&"No body content".to_string()));
    }
}
