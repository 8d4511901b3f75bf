//! LLM refinement with validate-or-fallback.
//!
//! Stages: `baseline_only → generating → parsing → re_validating →
//! {accepted | fallback}`. The baseline checks and metrics are computed
//! first and are the payload of every fallback. Nothing here returns an
//! error: provider failures, malformed responses and candidates that trip
//! the severity gate all end in [`Stage::Fallback`].

use std::sync::{Arc, LazyLock};
use std::time::Instant;

use regex::Regex;
use tracing::{debug, error, info, warn};

use crate::config::DraftResources;
use crate::llm::provider::{ChatMessage, CompletionRequest, LlmProvider};
use crate::pipeline::checks::QualityChecker;
use crate::pipeline::eval::Evaluator;
use crate::pipeline::types::{
    COMPLETENESS_PREFIX, CheckResult, DraftOutput, ETHICAL_PREFIX, EmailCategory, EvalMetrics,
    PROFESSIONALISM_PREFIX, RefineResult, ToneSettings,
};
use crate::safety;

const REFINE_TEMPERATURE: f32 = 0.7;
const REFINE_MAX_TOKENS: u32 = 1000;

/// Candidate warnings echoed back when the severity gate trips.
const MAX_GATE_WARNINGS: usize = 3;
/// Candidates scoring below this are rejected.
const MIN_OVERALL_SCORE: u32 = 30;

pub const LLM_FAILED: &str = "LLM service unavailable or failed";
pub const RESPONSE_FORMAT_INVALID: &str = "Failed to parse LLM response format";
pub const EMAIL_STRUCTURE_INVALID: &str = "Failed to parse refined email structure";
pub const QUALITY_GATE_FAILED: &str = "Refined draft failed quality checks";

const SUBJECT_PREFIX: &str = "Subject:";

static EMAIL_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"===EMAIL===\s*([\s\S]*?)\s*===EVAL===").unwrap());
static EVAL_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"===EVAL===\s*([\s\S]*?)$").unwrap());

const FORMALITY_LEVELS: [&str; 5] = ["very casual", "casual", "neutral", "formal", "very formal"];
const CONFIDENCE_LEVELS: [&str; 5] = [
    "hesitant",
    "uncertain",
    "moderate",
    "confident",
    "very confident",
];

const SYSTEM_PROMPT: &str = "You are an expert email writing assistant. Your task is to refine and improve email drafts while maintaining their core structure and intent.

CRITICAL REQUIREMENTS:
1. Always preserve the email structure: subject, greeting, body content, and closing
2. Maintain the original tone and category intent
3. Improve clarity, professionalism, and impact
4. Keep the email concise but comprehensive
5. Ensure proper business email etiquette

RESPONSE FORMAT:
Your response must contain exactly two sections separated by these markers:

===EMAIL===
[Put the refined email here with this exact structure:]
Subject: [subject line]

[greeting]

[body paragraph 1]

[body paragraph 2]

[additional body paragraphs as needed]

[closing]

===EVAL===
[Provide a brief evaluation of the changes made, explaining how the email was improved]

IMPORTANT:
- Never omit the subject, greeting, or closing
- Maintain the professional tone appropriate for business communication
- Ensure all sections are present and properly formatted";

/// Orchestrator state, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    BaselineOnly,
    Generating,
    Parsing,
    ReValidating,
    Accepted,
    Fallback,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BaselineOnly => "baseline_only",
            Self::Generating => "generating",
            Self::Parsing => "parsing",
            Self::ReValidating => "re_validating",
            Self::Accepted => "accepted",
            Self::Fallback => "fallback",
        }
    }
}

// ── Severity gate ───────────────────────────────────────────────────

/// What the severity gate looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateInputs {
    pub completeness_warnings: usize,
    pub professionalism_warnings: usize,
    pub ethical_warnings: usize,
    pub overall_score: u32,
}

impl GateInputs {
    pub fn from_results(checks: &CheckResult, metrics: &EvalMetrics) -> Self {
        Self {
            completeness_warnings: checks.count_with_prefix(COMPLETENESS_PREFIX),
            professionalism_warnings: checks.count_with_prefix(PROFESSIONALISM_PREFIX),
            ethical_warnings: checks.count_with_prefix(ETHICAL_PREFIX),
            overall_score: metrics.overall_score,
        }
    }
}

/// One row of the severity gate. Any tripped row rejects the candidate.
pub struct GateRule {
    pub name: &'static str,
    pub trips: fn(&GateInputs) -> bool,
}

pub const SEVERITY_GATE: &[GateRule] = &[
    GateRule {
        name: "multiple_completeness_gaps",
        trips: |g| g.completeness_warnings > 1,
    },
    GateRule {
        name: "unprofessional",
        trips: |g| g.professionalism_warnings > 0,
    },
    GateRule {
        name: "ethical_violation",
        trips: |g| g.ethical_warnings > 0,
    },
    GateRule {
        name: "low_overall_score",
        trips: |g| g.overall_score < MIN_OVERALL_SCORE,
    },
];

/// Names of the gate rows tripped by `inputs`, in table order.
pub fn tripped_gates(inputs: &GateInputs) -> Vec<&'static str> {
    SEVERITY_GATE
        .iter()
        .filter(|rule| (rule.trips)(inputs))
        .map(|rule| rule.name)
        .collect()
}

// ── Prompts and parsing ─────────────────────────────────────────────

fn level(table: &[&'static str; 5], value: u8) -> &'static str {
    let idx = usize::from(value.clamp(1, 5)) - 1;
    table[idx]
}

pub fn system_prompt() -> &'static str {
    SYSTEM_PROMPT
}

pub fn user_prompt(draft: &DraftOutput, tone: &ToneSettings, category: EmailCategory) -> String {
    let formality = level(&FORMALITY_LEVELS, tone.formality);
    let confidence = level(&CONFIDENCE_LEVELS, tone.confidence);
    let seniority = tone.seniority.as_str();
    let length = tone.length.as_str();

    format!(
        "Please refine this {category} email to be {formality} in tone, {confidence} in confidence, appropriate for a {seniority} level professional, and {length} in length.

Current email:
{email}

Focus on:
- Improving clarity and impact
- Ensuring appropriate {formality} tone
- Maintaining {confidence} confidence level
- Keeping it {length} in length
- Preserving all essential email components (subject, greeting, body, closing)",
        email = draft.render(),
    )
}

/// The two marked blocks of a model response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResponse {
    pub email: String,
    pub evaluation: String,
}

/// Split a response on the `===EMAIL===` / `===EVAL===` markers.
pub fn parse_response(text: &str) -> Option<ParsedResponse> {
    let email = EMAIL_BLOCK.captures(text)?;
    let evaluation = EVAL_BLOCK.captures(text)?;
    Some(ParsedResponse {
        email: email[1].trim().to_string(),
        evaluation: evaluation[1].trim().to_string(),
    })
}

/// Parse the email block into a draft.
///
/// Blank lines are dropped and every `Subject:` line is removed; of what
/// remains the first line is the greeting, the last the closing, and the
/// lines between are body sections.
pub fn parse_email_text(email: &str) -> Option<DraftOutput> {
    let lines: Vec<&str> = email
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.len() < 3 {
        warn!(line_count = lines.len(), "Parsed email has insufficient lines");
        return None;
    }

    let Some(subject) = lines
        .iter()
        .find_map(|l| l.strip_prefix(SUBJECT_PREFIX))
        .map(str::trim)
    else {
        warn!("Missing subject line in parsed email");
        return None;
    };

    let content: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|l| !l.starts_with(SUBJECT_PREFIX))
        .collect();
    let (Some(greeting), Some(closing)) = (content.first(), content.last()) else {
        warn!("Insufficient content after subject extraction");
        return None;
    };
    if content.len() < 3 {
        warn!(line_count = content.len(), "No body content found in parsed email");
        return None;
    }

    Some(DraftOutput {
        subject: subject.to_string(),
        greeting: greeting.to_string(),
        body_sections: content[1..content.len() - 1]
            .iter()
            .map(|l| l.to_string())
            .collect(),
        closing: closing.to_string(),
    })
}

// ── Orchestrator ────────────────────────────────────────────────────

/// Wraps the generation client with parsing, re-validation and fallback.
pub struct RefinementOrchestrator {
    llm: Arc<dyn LlmProvider>,
    checker: QualityChecker,
    evaluator: Evaluator,
}

impl RefinementOrchestrator {
    pub fn new(llm: Arc<dyn LlmProvider>, resources: Arc<DraftResources>) -> Self {
        Self {
            llm,
            checker: QualityChecker::new(Arc::clone(&resources)),
            evaluator: Evaluator::new(resources),
        }
    }

    /// Try to improve `draft`. Never fails; see the module docs.
    pub async fn refine(
        &self,
        draft: &DraftOutput,
        tone: &ToneSettings,
        category: EmailCategory,
    ) -> RefineResult {
        let started = Instant::now();
        let elapsed_ms = || started.elapsed().as_millis() as u64;

        let baseline_checks = self.checker.run(draft);
        let baseline_eval = self.evaluator.evaluate(draft);
        info!(
            stage = Stage::BaselineOnly.as_str(),
            category = %category,
            model = self.llm.model_name(),
            baseline_score = baseline_eval.overall_score,
            "Starting LLM refinement"
        );

        let fallback = |reasons: Vec<String>| {
            warn!(
                stage = Stage::Fallback.as_str(),
                reasons = ?reasons,
                elapsed_ms = elapsed_ms(),
                "Using baseline draft"
            );
            RefineResult {
                draft: draft.clone(),
                checks: baseline_checks.clone(),
                eval_metrics: baseline_eval.clone(),
                was_refined: false,
                used_fallback: true,
                refine_warnings: reasons,
            }
        };

        debug!(stage = Stage::Generating.as_str(), "Requesting refinement");
        let request = CompletionRequest::new(vec![
            ChatMessage::system(system_prompt()),
            ChatMessage::user(user_prompt(draft, tone, category)),
        ])
        .with_temperature(REFINE_TEMPERATURE)
        .with_max_tokens(REFINE_MAX_TOKENS);

        let response = match self.llm.complete(request).await {
            Ok(response) => response,
            Err(e) => {
                error!(
                    error = %safety::redact(&e.to_string()),
                    elapsed_ms = elapsed_ms(),
                    "LLM refinement failed"
                );
                return fallback(vec![LLM_FAILED.to_string()]);
            }
        };

        debug!(
            stage = Stage::Parsing.as_str(),
            response_len = response.content.len(),
            output_tokens = response.output_tokens,
            elapsed_ms = elapsed_ms(),
            "LLM response received"
        );
        let Some(parsed) = parse_response(&response.content) else {
            warn!("LLM response is missing the EMAIL or EVAL section");
            return fallback(vec![RESPONSE_FORMAT_INVALID.to_string()]);
        };
        let Some(candidate) = parse_email_text(&parsed.email) else {
            return fallback(vec![EMAIL_STRUCTURE_INVALID.to_string()]);
        };

        debug!(
            stage = Stage::ReValidating.as_str(),
            sections = candidate.body_sections.len(),
            "Re-validating candidate"
        );
        let checks = self.checker.run(&candidate);
        let metrics = self.evaluator.evaluate(&candidate);
        let gate = GateInputs::from_results(&checks, &metrics);
        let tripped = tripped_gates(&gate);
        if !tripped.is_empty() {
            warn!(
                tripped = ?tripped,
                completeness = gate.completeness_warnings,
                professionalism = gate.professionalism_warnings,
                ethical = gate.ethical_warnings,
                overall_score = gate.overall_score,
                "High severity issues in refined draft"
            );
            let mut reasons = vec![QUALITY_GATE_FAILED.to_string()];
            reasons.extend(checks.warnings.iter().take(MAX_GATE_WARNINGS).cloned());
            return fallback(reasons);
        }

        info!(
            stage = Stage::Accepted.as_str(),
            category = %category,
            score_change = i64::from(metrics.overall_score) - i64::from(baseline_eval.overall_score),
            elapsed_ms = elapsed_ms(),
            "LLM refinement completed"
        );
        RefineResult {
            draft: candidate,
            checks,
            eval_metrics: metrics,
            was_refined: true,
            used_fallback: false,
            refine_warnings: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::llm::MockProvider;
    use crate::pipeline::checks::OVERPROMISE_DETECTED;
    use crate::pipeline::types::{Length, Seniority};

    fn baseline() -> DraftOutput {
        DraftOutput {
            subject: "Original Subject".into(),
            greeting: "Dear Recipient,".into(),
            body_sections: vec![
                "This is the first paragraph of the original email.".into(),
                "Could we meet next week?".into(),
            ],
            closing: "Best regards,\nSender Name".into(),
        }
    }

    fn tone() -> ToneSettings {
        ToneSettings {
            formality: 3,
            confidence: 3,
            seniority: Seniority::Professional,
            length: Length::Medium,
        }
    }

    fn orchestrator(provider: MockProvider) -> RefinementOrchestrator {
        RefinementOrchestrator::new(
            Arc::new(provider),
            Arc::new(DraftResources::builtin().unwrap()),
        )
    }

    fn assert_fallback(result: &RefineResult) {
        assert!(result.used_fallback);
        assert!(!result.was_refined);
        assert_eq!(result.draft, baseline());
    }

    const GOOD_RESPONSE: &str = "===EMAIL===
Subject: Refined Subject Line

Dear Professional Contact,

This is the refined first paragraph with improved clarity and impact.

Would you be open to a short call next week?

Best regards,
Professional Sender

===EVAL===
Clearer purpose and a direct call to action.";

    #[tokio::test]
    async fn test_accepts_well_formed_candidate() {
        let result = orchestrator(MockProvider::always(GOOD_RESPONSE))
            .refine(&baseline(), &tone(), EmailCategory::Networking)
            .await;

        assert!(result.was_refined);
        assert!(!result.used_fallback);
        assert!(result.refine_warnings.is_empty());
        assert_eq!(result.draft.subject, "Refined Subject Line");
        assert_eq!(result.draft.greeting, "Dear Professional Contact,");
        assert_eq!(result.draft.closing, "Professional Sender");
        assert_eq!(
            result.draft.body_sections,
            vec![
                "This is the refined first paragraph with improved clarity and impact.",
                "Would you be open to a short call next week?",
                "Best regards,",
            ]
        );
    }

    #[tokio::test]
    async fn test_default_mock_response_is_accepted() {
        let result = orchestrator(MockProvider::new())
            .refine(&baseline(), &tone(), EmailCategory::Networking)
            .await;
        assert!(result.was_refined);
        assert_eq!(result.draft.greeting, "Dear [Recipient Name],");
    }

    #[tokio::test]
    async fn test_provider_failure_falls_back() {
        let result = orchestrator(MockProvider::failing("connection refused"))
            .refine(&baseline(), &tone(), EmailCategory::Networking)
            .await;
        assert_fallback(&result);
        assert_eq!(result.refine_warnings, vec![LLM_FAILED.to_string()]);
    }

    #[tokio::test]
    async fn test_missing_markers_fall_back() {
        for response in [
            "===EVAL===\nNo email section here.",
            "===EMAIL===\nSubject: x\n\nHi,\n\nBody.\n\nThanks",
            "plain text with no markers",
        ] {
            let result = orchestrator(MockProvider::always(response))
                .refine(&baseline(), &tone(), EmailCategory::Other)
                .await;
            assert_fallback(&result);
            assert_eq!(result.refine_warnings, vec![RESPONSE_FORMAT_INVALID.to_string()]);
        }
    }

    #[tokio::test]
    async fn test_bad_structure_falls_back() {
        for email in [
            // Too few lines.
            "Subject: Hi\n\nHello,",
            // No subject line.
            "Hello,\n\nBody text here.\n\nThanks,\nMe",
            // Nothing between greeting and closing.
            "Subject: Hi\n\nHello,\n\nThanks",
        ] {
            let response = format!("===EMAIL===\n{email}\n===EVAL===\nDone.");
            let result = orchestrator(MockProvider::always(response))
                .refine(&baseline(), &tone(), EmailCategory::Other)
                .await;
            assert_fallback(&result);
            assert_eq!(result.refine_warnings, vec![EMAIL_STRUCTURE_INVALID.to_string()]);
        }
    }

    #[tokio::test]
    async fn test_overpromise_trips_severity_gate() {
        let response = "===EMAIL===
Subject: Hiring

Dear Hiring Manager,

I guarantee you'll get the job done right if you hire me.

Would you be open to a call next week?

Best regards,
Candidate

===EVAL===
More confident.";
        let result = orchestrator(MockProvider::always(response))
            .refine(&baseline(), &tone(), EmailCategory::Networking)
            .await;

        assert_fallback(&result);
        assert_eq!(result.refine_warnings[0], QUALITY_GATE_FAILED);
        assert!(result.refine_warnings.contains(&OVERPROMISE_DETECTED.to_string()));
        assert!(result.refine_warnings.len() <= 1 + MAX_GATE_WARNINGS);
    }

    #[tokio::test]
    async fn test_refine_result_invariant_holds() {
        let provider = MockProvider::new();
        provider.set_failure("Original Subject", "boom");
        let o = orchestrator(provider);

        let failed = o.refine(&baseline(), &tone(), EmailCategory::Other).await;
        let mut other = baseline();
        other.subject = "Another".into();
        let accepted = o.refine(&other, &tone(), EmailCategory::Other).await;

        for result in [failed, accepted] {
            assert_eq!(result.was_refined, !result.used_fallback);
        }
    }

    #[test]
    fn test_gate_table() {
        let clean = GateInputs {
            completeness_warnings: 1,
            professionalism_warnings: 0,
            ethical_warnings: 0,
            overall_score: 30,
        };
        assert!(tripped_gates(&clean).is_empty());

        let bad = GateInputs {
            completeness_warnings: 2,
            professionalism_warnings: 1,
            ethical_warnings: 1,
            overall_score: 29,
        };
        assert_eq!(
            tripped_gates(&bad),
            vec![
                "multiple_completeness_gaps",
                "unprofessional",
                "ethical_violation",
                "low_overall_score"
            ]
        );
    }

    #[test]
    fn test_user_prompt_maps_tone_levels() {
        let tone = ToneSettings {
            formality: 5,
            confidence: 1,
            seniority: Seniority::Student,
            length: Length::Short,
        };
        let prompt = user_prompt(&baseline(), &tone, EmailCategory::Thankyou);
        assert!(prompt.starts_with(
            "Please refine this thankyou email to be very formal in tone, hesitant in confidence, appropriate for a student level professional, and short in length."
        ));
        assert!(prompt.contains("Subject: Original Subject"));
        assert!(prompt.contains("Best regards,\nSender Name"));
    }

    #[test]
    fn test_parse_email_drops_every_subject_line() {
        let draft = parse_email_text("Subject: A\nHi,\nSubject: B\nBody.\nThanks").unwrap();
        assert_eq!(draft.subject, "A");
        assert_eq!(draft.body_sections, vec!["Body."]);
    }

    #[test]
    fn test_parse_response_trims_blocks() {
        let parsed = parse_response("noise ===EMAIL===\n  body  \n===EVAL===\n  fine  \n").unwrap();
        assert_eq!(parsed.email, "body");
        assert_eq!(parsed.evaluation, "fine");
    }
}
