//! Draft processor: runs one request through the deterministic pipeline.
//!
//! Flow (generate strategy):
//! 1. Categorizer → category, confidence, matched phrases
//! 2. ContentGenerator → raw draft
//! 3. Naturalizer → cleaned body
//! 4. StyleTransformer → styled draft
//! 5. QualityChecker → warnings and gating booleans
//!
//! The template strategy swaps steps 2–3 for template filling.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::DraftResources;
use crate::error::ConfigError;
use crate::pipeline::checks::QualityChecker;
use crate::pipeline::generator::ContentGenerator;
use crate::pipeline::naturalize::{naturalize, validate_email_quality};
use crate::pipeline::rules::Categorizer;
use crate::pipeline::style::StyleTransformer;
use crate::pipeline::types::{CheckResult, DraftInput, DraftOutput, EmailCategory};
use crate::safety;

/// Characters of input text included in log lines.
const INPUT_PREVIEW_CHARS: usize = 60;

/// How the raw draft is produced before styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftStrategy {
    /// Context extraction plus rule-based generation.
    #[default]
    Generate,
    /// Category templates with placeholder filling and caller overrides.
    Template,
}

impl DraftStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Generate => "generate",
            Self::Template => "template",
        }
    }
}

impl fmt::Display for DraftStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DraftStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "generate" => Ok(Self::Generate),
            "template" => Ok(Self::Template),
            other => Err(ConfigError::InvalidValue {
                key: "DRAFT_STRATEGY".into(),
                message: format!("expected \"generate\" or \"template\", got \"{other}\""),
            }),
        }
    }
}

/// Classification details returned alongside a draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftMeta {
    pub category: EmailCategory,
    pub confidence: f64,
    pub matched_rules: Vec<String>,
}

/// Result of [`DraftProcessor::process`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessOutcome {
    pub draft: DraftOutput,
    pub checks: CheckResult,
    pub meta: DraftMeta,
}

/// Runs the deterministic drafting pipeline.
///
/// Holds no per-request state; one instance is shared across requests.
pub struct DraftProcessor {
    resources: Arc<DraftResources>,
    strategy: DraftStrategy,
    categorizer: Categorizer,
    generator: ContentGenerator,
    style: StyleTransformer,
    checker: QualityChecker,
}

impl DraftProcessor {
    pub fn new(resources: Arc<DraftResources>, strategy: DraftStrategy) -> Self {
        Self {
            categorizer: Categorizer::default_rules(),
            generator: ContentGenerator::new(),
            style: StyleTransformer::new(Arc::clone(&resources)),
            checker: QualityChecker::new(Arc::clone(&resources)),
            resources,
            strategy,
        }
    }

    pub fn strategy(&self) -> DraftStrategy {
        self.strategy
    }

    /// Draft, style and check one request. Total over validated input.
    pub fn process(&self, input: &DraftInput) -> ProcessOutcome {
        let categorization = self.categorizer.categorize(&input.text);
        let category = categorization.category;

        info!(
            strategy = %self.strategy,
            category = %category,
            confidence = categorization.confidence,
            input = %safety::preview(&input.text, INPUT_PREVIEW_CHARS),
            "Processing draft request"
        );

        let raw = match self.strategy {
            DraftStrategy::Generate => {
                let generated = self.generator.generate(&input.text, category, &input.tone);
                let cleaned = naturalize(generated);
                let report = validate_email_quality(&cleaned);
                if !report.is_valid {
                    debug!(
                        issues = ?report.issues,
                        improvements = ?report.improvements,
                        "Naturalized draft has advisory issues"
                    );
                }
                cleaned
            }
            DraftStrategy::Template => self.resources.templates.render(
                &input.text,
                category,
                input.overrides.as_ref(),
            ),
        };

        let draft = self.style.apply(&raw, &input.tone);
        let checks = self.checker.run(&draft);

        debug!(
            sections = draft.body_sections.len(),
            warnings = ?checks.warnings,
            "Draft checked"
        );

        ProcessOutcome {
            draft,
            checks,
            meta: DraftMeta {
                category,
                confidence: categorization.confidence,
                matched_rules: categorization.matched_rules,
            },
        }
    }
}
