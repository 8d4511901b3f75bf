//! Configuration: process settings from the environment and the JSON
//! resource files (guardrails, style lexicons, templates).
//!
//! Resources are loaded once at startup into an immutable [`DraftResources`]
//! and handed to each stage by reference. Every regex is compiled here, so a
//! bad pattern fails the boot instead of the first request.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};
use crate::pipeline::processor::DraftStrategy;
use crate::pipeline::template::{Template, TemplateSet};

pub const GUARDRAILS_FILE: &str = "guardrails.json";
pub const STYLE_LEXICONS_FILE: &str = "style_lexicons.json";
pub const TEMPLATES_FILE: &str = "templates.json";

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_LLM_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_LLM_MODEL: &str = "gpt-4";
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;

// ── Process configuration ───────────────────────────────────────────

/// Process-level settings, built from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HTTP listen port.
    pub port: u16,
    /// Directory holding the JSON resource files.
    pub config_dir: PathBuf,
    /// Which drafting strategy serves `/draft` and `/refine`.
    pub strategy: DraftStrategy,
    /// Generation client settings.
    pub llm: LlmConfig,
}

impl AppConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port: u16 = match std::env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT".into(),
                message: format!("not a port number: {raw}"),
            })?,
            Err(_) => DEFAULT_PORT,
        };

        let config_dir = std::env::var("EMAIL_DRAFTER_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"));

        let strategy = match std::env::var("DRAFT_STRATEGY") {
            Ok(raw) => raw.parse()?,
            Err(_) => DraftStrategy::default(),
        };

        let api_key = std::env::var("LLM_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .map(secrecy::SecretString::from);

        let timeout_secs: u64 = std::env::var("LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_LLM_TIMEOUT_SECS);

        let llm = LlmConfig {
            backend: if api_key.is_some() {
                LlmBackend::OpenAi
            } else {
                LlmBackend::Mock
            },
            api_key,
            base_url: std::env::var("LLM_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_LLM_BASE_URL.to_string()),
            model: std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_LLM_MODEL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        };

        Ok(Self {
            port,
            config_dir,
            strategy,
            llm,
        })
    }
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load and deserialize `dir/file`.
pub fn load_config<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<T, ConfigError> {
    let path = dir.join(file);
    let content = std::fs::read_to_string(&path).map_err(|e| io_error(file, e))?;
    parse_config(file, &content)
}

/// Async variant of [`load_config`].
pub async fn load_config_async<T: DeserializeOwned>(
    dir: &Path,
    file: &str,
) -> Result<T, ConfigError> {
    let path = dir.join(file);
    let content = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| io_error(file, e))?;
    parse_config(file, &content)
}

fn parse_config<T: DeserializeOwned>(file: &str, content: &str) -> Result<T, ConfigError> {
    serde_json::from_str(content).map_err(|e| ConfigError::from_json(file, e))
}

fn io_error(file: &str, err: std::io::Error) -> ConfigError {
    if err.kind() == std::io::ErrorKind::NotFound {
        ConfigError::NotFound {
            file: file.to_string(),
        }
    } else {
        ConfigError::Io(err)
    }
}

// ── File schemas ────────────────────────────────────────────────────

/// `guardrails.json` as written on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct GuardrailsFile {
    pub blacklist_phrases: Vec<String>,
    pub slang_regex: String,
    pub emoji_regex: String,
    pub attachment_keywords: Vec<String>,
    pub link_regex: String,
}

/// `style_lexicons.json` as written on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct StyleLexiconsFile {
    pub formality: FormalityLexicon,
    pub warmth: WarmthLexicon,
    pub confidence: ConfidenceLexicon,
    pub seniority: SeniorityLexicon,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormalityLexicon {
    pub casual_to_formal: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WarmthLexicon {
    pub niceties: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfidenceLexicon {
    pub hedges: Vec<String>,
    pub assertive: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeniorityLexicon {
    pub student_additions: Vec<String>,
    pub professional_additions: Vec<String>,
}

/// `templates.json` as written on disk: category name → template.
pub type TemplatesFile = HashMap<String, Template>;

// ── Compiled resources ──────────────────────────────────────────────

/// Guardrail rules with their patterns compiled.
#[derive(Debug, Clone)]
pub struct Guardrails {
    /// Lower-cased over-promise phrases.
    pub blacklist_phrases: Vec<String>,
    /// Case-insensitive slang pattern.
    pub slang: Regex,
    pub emoji: Regex,
    /// Lower-cased attachment keywords.
    pub attachment_keywords: Vec<String>,
    /// Case-insensitive link pattern.
    pub link: Regex,
}

impl Guardrails {
    pub fn compile(file: GuardrailsFile) -> Result<Self, ConfigError> {
        Ok(Self {
            blacklist_phrases: lowercase_all(file.blacklist_phrases),
            slang: compile_pattern(GUARDRAILS_FILE, "slang_regex", &file.slang_regex, true)?,
            emoji: compile_pattern(GUARDRAILS_FILE, "emoji_regex", &file.emoji_regex, false)?,
            attachment_keywords: lowercase_all(file.attachment_keywords),
            link: compile_pattern(GUARDRAILS_FILE, "link_regex", &file.link_regex, true)?,
        })
    }
}

/// A whole-word, case-insensitive substitution.
#[derive(Debug, Clone)]
pub struct WordRule {
    pub phrase: String,
    pub pattern: Regex,
    pub replacement: String,
}

/// Style lexicons with their substitution patterns compiled.
#[derive(Debug, Clone)]
pub struct StyleLexicons {
    /// Longest phrase first, so multi-word entries beat their prefixes.
    pub casual_to_formal: Vec<WordRule>,
    /// Loaded but not applied: the warmth pass is a no-op.
    pub niceties: Vec<String>,
    /// Hedge words; the first entry is the low-confidence substitute.
    pub hedges: Vec<String>,
    /// Whole-word patterns for `hedges`, same order.
    pub hedge_patterns: Vec<Regex>,
    pub assertive: Vec<String>,
    /// Whole-word patterns for `assertive`, same order.
    pub assertive_patterns: Vec<Regex>,
    pub student_additions: Vec<String>,
    pub professional_additions: Vec<String>,
}

impl StyleLexicons {
    pub fn compile(file: StyleLexiconsFile) -> Result<Self, ConfigError> {
        let mut entries: Vec<(String, String)> =
            file.formality.casual_to_formal.into_iter().collect();
        entries.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let casual_to_formal = entries
            .into_iter()
            .map(|(phrase, replacement)| {
                let pattern = word_pattern(STYLE_LEXICONS_FILE, "casual_to_formal", &phrase)?;
                Ok(WordRule {
                    phrase,
                    pattern,
                    replacement,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        if file.confidence.hedges.is_empty() {
            return Err(ConfigError::Schema {
                file: STYLE_LEXICONS_FILE.into(),
                reason: "confidence.hedges must not be empty".into(),
            });
        }
        if file.seniority.student_additions.is_empty()
            || file.seniority.professional_additions.is_empty()
        {
            return Err(ConfigError::Schema {
                file: STYLE_LEXICONS_FILE.into(),
                reason: "seniority additions must not be empty".into(),
            });
        }

        let hedge_patterns = phrase_patterns("confidence.hedges", &file.confidence.hedges)?;
        let assertive_patterns =
            phrase_patterns("confidence.assertive", &file.confidence.assertive)?;

        Ok(Self {
            casual_to_formal,
            niceties: file.warmth.niceties,
            hedges: file.confidence.hedges,
            hedge_patterns,
            assertive: file.confidence.assertive,
            assertive_patterns,
            student_additions: file.seniority.student_additions,
            professional_additions: file.seniority.professional_additions,
        })
    }
}

/// Build `\b<escaped phrase>\b`, case-insensitive.
pub fn word_pattern(file: &str, field: &str, phrase: &str) -> Result<Regex, ConfigError> {
    let source = format!(r"\b{}\b", regex::escape(phrase));
    compile_pattern(file, field, &source, true)
}

fn phrase_patterns(field: &str, phrases: &[String]) -> Result<Vec<Regex>, ConfigError> {
    phrases
        .iter()
        .map(|p| word_pattern(STYLE_LEXICONS_FILE, field, p))
        .collect()
}

fn compile_pattern(
    file: &str,
    field: &str,
    source: &str,
    case_insensitive: bool,
) -> Result<Regex, ConfigError> {
    RegexBuilder::new(source)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| ConfigError::InvalidRegex {
            file: file.to_string(),
            field: field.to_string(),
            reason: e.to_string(),
        })
}

fn lowercase_all(items: Vec<String>) -> Vec<String> {
    items.into_iter().map(|s| s.to_lowercase()).collect()
}

/// Immutable, process-lifetime drafting resources.
#[derive(Debug, Clone)]
pub struct DraftResources {
    pub guardrails: Guardrails,
    pub style: StyleLexicons,
    pub templates: TemplateSet,
}

impl DraftResources {
    /// Load every resource file from `dir`.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        Self::from_files(
            load_config(dir, GUARDRAILS_FILE)?,
            load_config(dir, STYLE_LEXICONS_FILE)?,
            load_config(dir, TEMPLATES_FILE)?,
        )
    }

    /// Async variant of [`DraftResources::load`].
    pub async fn load_async(dir: &Path) -> Result<Self, ConfigError> {
        Self::from_files(
            load_config_async(dir, GUARDRAILS_FILE).await?,
            load_config_async(dir, STYLE_LEXICONS_FILE).await?,
            load_config_async(dir, TEMPLATES_FILE).await?,
        )
    }

    /// The resource files shipped in `config/`, embedded at compile time.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_files(
            parse_config(
                GUARDRAILS_FILE,
                include_str!("../config/guardrails.json"),
            )?,
            parse_config(
                STYLE_LEXICONS_FILE,
                include_str!("../config/style_lexicons.json"),
            )?,
            parse_config(TEMPLATES_FILE, include_str!("../config/templates.json"))?,
        )
    }

    fn from_files(
        guardrails: GuardrailsFile,
        style: StyleLexiconsFile,
        templates: TemplatesFile,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            guardrails: Guardrails::compile(guardrails)?,
            style: StyleLexicons::compile(style)?,
            templates: TemplateSet::from_map(templates)?,
        })
    }
}
