//! Content generation from extracted context.
//!
//! Every part of the draft is an ordered list of `(predicate, producer)`
//! rules evaluated top-down; the first rule whose predicate holds produces
//! the text. Lists end in a catch-all where the part is mandatory.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::pipeline::context::{ExtractedContext, Intent, ResearchMention, Timeframe};
use crate::pipeline::types::{DraftOutput, EmailCategory, Seniority, ToneSettings};

/// Longest slice of the input reused verbatim in the fallback purpose.
const PURPOSE_SLICE_CHARS: usize = 100;

const WELL_WISH: &str = "I hope this message finds you well.";

static PURPOSE_REWRITES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"^(can i|could i|may i)\b").unwrap(), "I would like to"),
        (Regex::new(r"^i want to\b").unwrap(), "I am interested in"),
        (Regex::new(r"^i need to\b").unwrap(), "I would like to"),
    ]
});

/// Everything a rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct GenerationInput<'a> {
    pub ctx: &'a ExtractedContext,
    pub category: EmailCategory,
    pub tone: &'a ToneSettings,
    /// Original, unnormalized input text.
    pub text: &'a str,
}

impl GenerationInput<'_> {
    fn company(&self) -> &'static str {
        self.ctx.company.map(|c| c.display).unwrap_or_default()
    }

    fn school(&self) -> &'static str {
        self.ctx.school.map(|s| s.display).unwrap_or_default()
    }

    fn student(&self) -> bool {
        self.tone.seniority == Seniority::Student
    }
}

/// One generation rule.
pub struct GenRule {
    pub name: &'static str,
    pub applies: fn(&GenerationInput<'_>) -> bool,
    pub produce: fn(&GenerationInput<'_>) -> String,
}

/// Evaluate `rules` in order and return the first production.
pub fn first_match(rules: &[GenRule], input: &GenerationInput<'_>) -> Option<(&'static str, String)> {
    rules
        .iter()
        .find(|r| (r.applies)(input))
        .map(|r| (r.name, (r.produce)(input)))
}

fn always(_: &GenerationInput<'_>) -> bool {
    true
}

// ── Rule tables ─────────────────────────────────────────────────────

fn subject_rules() -> Vec<GenRule> {
    vec![
        GenRule {
            name: "alum_connection",
            applies: |g| g.ctx.company.is_some() && g.ctx.school.is_some() && g.ctx.connection.is_some(),
            produce: |g| format!("Fellow {} Alum — {} Connection", g.school(), g.company()),
        },
        GenRule {
            name: "research_assistant",
            applies: |g| g.ctx.intent == Intent::ResearchAssistant,
            produce: |_| "Research Assistant Opportunity Inquiry".to_string(),
        },
        GenRule {
            name: "company_internship",
            applies: |g| g.ctx.intent == Intent::Internship && g.ctx.company.is_some(),
            produce: |g| format!("{} Internship Inquiry", g.company()),
        },
        GenRule {
            name: "company_coffee_chat",
            applies: |g| g.ctx.intent == Intent::Conversation && g.ctx.company.is_some(),
            produce: |g| format!("Coffee Chat About {}", g.company()),
        },
        GenRule {
            name: "company",
            applies: |g| g.ctx.company.is_some(),
            produce: |g| format!("Professional Connection — {}", g.company()),
        },
        GenRule {
            name: "category_default",
            applies: always,
            produce: |g| category_subject(g.category).to_string(),
        },
    ]
}

fn category_subject(category: EmailCategory) -> &'static str {
    match category {
        EmailCategory::Networking => "Professional Networking Opportunity",
        EmailCategory::Followup => "Following Up on Our Previous Conversation",
        EmailCategory::Referral => "Referral Request",
        EmailCategory::Thankyou => "Thank You",
        EmailCategory::Other => "Professional Inquiry",
    }
}

fn intro_rules() -> Vec<GenRule> {
    vec![
        GenRule {
            name: "student_at_school",
            applies: |g| g.ctx.school.is_some() && g.student(),
            produce: |g| {
                format!(
                    "{WELL_WISH} My name is [Your Name], and I'm currently a student at {}.",
                    g.school()
                )
            },
        },
        GenRule {
            name: "student",
            applies: |g| g.student(),
            produce: |_| {
                format!(
                    "{WELL_WISH} My name is [Your Name], and I'm a student interested in professional opportunities."
                )
            },
        },
        GenRule {
            name: "formal_professional",
            applies: |g| g.tone.formality >= 4,
            produce: |_| {
                format!("{WELL_WISH} My name is [Your Name], and I'm a professional in the field.")
            },
        },
        GenRule {
            name: "well_wish",
            applies: always,
            produce: |_| WELL_WISH.to_string(),
        },
    ]
}

fn research_rules() -> Vec<GenRule> {
    vec![
        GenRule {
            name: "research_topic",
            applies: |g| matches!(g.ctx.research_mention, Some(ResearchMention::Topic(_))),
            produce: |g| match g.ctx.research_mention {
                Some(ResearchMention::Topic(topic)) => {
                    format!("I have been following your work in {topic} with great interest.")
                }
                _ => String::new(),
            },
        },
        GenRule {
            name: "research_general",
            applies: |g| g.ctx.research_mention == Some(ResearchMention::General),
            produce: |_| "I have been following your research with great interest.".to_string(),
        },
    ]
}

fn connection_rules() -> Vec<GenRule> {
    vec![
        GenRule {
            name: "company_and_school",
            applies: |g| g.ctx.company.is_some() && g.ctx.school.is_some() && g.ctx.connection.is_some(),
            produce: |g| {
                format!(
                    "I just discovered that you work at {} and are also a {} alumnus, which is an exciting connection since I'm currently studying there.",
                    g.company(),
                    g.school()
                )
            },
        },
        GenRule {
            name: "company_connection",
            applies: |g| g.ctx.company.is_some() && g.ctx.connection.is_some(),
            produce: |g| format!("I noticed that you work at {}, which caught my attention.", g.company()),
        },
        GenRule {
            name: "school_connection",
            applies: |g| g.ctx.school.is_some() && g.ctx.connection.is_some(),
            produce: |g| {
                format!(
                    "I noticed that we are both {} alumni, which is an exciting connection.",
                    g.school()
                )
            },
        },
        GenRule {
            name: "company_admiration",
            applies: |g| g.ctx.company.is_some(),
            produce: |g| format!("I have long admired the work being done at {}.", g.company()),
        },
        GenRule {
            name: "business",
            applies: |g| g.ctx.business_mention.is_some(),
            produce: |g| {
                format!(
                    "I have been following {} with great interest.",
                    g.ctx.business_mention.unwrap_or("your work")
                )
            },
        },
    ]
}

fn purpose_rules() -> Vec<GenRule> {
    vec![
        GenRule {
            name: "research_assistant",
            applies: |g| g.ctx.intent == Intent::ResearchAssistant,
            produce: |_| {
                "I am writing to inquire about research assistant opportunities in your lab. I am very interested in contributing to your research and would appreciate the chance to discuss how my background and interests align with your current projects.".to_string()
            },
        },
        GenRule {
            name: "company_internship",
            applies: |g| g.ctx.intent == Intent::Internship && g.ctx.company.is_some(),
            produce: |g| {
                format!(
                    "I am currently seeking internship opportunities and am particularly drawn to {}. I would welcome the opportunity to learn more about potential openings and discuss how I might contribute to your team.",
                    g.company()
                )
            },
        },
        GenRule {
            name: "company_conversation_reason",
            applies: |g| {
                g.ctx.intent == Intent::Conversation
                    && g.ctx.specific_reason.is_some()
                    && g.ctx.company.is_some()
            },
            produce: |g| {
                format!(
                    "I am very interested in learning more about {} and would greatly appreciate the opportunity to {} from someone with your experience.",
                    g.company(),
                    g.ctx.specific_reason.unwrap_or_default()
                )
            },
        },
        GenRule {
            name: "conversation_reason",
            applies: |g| g.ctx.intent == Intent::Conversation && g.ctx.specific_reason.is_some(),
            produce: |g| {
                format!(
                    "I would greatly appreciate the opportunity to {} and learn about your career journey.",
                    g.ctx.specific_reason.unwrap_or_default()
                )
            },
        },
        GenRule {
            name: "company_networking",
            applies: |g| g.ctx.intent == Intent::Networking && g.ctx.company.is_some(),
            produce: |g| {
                format!(
                    "I am interested in learning more about {} and would value the chance to connect with professionals in the organization to better understand the company culture and potential opportunities.",
                    g.company()
                )
            },
        },
        GenRule {
            name: "collaboration",
            applies: |g| g.ctx.intent == Intent::Collaboration,
            produce: |_| {
                "I would welcome the opportunity to explore how we might work together on projects of shared interest.".to_string()
            },
        },
        GenRule {
            name: "rewritten_input",
            applies: always,
            produce: |g| rewrite_input(g.text),
        },
    ]
}

fn cta_rules() -> Vec<GenRule> {
    vec![
        GenRule {
            name: "soon",
            applies: |g| g.ctx.timeframe == Some(Timeframe::Soon),
            produce: |_| {
                "Would you be available for a brief call sometime soon to discuss this further?".to_string()
            },
        },
        GenRule {
            name: "next_week",
            applies: |g| g.ctx.timeframe == Some(Timeframe::NextWeek),
            produce: |_| "Would you be available for a brief call next week?".to_string(),
        },
        GenRule {
            name: "conversation",
            applies: |g| g.ctx.intent == Intent::Conversation,
            produce: |_| {
                "Would you be open to a brief coffee chat or phone call in the coming weeks?".to_string()
            },
        },
        GenRule {
            name: "research_assistant",
            applies: |g| g.ctx.intent == Intent::ResearchAssistant,
            produce: |_| {
                "I would be grateful for the chance to meet and discuss how I might contribute to your research and learn more about available positions.".to_string()
            },
        },
        GenRule {
            name: "collaboration",
            applies: |g| g.ctx.intent == Intent::Collaboration,
            produce: |_| "Would you be open to a call to explore this further?".to_string(),
        },
        GenRule {
            name: "formal",
            applies: |g| g.tone.formality >= 4,
            produce: |_| {
                "I would greatly appreciate the opportunity to meet with you at your convenience.".to_string()
            },
        },
        GenRule {
            name: "default",
            applies: always,
            produce: |_| "Would you be open to a brief conversation about this?".to_string(),
        },
    ]
}

// ── Free-text fallback ──────────────────────────────────────────────

/// Turn raw input into a purpose sentence when no specific rule fits.
///
/// Lower-cases, keeps at most [`PURPOSE_SLICE_CHARS`] characters, rewrites
/// request openers into first-person statements, and frames anything that
/// is not already a statement as an inquiry.
pub fn rewrite_input(text: &str) -> String {
    let sliced: String = text.trim().to_lowercase().chars().take(PURPOSE_SLICE_CHARS).collect();
    let mut purpose = sliced
        .trim_end_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace())
        .to_string();

    if purpose.is_empty() {
        return "I am writing with a brief professional inquiry.".to_string();
    }

    for (pattern, replacement) in PURPOSE_REWRITES.iter() {
        purpose = pattern.replace(&purpose, *replacement).into_owned();
    }
    purpose = purpose
        .replace("how i contribute", "how I might contribute")
        .replace("how i might", "how I might");

    let lower = purpose.to_lowercase();
    if !(lower.starts_with("i am") || lower.starts_with("i would") || lower.starts_with("thank")) {
        purpose = format!("I am writing to inquire about {purpose}");
    }

    format!("{}.", capitalize_first(&purpose))
}

/// Upper-case the first character.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// ── Generator ───────────────────────────────────────────────────────

/// Builds a complete [`DraftOutput`] from input text and its category.
pub struct ContentGenerator {
    subject: Vec<GenRule>,
    intro: Vec<GenRule>,
    research: Vec<GenRule>,
    connection: Vec<GenRule>,
    purpose: Vec<GenRule>,
    cta: Vec<GenRule>,
}

impl ContentGenerator {
    pub fn new() -> Self {
        Self {
            subject: subject_rules(),
            intro: intro_rules(),
            research: research_rules(),
            connection: connection_rules(),
            purpose: purpose_rules(),
            cta: cta_rules(),
        }
    }

    /// Generate a draft. Always returns a complete shape.
    pub fn generate(&self, text: &str, category: EmailCategory, tone: &ToneSettings) -> DraftOutput {
        let ctx = ExtractedContext::extract(text);
        self.generate_with_context(&ctx, text, category, tone)
    }

    pub fn generate_with_context(
        &self,
        ctx: &ExtractedContext,
        text: &str,
        category: EmailCategory,
        tone: &ToneSettings,
    ) -> DraftOutput {
        let input = GenerationInput {
            ctx,
            category,
            tone,
            text,
        };

        let mut fired: Vec<&'static str> = Vec::new();
        let mut run = |rules: &[GenRule]| {
            first_match(rules, &input).map(|(name, text)| {
                fired.push(name);
                text
            })
        };

        let subject = run(&self.subject).unwrap_or_else(|| category_subject(category).to_string());

        let mut body_sections = Vec::with_capacity(5);
        body_sections.extend(run(&self.intro));
        body_sections.extend(run(&self.research));
        body_sections.extend(run(&self.connection));
        body_sections.push(run(&self.purpose).unwrap_or_else(|| rewrite_input(text)));
        body_sections.extend(run(&self.cta));

        debug!(
            intent = ?ctx.intent,
            rules = ?fired,
            sections = body_sections.len(),
            "Generated draft content"
        );

        DraftOutput {
            subject,
            greeting: greeting_for(tone).to_string(),
            body_sections,
            closing: closing_for(tone).to_string(),
        }
    }
}

impl Default for ContentGenerator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn greeting_for(tone: &ToneSettings) -> &'static str {
    match tone.formality {
        f if f >= 4 => "Dear [Recipient Name],",
        3 => "Hello [Recipient Name],",
        _ => "Hi [Recipient Name],",
    }
}

pub fn closing_for(tone: &ToneSettings) -> &'static str {
    match tone.formality {
        f if f >= 4 => "Sincerely,\n[Your Name]",
        3 => "Best regards,\n[Your Name]",
        _ => "Thanks,\n[Your Name]",
    }
}
