//! Template-filling draft strategy.
//!
//! Each category has a template in `templates.json`: fixed `subject`,
//! `greeting` and `closing` strings plus named body sections, listed in
//! render order by `required`. Placeholders like `{topic}` are filled from
//! key information extracted from the input, merged with caller overrides
//! (overrides win). Placeholders left unfilled are rewritten to
//! `{{placeholder}}` so they stand out in the draft.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::pipeline::context::find_company;
use crate::pipeline::types::{DraftOutput, EmailCategory};

/// Inputs longer than this get a generic subject for `other`.
const MAX_TOPIC_CHARS: usize = 50;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([^{}]+)\}").unwrap());
static RA_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bra\b").unwrap());
static POSITION_PHRASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\w+)\s+(position|role)").unwrap());

/// A single category template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    /// Section names in render order. `subject`, `greeting` and `closing`
    /// are rendered separately and skipped here.
    pub required: Vec<String>,
    pub subject: String,
    pub greeting: String,
    pub closing: String,
    /// Named body sections (`intro`, `purpose`, `cta`, ...).
    #[serde(flatten)]
    pub sections: HashMap<String, String>,
}

/// One template per category, validated at load time.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    networking: Template,
    followup: Template,
    referral: Template,
    thankyou: Template,
    other: Template,
}

impl TemplateSet {
    /// Build from the parsed file. Every category must be present.
    pub fn from_map(mut map: HashMap<String, Template>) -> Result<Self, ConfigError> {
        let mut take = |category: EmailCategory| {
            map.remove(category.as_str())
                .ok_or_else(|| ConfigError::MissingTemplate {
                    category: category.as_str().to_string(),
                })
        };
        Ok(Self {
            networking: take(EmailCategory::Networking)?,
            followup: take(EmailCategory::Followup)?,
            referral: take(EmailCategory::Referral)?,
            thankyou: take(EmailCategory::Thankyou)?,
            other: take(EmailCategory::Other)?,
        })
    }

    pub fn get(&self, category: EmailCategory) -> &Template {
        match category {
            EmailCategory::Networking => &self.networking,
            EmailCategory::Followup => &self.followup,
            EmailCategory::Referral => &self.referral,
            EmailCategory::Thankyou => &self.thankyou,
            EmailCategory::Other => &self.other,
        }
    }

    /// Render a draft for `category` from input text and caller overrides.
    pub fn render(
        &self,
        text: &str,
        category: EmailCategory,
        overrides: Option<&HashMap<String, String>>,
    ) -> DraftOutput {
        let template = self.get(category);

        let mut values = extract_key_information(text, category);
        if let Some(overrides) = overrides {
            values.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        }

        let mut body_sections: Vec<String> = template
            .required
            .iter()
            .filter(|f| !matches!(f.as_str(), "subject" | "greeting" | "closing"))
            .filter_map(|f| template.sections.get(f))
            .map(|section| fill_placeholders(section, &values))
            .collect();

        if body_sections.is_empty() {
            body_sections.push(fill_placeholders("{message_purpose}", &values));
        }

        debug!(
            category = %category,
            sections = body_sections.len(),
            overrides = overrides.map(|o| o.len()).unwrap_or(0),
            "Rendered template draft"
        );

        DraftOutput {
            subject: fill_placeholders(&template.subject, &values),
            greeting: fill_placeholders(&template.greeting, &values),
            body_sections,
            closing: fill_placeholders(&template.closing, &values),
        }
    }
}

/// Replace `{key}` with its value; unknown keys become `{{key}}`.
pub fn fill_placeholders(template: &str, values: &HashMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| match values.get(&caps[1]) {
            Some(value) => value.clone(),
            None => format!("{{{{{}}}}}", &caps[1]),
        })
        .into_owned()
}

/// Category-specific placeholder values pulled from the input text.
pub fn extract_key_information(text: &str, category: EmailCategory) -> HashMap<String, String> {
    let normalized = text.to_lowercase();
    let has = |needle: &str| normalized.contains(needle);

    let mut info: HashMap<String, String> = HashMap::new();
    let mut set = |key: &str, value: &str| {
        info.insert(key.to_string(), value.to_string());
    };
    set("message_purpose", text);
    set("topic", text);

    match category {
        EmailCategory::Networking => {
            let (topic, goal) = if has("internship") {
                ("Professional Networking Opportunity", "exploring internship opportunities")
            } else if has("job") || has("position") || has("role") {
                ("Professional Networking Opportunity", "exploring job opportunities")
            } else if has("research") || RA_WORD.is_match(&normalized) {
                ("Research Collaboration Opportunity", "exploring research opportunities")
            } else if has("coffee") || has("chat") || has("connect") {
                ("Professional Connection", "establishing a professional connection")
            } else {
                ("Professional Networking", "professional networking and collaboration")
            };
            set("topic", topic);
            set("email_goal", goal);
        }
        EmailCategory::Followup => {
            let topic = if has("interview") {
                "Our Interview"
            } else if has("meeting") {
                "Our Meeting"
            } else if has("conversation") {
                "Our Conversation"
            } else {
                "Our Discussion"
            };
            set("topic", topic);
            set("topic_lower", &topic.to_lowercase());
            set("desired_outcome", text);
            set("prior_contact_date", "last week");
        }
        EmailCategory::Referral => {
            let company = find_company(&normalized)
                .map(|c| c.display)
                .unwrap_or("the company");
            let role = if has("software engineer") || has("swe") {
                "Software Engineer position".to_string()
            } else if has("intern") {
                "Software Engineering Internship".to_string()
            } else if has("research") || RA_WORD.is_match(&normalized) {
                "Research Assistant position".to_string()
            } else if has("data scien") {
                "Data Scientist position".to_string()
            } else if let Some(caps) = POSITION_PHRASE.captures(text) {
                format!("{} {}", &caps[1], &caps[2])
            } else {
                "the position".to_string()
            };
            set("target_company", company);
            set("role_or_position", &role);
            set("skills_or_projects", "relevant technical experience and projects");
        }
        EmailCategory::Thankyou => {
            let (reason, topic) = if has("interview") {
                ("taking the time to interview me", "Interview Follow-up")
            } else if has("meeting") {
                ("meeting with me", "Meeting Follow-up")
            } else if has("help") || has("advice") {
                ("your guidance and advice", "Thank You")
            } else {
                ("your time and assistance", "Thank You")
            };
            set("specific_reason", reason);
            set("topic", topic);
        }
        EmailCategory::Other => {
            if text.chars().count() > MAX_TOPIC_CHARS {
                set("topic", "Professional Inquiry");
            }
        }
    }

    info
}
