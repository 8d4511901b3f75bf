//! Fixed-vocabulary context extraction.
//!
//! No semantic understanding happens here: every field is a lookup against a
//! closed list or a substring trigger, evaluated in a fixed priority order.

use std::sync::LazyLock;

use regex::Regex;

/// A known organization or school with its display spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownName {
    /// Lower-case lookup key.
    pub key: &'static str,
    /// Proper-noun display form.
    pub display: &'static str,
}

pub const COMPANIES: &[KnownName] = &[
    KnownName { key: "microsoft", display: "Microsoft" },
    KnownName { key: "google", display: "Google" },
    KnownName { key: "amazon", display: "Amazon" },
    KnownName { key: "meta", display: "Meta" },
    KnownName { key: "apple", display: "Apple" },
    KnownName { key: "tesla", display: "Tesla" },
    KnownName { key: "netflix", display: "Netflix" },
    KnownName { key: "uber", display: "Uber" },
    KnownName { key: "airbnb", display: "Airbnb" },
    KnownName { key: "facebook", display: "Facebook" },
];

pub const SCHOOLS: &[KnownName] = &[
    KnownName { key: "rutgers", display: "Rutgers" },
    KnownName { key: "mit", display: "MIT" },
    KnownName { key: "stanford", display: "Stanford" },
    KnownName { key: "berkeley", display: "Berkeley" },
    KnownName { key: "carnegie mellon", display: "Carnegie Mellon" },
    KnownName { key: "georgia tech", display: "Georgia Tech" },
];

const RESEARCH_TOPICS: &[&str] = &[
    "machine learning",
    "artificial intelligence",
    "computer vision",
    "natural language processing",
    "robotics",
    "data science",
];

const GENERIC_RESEARCH_TRIGGERS: &[&str] =
    &["your research", "your lab", "your paper", "your publication"];

/// Compiled `\b<key>\b` patterns, in table order.
static COMPANY_PATTERNS: LazyLock<Vec<(Regex, KnownName)>> =
    LazyLock::new(|| word_patterns(COMPANIES));
static SCHOOL_PATTERNS: LazyLock<Vec<(Regex, KnownName)>> =
    LazyLock::new(|| word_patterns(SCHOOLS));

static RA_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bra\b").unwrap());

fn word_patterns(names: &[KnownName]) -> Vec<(Regex, KnownName)> {
    names
        .iter()
        .map(|n| (Regex::new(&format!(r"\b{}\b", regex::escape(n.key))).unwrap(), *n))
        .collect()
}

/// What the sender is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Intent {
    #[default]
    General,
    ResearchAssistant,
    Internship,
    Conversation,
    Networking,
    Collaboration,
}

/// Requested timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeframe {
    Soon,
    NextWeek,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Soon => "soon",
            Self::NextWeek => "next week",
        }
    }
}

/// Research interest mentioned by the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResearchMention {
    Topic(&'static str),
    General,
}

/// Per-request context pulled out of the input text. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedContext {
    pub company: Option<KnownName>,
    pub school: Option<KnownName>,
    /// Derived description of a shared tie, e.g. `works at Google`.
    pub connection: Option<String>,
    pub intent: Intent,
    pub timeframe: Option<Timeframe>,
    pub specific_reason: Option<&'static str>,
    pub research_mention: Option<ResearchMention>,
    /// Possessive noun phrase, e.g. `your startup`.
    pub business_mention: Option<&'static str>,
}

impl ExtractedContext {
    /// Extract context from raw input text.
    pub fn extract(text: &str) -> Self {
        let normalized = text.to_lowercase();
        let has = |needle: &str| normalized.contains(needle);

        let company = find_company(&normalized);
        let school = first_word_match(&SCHOOL_PATTERNS, &normalized);

        let mut connection = None;
        if let Some(school) = school
            && has("went to")
        {
            connection = Some(format!("shared alma mater ({})", school.display));
        }
        // A workplace tie outranks a school tie.
        if let Some(company) = company
            && has("work at")
        {
            connection = Some(format!("works at {}", company.display));
        }

        let mut intent = if RA_WORD.is_match(&normalized) || has("research assistant") {
            Intent::ResearchAssistant
        } else if has("internship") {
            Intent::Internship
        } else if has("call") || has("talk") {
            Intent::Conversation
        } else if has("connect") {
            Intent::Networking
        } else {
            Intent::General
        };
        if has("work together") || has("collaborate") {
            intent = Intent::Collaboration;
        }

        let timeframe = if has("soon") {
            Some(Timeframe::Soon)
        } else if has("next week") {
            Some(Timeframe::NextWeek)
        } else {
            None
        };

        let specific_reason = if has("what it's like") || has("what its like") {
            Some("learn about the experience")
        } else if has("career path") {
            Some("learn about your career path")
        } else {
            None
        };

        let research_mention = RESEARCH_TOPICS
            .iter()
            .copied()
            .find(|topic| has(topic))
            .map(ResearchMention::Topic)
            .or_else(|| {
                GENERIC_RESEARCH_TRIGGERS
                    .iter()
                    .any(|t| has(t))
                    .then_some(ResearchMention::General)
            });

        let business_mention = if has("startup") {
            Some("your startup")
        } else if has("product") {
            Some("your product")
        } else if has("business") || has("partnership") {
            Some("your business")
        } else {
            None
        };

        Self {
            company,
            school,
            connection,
            intent,
            timeframe,
            specific_reason,
            research_mention,
            business_mention,
        }
    }

    /// Whether any organization, school or business context was found.
    pub fn has_affiliation(&self) -> bool {
        self.company.is_some() || self.school.is_some() || self.business_mention.is_some()
    }
}

/// First known company named as a whole word in lower-cased `text`.
pub fn find_company(normalized: &str) -> Option<KnownName> {
    first_word_match(&COMPANY_PATTERNS, normalized)
}

fn first_word_match(patterns: &[(Regex, KnownName)], haystack: &str) -> Option<KnownName> {
    patterns
        .iter()
        .find(|(re, _)| re.is_match(haystack))
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_company_and_school_connection() {
        let ctx = ExtractedContext::extract("I went to Rutgers and saw you work at Google");
        assert_eq!(ctx.company.map(|c| c.display), Some("Google"));
        assert_eq!(ctx.school.map(|s| s.display), Some("Rutgers"));
        assert_eq!(ctx.connection.as_deref(), Some("works at Google"));
    }

    #[test]
    fn test_school_connection_only() {
        let ctx = ExtractedContext::extract("we both went to Stanford");
        assert_eq!(ctx.connection.as_deref(), Some("shared alma mater (Stanford)"));
        assert!(ctx.company.is_none());
    }

    #[test]
    fn test_school_matches_whole_word() {
        let ctx = ExtractedContext::extract("I want to submit my application");
        assert!(ctx.school.is_none());
    }

    #[test]
    fn test_intent_priority() {
        assert_eq!(
            ExtractedContext::extract("RA position, maybe a call").intent,
            Intent::ResearchAssistant
        );
        assert_eq!(
            ExtractedContext::extract("internship, can we talk?").intent,
            Intent::Internship
        );
        assert_eq!(
            ExtractedContext::extract("can we talk and connect").intent,
            Intent::Conversation
        );
        assert_eq!(ExtractedContext::extract("let's connect").intent, Intent::Networking);
        assert_eq!(ExtractedContext::extract("hello").intent, Intent::General);
    }

    #[test]
    fn test_ra_is_a_whole_word() {
        let ctx = ExtractedContext::extract("I would like to grab a coffee");
        assert_ne!(ctx.intent, Intent::ResearchAssistant);
    }

    #[test]
    fn test_collaboration_overrides_intent() {
        let ctx = ExtractedContext::extract("internship where we could work together");
        assert_eq!(ctx.intent, Intent::Collaboration);
    }

    #[test]
    fn test_timeframe_and_reason() {
        let ctx = ExtractedContext::extract("talk soon about what it's like next week");
        assert_eq!(ctx.timeframe, Some(Timeframe::Soon));
        assert_eq!(ctx.specific_reason, Some("learn about the experience"));

        let ctx = ExtractedContext::extract("a call next week about your career path");
        assert_eq!(ctx.timeframe, Some(Timeframe::NextWeek));
        assert_eq!(ctx.specific_reason, Some("learn about your career path"));
    }

    #[test]
    fn test_research_mentions() {
        let ctx = ExtractedContext::extract("your work in Computer Vision");
        assert_eq!(ctx.research_mention, Some(ResearchMention::Topic("computer vision")));

        let ctx = ExtractedContext::extract("I read your paper");
        assert_eq!(ctx.research_mention, Some(ResearchMention::General));
    }

    #[test]
    fn test_business_mention() {
        let ctx = ExtractedContext::extract("I love what your startup is building");
        assert_eq!(ctx.business_mention, Some("your startup"));
        assert!(ctx.has_affiliation());
    }
}
