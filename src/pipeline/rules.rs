//! Weighted keyword categorizer.
//!
//! Every category owns an ordered list of phrase rules. A phrase found as a
//! substring of the lower-cased input adds its rule's weight once, however
//! often it occurs. The highest score wins; ties go to the category declared
//! first, and `other` holds the baseline so it wins when nothing scores higher.

use tracing::debug;

use crate::pipeline::types::{Categorization, EmailCategory};

/// Confidence reported when no phrase matched at all.
const NO_MATCH_CONFIDENCE: f64 = 0.1;
/// Per-phrase confidence bonus and its cap.
const MATCH_BONUS: f64 = 0.1;
const MAX_MATCH_BONUS: f64 = 0.3;

/// A group of phrases sharing one weight.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    pub phrases: &'static [&'static str],
    pub weight: u32,
}

/// Rules for a single category.
#[derive(Debug, Clone)]
pub struct CategoryRules {
    pub category: EmailCategory,
    pub rules: Vec<CategoryRule>,
}

/// Keyword classifier over the five email intents.
pub struct Categorizer {
    categories: Vec<CategoryRules>,
    max_rule_weight: u32,
}

impl Categorizer {
    /// Categorizer with the built-in phrase tables.
    pub fn default_rules() -> Self {
        let categories = vec![
            CategoryRules {
                category: EmailCategory::Networking,
                rules: vec![
                    CategoryRule {
                        phrases: &[
                            "introduction",
                            "introduce myself",
                            "connect",
                            "connecting",
                            "network",
                            "networking",
                        ],
                        weight: 3,
                    },
                    CategoryRule {
                        phrases: &["coffee chat", "coffee", "meet", "meeting", "call", "conversation"],
                        weight: 2,
                    },
                    CategoryRule {
                        phrases: &[
                            "your work",
                            "your research",
                            "your article",
                            "your post",
                            "admire",
                            "recent article",
                        ],
                        weight: 2,
                    },
                    CategoryRule {
                        phrases: &["reach out", "reaching out", "get in touch", "opportunity to"],
                        weight: 1,
                    },
                    CategoryRule {
                        phrases: &[
                            "ra position",
                            "research assistant",
                            "internship",
                            "software engineering",
                            "opportunities",
                        ],
                        weight: 3,
                    },
                ],
            },
            CategoryRules {
                category: EmailCategory::Followup,
                rules: vec![
                    CategoryRule {
                        phrases: &["follow up", "following up", "follow-up", "checking in", "check in"],
                        weight: 4,
                    },
                    CategoryRule {
                        phrases: &["previous", "last week", "earlier", "our conversation", "we discussed"],
                        weight: 3,
                    },
                    CategoryRule {
                        phrases: &["any updates", "update", "status", "progress", "next steps"],
                        weight: 2,
                    },
                    CategoryRule {
                        phrases: &["gentle reminder", "reminder", "nudge", "circling back"],
                        weight: 2,
                    },
                    CategoryRule {
                        phrases: &["my application", "application status"],
                        weight: 3,
                    },
                ],
            },
            CategoryRules {
                category: EmailCategory::Referral,
                rules: vec![
                    CategoryRule {
                        phrases: &[
                            "referral",
                            "refer me",
                            "reference",
                            "recommend me",
                            "vouch for",
                            "referring",
                            "comfortable referring",
                            "willing to refer",
                            "mind referring",
                        ],
                        weight: 4,
                    },
                    CategoryRule {
                        phrases: &["applying", "application", "position", "role", "job", "internship"],
                        weight: 3,
                    },
                    CategoryRule {
                        phrases: &["resume", "cv", "portfolio", "background", "experience"],
                        weight: 2,
                    },
                ],
            },
            CategoryRules {
                category: EmailCategory::Thankyou,
                rules: vec![
                    CategoryRule {
                        phrases: &["thank you", "thanks", "grateful", "appreciate", "appreciation"],
                        weight: 4,
                    },
                    CategoryRule {
                        phrases: &[
                            "taking the time",
                            "your time",
                            "your help",
                            "your advice",
                            "your guidance",
                            "your support",
                        ],
                        weight: 3,
                    },
                    CategoryRule {
                        phrases: &["interview", "meeting", "call", "conversation", "discussion"],
                        weight: 2,
                    },
                    CategoryRule {
                        phrases: &["helpful", "insightful", "valuable", "useful", "informative"],
                        weight: 1,
                    },
                ],
            },
            CategoryRules {
                category: EmailCategory::Other,
                rules: vec![
                    CategoryRule {
                        phrases: &[
                            "question",
                            "clarification",
                            "clarify",
                            "request",
                            "permission",
                            "confirm",
                        ],
                        weight: 2,
                    },
                    CategoryRule {
                        phrases: &["schedule", "reschedule", "deadline", "extension", "documents"],
                        weight: 1,
                    },
                ],
            },
        ];

        Self::new(categories)
    }

    /// Categorizer over custom tables, in tie-break order.
    pub fn new(categories: Vec<CategoryRules>) -> Self {
        let max_rule_weight = categories
            .iter()
            .flat_map(|c| c.rules.iter().map(|r| r.weight))
            .max()
            .unwrap_or(1);
        Self {
            categories,
            max_rule_weight,
        }
    }

    /// Classify free text. Total: unknown input falls back to `other`.
    pub fn categorize(&self, text: &str) -> Categorization {
        let normalized = text.to_lowercase();

        let scored: Vec<(EmailCategory, u32, Vec<&'static str>)> = self
            .categories
            .iter()
            .map(|c| {
                let mut score = 0;
                let mut matches = Vec::new();
                for rule in &c.rules {
                    for phrase in rule.phrases {
                        if normalized.contains(phrase) {
                            score += rule.weight;
                            matches.push(*phrase);
                        }
                    }
                }
                (c.category, score, matches)
            })
            .collect();

        let (mut best_category, mut best_score, mut best_matches) = scored
            .iter()
            .find(|(category, _, _)| *category == EmailCategory::Other)
            .map(|(c, s, m)| (*c, *s, m.as_slice()))
            .unwrap_or((EmailCategory::Other, 0, &[]));

        for (category, score, matches) in &scored {
            if *score > best_score {
                best_category = *category;
                best_score = *score;
                best_matches = matches;
            }
        }

        let confidence = if best_score > 0 {
            let base = (best_score as f64 / (self.max_rule_weight as f64 * 2.0)).min(1.0);
            let bonus = (best_matches.len() as f64 * MATCH_BONUS).min(MAX_MATCH_BONUS);
            (base + bonus).min(1.0)
        } else {
            NO_MATCH_CONFIDENCE
        };

        let mut matched_rules: Vec<String> = Vec::new();
        for phrase in best_matches {
            if !matched_rules.iter().any(|m| m == phrase) {
                matched_rules.push((*phrase).to_string());
            }
        }

        debug!(
            category = %best_category,
            score = best_score,
            matches = matched_rules.len(),
            "Categorized input"
        );

        Categorization {
            category: best_category,
            confidence: (confidence * 100.0).round() / 100.0,
            matched_rules,
        }
    }
}

impl Default for Categorizer {
    fn default() -> Self {
        Self::default_rules()
    }
}
