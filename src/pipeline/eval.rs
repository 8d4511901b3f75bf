//! Numeric scoring of a draft.
//!
//! Recomputes the checker's primitives as counts and derives three 0–100
//! scores from them:
//!
//! - readability: penalties for long sentences and a high mean, adjusted by
//!   word-count band
//! - professionalism: penalties per slang, emoji and over-promise hit
//! - overall: 60/40 blend of professionalism and readability

use std::sync::Arc;

use crate::config::DraftResources;
use crate::pipeline::checks::sentences;
use crate::pipeline::types::{DraftOutput, EvalMetrics, WordCountBand};

/// Sentences with more words than this count as long.
const LONG_SENTENCE_WORDS: usize = 20;

const LONG_SENTENCE_PENALTY: f64 = 25.0;
const SLANG_PENALTY: i64 = 20;
const EMOJI_PENALTY: i64 = 15;
const OVERPROMISE_PENALTY: i64 = 25;
const PROFESSIONALISM_WEIGHT: f64 = 0.6;
const READABILITY_WEIGHT: f64 = 0.4;

/// Whitespace tokens with at least one ASCII letter or digit.
fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
        .filter(|w| w.chars().any(|c| c.is_ascii_alphanumeric()))
}

/// Per-sentence word statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentenceStats {
    pub count: usize,
    pub avg_length: f64,
    pub long_count: usize,
}

pub fn sentence_stats(text: &str) -> SentenceStats {
    let counts: Vec<usize> = sentences(text).iter().map(|s| words(s).count()).collect();
    if counts.is_empty() {
        return SentenceStats {
            count: 0,
            avg_length: 0.0,
            long_count: 0,
        };
    }
    let total: usize = counts.iter().sum();
    SentenceStats {
        count: counts.len(),
        avg_length: total as f64 / counts.len() as f64,
        long_count: counts.iter().filter(|&&n| n > LONG_SENTENCE_WORDS).count(),
    }
}

pub fn readability_score(stats: &SentenceStats, band: WordCountBand) -> f64 {
    let mut score = 100.0 - stats.long_count as f64 * LONG_SENTENCE_PENALTY;
    if stats.avg_length > 20.0 {
        score -= (stats.avg_length - 20.0) * 3.0;
    }
    if stats.avg_length > 30.0 {
        score -= (stats.avg_length - 30.0) * 5.0;
    }
    score += match band {
        WordCountBand::Medium | WordCountBand::Long => 10.0,
        WordCountBand::Short => -5.0,
        WordCountBand::VeryLong => -20.0,
    };
    score.clamp(0.0, 100.0)
}

pub fn professionalism_score(slang_hits: usize, emoji_hits: usize, overpromise_hits: usize) -> u32 {
    let score = 100
        - slang_hits as i64 * SLANG_PENALTY
        - emoji_hits as i64 * EMOJI_PENALTY
        - overpromise_hits as i64 * OVERPROMISE_PENALTY;
    score.clamp(0, 100) as u32
}

pub fn overall_score(professionalism: u32, readability: f64) -> u32 {
    let blended = PROFESSIONALISM_WEIGHT * professionalism as f64 + READABILITY_WEIGHT * readability;
    blended.round().clamp(0.0, 100.0) as u32
}

/// Computes [`EvalMetrics`] against configured guardrails.
pub struct Evaluator {
    resources: Arc<DraftResources>,
}

impl Evaluator {
    pub fn new(resources: Arc<DraftResources>) -> Self {
        Self { resources }
    }

    pub fn evaluate(&self, draft: &DraftOutput) -> EvalMetrics {
        let guardrails = &self.resources.guardrails;
        let all_text = draft.all_text();
        let lower = all_text.to_lowercase();

        let word_count = words(&all_text).count();
        let word_count_band = WordCountBand::for_count(word_count);
        let stats = sentence_stats(&all_text);

        let slang_hits = guardrails.slang.find_iter(&all_text).count();
        let emoji_hits = guardrails.emoji.find_iter(&all_text).count();
        let overpromise_hits = guardrails
            .blacklist_phrases
            .iter()
            .map(|p| lower.matches(p.as_str()).count())
            .sum();
        let attachment_refs = guardrails
            .attachment_keywords
            .iter()
            .map(|k| lower.matches(k.as_str()).count())
            .sum();
        let link_refs = guardrails.link.find_iter(&all_text).count();

        let readability = readability_score(&stats, word_count_band);
        let professionalism = professionalism_score(slang_hits, emoji_hits, overpromise_hits);

        EvalMetrics {
            word_count,
            word_count_band,
            long_sentence_count: stats.long_count,
            avg_sentence_length: (stats.avg_length * 10.0).round() / 10.0,
            slang_hits,
            emoji_hits,
            overpromise_hits,
            attachment_refs,
            link_refs,
            readability_score: readability,
            professionalism_score: professionalism,
            overall_score: overall_score(professionalism, readability),
        }
    }
}
