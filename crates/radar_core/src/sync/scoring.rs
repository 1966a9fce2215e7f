//! Score synthesis for feed items, nudged by past triage decisions.

use crate::model::radar_item::{Kind, Level, RadarItem, RadarStatus};
use crate::sync::feed::FeedItem;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

const MIN_TOKEN_CHARS: usize = 5;
const MIN_PROFILE_HITS: usize = 2;
const SYNTH_SCORE_MIN: f64 = 20.0;
const SYNTH_SCORE_MAX: f64 = 98.0;

static NON_WORD_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}\s]").expect("valid non-word regex"));

/// Lower-cased word tokens of at least five characters.
pub fn tokenize(text: &str) -> Vec<String> {
    NON_WORD_RE
        .replace_all(&text.to_lowercase(), " ")
        .split_whitespace()
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        .map(str::to_string)
        .collect()
}

/// Token counts of previously accepted and rejected news items.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedbackProfile {
    pub accepted: HashMap<String, usize>,
    pub rejected: HashMap<String, usize>,
}

impl FeedbackProfile {
    pub fn from_items(items: &[RadarItem]) -> Self {
        let mut profile = Self::default();
        for item in items.iter().filter(|item| item.kind == Kind::News) {
            let target = match item.status {
                RadarStatus::Accepted => &mut profile.accepted,
                RadarStatus::Rejected => &mut profile.rejected,
                RadarStatus::New | RadarStatus::Watchlist | RadarStatus::Unknown => continue,
            };
            for token in tokenize(&format!("{} {}", item.title, item.source)) {
                *target.entry(token).or_insert(0) += 1;
            }
        }
        profile
    }

    /// Counts `(accepted_hits, rejected_hits)` over the tokens of `text`.
    fn hits(&self, text: &str) -> (usize, usize) {
        let is_hit = |counts: &HashMap<String, usize>, token: &str| {
            counts.get(token).copied().unwrap_or(0) >= MIN_PROFILE_HITS
        };
        tokenize(text)
            .iter()
            .fold((0, 0), |(accepted, rejected), token| {
                (
                    accepted + usize::from(is_hit(&self.accepted, token)),
                    rejected + usize::from(is_hit(&self.rejected, token)),
                )
            })
    }
}

/// Synthesizes a 20–98 radar score for a feed item of the given age.
pub fn synthesize_score(item: &FeedItem, profile: &FeedbackProfile, age_days: f64) -> f64 {
    let keywords = item.matched_keywords.len();
    let (accepted_hits, rejected_hits) = profile.hits(&format!("{} {}", item.title, item.summary));

    let mut score = 45.0 + round_half_up(item.score * 40.0);
    score += (keywords * 2).min(10) as f64;
    score += (12.0 - (age_days / 2.0).floor()).max(0.0);
    score += (accepted_hits * 2).min(10) as f64;
    score -= (rejected_hits * 3).min(12) as f64;

    score.clamp(SYNTH_SCORE_MIN, SYNTH_SCORE_MAX)
}

pub fn derive_impact(score: f64) -> Level {
    if score >= 82.0 {
        Level::High
    } else if score >= 65.0 {
        Level::Med
    } else {
        Level::Low
    }
}

pub fn derive_urgency(age_days: f64) -> Level {
    if age_days <= 3.0 {
        Level::High
    } else if age_days <= 10.0 {
        Level::Med
    } else {
        Level::Low
    }
}

fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}
