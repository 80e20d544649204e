//! Turns ranking-provider output into the positioning half of the scan:
//! a bounded sub-score, a keyword-gap list, and the sales-facing estimates
//! (financial loss, competitor count, missing pages).

use crate::models::{KeywordEntry, PositioningData};
use crate::ranking::RankingSnapshot;
use std::collections::HashSet;

/// Points per ranked keyword saturate at 80 before normalization to 0-100.
const POINTS_SATURATION: f64 = 80.0;
/// Domains with little ranking data cannot appear well optimized.
const LOW_DATA_KEYWORD_THRESHOLD: usize = 5;
const LOW_DATA_SCORE_CAP: u8 = 35;
/// Never report zero; the narrative needs somewhere to start from.
const MIN_POSITIONING_SCORE: u8 = 5;
const MAX_GAP_KEYWORDS: usize = 3;
/// Loss proxy: 5% click-through at 2 EUR per click, monthly.
const CLICK_THROUGH_RATE: f64 = 0.05;
const COST_PER_CLICK_EUR: f64 = 2.0;
const MIN_FINANCIAL_LOSS: u32 = 350;
const MIN_MISSING_PAGES: u32 = 3;
const DEFAULT_COMPETITORS: u32 = 3;

/// The fixed substitute when the ranking provider is unreachable.
const FALLBACK_POSITIONING_SCORE: u8 = 15;
const FALLBACK_FINANCIAL_LOSS: u32 = 1200;
const FALLBACK_COMPETITORS: u32 = 5;
const FALLBACK_MISSING_PAGES: u32 = 7;

/// Branded keyword guesses when no real gap is available: suffix, volume,
/// difficulty.
const FALLBACK_KEYWORD_POOL: [(&str, u32, u8); 5] = [
    ("avis", 880, 35),
    ("contact", 590, 30),
    ("tarifs", 480, 32),
    ("services", 390, 38),
    ("horaires", 320, 25),
];

/// Scores a live ranking snapshot.
///
/// # Arguments
/// * `snapshot` - Raw provider output for the domain.
/// * `domain` - The normalized domain, used to brand fallback keywords.
pub(crate) fn score_positioning(snapshot: &RankingSnapshot, domain: &str) -> PositioningData {
    let mut points = 0u32;
    for item in &snapshot.ranked {
        let position = item.rank_position().unwrap_or(100);
        points += match position {
            p if p <= 3 => 5,
            p if p <= 10 => 3,
            p if p <= 20 => 1,
            _ => 0,
        };
    }

    let mut score = ((points as f64 / POINTS_SATURATION).min(1.0) * 100.0).round() as u8;
    if snapshot.ranked.len() < LOW_DATA_KEYWORD_THRESHOLD {
        score = score.min(LOW_DATA_SCORE_CAP);
    }
    let positioning_score = score.max(MIN_POSITIONING_SCORE);

    let ranked_set: HashSet<String> = snapshot
        .ranked
        .iter()
        .filter_map(|item| item.keyword())
        .map(str::to_lowercase)
        .collect();

    let mut keywords: Vec<KeywordEntry> = snapshot
        .suggestions
        .iter()
        .filter_map(|suggestion| {
            let keyword = suggestion.keyword()?;
            if ranked_set.contains(&keyword.to_lowercase()) {
                return None;
            }
            Some(KeywordEntry {
                keyword: keyword.to_string(),
                volume: suggestion.search_volume().unwrap_or(0).max(0) as u32,
                difficulty: suggestion.difficulty().unwrap_or(0).clamp(0, 100) as u8,
                position: 0,
            })
        })
        .take(MAX_GAP_KEYWORDS)
        .collect();

    if keywords.is_empty() {
        tracing::debug!(target: "positioning_task",
            "No keyword gap found for {}, substituting branded guesses", domain
        );
        keywords = fallback_keywords(domain);
    }

    let volume_sum: u32 = keywords.iter().map(|k| k.volume).sum();
    let financial_loss = ((volume_sum as f64 * CLICK_THROUGH_RATE * COST_PER_CLICK_EUR).round()
        as u32)
        .max(MIN_FINANCIAL_LOSS);
    let missing_pages = (keywords.len() as u32).max(MIN_MISSING_PAGES);
    let competitors = if snapshot.competitors.is_empty() {
        DEFAULT_COMPETITORS
    } else {
        snapshot.competitors.len() as u32
    };

    PositioningData {
        positioning_score,
        keywords,
        financial_loss,
        competitors,
        missing_pages,
    }
}

/// Five synthetic branded keywords built from the domain's leading label,
/// e.g. `example avis` for `example.com`.
pub(crate) fn fallback_keywords(domain: &str) -> Vec<KeywordEntry> {
    let name = domain
        .split('.')
        .next()
        .filter(|label| !label.is_empty())
        .unwrap_or(domain);

    FALLBACK_KEYWORD_POOL
        .iter()
        .map(|(suffix, volume, difficulty)| KeywordEntry {
            keyword: format!("{} {}", name, suffix),
            volume: *volume,
            difficulty: *difficulty,
            position: 0,
        })
        .collect()
}

/// The fixed low-confidence substitute used when the ranking provider call
/// fails entirely.
pub(crate) fn fallback_positioning(domain: &str) -> PositioningData {
    PositioningData {
        positioning_score: FALLBACK_POSITIONING_SCORE,
        keywords: fallback_keywords(domain),
        financial_loss: FALLBACK_FINANCIAL_LOSS,
        competitors: FALLBACK_COMPETITORS,
        missing_pages: FALLBACK_MISSING_PAGES,
    }
}
