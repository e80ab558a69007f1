use crate::models::SearchResult;
use serde::Serialize;
use std::fmt;

/// Tier cut-offs on the normalized score, highest first.
const TIER_THRESHOLDS: [(f64, RelevanceTier); 3] = [
    (70.0, RelevanceTier::HighlyRelevant),
    (40.0, RelevanceTier::ModeratelyRelevant),
    (15.0, RelevanceTier::LowRelevance),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RelevanceTier {
    HighlyRelevant,
    ModeratelyRelevant,
    LowRelevance,
    NotRelevant,
}

impl RelevanceTier {
    pub fn from_normalized(score: f64) -> Self {
        TIER_THRESHOLDS
            .iter()
            .find(|(threshold, _)| score >= *threshold)
            .map(|(_, tier)| *tier)
            .unwrap_or(RelevanceTier::NotRelevant)
    }

    pub fn label(self) -> &'static str {
        match self {
            RelevanceTier::HighlyRelevant => "highly relevant",
            RelevanceTier::ModeratelyRelevant => "moderately relevant",
            RelevanceTier::LowRelevance => "low relevance",
            RelevanceTier::NotRelevant => "not relevant",
        }
    }
}

impl fmt::Display for RelevanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Display view of one search hit, scored relative to the rank-1 hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedDisplay {
    pub rank: u32,
    pub filename: String,
    pub similarity: f64,
    pub normalized_score: f64,
    pub tier: RelevanceTier,
}

/// Rescales similarities so the first (best) result reads 100.
///
/// A non-positive top similarity makes every normalized score 0.
pub fn normalize(results: &[SearchResult]) -> Vec<RankedDisplay> {
    let max_score = results.first().map(|top| top.similarity).unwrap_or(0.0);
    let degenerate = max_score.is_nan() || max_score <= 0.0;

    results
        .iter()
        .map(|result| {
            let normalized_score = if degenerate || !result.similarity.is_finite() {
                0.0
            } else {
                (result.similarity / max_score * 100.0).clamp(0.0, 100.0)
            };

            RankedDisplay {
                rank: result.rank,
                filename: result.filename.clone(),
                similarity: result.similarity,
                normalized_score,
                tier: RelevanceTier::from_normalized(normalized_score),
            }
        })
        .collect()
}
