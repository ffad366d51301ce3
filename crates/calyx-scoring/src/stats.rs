//! Pure reducers over a set of scoring results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::score::ScoringResult;

/// Aggregate view of a result set. Distribution counts always sum to
/// `total_companies`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringStatistics {
    pub total_companies: usize,
    pub average_score: f64,
    pub average_confidence: f64,
    /// Score bucket label ("0-1" … "4-5") → count.
    pub score_distribution: BTreeMap<String, usize>,
    /// Recommendation label → count.
    pub recommendation_distribution: BTreeMap<String, usize>,
}

pub fn scoring_statistics(results: &[ScoringResult]) -> ScoringStatistics {
    let total = results.len();
    if total == 0 {
        return ScoringStatistics {
            total_companies: 0,
            average_score: 0.0,
            average_confidence: 0.0,
            score_distribution: BTreeMap::new(),
            recommendation_distribution: BTreeMap::new(),
        };
    }

    let average_score = results.iter().map(|r| r.overall_score).sum::<f64>() / total as f64;
    let average_confidence =
        results.iter().map(|r| r.confidence.overall).sum::<f64>() / total as f64;

    let mut score_distribution = BTreeMap::new();
    for r in results {
        *score_distribution.entry(score_bucket(r.overall_score)).or_insert(0) += 1;
    }

    let mut recommendation_distribution = BTreeMap::new();
    for r in results {
        *recommendation_distribution
            .entry(r.recommendation.as_str().to_string())
            .or_insert(0) += 1;
    }

    ScoringStatistics {
        total_companies: total,
        average_score,
        average_confidence,
        score_distribution,
        recommendation_distribution,
    }
}

fn score_bucket(score: f64) -> String {
    // A perfect 5.0 lands in the top bucket rather than a phantom "5-6".
    let lo = (score.floor() as i64).clamp(0, 4);
    format!("{lo}-{}", lo + 1)
}

// ── Tests ───────────────────────────────────────────────────────────────────
