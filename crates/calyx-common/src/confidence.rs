/// Confidence blending for scoring results.
///
/// Overall confidence is a weighted blend of three components — data
/// completeness, model accuracy, comparable quality — and is never allowed
/// to exceed the weakest component by more than a fixed smoothing factor.
/// Unavailable inputs lower confidence; they are never defaulted upward.

use serde::{Deserialize, Serialize};

/// Confidence attached to a scoring result. All fields in [0.0, 1.0].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceMetrics {
    pub overall: f64,
    /// Weight-averaged per-pillar data completeness.
    pub data_completeness: f64,
    /// Stability of the methodology for the data volume seen.
    pub model_accuracy: f64,
    /// Adequacy of market-context benchmarks.
    pub comparable_quality: f64,
}

/// Blend weights and smoothing cap for the three confidence components.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceBlend {
    pub completeness_weight: f64,
    pub model_weight: f64,
    pub comparable_weight: f64,
    /// Overall may exceed the minimum component by at most this much.
    pub smoothing: f64,
}

impl Default for ConfidenceBlend {
    fn default() -> Self {
        Self {
            completeness_weight: 0.50,
            model_weight: 0.30,
            comparable_weight: 0.20,
            smoothing: 0.15,
        }
    }
}

/// Blend the three confidence components into overall confidence.
/// Returns metrics with every field clamped to [0.0, 1.0].
pub fn blend_confidence(
    data_completeness: f64,
    model_accuracy: f64,
    comparable_quality: f64,
    blend: &ConfidenceBlend,
) -> ConfidenceMetrics {
    let completeness = data_completeness.clamp(0.0, 1.0);
    let model = model_accuracy.clamp(0.0, 1.0);
    let comparable = comparable_quality.clamp(0.0, 1.0);

    let weighted = completeness * blend.completeness_weight
        + model * blend.model_weight
        + comparable * blend.comparable_weight;

    let floor = completeness.min(model).min(comparable);
    let overall = weighted.min(floor + blend.smoothing).clamp(0.0, 1.0);

    ConfidenceMetrics {
        overall,
        data_completeness: completeness,
        model_accuracy: model,
        comparable_quality: comparable,
    }
}

/// Comparable quality from benchmark volume.
/// Zero benchmarks means low quality, not zero; quality saturates as the
/// benchmark set grows past a useful size.
pub fn comparable_quality_from_counts(benchmark_count: usize, comparable_count: usize) -> f64 {
    if benchmark_count == 0 && comparable_count == 0 {
        return 0.20;
    }
    let n = (benchmark_count + comparable_count) as f64;
    // Saturates around 10 observations.
    (0.20 + 0.80 * (n / (n + 10.0)) * 2.0).min(1.0)
}

// ── Tests ───────────────────────────────────────────────────────────────────
