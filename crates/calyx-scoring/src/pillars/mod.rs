//! The six rubric pillars.
//!
//! Each pillar validates its required inputs and computes a bounded score
//! with confidence and rationale. Pillars are pure functions of
//! (company, market context, pillar-internal constants): no side effects,
//! no shared state, so the engine can fan them out in any order.
//!
//! The pillar set is closed: `all_pillars()` returns exactly six registered
//! implementations and nothing else is expected to implement the trait.

pub mod asset_quality;
pub mod market_outlook;
pub mod capital_intensity;
pub mod strategic_fit;
pub mod financial_readiness;
pub mod regulatory_risk;

use calyx_common::company::CompanyRecord;
use calyx_common::error::Result;
use calyx_common::market::MarketContext;

use crate::score::{Explanation, PillarKind, PillarScore, ValidationResult};

pub use asset_quality::AssetQualityPillar;
pub use market_outlook::MarketOutlookPillar;
pub use capital_intensity::CapitalIntensityPillar;
pub use strategic_fit::StrategicFitPillar;
pub use financial_readiness::FinancialReadinessPillar;
pub use regulatory_risk::RegulatoryRiskPillar;

// ── Trait ───────────────────────────────────────────────────────────────────

/// One scoring dimension of the rubric.
pub trait Pillar: Send + Sync {
    fn kind(&self) -> PillarKind;

    /// Fields this pillar cannot score without.
    fn required_fields(&self) -> &'static [&'static str];

    /// Fixed methodology-reliability constant for this pillar, [0, 1].
    /// Reflects how well the pillar's rules are validated, not the data.
    fn methodology_reliability(&self) -> f64;

    /// Check required/optional inputs. Never fails; reports problems.
    fn validate(&self, company: &CompanyRecord) -> ValidationResult;

    /// Compute the pillar score. Fails with `InvalidData` when a required
    /// field is missing or a quantity is nonsensical.
    fn score(&self, company: &CompanyRecord, ctx: &MarketContext) -> Result<PillarScore>;

    /// Break a score down for a human reader.
    fn explain(&self, score: &PillarScore) -> Explanation {
        let factor_contributions = score
            .factors
            .iter()
            .map(|f| (f.name.clone(), f.weight * f.score))
            .collect();
        let mut methodology = format!(
            "{}: deterministic piecewise scoring over fixed business-rule breakpoints; \
             factor weights sum to 1.0",
            self.kind().display_name()
        );
        if !self.required_fields().is_empty() {
            methodology.push_str(&format!("; requires {}", self.required_fields().join(", ")));
        }
        Explanation {
            summary: score.explanation.clone(),
            factor_contributions,
            methodology,
            limitations: score.warnings.clone(),
        }
    }
}

/// The closed pillar registry, in `PillarKind::ALL` order.
pub fn all_pillars() -> Vec<Box<dyn Pillar>> {
    vec![
        Box::new(AssetQualityPillar),
        Box::new(MarketOutlookPillar),
        Box::new(CapitalIntensityPillar),
        Box::new(StrategicFitPillar),
        Box::new(FinancialReadinessPillar),
        Box::new(RegulatoryRiskPillar),
    ]
}

// ── Shared scoring helpers ──────────────────────────────────────────────────

/// Piecewise-linear mapping of a raw quantity onto the 1–5 rubric scale.
///
/// `breakpoints` are (input, score) pairs in ascending input order. Inputs
/// below the first breakpoint take its score; above the last, the last's.
/// Between breakpoints the score is interpolated linearly.
pub(crate) fn breakpoint_score(value: f64, breakpoints: &[(f64, f64)]) -> f64 {
    debug_assert!(!breakpoints.is_empty());
    let first = breakpoints[0];
    if value <= first.0 {
        return first.1.clamp(1.0, 5.0);
    }
    for pair in breakpoints.windows(2) {
        let (x0, y0) = pair[0];
        let (x1, y1) = pair[1];
        if value <= x1 {
            let t = (value - x0) / (x1 - x0);
            return (y0 + t * (y1 - y0)).clamp(1.0, 5.0);
        }
    }
    breakpoints[breakpoints.len() - 1].1.clamp(1.0, 5.0)
}

/// Per-pillar confidence: blend of the pillar's own data completeness, its
/// fixed methodology-reliability constant, and the externally supplied
/// market-data-quality estimate. Capped so it never exceeds the weakest
/// signal by more than 0.2 — confidence is never invented from nothing.
pub(crate) fn pillar_confidence(completeness: f64, reliability: f64, data_quality: f64) -> f64 {
    let completeness = completeness.clamp(0.0, 1.0);
    let reliability = reliability.clamp(0.0, 1.0);
    let data_quality = data_quality.clamp(0.0, 1.0);
    let blended = 0.5 * completeness + 0.3 * reliability + 0.2 * data_quality;
    let floor = completeness.min(reliability).min(data_quality);
    blended.min(floor + 0.2).clamp(0.0, 1.0)
}

// ── Tests ───────────────────────────────────────────────────────────────────
