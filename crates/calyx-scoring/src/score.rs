/// Result types produced by the scoring pipeline.
/// All of these are value objects: created once per evaluation, cached,
/// never mutated afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use calyx_common::confidence::ConfidenceMetrics;

// ---------------------------------------------------------------------------
// Pillar identity
// ---------------------------------------------------------------------------

/// The six scoring dimensions of the rubric. This set is fixed business
/// domain knowledge, not an extension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PillarKind {
    AssetQuality,
    MarketOutlook,
    CapitalIntensity,
    StrategicFit,
    FinancialReadiness,
    RegulatoryRisk,
}

impl PillarKind {
    pub const ALL: [PillarKind; 6] = [
        PillarKind::AssetQuality,
        PillarKind::MarketOutlook,
        PillarKind::CapitalIntensity,
        PillarKind::StrategicFit,
        PillarKind::FinancialReadiness,
        PillarKind::RegulatoryRisk,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PillarKind::AssetQuality       => "asset_quality",
            PillarKind::MarketOutlook      => "market_outlook",
            PillarKind::CapitalIntensity   => "capital_intensity",
            PillarKind::StrategicFit       => "strategic_fit",
            PillarKind::FinancialReadiness => "financial_readiness",
            PillarKind::RegulatoryRisk     => "regulatory_risk",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PillarKind::AssetQuality       => "Asset Quality",
            PillarKind::MarketOutlook      => "Market Outlook",
            PillarKind::CapitalIntensity   => "Capital Intensity",
            PillarKind::StrategicFit       => "Strategic Fit",
            PillarKind::FinancialReadiness => "Financial Readiness",
            PillarKind::RegulatoryRisk     => "Regulatory Risk",
        }
    }
}

// ---------------------------------------------------------------------------
// Pillar output
// ---------------------------------------------------------------------------

/// One named factor inside a pillar. Factor weights within a pillar sum
/// to 1.0; factor scores are on the rubric's 1–5 scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedFactor {
    pub name: String,
    pub weight: f64,
    pub score: f64,
}

impl WeightedFactor {
    pub fn new(name: &str, weight: f64, score: f64) -> Self {
        Self {
            name: name.to_string(),
            weight,
            score: score.clamp(1.0, 5.0),
        }
    }
}

/// Score for one pillar of one company. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PillarScore {
    pub pillar: PillarKind,
    /// Weighted factor aggregate, always within [1.0, 5.0].
    pub raw_score: f64,
    /// Confidence in this pillar's score, [0.0, 1.0].
    pub confidence: f64,
    pub factors: Vec<WeightedFactor>,
    pub warnings: Vec<String>,
    pub explanation: String,
}

impl PillarScore {
    /// Aggregate a factor set into a pillar score. The raw score is the
    /// factor-weighted sum clamped to the rubric bounds.
    pub fn from_factors(
        pillar: PillarKind,
        factors: Vec<WeightedFactor>,
        confidence: f64,
        warnings: Vec<String>,
        explanation: String,
    ) -> Self {
        let raw: f64 = factors.iter().map(|f| f.weight * f.score).sum();
        Self {
            pillar,
            raw_score: raw.clamp(1.0, 5.0),
            confidence: confidence.clamp(0.0, 1.0),
            factors,
            warnings,
            explanation,
        }
    }
}

/// Outcome of a pillar's input validation pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    /// Fraction of the pillar's inputs that were present, [0.0, 1.0].
    pub completeness: f64,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn valid(completeness: f64) -> Self {
        Self { is_valid: true, completeness: completeness.clamp(0.0, 1.0), errors: vec![], warnings: vec![] }
    }
}

/// Human-oriented breakdown of a pillar score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    pub summary: String,
    /// (factor name, weighted contribution to the pillar score)
    pub factor_contributions: Vec<(String, f64)>,
    pub methodology: String,
    pub limitations: Vec<String>,
}

// ---------------------------------------------------------------------------
// Derived classifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentRecommendation {
    StrongSell,
    Sell,
    Hold,
    Buy,
    StrongBuy,
}

impl InvestmentRecommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvestmentRecommendation::StrongSell => "strong_sell",
            InvestmentRecommendation::Sell       => "sell",
            InvestmentRecommendation::Hold       => "hold",
            InvestmentRecommendation::Buy        => "buy",
            InvestmentRecommendation::StrongBuy  => "strong_buy",
        }
    }

    /// One bucket more conservative; StrongSell stays put.
    pub fn demoted(self) -> Self {
        match self {
            InvestmentRecommendation::StrongBuy  => InvestmentRecommendation::Buy,
            InvestmentRecommendation::Buy        => InvestmentRecommendation::Hold,
            InvestmentRecommendation::Hold       => InvestmentRecommendation::Sell,
            InvestmentRecommendation::Sell       => InvestmentRecommendation::StrongSell,
            InvestmentRecommendation::StrongSell => InvestmentRecommendation::StrongSell,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low      => "low",
            RiskLevel::Medium   => "medium",
            RiskLevel::High     => "high",
            RiskLevel::VeryHigh => "very_high",
        }
    }

    /// One level riskier; VeryHigh stays put.
    pub fn bumped(self) -> Self {
        match self {
            RiskLevel::Low      => RiskLevel::Medium,
            RiskLevel::Medium   => RiskLevel::High,
            RiskLevel::High     => RiskLevel::VeryHigh,
            RiskLevel::VeryHigh => RiskLevel::VeryHigh,
        }
    }
}

// ---------------------------------------------------------------------------
// Final result
// ---------------------------------------------------------------------------

/// Per-pillar share of the overall score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PillarContribution {
    pub pillar: PillarKind,
    pub weight: f64,
    pub raw_score: f64,
    /// weight × raw_score
    pub contribution: f64,
}

/// Complete evaluation of one company. Value object; cached by the result
/// cache and never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringResult {
    pub company_id: Uuid,
    pub company_name: String,
    /// Weighted overall score, clamped to [0.0, 5.0].
    pub overall_score: f64,
    /// All six pillars, in `PillarKind::ALL` order.
    pub pillar_scores: Vec<PillarScore>,
    pub contributions: Vec<PillarContribution>,
    pub confidence: ConfidenceMetrics,
    /// Never empty.
    pub recommendations: Vec<String>,
    pub recommendation: InvestmentRecommendation,
    pub risk_level: RiskLevel,
    pub evaluated_at: DateTime<Utc>,
}

impl ScoringResult {
    pub fn pillar(&self, kind: PillarKind) -> Option<&PillarScore> {
        self.pillar_scores.iter().find(|p| p.pillar == kind)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pillar_score_clamped_to_rubric() {
        let factors = vec![WeightedFactor::new("a", 1.0, 5.0)];
        let s = PillarScore::from_factors(
            PillarKind::AssetQuality, factors, 1.4, vec![], String::new(),
        );
        assert!(s.raw_score <= 5.0);
        assert!(s.confidence <= 1.0);
    }

    #[test]
    fn test_weighted_factor_score_bounds() {
        let f = WeightedFactor::new("runway", 0.3, 0.2);
        assert!((f.score - 1.0).abs() < 1e-9);
        let f = WeightedFactor::new("runway", 0.3, 9.0);
        assert!((f.score - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_recommendation_demotion_saturates() {
        assert_eq!(InvestmentRecommendation::StrongBuy.demoted(), InvestmentRecommendation::Buy);
        assert_eq!(InvestmentRecommendation::StrongSell.demoted(), InvestmentRecommendation::StrongSell);
    }

    #[test]
    fn test_risk_bump_saturates() {
        assert_eq!(RiskLevel::Low.bumped(), RiskLevel::Medium);
        assert_eq!(RiskLevel::VeryHigh.bumped(), RiskLevel::VeryHigh);
    }

    #[test]
    fn test_recommendation_ordering() {
        assert!(InvestmentRecommendation::StrongBuy > InvestmentRecommendation::Hold);
        assert!(RiskLevel::VeryHigh > RiskLevel::Low);
    }
}
