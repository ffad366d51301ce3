//! Capital Intensity pillar: how expensive the company is to carry to its
//! next value inflection. Higher scores mean lighter capital needs.

use calyx_common::company::{CompanyRecord, DevelopmentStage};
use calyx_common::error::{CalyxError, Result};
use calyx_common::market::MarketContext;

use crate::pillars::{breakpoint_score, pillar_confidence, Pillar};
use crate::score::{PillarKind, PillarScore, ValidationResult, WeightedFactor};

const W_STAGE_BURDEN: f64 = 0.40;
const W_BURN_SCALE: f64 = 0.30;
const W_FUNDING_DEPTH: f64 = 0.30;

/// Absolute monthly burn in USD, lower is better.
const BURN_BREAKPOINTS: [(f64, f64); 4] =
    [(500_000.0, 5.0), (2_000_000.0, 4.0), (5_000_000.0, 2.5), (10_000_000.0, 1.5)];

/// Last round amount measured in years of current burn.
const FUNDING_DEPTH_BREAKPOINTS: [(f64, f64); 3] = [(0.5, 1.5), (1.0, 3.0), (2.0, 4.5)];

pub struct CapitalIntensityPillar;

impl Pillar for CapitalIntensityPillar {
    fn kind(&self) -> PillarKind {
        PillarKind::CapitalIntensity
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["financials.monthly_burn"]
    }

    fn methodology_reliability(&self) -> f64 {
        0.75
    }

    fn validate(&self, company: &CompanyRecord) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut present = 0usize;
        let tracked = 3usize;

        if company.financials.monthly_burn > 0.0 {
            present += 1;
        } else {
            errors.push("monthly burn must be positive".to_string());
        }
        if !company.pipeline.is_empty() {
            present += 1;
        } else {
            warnings.push("no pipeline; stage burden defaults to mid-range".to_string());
        }
        if company.financials.last_funding.is_some() {
            present += 1;
        } else {
            warnings.push("no funding history; funding depth unknown".to_string());
        }

        ValidationResult {
            is_valid: errors.is_empty(),
            completeness: present as f64 / tracked as f64,
            errors,
            warnings,
        }
    }

    fn score(&self, company: &CompanyRecord, ctx: &MarketContext) -> Result<PillarScore> {
        let validation = self.validate(company);
        if !validation.is_valid {
            return Err(CalyxError::InvalidData(format!(
                "capital_intensity: {}",
                validation.errors.join("; ")
            )));
        }

        let fin = &company.financials;

        // Late clinical stages are the costliest to carry.
        let stage_score = match company.lead_stage() {
            Some(DevelopmentStage::Discovery) | Some(DevelopmentStage::Preclinical) => 4.5,
            Some(DevelopmentStage::Phase1) => 4.0,
            Some(DevelopmentStage::Phase2) => 3.0,
            Some(DevelopmentStage::Phase3) => 1.8,
            Some(DevelopmentStage::Filed) => 3.2,
            Some(DevelopmentStage::Approved) => 3.8,
            None => 3.0,
        };

        let burn_score = breakpoint_score(fin.monthly_burn, &BURN_BREAKPOINTS);

        let depth_score = match &fin.last_funding {
            Some(round) => {
                let annual_burn = fin.monthly_burn * 12.0;
                breakpoint_score(round.amount_usd / annual_burn, &FUNDING_DEPTH_BREAKPOINTS)
            }
            None => 2.0,
        };

        let factors = vec![
            WeightedFactor::new("Stage Capital Burden", W_STAGE_BURDEN, stage_score),
            WeightedFactor::new("Burn Scale", W_BURN_SCALE, burn_score),
            WeightedFactor::new("Funding Depth", W_FUNDING_DEPTH, depth_score),
        ];

        let confidence = pillar_confidence(
            validation.completeness,
            self.methodology_reliability(),
            ctx.data_quality,
        );

        let explanation = format!(
            "${:.1}M/month burn at {:?} stage",
            fin.monthly_burn / 1e6,
            company.lead_stage().unwrap_or(DevelopmentStage::Discovery)
        );

        Ok(PillarScore::from_factors(
            PillarKind::CapitalIntensity,
            factors,
            confidence,
            validation.warnings,
            explanation,
        ))
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use calyx_common::company::{Financials, FundingRound, Program};
    use chrono::{Duration, Utc};

    #[test]
    fn test_lean_preclinical_outscores_heavy_phase3() {
        let lean = CompanyRecord::new("LeanBio")
            .with_pipeline(vec![Program::new("L-1", "AML", DevelopmentStage::Preclinical)])
            .with_financials(Financials::new(20_000_000.0, 800_000.0));
        let heavy = CompanyRecord::new("HeavyBio")
            .with_pipeline(vec![Program::new("H-1", "NSCLC", DevelopmentStage::Phase3)])
            .with_financials(Financials::new(200_000_000.0, 12_000_000.0));

        let ctx = MarketContext::default();
        let lean_score = CapitalIntensityPillar.score(&lean, &ctx).unwrap();
        let heavy_score = CapitalIntensityPillar.score(&heavy, &ctx).unwrap();
        assert!(lean_score.raw_score > heavy_score.raw_score);
    }

    #[test]
    fn test_zero_burn_is_invalid() {
        let company = CompanyRecord::new("NoBurn")
            .with_financials(Financials::new(10_000_000.0, 0.0));
        let err = CapitalIntensityPillar.score(&company, &MarketContext::default()).unwrap_err();
        assert!(matches!(err, CalyxError::InvalidData(_)));
    }

    #[test]
    fn test_deep_funding_round_raises_score() {
        let base = Financials::new(50_000_000.0, 2_000_000.0);
        let shallow = CompanyRecord::new("Shallow")
            .with_pipeline(vec![Program::new("S-1", "CRC", DevelopmentStage::Phase1)])
            .with_financials(base.clone());
        let deep = CompanyRecord::new("Deep")
            .with_pipeline(vec![Program::new("D-1", "CRC", DevelopmentStage::Phase1)])
            .with_financials(base.with_last_funding(FundingRound {
                label: "Series B".to_string(),
                amount_usd: 60_000_000.0, // 2.5 years of burn
                closed_at: Utc::now() - Duration::days(90),
            }));

        let ctx = MarketContext::default();
        let shallow_score = CapitalIntensityPillar.score(&shallow, &ctx).unwrap();
        let deep_score = CapitalIntensityPillar.score(&deep, &ctx).unwrap();
        assert!(deep_score.raw_score > shallow_score.raw_score);
    }
}
