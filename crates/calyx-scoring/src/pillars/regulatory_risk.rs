//! Regulatory Risk pillar. Scored on the readiness rubric's orientation:
//! a higher score means a stronger regulatory position (lower risk).

use calyx_common::company::CompanyRecord;
use calyx_common::error::{CalyxError, Result};
use calyx_common::market::MarketContext;

use crate::pillars::{breakpoint_score, pillar_confidence, Pillar};
use crate::score::{PillarKind, PillarScore, ValidationResult, WeightedFactor};

const W_APPROVAL_RECORD: f64 = 0.30;
const W_CLINICAL_ACTIVITY: f64 = 0.25;
const W_DESIGNATIONS: f64 = 0.25;
const W_STRATEGY: f64 = 0.20;

const APPROVAL_BREAKPOINTS: [(f64, f64); 3] = [(0.0, 2.5), (1.0, 4.0), (3.0, 5.0)];
const TRIAL_BREAKPOINTS: [(f64, f64); 3] = [(0.0, 2.0), (2.0, 3.5), (6.0, 4.8)];
const DESIGNATION_BREAKPOINTS: [(f64, f64); 3] = [(0.0, 2.5), (1.0, 3.8), (3.0, 5.0)];

pub struct RegulatoryRiskPillar;

impl Pillar for RegulatoryRiskPillar {
    fn kind(&self) -> PillarKind {
        PillarKind::RegulatoryRisk
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &[]
    }

    fn methodology_reliability(&self) -> f64 {
        0.80
    }

    fn validate(&self, company: &CompanyRecord) -> ValidationResult {
        let mut warnings = Vec::new();
        let mut present = 0usize;
        let tracked = 2usize;

        if company.regulatory.strategy.is_some() {
            present += 1;
        } else {
            warnings.push("no regulatory strategy documented".to_string());
        }
        if company.regulatory.active_trials > 0 || company.regulatory.approvals > 0 {
            present += 1;
        } else {
            warnings.push("no regulatory track record yet".to_string());
        }

        ValidationResult {
            is_valid: true,
            completeness: present as f64 / tracked as f64,
            errors: vec![],
            warnings,
        }
    }

    fn score(&self, company: &CompanyRecord, ctx: &MarketContext) -> Result<PillarScore> {
        let validation = self.validate(company);
        let reg = &company.regulatory;

        if reg.active_trials > 0 && company.pipeline.is_empty() {
            return Err(CalyxError::InvalidData(
                "regulatory_risk: active trials reported without any pipeline programs".to_string(),
            ));
        }

        let approval_score = breakpoint_score(reg.approvals as f64, &APPROVAL_BREAKPOINTS);
        let trial_score = breakpoint_score(reg.active_trials as f64, &TRIAL_BREAKPOINTS);
        let designation_score =
            breakpoint_score(reg.designations.len() as f64, &DESIGNATION_BREAKPOINTS);
        let strategy_score = if reg.strategy.is_some() { 4.0 } else { 2.0 };

        let factors = vec![
            WeightedFactor::new("Approval Track Record", W_APPROVAL_RECORD, approval_score),
            WeightedFactor::new("Clinical Activity", W_CLINICAL_ACTIVITY, trial_score),
            WeightedFactor::new("Designation Support", W_DESIGNATIONS, designation_score),
            WeightedFactor::new("Strategy Clarity", W_STRATEGY, strategy_score),
        ];

        let confidence = pillar_confidence(
            validation.completeness,
            self.methodology_reliability(),
            ctx.data_quality,
        );

        let explanation = format!(
            "{} approval(s), {} active trial(s), {} designation(s)",
            reg.approvals,
            reg.active_trials,
            reg.designations.len()
        );

        Ok(PillarScore::from_factors(
            PillarKind::RegulatoryRisk,
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
    use calyx_common::company::{DevelopmentStage, Program, RegulatoryProfile};

    #[test]
    fn test_established_position_outscores_blank_slate() {
        let veteran = CompanyRecord::new("VetBio")
            .with_pipeline(vec![Program::new("V-1", "NSCLC", DevelopmentStage::Phase3)])
            .with_regulatory(RegulatoryProfile {
                approvals: 1,
                active_trials: 4,
                designations: vec!["orphan".to_string(), "fast-track".to_string()],
                strategy: Some("505(b)(2) pathway".to_string()),
            });
        let blank = CompanyRecord::new("NewBio");

        let ctx = MarketContext::default();
        let vet_score = RegulatoryRiskPillar.score(&veteran, &ctx).unwrap();
        let blank_score = RegulatoryRiskPillar.score(&blank, &ctx).unwrap();
        assert!(vet_score.raw_score > blank_score.raw_score);
    }

    #[test]
    fn test_trials_without_pipeline_is_invalid() {
        let company = CompanyRecord::new("Ghost").with_regulatory(RegulatoryProfile {
            active_trials: 2,
            ..RegulatoryProfile::default()
        });
        let err = RegulatoryRiskPillar.score(&company, &MarketContext::default()).unwrap_err();
        assert!(matches!(err, CalyxError::InvalidData(_)));
    }

    #[test]
    fn test_missing_strategy_warns() {
        let score = RegulatoryRiskPillar
            .score(&CompanyRecord::new("NewBio"), &MarketContext::default())
            .unwrap();
        assert!(score.warnings.iter().any(|w| w.contains("strategy")));
    }
}
