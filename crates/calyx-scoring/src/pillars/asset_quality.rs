//! Asset Quality pillar: depth, maturity, and differentiation of the pipeline.

use calyx_common::company::CompanyRecord;
use calyx_common::error::{CalyxError, Result};
use calyx_common::market::MarketContext;

use crate::pillars::{breakpoint_score, pillar_confidence, Pillar};
use crate::score::{PillarKind, PillarScore, ValidationResult, WeightedFactor};

const W_PIPELINE_DEPTH: f64 = 0.20;
const W_LEAD_MATURITY: f64 = 0.30;
const W_MECHANISM_DIFF: f64 = 0.20;
const W_INDICATION_DIVERSITY: f64 = 0.15;
const W_RISK_PROFILE: f64 = 0.15;

const DEPTH_BREAKPOINTS: [(f64, f64); 3] = [(1.0, 2.5), (2.0, 3.5), (4.0, 5.0)];
const DIVERSITY_BREAKPOINTS: [(f64, f64); 3] = [(1.0, 2.5), (3.0, 4.0), (5.0, 5.0)];
/// Average documented risks per program, fewer is better.
const RISK_BREAKPOINTS: [(f64, f64); 3] = [(0.0, 4.5), (2.0, 3.0), (5.0, 1.5)];

pub struct AssetQualityPillar;

impl Pillar for AssetQualityPillar {
    fn kind(&self) -> PillarKind {
        PillarKind::AssetQuality
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["pipeline"]
    }

    fn methodology_reliability(&self) -> f64 {
        0.80
    }

    fn validate(&self, company: &CompanyRecord) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut present = 0usize;
        let tracked = 3usize;

        if company.pipeline.is_empty() {
            errors.push("pipeline is empty".to_string());
        } else {
            present += 1;
        }
        if company.pipeline.iter().any(|p| p.mechanism.is_some()) {
            present += 1;
        } else {
            warnings.push("no program mechanisms documented".to_string());
        }
        if company.pipeline.iter().any(|p| !p.risks.is_empty()) {
            present += 1;
        } else {
            warnings.push("no program risks documented; risk profile may be optimistic".to_string());
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
                "asset_quality: {}",
                validation.errors.join("; ")
            )));
        }

        let programs = &company.pipeline;
        let n = programs.len() as f64;

        let depth_score = breakpoint_score(n, &DEPTH_BREAKPOINTS);

        // Validation guarantees a non-empty pipeline.
        let maturity_score = company
            .lead_stage()
            .map(|s| s.maturity_score())
            .ok_or_else(|| CalyxError::Calculation("empty pipeline past validation".to_string()))?;

        let with_mechanism = programs.iter().filter(|p| p.mechanism.is_some()).count() as f64;
        let mechanism_score = 2.0 + 2.5 * (with_mechanism / n);

        let distinct_indications = {
            let mut v: Vec<&str> = programs.iter().map(|p| p.indication.as_str()).collect();
            v.sort_unstable();
            v.dedup();
            v.len() as f64
        };
        let diversity_score = breakpoint_score(distinct_indications, &DIVERSITY_BREAKPOINTS);

        let avg_risks = programs.iter().map(|p| p.risks.len()).sum::<usize>() as f64 / n;
        let risk_score = breakpoint_score(avg_risks, &RISK_BREAKPOINTS);

        let factors = vec![
            WeightedFactor::new("Pipeline Depth", W_PIPELINE_DEPTH, depth_score),
            WeightedFactor::new("Lead Program Maturity", W_LEAD_MATURITY, maturity_score),
            WeightedFactor::new("Mechanism Differentiation", W_MECHANISM_DIFF, mechanism_score),
            WeightedFactor::new("Indication Diversity", W_INDICATION_DIVERSITY, diversity_score),
            WeightedFactor::new("Program Risk Profile", W_RISK_PROFILE, risk_score),
        ];

        let confidence = pillar_confidence(
            validation.completeness,
            self.methodology_reliability(),
            ctx.data_quality,
        );

        let lead = company
            .lead_stage()
            .unwrap_or(calyx_common::company::DevelopmentStage::Discovery);
        let explanation = format!(
            "{} program(s) across {} indication(s), lead at {lead:?}",
            programs.len(),
            distinct_indications as usize,
        );

        Ok(PillarScore::from_factors(
            PillarKind::AssetQuality,
            factors,
            confidence,
            validation.warnings,
            explanation,
        ))
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
