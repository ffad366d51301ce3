//! Strategic Fit pillar: platform coherence and partnering potential.

use calyx_common::company::CompanyRecord;
use calyx_common::error::{CalyxError, Result};
use calyx_common::market::MarketContext;

use crate::pillars::{breakpoint_score, pillar_confidence, Pillar};
use crate::score::{PillarKind, PillarScore, ValidationResult, WeightedFactor};

const W_PLATFORM_BREADTH: f64 = 0.25;
const W_INDICATION_FOCUS: f64 = 0.30;
const W_PARTNERING: f64 = 0.25;
const W_MILESTONE_VISIBILITY: f64 = 0.20;

/// Distinct mechanisms in the pipeline.
const BREADTH_BREAKPOINTS: [(f64, f64); 3] = [(0.0, 2.0), (1.0, 3.0), (3.0, 4.5)];

/// Distinct indications per program: lower means a focused thesis.
const FOCUS_BREAKPOINTS: [(f64, f64); 3] = [(0.3, 4.5), (0.6, 3.8), (1.0, 3.0)];

/// Mean relevance of comparable companies in the market context.
const PARTNERING_BREAKPOINTS: [(f64, f64); 3] = [(0.0, 2.0), (0.5, 3.5), (0.9, 5.0)];

pub struct StrategicFitPillar;

impl Pillar for StrategicFitPillar {
    fn kind(&self) -> PillarKind {
        PillarKind::StrategicFit
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["pipeline"]
    }

    fn methodology_reliability(&self) -> f64 {
        0.65
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
            warnings.push("no mechanisms documented; platform breadth unknown".to_string());
        }
        if company.pipeline.iter().any(|p| p.next_milestone.is_some()) {
            present += 1;
        } else {
            warnings.push("no milestones documented; limited forward visibility".to_string());
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
                "strategic_fit: {}",
                validation.errors.join("; ")
            )));
        }

        let programs = &company.pipeline;
        let n = programs.len() as f64;
        let mut warnings = validation.warnings.clone();

        let distinct_mechanisms = {
            let mut v: Vec<&str> = programs
                .iter()
                .filter_map(|p| p.mechanism.as_deref())
                .collect();
            v.sort_unstable();
            v.dedup();
            v.len() as f64
        };
        let breadth_score = breakpoint_score(distinct_mechanisms, &BREADTH_BREAKPOINTS);

        let distinct_indications = {
            let mut v: Vec<&str> = programs.iter().map(|p| p.indication.as_str()).collect();
            v.sort_unstable();
            v.dedup();
            v.len() as f64
        };
        let focus_score = breakpoint_score(distinct_indications / n, &FOCUS_BREAKPOINTS);

        let partnering_score = if ctx.comparables.is_empty() {
            warnings.push("no comparable companies supplied; partnering read is weak".to_string());
            2.2
        } else {
            let mean_relevance: f64 =
                ctx.comparables.iter().map(|c| c.relevance).sum::<f64>() / ctx.comparables.len() as f64;
            breakpoint_score(mean_relevance, &PARTNERING_BREAKPOINTS)
        };

        let with_milestones = programs.iter().filter(|p| p.next_milestone.is_some()).count() as f64;
        let visibility_score = 2.0 + 2.5 * (with_milestones / n);

        let factors = vec![
            WeightedFactor::new("Platform Breadth", W_PLATFORM_BREADTH, breadth_score),
            WeightedFactor::new("Indication Focus", W_INDICATION_FOCUS, focus_score),
            WeightedFactor::new("Partnering Potential", W_PARTNERING, partnering_score),
            WeightedFactor::new("Milestone Visibility", W_MILESTONE_VISIBILITY, visibility_score),
        ];

        let confidence = pillar_confidence(
            validation.completeness,
            self.methodology_reliability(),
            ctx.data_quality,
        );

        let explanation = format!(
            "{} mechanism(s) across {} program(s), {} comparable(s) in context",
            distinct_mechanisms as usize,
            programs.len(),
            ctx.comparables.len()
        );

        Ok(PillarScore::from_factors(
            PillarKind::StrategicFit,
            factors,
            confidence,
            warnings,
            explanation,
        ))
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
