//! Financial Readiness pillar.
//!
//! Six factors: Cash Position, Burn-Rate Efficiency, Funding Runway,
//! Data Freshness, Capital Intensity, Financing-Need Timing. Factor
//! weights sum to 1.0. Runway is the dominant signal: a company at or
//! below four months of runway scores below 2.0 on that factor and gets
//! a critical warning.

use calyx_common::company::{CompanyRecord, DevelopmentStage};
use calyx_common::error::{CalyxError, Result};
use calyx_common::market::MarketContext;

use crate::pillars::{breakpoint_score, pillar_confidence, Pillar};
use crate::score::{PillarKind, PillarScore, ValidationResult, WeightedFactor};

const W_CASH_POSITION: f64 = 0.20;
const W_BURN_EFFICIENCY: f64 = 0.15;
const W_FUNDING_RUNWAY: f64 = 0.30;
const W_DATA_FRESHNESS: f64 = 0.10;
const W_CAPITAL_INTENSITY: f64 = 0.15;
const W_FINANCING_TIMING: f64 = 0.10;

/// Runway in months → rubric score. 24+ months is fully funded; anything
/// at or under 4 months is critical.
const RUNWAY_BREAKPOINTS: [(f64, f64); 4] = [(0.0, 1.0), (4.0, 1.8), (12.0, 3.0), (24.0, 5.0)];
const CRITICAL_RUNWAY_MONTHS: f64 = 4.0;

const CASH_BREAKPOINTS: [(f64, f64); 4] =
    [(1_000_000.0, 1.5), (10_000_000.0, 2.5), (50_000_000.0, 4.0), (200_000_000.0, 5.0)];

/// Monthly burn per active program, lower is better.
const BURN_PER_PROGRAM_BREAKPOINTS: [(f64, f64); 4] =
    [(500_000.0, 5.0), (1_000_000.0, 4.0), (3_000_000.0, 3.0), (8_000_000.0, 1.5)];

/// Months since the last funding round closed.
const FRESHNESS_BREAKPOINTS: [(f64, f64); 4] = [(6.0, 5.0), (12.0, 4.0), (24.0, 2.5), (36.0, 1.5)];

pub struct FinancialReadinessPillar;

impl Pillar for FinancialReadinessPillar {
    fn kind(&self) -> PillarKind {
        PillarKind::FinancialReadiness
    }

    fn required_fields(&self) -> &'static [&'static str] {
        &["financials.cash_position", "financials.monthly_burn"]
    }

    fn methodology_reliability(&self) -> f64 {
        0.85
    }

    fn validate(&self, company: &CompanyRecord) -> ValidationResult {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();
        let mut present = 0usize;
        let tracked = 4usize;

        if company.financials.cash_position > 0.0 {
            present += 1;
        } else {
            errors.push("cash position must be positive".to_string());
        }
        if company.financials.monthly_burn > 0.0 {
            present += 1;
        } else {
            errors.push("monthly burn must be positive".to_string());
        }
        if company.financials.last_funding.is_some() {
            present += 1;
        } else {
            warnings.push("no funding history on record".to_string());
        }
        if company.pipeline.iter().any(|p| p.next_milestone.is_some()) {
            present += 1;
        } else {
            warnings.push("no pipeline milestones to anchor financing timing".to_string());
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
                "financial_readiness: {}",
                validation.errors.join("; ")
            )));
        }

        let fin = &company.financials;
        let mut warnings = validation.warnings.clone();

        // Runway is guaranteed defined by validation (burn > 0).
        let runway = fin.runway_months().ok_or_else(|| {
            CalyxError::Calculation("runway undefined despite positive burn".to_string())
        })?;
        let runway_score = breakpoint_score(runway, &RUNWAY_BREAKPOINTS);
        if runway <= CRITICAL_RUNWAY_MONTHS {
            warnings.push(format!(
                "Critical: funding runway of {runway:.1} months at current burn"
            ));
        } else if runway < 12.0 {
            warnings.push(format!("Runway under 12 months ({runway:.1}); financing needed soon"));
        }

        let cash_score = breakpoint_score(fin.cash_position, &CASH_BREAKPOINTS);

        let programs = company.pipeline.len().max(1) as f64;
        let burn_score = breakpoint_score(fin.monthly_burn / programs, &BURN_PER_PROGRAM_BREAKPOINTS);

        let freshness_score = match &fin.last_funding {
            Some(round) => {
                let months = (company.as_of - round.closed_at).num_days() as f64 / 30.44;
                breakpoint_score(months.max(0.0), &FRESHNESS_BREAKPOINTS)
            }
            None => 2.0,
        };

        let intensity_score = match company.lead_stage() {
            Some(DevelopmentStage::Discovery) | Some(DevelopmentStage::Preclinical) => 4.5,
            Some(DevelopmentStage::Phase1) => 4.0,
            Some(DevelopmentStage::Phase2) => 3.0,
            Some(DevelopmentStage::Phase3) => 2.0,
            Some(DevelopmentStage::Filed) => 3.0,
            Some(DevelopmentStage::Approved) => 3.5,
            None => 2.5,
        };

        let timing_score = financing_timing_score(company, runway, &mut warnings);

        let factors = vec![
            WeightedFactor::new("Cash Position", W_CASH_POSITION, cash_score),
            WeightedFactor::new("Burn-Rate Efficiency", W_BURN_EFFICIENCY, burn_score),
            WeightedFactor::new("Funding Runway", W_FUNDING_RUNWAY, runway_score),
            WeightedFactor::new("Data Freshness", W_DATA_FRESHNESS, freshness_score),
            WeightedFactor::new("Capital Intensity", W_CAPITAL_INTENSITY, intensity_score),
            WeightedFactor::new("Financing-Need Timing", W_FINANCING_TIMING, timing_score),
        ];

        let confidence = pillar_confidence(
            validation.completeness,
            self.methodology_reliability(),
            ctx.data_quality,
        );

        let explanation = format!(
            "{:.1} months of runway on ${:.1}M cash at ${:.1}M/month burn",
            runway,
            fin.cash_position / 1e6,
            fin.monthly_burn / 1e6
        );

        Ok(PillarScore::from_factors(
            PillarKind::FinancialReadiness,
            factors,
            confidence,
            warnings,
            explanation,
        ))
    }
}

/// Can the company reach its next milestone before the cash runs out?
fn financing_timing_score(company: &CompanyRecord, runway: f64, warnings: &mut Vec<String>) -> f64 {
    let next = company
        .pipeline
        .iter()
        .filter_map(|p| p.next_milestone.as_ref())
        .filter_map(|m| m.expected)
        .min();

    match next {
        Some(expected) => {
            let months_out = (expected - company.as_of).num_days() as f64 / 30.44;
            if months_out <= 0.0 {
                3.0
            } else if runway >= months_out + 3.0 {
                4.5
            } else if runway >= months_out {
                3.5
            } else {
                warnings.push("Financing needed before next pipeline milestone".to_string());
                1.8
            }
        }
        None => 3.0,
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
