//! Market Outlook pillar: addressable market, competition, and benchmark
//! support from the supplied market context.

use calyx_common::company::{CompanyRecord, MarketDynamics};
use calyx_common::error::{CalyxError, Result};
use calyx_common::market::MarketContext;

use crate::pillars::{breakpoint_score, pillar_confidence, Pillar};
use crate::score::{PillarKind, PillarScore, ValidationResult, WeightedFactor};

const W_MARKET_SIZE: f64 = 0.35;
const W_COMPETITION: f64 = 0.25;
const W_DYNAMICS: f64 = 0.20;
const W_BENCHMARKS: f64 = 0.20;

/// Addressable market in USD.
const TAM_BREAKPOINTS: [(f64, f64); 4] =
    [(100_000_000.0, 1.5), (1_000_000_000.0, 3.0), (5_000_000_000.0, 4.0), (10_000_000_000.0, 5.0)];

/// Competitor count, fewer is better.
const COMPETITION_BREAKPOINTS: [(f64, f64); 3] = [(0.0, 5.0), (5.0, 3.5), (20.0, 1.5)];

/// Benchmark volume in the supplied context.
const BENCHMARK_BREAKPOINTS: [(f64, f64); 3] = [(0.0, 2.0), (3.0, 3.5), (8.0, 4.5)];

pub struct MarketOutlookPillar;

impl Pillar for MarketOutlookPillar {
    fn kind(&self) -> PillarKind {
        PillarKind::MarketOutlook
    }

    fn required_fields(&self) -> &'static [&'static str] {
        // All inputs degrade gracefully; nothing is a hard requirement.
        &[]
    }

    fn methodology_reliability(&self) -> f64 {
        0.70
    }

    fn validate(&self, company: &CompanyRecord) -> ValidationResult {
        let mut warnings = Vec::new();
        let mut present = 0usize;
        let tracked = 3usize;

        if company.market.addressable_market_usd.is_some() {
            present += 1;
        } else {
            warnings.push("addressable market size unknown".to_string());
        }
        if company.market.competitor_count.is_some() {
            present += 1;
        } else {
            warnings.push("competitive landscape not assessed".to_string());
        }
        if company.market.dynamics.is_some() {
            present += 1;
        } else {
            warnings.push("market dynamics not assessed".to_string());
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
        let mut warnings = validation.warnings.clone();

        let tam = &company.market.addressable_market_usd;
        if tam.map(|v| v < 0.0).unwrap_or(false) {
            return Err(CalyxError::InvalidData(
                "market_outlook: negative addressable market size".to_string(),
            ));
        }
        let tam_score = match tam {
            Some(v) => breakpoint_score(*v, &TAM_BREAKPOINTS),
            None => 2.0,
        };

        let competition_score = match company.market.competitor_count {
            Some(n) => breakpoint_score(n as f64, &COMPETITION_BREAKPOINTS),
            None => 2.5,
        };

        let dynamics_score = match company.market.dynamics {
            Some(MarketDynamics::Expanding)   => 4.5,
            Some(MarketDynamics::Stable)      => 3.0,
            Some(MarketDynamics::Contracting) => 1.5,
            None                              => 2.5,
        };

        let benchmark_score = breakpoint_score(ctx.benchmarks.len() as f64, &BENCHMARK_BREAKPOINTS);
        if ctx.benchmarks.is_empty() {
            warnings.push("no market benchmarks supplied; outlook is weakly grounded".to_string());
        }

        let factors = vec![
            WeightedFactor::new("Addressable Market Size", W_MARKET_SIZE, tam_score),
            WeightedFactor::new("Competitive Intensity", W_COMPETITION, competition_score),
            WeightedFactor::new("Market Dynamics", W_DYNAMICS, dynamics_score),
            WeightedFactor::new("Benchmark Support", W_BENCHMARKS, benchmark_score),
        ];

        let confidence = pillar_confidence(
            validation.completeness,
            self.methodology_reliability(),
            ctx.data_quality,
        );

        let explanation = match tam {
            Some(v) => format!(
                "${:.1}B addressable market, {} known competitor(s)",
                v / 1e9,
                company.market.competitor_count.unwrap_or(0)
            ),
            None => "addressable market size unknown".to_string(),
        };

        Ok(PillarScore::from_factors(
            PillarKind::MarketOutlook,
            factors,
            confidence,
            warnings,
            explanation,
        ))
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
