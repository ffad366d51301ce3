//! Reference-company archetypes used to calibrate and test the rubric.
//!
//! Three quality tiers: a well-funded late-clinical company, a credible
//! mid-stage company with gaps, and a thinly documented preclinical company
//! with a critical runway. The engine's tuning constants are calibrated so
//! these land in descending recommendation buckets.

use chrono::Duration;

use calyx_common::company::{
    CompanyRecord, DevelopmentStage, Financials, FundingRound, MarketDynamics, MarketProfile,
    Milestone, Program, RegulatoryProfile,
};
use calyx_common::market::MockMarketContextProvider;

fn program(
    name: &str,
    indication: &str,
    stage: DevelopmentStage,
    mechanism: Option<&str>,
    milestone_months_out: Option<i64>,
    as_of: chrono::DateTime<chrono::Utc>,
) -> Program {
    let mut p = Program::new(name, indication, stage);
    p.mechanism = mechanism.map(str::to_string);
    p.next_milestone = milestone_months_out.map(|months| Milestone {
        description: "next readout".to_string(),
        expected: Some(as_of + Duration::days(months * 30)),
    });
    p
}

/// Late-clinical, well-capitalized, regulatory traction.
pub fn high_quality_company() -> CompanyRecord {
    let company = CompanyRecord::new("Meridian Therapeutics");
    let as_of = company.as_of;
    company
        .with_pipeline(vec![
            program("MER-101", "NSCLC", DevelopmentStage::Phase3, Some("KRAS G12C inhibitor"), Some(9), as_of),
            program("MER-102", "CRC", DevelopmentStage::Phase2, Some("SHP2 inhibitor"), Some(14), as_of),
            program("MER-103", "PDAC", DevelopmentStage::Phase1, Some("SOS1 inhibitor"), Some(20), as_of),
            program("MER-104", "AML", DevelopmentStage::Preclinical, None, None, as_of),
        ])
        .with_financials(
            Financials::new(250_000_000.0, 6_000_000.0).with_last_funding(FundingRound {
                label: "Series C".to_string(),
                amount_usd: 150_000_000.0,
                closed_at: as_of - Duration::days(120),
            }),
        )
        .with_market(MarketProfile {
            addressable_market_usd: Some(12_000_000_000.0),
            competitor_count: Some(4),
            dynamics: Some(MarketDynamics::Expanding),
        })
        .with_regulatory(RegulatoryProfile {
            approvals: 0,
            active_trials: 4,
            designations: vec!["fast-track".to_string(), "orphan".to_string()],
            strategy: Some("accelerated approval on ORR endpoint".to_string()),
        })
}

/// Mid-stage company with real assets and real gaps.
pub fn medium_quality_company() -> CompanyRecord {
    let company = CompanyRecord::new("Oxbow Biosciences");
    let as_of = company.as_of;
    company
        .with_pipeline(vec![
            program("OXB-201", "IPF", DevelopmentStage::Phase2, Some("galectin-3 inhibitor"), Some(12), as_of),
            program("OXB-202", "NASH", DevelopmentStage::Phase1, None, None, as_of),
        ])
        .with_financials(
            Financials::new(40_000_000.0, 2_500_000.0).with_last_funding(FundingRound {
                label: "Series B".to_string(),
                amount_usd: 55_000_000.0,
                closed_at: as_of - Duration::days(540),
            }),
        )
        .with_market(MarketProfile {
            addressable_market_usd: Some(1_500_000_000.0),
            competitor_count: Some(8),
            dynamics: Some(MarketDynamics::Stable),
        })
        .with_regulatory(RegulatoryProfile {
            approvals: 0,
            active_trials: 1,
            designations: vec![],
            strategy: Some("standard 505(b)(1)".to_string()),
        })
}

/// Thinly documented preclinical company at a critical runway
/// ($15M cash, $5M/month burn — three months).
pub fn low_quality_company() -> CompanyRecord {
    CompanyRecord::new("Halcyon Biolabs")
        .with_pipeline(vec![Program::new("HAL-1", "GBM", DevelopmentStage::Preclinical)])
        .with_financials(Financials::new(15_000_000.0, 5_000_000.0))
}

/// A reasonably grounded market context shared by the fixtures.
pub fn reference_market() -> MockMarketContextProvider {
    MockMarketContextProvider::new()
        .with_benchmark("median_phase2_raise_usd", 60_000_000.0, 42)
        .with_benchmark("median_phase3_raise_usd", 120_000_000.0, 28)
        .with_benchmark("median_tam_oncology_usd", 8_000_000_000.0, 55)
        .with_comparable("Verdane Tx", 0.85)
        .with_comparable("Helio Bio", 0.70)
        .with_data_quality(0.8)
}

// ── Tests ───────────────────────────────────────────────────────────────────
