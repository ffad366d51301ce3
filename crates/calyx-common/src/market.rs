//! Market context abstraction.
//!
//! Provides the benchmark and comparable-company data an evaluation runs
//! against, without coupling the scoring crates to any particular data
//! source. Implementations can back onto a live comparable-transaction
//! service, a warehouse extract, or mock data for tests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::company::CompanyRecord;

/// Point-in-time market context supplied per evaluation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketContext {
    pub benchmarks: Vec<Benchmark>,
    pub comparables: Vec<ComparableCompany>,
    pub conditions: MarketConditions,
    /// Externally supplied estimate of how trustworthy this context is, [0, 1].
    pub data_quality: f64,
    pub as_of: DateTime<Utc>,
}

impl Default for MarketContext {
    fn default() -> Self {
        Self {
            benchmarks: Vec::new(),
            comparables: Vec::new(),
            conditions: MarketConditions::Neutral,
            data_quality: 0.5,
            as_of: Utc::now(),
        }
    }
}

/// A single industry benchmark metric (e.g. median Phase 2 deal size).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Benchmark {
    pub metric: String,
    pub value: f64,
    /// Number of observations behind the benchmark.
    pub cohort_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparableCompany {
    pub name: String,
    pub relevance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketConditions {
    Favorable,
    Neutral,
    Adverse,
}

// ── Provider trait ──────────────────────────────────────────────────────────

/// Trait for supplying market context per company.
///
/// Implementations can use:
/// - A comparable-transaction search service (remote)
/// - A warehouse extract (local)
/// - Mock data (testing)
pub trait MarketContextProvider: Send + Sync {
    fn market_context(&self, company: &CompanyRecord) -> MarketContext;
}

// ── Mock implementation for testing ─────────────────────────────────────────

/// Mock provider returning a fixed context for unit tests.
#[derive(Debug, Clone, Default)]
pub struct MockMarketContextProvider {
    ctx: MarketContext,
}

impl MockMarketContextProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_benchmark(mut self, metric: &str, value: f64, cohort_size: u32) -> Self {
        self.ctx.benchmarks.push(Benchmark {
            metric: metric.to_string(),
            value,
            cohort_size,
        });
        self
    }

    pub fn with_comparable(mut self, name: &str, relevance: f64) -> Self {
        self.ctx.comparables.push(ComparableCompany { name: name.to_string(), relevance });
        self
    }

    pub fn with_data_quality(mut self, data_quality: f64) -> Self {
        self.ctx.data_quality = data_quality;
        self
    }

    pub fn with_conditions(mut self, conditions: MarketConditions) -> Self {
        self.ctx.conditions = conditions;
        self
    }
}

impl MarketContextProvider for MockMarketContextProvider {
    fn market_context(&self, _company: &CompanyRecord) -> MarketContext {
        self.ctx.clone()
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_provider_returns_configured_context() {
        let provider = MockMarketContextProvider::new()
            .with_benchmark("median_phase2_deal_usd", 45_000_000.0, 30)
            .with_comparable("Verdane Tx", 0.8)
            .with_data_quality(0.9);

        let ctx = provider.market_context(&CompanyRecord::new("Acme Bio"));
        assert_eq!(ctx.benchmarks.len(), 1);
        assert_eq!(ctx.comparables.len(), 1);
        assert!((ctx.data_quality - 0.9).abs() < 1e-9);
    }
}
