/// Core company snapshot types consumed by the scoring engine.
/// A `CompanyRecord` is an immutable point-in-time view assembled by the
/// caller; the engine never mutates it. Derived copies are produced through
/// the `with_*` builders rather than in-place mutation, which keeps the
/// determinism and no-shared-state invariants structurally enforceable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Company
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub id: Uuid,
    pub name: String,
    pub pipeline: Vec<Program>,
    pub financials: Financials,
    pub market: MarketProfile,
    pub regulatory: RegulatoryProfile,
    /// When this snapshot was assembled.
    pub as_of: DateTime<Utc>,
}

impl CompanyRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            pipeline: Vec::new(),
            financials: Financials::default(),
            market: MarketProfile::default(),
            regulatory: RegulatoryProfile::default(),
            as_of: Utc::now(),
        }
    }

    /// Derive a copy with a different name, keeping the same identity.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_pipeline(mut self, pipeline: Vec<Program>) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn with_financials(mut self, financials: Financials) -> Self {
        self.financials = financials;
        self
    }

    pub fn with_market(mut self, market: MarketProfile) -> Self {
        self.market = market;
        self
    }

    pub fn with_regulatory(mut self, regulatory: RegulatoryProfile) -> Self {
        self.regulatory = regulatory;
        self
    }

    /// Most advanced development stage across the pipeline, if any.
    pub fn lead_stage(&self) -> Option<DevelopmentStage> {
        self.pipeline.iter().map(|p| p.stage).max()
    }

    /// Structural problems with this snapshot, all of them. An empty list
    /// means the record is well-formed enough to score.
    pub fn structural_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.name.trim().is_empty() {
            errors.push("company name is empty".to_string());
        }
        if self.pipeline.is_empty() {
            errors.push("pipeline is empty".to_string());
        }
        if self.financials.cash_position < 0.0 {
            errors.push("cash position is negative".to_string());
        }
        if self.financials.monthly_burn < 0.0 {
            errors.push("monthly burn is negative".to_string());
        }
        errors
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    pub name: String,
    pub indication: String,
    pub mechanism: Option<String>,
    pub stage: DevelopmentStage,
    pub risks: Vec<String>,
    pub next_milestone: Option<Milestone>,
}

impl Program {
    pub fn new(name: impl Into<String>, indication: impl Into<String>, stage: DevelopmentStage) -> Self {
        Self {
            name: name.into(),
            indication: indication.into(),
            mechanism: None,
            stage,
            risks: Vec::new(),
            next_milestone: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DevelopmentStage {
    Discovery,
    Preclinical,
    Phase1,
    Phase2,
    Phase3,
    Filed,
    Approved,
}

impl DevelopmentStage {
    /// Maturity on the rubric's 1–5 scale.
    pub fn maturity_score(&self) -> f64 {
        match self {
            DevelopmentStage::Discovery   => 1.0,
            DevelopmentStage::Preclinical => 1.5,
            DevelopmentStage::Phase1      => 2.5,
            DevelopmentStage::Phase2      => 3.5,
            DevelopmentStage::Phase3      => 4.5,
            DevelopmentStage::Filed       => 4.8,
            DevelopmentStage::Approved    => 5.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    pub description: String,
    pub expected: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Financials
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Financials {
    /// Cash and equivalents, USD.
    pub cash_position: f64,
    /// Average monthly burn, USD.
    pub monthly_burn: f64,
    pub last_funding: Option<FundingRound>,
}

impl Financials {
    pub fn new(cash_position: f64, monthly_burn: f64) -> Self {
        Self { cash_position, monthly_burn, last_funding: None }
    }

    pub fn with_last_funding(mut self, round: FundingRound) -> Self {
        self.last_funding = Some(round);
        self
    }

    /// Months of operation remaining at current burn.
    /// None when burn is zero or negative (runway is undefined, not infinite).
    pub fn runway_months(&self) -> Option<f64> {
        if self.monthly_burn > 0.0 && self.cash_position >= 0.0 {
            Some(self.cash_position / self.monthly_burn)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingRound {
    /// e.g. "Series B"
    pub label: String,
    pub amount_usd: f64,
    pub closed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Market profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketProfile {
    /// Total addressable market, USD.
    pub addressable_market_usd: Option<f64>,
    pub competitor_count: Option<u32>,
    pub dynamics: Option<MarketDynamics>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketDynamics {
    Expanding,
    Stable,
    Contracting,
}

// ---------------------------------------------------------------------------
// Regulatory profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegulatoryProfile {
    pub approvals: u32,
    pub active_trials: u32,
    /// Special designations, e.g. "orphan", "fast-track".
    pub designations: Vec<String>,
    pub strategy: Option<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
