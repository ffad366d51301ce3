//! calyx-scoring — Investment-readiness scoring engine.
//! Six-pillar rubric evaluation, weighted aggregation, and result statistics.

pub mod weights;
pub mod score;
pub mod pillars;
pub mod engine;
pub mod config;
pub mod stats;

pub use weights::WeightConfig;
pub use score::{
    PillarKind, PillarScore, WeightedFactor, ValidationResult, Explanation,
    ScoringResult, PillarContribution, InvestmentRecommendation, RiskLevel,
};
pub use engine::ScoringEngine;
pub use config::EngineConfig;
pub use stats::{scoring_statistics, ScoringStatistics};
