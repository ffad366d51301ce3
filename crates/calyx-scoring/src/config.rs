//! Engine tuning constants.
//!
//! The confidence blend weights, smoothing factor, model-accuracy constant,
//! and recommendation thresholds are calibration points, not code: they can
//! be loaded from YAML/JSON and adjusted against the reference-company
//! fixtures without touching the scoring rules.

use serde::{Deserialize, Serialize};

use calyx_common::confidence::ConfidenceBlend;

use crate::score::InvestmentRecommendation;

/// Tunable constants for the scoring engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub blend: ConfidenceBlend,

    /// Fixed methodology-stability constant, reflecting how much historical
    /// validation exists for this methodology version.
    #[serde(default = "default_model_accuracy")]
    pub model_accuracy: f64,

    #[serde(default)]
    pub thresholds: RecommendationThresholds,

    /// Overall confidence below this pushes the risk level up one notch.
    #[serde(default = "default_low_confidence_floor")]
    pub low_confidence_floor: f64,
}

fn default_model_accuracy() -> f64 { 0.75 }
fn default_low_confidence_floor() -> f64 { 0.40 }

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            blend: ConfidenceBlend::default(),
            model_accuracy: default_model_accuracy(),
            thresholds: RecommendationThresholds::default(),
            low_confidence_floor: default_low_confidence_floor(),
        }
    }
}

impl EngineConfig {
    /// Load from YAML file
    pub fn from_yaml(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load from JSON file
    pub fn from_json(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }
}

/// Score buckets for the investment recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationThresholds {
    #[serde(default = "default_strong_buy")]
    pub strong_buy: f64,
    #[serde(default = "default_buy")]
    pub buy: f64,
    #[serde(default = "default_hold")]
    pub hold: f64,
    #[serde(default = "default_sell")]
    pub sell: f64,
}

fn default_strong_buy() -> f64 { 4.5 }
fn default_buy() -> f64 { 3.5 }
fn default_hold() -> f64 { 2.5 }
fn default_sell() -> f64 { 1.5 }

impl Default for RecommendationThresholds {
    fn default() -> Self {
        Self {
            strong_buy: default_strong_buy(),
            buy: default_buy(),
            hold: default_hold(),
            sell: default_sell(),
        }
    }
}

impl RecommendationThresholds {
    pub fn bucket(&self, overall_score: f64) -> InvestmentRecommendation {
        if overall_score >= self.strong_buy {
            InvestmentRecommendation::StrongBuy
        } else if overall_score >= self.buy {
            InvestmentRecommendation::Buy
        } else if overall_score >= self.hold {
            InvestmentRecommendation::Hold
        } else if overall_score >= self.sell {
            InvestmentRecommendation::Sell
        } else {
            InvestmentRecommendation::StrongSell
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
