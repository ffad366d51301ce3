//! Pillar weight configuration.
//! Six named weights summing to 1.0, with validation, proportional
//! normalization, and a stable fingerprint for cache keying.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use calyx_common::error::{CalyxError, Result};
use crate::score::PillarKind;

/// Weights must sum to 1.0 within this tolerance.
pub const WEIGHT_SUM_TOLERANCE: f64 = 0.001;

/// Any single pillar above this share triggers a dominance warning.
const DOMINANCE_THRESHOLD: f64 = 0.50;

/// Max/min ratio among non-zero weights above this triggers a disparity warning.
const DISPARITY_RATIO: f64 = 10.0;

/// The six pillar weights for one evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightConfig {
    /// Human-readable configuration name (e.g. "default", "late-stage bias").
    #[serde(default = "default_name")]
    pub name: String,
    pub asset_quality: f64,
    pub market_outlook: f64,
    pub capital_intensity: f64,
    pub strategic_fit: f64,
    pub financial_readiness: f64,
    pub regulatory_risk: f64,
    /// Free-form tuning parameters; participate in the fingerprint.
    #[serde(default)]
    pub custom_params: BTreeMap<String, f64>,
}

fn default_name() -> String { "default".to_string() }

impl Default for WeightConfig {
    /// House default weights. Sum to 1.0.
    fn default() -> Self {
        Self {
            name: default_name(),
            asset_quality:       0.25,
            market_outlook:      0.20,
            capital_intensity:   0.10,
            strategic_fit:       0.10,
            financial_readiness: 0.20,
            regulatory_risk:     0.15,
            custom_params: BTreeMap::new(),
        }
    }
}

impl WeightConfig {
    /// Weights in `PillarKind::ALL` order.
    pub fn as_array(&self) -> [f64; 6] {
        [
            self.asset_quality,
            self.market_outlook,
            self.capital_intensity,
            self.strategic_fit,
            self.financial_readiness,
            self.regulatory_risk,
        ]
    }

    pub fn weight_for(&self, kind: PillarKind) -> f64 {
        match kind {
            PillarKind::AssetQuality       => self.asset_quality,
            PillarKind::MarketOutlook      => self.market_outlook,
            PillarKind::CapitalIntensity   => self.capital_intensity,
            PillarKind::StrategicFit       => self.strategic_fit,
            PillarKind::FinancialReadiness => self.financial_readiness,
            PillarKind::RegulatoryRisk     => self.regulatory_risk,
        }
    }

    pub fn sum(&self) -> f64 {
        self.as_array().iter().sum()
    }

    /// Validate the configuration, accumulating every problem rather than
    /// stopping at the first. Returns advisory warnings on success.
    pub fn validate(&self) -> Result<Vec<String>> {
        let mut errors = Vec::new();

        for (kind, w) in PillarKind::ALL.iter().zip(self.as_array()) {
            if w < 0.0 {
                errors.push(format!("{} weight is negative ({w:.3})", kind.as_str()));
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            errors.push(format!("totalWeight: weights sum to {sum:.3}, expected 1.0"));
        }

        if !errors.is_empty() {
            return Err(CalyxError::Configuration(errors.join("; ")));
        }

        let mut warnings = Vec::new();
        for (kind, w) in PillarKind::ALL.iter().zip(self.as_array()) {
            if w == 0.0 {
                warnings.push(format!("{} weight is zero; pillar will not affect the score", kind.as_str()));
            } else if w > DOMINANCE_THRESHOLD {
                warnings.push(format!("{} weight ({w:.2}) dominates the configuration", kind.as_str()));
            }
        }

        let nonzero: Vec<f64> = self.as_array().iter().copied().filter(|w| *w > 0.0).collect();
        if let (Some(max), Some(min)) = (
            nonzero.iter().cloned().reduce(f64::max),
            nonzero.iter().cloned().reduce(f64::min),
        ) {
            if min > 0.0 && max / min > DISPARITY_RATIO {
                warnings.push(format!(
                    "extreme weight disparity (max {max:.2} vs min {min:.3})"
                ));
            }
        }

        Ok(warnings)
    }

    /// Rescale weights proportionally so they sum to 1.0.
    pub fn normalize(&mut self) {
        let sum = self.sum();
        if sum > 0.0 {
            self.asset_quality       /= sum;
            self.market_outlook      /= sum;
            self.capital_intensity   /= sum;
            self.strategic_fit       /= sum;
            self.financial_readiness /= sum;
            self.regulatory_risk     /= sum;
        }
    }

    /// Derive a normalized copy without touching self.
    pub fn normalized(&self) -> Self {
        let mut copy = self.clone();
        copy.normalize();
        copy
    }

    /// Stable fingerprint for cache keying.
    ///
    /// Computed over the normalized weights in canonical field order plus
    /// sorted custom parameters, so two logically-identical configurations
    /// collide to the same key regardless of how they were constructed.
    pub fn fingerprint(&self) -> String {
        let normed = self.normalized();
        let mut hasher = Sha256::new();
        for (kind, w) in PillarKind::ALL.iter().zip(normed.as_array()) {
            hasher.update(kind.as_str().as_bytes());
            hasher.update(format!("={w:.9};").as_bytes());
        }
        // BTreeMap iteration is already sorted by key
        for (k, v) in &normed.custom_params {
            hasher.update(k.as_bytes());
            hasher.update(format!("={v:.9};").as_bytes());
        }
        let digest = hasher.finalize();
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn overweight_config() -> WeightConfig {
        // Sum = 1.30
        WeightConfig {
            asset_quality: 0.5,
            market_outlook: 0.3,
            capital_intensity: 0.2,
            strategic_fit: 0.15,
            financial_readiness: 0.1,
            regulatory_risk: 0.05,
            ..WeightConfig::default()
        }
    }

    #[test]
    fn test_default_weights_sum_to_one() {
        let w = WeightConfig::default();
        assert!((w.sum() - 1.0).abs() < WEIGHT_SUM_TOLERANCE);
        assert!(w.validate().is_ok());
    }

    #[test]
    fn test_overweight_config_fails_with_total_weight_error() {
        let err = overweight_config().validate().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("totalWeight"), "missing totalWeight error: {msg}");
    }

    #[test]
    fn test_normalize_preserves_ratios() {
        let mut w = overweight_config();
        let ratio_before = w.asset_quality / w.market_outlook;
        w.normalize();
        assert!((w.sum() - 1.0).abs() < WEIGHT_SUM_TOLERANCE);
        let ratio_after = w.asset_quality / w.market_outlook;
        assert!((ratio_before - ratio_after).abs() < 1e-9);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let w = WeightConfig { asset_quality: -0.1, ..WeightConfig::default() };
        let err = w.validate().unwrap_err();
        assert!(err.to_string().contains("negative"));
    }

    #[test]
    fn test_all_errors_accumulated() {
        let w = WeightConfig {
            asset_quality: -0.1,
            market_outlook: -0.2,
            ..WeightConfig::default()
        };
        let msg = w.validate().unwrap_err().to_string();
        assert!(msg.contains("asset_quality"));
        assert!(msg.contains("market_outlook"));
        assert!(msg.contains("totalWeight"));
    }

    #[test]
    fn test_zero_weight_is_warning_not_error() {
        let mut w = WeightConfig::default();
        w.regulatory_risk = 0.0;
        w.normalize();
        let warnings = w.validate().expect("zero weight must validate");
        assert!(warnings.iter().any(|m| m.contains("regulatory_risk")));
    }

    #[test]
    fn test_dominance_warning() {
        let mut w = WeightConfig {
            asset_quality: 0.7,
            market_outlook: 0.06,
            capital_intensity: 0.06,
            strategic_fit: 0.06,
            financial_readiness: 0.06,
            regulatory_risk: 0.06,
            ..WeightConfig::default()
        };
        w.normalize();
        let warnings = w.validate().unwrap();
        assert!(warnings.iter().any(|m| m.contains("dominates")));
    }

    #[test]
    fn test_fingerprint_construction_order_independent() {
        let mut a = WeightConfig::default();
        a.custom_params.insert("beta".to_string(), 2.0);
        a.custom_params.insert("alpha".to_string(), 1.0);

        let mut b = WeightConfig::default();
        b.custom_params.insert("alpha".to_string(), 1.0);
        b.custom_params.insert("beta".to_string(), 2.0);

        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_fingerprint_collides_for_proportional_configs() {
        // Same ratios, different scale: identical after normalization.
        let a = WeightConfig::default();
        let mut b = WeightConfig::default();
        for w in [
            &mut b.asset_quality, &mut b.market_outlook, &mut b.capital_intensity,
            &mut b.strategic_fit, &mut b.financial_readiness, &mut b.regulatory_risk,
        ] {
            *w *= 2.0;
        }
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn test_fingerprint_differs_for_different_weights() {
        let a = WeightConfig::default();
        let mut b = WeightConfig::default();
        b.asset_quality = 0.30;
        b.market_outlook = 0.15;
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
