//! Weighted-aggregation scoring engine.
//!
//! Orchestrates one evaluation end to end: structural pre-flight validation
//! (accumulating every error), fan-out over the six pillars,
//! weighted aggregation with confidence blending, and derivation of the
//! investment recommendation and risk level.
//!
//! Determinism is the central contract: identical (company, config, context)
//! inputs produce an identical overall score across repeated and concurrent
//! invocations. Pillars are pure and share no state, so invocation order
//! never matters.

use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::future::join_all;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use calyx_common::company::CompanyRecord;
use calyx_common::confidence::{blend_confidence, comparable_quality_from_counts};
use calyx_common::error::{CalyxError, Result};
use calyx_common::market::{MarketContext, MarketContextProvider};

use crate::config::EngineConfig;
use crate::pillars::{all_pillars, Pillar};
use crate::score::{
    InvestmentRecommendation, PillarContribution, PillarKind, PillarScore, RiskLevel,
    ScoringResult,
};
use crate::weights::WeightConfig;

/// The scoring engine. Construct once and share; evaluation holds no
/// mutable state beyond an invocation counter.
pub struct ScoringEngine {
    config: EngineConfig,
    pillars: Vec<Box<dyn Pillar>>,
    invocations: AtomicU64,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl ScoringEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            pillars: all_pillars(),
            invocations: AtomicU64::new(0),
        }
    }

    /// Number of full evaluations actually computed. The result cache's
    /// single-flight guarantee is observable through this counter.
    pub fn invocation_count(&self) -> u64 {
        self.invocations.load(Ordering::SeqCst)
    }

    /// Evaluate one company against one weight configuration.
    pub async fn evaluate(
        &self,
        company: &CompanyRecord,
        weights: &WeightConfig,
        ctx: &MarketContext,
    ) -> Result<ScoringResult> {
        let (_tx, rx) = watch::channel(false);
        self.evaluate_with_cancel(company, weights, ctx, &rx).await
    }

    /// Evaluate with a caller-supplied cancellation signal. Aborts cleanly
    /// with `Cancelled` rather than producing a partial result.
    #[instrument(skip(self, company, weights, ctx, cancel), fields(company = %company.name))]
    pub async fn evaluate_with_cancel(
        &self,
        company: &CompanyRecord,
        weights: &WeightConfig,
        ctx: &MarketContext,
        cancel: &watch::Receiver<bool>,
    ) -> Result<ScoringResult> {
        if *cancel.borrow() {
            return Err(CalyxError::Cancelled);
        }

        self.preflight(company)?;
        let config_warnings = weights.validate()?;
        for w in &config_warnings {
            debug!(company = %company.name, warning = %w, "weight configuration warning");
        }

        self.invocations.fetch_add(1, Ordering::SeqCst);

        // Fan out the six pillars. Each is a pure function; the futures may
        // resolve in any order and the result is assembled by position.
        let pillar_results: Vec<Result<PillarScore>> =
            join_all(self.pillars.iter().map(|p| async { p.score(company, ctx) })).await;

        if *cancel.borrow() {
            return Err(CalyxError::Cancelled);
        }

        let mut pillar_scores = Vec::with_capacity(6);
        let mut pillar_errors = Vec::new();
        for result in pillar_results {
            match result {
                Ok(score) => pillar_scores.push(score),
                Err(e) => pillar_errors.push(e.to_string()),
            }
        }
        if !pillar_errors.is_empty() {
            return Err(CalyxError::InvalidData(pillar_errors.join("; ")));
        }

        let result = self.aggregate(company, weights, ctx, pillar_scores)?;

        info!(
            company = %company.name,
            overall = result.overall_score,
            recommendation = result.recommendation.as_str(),
            risk = result.risk_level.as_str(),
            confidence = result.confidence.overall,
            "evaluation complete"
        );
        Ok(result)
    }

    /// Evaluate a set of companies, skipping (not aborting on) any that
    /// individually fail validation.
    pub async fn evaluate_many(
        &self,
        companies: &[CompanyRecord],
        weights: &WeightConfig,
        provider: &dyn MarketContextProvider,
    ) -> Vec<ScoringResult> {
        let mut results = Vec::with_capacity(companies.len());
        for company in companies {
            let ctx = provider.market_context(company);
            match self.evaluate(company, weights, &ctx).await {
                Ok(r) => results.push(r),
                Err(e) => {
                    warn!(company = %company.name, error = %e, "skipping invalid company");
                }
            }
        }
        results
    }

    /// Structural pre-flight validation. Accumulates every problem so the
    /// caller sees the full picture, not just the first failure.
    fn preflight(&self, company: &CompanyRecord) -> Result<()> {
        let errors = company.structural_errors();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CalyxError::InvalidData(errors.join("; ")))
        }
    }

    fn aggregate(
        &self,
        company: &CompanyRecord,
        weights: &WeightConfig,
        ctx: &MarketContext,
        pillar_scores: Vec<PillarScore>,
    ) -> Result<ScoringResult> {
        if pillar_scores.len() != PillarKind::ALL.len() {
            return Err(CalyxError::Calculation(format!(
                "expected 6 pillar scores, got {}",
                pillar_scores.len()
            )));
        }

        let mut contributions = Vec::with_capacity(6);
        let mut weighted_sum = 0.0;
        for score in &pillar_scores {
            let weight = weights.weight_for(score.pillar);
            let contribution = weight * score.raw_score;
            weighted_sum += contribution;
            contributions.push(PillarContribution {
                pillar: score.pillar,
                weight,
                raw_score: score.raw_score,
                contribution,
            });
        }
        // Numeric drift can nudge the sum past the rubric bounds.
        let overall = weighted_sum.clamp(0.0, 5.0);

        let data_completeness: f64 = pillar_scores
            .iter()
            .map(|s| weights.weight_for(s.pillar) * self.completeness_of(s.pillar, company))
            .sum();
        let comparable_quality =
            comparable_quality_from_counts(ctx.benchmarks.len(), ctx.comparables.len());
        let confidence = blend_confidence(
            data_completeness,
            self.config.model_accuracy,
            comparable_quality,
            &self.config.blend,
        );

        let risk_level = self.derive_risk(&pillar_scores, confidence.overall);

        let mut recommendation = self.config.thresholds.bucket(overall);
        if risk_level == RiskLevel::VeryHigh {
            recommendation = recommendation.demoted();
        }

        let recommendations =
            build_recommendations(overall, confidence.overall, risk_level, &pillar_scores);

        Ok(ScoringResult {
            company_id: company.id,
            company_name: company.name.clone(),
            overall_score: overall,
            pillar_scores,
            contributions,
            confidence,
            recommendations,
            recommendation,
            risk_level,
            evaluated_at: chrono::Utc::now(),
        })
    }

    fn completeness_of(&self, kind: PillarKind, company: &CompanyRecord) -> f64 {
        self.pillars
            .iter()
            .find(|p| p.kind() == kind)
            .map(|p| p.validate(company).completeness)
            .unwrap_or(0.0)
    }

    /// Risk starts from the financial-readiness and regulatory-risk pillars
    /// and is bumped one level when overall confidence is low.
    fn derive_risk(&self, pillar_scores: &[PillarScore], overall_confidence: f64) -> RiskLevel {
        let anchor = |kind: PillarKind| {
            pillar_scores
                .iter()
                .find(|s| s.pillar == kind)
                .map(|s| s.raw_score)
                .unwrap_or(1.0)
        };
        let mean = (anchor(PillarKind::FinancialReadiness) + anchor(PillarKind::RegulatoryRisk)) / 2.0;

        let base = if mean >= 4.0 {
            RiskLevel::Low
        } else if mean >= 3.0 {
            RiskLevel::Medium
        } else if mean >= 2.0 {
            RiskLevel::High
        } else {
            RiskLevel::VeryHigh
        };

        if overall_confidence < self.config.low_confidence_floor {
            base.bumped()
        } else {
            base
        }
    }
}

/// At least one human-readable recommendation, even for minimal-data
/// companies.
fn build_recommendations(
    overall: f64,
    confidence: f64,
    risk: RiskLevel,
    pillar_scores: &[PillarScore],
) -> Vec<String> {
    let mut recs = Vec::new();

    let critical_runway = pillar_scores
        .iter()
        .filter(|s| s.pillar == PillarKind::FinancialReadiness)
        .flat_map(|s| s.warnings.iter())
        .any(|w| w.contains("Critical"));
    if critical_runway {
        recs.push("Address near-term financing: funding runway is critical".to_string());
    }
    if overall >= 4.0 {
        recs.push("Strong rubric fit; proceed to confirmatory diligence".to_string());
    }
    if confidence < 0.5 {
        recs.push("Collect additional data before committing capital; confidence is low".to_string());
    }
    if risk >= RiskLevel::High {
        recs.push("Mitigate identified risk drivers before increasing exposure".to_string());
    }
    if recs.is_empty() {
        recs.push("Maintain standard monitoring cadence".to_string());
    }
    recs
}

// ── Tests ───────────────────────────────────────────────────────────────────
