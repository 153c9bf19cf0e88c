//! Display confidence and risk tier derived from retrieved sources.
//!
//! Two strategies coexist: the chat view scores by how many sources came
//! back, the forensic dashboard by their similarity scores. Both add random
//! jitter in some branch, so the random source is injected and can be seeded.

use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::str::FromStr;

use crate::errors::TriageError;
use crate::types::{RiskLevel, Source};

/// Ceiling for the source-count strategy
pub const SOURCE_COUNT_CEILING: u32 = 100;
/// Ceiling for the similarity strategy
pub const SIMILARITY_CEILING: u32 = 98;

/// Confidence score and, when the strategy derives one, a risk tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceEstimate {
    pub confidence: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskLevel>,
}

/// A way of turning retrieved sources into a confidence estimate
pub trait ConfidenceStrategy: Send + Sync + Debug {
    /// Short stable name, used in configuration
    fn name(&self) -> &'static str;

    fn estimate(&self, sources: &[Source], rng: &mut dyn RngCore) -> ConfidenceEstimate;
}

/// Round a non-negative score and clamp it to `[0, ceiling]`.
fn clamp_score(raw: f64, ceiling: u32) -> u32 {
    if !raw.is_finite() || raw <= 0.0 {
        return 0;
    }
    let rounded = raw.round();
    if rounded >= ceiling as f64 {
        ceiling
    } else {
        rounded as u32
    }
}

/// Scores by number of sources: 25 points each up to 85, plus up to 15 of jitter.
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceCountStrategy;

impl ConfidenceStrategy for SourceCountStrategy {
    fn name(&self) -> &'static str {
        "source-count"
    }

    fn estimate(&self, sources: &[Source], rng: &mut dyn RngCore) -> ConfidenceEstimate {
        if sources.is_empty() {
            return ConfidenceEstimate {
                confidence: 0,
                risk: None,
            };
        }
        let base = (sources.len() as f64 * 25.0).min(85.0);
        let jitter = rng.gen::<f64>() * 15.0;
        ConfidenceEstimate {
            confidence: clamp_score(base + jitter, SOURCE_COUNT_CEILING),
            risk: None,
        }
    }
}

/// Scores by mean similarity when the backend supplies it, and derives a risk tier.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityStrategy;

impl ConfidenceStrategy for SimilarityStrategy {
    fn name(&self) -> &'static str {
        "similarity"
    }

    fn estimate(&self, sources: &[Source], rng: &mut dyn RngCore) -> ConfidenceEstimate {
        if sources.is_empty() {
            return ConfidenceEstimate {
                confidence: 0,
                risk: Some(RiskLevel::High),
            };
        }

        let scores: Vec<f64> = sources
            .iter()
            .filter_map(|s| s.similarity_score)
            .filter(|s| s.is_finite())
            .collect();

        let raw = if scores.is_empty() {
            sources.len() as f64 * 30.0 + rng.gen::<f64>() * 10.0
        } else {
            let mean = scores.iter().sum::<f64>() / scores.len() as f64;
            mean * 100.0
        };

        let confidence = clamp_score(raw, SIMILARITY_CEILING);
        ConfidenceEstimate {
            confidence,
            risk: Some(RiskLevel::from_confidence(confidence)),
        }
    }
}

/// Named strategy selector used by configuration and the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    SourceCount,
    Similarity,
}

impl StrategyKind {
    pub fn strategy(&self) -> Box<dyn ConfidenceStrategy> {
        match self {
            StrategyKind::SourceCount => Box::new(SourceCountStrategy),
            StrategyKind::Similarity => Box::new(SimilarityStrategy),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::SourceCount => "source-count",
            StrategyKind::Similarity => "similarity",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "source-count" | "source_count" | "count" => Ok(StrategyKind::SourceCount),
            "similarity" => Ok(StrategyKind::Similarity),
            other => Err(TriageError::ConfigError(format!(
                "Unknown confidence strategy '{}' (expected 'source-count' or 'similarity')",
                other
            ))),
        }
    }
}

/// A strategy paired with the random source it draws jitter from
pub struct ConfidenceEstimator {
    strategy: Box<dyn ConfidenceStrategy>,
    rng: Box<dyn RngCore + Send>,
}

impl Debug for ConfidenceEstimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfidenceEstimator")
            .field("strategy", &self.strategy.name())
            .finish_non_exhaustive()
    }
}

impl ConfidenceEstimator {
    /// Estimator seeded from OS entropy
    pub fn new(kind: StrategyKind) -> Self {
        Self::with_rng(kind.strategy(), StdRng::from_entropy())
    }

    /// Estimator with a fixed seed; output is reproducible
    pub fn seeded(kind: StrategyKind, seed: u64) -> Self {
        Self::with_rng(kind.strategy(), StdRng::seed_from_u64(seed))
    }

    pub fn with_rng(
        strategy: Box<dyn ConfidenceStrategy>,
        rng: impl RngCore + Send + 'static,
    ) -> Self {
        Self {
            strategy,
            rng: Box::new(rng),
        }
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn estimate(&mut self, sources: &[Source]) -> ConfidenceEstimate {
        self.strategy.estimate(sources, self.rng.as_mut())
    }
}
