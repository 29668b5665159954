//! Risk-level assignment and the per-level penalty/quality buckets.

use crate::{rng::SeedRng, types::RiskLevel};
use std::ops::RangeInclusive;

/// Chooses the risk level of the `index`-th client of a batch.
pub trait RiskLevelPolicy: Send + Sync {
    fn risk_level(&self, index: usize, rng: &mut SeedRng) -> RiskLevel;
}

/// Uniformly random over the four levels. The default policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformRiskPolicy;

impl RiskLevelPolicy for UniformRiskPolicy {
    fn risk_level(&self, _index: usize, rng: &mut SeedRng) -> RiskLevel {
        *rng.pick(RiskLevel::ALL)
    }
}

/// Every client gets the same level.
#[derive(Debug, Clone, Copy)]
pub struct FixedRiskPolicy(pub RiskLevel);

impl RiskLevelPolicy for FixedRiskPolicy {
    fn risk_level(&self, _index: usize, _rng: &mut SeedRng) -> RiskLevel {
        self.0
    }
}

/// Walks a fixed sequence by client index, wrapping around.
#[derive(Debug, Clone)]
pub struct CyclingRiskPolicy {
    levels: Vec<RiskLevel>,
}

impl CyclingRiskPolicy {
    /// An empty sequence cycles through all four levels in order.
    pub fn new(levels: Vec<RiskLevel>) -> Self {
        let levels = if levels.is_empty() {
            RiskLevel::ALL.to_vec()
        } else {
            levels
        };
        Self { levels }
    }
}

impl RiskLevelPolicy for CyclingRiskPolicy {
    fn risk_level(&self, index: usize, _rng: &mut SeedRng) -> RiskLevel {
        self.levels[index % self.levels.len()]
    }
}

/// Penalty-exposure and quality-score ranges for one risk level.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskBucket {
    pub penalty_exposure: RangeInclusive<f64>,
    pub quality_score: RangeInclusive<u32>,
    /// Scales a client's revenue into in-state sales when building the
    /// monitoring table.
    pub exposure_multiplier: f64,
}

impl RiskBucket {
    pub fn for_level(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Critical => Self {
                penalty_exposure: 50_000.0..=200_000.0,
                quality_score: 60..=75,
                exposure_multiplier: 1.2,
            },
            RiskLevel::High => Self {
                penalty_exposure: 25_000.0..=100_000.0,
                quality_score: 75..=85,
                exposure_multiplier: 0.9,
            },
            RiskLevel::Medium => Self {
                penalty_exposure: 5_000.0..=25_000.0,
                quality_score: 85..=95,
                exposure_multiplier: 0.6,
            },
            RiskLevel::Low => Self {
                penalty_exposure: 0.0..=5_000.0,
                quality_score: 95..=100,
                exposure_multiplier: 0.3,
            },
        }
    }
}
