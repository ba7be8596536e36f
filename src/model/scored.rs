use std::sync::Arc;

use crate::model::flags::RiskFlag;
use crate::model::measure::Measure;
use crate::model::record::PlayerRecord;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeasibilityBreakdown {
    pub cost: Measure,
    pub contract: Measure,
    pub eligibility: f64,
    pub months_to_expiry: Option<u32>,
    pub capped: bool,
}

/// One ranked row. Built once by the pipeline and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub record: Arc<PlayerRecord>,
    /// Per-metric per-90, ratio or rate value, in catalog order.
    pub metric_values: Vec<Measure>,
    /// Per-metric league z-score, in catalog order.
    pub metric_z: Vec<Measure>,
    /// Indexed by `Pillar::index`.
    pub pillars: [Measure; 3],
    pub base_score: Measure,
    pub age_bonus: f64,
    pub minutes_bonus: f64,
    pub overall_score: Measure,
    pub feasibility: FeasibilityBreakdown,
    pub feasibility_score: f64,
    pub priority_score: Measure,
    pub risk_flags: Vec<RiskFlag>,
    pub rank: Option<usize>,
}
