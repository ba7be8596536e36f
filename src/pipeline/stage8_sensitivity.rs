use std::sync::Arc;

use crate::model::measure::Measure;
use crate::model::profile::{BonusTable, PriorityParams, WeightScenario};
use crate::model::record::PlayerRecord;
use crate::pipeline::stage4_pillars::PillarTable;
use crate::pipeline::stage5_composite::run_stage5;
use crate::pipeline::stage6_feasibility::Stage6Output;
use crate::pipeline::stage7_priority::{priority_of, rank_order};

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateSensitivity {
    pub record: Arc<PlayerRecord>,
    /// Rank per scenario, aligned with `SensitivityReport::scenarios`.
    pub ranks: Vec<Option<usize>>,
    pub best_rank: Option<usize>,
    pub worst_rank: Option<usize>,
    pub spread: Option<usize>,
    pub robust: bool,
}

impl CandidateSensitivity {
    pub fn baseline_rank(&self) -> Option<usize> {
        self.ranks.first().copied().flatten()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SensitivityReport {
    /// Baseline first, then each perturbation in configured order.
    pub scenarios: Vec<WeightScenario>,
    /// Candidates in baseline ranking order.
    pub candidates: Vec<CandidateSensitivity>,
    pub robust_rank_spread: usize,
}

#[derive(Debug, Clone)]
pub struct Stage8Inputs<'a> {
    pub records: &'a [Arc<PlayerRecord>],
    pub pillars: &'a PillarTable,
    pub feasibility: &'a Stage6Output,
    pub scenarios: &'a [WeightScenario],
    pub bonuses: &'a BonusTable,
    pub priority: &'a PriorityParams,
    pub robust_rank_spread: usize,
}

/// Re-ranks under every weight scenario. Only the composite and priority
/// steps are recomputed; per-90 values, z-scores, pillars and feasibility
/// are borrowed from the main run.
pub fn run_stage8(inputs: &Stage8Inputs<'_>) -> SensitivityReport {
    let n = inputs.records.len();
    let mut ranks = vec![Vec::with_capacity(inputs.scenarios.len()); n];
    let mut baseline_order = Vec::new();

    for (s_idx, scenario) in inputs.scenarios.iter().enumerate() {
        let ranking = scenario_ranks(inputs, scenario);
        for (idx, rank) in ranking.ranks.into_iter().enumerate() {
            ranks[idx].push(rank);
        }
        if s_idx == 0 {
            baseline_order = ranking.order;
        }
        tracing::debug!(scenario = %scenario.name, "sensitivity scenario ranked");
    }

    let candidates = baseline_order
        .into_iter()
        .map(|idx| {
            let candidate_ranks = std::mem::take(&mut ranks[idx]);
            summarize(Arc::clone(&inputs.records[idx]), candidate_ranks, inputs.robust_rank_spread)
        })
        .collect::<Vec<_>>();

    let fragile = candidates
        .iter()
        .filter(|c| c.baseline_rank().is_some() && !c.robust)
        .count();
    tracing::info!(
        scenarios = inputs.scenarios.len(),
        candidates = candidates.len(),
        fragile,
        "weight sensitivity analysed"
    );

    SensitivityReport {
        scenarios: inputs.scenarios.to_vec(),
        candidates,
        robust_rank_spread: inputs.robust_rank_spread,
    }
}

struct ScenarioRanking {
    order: Vec<usize>,
    ranks: Vec<Option<usize>>,
}

fn scenario_ranks(inputs: &Stage8Inputs<'_>, scenario: &WeightScenario) -> ScenarioRanking {
    let composites = run_stage5(inputs.records, inputs.pillars, scenario.weights, inputs.bonuses);
    let priority = composites
        .iter()
        .zip(&inputs.feasibility.scores)
        .map(|(c, &f)| priority_of(c.overall, f, inputs.priority))
        .collect::<Vec<Measure>>();
    let order = rank_order(inputs.records, &priority);
    let mut ranks = vec![None; inputs.records.len()];
    for (pos, &idx) in order.iter().enumerate() {
        if priority[idx].is_defined() {
            ranks[idx] = Some(pos + 1);
        }
    }
    ScenarioRanking { order, ranks }
}

fn summarize(
    record: Arc<PlayerRecord>,
    ranks: Vec<Option<usize>>,
    robust_rank_spread: usize,
) -> CandidateSensitivity {
    let defined = ranks.iter().flatten().copied();
    let best_rank = defined.clone().min();
    let worst_rank = defined.max();
    let spread = match (best_rank, worst_rank) {
        (Some(b), Some(w)) => Some(w - b),
        _ => None,
    };
    CandidateSensitivity {
        record,
        ranks,
        best_rank,
        worst_rank,
        spread,
        robust: spread.is_some_and(|s| s <= robust_rank_spread),
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage8_sensitivity.rs"]
mod tests;
