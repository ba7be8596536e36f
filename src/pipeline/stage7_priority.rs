use std::cmp::Ordering;
use std::sync::Arc;

use crate::model::flags::{RiskFlag, flag_order};
use crate::model::measure::Measure;
use crate::model::metrics::MetricCatalog;
use crate::model::profile::{FlagThresholds, PriorityParams};
use crate::model::record::{EligibilityStatus, PlayerRecord};
use crate::model::scored::ScoredRecord;
use crate::pipeline::stage2_rates::RateTable;
use crate::pipeline::stage4_pillars::PillarTable;
use crate::pipeline::stage5_composite::Composite;
use crate::pipeline::stage6_feasibility::Stage6Output;

#[derive(Debug, Clone)]
pub struct Stage7Inputs<'a> {
    pub records: &'a [Arc<PlayerRecord>],
    pub rates: &'a RateTable,
    pub z: &'a [Vec<Measure>],
    pub pillars: &'a PillarTable,
    pub composites: &'a [Composite],
    pub feasibility: &'a Stage6Output,
    pub catalog: &'a MetricCatalog,
    pub priority: &'a PriorityParams,
    pub flags: &'a FlagThresholds,
}

/// Builds the ranked shortlist: priority, flags, and 1-based ranks over the
/// records whose priority is defined.
pub fn run_stage7(inputs: &Stage7Inputs<'_>) -> Vec<ScoredRecord> {
    let priority = inputs
        .composites
        .iter()
        .zip(&inputs.feasibility.scores)
        .map(|(c, &f)| priority_of(c.overall, f, inputs.priority))
        .collect::<Vec<_>>();
    let context = FlagContext::new(inputs);
    let order = rank_order(inputs.records, &priority);

    let mut out = Vec::with_capacity(order.len());
    // defined priorities always sort ahead of undefined ones
    for (pos, idx) in order.into_iter().enumerate() {
        let rank = priority[idx].is_defined().then_some(pos + 1);
        let composite = inputs.composites[idx];
        out.push(ScoredRecord {
            record: Arc::clone(&inputs.records[idx]),
            metric_values: inputs.rates.values[idx].clone(),
            metric_z: inputs.z[idx].clone(),
            pillars: inputs.pillars.scores[idx],
            base_score: composite.base,
            age_bonus: composite.age_bonus,
            minutes_bonus: composite.minutes_bonus,
            overall_score: composite.overall,
            feasibility: inputs.feasibility.breakdowns[idx],
            feasibility_score: inputs.feasibility.scores[idx],
            priority_score: priority[idx],
            risk_flags: collect_flags(inputs, &context, idx),
            rank,
        });
    }

    let flagged = out.iter().filter(|r| !r.risk_flags.is_empty()).count();
    tracing::info!(
        ranked = out.iter().filter(|r| r.rank.is_some()).count(),
        unranked = out.iter().filter(|r| r.rank.is_none()).count(),
        flagged,
        "priority ranking complete"
    );
    out
}

/// Overall shifted onto a non-negative scale anchored at the profile floor.
pub fn performance_of(overall: Measure, params: &PriorityParams) -> Measure {
    overall.map(|o| (o - params.performance_floor).max(0.0))
}

pub fn priority_of(overall: Measure, feasibility: f64, params: &PriorityParams) -> Measure {
    performance_of(overall, params).mul(Measure::Value(feasibility))
}

/// Record indices in ranking order: defined priorities descending, then
/// undefined ones. Ties fall back to record identity, never input order.
pub fn rank_order(records: &[Arc<PlayerRecord>], priority: &[Measure]) -> Vec<usize> {
    let mut order = (0..records.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| {
        let by_priority = match (priority[a].value(), priority[b].value()) {
            (Some(pa), Some(pb)) => pb.total_cmp(&pa),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_priority.then_with(|| compare_identity(&records[a], &records[b]))
    });
    order
}

pub fn compare_identity(a: &PlayerRecord, b: &PlayerRecord) -> Ordering {
    a.player_id
        .cmp(&b.player_id)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.team.cmp(&b.team))
        .then_with(|| a.league.cmp(&b.league))
}

struct FlagContext {
    crosses: Option<usize>,
    cross_eff: Option<usize>,
    tackles: Option<usize>,
    progression: Option<usize>,
    dribbled: Option<usize>,
    crosses_median: Option<f64>,
    cross_eff_median: Option<f64>,
}

impl FlagContext {
    fn new(inputs: &Stage7Inputs<'_>) -> Self {
        let lookup = |name: &str| {
            let idx = inputs.catalog.index_of(name);
            if idx.is_none() {
                tracing::debug!(
                    metric = name,
                    "flag metric not in catalog; dependent flags disabled"
                );
            }
            idx
        };
        let t = inputs.flags;
        let crosses = lookup(&t.crosses_metric);
        let cross_eff = lookup(&t.cross_efficiency_metric);
        let column_median = |idx: Option<usize>| {
            idx.and_then(|m| median_defined(inputs.rates.column(m)))
        };
        Self {
            crosses,
            cross_eff,
            tackles: lookup(&t.tackles_metric),
            progression: lookup(&t.progression_metric),
            dribbled: lookup(&t.dribbled_metric),
            crosses_median: column_median(crosses),
            cross_eff_median: column_median(cross_eff),
        }
    }
}

fn metric_at(row: &[Measure], idx: Option<usize>) -> Measure {
    idx.map(|i| row[i]).unwrap_or(Measure::NotApplicable)
}

fn collect_flags(inputs: &Stage7Inputs<'_>, ctx: &FlagContext, idx: usize) -> Vec<RiskFlag> {
    let mut flags = Vec::new();
    let record = &inputs.records[idx];
    let rates = &inputs.rates.values[idx];
    let z = &inputs.z[idx];
    let t = inputs.flags;

    if let (Some(med_c), Some(med_e)) = (ctx.crosses_median, ctx.cross_eff_median) {
        if metric_at(rates, ctx.crosses).gt(med_c) && metric_at(rates, ctx.cross_eff).lt(med_e) {
            flags.push(RiskFlag::HighCrossVolumeLowEfficiency);
        }
    }
    if metric_at(z, ctx.tackles).gt(t.tackle_z_high)
        && metric_at(z, ctx.progression).lt(t.progression_z_low)
    {
        flags.push(RiskFlag::DefensiveLowProgression);
    }
    if metric_at(z, ctx.progression).gt(t.progression_z_high)
        && metric_at(z, ctx.dribbled).lt(t.dribbled_z_low)
    {
        flags.push(RiskFlag::ProgressiveOneVOneRisk);
    }
    if record.minutes_played.is_some_and(|m| m < t.low_minutes) {
        flags.push(RiskFlag::LowMinutes);
    }
    if record.minutes_played.is_some_and(|m| m >= t.heavy_minutes)
        && record.age.is_some_and(|a| a >= t.advanced_age)
    {
        flags.push(RiskFlag::HighMinutesAdvancedAge);
    }
    let short_contract = inputs.feasibility.breakdowns[idx]
        .months_to_expiry
        .is_some_and(|m| m <= t.short_contract_months);
    if short_contract && record.market_value.is_some_and(|v| v >= t.high_value) {
        flags.push(RiskFlag::ShortContractHighValue);
    }
    if record.eligibility_status == EligibilityStatus::Restricted {
        flags.push(RiskFlag::EligibilityRestricted);
    }
    if inputs.pillars.scores[idx].iter().any(|p| !p.is_defined()) {
        flags.push(RiskFlag::IncompletePillars);
    }

    // stable ordering
    flag_order()
        .iter()
        .copied()
        .filter(|f| flags.contains(f))
        .collect()
}

/// Median over defined values; even counts average the two middle values.
pub fn median_defined(values: impl Iterator<Item = Measure>) -> Option<f64> {
    let mut v = values.filter_map(Measure::value).collect::<Vec<_>>();
    if v.is_empty() {
        return None;
    }
    v.sort_by(f64::total_cmp);
    let mid = v.len() / 2;
    if v.len() % 2 == 0 {
        Some((v[mid - 1] + v[mid]) / 2.0)
    } else {
        Some(v[mid])
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage7_priority.rs"]
mod tests;
