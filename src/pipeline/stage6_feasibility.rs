use std::sync::Arc;

use chrono::NaiveDate;

use crate::model::measure::{Measure, weighted_mean_defined};
use crate::model::profile::{CombineRule, ContractCurve, CostCurve, FeasibilityParams};
use crate::model::record::{EligibilityStatus, PlayerRecord};
use crate::model::scored::FeasibilityBreakdown;

#[derive(Debug, Clone, PartialEq)]
pub struct Stage6Output {
    pub breakdowns: Vec<FeasibilityBreakdown>,
    /// Combined feasibility in [0, 1].
    pub scores: Vec<f64>,
}

/// Feasibility does not depend on pillar weights, so a run computes it once
/// and every sensitivity scenario reuses it.
pub fn run_stage6(
    records: &[Arc<PlayerRecord>],
    params: &FeasibilityParams,
    reference_date: NaiveDate,
) -> Stage6Output {
    let months = records
        .iter()
        .map(|r| r.months_to_expiry(reference_date))
        .collect::<Vec<_>>();
    let cost = cost_scores(records, params.cost_curve);
    let contract = contract_scores(&months, params.contract_curve);

    let mut breakdowns = Vec::with_capacity(records.len());
    let mut scores = Vec::with_capacity(records.len());
    for (idx, record) in records.iter().enumerate() {
        let eligibility = eligibility_score(record.eligibility_status, params);
        let combined = combine(cost[idx], contract[idx], eligibility, params);
        let restricted = record.eligibility_status == EligibilityStatus::Restricted;
        let capped = restricted && combined > params.restricted_cap;
        let score = if restricted {
            combined.min(params.restricted_cap)
        } else {
            combined
        };
        breakdowns.push(FeasibilityBreakdown {
            cost: cost[idx],
            contract: contract[idx],
            eligibility,
            months_to_expiry: months[idx],
            capped,
        });
        scores.push(score);
    }

    Stage6Output { breakdowns, scores }
}

pub fn eligibility_score(status: EligibilityStatus, params: &FeasibilityParams) -> f64 {
    match status {
        EligibilityStatus::Clear => params.eligibility_scores.clear,
        EligibilityStatus::Unknown => params.eligibility_scores.unknown,
        EligibilityStatus::Restricted => params.eligibility_scores.restricted,
    }
}

/// Combines the applicable sub-scores and clamps to [0, 1]. Not-applicable
/// sub-scores drop out and the remaining weights are renormalized.
pub fn combine(cost: Measure, contract: Measure, eligibility: f64, params: &FeasibilityParams) -> f64 {
    let combined = match params.combine {
        CombineRule::WeightedMean => weighted_mean_defined([
            (params.value_weight, cost),
            (params.contract_weight, contract),
            (params.eligibility_weight, Measure::Value(eligibility)),
        ])
        .value()
        // only when every applicable sub-score carries zero weight
        .unwrap_or(eligibility),
        CombineRule::Product => [cost, contract, Measure::Value(eligibility)]
            .iter()
            .filter_map(|m| m.value())
            .product(),
    };
    combined.clamp(0.0, 1.0)
}

fn cost_scores(records: &[Arc<PlayerRecord>], curve: CostCurve) -> Vec<Measure> {
    match curve {
        CostCurve::LogRelative => {
            let logs = records
                .iter()
                .map(|r| match r.market_value {
                    Some(v) if v.is_finite() => Some(v.max(0.0).ln_1p()),
                    _ => None,
                })
                .collect::<Vec<_>>();
            inverted_minmax(&logs)
        }
        CostCurve::Budget {
            comfortable,
            ceiling,
        } => records
            .iter()
            .map(|r| match r.market_value {
                Some(v) if v.is_finite() => Measure::Value(budget_score(v, comfortable, ceiling)),
                _ => Measure::NotApplicable,
            })
            .collect(),
    }
}

fn contract_scores(months: &[Option<u32>], curve: ContractCurve) -> Vec<Measure> {
    match curve {
        ContractCurve::Relative => {
            let as_f64 = months.iter().map(|m| m.map(f64::from)).collect::<Vec<_>>();
            inverted_minmax(&as_f64)
        }
        ContractCurve::Linear {
            urgent_months,
            distant_months,
            floor,
        } => months
            .iter()
            .map(|m| match m {
                Some(m) => Measure::Value(linear_contract_score(*m, urgent_months, distant_months, floor)),
                None => Measure::NotApplicable,
            })
            .collect(),
    }
}

/// `1 - (x - lo) / (hi - lo)` over the present values; a degenerate range
/// scores everyone 0.5. Absent values are not applicable.
fn inverted_minmax(values: &[Option<f64>]) -> Vec<Measure> {
    let present = values.iter().flatten().copied();
    let lo = present.clone().fold(f64::INFINITY, f64::min);
    let hi = present.fold(f64::NEG_INFINITY, f64::max);
    values
        .iter()
        .map(|v| match v {
            Some(x) if hi - lo > 1e-12 => Measure::Value(1.0 - (x - lo) / (hi - lo)),
            Some(_) => Measure::Value(0.5),
            None => Measure::NotApplicable,
        })
        .collect()
}

pub fn budget_score(value: f64, comfortable: f64, ceiling: f64) -> f64 {
    if value <= comfortable {
        1.0
    } else if value >= ceiling {
        0.0
    } else {
        1.0 - (value - comfortable) / (ceiling - comfortable)
    }
}

pub fn linear_contract_score(months: u32, urgent: u32, distant: u32, floor: f64) -> f64 {
    if months <= urgent {
        1.0
    } else if months >= distant {
        floor
    } else {
        let t = f64::from(months - urgent) / f64::from(distant - urgent);
        1.0 - (1.0 - floor) * t
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage6_feasibility.rs"]
mod tests;
