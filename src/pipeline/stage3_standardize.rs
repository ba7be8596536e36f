use std::collections::BTreeMap;
use std::sync::Arc;

use crate::model::measure::Measure;
use crate::model::metrics::MetricCatalog;
use crate::model::profile::StandardizeParams;
use crate::model::record::PlayerRecord;
use crate::pipeline::stage2_rates::RateTable;

/// Below this spread a cohort is treated as degenerate.
pub const STDEV_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq)]
pub struct CohortStats {
    pub league: String,
    pub metric: String,
    pub n_records: usize,
    pub n_defined: usize,
    pub mean: Measure,
    pub stddev: Measure,
    pub usable: bool,
}

#[derive(Debug, Clone)]
pub struct Stage3Output {
    /// League z-scores, `z[record][metric]`, sign-corrected so that higher
    /// is always better.
    pub z: Vec<Vec<Measure>>,
    /// One row per (league, metric), leagues in lexical order.
    pub cohorts: Vec<CohortStats>,
}

pub fn run_stage3(
    records: &[Arc<PlayerRecord>],
    rates: &RateTable,
    catalog: &MetricCatalog,
    params: &StandardizeParams,
) -> Stage3Output {
    let n_metrics = catalog.len();
    let mut z = vec![vec![Measure::Undefined; n_metrics]; records.len()];
    let mut cohorts = Vec::new();

    for (league, members) in group_by_league(records) {
        let mut unusable = 0usize;
        for (metric_idx, spec) in catalog.metrics().iter().enumerate() {
            let defined = members
                .iter()
                .filter_map(|&r| rates.values[r][metric_idx].value())
                .collect::<Vec<_>>();
            let (mean, stddev) = population_stats(&defined);
            let usable = defined.len() >= params.min_cohort_size
                && stddev.value().is_some_and(|sd| sd >= STDEV_EPSILON);

            if usable {
                if let (Measure::Value(mu), Measure::Value(sd)) = (mean, stddev) {
                    for &r in &members {
                        z[r][metric_idx] = rates.values[r][metric_idx]
                            .map(|v| standardize(v, mu, sd, spec.higher_is_better, params));
                    }
                }
            } else {
                unusable += 1;
            }

            cohorts.push(CohortStats {
                league: league.to_string(),
                metric: spec.name.clone(),
                n_records: members.len(),
                n_defined: defined.len(),
                mean,
                stddev,
                usable,
            });
        }
        if unusable > 0 {
            tracing::warn!(
                league,
                records = members.len(),
                unusable_metrics = unusable,
                min_cohort_size = params.min_cohort_size,
                "cohort too small or degenerate; z-scores left undefined"
            );
        }
    }

    Stage3Output { z, cohorts }
}

/// Record indices per league, both in deterministic order.
pub fn group_by_league(records: &[Arc<PlayerRecord>]) -> BTreeMap<&str, Vec<usize>> {
    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, record) in records.iter().enumerate() {
        groups.entry(record.league.as_str()).or_default().push(idx);
    }
    groups
}

/// Mean and population standard deviation (N denominator), summed in
/// input order.
pub fn population_stats(values: &[f64]) -> (Measure, Measure) {
    if values.is_empty() {
        return (Measure::Undefined, Measure::Undefined);
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (Measure::from_f64(mean), Measure::from_f64(variance.sqrt()))
}

fn standardize(v: f64, mean: f64, sd: f64, higher_is_better: bool, params: &StandardizeParams) -> f64 {
    let mut z = (v - mean) / sd;
    if !higher_is_better {
        z = -z;
    }
    if params.clip_z {
        z = z.clamp(-params.z_clip, params.z_clip);
    }
    z
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage3_standardize.rs"]
mod tests;
