pub mod stage1_eligibility;
pub mod stage2_rates;
pub mod stage3_standardize;
pub mod stage4_pillars;
pub mod stage5_composite;
pub mod stage6_feasibility;
pub mod stage7_priority;
pub mod stage8_sensitivity;

use thiserror::Error;

use crate::model::metrics::MetricCatalog;
use crate::model::profile::{ConfigError, ResolvedProfile, ScoringProfile};
use crate::model::record::PlayerTable;
use crate::model::scored::ScoredRecord;
use stage1_eligibility::run_stage1;
use stage2_rates::run_stage2;
use stage3_standardize::{CohortStats, run_stage3};
use stage4_pillars::run_stage4;
use stage5_composite::run_stage5;
use stage6_feasibility::run_stage6;
use stage7_priority::{Stage7Inputs, run_stage7};
use stage8_sensitivity::{SensitivityReport, Stage8Inputs, run_stage8};

#[derive(Debug, Error)]
#[error("input table is missing column(s) required by the metric catalog: {}", .missing.join(", "))]
pub struct SchemaError {
    pub missing: Vec<String>,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
}

#[derive(Debug, Clone)]
pub struct RankingRun {
    pub profile: ResolvedProfile,
    pub n_input: usize,
    pub excluded_position: usize,
    pub excluded_minutes: usize,
    /// Every eligible record, in ranking order.
    pub shortlist: Vec<ScoredRecord>,
    pub cohorts: Vec<CohortStats>,
    pub sensitivity: SensitivityReport,
}

/// Fails with every catalog column the table does not declare, so coverage
/// loss is never silent.
pub fn check_schema(table: &PlayerTable, catalog: &MetricCatalog) -> Result<(), SchemaError> {
    let missing = catalog
        .required_columns()
        .into_iter()
        .filter(|c| !table.columns.contains(c))
        .collect::<Vec<_>>();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(SchemaError { missing })
    }
}

/// Validates the profile and table, then runs every stage. A pure function
/// of its two arguments.
pub fn run_pipeline(
    table: &PlayerTable,
    profile: &ScoringProfile,
) -> Result<RankingRun, PipelineError> {
    let resolved = profile.resolve()?;
    Ok(run_resolved(table, resolved)?)
}

pub fn run_resolved(table: &PlayerTable, resolved: ResolvedProfile) -> Result<RankingRun, SchemaError> {
    check_schema(table, &resolved.catalog)?;
    let profile = &resolved.profile;
    let _span = tracing::info_span!("ranking_run", profile = %profile.name).entered();
    tracing::info!(
        records = table.len(),
        metrics = resolved.catalog.len(),
        scenarios = resolved.scenarios.len(),
        reference_date = %resolved.reference_date,
        "starting ranking run"
    );

    let stage1 = run_stage1(table, &resolved.positions, profile.eligibility.min_minutes);
    let records = &stage1.eligible;

    // weight-independent stages
    let rates = run_stage2(records, &resolved.catalog);
    let stage3 = run_stage3(records, &rates, &resolved.catalog, &profile.standardize);
    let pillars = run_stage4(&stage3.z, &resolved.catalog);
    let feasibility = run_stage6(records, &profile.feasibility, resolved.reference_date);

    let composites = run_stage5(records, &pillars, resolved.weights, &profile.bonuses);
    let shortlist = run_stage7(&Stage7Inputs {
        records,
        rates: &rates,
        z: &stage3.z,
        pillars: &pillars,
        composites: &composites,
        feasibility: &feasibility,
        catalog: &resolved.catalog,
        priority: &profile.priority,
        flags: &profile.flags,
    });

    let sensitivity = run_stage8(&Stage8Inputs {
        records,
        pillars: &pillars,
        feasibility: &feasibility,
        scenarios: &resolved.scenarios,
        bonuses: &profile.bonuses,
        priority: &profile.priority,
        robust_rank_spread: profile.sensitivity.robust_rank_spread,
    });

    Ok(RankingRun {
        n_input: table.len(),
        excluded_position: stage1.excluded_position,
        excluded_minutes: stage1.excluded_minutes,
        shortlist,
        cohorts: stage3.cohorts,
        sensitivity,
        profile: resolved,
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/fixtures.rs"]
pub(crate) mod fixtures;

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/mod.rs"]
mod tests;
