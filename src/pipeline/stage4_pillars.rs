use crate::model::measure::{Measure, mean_defined};
use crate::model::metrics::MetricCatalog;

#[derive(Debug, Clone, PartialEq)]
pub struct PillarTable {
    /// `scores[record][Pillar::index]`.
    pub scores: Vec<[Measure; 3]>,
}

/// Mean of the defined z-scores in each pillar. A pillar with nothing
/// defined stays `Undefined` rather than collapsing to the cohort mean.
pub fn run_stage4(z: &[Vec<Measure>], catalog: &MetricCatalog) -> PillarTable {
    let members = catalog.pillar_members();
    let scores = z
        .iter()
        .map(|row| {
            let mut out = [Measure::Undefined; 3];
            for (p, idxs) in members.iter().enumerate() {
                out[p] = mean_defined(idxs.iter().map(|&m| row[m]));
            }
            out
        })
        .collect::<Vec<_>>();

    let incomplete = scores
        .iter()
        .filter(|s| s.iter().any(|m| !m.is_defined()))
        .count();
    if incomplete > 0 {
        tracing::info!(records = incomplete, "records with at least one undefined pillar");
    }

    PillarTable { scores }
}
