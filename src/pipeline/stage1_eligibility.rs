use std::collections::BTreeSet;
use std::sync::Arc;

use crate::model::record::{PlayerRecord, PlayerTable};

#[derive(Debug, Clone)]
pub struct Stage1Output {
    /// Eligible records in input order.
    pub eligible: Vec<Arc<PlayerRecord>>,
    pub excluded_position: usize,
    pub excluded_minutes: usize,
}

pub fn run_stage1(
    table: &PlayerTable,
    positions: &BTreeSet<String>,
    min_minutes: u32,
) -> Stage1Output {
    let mut eligible = Vec::with_capacity(table.len());
    let mut excluded_position = 0usize;
    let mut excluded_minutes = 0usize;

    for record in &table.records {
        if !position_matches(record, positions) {
            excluded_position += 1;
            continue;
        }
        if !minutes_sufficient(record, min_minutes) {
            excluded_minutes += 1;
            continue;
        }
        eligible.push(Arc::clone(record));
    }

    tracing::info!(
        eligible = eligible.len(),
        excluded_position,
        excluded_minutes,
        "eligibility filter applied"
    );

    Stage1Output {
        eligible,
        excluded_position,
        excluded_minutes,
    }
}

fn position_matches(record: &PlayerRecord, positions: &BTreeSet<String>) -> bool {
    record
        .position_codes()
        .iter()
        .any(|code| positions.contains(code))
}

// null minutes never pass, whatever the threshold
fn minutes_sufficient(record: &PlayerRecord, min_minutes: u32) -> bool {
    record.minutes_played.is_some_and(|m| m >= min_minutes)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage1_eligibility.rs"]
mod tests;
