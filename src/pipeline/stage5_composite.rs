use std::sync::Arc;

use crate::model::measure::{Measure, weighted_mean_defined};
use crate::model::metrics::PILLARS;
use crate::model::profile::{BonusTable, PillarWeights};
use crate::model::record::PlayerRecord;
use crate::pipeline::stage4_pillars::PillarTable;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Composite {
    /// Pillar scores weighted over the defined pillars only.
    pub base: Measure,
    pub age_bonus: f64,
    pub minutes_bonus: f64,
    pub overall: Measure,
}

pub fn run_stage5(
    records: &[Arc<PlayerRecord>],
    pillars: &PillarTable,
    weights: PillarWeights,
    bonuses: &BonusTable,
) -> Vec<Composite> {
    records
        .iter()
        .zip(&pillars.scores)
        .map(|(record, scores)| composite(record, scores, weights, bonuses))
        .collect()
}

pub fn composite(
    record: &PlayerRecord,
    scores: &[Measure; 3],
    weights: PillarWeights,
    bonuses: &BonusTable,
) -> Composite {
    let base = weighted_mean_defined(PILLARS.iter().map(|&p| (weights.get(p), scores[p.index()])));
    let age_bonus = age_bonus(record.age, bonuses);
    let minutes_bonus = minutes_bonus(record.minutes_played, bonuses);
    let overall = base.map(|b| b + age_bonus + minutes_bonus);
    Composite {
        base,
        age_bonus,
        minutes_bonus,
        overall,
    }
}

/// First matching band wins; unknown age earns nothing.
pub fn age_bonus(age: Option<u32>, bonuses: &BonusTable) -> f64 {
    let Some(age) = age else {
        return 0.0;
    };
    bonuses
        .age_bands
        .iter()
        .find(|b| (b.min_age..=b.max_age).contains(&age))
        .map(|b| b.bonus)
        .unwrap_or(0.0)
}

/// Highest satisfied threshold wins.
pub fn minutes_bonus(minutes: Option<u32>, bonuses: &BonusTable) -> f64 {
    let Some(minutes) = minutes else {
        return 0.0;
    };
    bonuses
        .minutes_bands
        .iter()
        .rev()
        .find(|b| minutes >= b.min_minutes)
        .map(|b| b.bonus)
        .unwrap_or(0.0)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage5_composite.rs"]
mod tests;
