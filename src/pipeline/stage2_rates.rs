use std::sync::Arc;

use crate::model::measure::Measure;
use crate::model::metrics::{MetricCatalog, MetricKind, MetricSpec};
use crate::model::record::PlayerRecord;

/// Per-record, per-metric normalized values: `values[record][metric]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RateTable {
    pub values: Vec<Vec<Measure>>,
}

impl RateTable {
    pub fn column(&self, metric: usize) -> impl Iterator<Item = Measure> + '_ {
        self.values.iter().map(move |row| row[metric])
    }
}

pub fn run_stage2(records: &[Arc<PlayerRecord>], catalog: &MetricCatalog) -> RateTable {
    let mut values = Vec::with_capacity(records.len());
    for record in records {
        let row = catalog
            .metrics()
            .iter()
            .map(|spec| normalize_metric(record, spec))
            .collect::<Vec<_>>();
        values.push(row);
    }

    let table = RateTable { values };
    for (idx, spec) in catalog.metrics().iter().enumerate() {
        let undefined = table.column(idx).filter(|v| !v.is_defined()).count();
        if undefined > 0 {
            tracing::debug!(metric = %spec.name, undefined, "metric undefined for some records");
        }
    }
    table
}

pub fn normalize_metric(record: &PlayerRecord, spec: &MetricSpec) -> Measure {
    match spec.kind {
        MetricKind::Counting => {
            let raw = spec.column.as_deref().and_then(|c| record.stat(c));
            per90(raw, record.minutes_played)
        }
        MetricKind::Rate => rate(spec.column.as_deref().and_then(|c| record.stat(c))),
        MetricKind::Ratio => {
            let num = spec.numerator.as_deref().and_then(|c| record.stat(c));
            let den = spec.denominator.as_deref().and_then(|c| record.stat(c));
            ratio(num, den)
        }
    }
}

/// `raw * 90 / minutes`. Zero or null minutes give `Undefined`, never zero
/// or infinity.
pub fn per90(raw: Option<f64>, minutes: Option<u32>) -> Measure {
    match (raw, minutes) {
        (Some(raw), Some(minutes)) if minutes > 0 => {
            Measure::from_f64(raw * 90.0 / minutes as f64)
        }
        _ => Measure::Undefined,
    }
}

pub fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Measure {
    match (numerator, denominator) {
        (Some(num), Some(den)) if den > 0.0 => Measure::from_f64(num / den),
        _ => Measure::Undefined,
    }
}

/// Percentages pass through; anything outside [0, 100] is not a valid rate.
pub fn rate(value: Option<f64>) -> Measure {
    match value {
        Some(v) if v.is_finite() && (0.0..=100.0).contains(&v) => Measure::Value(v),
        _ => Measure::Undefined,
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage2_rates.rs"]
mod tests;
