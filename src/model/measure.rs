use serde::{Serialize, Serializer};

/// A derived quantity that may be missing for a specific record.
///
/// `Undefined` means the quantity could in principle be measured but the
/// inputs do not allow it (null cell, zero denominator, degenerate cohort).
/// `NotApplicable` means the quantity does not apply to the record at all.
/// Neither state is ever read as zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Measure {
    Value(f64),
    #[default]
    Undefined,
    NotApplicable,
}

impl Measure {
    /// Wraps a float, mapping non-finite values to `Undefined`.
    pub fn from_f64(v: f64) -> Self {
        if v.is_finite() {
            Measure::Value(v)
        } else {
            Measure::Undefined
        }
    }

    pub fn from_option(v: Option<f64>) -> Self {
        match v {
            Some(v) => Measure::from_f64(v),
            None => Measure::Undefined,
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Measure::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_defined(self) -> bool {
        matches!(self, Measure::Value(_))
    }

    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Measure {
        match self {
            Measure::Value(v) => Measure::from_f64(f(v)),
            other => other,
        }
    }

    /// Product of two measures. Any non-value operand wins, `Undefined`
    /// taking precedence over `NotApplicable`.
    pub fn mul(self, other: Measure) -> Measure {
        match (self, other) {
            (Measure::Value(a), Measure::Value(b)) => Measure::from_f64(a * b),
            (Measure::Undefined, _) | (_, Measure::Undefined) => Measure::Undefined,
            _ => Measure::NotApplicable,
        }
    }

    pub fn gt(self, threshold: f64) -> bool {
        self.value().is_some_and(|v| v > threshold)
    }

    pub fn lt(self, threshold: f64) -> bool {
        self.value().is_some_and(|v| v < threshold)
    }

    /// Fixed six-decimal rendering used by every tabular writer.
    pub fn render(self) -> String {
        match self {
            Measure::Value(v) => format!("{:.6}", v),
            Measure::Undefined => "NA".to_string(),
            Measure::NotApplicable => "-".to_string(),
        }
    }
}

impl Serialize for Measure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Measure::Value(v) => serializer.serialize_f64(*v),
            _ => serializer.serialize_none(),
        }
    }
}

/// Mean over the defined entries only. `Undefined` when none are defined.
pub fn mean_defined(values: impl IntoIterator<Item = Measure>) -> Measure {
    let mut sum = 0.0f64;
    let mut n = 0usize;
    for v in values {
        if let Measure::Value(x) = v {
            sum += x;
            n += 1;
        }
    }
    if n == 0 {
        Measure::Undefined
    } else {
        Measure::from_f64(sum / n as f64)
    }
}

/// Weighted mean over the defined entries, with weights renormalized to the
/// defined subset. `Undefined` when no entry is defined or the defined
/// weights sum to zero.
pub fn weighted_mean_defined(pairs: impl IntoIterator<Item = (f64, Measure)>) -> Measure {
    let mut acc = 0.0f64;
    let mut wsum = 0.0f64;
    for (w, v) in pairs {
        if let Measure::Value(x) = v {
            acc += w * x;
            wsum += w;
        }
    }
    if wsum <= 0.0 {
        Measure::Undefined
    } else {
        Measure::from_f64(acc / wsum)
    }
}
