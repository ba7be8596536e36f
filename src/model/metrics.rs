use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pillar {
    BuildUp,
    Creation,
    Defending,
}

pub const PILLARS: [Pillar; 3] = [Pillar::BuildUp, Pillar::Creation, Pillar::Defending];

impl Pillar {
    pub fn index(self) -> usize {
        match self {
            Pillar::BuildUp => 0,
            Pillar::Creation => 1,
            Pillar::Defending => 2,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Pillar::BuildUp => "build_up",
            Pillar::Creation => "creation",
            Pillar::Defending => "defending",
        }
    }

    pub fn parse(s: &str) -> Option<Pillar> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "build_up" | "buildup" => Some(Pillar::BuildUp),
            "creation" => Some(Pillar::Creation),
            "defending" => Some(Pillar::Defending),
            _ => None,
        }
    }
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// Season total, converted to per-90.
    Counting,
    /// Percentage already normalized by the data provider.
    Rate,
    /// Derived numerator / denominator.
    Ratio,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub name: String,
    pub pillar: Pillar,
    pub kind: MetricKind,
    #[serde(default = "default_true")]
    pub higher_is_better: bool,
    #[serde(default)]
    pub column: Option<String>,
    #[serde(default)]
    pub numerator: Option<String>,
    #[serde(default)]
    pub denominator: Option<String>,
}

fn default_true() -> bool {
    true
}

impl MetricSpec {
    /// Table columns this metric reads.
    pub fn required_columns(&self) -> Vec<&str> {
        match self.kind {
            MetricKind::Counting | MetricKind::Rate => self.column.as_deref().into_iter().collect(),
            MetricKind::Ratio => self
                .numerator
                .as_deref()
                .into_iter()
                .chain(self.denominator.as_deref())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    pub name: &'static str,
    pub pillar: Pillar,
    pub kind: MetricKind,
    pub column: &'static str,
    pub denominator: Option<&'static str>,
}

pub const PROGRESSIVE_CARRIES: &str = "Progressive Carries per90";
pub const COMPLETED_CROSSES: &str = "Completed Crosses per90";
pub const CROSS_EFFICIENCY: &str = "Cross Efficiency";
pub const SUCCESSFUL_TACKLES: &str = "Successful Tackles per90";
pub const TACKLES_WAS_DRIBBLED: &str = "Tackles/Was Dribbled";

const BUILTIN_METRICS: &[MetricDef] = &[
    MetricDef {
        name: "% Passing",
        pillar: Pillar::BuildUp,
        kind: MetricKind::Rate,
        column: "% Passing",
        denominator: None,
    },
    MetricDef {
        name: PROGRESSIVE_CARRIES,
        pillar: Pillar::BuildUp,
        kind: MetricKind::Counting,
        column: "Progressive Carries",
        denominator: None,
    },
    MetricDef {
        name: "Ball Prog. by Carrying per90",
        pillar: Pillar::BuildUp,
        kind: MetricKind::Counting,
        column: "Ball Prog. by Carrying",
        denominator: None,
    },
    MetricDef {
        name: "Pass Receipts in Space per90",
        pillar: Pillar::BuildUp,
        kind: MetricKind::Counting,
        column: "Pass Receipts in Space Completed",
        denominator: None,
    },
    MetricDef {
        name: "% Passing Under Pressure",
        pillar: Pillar::BuildUp,
        kind: MetricKind::Rate,
        column: "% Passing Under Pressure",
        denominator: None,
    },
    MetricDef {
        name: "Expected Assists per90",
        pillar: Pillar::Creation,
        kind: MetricKind::Counting,
        column: "Expected Assists",
        denominator: None,
    },
    MetricDef {
        name: "Open Play Key Passes per90",
        pillar: Pillar::Creation,
        kind: MetricKind::Counting,
        column: "Open Play Key Passes",
        denominator: None,
    },
    MetricDef {
        name: COMPLETED_CROSSES,
        pillar: Pillar::Creation,
        kind: MetricKind::Counting,
        column: "Completed Crosses",
        denominator: None,
    },
    MetricDef {
        name: CROSS_EFFICIENCY,
        pillar: Pillar::Creation,
        kind: MetricKind::Ratio,
        column: "Completed Crosses",
        denominator: Some("Attempted Crosses"),
    },
    MetricDef {
        name: "xT Passing per90",
        pillar: Pillar::Creation,
        kind: MetricKind::Counting,
        column: "xT Passing",
        denominator: None,
    },
    MetricDef {
        name: SUCCESSFUL_TACKLES,
        pillar: Pillar::Defending,
        kind: MetricKind::Counting,
        column: "Successful Tackles",
        denominator: None,
    },
    MetricDef {
        name: "Interceptions per90",
        pillar: Pillar::Defending,
        kind: MetricKind::Counting,
        column: "Interceptions",
        denominator: None,
    },
    MetricDef {
        name: TACKLES_WAS_DRIBBLED,
        pillar: Pillar::Defending,
        kind: MetricKind::Rate,
        column: "Tackles/Was Dribbled",
        denominator: None,
    },
    MetricDef {
        name: "% Aerial Wins",
        pillar: Pillar::Defending,
        kind: MetricKind::Rate,
        column: "% Aerial Wins",
        denominator: None,
    },
];

pub fn builtin_metrics() -> &'static [MetricDef] {
    BUILTIN_METRICS
}

impl From<&MetricDef> for MetricSpec {
    fn from(def: &MetricDef) -> Self {
        match def.kind {
            MetricKind::Ratio => MetricSpec {
                name: def.name.to_string(),
                pillar: def.pillar,
                kind: def.kind,
                higher_is_better: true,
                column: None,
                numerator: Some(def.column.to_string()),
                denominator: def.denominator.map(str::to_string),
            },
            _ => MetricSpec {
                name: def.name.to_string(),
                pillar: def.pillar,
                kind: def.kind,
                higher_is_better: true,
                column: Some(def.column.to_string()),
                numerator: None,
                denominator: None,
            },
        }
    }
}

/// Immutable, ordered set of scored metrics. Every per-metric column in
/// the pipeline is aligned with this order.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricCatalog {
    metrics: Vec<MetricSpec>,
}

impl MetricCatalog {
    pub fn builtin() -> Self {
        Self {
            metrics: builtin_metrics().iter().map(MetricSpec::from).collect(),
        }
    }

    pub fn from_specs(metrics: Vec<MetricSpec>) -> Self {
        Self { metrics }
    }

    pub fn metrics(&self) -> &[MetricSpec] {
        &self.metrics
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.metrics.iter().position(|m| m.name == name)
    }

    /// Metric indices grouped per pillar, in catalog order.
    pub fn pillar_members(&self) -> [Vec<usize>; 3] {
        let mut out: [Vec<usize>; 3] = Default::default();
        for (idx, m) in self.metrics.iter().enumerate() {
            out[m.pillar.index()].push(idx);
        }
        out
    }

    /// Deduplicated, sorted list of columns the catalog reads.
    pub fn required_columns(&self) -> Vec<String> {
        let mut cols: Vec<String> = self
            .metrics
            .iter()
            .flat_map(|m| m.required_columns())
            .map(str::to_string)
            .collect();
        cols.sort();
        cols.dedup();
        cols
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/metrics.rs"]
mod tests;
