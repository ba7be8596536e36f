use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityStatus {
    Clear,
    Restricted,
    #[default]
    Unknown,
}

impl EligibilityStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" | "true" | "eligible" | "clear" => EligibilityStatus::Clear,
            "no" | "n" | "false" | "restricted" | "ineligible" => EligibilityStatus::Restricted,
            _ => EligibilityStatus::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EligibilityStatus::Clear => "clear",
            EligibilityStatus::Restricted => "restricted",
            EligibilityStatus::Unknown => "unknown",
        }
    }
}

/// One player-season row, already typed by the loader.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerRecord {
    pub player_id: String,
    pub name: String,
    pub team: String,
    pub league: String,
    pub position: Option<String>,
    pub minutes_played: Option<u32>,
    pub stats: BTreeMap<String, Option<f64>>,
    pub age: Option<u32>,
    pub market_value: Option<f64>,
    pub contract_expiry: Option<NaiveDate>,
    pub eligibility_status: EligibilityStatus,
}

impl PlayerRecord {
    pub fn stat(&self, column: &str) -> Option<f64> {
        self.stats.get(column).copied().flatten()
    }

    /// Position codes, trimmed and uppercased. A field like `DR, DMR` or
    /// `DR/DMR` yields both codes.
    pub fn position_codes(&self) -> Vec<String> {
        match &self.position {
            Some(raw) => raw
                .split([',', '/'])
                .map(|s| s.trim().to_ascii_uppercase())
                .filter(|s| !s.is_empty())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Whole months from `reference` to contract expiry, floored at zero.
    pub fn months_to_expiry(&self, reference: NaiveDate) -> Option<u32> {
        let expiry = self.contract_expiry?;
        let months = (expiry.year() - reference.year()) * 12 + expiry.month() as i32
            - reference.month() as i32;
        Some(months.max(0) as u32)
    }
}

/// The ranking input: typed records plus the declared column set, which is
/// what schema checks run against.
#[derive(Debug, Clone, Default)]
pub struct PlayerTable {
    pub columns: BTreeSet<String>,
    pub records: Vec<Arc<PlayerRecord>>,
}

impl PlayerTable {
    pub fn new(columns: impl IntoIterator<Item = String>, records: Vec<PlayerRecord>) -> Self {
        Self {
            columns: columns.into_iter().collect(),
            records: records.into_iter().map(Arc::new).collect(),
        }
    }

    /// Builds a table whose column set is the union of every record's stats.
    pub fn from_records(records: Vec<PlayerRecord>) -> Self {
        let columns = records
            .iter()
            .flat_map(|r| r.stats.keys().cloned())
            .collect::<BTreeSet<_>>();
        Self::new(columns, records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
