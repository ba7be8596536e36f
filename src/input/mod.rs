use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use thiserror::Error;

pub mod fields;

use crate::model::record::{EligibilityStatus, PlayerRecord, PlayerTable};
use fields::{Parsed, is_null_token, parse_contract_date, parse_count, parse_number};

pub const COL_ID: &str = "ID";
pub const COL_PLAYER: &str = "Player";
pub const COL_TEAM: &str = "Team";
pub const COL_LEAGUE: &str = "League";
pub const COL_POSITION: &str = "Position";
pub const COL_MINUTES: &str = "Minutes";
pub const COL_AGE: &str = "Age";
pub const COL_MARKET_VALUE: &str = "Market Value";
pub const COL_CONTRACT: &str = "Contract Expiry";
pub const COL_ELIGIBILITY: &str = "Eligibility";

const IDENTITY_COLUMNS: &[&str] = &[
    COL_ID,
    COL_PLAYER,
    COL_TEAM,
    COL_LEAGUE,
    COL_POSITION,
    COL_MINUTES,
    COL_AGE,
    COL_MARKET_VALUE,
    COL_CONTRACT,
    COL_ELIGIBILITY,
];

const REQUIRED_COLUMNS: &[&str] = &[COL_PLAYER, COL_LEAGUE, COL_POSITION, COL_MINUTES];

/// Other header spellings accepted for an identity column. The canonical
/// name wins when both are present.
const COLUMN_ALIASES: &[(&str, &[&str])] = &[
    (COL_MARKET_VALUE, &["(€) Market Value"]),
    (COL_CONTRACT, &["Contract End"]),
    (COL_ELIGIBILITY, &["GBE"]),
];

fn aliases_for(column: &str) -> &'static [&'static str] {
    COLUMN_ALIASES
        .iter()
        .find(|(canonical, _)| *canonical == column)
        .map(|(_, aliases)| *aliases)
        .unwrap_or(&[])
}

fn is_identity_column(header: &str) -> bool {
    IDENTITY_COLUMNS.contains(&header)
        || COLUMN_ALIASES
            .iter()
            .any(|(_, aliases)| aliases.contains(&header))
}

#[derive(Debug, Error)]
pub enum InputError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("required column '{column}' not found in {path}")]
    MissingColumn { column: &'static str, path: String },
    #[error("duplicate column '{column}' in {path}")]
    DuplicateColumn { column: String, path: String },
    #[error("{path} contains no player rows")]
    Empty { path: String },
}

/// Counts of cells the loader could not type and therefore left null.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub rows: usize,
    pub invalid_numeric: usize,
    pub invalid_minutes: usize,
    pub invalid_dates: usize,
    /// Non-identity columns with no numeric cell, left out of the stats.
    pub text_columns: Vec<String>,
}

pub fn open_maybe_gz(path: &Path) -> Result<Box<dyn BufRead>, InputError> {
    let file = File::open(path).map_err(|source| InputError::Io {
        path: path.display().to_string(),
        source,
    })?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

fn delimiter_for(path: &Path) -> u8 {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    if name.ends_with(".tsv") || name.ends_with(".tsv.gz") {
        b'\t'
    } else {
        b','
    }
}

pub fn load_player_table(path: &Path) -> Result<(PlayerTable, LoadReport), InputError> {
    let reader = open_maybe_gz(path)?;
    let (table, report) = read_player_table(reader, delimiter_for(path), &path.display().to_string())?;
    tracing::info!(
        path = %path.display(),
        rows = report.rows,
        columns = table.columns.len(),
        "loaded player table"
    );
    if !report.text_columns.is_empty() {
        tracing::debug!(columns = ?report.text_columns, "text columns skipped");
    }
    if report.invalid_numeric + report.invalid_minutes + report.invalid_dates > 0 {
        tracing::warn!(
            invalid_numeric = report.invalid_numeric,
            invalid_minutes = report.invalid_minutes,
            invalid_dates = report.invalid_dates,
            "unparseable cells were left null"
        );
    }
    Ok((table, report))
}

/// Parses a delimited player table. Identity columns map onto typed record
/// fields; every other numeric column becomes a nullable stat.
pub fn read_player_table<R: Read>(
    reader: R,
    delimiter: u8,
    origin: &str,
) -> Result<(PlayerTable, LoadReport), InputError> {
    let csv_err = |source| InputError::Csv {
        path: origin.to_string(),
        source,
    };
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
        .collect::<Vec<_>>();

    let mut index: BTreeMap<&str, usize> = BTreeMap::new();
    for (i, h) in headers.iter().enumerate() {
        if index.insert(h.as_str(), i).is_some() {
            return Err(InputError::DuplicateColumn {
                column: h.clone(),
                path: origin.to_string(),
            });
        }
    }
    let mut fields: BTreeMap<&'static str, usize> = BTreeMap::new();
    for &col in IDENTITY_COLUMNS {
        let found = std::iter::once(col)
            .chain(aliases_for(col).iter().copied())
            .find_map(|name| index.get(name).map(|&i| (name, i)));
        if let Some((name, i)) = found {
            if name != col {
                tracing::debug!(
                    column = col,
                    header = name,
                    "identity column matched by alias"
                );
            }
            fields.insert(col, i);
        }
    }
    for &col in REQUIRED_COLUMNS {
        if !fields.contains_key(col) {
            return Err(InputError::MissingColumn {
                column: col,
                path: origin.to_string(),
            });
        }
    }

    let stat_columns = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !h.is_empty() && !is_identity_column(h))
        .map(|(i, h)| (i, h.clone()))
        .collect::<Vec<_>>();

    let mut report = LoadReport::default();
    // stats are typed per row but only kept once each column is known numeric
    let mut pending: Vec<(PlayerRecord, Vec<Parsed<f64>>)> = Vec::new();
    for row in rdr.records() {
        let row = row.map_err(csv_err)?;
        let cell = |col: &str| -> Option<&str> {
            fields
                .get(col)
                .and_then(|&i| row.get(i))
                .filter(|v| !is_null_token(v))
        };
        let text = |col: &str| cell(col).map(str::to_string).unwrap_or_default();

        let stat_cells = stat_columns
            .iter()
            .map(|(i, _)| parse_number(row.get(*i).unwrap_or("")))
            .collect::<Vec<_>>();

        let minutes_played = match cell(COL_MINUTES).map(parse_count) {
            Some(Parsed::Value(m)) => Some(m),
            Some(Parsed::Invalid) => {
                report.invalid_minutes += 1;
                None
            }
            _ => None,
        };
        let contract_expiry = match cell(COL_CONTRACT).map(parse_contract_date) {
            Some(Parsed::Value(d)) => Some(d),
            Some(Parsed::Invalid) => {
                report.invalid_dates += 1;
                None
            }
            _ => None,
        };

        let name = text(COL_PLAYER);
        let team = text(COL_TEAM);
        let league = text(COL_LEAGUE);
        let player_id = cell(COL_ID)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}|{}|{}", name, team, league));

        let record = PlayerRecord {
            player_id,
            name,
            team,
            league,
            position: cell(COL_POSITION).map(str::to_string),
            minutes_played,
            stats: BTreeMap::new(),
            age: cell(COL_AGE).and_then(|v| parse_count(v).ok()),
            market_value: cell(COL_MARKET_VALUE).and_then(|v| parse_number(v).ok()),
            contract_expiry,
            eligibility_status: cell(COL_ELIGIBILITY)
                .map(EligibilityStatus::parse)
                .unwrap_or_default(),
        };
        pending.push((record, stat_cells));
    }

    if pending.is_empty() {
        return Err(InputError::Empty {
            path: origin.to_string(),
        });
    }

    let mut numeric = Vec::with_capacity(stat_columns.len());
    for (c, (_, name)) in stat_columns.iter().enumerate() {
        let column = || pending.iter().map(move |(_, cells)| cells[c]);
        let has_value = column().any(|p| matches!(p, Parsed::Value(_)));
        let invalid = column().filter(|p| matches!(p, Parsed::Invalid)).count();
        if !has_value && invalid > 0 {
            report.text_columns.push(name.clone());
        } else {
            report.invalid_numeric += invalid;
            numeric.push(c);
        }
    }

    let records = pending
        .into_iter()
        .map(|(mut record, cells)| {
            record.stats = numeric
                .iter()
                .map(|&c| (stat_columns[c].1.clone(), cells[c].ok()))
                .collect();
            record
        })
        .collect::<Vec<_>>();
    report.rows = records.len();
    let columns = numeric.iter().map(|&c| stat_columns[c].1.clone());
    Ok((PlayerTable::new(columns, records), report))
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/tests.rs"]
mod tests;
