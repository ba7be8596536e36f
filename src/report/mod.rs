pub mod json;
pub mod text;
pub mod tsv;

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::model::flags::flag_order;
use crate::model::measure::Measure;
use crate::model::metrics::PILLARS;
use crate::model::profile::ScoringProfile;
use crate::pipeline::RankingRun;
use crate::pipeline::stage7_priority::median_defined;
use json::render_summary_json;
use text::render_report_text;

pub const SHORTLIST_FILE: &str = "shortlist.tsv";
pub const SENSITIVITY_FILE: &str = "sensitivity.tsv";
pub const COHORTS_FILE: &str = "cohorts.tsv";
pub const SUMMARY_FILE: &str = "summary.json";
pub const REPORT_FILE: &str = "report.txt";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize summary: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InputCounts {
    pub n_input: usize,
    pub excluded_position: usize,
    pub excluded_minutes: usize,
    pub n_eligible: usize,
    pub n_ranked: usize,
    pub n_unranked: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreMedians {
    pub priority: Option<f64>,
    pub overall: Option<f64>,
    pub feasibility: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlagCount {
    pub code: &'static str,
    pub description: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Robustness {
    pub scenarios: Vec<String>,
    pub robust_rank_spread: usize,
    pub robust_in_top: usize,
    pub fragile_in_top: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopEntry {
    pub rank: usize,
    pub player_id: String,
    pub name: String,
    pub team: String,
    pub league: String,
    pub priority: Measure,
    pub overall: Measure,
    pub feasibility: f64,
    pub pillars: BTreeMap<&'static str, Measure>,
    pub flags: Vec<&'static str>,
    pub best_rank: Option<usize>,
    pub worst_rank: Option<usize>,
    pub robust: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryData {
    pub tool: ToolMeta,
    pub profile_name: String,
    pub reference_date: NaiveDate,
    pub input: InputCounts,
    pub medians: ScoreMedians,
    pub unusable_cohorts: usize,
    pub incomplete_pillars: usize,
    pub flags: Vec<FlagCount>,
    pub robustness: Robustness,
    pub top: Vec<TopEntry>,
    pub profile: ScoringProfile,
}

/// Writes every output file into `out_dir`. `top_n` bounds the summary and
/// narrative; the TSV files always carry every eligible record.
pub fn write_reports(run: &RankingRun, out_dir: &Path, top_n: usize) -> Result<(), ReportError> {
    fs::create_dir_all(out_dir).map_err(|source| io_error(out_dir, source))?;

    write_with(&out_dir.join(SHORTLIST_FILE), |w| tsv::write_shortlist(run, w))?;
    write_with(&out_dir.join(SENSITIVITY_FILE), |w| tsv::write_sensitivity(run, w))?;
    write_with(&out_dir.join(COHORTS_FILE), |w| tsv::write_cohorts(run, w))?;

    let summary = build_summary(run, top_n);
    let json = render_summary_json(&summary)?;
    write_with(&out_dir.join(SUMMARY_FILE), |w| w.write_all(json.as_bytes()))?;
    let report = render_report_text(&summary);
    write_with(&out_dir.join(REPORT_FILE), |w| w.write_all(report.as_bytes()))?;

    tracing::info!(out_dir = %out_dir.display(), top_n, "reports written");
    Ok(())
}

fn io_error(path: &Path, source: std::io::Error) -> ReportError {
    ReportError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn write_with(
    path: &Path,
    body: impl FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
) -> Result<(), ReportError> {
    let file = File::create(path).map_err(|e| io_error(path, e))?;
    let mut w = BufWriter::new(file);
    body(&mut w).map_err(|e| io_error(path, e))?;
    w.flush().map_err(|e| io_error(path, e))
}

pub fn build_summary(run: &RankingRun, top_n: usize) -> SummaryData {
    let shortlist = &run.shortlist;
    let n_ranked = shortlist.iter().filter(|r| r.rank.is_some()).count();

    let medians = ScoreMedians {
        priority: median_defined(shortlist.iter().map(|r| r.priority_score)),
        overall: median_defined(shortlist.iter().map(|r| r.overall_score)),
        feasibility: median_defined(shortlist.iter().map(|r| Measure::Value(r.feasibility_score))),
    };

    let flags = flag_order()
        .iter()
        .map(|&flag| FlagCount {
            code: flag.code(),
            description: flag.description(),
            count: shortlist.iter().filter(|r| r.risk_flags.contains(&flag)).count(),
        })
        .collect();

    // sensitivity candidates share the shortlist's baseline order
    let top = shortlist
        .iter()
        .zip(&run.sensitivity.candidates)
        .filter_map(|(r, s)| r.rank.map(|rank| (rank, r, s)))
        .take(top_n)
        .map(|(rank, r, s)| TopEntry {
            rank,
            player_id: r.record.player_id.clone(),
            name: r.record.name.clone(),
            team: r.record.team.clone(),
            league: r.record.league.clone(),
            priority: r.priority_score,
            overall: r.overall_score,
            feasibility: r.feasibility_score,
            pillars: PILLARS.iter().map(|p| (p.key(), r.pillars[p.index()])).collect(),
            flags: r.risk_flags.iter().map(|f| f.code()).collect(),
            best_rank: s.best_rank,
            worst_rank: s.worst_rank,
            robust: s.robust,
        })
        .collect::<Vec<_>>();

    let robustness = Robustness {
        scenarios: run.sensitivity.scenarios.iter().map(|s| s.name.clone()).collect(),
        robust_rank_spread: run.sensitivity.robust_rank_spread,
        robust_in_top: top.iter().filter(|t| t.robust).count(),
        fragile_in_top: top.iter().filter(|t| !t.robust).map(|t| t.name.clone()).collect(),
    };

    SummaryData {
        tool: ToolMeta {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        profile_name: run.profile.profile.name.clone(),
        reference_date: run.profile.reference_date,
        input: InputCounts {
            n_input: run.n_input,
            excluded_position: run.excluded_position,
            excluded_minutes: run.excluded_minutes,
            n_eligible: shortlist.len(),
            n_ranked,
            n_unranked: shortlist.len() - n_ranked,
        },
        medians,
        unusable_cohorts: run.cohorts.iter().filter(|c| !c.usable).count(),
        incomplete_pillars: shortlist
            .iter()
            .filter(|r| r.pillars.iter().any(|p| !p.is_defined()))
            .count(),
        flags,
        robustness,
        top,
        profile: run.profile.profile.clone(),
    }
}

pub fn format_f64_6(v: f64) -> String {
    format!("{:.6}", v)
}

pub fn format_opt<T: ToString>(v: Option<T>) -> String {
    v.map(|x| x.to_string()).unwrap_or_else(|| "NA".to_string())
}

/// Keeps free-text fields from breaking the tab-separated layout.
pub fn clean_field(s: &str) -> String {
    s.replace(['\t', '\n', '\r'], " ")
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/mod.rs"]
mod tests;
