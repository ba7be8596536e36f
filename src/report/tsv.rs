use std::io::Write;

use crate::model::metrics::PILLARS;
use crate::model::scored::ScoredRecord;
use crate::pipeline::RankingRun;
use crate::report::{clean_field, format_f64_6, format_opt};

pub fn shortlist_header(run: &RankingRun) -> Vec<String> {
    let mut header = [
        "rank",
        "player_id",
        "player",
        "team",
        "league",
        "position",
        "minutes",
        "age",
        "market_value",
        "contract_expiry",
        "months_to_expiry",
        "eligibility",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect::<Vec<_>>();
    let metrics = run.profile.catalog.metrics();
    header.extend(metrics.iter().map(|m| clean_field(&m.name)));
    header.extend(metrics.iter().map(|m| format!("z {}", clean_field(&m.name))));
    header.extend(PILLARS.iter().map(|p| p.key().to_string()));
    header.extend(
        [
            "base_score",
            "age_bonus",
            "minutes_bonus",
            "overall_score",
            "cost_score",
            "contract_score",
            "eligibility_score",
            "feasibility_capped",
            "feasibility_score",
            "priority_score",
            "best_rank",
            "worst_rank",
            "robust",
            "flags",
        ]
        .iter()
        .map(|s| s.to_string()),
    );
    header
}

pub fn write_shortlist<W: Write>(run: &RankingRun, w: &mut W) -> std::io::Result<()> {
    writeln!(w, "{}", shortlist_header(run).join("\t"))?;
    for (scored, sens) in run.shortlist.iter().zip(&run.sensitivity.candidates) {
        let mut row = identity_fields(scored);
        row.extend(scored.metric_values.iter().map(|m| m.render()));
        row.extend(scored.metric_z.iter().map(|m| m.render()));
        row.extend(scored.pillars.iter().map(|m| m.render()));
        let f = &scored.feasibility;
        row.extend([
            scored.base_score.render(),
            format_f64_6(scored.age_bonus),
            format_f64_6(scored.minutes_bonus),
            scored.overall_score.render(),
            f.cost.render(),
            f.contract.render(),
            format_f64_6(f.eligibility),
            f.capped.to_string(),
            format_f64_6(scored.feasibility_score),
            scored.priority_score.render(),
            format_opt(sens.best_rank),
            format_opt(sens.worst_rank),
            sens.robust.to_string(),
            scored
                .risk_flags
                .iter()
                .map(|flag| flag.code())
                .collect::<Vec<_>>()
                .join(";"),
        ]);
        writeln!(w, "{}", row.join("\t"))?;
    }
    Ok(())
}

fn identity_fields(scored: &ScoredRecord) -> Vec<String> {
    let r = &scored.record;
    vec![
        format_opt(scored.rank),
        clean_field(&r.player_id),
        clean_field(&r.name),
        clean_field(&r.team),
        clean_field(&r.league),
        r.position.as_deref().map(clean_field).unwrap_or_default(),
        format_opt(r.minutes_played),
        format_opt(r.age),
        r.market_value.map(format_f64_6).unwrap_or_else(|| "NA".to_string()),
        format_opt(r.contract_expiry),
        format_opt(scored.feasibility.months_to_expiry),
        r.eligibility_status.as_str().to_string(),
    ]
}

pub fn write_sensitivity<W: Write>(run: &RankingRun, w: &mut W) -> std::io::Result<()> {
    let mut header = ["baseline_rank", "player_id", "player", "team", "league"]
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>();
    header.extend(run.sensitivity.scenarios.iter().map(|s| clean_field(&s.name)));
    header.extend(
        ["best_rank", "worst_rank", "rank_spread", "robust"]
            .iter()
            .map(|s| s.to_string()),
    );
    writeln!(w, "{}", header.join("\t"))?;

    for c in &run.sensitivity.candidates {
        let mut row = vec![
            format_opt(c.baseline_rank()),
            clean_field(&c.record.player_id),
            clean_field(&c.record.name),
            clean_field(&c.record.team),
            clean_field(&c.record.league),
        ];
        row.extend(c.ranks.iter().map(|r| format_opt(*r)));
        row.extend([
            format_opt(c.best_rank),
            format_opt(c.worst_rank),
            format_opt(c.spread),
            c.robust.to_string(),
        ]);
        writeln!(w, "{}", row.join("\t"))?;
    }
    Ok(())
}

pub fn write_cohorts<W: Write>(run: &RankingRun, w: &mut W) -> std::io::Result<()> {
    writeln!(w, "league\tmetric\tn_records\tn_defined\tmean\tstddev\tusable")?;
    for c in &run.cohorts {
        writeln!(
            w,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            clean_field(&c.league),
            clean_field(&c.metric),
            c.n_records,
            c.n_defined,
            c.mean.render(),
            c.stddev.render(),
            c.usable
        )?;
    }
    Ok(())
}
