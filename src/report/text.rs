use crate::model::measure::Measure;
use crate::report::{SummaryData, TopEntry, format_f64_6};

pub fn render_report_text(data: &SummaryData) -> String {
    let mut out = String::new();

    out.push_str("Right Wing-Back Shortlist Report\n");
    out.push_str("================================\n\n");
    out.push_str(&format!("Profile: {}\n", data.profile_name));
    out.push_str(&format!("Reference date: {}\n", data.reference_date));
    let input = &data.input;
    out.push_str(&format!(
        "Records: {} input, {} eligible ({} excluded by position, {} by minutes)\n",
        input.n_input, input.n_eligible, input.excluded_position, input.excluded_minutes
    ));
    out.push_str(&format!(
        "Ranked: {} ({} without a defined priority)\n\n",
        input.n_ranked, input.n_unranked
    ));

    out.push_str(&format!("1. Top {} by priority\n", data.top.len()));
    if data.top.is_empty() {
        out.push_str("No record has a defined priority score.\n");
    }
    for entry in &data.top {
        push_entry(&mut out, entry);
    }
    out.push('\n');

    out.push_str("2. Score medians (eligible records)\n");
    out.push_str(&format!("Priority: {}\n", opt6(data.medians.priority)));
    out.push_str(&format!("Overall: {}\n", opt6(data.medians.overall)));
    out.push_str(&format!("Feasibility: {}\n\n", opt6(data.medians.feasibility)));

    out.push_str("3. Risk flags\n");
    let raised = data.flags.iter().filter(|f| f.count > 0).collect::<Vec<_>>();
    if raised.is_empty() {
        out.push_str("No risk flags raised.\n");
    }
    for f in raised {
        out.push_str(&format!("{}: {} ({})\n", f.code, f.count, f.description));
    }
    out.push('\n');

    out.push_str("4. Weight sensitivity\n");
    let rob = &data.robustness;
    out.push_str(&format!(
        "Scenarios evaluated: {} (baseline plus {} perturbations)\n",
        rob.scenarios.len(),
        rob.scenarios.len().saturating_sub(1)
    ));
    out.push_str(&format!(
        "Robust in top {}: {} (rank spread <= {})\n",
        data.top.len(),
        rob.robust_in_top,
        rob.robust_rank_spread
    ));
    if rob.fragile_in_top.is_empty() {
        out.push_str("Conclusion: the top of the shortlist is stable under reweighting.\n\n");
    } else {
        out.push_str(&format!(
            "Weight-sensitive: {}\nConclusion: positions of these players depend on the pillar weights; review before acting.\n\n",
            rob.fragile_in_top.join(", ")
        ));
    }

    out.push_str("5. Quality and caveats\n");
    out.push_str(&format!(
        "Unusable league cohorts (metric, league pairs): {}\n",
        data.unusable_cohorts
    ));
    out.push_str(&format!(
        "Records with an unmeasured pillar: {}\n",
        data.incomplete_pillars
    ));
    if data.unusable_cohorts > 0 {
        out.push_str(
            "Note: metrics from small or degenerate league cohorts carry no z-score and do not contribute to pillars.\n",
        );
    }

    out
}

fn push_entry(out: &mut String, e: &TopEntry) {
    out.push_str(&format!(
        "{:>3}. {} ({}, {})  priority {}  overall {}  feasibility {}\n",
        e.rank,
        e.name,
        e.team,
        e.league,
        e.priority.render(),
        e.overall.render(),
        format_f64_6(e.feasibility)
    ));
    let pillars = e
        .pillars
        .iter()
        .map(|(k, v)| format!("{}={}", k, v.render()))
        .collect::<Vec<_>>()
        .join(", ");
    out.push_str(&format!("     pillars: {}\n", pillars));
    if !e.flags.is_empty() {
        out.push_str(&format!("     flags: {}\n", e.flags.join(", ")));
    }
    out.push_str(&format!("     robustness: {}\n", robustness_statement(e)));
}

fn robustness_statement(e: &TopEntry) -> String {
    match (e.best_rank, e.worst_rank) {
        (Some(best), Some(worst)) if e.robust => {
            format!("robust (ranks {}-{} across scenarios)", best, worst)
        }
        (Some(best), Some(worst)) => {
            format!("weight-sensitive (ranks {}-{} across scenarios)", best, worst)
        }
        _ => "not ranked in every scenario".to_string(),
    }
}

fn opt6(v: Option<f64>) -> String {
    Measure::from_option(v).render()
}
