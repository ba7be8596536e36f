use super::*;
use crate::model::flags::RiskFlag;
use crate::model::measure::Measure;
use crate::pipeline::fixtures::{profile, record, scouting_table};

fn run_default() -> RankingRun {
    run_pipeline(&scouting_table(), &profile()).unwrap()
}

#[test]
fn test_schema_error_lists_every_missing_column() {
    let table = PlayerTable::from_records(vec![record(
        "a",
        "L",
        Some(2000),
        &[("Interceptions", 10.0), ("% Passing", 80.0)],
    )]);
    let err = run_pipeline(&table, &profile()).unwrap_err();
    match err {
        PipelineError::Schema(e) => {
            assert!(e.missing.contains(&"Attempted Crosses".to_string()));
            assert!(!e.missing.contains(&"Interceptions".to_string()));
            assert_eq!(e.missing.len(), MetricCatalog::builtin().required_columns().len() - 2);
        }
        other => panic!("expected schema error, got {other}"),
    }
}

#[test]
fn test_config_error_surfaces_before_scoring() {
    let mut bad = profile();
    bad.pillar_weights.insert("creation".to_string(), 0.9);
    let err = run_pipeline(&scouting_table(), &bad).unwrap_err();
    assert!(matches!(err, PipelineError::Config(ConfigError::WeightSum { .. })));
}

#[test]
fn test_counts_and_eligibility() {
    let run = run_default();
    assert_eq!(run.n_input, 17);
    assert_eq!(run.excluded_position, 1);
    assert_eq!(run.excluded_minutes, 1);
    assert_eq!(run.shortlist.len(), 15);
    assert!(
        run.shortlist
            .iter()
            .all(|r| r.record.minutes_played.is_some_and(|m| m >= 1000))
    );
}

#[test]
fn test_small_league_left_unranked() {
    let run = run_default();
    let liga_c = run
        .shortlist
        .iter()
        .filter(|r| r.record.league == "Liga C")
        .collect::<Vec<_>>();
    assert_eq!(liga_c.len(), 2);
    for r in liga_c {
        assert_eq!(r.rank, None);
        assert_eq!(r.overall_score, Measure::Undefined);
        assert!(r.risk_flags.contains(&RiskFlag::IncompletePillars));
    }
    assert!(
        run.cohorts
            .iter()
            .filter(|c| c.league == "Liga C")
            .all(|c| !c.usable)
    );
}

#[test]
fn test_ranks_contiguous_and_sorted() {
    let run = run_default();
    let ranked = run
        .shortlist
        .iter()
        .take_while(|r| r.rank.is_some())
        .collect::<Vec<_>>();
    assert_eq!(ranked.len(), 13);
    for (i, r) in ranked.iter().enumerate() {
        assert_eq!(r.rank, Some(i + 1));
    }
    for pair in ranked.windows(2) {
        let a = pair[0].priority_score.value().unwrap();
        let b = pair[1].priority_score.value().unwrap();
        assert!(a >= b);
    }
    assert!(run.shortlist[13..].iter().all(|r| r.rank.is_none()));
}

#[test]
fn test_priority_is_performance_times_feasibility() {
    let run = run_default();
    let floor = run.profile.profile.priority.performance_floor;
    for r in run.shortlist.iter().filter(|r| r.rank.is_some()) {
        let overall = r.overall_score.value().unwrap();
        let priority = r.priority_score.value().unwrap();
        let performance = (overall - floor).max(0.0);
        assert!((priority - performance * r.feasibility_score).abs() < 1e-12);
        assert!(priority >= 0.0);
        assert!((0.0..=1.0).contains(&r.feasibility_score));
    }
}

#[test]
fn test_restricted_feasibility_capped() {
    let run = run_default();
    let cap = run.profile.profile.feasibility.restricted_cap;
    for r in &run.shortlist {
        if r.record.eligibility_status == crate::model::record::EligibilityStatus::Restricted {
            assert!(r.feasibility_score <= cap);
        }
    }
}

#[test]
fn test_sensitivity_baseline_matches_shortlist() {
    let run = run_default();
    assert_eq!(run.sensitivity.scenarios.len(), 13);
    assert_eq!(run.sensitivity.candidates.len(), run.shortlist.len());
    for (s, c) in run.shortlist.iter().zip(&run.sensitivity.candidates) {
        assert_eq!(s.record.player_id, c.record.player_id);
        assert_eq!(s.rank, c.baseline_rank());
    }
}

#[test]
fn test_repeated_runs_are_bit_identical() {
    let a = run_default();
    let b = run_default();
    assert_eq!(a.shortlist.len(), b.shortlist.len());
    for (x, y) in a.shortlist.iter().zip(&b.shortlist) {
        assert_eq!(x.record.player_id, y.record.player_id);
        assert_eq!(
            x.priority_score.value().map(f64::to_bits),
            y.priority_score.value().map(f64::to_bits)
        );
        assert_eq!(x.rank, y.rank);
    }
}

#[test]
fn test_input_order_does_not_change_ranking() {
    let table = scouting_table();
    let mut reversed = table.clone();
    reversed.records.reverse();
    let a = run_pipeline(&table, &profile()).unwrap();
    let b = run_pipeline(&reversed, &profile()).unwrap();
    let ids = |run: &RankingRun| {
        run.shortlist
            .iter()
            .map(|r| r.record.player_id.clone())
            .collect::<Vec<_>>()
    };
    assert_eq!(ids(&a), ids(&b));
    for (x, y) in a.shortlist.iter().zip(&b.shortlist) {
        match (x.priority_score.value(), y.priority_score.value()) {
            (Some(p), Some(q)) => assert!((p - q).abs() < 1e-9),
            (None, None) => {}
            _ => panic!("definedness differs for {}", x.record.player_id),
        }
    }
}

#[test]
fn test_check_schema_accepts_complete_table() {
    let table = scouting_table();
    assert!(check_schema(&table, &MetricCatalog::builtin()).is_ok());
}
