use super::*;
use crate::pipeline::fixtures::{arcs, date, record};

fn budget_params() -> FeasibilityParams {
    FeasibilityParams {
        cost_curve: CostCurve::Budget {
            comfortable: 5_000_000.0,
            ceiling: 25_000_000.0,
        },
        ..FeasibilityParams::default()
    }
}

fn player(value: Option<f64>, expiry: Option<NaiveDate>, status: EligibilityStatus) -> PlayerRecord {
    let mut r = record("a", "L", Some(2000), &[]);
    r.market_value = value;
    r.contract_expiry = expiry;
    r.eligibility_status = status;
    r
}

fn reference() -> NaiveDate {
    date(2025, 7, 1)
}

#[test]
fn test_weighted_mean_of_all_sub_scores() {
    // 30 months to expiry
    let records = arcs(vec![player(
        Some(15_000_000.0),
        Some(date(2028, 1, 15)),
        EligibilityStatus::Clear,
    )]);
    let out = run_stage6(&records, &budget_params(), reference());
    let b = &out.breakdowns[0];
    assert_eq!(b.months_to_expiry, Some(30));
    assert_eq!(b.cost, Measure::Value(0.5));
    assert!((b.contract.value().unwrap() - 0.6).abs() < 1e-12);
    assert_eq!(b.eligibility, 1.0);
    assert!((out.scores[0] - 0.58).abs() < 1e-12);
    assert!(!b.capped);
}

#[test]
fn test_restricted_record_is_capped() {
    let records = arcs(vec![player(
        Some(1_000_000.0),
        Some(date(2025, 12, 31)),
        EligibilityStatus::Restricted,
    )]);
    let out = run_stage6(&records, &budget_params(), reference());
    // 0.6 + 0.3 + 0.1 * 0.3 before the cap
    assert_eq!(out.scores[0], 0.25);
    assert!(out.breakdowns[0].capped);
}

#[test]
fn test_missing_inputs_drop_out_of_the_mean() {
    let records = arcs(vec![player(
        None,
        Some(date(2026, 1, 1)),
        EligibilityStatus::Unknown,
    )]);
    let out = run_stage6(&records, &budget_params(), reference());
    assert_eq!(out.breakdowns[0].cost, Measure::NotApplicable);
    let expected = (0.3 * 1.0 + 0.1 * 0.7) / 0.4;
    assert!((out.scores[0] - expected).abs() < 1e-12);

    let bare = arcs(vec![player(None, None, EligibilityStatus::Unknown)]);
    let out = run_stage6(&bare, &budget_params(), reference());
    assert!((out.scores[0] - 0.7).abs() < 1e-12);
    assert_eq!(out.breakdowns[0].months_to_expiry, None);
}

#[test]
fn test_product_rule() {
    let params = FeasibilityParams {
        combine: CombineRule::Product,
        ..budget_params()
    };
    let records = arcs(vec![player(
        Some(15_000_000.0),
        Some(date(2028, 1, 15)),
        EligibilityStatus::Unknown,
    )]);
    let out = run_stage6(&records, &params, reference());
    assert!((out.scores[0] - 0.5 * 0.6 * 0.7).abs() < 1e-12);
}

#[test]
fn test_log_relative_cost_curve() {
    let records = arcs(vec![
        player(Some(1_000_000.0), None, EligibilityStatus::Clear),
        player(Some(100_000_000.0), None, EligibilityStatus::Clear),
        player(Some(10_000_000.0), None, EligibilityStatus::Clear),
        player(None, None, EligibilityStatus::Clear),
    ]);
    let out = run_stage6(&records, &FeasibilityParams::default(), reference());
    assert_eq!(out.breakdowns[0].cost, Measure::Value(1.0));
    assert_eq!(out.breakdowns[1].cost, Measure::Value(0.0));
    let mid = out.breakdowns[2].cost.value().unwrap();
    assert!((mid - 0.5).abs() < 1e-3);
    assert_eq!(out.breakdowns[3].cost, Measure::NotApplicable);
    // cheaper is always at least as feasible
    assert!(out.scores[0] >= out.scores[2] && out.scores[2] >= out.scores[1]);
}

#[test]
fn test_single_valuation_scores_midpoint() {
    let records = arcs(vec![player(Some(3_000_000.0), None, EligibilityStatus::Clear)]);
    let out = run_stage6(&records, &FeasibilityParams::default(), reference());
    assert_eq!(out.breakdowns[0].cost, Measure::Value(0.5));
}

#[test]
fn test_relative_contract_curve() {
    let params = FeasibilityParams {
        contract_curve: ContractCurve::Relative,
        ..FeasibilityParams::default()
    };
    let records = arcs(vec![
        player(None, Some(date(2026, 7, 1)), EligibilityStatus::Clear),
        player(None, Some(date(2029, 7, 1)), EligibilityStatus::Clear),
    ]);
    let out = run_stage6(&records, &params, reference());
    assert_eq!(out.breakdowns[0].contract, Measure::Value(1.0));
    assert_eq!(out.breakdowns[1].contract, Measure::Value(0.0));
}

#[test]
fn test_curve_helpers() {
    assert_eq!(budget_score(1.0, 5.0, 25.0), 1.0);
    assert_eq!(budget_score(30.0, 5.0, 25.0), 0.0);
    assert_eq!(budget_score(15.0, 5.0, 25.0), 0.5);
    assert_eq!(linear_contract_score(6, 12, 48, 0.2), 1.0);
    assert_eq!(linear_contract_score(60, 12, 48, 0.2), 0.2);
    assert!((linear_contract_score(30, 12, 48, 0.2) - 0.6).abs() < 1e-12);
}

#[test]
fn test_scores_stay_in_unit_interval() {
    let params = FeasibilityParams {
        eligibility_scores: crate::model::profile::EligibilityScores {
            clear: 1.0,
            unknown: 1.0,
            restricted: 1.0,
        },
        ..budget_params()
    };
    let records = arcs(vec![
        player(Some(0.0), Some(date(2025, 1, 1)), EligibilityStatus::Clear),
        player(Some(1e12), Some(date(2040, 1, 1)), EligibilityStatus::Unknown),
    ]);
    let out = run_stage6(&records, &params, reference());
    assert!(out.scores.iter().all(|s| (0.0..=1.0).contains(s)));
}
