use super::*;
use crate::model::metrics::Pillar;
use crate::pipeline::fixtures::{arcs, rate_spec, record};

const METRIC: &str = "Interceptions per90";

fn setup(values: &[(&str, Option<f64>)]) -> (Vec<Arc<PlayerRecord>>, RateTable, MetricCatalog) {
    let records = arcs(
        values
            .iter()
            .enumerate()
            .map(|(i, (league, v))| {
                let mut r = record(&format!("p{i}"), league, Some(1800), &[]);
                r.stats.insert(METRIC.to_string(), *v);
                r
            })
            .collect(),
    );
    let rates = RateTable {
        values: values
            .iter()
            .map(|(_, v)| vec![Measure::from_option(*v)])
            .collect(),
    };
    let catalog = MetricCatalog::from_specs(vec![rate_spec(METRIC, Pillar::BuildUp)]);
    (records, rates, catalog)
}

fn z_of(out: &Stage3Output, idx: usize) -> Measure {
    out.z[idx][0]
}

#[test]
fn test_six_player_cohort_population_stats() {
    let (records, rates, catalog) = setup(&[
        ("X", Some(4.0)),
        ("X", Some(6.0)),
        ("X", Some(8.0)),
        ("X", Some(2.0)),
        ("X", Some(5.0)),
        ("X", Some(7.0)),
    ]);
    let out = run_stage3(&records, &rates, &catalog, &StandardizeParams::default());
    let cohort = &out.cohorts[0];
    assert!(cohort.usable);
    assert_eq!(cohort.n_defined, 6);
    assert!((cohort.mean.value().unwrap() - 16.0 / 3.0).abs() < 1e-12);
    assert!((cohort.stddev.value().unwrap() - 1.972027).abs() < 1e-6);

    let z8 = z_of(&out, 2).value().unwrap();
    let z2 = z_of(&out, 3).value().unwrap();
    assert!((z8 - 1.352247).abs() < 1e-5);
    assert!((z2 - -1.690309).abs() < 1e-5);

    // z-scores in a cohort sum to zero
    let sum: f64 = (0..6).filter_map(|i| z_of(&out, i).value()).sum();
    assert!(sum.abs() < 1e-9);
}

#[test]
fn test_small_cohort_left_undefined() {
    let (records, rates, catalog) = setup(&[
        ("X", Some(4.0)),
        ("X", Some(6.0)),
        ("X", Some(8.0)),
        ("X", Some(2.0)),
    ]);
    let out = run_stage3(&records, &rates, &catalog, &StandardizeParams::default());
    assert!(!out.cohorts[0].usable);
    assert!((0..4).all(|i| z_of(&out, i) == Measure::Undefined));
}

#[test]
fn test_cohort_size_counts_defined_values_only() {
    let (records, rates, catalog) = setup(&[
        ("X", Some(4.0)),
        ("X", Some(6.0)),
        ("X", Some(8.0)),
        ("X", Some(2.0)),
        ("X", None),
    ]);
    let out = run_stage3(&records, &rates, &catalog, &StandardizeParams::default());
    assert_eq!(out.cohorts[0].n_records, 5);
    assert_eq!(out.cohorts[0].n_defined, 4);
    assert!(!out.cohorts[0].usable);
}

#[test]
fn test_degenerate_cohort_left_undefined() {
    let (records, rates, catalog) = setup(&[("X", Some(50.0)); 6]);
    let out = run_stage3(&records, &rates, &catalog, &StandardizeParams::default());
    assert!(!out.cohorts[0].usable);
    assert_eq!(out.cohorts[0].stddev, Measure::Value(0.0));
    assert!((0..6).all(|i| z_of(&out, i) == Measure::Undefined));
}

#[test]
fn test_null_value_stays_undefined_in_usable_cohort() {
    let (records, rates, catalog) = setup(&[
        ("X", Some(4.0)),
        ("X", Some(6.0)),
        ("X", Some(8.0)),
        ("X", Some(2.0)),
        ("X", Some(5.0)),
        ("X", None),
    ]);
    let out = run_stage3(&records, &rates, &catalog, &StandardizeParams::default());
    assert!(out.cohorts[0].usable);
    assert_eq!(z_of(&out, 5), Measure::Undefined);
    assert!(z_of(&out, 0).is_defined());
}

#[test]
fn test_leagues_standardized_independently() {
    let base = [
        ("X", Some(4.0)),
        ("X", Some(6.0)),
        ("X", Some(8.0)),
        ("X", Some(2.0)),
        ("X", Some(5.0)),
        ("Y", Some(40.0)),
        ("Y", Some(60.0)),
        ("Y", Some(80.0)),
        ("Y", Some(20.0)),
        ("Y", Some(50.0)),
    ];
    let (records, rates, catalog) = setup(&base);
    let a = run_stage3(&records, &rates, &catalog, &StandardizeParams::default());

    let mut shifted = base;
    shifted[5].1 = Some(99.0);
    let (records, rates, catalog) = setup(&shifted);
    let b = run_stage3(&records, &rates, &catalog, &StandardizeParams::default());

    for i in 0..5 {
        assert_eq!(z_of(&a, i), z_of(&b, i));
    }
    // same shape, ten times the scale
    for i in 0..5 {
        let zx = z_of(&a, i).value().unwrap();
        let zy = z_of(&a, i + 5).value().unwrap();
        assert!((zx - zy).abs() < 1e-12);
    }
    assert_eq!(a.cohorts[0].league, "X");
    assert_eq!(a.cohorts[1].league, "Y");
}

#[test]
fn test_z_is_monotone_in_value() {
    let (records, rates, catalog) = setup(&[
        ("X", Some(10.0)),
        ("X", Some(30.0)),
        ("X", Some(20.0)),
        ("X", Some(50.0)),
        ("X", Some(40.0)),
    ]);
    let out = run_stage3(&records, &rates, &catalog, &StandardizeParams::default());
    let mut pairs = (0..5)
        .map(|i| (rates.values[i][0].value().unwrap(), z_of(&out, i).value().unwrap()))
        .collect::<Vec<_>>();
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    assert!(pairs.windows(2).all(|w| w[0].1 < w[1].1));
}

#[test]
fn test_lower_is_better_inverts_sign() {
    let values = [
        ("X", Some(4.0)),
        ("X", Some(6.0)),
        ("X", Some(8.0)),
        ("X", Some(2.0)),
        ("X", Some(5.0)),
    ];
    let (records, rates, catalog) = setup(&values);
    let up = run_stage3(&records, &rates, &catalog, &StandardizeParams::default());
    let mut spec = rate_spec(METRIC, Pillar::BuildUp);
    spec.higher_is_better = false;
    let down_catalog = MetricCatalog::from_specs(vec![spec]);
    let down = run_stage3(&records, &rates, &down_catalog, &StandardizeParams::default());
    for i in 0..5 {
        assert_eq!(z_of(&up, i).value().unwrap(), -z_of(&down, i).value().unwrap());
    }
}

#[test]
fn test_outlier_clipped_unless_disabled() {
    let mut values = vec![("X", Some(0.0)); 19];
    values.push(("X", Some(100.0)));
    let (records, rates, catalog) = setup(&values);

    let clipped = run_stage3(&records, &rates, &catalog, &StandardizeParams::default());
    assert_eq!(z_of(&clipped, 19), Measure::Value(3.0));

    let raw_params = StandardizeParams {
        clip_z: false,
        ..StandardizeParams::default()
    };
    let raw = run_stage3(&records, &rates, &catalog, &raw_params);
    let z = z_of(&raw, 19).value().unwrap();
    assert!((z - 95.0 / 475.0f64.sqrt()).abs() < 1e-9);
}

#[test]
fn test_repeated_runs_bit_identical() {
    let (records, rates, catalog) = setup(&[
        ("X", Some(4.1)),
        ("X", Some(6.3)),
        ("X", Some(8.7)),
        ("X", Some(2.2)),
        ("X", Some(5.9)),
    ]);
    let a = run_stage3(&records, &rates, &catalog, &StandardizeParams::default());
    let b = run_stage3(&records, &rates, &catalog, &StandardizeParams::default());
    for i in 0..5 {
        let za = z_of(&a, i).value().unwrap().to_bits();
        let zb = z_of(&b, i).value().unwrap().to_bits();
        assert_eq!(za, zb);
    }
}

#[test]
fn test_population_stats_empty() {
    assert_eq!(population_stats(&[]), (Measure::Undefined, Measure::Undefined));
}
