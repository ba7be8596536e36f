use std::collections::BTreeSet;

use super::*;
use crate::pipeline::fixtures::record;

fn positions(codes: &[&str]) -> BTreeSet<String> {
    codes.iter().map(|c| c.to_string()).collect()
}

#[test]
fn test_position_and_minutes_filter() {
    let mut dual = record("a", "L", Some(1500), &[]);
    dual.position = Some("DMR/ WBR".to_string());
    let mut left = record("b", "L", Some(3000), &[]);
    left.position = Some("DL".to_string());
    let short = record("c", "L", Some(999), &[]);
    let exact = record("d", "L", Some(1000), &[]);
    let table = PlayerTable::from_records(vec![dual, left, short, exact]);

    let out = run_stage1(&table, &positions(&["DR", "DMR"]), 1000);
    let ids = out
        .eligible
        .iter()
        .map(|r| r.player_id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["a", "d"]);
    assert_eq!(out.excluded_position, 1);
    assert_eq!(out.excluded_minutes, 1);
}

#[test]
fn test_null_minutes_never_eligible() {
    let table = PlayerTable::from_records(vec![record("a", "L", None, &[])]);
    let out = run_stage1(&table, &positions(&["DR"]), 0);
    assert!(out.eligible.is_empty());
    assert_eq!(out.excluded_minutes, 1);
}

#[test]
fn test_missing_position_excluded() {
    let mut rec = record("a", "L", Some(2000), &[]);
    rec.position = None;
    let out = run_stage1(&PlayerTable::from_records(vec![rec]), &positions(&["DR"]), 0);
    assert!(out.eligible.is_empty());
    assert_eq!(out.excluded_position, 1);
    assert_eq!(out.excluded_minutes, 0);
}

#[test]
fn test_preserves_input_order() {
    let table = PlayerTable::from_records(vec![
        record("z", "L", Some(2000), &[]),
        record("a", "L", Some(2000), &[]),
    ]);
    let out = run_stage1(&table, &positions(&["DR"]), 1000);
    assert_eq!(out.eligible[0].player_id, "z");
    assert_eq!(out.eligible[1].player_id, "a");
}
