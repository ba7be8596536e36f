use super::*;
use crate::model::profile::{PillarWeights, PriorityParams};
use crate::pipeline::fixtures::{arcs, record};

fn scenario(name: &str, w: [f64; 3]) -> WeightScenario {
    WeightScenario {
        name: name.to_string(),
        weights: PillarWeights(w),
    }
}

fn scenarios() -> Vec<WeightScenario> {
    vec![
        scenario("baseline", [0.35, 0.35, 0.30]),
        scenario("build_up_heavy", [0.8, 0.1, 0.1]),
        scenario("defending_heavy", [0.1, 0.1, 0.8]),
    ]
}

fn no_bonuses() -> BonusTable {
    BonusTable {
        age_bands: Vec::new(),
        minutes_bands: Vec::new(),
    }
}

struct Setup {
    records: Vec<Arc<PlayerRecord>>,
    pillars: PillarTable,
    feasibility: Stage6Output,
    scenarios: Vec<WeightScenario>,
    bonuses: BonusTable,
    priority: PriorityParams,
}

impl Setup {
    fn new() -> Self {
        let records = arcs(vec![
            record("builder", "L", Some(2000), &[]),
            record("balanced", "L", Some(2000), &[]),
            record("unmeasured", "L", Some(2000), &[]),
        ]);
        let pillars = PillarTable {
            scores: vec![
                [Measure::Value(1.0), Measure::Value(0.0), Measure::Value(0.0)],
                [Measure::Value(0.3), Measure::Value(0.3), Measure::Value(0.3)],
                [Measure::Undefined; 3],
            ],
        };
        let feasibility = Stage6Output {
            breakdowns: Vec::new(),
            scores: vec![1.0; 3],
        };
        Self {
            records,
            pillars,
            feasibility,
            scenarios: scenarios(),
            bonuses: no_bonuses(),
            priority: PriorityParams::default(),
        }
    }

    fn run(&self, robust_rank_spread: usize) -> SensitivityReport {
        run_stage8(&Stage8Inputs {
            records: &self.records,
            pillars: &self.pillars,
            feasibility: &self.feasibility,
            scenarios: &self.scenarios,
            bonuses: &self.bonuses,
            priority: &self.priority,
            robust_rank_spread,
        })
    }
}

#[test]
fn test_ranks_per_scenario() {
    let report = Setup::new().run(0);
    assert_eq!(report.scenarios.len(), 3);
    let builder = &report.candidates[0];
    assert_eq!(builder.record.player_id, "builder");
    assert_eq!(builder.ranks, vec![Some(1), Some(1), Some(2)]);
    assert_eq!(builder.best_rank, Some(1));
    assert_eq!(builder.worst_rank, Some(2));
    assert_eq!(builder.spread, Some(1));
    assert!(!builder.robust);

    let balanced = &report.candidates[1];
    assert_eq!(balanced.ranks, vec![Some(2), Some(2), Some(1)]);
}

#[test]
fn test_robust_threshold_inclusive() {
    let report = Setup::new().run(1);
    assert!(report.candidates[0].robust);
    assert!(report.candidates[1].robust);
    assert_eq!(report.robust_rank_spread, 1);
}

#[test]
fn test_unmeasured_candidate_never_ranked() {
    let report = Setup::new().run(3);
    let last = report.candidates.last().unwrap();
    assert_eq!(last.record.player_id, "unmeasured");
    assert_eq!(last.ranks, vec![None, None, None]);
    assert_eq!(last.baseline_rank(), None);
    assert_eq!(last.spread, None);
    assert!(!last.robust);
}

#[test]
fn test_candidates_follow_baseline_order() {
    let mut setup = Setup::new();
    // builder leads only when build-up dominates
    setup.scenarios[0] = scenario("baseline", [0.1, 0.1, 0.8]);
    let report = setup.run(3);
    let order = report
        .candidates
        .iter()
        .map(|c| c.record.player_id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(order, vec!["balanced", "builder", "unmeasured"]);
    assert_eq!(report.candidates[0].baseline_rank(), Some(1));
}

#[test]
fn test_feasibility_scales_every_scenario() {
    let mut setup = Setup::new();
    setup.feasibility.scores = vec![0.1, 1.0, 1.0];
    let report = setup.run(3);
    let builder = report
        .candidates
        .iter()
        .find(|c| c.record.player_id == "builder")
        .unwrap();
    assert_eq!(builder.ranks, vec![Some(2), Some(2), Some(2)]);
    assert!(builder.robust);
}

#[test]
fn test_negative_composites_keep_feasibility_order() {
    let mut setup = Setup::new();
    setup.pillars.scores[0] = [Measure::Value(-0.8); 3];
    setup.pillars.scores[1] = [Measure::Value(-0.8); 3];
    setup.feasibility.scores = vec![0.4, 0.9, 1.0];
    let report = setup.run(0);
    let order = report
        .candidates
        .iter()
        .map(|c| c.record.player_id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(order, vec!["balanced", "builder", "unmeasured"]);
    // equal pillars rank identically under every weighting
    assert!(report.candidates[0].robust);
    assert!(report.candidates[1].robust);
}
