use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::metrics::{
    COMPLETED_CROSSES, CROSS_EFFICIENCY, MetricCatalog, MetricKind, MetricSpec, PILLARS,
    PROGRESSIVE_CARRIES, Pillar, SUCCESSFUL_TACKLES, TACKLES_WAS_DRIBBLED,
};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown pillar '{0}' (expected build_up, creation or defending)")]
    UnknownPillar(String),
    #[error("pillar weights must name every pillar; missing '{0}'")]
    MissingPillarWeight(Pillar),
    #[error("pillar weight for {pillar} must be finite and > 0 (got {value}) in {context}")]
    InvalidWeight {
        pillar: Pillar,
        value: f64,
        context: String,
    },
    #[error("pillar weights must sum to 1 (got {sum:.6}) in {context}")]
    WeightSum { sum: f64, context: String },
    #[error("invalid threshold {name}: {reason}")]
    InvalidThreshold { name: &'static str, reason: String },
    #[error("invalid bonus table: {0}")]
    InvalidBonus(String),
    #[error("invalid feasibility settings: {0}")]
    InvalidFeasibility(String),
    #[error("invalid perturbation '{name}': {reason}")]
    InvalidPerturbation { name: String, reason: String },
    #[error("metric '{name}': {reason}")]
    InvalidMetric { name: String, reason: String },
    #[error("eligibility position set is empty")]
    EmptyPositionSet,
    #[error("reference_date is required to score contract expiry")]
    MissingReferenceDate,
    #[error("failed to read profile {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse profile {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Every tunable of a ranking run. Deserialized from TOML; any omitted
/// section falls back to `default_v1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringProfile {
    pub name: String,
    pub reference_date: Option<NaiveDate>,
    pub eligibility: EligibilityRules,
    pub standardize: StandardizeParams,
    pub pillar_weights: BTreeMap<String, f64>,
    pub bonuses: BonusTable,
    pub feasibility: FeasibilityParams,
    pub priority: PriorityParams,
    pub flags: FlagThresholds,
    pub sensitivity: SensitivityParams,
    /// Replaces the built-in metric catalog when present.
    pub metrics: Option<Vec<MetricSpec>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilityRules {
    pub positions: Vec<String>,
    pub min_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StandardizeParams {
    pub min_cohort_size: usize,
    pub clip_z: bool,
    pub z_clip: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgeBand {
    pub min_age: u32,
    pub max_age: u32,
    pub bonus: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinutesBand {
    pub min_minutes: u32,
    pub bonus: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BonusTable {
    pub age_bands: Vec<AgeBand>,
    pub minutes_bands: Vec<MinutesBand>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineRule {
    WeightedMean,
    Product,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CostCurve {
    /// `1 - minmax(ln(1 + value))` over the eligible cohort.
    LogRelative,
    /// 1 at or below `comfortable`, 0 at or above `ceiling`, linear between.
    Budget { comfortable: f64, ceiling: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContractCurve {
    /// `1 - minmax(months)` over the eligible cohort.
    Relative,
    /// 1 at or below `urgent_months`, `floor` at or above `distant_months`.
    Linear {
        urgent_months: u32,
        distant_months: u32,
        floor: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EligibilityScores {
    pub clear: f64,
    pub unknown: f64,
    pub restricted: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeasibilityParams {
    pub combine: CombineRule,
    pub value_weight: f64,
    pub contract_weight: f64,
    pub eligibility_weight: f64,
    pub restricted_cap: f64,
    pub eligibility_scores: EligibilityScores,
    pub cost_curve: CostCurve,
    pub contract_curve: ContractCurve,
}

/// Priority multiplies a non-negative performance score by feasibility.
/// Performance is `overall - performance_floor`, clamped at 0, so a more
/// feasible candidate never ranks below an equally scored, less feasible one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityParams {
    pub performance_floor: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagThresholds {
    pub crosses_metric: String,
    pub cross_efficiency_metric: String,
    pub tackles_metric: String,
    pub progression_metric: String,
    pub dribbled_metric: String,
    pub tackle_z_high: f64,
    pub progression_z_low: f64,
    pub progression_z_high: f64,
    pub dribbled_z_low: f64,
    pub low_minutes: u32,
    pub heavy_minutes: u32,
    pub advanced_age: u32,
    pub short_contract_months: u32,
    pub high_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Perturbation {
    Transfer {
        from: String,
        to: String,
        amount: f64,
    },
    Scale {
        pillar: String,
        factor: f64,
    },
    Explicit {
        name: String,
        weights: BTreeMap<String, f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensitivityParams {
    pub robust_rank_spread: usize,
    pub perturbations: Vec<Perturbation>,
}

/// Pillar weights indexed by `Pillar::index`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PillarWeights(pub [f64; 3]);

impl PillarWeights {
    pub fn get(&self, pillar: Pillar) -> f64 {
        self.0[pillar.index()]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightScenario {
    pub name: String,
    pub weights: PillarWeights,
}

/// A profile that passed validation, with names resolved to typed values.
#[derive(Debug, Clone)]
pub struct ResolvedProfile {
    pub profile: ScoringProfile,
    pub catalog: MetricCatalog,
    pub positions: BTreeSet<String>,
    pub weights: PillarWeights,
    pub scenarios: Vec<WeightScenario>,
    pub reference_date: NaiveDate,
}

impl Default for ScoringProfile {
    fn default() -> Self {
        Self::default_v1()
    }
}

impl Default for EligibilityRules {
    fn default() -> Self {
        Self {
            positions: vec!["DR".to_string(), "DMR".to_string()],
            min_minutes: 1000,
        }
    }
}

impl Default for StandardizeParams {
    fn default() -> Self {
        Self {
            min_cohort_size: 5,
            clip_z: true,
            z_clip: 3.0,
        }
    }
}

impl Default for BonusTable {
    fn default() -> Self {
        Self {
            age_bands: vec![AgeBand {
                min_age: 20,
                max_age: 27,
                bonus: 0.10,
            }],
            minutes_bands: vec![MinutesBand {
                min_minutes: 1800,
                bonus: 0.05,
            }],
        }
    }
}

impl Default for EligibilityScores {
    fn default() -> Self {
        Self {
            clear: 1.0,
            unknown: 0.7,
            restricted: 0.3,
        }
    }
}

impl Default for FeasibilityParams {
    fn default() -> Self {
        Self {
            combine: CombineRule::WeightedMean,
            value_weight: 0.6,
            contract_weight: 0.3,
            eligibility_weight: 0.1,
            restricted_cap: 0.25,
            eligibility_scores: EligibilityScores::default(),
            cost_curve: CostCurve::LogRelative,
            contract_curve: ContractCurve::Linear {
                urgent_months: 12,
                distant_months: 48,
                floor: 0.2,
            },
        }
    }
}

impl Default for PriorityParams {
    fn default() -> Self {
        // lowest overall a clipped z-score composite can reach
        Self {
            performance_floor: -3.0,
        }
    }
}

impl Default for FlagThresholds {
    fn default() -> Self {
        Self {
            crosses_metric: COMPLETED_CROSSES.to_string(),
            cross_efficiency_metric: CROSS_EFFICIENCY.to_string(),
            tackles_metric: SUCCESSFUL_TACKLES.to_string(),
            progression_metric: PROGRESSIVE_CARRIES.to_string(),
            dribbled_metric: TACKLES_WAS_DRIBBLED.to_string(),
            tackle_z_high: 1.0,
            progression_z_low: -1.0,
            progression_z_high: 1.0,
            dribbled_z_low: -0.5,
            low_minutes: 1200,
            heavy_minutes: 2500,
            advanced_age: 30,
            short_contract_months: 12,
            high_value: 10_000_000.0,
        }
    }
}

impl Default for SensitivityParams {
    fn default() -> Self {
        let mut perturbations = Vec::new();
        for from in PILLARS {
            for to in PILLARS {
                if from != to {
                    perturbations.push(Perturbation::Transfer {
                        from: from.key().to_string(),
                        to: to.key().to_string(),
                        amount: 0.10,
                    });
                }
            }
        }
        for pillar in PILLARS {
            for factor in [0.9, 1.1] {
                perturbations.push(Perturbation::Scale {
                    pillar: pillar.key().to_string(),
                    factor,
                });
            }
        }
        Self {
            robust_rank_spread: 3,
            perturbations,
        }
    }
}

impl ScoringProfile {
    pub fn default_v1() -> Self {
        let pillar_weights = [
            (Pillar::BuildUp, 0.35),
            (Pillar::Creation, 0.35),
            (Pillar::Defending, 0.30),
        ]
        .into_iter()
        .map(|(p, w)| (p.key().to_string(), w))
        .collect();
        Self {
            name: "rb_back_five_v1".to_string(),
            reference_date: None,
            eligibility: EligibilityRules::default(),
            standardize: StandardizeParams::default(),
            pillar_weights,
            bonuses: BonusTable::default(),
            feasibility: FeasibilityParams::default(),
            priority: PriorityParams::default(),
            flags: FlagThresholds::default(),
            sensitivity: SensitivityParams::default(),
            metrics: None,
        }
    }

    pub fn from_toml_str(text: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text, &path.display().to_string())
    }

    pub fn catalog(&self) -> MetricCatalog {
        match &self.metrics {
            Some(specs) => MetricCatalog::from_specs(specs.clone()),
            None => MetricCatalog::builtin(),
        }
    }

    /// Checks every structural constraint and resolves names. Nothing in
    /// the pipeline runs on an unresolved profile.
    pub fn resolve(&self) -> Result<ResolvedProfile, ConfigError> {
        let reference_date = self.reference_date.ok_or(ConfigError::MissingReferenceDate)?;

        let positions = self
            .eligibility
            .positions
            .iter()
            .map(|p| p.trim().to_ascii_uppercase())
            .filter(|p| !p.is_empty())
            .collect::<BTreeSet<_>>();
        if positions.is_empty() {
            return Err(ConfigError::EmptyPositionSet);
        }

        validate_standardize(&self.standardize)?;
        let catalog = self.catalog();
        validate_catalog(&catalog)?;
        validate_bonuses(&self.bonuses)?;
        validate_feasibility(&self.feasibility)?;
        if !self.priority.performance_floor.is_finite() {
            return Err(invalid_threshold(
                "priority.performance_floor",
                "must be finite",
            ));
        }
        validate_flags(&self.flags)?;

        let weights = parse_weights(&self.pillar_weights, "pillar_weights")?;
        let mut scenarios = vec![WeightScenario {
            name: "baseline".to_string(),
            weights,
        }];
        for p in &self.sensitivity.perturbations {
            scenarios.push(apply_perturbation(weights, p)?);
        }

        Ok(ResolvedProfile {
            profile: self.clone(),
            catalog,
            positions,
            weights,
            scenarios,
            reference_date,
        })
    }
}

fn parse_weights(raw: &BTreeMap<String, f64>, context: &str) -> Result<PillarWeights, ConfigError> {
    let mut out = [f64::NAN; 3];
    for (name, &value) in raw {
        let pillar = Pillar::parse(name).ok_or_else(|| ConfigError::UnknownPillar(name.clone()))?;
        out[pillar.index()] = value;
    }
    for pillar in PILLARS {
        if out[pillar.index()].is_nan() {
            return Err(ConfigError::MissingPillarWeight(pillar));
        }
    }
    check_weights(PillarWeights(out), context)
}

fn check_weights(weights: PillarWeights, context: &str) -> Result<PillarWeights, ConfigError> {
    for pillar in PILLARS {
        let value = weights.get(pillar);
        if !value.is_finite() || value <= 0.0 {
            return Err(ConfigError::InvalidWeight {
                pillar,
                value,
                context: context.to_string(),
            });
        }
    }
    let sum: f64 = weights.0.iter().sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(ConfigError::WeightSum {
            sum,
            context: context.to_string(),
        });
    }
    Ok(weights)
}

fn resolve_pillar(name: &str) -> Result<Pillar, ConfigError> {
    Pillar::parse(name).ok_or_else(|| ConfigError::UnknownPillar(name.to_string()))
}

pub fn apply_perturbation(
    base: PillarWeights,
    perturbation: &Perturbation,
) -> Result<WeightScenario, ConfigError> {
    match perturbation {
        Perturbation::Transfer { from, to, amount } => {
            let from = resolve_pillar(from)?;
            let to = resolve_pillar(to)?;
            let name = format!("transfer_{:.2}_{}_to_{}", amount, from, to);
            if from == to || !amount.is_finite() || *amount <= 0.0 {
                return Err(ConfigError::InvalidPerturbation {
                    name,
                    reason: "needs two distinct pillars and a positive amount".to_string(),
                });
            }
            let mut w = base.0;
            w[from.index()] -= amount;
            w[to.index()] += amount;
            let weights = check_weights(PillarWeights(w), &name)?;
            Ok(WeightScenario { name, weights })
        }
        Perturbation::Scale { pillar, factor } => {
            let pillar = resolve_pillar(pillar)?;
            let name = format!("scale_{}_x{:.2}", pillar, factor);
            if !factor.is_finite() || *factor <= 0.0 {
                return Err(ConfigError::InvalidPerturbation {
                    name,
                    reason: "factor must be finite and > 0".to_string(),
                });
            }
            let mut w = base.0;
            w[pillar.index()] *= factor;
            let sum: f64 = w.iter().sum();
            for x in &mut w {
                *x /= sum;
            }
            let weights = check_weights(PillarWeights(w), &name)?;
            Ok(WeightScenario { name, weights })
        }
        Perturbation::Explicit { name, weights } => {
            let weights = parse_weights(weights, name)?;
            Ok(WeightScenario {
                name: name.clone(),
                weights,
            })
        }
    }
}

fn invalid_threshold(name: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidThreshold {
        name,
        reason: reason.to_string(),
    }
}

fn validate_standardize(params: &StandardizeParams) -> Result<(), ConfigError> {
    if params.min_cohort_size < 2 {
        return Err(invalid_threshold(
            "standardize.min_cohort_size",
            "must be at least 2",
        ));
    }
    if params.clip_z && (!params.z_clip.is_finite() || params.z_clip <= 0.0) {
        return Err(invalid_threshold(
            "standardize.z_clip",
            "must be finite and > 0",
        ));
    }
    Ok(())
}

fn validate_catalog(catalog: &MetricCatalog) -> Result<(), ConfigError> {
    if catalog.is_empty() {
        return Err(ConfigError::InvalidMetric {
            name: "<catalog>".to_string(),
            reason: "catalog is empty".to_string(),
        });
    }
    let mut seen = BTreeSet::new();
    for m in catalog.metrics() {
        let invalid = |reason: &str| ConfigError::InvalidMetric {
            name: m.name.clone(),
            reason: reason.to_string(),
        };
        if !seen.insert(m.name.as_str()) {
            return Err(invalid("duplicate metric name"));
        }
        match m.kind {
            MetricKind::Counting | MetricKind::Rate => {
                if m.column.as_deref().is_none_or(str::is_empty) {
                    return Err(invalid("counting and rate metrics need a column"));
                }
            }
            MetricKind::Ratio => {
                if m.numerator.as_deref().is_none_or(str::is_empty)
                    || m.denominator.as_deref().is_none_or(str::is_empty)
                {
                    return Err(invalid("ratio metrics need numerator and denominator"));
                }
            }
        }
    }
    Ok(())
}

fn validate_bonuses(table: &BonusTable) -> Result<(), ConfigError> {
    for band in &table.age_bands {
        if band.min_age > band.max_age {
            return Err(ConfigError::InvalidBonus(format!(
                "age band {}..={} is empty",
                band.min_age, band.max_age
            )));
        }
        if !band.bonus.is_finite() || band.bonus < 0.0 {
            return Err(ConfigError::InvalidBonus(
                "age bonus must be finite and >= 0".to_string(),
            ));
        }
    }
    let mut prev: Option<&MinutesBand> = None;
    for band in &table.minutes_bands {
        if !band.bonus.is_finite() || band.bonus < 0.0 {
            return Err(ConfigError::InvalidBonus(
                "minutes bonus must be finite and >= 0".to_string(),
            ));
        }
        if let Some(p) = prev {
            if band.min_minutes <= p.min_minutes || band.bonus < p.bonus {
                return Err(ConfigError::InvalidBonus(
                    "minutes bands must have increasing thresholds and nondecreasing bonuses"
                        .to_string(),
                ));
            }
        }
        prev = Some(band);
    }
    Ok(())
}

fn unit_interval(v: f64) -> bool {
    v.is_finite() && (0.0..=1.0).contains(&v)
}

fn validate_feasibility(params: &FeasibilityParams) -> Result<(), ConfigError> {
    let weights = [
        params.value_weight,
        params.contract_weight,
        params.eligibility_weight,
    ];
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) || weights.iter().sum::<f64>() <= 0.0 {
        return Err(ConfigError::InvalidFeasibility(
            "sub-score weights must be finite, >= 0 and not all zero".to_string(),
        ));
    }
    let scores = &params.eligibility_scores;
    if ![scores.clear, scores.unknown, scores.restricted, params.restricted_cap]
        .into_iter()
        .all(unit_interval)
    {
        return Err(ConfigError::InvalidFeasibility(
            "eligibility scores and restricted_cap must lie in [0, 1]".to_string(),
        ));
    }
    if let CostCurve::Budget {
        comfortable,
        ceiling,
    } = params.cost_curve
    {
        if !comfortable.is_finite()
            || !ceiling.is_finite()
            || comfortable < 0.0
            || ceiling <= comfortable
        {
            return Err(ConfigError::InvalidFeasibility(
                "budget curve needs 0 <= comfortable < ceiling".to_string(),
            ));
        }
    }
    if let ContractCurve::Linear {
        urgent_months,
        distant_months,
        floor,
    } = params.contract_curve
    {
        if urgent_months >= distant_months || !unit_interval(floor) {
            return Err(ConfigError::InvalidFeasibility(
                "contract curve needs urgent_months < distant_months and floor in [0, 1]"
                    .to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_flags(flags: &FlagThresholds) -> Result<(), ConfigError> {
    let z = [
        flags.tackle_z_high,
        flags.progression_z_low,
        flags.progression_z_high,
        flags.dribbled_z_low,
    ];
    if z.iter().any(|v| !v.is_finite()) {
        return Err(invalid_threshold("flags", "z thresholds must be finite"));
    }
    if !flags.high_value.is_finite() || flags.high_value < 0.0 {
        return Err(invalid_threshold("flags.high_value", "must be finite and >= 0"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/profile.rs"]
mod tests;
