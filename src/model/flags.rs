use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskFlag {
    HighCrossVolumeLowEfficiency,
    DefensiveLowProgression,
    ProgressiveOneVOneRisk,
    LowMinutes,
    HighMinutesAdvancedAge,
    ShortContractHighValue,
    EligibilityRestricted,
    IncompletePillars,
}

pub fn flag_order() -> &'static [RiskFlag] {
    &[
        RiskFlag::HighCrossVolumeLowEfficiency,
        RiskFlag::DefensiveLowProgression,
        RiskFlag::ProgressiveOneVOneRisk,
        RiskFlag::LowMinutes,
        RiskFlag::HighMinutesAdvancedAge,
        RiskFlag::ShortContractHighValue,
        RiskFlag::EligibilityRestricted,
        RiskFlag::IncompletePillars,
    ]
}

impl RiskFlag {
    pub fn code(self) -> &'static str {
        match self {
            RiskFlag::HighCrossVolumeLowEfficiency => "HIGH_CROSS_VOLUME_LOW_EFFICIENCY",
            RiskFlag::DefensiveLowProgression => "DEFENSIVE_LOW_PROGRESSION",
            RiskFlag::ProgressiveOneVOneRisk => "PROGRESSIVE_ONE_V_ONE_RISK",
            RiskFlag::LowMinutes => "LOW_MINUTES",
            RiskFlag::HighMinutesAdvancedAge => "HIGH_MINUTES_ADVANCED_AGE",
            RiskFlag::ShortContractHighValue => "SHORT_CONTRACT_HIGH_VALUE",
            RiskFlag::EligibilityRestricted => "ELIGIBILITY_RESTRICTED",
            RiskFlag::IncompletePillars => "INCOMPLETE_PILLARS",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            RiskFlag::HighCrossVolumeLowEfficiency => "high cross volume; low efficiency",
            RiskFlag::DefensiveLowProgression => "defensive profile; low progression",
            RiskFlag::ProgressiveOneVOneRisk => "progressive; 1v1 risk",
            RiskFlag::LowMinutes => "low minutes",
            RiskFlag::HighMinutesAdvancedAge => "heavy workload at advanced age",
            RiskFlag::ShortContractHighValue => "short contract with high valuation",
            RiskFlag::EligibilityRestricted => "work permit / eligibility restricted",
            RiskFlag::IncompletePillars => "one or more pillars unmeasured",
        }
    }
}
