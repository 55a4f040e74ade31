use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Combined Drought Indicator severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cdi {
    None,
    Watch,
    Warning,
    Alert,
}

impl Cdi {
    pub const ALL: [Cdi; 4] = [Cdi::None, Cdi::Watch, Cdi::Warning, Cdi::Alert];

    pub fn as_str(&self) -> &'static str {
        match self {
            Cdi::None => "none",
            Cdi::Watch => "watch",
            Cdi::Warning => "warning",
            Cdi::Alert => "alert",
        }
    }
}

impl fmt::Display for Cdi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown CDI level `{0}`")]
pub struct UnknownCdi(pub String);

impl FromStr for Cdi {
    type Err = UnknownCdi;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Cdi::None),
            "watch" => Ok(Cdi::Watch),
            "warning" => Ok(Cdi::Warning),
            "alert" => Ok(Cdi::Alert),
            _ => Err(UnknownCdi(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DroughtSignals {
    pub spi12: f64,
    pub spi24: f64,
    pub cdi: Cdi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum RiskLevel {
    Watch,
    Warning,
    Alert,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Watch => "Watch",
            RiskLevel::Warning => "Warning",
            RiskLevel::Alert => "Alert",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Component weights. Callers may pass any non-negative values; the engine
/// only ever uses [`Weights::normalized`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub hazard: f64,
    pub exposure: f64,
    pub sensitivity: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Weights {
            hazard: 0.45,
            exposure: 0.35,
            sensitivity: 0.20,
        }
    }
}

impl Weights {
    /// Rescale so the three weights sum to 1.0. A zero sum falls back to the
    /// defaults.
    pub fn normalized(&self) -> Weights {
        let hazard = self.hazard.max(0.0);
        let exposure = self.exposure.max(0.0);
        let sensitivity = self.sensitivity.max(0.0);
        let sum = hazard + exposure + sensitivity;

        if sum == 0.0 || !sum.is_finite() {
            return Weights::default();
        }

        Weights {
            hazard: hazard / sum,
            exposure: exposure / sum,
            sensitivity: sensitivity / sum,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RiskComponents {
    pub hazard: f64,
    pub exposure: f64,
    pub sensitivity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskResult {
    pub risk_0_100: f64,
    pub level: RiskLevel,
    pub components: RiskComponents,
    pub explanation: String,
    pub actions: Vec<String>,
    pub species: String,
    pub node: String,
    pub month: u32,
    pub bottleneck: f64,
}

/// Per-component qualitative band. Independent of [`RiskLevel`]; the two
/// schemes are not expected to agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ComponentBand {
    Low,
    Medium,
    High,
}

impl ComponentBand {
    pub fn of(value: f64) -> ComponentBand {
        if value >= 0.70 {
            ComponentBand::High
        } else if value >= 0.40 {
            ComponentBand::Medium
        } else {
            ComponentBand::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentBand::Low => "low",
            ComponentBand::Medium => "medium",
            ComponentBand::High => "high",
        }
    }
}

/// Response urgency from the total score. Uses its own 40/70 cut points,
/// separate from [`RiskLevel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Urgency {
    Routine,
    Preparedness,
    Immediate,
}

impl Urgency {
    pub fn of(risk_0_100: f64) -> Urgency {
        if risk_0_100 >= 70.0 {
            Urgency::Immediate
        } else if risk_0_100 >= 40.0 {
            Urgency::Preparedness
        } else {
            Urgency::Routine
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Routine => "routine monitoring is sufficient",
            Urgency::Preparedness => "preparedness and close monitoring",
            Urgency::Immediate => "immediate intervention required",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpiClass {
    Normal,
    Mild,
    Moderate,
    Severe,
}

impl SpiClass {
    pub fn of(spi: f64) -> SpiClass {
        if spi <= -2.0 {
            SpiClass::Severe
        } else if spi <= -1.5 {
            SpiClass::Moderate
        } else if spi <= -1.0 {
            SpiClass::Mild
        } else {
            SpiClass::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SpiClass::Normal => "normal",
            SpiClass::Mild => "mild drought",
            SpiClass::Moderate => "moderate drought",
            SpiClass::Severe => "severe drought",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HabitatState {
    CriticalCombination,
    Moderate,
    Stable,
}

impl HabitatState {
    pub fn of(components: &RiskComponents) -> HabitatState {
        let hazard = ComponentBand::of(components.hazard);
        let exposure = ComponentBand::of(components.exposure);

        match (hazard, exposure) {
            (ComponentBand::High, ComponentBand::Medium | ComponentBand::High) => {
                HabitatState::CriticalCombination
            }
            (ComponentBand::Low, ComponentBand::Low) => HabitatState::Stable,
            _ => HabitatState::Moderate,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            HabitatState::CriticalCombination => {
                "Critical pressure combination: drought hazard is high while exposure is medium or high."
            }
            HabitatState::Moderate => "Moderate pressure: monitoring and preparedness recommended.",
            HabitatState::Stable => "Relatively stable conditions: drought hazard and exposure are both low.",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cdi_parses_trimmed_and_case_insensitive() {
        assert_eq!(" Alert ".parse::<Cdi>(), Ok(Cdi::Alert));
        assert_eq!("WATCH".parse::<Cdi>(), Ok(Cdi::Watch));
        assert!("severe".parse::<Cdi>().is_err());
    }

    #[test]
    fn cdi_order_follows_severity() {
        assert!(Cdi::None < Cdi::Watch);
        assert!(Cdi::Watch < Cdi::Warning);
        assert!(Cdi::Warning < Cdi::Alert);
    }

    #[test]
    fn normalized_weights_sum_to_one() {
        let cases = [(1.0, 1.0, 1.0), (0.2, 0.0, 0.0), (5.0, 3.0, 2.0), (0.05, 0.9, 0.3)];
        for (hazard, exposure, sensitivity) in cases {
            let w = Weights {
                hazard,
                exposure,
                sensitivity,
            }
            .normalized();
            assert!((w.hazard + w.exposure + w.sensitivity - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn zero_weights_fall_back_to_defaults() {
        let w = Weights {
            hazard: 0.0,
            exposure: 0.0,
            sensitivity: 0.0,
        }
        .normalized();
        assert_eq!(w, Weights::default());
    }

    #[test]
    fn component_bands_follow_thresholds() {
        assert_eq!(ComponentBand::of(0.70), ComponentBand::High);
        assert_eq!(ComponentBand::of(0.69), ComponentBand::Medium);
        assert_eq!(ComponentBand::of(0.40), ComponentBand::Medium);
        assert_eq!(ComponentBand::of(0.39), ComponentBand::Low);
    }

    #[test]
    fn urgency_follows_score_cut_points() {
        assert_eq!(Urgency::of(70.0), Urgency::Immediate);
        assert_eq!(Urgency::of(69.9), Urgency::Preparedness);
        assert_eq!(Urgency::of(40.0), Urgency::Preparedness);
        assert_eq!(Urgency::of(39.9), Urgency::Routine);
    }

    #[test]
    fn spi_classes_follow_thresholds() {
        assert_eq!(SpiClass::of(-2.4), SpiClass::Severe);
        assert_eq!(SpiClass::of(-1.5), SpiClass::Moderate);
        assert_eq!(SpiClass::of(-1.2), SpiClass::Mild);
        assert_eq!(SpiClass::of(-0.3), SpiClass::Normal);
    }

    #[test]
    fn habitat_state_combines_hazard_and_exposure() {
        let critical = RiskComponents {
            hazard: 0.9,
            exposure: 0.5,
            sensitivity: 0.1,
        };
        let stable = RiskComponents {
            hazard: 0.1,
            exposure: 0.2,
            sensitivity: 0.9,
        };
        let moderate = RiskComponents {
            hazard: 0.9,
            exposure: 0.1,
            sensitivity: 0.9,
        };
        assert_eq!(HabitatState::of(&critical), HabitatState::CriticalCombination);
        assert_eq!(HabitatState::of(&stable), HabitatState::Stable);
        assert_eq!(HabitatState::of(&moderate), HabitatState::Moderate);
    }
}
