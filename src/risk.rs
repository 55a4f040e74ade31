use crate::graph::{bottleneck_scores, BottleneckScores, CorridorGraph};
use crate::models::{Cdi, DroughtSignals, RiskComponents, RiskLevel, RiskResult, Urgency, Weights};

pub fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        return 0.0;
    }
    x.clamp(0.0, 1.0)
}

/// Drought hazard from a single SPI value. Only negative SPI contributes;
/// magnitude saturates at 3.
pub fn spi_to_hazard(spi: f64) -> f64 {
    if spi >= 0.0 {
        return 0.0;
    }
    clamp01(spi.abs() / 3.0)
}

pub fn cdi_boost(cdi: Cdi) -> f64 {
    match cdi {
        Cdi::None => 0.00,
        Cdi::Watch => 0.15,
        Cdi::Warning => 0.30,
        Cdi::Alert => 0.45,
    }
}

pub fn drought_hazard(signals: &DroughtSignals) -> f64 {
    let h_spi = 0.45 * spi_to_hazard(signals.spi12) + 0.45 * spi_to_hazard(signals.spi24);
    clamp01(h_spi + cdi_boost(signals.cdi))
}

pub fn exposure_from_scores(scores: &BottleneckScores, node: &str, base_water_stress: f64) -> f64 {
    let btw = scores.get(node).copied().unwrap_or(0.0);
    clamp01(0.55 * btw + 0.45 * clamp01(base_water_stress))
}

pub fn exposure_from_graph(graph: &CorridorGraph, node: &str, base_water_stress: f64) -> f64 {
    exposure_from_scores(&bottleneck_scores(graph), node, base_water_stress)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KnownSpecies {
    Flamingo,
    Pelican,
}

impl KnownSpecies {
    fn parse(name: &str) -> Option<KnownSpecies> {
        match name.trim().to_lowercase().as_str() {
            "flamingo" => Some(KnownSpecies::Flamingo),
            "pelican" => Some(KnownSpecies::Pelican),
            _ => None,
        }
    }
}

/// Seasonal sensitivity by species and calendar month. Unknown species get
/// the neutral 0.50.
pub fn species_sensitivity(species: &str, month: u32) -> f64 {
    match KnownSpecies::parse(species) {
        Some(KnownSpecies::Flamingo) => match month {
            6 | 7 => 0.90,
            4 | 5 | 8 => 0.70,
            _ => 0.40,
        },
        Some(KnownSpecies::Pelican) => match month {
            6 => 0.90,
            5 | 7 => 0.75,
            _ => 0.45,
        },
        None => {
            tracing::warn!(species, "no sensitivity profile, using neutral default");
            0.50
        }
    }
}

pub fn risk_level(risk_0_100: f64) -> RiskLevel {
    if risk_0_100 >= 80.0 {
        RiskLevel::Alert
    } else if risk_0_100 >= 60.0 {
        RiskLevel::Warning
    } else {
        RiskLevel::Watch
    }
}

pub fn recommended_actions(level: RiskLevel) -> Vec<String> {
    let actions: &[&str] = match level {
        RiskLevel::Alert => &[
            "Coordinate emergency measures to stabilise environmental flow and water levels during the critical window (especially June to August).",
            "Run rapid field checks at breeding and feeding sites: water level, salinity, and accessible shallow areas.",
            "Accelerate monitoring to weekly status reports matched against SPI/CDI risk indicators.",
        ],
        RiskLevel::Warning => &[
            "Prepare a preventive plan for summer water withdrawal and flow conflicts (irrigation efficiency and scheduling).",
            "Apply protection and access management on critical habitat patches such as shallows and freshwater marshes.",
            "Start collecting observation signals (local surveys, eBird) to calibrate the risk score.",
        ],
        RiskLevel::Watch => &[
            "Track drought signals (SPI/CDI) monthly and switch to the Warning protocol when a threshold is crossed.",
            "Keep the baseline monitoring plan ready at corridor nodes (Gediz, Kerkini, Tuz).",
            "Set record-keeping standards so future counts or telemetry can be connected to the model.",
        ],
    };
    actions.iter().map(|a| a.to_string()).collect()
}

fn cdi_label(cdi: Cdi) -> &'static str {
    match cdi {
        Cdi::None => "CDI: none",
        Cdi::Watch => "CDI: Watch",
        Cdi::Warning => "CDI: Warning",
        Cdi::Alert => "CDI: Alert",
    }
}

fn bottleneck_role(score: f64) -> &'static str {
    if score >= 0.25 {
        "a major bottleneck"
    } else if score > 0.0 {
        "a connecting bottleneck"
    } else {
        "no bottleneck role"
    }
}

pub fn explain(
    level: RiskLevel,
    signals: &DroughtSignals,
    node: &str,
    bottleneck: f64,
    month: u32,
    species: &str,
) -> String {
    format!(
        "Risk is {level} because drought indicators (SPI-12={:.2}, SPI-24={:.2}, {}) drive the hazard contribution; \
         node {node} plays {} in the corridor (betweenness {:.3}); \
         month {month} is weighed against the seasonal sensitivity window (species={species}).",
        signals.spi12,
        signals.spi24,
        cdi_label(signals.cdi),
        bottleneck_role(bottleneck),
        bottleneck,
    )
}

/// One decimal place, ties to even.
pub fn round_to_tenth(x: f64) -> f64 {
    (x * 10.0).round_ties_even() / 10.0
}

/// Score one node for one species against the given drought signals.
pub fn compute_risk(
    graph_for_species: &CorridorGraph,
    species: &str,
    node: &str,
    month: u32,
    signals: &DroughtSignals,
    base_water_stress: f64,
    weights: Option<&Weights>,
) -> RiskResult {
    let scores = bottleneck_scores(graph_for_species);
    compute_risk_with_scores(
        &scores,
        species,
        node,
        month,
        signals,
        base_water_stress,
        weights,
    )
}

/// Same as [`compute_risk`] over bottleneck scores the caller already holds.
pub fn compute_risk_with_scores(
    scores: &BottleneckScores,
    species: &str,
    node: &str,
    month: u32,
    signals: &DroughtSignals,
    base_water_stress: f64,
    weights: Option<&Weights>,
) -> RiskResult {
    let w = weights.copied().unwrap_or_default().normalized();

    let components = RiskComponents {
        hazard: drought_hazard(signals),
        exposure: exposure_from_scores(scores, node, base_water_stress),
        sensitivity: species_sensitivity(species, month),
    };

    let r01 = clamp01(
        w.hazard * components.hazard
            + w.exposure * components.exposure
            + w.sensitivity * components.sensitivity,
    );
    let risk_0_100 = round_to_tenth(r01 * 100.0);
    let level = risk_level(risk_0_100);
    let bottleneck = scores.get(node).copied().unwrap_or(0.0);

    tracing::debug!(
        species,
        node,
        month,
        hazard = components.hazard,
        exposure = components.exposure,
        sensitivity = components.sensitivity,
        risk = risk_0_100,
        "computed corridor risk"
    );

    RiskResult {
        risk_0_100,
        level,
        components,
        explanation: explain(level, signals, node, bottleneck, month, species),
        actions: recommended_actions(level),
        species: species.to_string(),
        node: node.to_string(),
        month,
        bottleneck,
    }
}

const BREEDING_WATER_LEVELS: &str = "Keep water levels stable across breeding areas.";
const IRRIGATION_EFFICIENCY: &str =
    "Apply short-term water management measures that raise irrigation efficiency.";

fn urgency_actions(urgency: Urgency) -> &'static [&'static str] {
    match urgency {
        Urgency::Immediate => &[
            "Protect environmental flow in the delta without delay.",
            "Limit water withdrawals for the duration of the drought.",
        ],
        Urgency::Preparedness => &[
            "Intensify monitoring of salinity and habitat change.",
            IRRIGATION_EFFICIENCY,
        ],
        Urgency::Routine => &["Continue routine observation and data collection."],
    }
}

/// Advisories for the score's urgency tier, adjusted for season and
/// exposure. These sit on top of the static per-level actions.
pub fn situational_advisories(result: &RiskResult) -> Vec<String> {
    let mut advisories: Vec<String> = urgency_actions(Urgency::of(result.risk_0_100))
        .iter()
        .map(|a| a.to_string())
        .collect();

    let breeding_season = (4..=8).contains(&result.month);
    if breeding_season && result.components.sensitivity >= 0.7 {
        advisories.insert(0, BREEDING_WATER_LEVELS.to_string());
    }
    if result.components.exposure >= 0.6 && !advisories.iter().any(|a| a == IRRIGATION_EFFICIENCY) {
        advisories.push(IRRIGATION_EFFICIENCY.to_string());
    }
    advisories
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{build_corridor_graph, subgraph_for_species};

    fn signals(spi12: f64, spi24: f64, cdi: Cdi) -> DroughtSignals {
        DroughtSignals { spi12, spi24, cdi }
    }

    fn gediz_scores(value: f64) -> BottleneckScores {
        BottleneckScores::from([("Gediz".to_string(), value)])
    }

    #[test]
    fn non_negative_spi_has_no_hazard() {
        for spi in [0.0, 0.1, 1.5, 3.0, 12.0] {
            assert_eq!(spi_to_hazard(spi), 0.0);
        }
    }

    #[test]
    fn spi_hazard_saturates_at_minus_three() {
        for spi in [-3.0, -3.5, -10.0] {
            assert_eq!(spi_to_hazard(spi), 1.0);
        }
    }

    #[test]
    fn spi_hazard_is_non_increasing() {
        let mut previous = f64::INFINITY;
        let mut spi = -5.0;
        while spi <= 2.0 {
            let h = spi_to_hazard(spi);
            assert!(h <= previous);
            previous = h;
            spi += 0.25;
        }
    }

    #[test]
    fn hazard_grows_with_cdi_severity() {
        let mut previous = -1.0;
        for cdi in Cdi::ALL {
            let h = drought_hazard(&signals(-1.2, -0.4, cdi));
            assert!(h >= previous);
            previous = h;
        }
    }

    #[test]
    fn components_are_clamped() {
        let extreme = signals(-40.0, -40.0, Cdi::Alert);
        assert_eq!(drought_hazard(&extreme), 1.0);
        assert_eq!(exposure_from_scores(&gediz_scores(1.0), "Gediz", 25.0), 1.0);
        assert_eq!(exposure_from_scores(&gediz_scores(0.0), "Gediz", -3.0), 0.0);

        let result = compute_risk_with_scores(
            &gediz_scores(1.0),
            "Flamingo",
            "Gediz",
            7,
            &extreme,
            50.0,
            Some(&Weights {
                hazard: 9.0,
                exposure: 9.0,
                sensitivity: 9.0,
            }),
        );
        assert!((0.0..=100.0).contains(&result.risk_0_100));
    }

    #[test]
    fn missing_node_has_no_centrality_contribution() {
        let e = exposure_from_scores(&BottleneckScores::new(), "Atlantis", 0.5);
        assert!((e - 0.225).abs() < 1e-12);
    }

    #[test]
    fn exposure_from_graph_uses_centrality() {
        let pelican = subgraph_for_species(&build_corridor_graph(), "Pelican");
        // Gediz lies between {Tuna, Kerkini} and EastMed: 2 pairs of 20.
        let e = exposure_from_graph(&pelican, "Gediz", 0.5);
        assert!((e - (0.55 * 0.1 + 0.225)).abs() < 1e-9);
    }

    #[test]
    fn sensitivity_tables() {
        assert_eq!(species_sensitivity("Flamingo", 7), 0.90);
        assert_eq!(species_sensitivity("FLAMINGO", 5), 0.70);
        assert_eq!(species_sensitivity("flamingo", 1), 0.40);
        assert_eq!(species_sensitivity("Pelican", 6), 0.90);
        assert_eq!(species_sensitivity("pelican", 7), 0.75);
        assert_eq!(species_sensitivity("Pelican", 11), 0.45);
        assert_eq!(species_sensitivity("Stork", 6), 0.50);
    }

    #[test]
    fn levels_follow_thresholds() {
        assert_eq!(risk_level(80.0), RiskLevel::Alert);
        assert_eq!(risk_level(79.9), RiskLevel::Warning);
        assert_eq!(risk_level(60.0), RiskLevel::Warning);
        assert_eq!(risk_level(59.9), RiskLevel::Watch);
    }

    #[test]
    fn actions_are_static_per_level() {
        for level in [RiskLevel::Watch, RiskLevel::Warning, RiskLevel::Alert] {
            let actions = recommended_actions(level);
            assert!((2..=3).contains(&actions.len()));
            assert_eq!(actions, recommended_actions(level));
        }
        assert_ne!(
            recommended_actions(RiskLevel::Alert),
            recommended_actions(RiskLevel::Watch)
        );
    }

    #[test]
    fn gediz_flamingo_july_scenario() {
        let result = compute_risk_with_scores(
            &gediz_scores(0.4),
            "Flamingo",
            "Gediz",
            7,
            &signals(-2.0, -1.0, Cdi::Alert),
            0.9,
            None,
        );

        assert!((result.components.hazard - 0.90).abs() < 1e-9);
        assert!((result.components.exposure - 0.625).abs() < 1e-9);
        assert!((result.components.sensitivity - 0.90).abs() < 1e-9);
        assert_eq!(result.risk_0_100, 80.4);
        assert_eq!(result.level, RiskLevel::Alert);
        assert_eq!(result.actions, recommended_actions(RiskLevel::Alert));
    }

    #[test]
    fn explanation_references_inputs() {
        let result = compute_risk_with_scores(
            &gediz_scores(0.4),
            "Flamingo",
            "Gediz",
            7,
            &signals(-2.0, -1.0, Cdi::Alert),
            0.9,
            None,
        );

        for needle in [
            "Alert",
            "SPI-12=-2.00",
            "SPI-24=-1.00",
            "CDI: Alert",
            "Gediz",
            "0.400",
            "month 7",
            "species=Flamingo",
        ] {
            assert!(
                result.explanation.contains(needle),
                "explanation missing `{needle}`: {}",
                result.explanation
            );
        }
    }

    #[test]
    fn supplied_weights_are_renormalized() {
        let doubled = Weights {
            hazard: 0.9,
            exposure: 0.7,
            sensitivity: 0.4,
        };
        let scores = gediz_scores(0.4);
        let s = signals(-2.0, -1.0, Cdi::Alert);
        let a = compute_risk_with_scores(&scores, "Flamingo", "Gediz", 7, &s, 0.9, Some(&doubled));
        let b = compute_risk_with_scores(&scores, "Flamingo", "Gediz", 7, &s, 0.9, None);
        assert_eq!(a.risk_0_100, b.risk_0_100);
    }

    #[test]
    fn compute_risk_uses_species_subgraph() {
        let flamingo = subgraph_for_species(&build_corridor_graph(), "Flamingo");
        let result = compute_risk(
            &flamingo,
            "Flamingo",
            "Gediz",
            6,
            &signals(-1.5, -1.5, Cdi::Warning),
            0.9,
            None,
        );
        assert!((result.bottleneck - 0.1).abs() < 1e-9);
        assert_eq!(result.node, "Gediz");
        assert_eq!(result.month, 6);
    }

    fn scored(risk_0_100: f64, month: u32, exposure: f64, sensitivity: f64) -> RiskResult {
        let components = RiskComponents {
            hazard: 0.5,
            exposure,
            sensitivity,
        };
        let level = risk_level(risk_0_100);
        RiskResult {
            risk_0_100,
            level,
            components,
            explanation: String::new(),
            actions: recommended_actions(level),
            species: "Flamingo".to_string(),
            node: "Gediz".to_string(),
            month,
            bottleneck: 0.0,
        }
    }

    #[test]
    fn ties_round_to_even() {
        assert_eq!(round_to_tenth(56.25), 56.2);
        assert_eq!(round_to_tenth(56.35), 56.4);
        assert_eq!(round_to_tenth(80.375), 80.4);

        let result = compute_risk_with_scores(
            &gediz_scores(0.0),
            "Stork",
            "Gediz",
            1,
            &signals(0.0, 0.0, Cdi::Alert),
            0.0,
            Some(&Weights {
                hazard: 0.5,
                exposure: 0.0,
                sensitivity: 0.5,
            }),
        );
        // 0.5 * 0.45 + 0.5 * 0.50 = 0.475
        assert_eq!(result.risk_0_100, 47.5);
    }

    #[test]
    fn urgency_tiers_switch_at_seventy_and_forty() {
        let immediate = situational_advisories(&scored(70.0, 1, 0.1, 0.1));
        assert_eq!(immediate, urgency_actions(Urgency::Immediate).to_vec());

        let preparedness = situational_advisories(&scored(69.9, 1, 0.1, 0.1));
        assert_eq!(preparedness, urgency_actions(Urgency::Preparedness).to_vec());
        assert_eq!(situational_advisories(&scored(40.0, 1, 0.1, 0.1)), preparedness);

        let routine = situational_advisories(&scored(39.9, 1, 0.1, 0.1));
        assert_eq!(routine, vec!["Continue routine observation and data collection."]);
    }

    #[test]
    fn breeding_advisory_comes_first() {
        let advisories = situational_advisories(&scored(75.0, 6, 0.1, 0.9));
        assert_eq!(advisories[0], BREEDING_WATER_LEVELS);
        assert_eq!(advisories.len(), 3);

        let winter = situational_advisories(&scored(75.0, 12, 0.1, 0.9));
        assert!(!winter.iter().any(|a| a == BREEDING_WATER_LEVELS));
    }

    #[test]
    fn irrigation_advisory_is_not_duplicated() {
        let preparedness = situational_advisories(&scored(50.0, 1, 0.8, 0.1));
        let count = preparedness
            .iter()
            .filter(|a| a.as_str() == IRRIGATION_EFFICIENCY)
            .count();
        assert_eq!(count, 1);
        assert_eq!(preparedness.len(), 2);

        let immediate = situational_advisories(&scored(85.0, 1, 0.8, 0.1));
        assert_eq!(immediate.last().map(String::as_str), Some(IRRIGATION_EFFICIENCY));
        assert_eq!(immediate.len(), 3);
    }

    #[test]
    fn gediz_july_advisories_in_order() {
        let july = compute_risk_with_scores(
            &gediz_scores(0.4),
            "Flamingo",
            "Gediz",
            7,
            &signals(-2.0, -1.0, Cdi::Alert),
            0.9,
            None,
        );
        let advisories = situational_advisories(&july);
        assert_eq!(advisories.len(), 4);
        assert_eq!(advisories[0], BREEDING_WATER_LEVELS);
        assert_eq!(advisories[3], IRRIGATION_EFFICIENCY);
    }
}
