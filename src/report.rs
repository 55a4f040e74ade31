use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::graph::BottleneckScores;
use crate::models::{ComponentBand, DroughtSignals, HabitatState, RiskResult, SpiClass, Urgency};
use crate::risk;

#[derive(Debug, Serialize)]
pub struct EvaluationReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub region: &'a str,
    pub signals: &'a DroughtSignals,
    pub result: &'a RiskResult,
    pub habitat_state: HabitatState,
    pub urgency: Urgency,
    pub advisories: Vec<String>,
}

impl<'a> EvaluationReport<'a> {
    pub fn new(
        generated_at: DateTime<Utc>,
        region: &'a str,
        signals: &'a DroughtSignals,
        result: &'a RiskResult,
    ) -> Self {
        EvaluationReport {
            generated_at,
            region,
            signals,
            result,
            habitat_state: HabitatState::of(&result.components),
            urgency: Urgency::of(result.risk_0_100),
            advisories: risk::situational_advisories(result),
        }
    }
}

pub fn summary_line(result: &RiskResult) -> String {
    format!(
        "{} at {} (month {}): risk {:.1} [{}] hazard {:.2} exposure {:.2} sensitivity {:.2}",
        result.species,
        result.node,
        result.month,
        result.risk_0_100,
        result.level,
        result.components.hazard,
        result.components.exposure,
        result.components.sensitivity
    )
}

pub fn bottleneck_table(scores: &BottleneckScores) -> String {
    let mut ranked: Vec<(&String, &f64)> = scores.iter().collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(a.1).unwrap_or(std::cmp::Ordering::Equal));

    let mut output = String::new();
    for (node, score) in ranked {
        let _ = writeln!(output, "{node:<10} {score:.3}");
    }
    output
}

pub fn build_report(report: &EvaluationReport<'_>) -> String {
    let result = report.result;
    let signals = report.signals;
    let mut output = String::new();

    let _ = writeln!(output, "# Corridor Drought Risk Report");
    let _ = writeln!(
        output,
        "Generated {} for {} at {} (month {}, region {})",
        report.generated_at.format("%Y-%m-%d %H:%M UTC"),
        result.species,
        result.node,
        result.month,
        report.region
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Risk Score");
    let _ = writeln!(output, "- Total risk (0-100): {:.1}", result.risk_0_100);
    let _ = writeln!(output, "- Level: {}", result.level);
    let _ = writeln!(output, "- Node bottleneck (betweenness): {:.3}", result.bottleneck);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Drought Signals");
    let _ = writeln!(
        output,
        "- SPI-12: {:.1} ({})",
        signals.spi12,
        SpiClass::of(signals.spi12).as_str()
    );
    let _ = writeln!(
        output,
        "- SPI-24: {:.1} ({})",
        signals.spi24,
        SpiClass::of(signals.spi24).as_str()
    );
    let _ = writeln!(output, "- CDI: {}", signals.cdi);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Components");
    for (name, value) in [
        ("Drought hazard", result.components.hazard),
        ("Water stress / exposure", result.components.exposure),
        ("Species sensitivity", result.components.sensitivity),
    ] {
        let _ = writeln!(
            output,
            "- {}: {:.2} ({})",
            name,
            value,
            ComponentBand::of(value).as_str()
        );
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "{}", report.habitat_state.describe());

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recommended Actions");
    for action in &result.actions {
        let _ = writeln!(output, "- {action}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## What To Do Now");
    let _ = writeln!(output, "Urgency: {}", report.urgency.as_str());
    for advisory in &report.advisories {
        let _ = writeln!(output, "- {advisory}");
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Why");
    let _ = writeln!(output, "{}", result.explanation);

    output
}
