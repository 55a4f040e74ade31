use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use corridor_risk::config::{EngineConfig, CONFIG_ENV};
use corridor_risk::graph::{self, CorridorGraph};
use corridor_risk::models::Urgency;
use corridor_risk::report::{self, EvaluationReport};
use corridor_risk::{risk, signals};

#[derive(Parser)]
#[command(name = "corridor-risk")]
#[command(about = "Drought risk scoring for migratory-bird corridor nodes", long_about = None)]
struct Cli {
    /// TOML file with weights, water stress, region and table path
    #[arg(long, global = true, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one corridor node for a species and month
    Score {
        #[command(flatten)]
        eval: EvalArgs,
        /// Print the full evaluation as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a markdown report for one evaluation
    Report {
        #[command(flatten)]
        eval: EvalArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Print betweenness bottleneck scores per node
    Bottlenecks {
        /// Restrict the corridor to one species' edges
        #[arg(long)]
        species: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Print corridor edges
    Edges {
        #[arg(long)]
        species: Option<String>,
    },
}

#[derive(Args)]
struct EvalArgs {
    #[arg(long)]
    species: String,
    #[arg(long)]
    node: String,
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
    month: u32,
    #[arg(long)]
    region: Option<String>,
    /// Drought signal CSV (date, region, spi12, spi24, cdi)
    #[arg(long)]
    table: Option<PathBuf>,
    /// Local water stress of the node, 0 to 1
    #[arg(long)]
    water_stress: Option<f64>,
    #[arg(long)]
    w_hazard: Option<f64>,
    #[arg(long)]
    w_exposure: Option<f64>,
    #[arg(long)]
    w_sensitivity: Option<f64>,
}

struct Evaluation {
    region: String,
    signals: corridor_risk::DroughtSignals,
    result: corridor_risk::RiskResult,
}

fn corridor_for(species: Option<&str>) -> CorridorGraph {
    let full = graph::build_corridor_graph();
    match species {
        Some(species) => graph::subgraph_for_species(&full, species),
        None => full,
    }
}

fn evaluate(config: &EngineConfig, args: &EvalArgs) -> anyhow::Result<Evaluation> {
    let region = args.region.clone().unwrap_or_else(|| config.region.clone());
    let table_path = args
        .table
        .clone()
        .or_else(|| config.drought_table.clone())
        .context(
            "no drought table given (use --table, the config file, or CORRIDOR_RISK_DROUGHT_TABLE)",
        )?;

    let mut weights = config.weights;
    if let Some(w) = args.w_hazard {
        weights.hazard = w;
    }
    if let Some(w) = args.w_exposure {
        weights.exposure = w;
    }
    if let Some(w) = args.w_sensitivity {
        weights.sensitivity = w;
    }
    let water_stress = args.water_stress.unwrap_or(config.base_water_stress);

    let table = signals::load_drought_table(&table_path)
        .with_context(|| format!("failed to load {}", table_path.display()))?;
    let drought = signals::pick_signals(&table, args.month, &region)?;

    let corridor = corridor_for(Some(args.species.as_str()));
    if !corridor.contains_node(&args.node) {
        tracing::warn!(node = args.node.as_str(), "node is not part of the corridor graph");
    }

    let result = risk::compute_risk(
        &corridor,
        &args.species,
        &args.node,
        args.month,
        &drought,
        water_stress,
        Some(&weights),
    );
    tracing::info!(risk = result.risk_0_100, level = %result.level, "evaluation complete");

    Ok(Evaluation {
        region,
        signals: drought,
        result,
    })
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let config = EngineConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Score { eval, json } => {
            let evaluation = evaluate(&config, &eval)?;
            if json {
                let summary = EvaluationReport::new(
                    chrono::Utc::now(),
                    &evaluation.region,
                    &evaluation.signals,
                    &evaluation.result,
                );
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }

            println!("{}", report::summary_line(&evaluation.result));
            println!("{}", evaluation.result.explanation);
            println!("Recommended actions:");
            for action in &evaluation.result.actions {
                println!("- {action}");
            }
            let urgency = Urgency::of(evaluation.result.risk_0_100);
            println!("What to do now ({}):", urgency.as_str());
            for advisory in risk::situational_advisories(&evaluation.result) {
                println!("- {advisory}");
            }
        }
        Commands::Report { eval, out } => {
            let evaluation = evaluate(&config, &eval)?;
            let summary = EvaluationReport::new(
                chrono::Utc::now(),
                &evaluation.region,
                &evaluation.signals,
                &evaluation.result,
            );
            std::fs::write(&out, report::build_report(&summary))
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Bottlenecks { species, json } => {
            let scores = graph::bottleneck_scores(&corridor_for(species.as_deref()));
            if json {
                println!("{}", serde_json::to_string_pretty(&scores)?);
            } else {
                print!("{}", report::bottleneck_table(&scores));
            }
        }
        Commands::Edges { species } => {
            let corridor = corridor_for(species.as_deref());
            if corridor.edge_count() == 0 {
                println!("No corridor edges for this species.");
                return Ok(());
            }
            for edge in corridor.edges() {
                println!("{} -> {} ({})", edge.source, edge.target, edge.species);
            }
        }
    }

    Ok(())
}
