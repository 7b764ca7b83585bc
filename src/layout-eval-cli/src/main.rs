// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use layout_eval::harness::fixtures::Scenario;
use layout_eval::perception::PerceptionHints;
use layout_eval::satisfaction::CONSTRAINTS;
use layout_eval::{
    Dimension, Intent, PerceptionMap, SatisfactionResult, SatisfyOptions, SimulationConfig,
    Topology, perceive, run_simulation, satisfy_all_intents, satisfy_with,
};

#[derive(Parser, Debug)]
#[command(
    name = "layout-eval",
    version,
    about = "Judge whether a force-directed layout would satisfy a viewer"
)]
struct Cli {
    /// JSON file of simulation config overrides.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Only these dimensions gate the satisfied verdict.
    #[arg(long = "require", global = true, value_delimiter = ',')]
    required_dims: Vec<Dimension>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Settle a named fixture and judge it against its intent.
    Scenario {
        name: Scenario,
        /// Judge against this intent instead of the fixture's own.
        #[arg(long)]
        intent: Option<Intent>,
        /// Include the settled topology in the output.
        #[arg(long)]
        positions: bool,
    },
    /// Judge every fixture against every intent.
    Sweep {
        /// Restrict the sweep to these fixtures.
        #[arg(long = "scenario", value_delimiter = ',')]
        scenarios: Vec<Scenario>,
    },
    /// Judge a topology read from a JSON file.
    Evaluate {
        topology: PathBuf,
        /// JSON file of perception hints.
        #[arg(long)]
        hints: Option<PathBuf>,
        /// Judge only this intent; defaults to all of them.
        #[arg(long)]
        intent: Option<Intent>,
        /// Run the simulation first instead of using the file's positions.
        #[arg(long)]
        settle: bool,
    },
    /// List intents, dimensions and the constraint table.
    Intents,
}

#[derive(Serialize)]
struct ScenarioReport<'a> {
    scenario: Scenario,
    intent: Intent,
    #[serde(skip_serializing_if = "Option::is_none")]
    topology: Option<&'a Topology>,
    perceptions: &'a PerceptionMap,
    result: &'a SatisfactionResult,
    repair_plan: Vec<&'static str>,
}

#[derive(Serialize)]
struct SweepEntry {
    satisfied: bool,
    overall_score: f64,
    summary: String,
}

#[derive(Serialize)]
struct Catalog {
    intents: Vec<Intent>,
    dimensions: Vec<Dimension>,
    constraints: &'static [layout_eval::satisfaction::Constraint],
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<SimulationConfig> {
    let Some(path) = path else {
        return Ok(SimulationConfig::default());
    };
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    SimulationConfig::from_json(&contents).with_context(|| format!("loading {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run_scenario(
    scenario: Scenario,
    intent: Option<Intent>,
    positions: bool,
    config: &SimulationConfig,
    options: &SatisfyOptions,
) -> Result<()> {
    let fixture = scenario.build();
    let intent = intent.unwrap_or(fixture.intent);
    let settled = fixture.settle(config);
    let perceptions = perceive(&settled.nodes, &settled.edges, &fixture.hints);
    let result = satisfy_with(&perceptions, intent, options);
    info!(%scenario, %intent, satisfied = result.satisfied, "evaluated scenario");

    print_json(&ScenarioReport {
        scenario,
        intent,
        topology: positions.then_some(&settled),
        perceptions: &perceptions,
        repair_plan: result.repair_plan(),
        result: &result,
    })
}

fn run_sweep(
    scenarios: &[Scenario],
    config: &SimulationConfig,
    options: &SatisfyOptions,
) -> Result<()> {
    let scenarios = if scenarios.is_empty() {
        &Scenario::ALL[..]
    } else {
        scenarios
    };
    let mut report: BTreeMap<Scenario, BTreeMap<Intent, SweepEntry>> = BTreeMap::new();
    for &scenario in scenarios {
        let fixture = scenario.build();
        let settled = fixture.settle(config);
        let perceptions = perceive(&settled.nodes, &settled.edges, &fixture.hints);
        let results = satisfy_all_intents(&perceptions, options)
            .into_iter()
            .map(|(intent, r)| {
                let entry = SweepEntry {
                    satisfied: r.satisfied,
                    overall_score: r.overall_score,
                    summary: r.summary,
                };
                (intent, entry)
            })
            .collect();
        report.insert(scenario, results);
    }
    print_json(&report)
}

fn run_evaluate(
    path: &Path,
    hints: Option<&Path>,
    intent: Option<Intent>,
    settle: bool,
    config: &SimulationConfig,
    options: &SatisfyOptions,
) -> Result<()> {
    let mut topology: Topology = read_json(path)?;
    let hints: PerceptionHints = match hints {
        Some(p) => read_json(p)?,
        None => PerceptionHints::default(),
    };
    if settle {
        topology = run_simulation(&topology.nodes, &topology.edges, config);
    }
    let perceptions = perceive(&topology.nodes, &topology.edges, &hints);

    match intent {
        Some(intent) => {
            let result = satisfy_with(&perceptions, intent, options);
            print_json(&serde_json::json!({
                "perceptions": perceptions,
                "result": result,
                "repair_plan": result.repair_plan(),
            }))
        }
        None => {
            let results = satisfy_all_intents(&perceptions, options);
            print_json(&serde_json::json!({
                "perceptions": perceptions,
                "results": results,
            }))
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;
    let options = SatisfyOptions {
        required_dims: (!cli.required_dims.is_empty()).then(|| cli.required_dims.clone()),
        ..SatisfyOptions::default()
    };

    match cli.command {
        Command::Scenario {
            name,
            intent,
            positions,
        } => run_scenario(name, intent, positions, &config, &options),
        Command::Sweep { scenarios } => run_sweep(&scenarios, &config, &options),
        Command::Evaluate {
            topology,
            hints,
            intent,
            settle,
        } => run_evaluate(
            &topology,
            hints.as_deref(),
            intent,
            settle,
            &config,
            &options,
        ),
        Command::Intents => print_json(&Catalog {
            intents: Intent::ALL.to_vec(),
            dimensions: Dimension::ALL.to_vec(),
            constraints: CONSTRAINTS,
        }),
    }
}
