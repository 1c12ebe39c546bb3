// SPDX-License-Identifier: GPL-3.0-only

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::Value;
use storage_testing::runner::{self, Resolution};
use storage_testing::scenario::{self, InputFormat};
use storage_types::{Inventory, ProductDefaults};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Parser)]
#[command(name = "scenario")]
#[command(about = "Solve storage configurations and check scenario fixtures")]
struct ScenarioCli {
    #[command(subcommand)]
    command: ScenarioCommand,
}

#[derive(Debug, Subcommand)]
enum ScenarioCommand {
    /// List the scenario fixtures
    List,
    /// Solve a scenario and print the result
    Run {
        scenario_name: String,
        /// Print the model instead of the solved config
        #[arg(long)]
        model: bool,
    },
    /// Compare scenarios with their expectations
    Check {
        scenario_name: Option<String>,
        #[arg(long)]
        all: bool,
    },
    /// Solve a document from files
    Resolve {
        #[arg(long)]
        config: PathBuf,
        /// Devices, as TOML or JSON (by extension)
        #[arg(long)]
        inventory: PathBuf,
        /// Product defaults, as TOML
        #[arg(long)]
        product: PathBuf,
        /// The config is a model document
        #[arg(long)]
        from_model: bool,
        /// Print the model instead of the solved config
        #[arg(long)]
        model: bool,
    },
}

fn print_resolution(resolution: &Resolution, model: bool) -> Result<()> {
    let output = if model {
        resolution.model.to_json()?
    } else {
        resolution.document.clone()
    };
    println!("{}", serde_json::to_string_pretty(&output)?);

    for violation in &resolution.report.violations {
        tracing::warn!(rule = ?violation.rule, path = %violation.path, "{}", violation.rule.description());
    }
    Ok(())
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

fn load_inventory(path: &Path) -> Result<Inventory> {
    let raw = read(path)?;
    let inventory = if path.extension().is_some_and(|ext| ext == "json") {
        Inventory::from_json_str(&raw)
    } else {
        Inventory::from_toml_str(&raw)
    };
    inventory.with_context(|| format!("loading inventory {}", path.display()))
}

fn check(names: Vec<String>) -> Result<()> {
    let mut failed = 0;
    for name in &names {
        let outcome = scenario::load_by_name(name).and_then(|scenario| runner::check(&scenario));
        match outcome {
            Ok(()) => println!("ok      {name}"),
            Err(error) => {
                failed += 1;
                println!("FAILED  {name}: {error}");
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} scenarios failed", names.len());
    }
    Ok(())
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("storage_testing=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = ScenarioCli::parse();
    match cli.command {
        ScenarioCommand::List => {
            for name in scenario::list_names()? {
                let scenario = scenario::load_by_name(&name)?;
                println!("{name:<28} {}", scenario.description);
            }
            Ok(())
        }
        ScenarioCommand::Run {
            scenario_name,
            model,
        } => {
            let scenario = scenario::load_by_name(&scenario_name)?;
            print_resolution(&runner::run(&scenario)?, model)
        }
        ScenarioCommand::Check { scenario_name, all } => match (scenario_name, all) {
            (_, true) => check(scenario::list_names()?),
            (Some(name), false) => check(vec![name]),
            (None, false) => bail!("give a scenario name or --all"),
        },
        ScenarioCommand::Resolve {
            config,
            inventory,
            product,
            from_model,
            model,
        } => {
            let doc: Value = serde_json::from_str(&read(&config)?)
                .with_context(|| format!("parsing {}", config.display()))?;
            let inventory = load_inventory(&inventory)?;
            let product = ProductDefaults::from_toml_str(&read(&product)?)
                .with_context(|| format!("loading product {}", product.display()))?;
            let format = if from_model {
                InputFormat::Model
            } else {
                InputFormat::Json
            };

            print_resolution(&runner::resolve(&doc, format, &inventory, &product)?, model)
        }
    }
}
