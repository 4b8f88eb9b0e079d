// crowdbench: a small test bench for local crowd navigation.
// Three strategies walk the same crowd to the same goals and get scored on
// arrivals, collisions, distance and time to goal.

// Copyright 2025 Servus Altissimi (Pseudonym)

// Permission is hereby granted, free of charge, to any person obtaining a copy of this software and associated documentation files (the "Software"), to deal in the Software without restriction, including without limitation the rights to use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the Software is furnished to do so, subject to the following conditions:
// The above copyright notice and this permission notice shall be included in all copies or substantial portions of the Software.
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

use crowdbench::metrics::analyzer;
use crowdbench::metrics::logger::ResultLogger;
use crowdbench::prelude::*;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

const RESULTS_DIR: &str = "results";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    Run {
        #[arg(short, long, default_value = "direct-pursuit")]
        strategy: String,
        #[command(flatten)]
        scenario: ScenarioArgs,
        /// Strategy option as key=value, repeatable
        #[arg(short, long = "option", value_name = "KEY=VALUE")]
        options: Vec<String>,
        #[arg(long)]
        export: bool,
    },

    Compare {
        #[arg(short, long, default_value = "direct-pursuit,flocking,predictive-avoidance")]
        strategies: String,
        #[command(flatten)]
        scenario: ScenarioArgs,
        #[arg(short, long, default_value_t = 1)]
        repetitions: u32,
        #[arg(long)]
        export: bool,
        #[arg(long)]
        latex: bool,
    },

    List,
}

#[derive(Args)]
struct ScenarioArgs {
    /// JSON config file, flags below override it
    #[arg(short, long)]
    config: Option<String>,
    #[arg(short = 'n', long)]
    agents: Option<u32>,
    /// Scatter agents randomly with this seed instead of the circle layout
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = 900.0)]
    width: f64,
    #[arg(long, default_value_t = 800.0)]
    height: f64,
    #[arg(long)]
    max_ticks: Option<u64>,
    #[arg(long)]
    parallel: bool,
}

impl ScenarioArgs {
    fn into_config(self) -> Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => SimConfig::load(path)?,
            None => SimConfig::default(),
        };
        if let Some(agents) = self.agents {
            config.num_agents = agents;
        }
        if let Some(seed) = self.seed {
            config.layout = Layout::Scatter {
                seed,
                width: self.width,
                height: self.height,
            };
        }
        if let Some(max_ticks) = self.max_ticks {
            config.max_ticks = max_ticks;
        }
        config.parallel |= self.parallel;
        config.show_progress = true;
        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let program_start = Instant::now();

    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Run { strategy, scenario, options, export } => {
            run_single_simulation(&strategy, scenario.into_config()?, &options, export)?;
        }

        Commands::Compare { strategies, scenario, repetitions, export, latex } => {
            compare_strategies(&strategies, scenario.into_config()?, repetitions, export, latex)?;
        }

        Commands::List => {
            let registry = StrategyRegistry::global();
            println!("\nAvailable Navigation Strategies");

            for kind in StrategyKind::ALL {
                let strategy = NavigationStrategy::new(kind);
                println!("  - {} ({})", kind, registry.aliases(kind).join(", "));
                for (key, value) in strategy.options() {
                    println!("      {} = {}", key, value);
                }
            }

            println!("\nUsage: cargo run -- run --strategy <name>");
            println!("Example: cargo run -- run --strategy flocking -o separation_radius=30\n");
        }
    }

    info!("Total runtime: {:.2}s", program_start.elapsed().as_secs_f64());

    Ok(())
}

fn run_single_simulation(strategy: &str, config: SimConfig, options: &[String], export: bool) -> Result<()> {
    let kind: StrategyKind = strategy.parse()?;
    let config = SimConfig {
        name: format!("{}_{}", kind, config.num_agents),
        ..config.with_strategy(kind)
    };

    info!("crowdbench: Single Run");

    let mut sim = Simulation::new(config);
    for option in options {
        let (key, value) = parse_option(option)?;
        sim.set_option(&key, value)?;
    }
    sim.run()?;

    println!("\n{}", sim.benchmark.report());

    if export {
        save_results(&sim.config().name, sim.benchmark.results(), false)?;
    }
    Ok(())
}

fn compare_strategies(
    strategies: &str,
    base: SimConfig,
    repetitions: u32,
    export: bool,
    latex: bool,
) -> Result<()> {
    let kinds = strategies
        .split(',')
        .map(|s| s.parse::<StrategyKind>())
        .collect::<Result<Vec<_>>>()?;

    info!("crowdbench: Comparison");
    info!("Strategies: {}", kinds.iter().map(|k| k.to_string()).collect::<Vec<_>>().join(", "));
    info!("Repetitions: {}", repetitions);

    // every repetition goes to disk as it finishes, the averages are saved at the end
    let mut run_log = if export {
        std::fs::create_dir_all(RESULTS_DIR)?;
        let path = format!("{}/comparison_runs_{}.csv", RESULTS_DIR, chrono::Local::now().format("%Y%m%d_%H%M%S"));
        info!("Streaming runs to: {}", path);
        Some(ResultLogger::new(&path)?)
    } else {
        None
    };

    let mut averaged = Vec::new();

    for kind in kinds {
        info!("Testing: {}", kind);
        let mut runs = Vec::new();

        for rep in 1..=repetitions.max(1) {
            let mut config = base.clone().with_strategy(kind);
            config.name = format!("{}_{}", kind, rep);
            // vary scatter layouts per repetition, circles are deterministic anyway
            if let Layout::Scatter { seed, .. } = &mut config.layout {
                *seed = seed.wrapping_add(rep as u64 - 1);
            }

            info!("  Run {}/{}", rep, repetitions.max(1));
            let mut sim = Simulation::new(config);
            let result = sim.run()?;
            if let Some(log) = run_log.as_mut() {
                log.log(&result)?;
            }
            runs.push(result);
        }

        averaged.push(BenchmarkResult::average(&runs).ok_or_else(|| anyhow!("No runs for {}", kind))?);
    }

    println!("\n{}", analyzer::comparison_table(&averaged));

    if export || latex {
        save_results("comparison", &averaged, latex)?;
    }
    Ok(())
}

fn save_results(name: &str, results: &[BenchmarkResult], latex: bool) -> Result<()> {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    std::fs::create_dir_all(RESULTS_DIR)?;

    let csv_path = format!("{}/{}_{}.csv", RESULTS_DIR, name, timestamp);
    ResultLogger::new(&csv_path)?.log_batch(results)?;
    info!("Results saved to: {}", csv_path);

    let json_path = format!("{}/{}_{}.json", RESULTS_DIR, name, timestamp);
    analyzer::export_json(results, &json_path)?;
    info!("Results saved to: {}", json_path);

    if latex {
        export_latex(name, &timestamp.to_string(), results)?;
    }
    Ok(())
}

#[cfg(feature = "latex-export")]
fn export_latex(name: &str, timestamp: &str, results: &[BenchmarkResult]) -> Result<()> {
    let path = format!("{}/{}_{}_table.tex", RESULTS_DIR, name, timestamp);
    analyzer::export_latex_table(results, &path)?;
    info!("LaTeX table exported to: {}", path);
    info!("   \\input{{{}}}", path);
    Ok(())
}

#[cfg(not(feature = "latex-export"))]
fn export_latex(_name: &str, _timestamp: &str, _results: &[BenchmarkResult]) -> Result<()> {
    anyhow::bail!("Built without LaTeX support, rebuild with --features latex-export")
}

fn parse_option(raw: &str) -> Result<(String, f64)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected KEY=VALUE, got {}", raw))?;
    let value: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid value for {}", key))?;
    Ok((key.trim().to_string(), value))
}
