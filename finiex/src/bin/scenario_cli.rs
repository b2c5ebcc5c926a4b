//! Scenario-set analysis CLI (§6). `analyze` runs every scenario in a
//! scenario-set config and prints a per-scenario results table; `generate`
//! is out of core scope (§4.13) and simply reports that.

use clap::{Parser, Subcommand};
use finiex::batch::{run_batch, BatchItem};
use finiex_data::{load_broker_spec, load_scenario_set, prepare_scenario_data, BarIndex, TickIndex};
use prettytable::{row, Table};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "scenario_cli", about = "Run and inspect scenario sets")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every scenario in a scenario-set config and print a results table.
    Analyze {
        #[arg(long)]
        scenario_set: PathBuf,
        #[arg(long)]
        broker_config: PathBuf,
        #[arg(long)]
        tick_index: PathBuf,
        #[arg(long)]
        bar_index: PathBuf,
        #[arg(long, default_value_t = 4)]
        max_parallel_scenarios: usize,
        /// Force sequential scenario dispatch (§4.10); also forced
        /// automatically when a debugger is attached to this process.
        #[arg(long)]
        sequential: bool,
    },
    /// Scenario-set generation; not part of the core engine.
    Generate,
}

fn main() -> ExitCode {
    finiex::logging::init_logging();
    let cli = Cli::parse();

    match cli.command {
        Command::Analyze {
            scenario_set,
            broker_config,
            tick_index,
            bar_index,
            max_parallel_scenarios,
            sequential,
        } => match analyze(&scenario_set, &broker_config, &tick_index, &bar_index, max_parallel_scenarios, !sequential) {
            Ok(()) => ExitCode::from(0),
            Err(error) => {
                tracing::error!(%error, "scenario_cli failed");
                ExitCode::from(1)
            }
        },
        Command::Generate => {
            eprintln!("scenario_cli generate: scenario-set generation is out of core scope");
            ExitCode::from(1)
        }
    }
}

fn analyze(
    scenario_set: &std::path::Path,
    broker_config: &std::path::Path,
    tick_index_path: &std::path::Path,
    bar_index_path: &std::path::Path,
    max_parallel_scenarios: usize,
    parallel_scenarios: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let scenarios = load_scenario_set(scenario_set)?;
    let broker_spec = load_broker_spec(broker_config)?;
    let tick_index: TickIndex = serde_json::from_slice(&std::fs::read(tick_index_path)?)?;
    let bar_index: BarIndex = serde_json::from_slice(&std::fs::read(bar_index_path)?)?;

    let mut items = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        let package = prepare_scenario_data(&scenario, &tick_index, &bar_index, &broker_spec)?;
        items.push(BatchItem { scenario, package: Arc::new(package) });
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let results = runtime.block_on(run_batch(items, max_parallel_scenarios, parallel_scenarios));

    let mut table = Table::new();
    table.set_titles(row!["scenario", "success", "trades", "win rate", "profit factor", "final equity", "error"]);
    for result in &results {
        let stats = &result.tick_loop_results.portfolio_stats;
        table.add_row(row![
            result.scenario_name,
            result.success,
            stats.total_trades,
            format!("{:.2}%", stats.win_rate * 100.0),
            format!("{:.2}", stats.profit_factor),
            stats.final_equity,
            result.error_message.clone().unwrap_or_default()
        ]);
    }
    table.printstd();

    if results.iter().any(|result| !result.success) {
        return Err("one or more scenarios failed".into());
    }
    Ok(())
}
