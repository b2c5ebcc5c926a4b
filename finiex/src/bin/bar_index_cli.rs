//! Tick/bar index maintenance CLI (§6): rebuilds, inspects and renders the
//! `.parquet_index.json`/`.parquet_bars_index.json` sidecars that sit
//! alongside a columnar tick/bar store.

use clap::{Parser, Subcommand};
use finiex_data::{bar_index_status, rebuild_bar_index, rebuild_tick_index, tick_index_status, BarIndex, IndexStatus, TickIndex};
use prettytable::{row, Table};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const TICK_INDEX_FILE: &str = ".parquet_index.json";
const BAR_INDEX_FILE: &str = ".parquet_bars_index.json";

#[derive(Parser)]
#[command(name = "bar_index_cli", about = "Rebuild and inspect the tick/bar store index")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the tick/bar store and rewrite both index sidecars.
    Rebuild {
        #[arg(long)]
        tick_root: PathBuf,
        #[arg(long)]
        bar_root: PathBuf,
        #[arg(long)]
        index_dir: PathBuf,
    },
    /// Print a one-line summary of the current index.
    Status {
        #[arg(long)]
        index_dir: PathBuf,
    },
    /// Print a detailed per-symbol table.
    Report {
        #[arg(long)]
        index_dir: PathBuf,
    },
    /// Render the report; `--clean` deletes the existing sidecars and
    /// rebuilds from the store first.
    Render {
        #[arg(long)]
        tick_root: Option<PathBuf>,
        #[arg(long)]
        bar_root: Option<PathBuf>,
        #[arg(long)]
        index_dir: PathBuf,
        #[arg(long)]
        clean: bool,
    },
}

fn main() -> ExitCode {
    finiex::logging::init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Rebuild { tick_root, bar_root, index_dir } => rebuild(&tick_root, &bar_root, &index_dir),
        Command::Status { index_dir } => status(&index_dir),
        Command::Report { index_dir } => report(&index_dir),
        Command::Render { tick_root, bar_root, index_dir, clean } => render(tick_root, bar_root, &index_dir, clean),
    };

    match result {
        Ok(()) => ExitCode::from(0),
        Err(error) => {
            tracing::error!(%error, "bar_index_cli failed");
            ExitCode::from(1)
        }
    }
}

fn rebuild(tick_root: &Path, bar_root: &Path, index_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let tick_index = rebuild_tick_index(tick_root)?;
    let bar_index = rebuild_bar_index(bar_root)?;
    write_indices(index_dir, &tick_index, &bar_index)?;
    println!("rebuilt index: {} symbols, {} tick files, {} bar files", tick_index.files.len(), tick_index_status(&tick_index).files, bar_index_status(&bar_index).files);
    Ok(())
}

fn status(index_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let (tick_status, bar_status) = read_status(index_dir)?;
    print_status_line("ticks", tick_status);
    print_status_line("bars", bar_status);
    Ok(())
}

fn report(index_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let (tick_status, bar_status) = read_status(index_dir)?;

    let mut table = Table::new();
    table.set_titles(row!["store", "symbols", "files", "total rows"]);
    table.add_row(row!["ticks", tick_status.symbols, tick_status.files, tick_status.total_rows]);
    table.add_row(row!["bars", bar_status.symbols, bar_status.files, bar_status.total_rows]);
    table.printstd();
    Ok(())
}

fn render(tick_root: Option<PathBuf>, bar_root: Option<PathBuf>, index_dir: &Path, clean: bool) -> Result<(), Box<dyn std::error::Error>> {
    if clean {
        let (tick_root, bar_root) = tick_root
            .zip(bar_root)
            .ok_or("--clean requires --tick-root and --bar-root to rebuild from")?;
        rebuild(&tick_root, &bar_root, index_dir)?;
    }
    report(index_dir)
}

fn read_status(index_dir: &Path) -> Result<(IndexStatus, IndexStatus), Box<dyn std::error::Error>> {
    let tick_index: TickIndex = serde_json::from_slice(&std::fs::read(index_dir.join(TICK_INDEX_FILE))?)?;
    let bar_index: BarIndex = serde_json::from_slice(&std::fs::read(index_dir.join(BAR_INDEX_FILE))?)?;
    Ok((tick_index_status(&tick_index), bar_index_status(&bar_index)))
}

fn write_indices(index_dir: &Path, tick_index: &TickIndex, bar_index: &BarIndex) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(index_dir)?;
    std::fs::write(index_dir.join(TICK_INDEX_FILE), serde_json::to_vec_pretty(tick_index)?)?;
    std::fs::write(index_dir.join(BAR_INDEX_FILE), serde_json::to_vec_pretty(bar_index)?)?;
    Ok(())
}

fn print_status_line(label: &str, status: IndexStatus) {
    println!("{label}: {} symbols, {} files, {} rows", status.symbols, status.files, status.total_rows);
}
