//! Command-line tools for tabula sheet snapshots
//!
//! Works on the JSON snapshot format the engine persists: inspect a sheet,
//! recalculate it, evaluate ad-hoc formulas against it, and convert to and
//! from CSV.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use tabula::formula::{evaluate, parse_formula, recalculate, Context as EvalContext};
use tabula::prelude::*;

#[derive(Parser)]
#[command(name = "tabula", version, about = "Spreadsheet snapshot tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print summary information about a snapshot
    Info {
        /// Snapshot file (JSON)
        snapshot: PathBuf,
    },
    /// Run a recalculation pass and write the updated snapshot
    Recalc {
        snapshot: PathBuf,
        /// Output file (defaults to rewriting the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Evaluate a formula against a snapshot without modifying it
    Eval {
        snapshot: PathBuf,
        /// Formula text, e.g. '=SUM(A1:A10)'
        formula: String,
    },
    /// Export a snapshot to CSV
    Export {
        snapshot: PathBuf,
        output: PathBuf,
    },
    /// Import a CSV into a fresh snapshot
    Import {
        csv: PathBuf,
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Info { snapshot } => info(&snapshot),
        Command::Recalc { snapshot, output } => recalc(&snapshot, output.as_deref()),
        Command::Eval { snapshot, formula } => eval(&snapshot, &formula),
        Command::Export { snapshot, output } => export(&snapshot, &output),
        Command::Import { csv, output } => import(&csv, &output),
    }
}

fn load_sheet(path: &Path) -> Result<Sheet> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing snapshot {}", path.display()))
}

fn save_sheet(sheet: &Sheet, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(sheet)?;
    std::fs::write(path, json).with_context(|| format!("writing snapshot {}", path.display()))?;
    Ok(())
}

fn info(path: &Path) -> Result<()> {
    let sheet = load_sheet(path)?;
    let formulas = sheet.formula_cells().count();

    println!("Bounds:    {} rows x {} cols", sheet.row_count(), sheet.col_count());
    println!("Cells:     {}", sheet.cell_count());
    println!("Formulas:  {}", formulas);
    println!("Merges:    {}", sheet.merges().len());
    if let Some((max_row, max_col)) = sheet.populated_extent() {
        println!(
            "Extent:    {}",
            Address::new(max_row, max_col).to_a1_string()
        );
    }
    Ok(())
}

fn recalc(path: &Path, output: Option<&Path>) -> Result<()> {
    let mut sheet = load_sheet(path)?;
    let outcome = recalculate(&mut sheet);

    println!(
        "Recalculated {} formulas ({} in cycles)",
        outcome.formula_count, outcome.cycle_count
    );
    for (addr, message) in &outcome.parse_errors {
        eprintln!("{}: {}", addr, message);
    }

    save_sheet(&sheet, output.unwrap_or(path))
}

fn eval(path: &Path, formula: &str) -> Result<()> {
    let mut sheet = load_sheet(path)?;
    // Formulas in the snapshot must hold fresh values first
    recalculate(&mut sheet);

    let expr = parse_formula(formula)?;
    let value = evaluate(&expr, &EvalContext::new(&sheet)).into_value();
    println!("{}", value);
    Ok(())
}

fn export(path: &Path, output: &Path) -> Result<()> {
    let sheet = load_sheet(path)?;
    tabula::csv::write_sheet_to_path(&sheet, output)
        .with_context(|| format!("writing CSV {}", output.display()))?;
    log::info!("exported {} cells to {}", sheet.cell_count(), output.display());
    Ok(())
}

fn import(csv: &Path, output: &Path) -> Result<()> {
    let sheet = tabula::csv::read_sheet_from_path(csv)
        .with_context(|| format!("reading CSV {}", csv.display()))?;
    save_sheet(&sheet, output)?;
    log::info!("imported {} cells from {}", sheet.cell_count(), csv.display());
    Ok(())
}
