//! Cellgrid - spreadsheet cells with arithmetic formulas, from the command line

mod config;

use anyhow::{Context, Result};
use cellgrid_core::{CellRef, CellWrite, Document, StoredCell};
use cellgrid_engine::engine::{Cell, format_cell_value};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cellgrid")]
#[command(author, version, about = "Spreadsheet cells with arithmetic formulas")]
struct Cli {
    /// Grid file (.grd). Defaults to `[storage] file` from the config.
    #[arg(short, long, global = true)]
    file: Option<PathBuf>,

    /// Config file (default: the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a cell. Values starting with '=' are evaluated as formulas.
    Set {
        /// Cell reference, e.g. B3
        cell: String,

        #[arg(allow_hyphen_values = true)]
        value: String,

        /// Formula to evaluate instead of VALUE
        #[arg(long, allow_hyphen_values = true)]
        formula: Option<String>,
    },

    /// Evaluate a formula against the grid without writing
    Eval {
        #[arg(allow_hyphen_values = true)]
        formula: String,
    },

    /// Print every stored cell
    Show {
        #[arg(long)]
        json: bool,
    },

    /// Insert blank cells across a row
    AddRow {
        /// Row index (0-based)
        row: usize,

        /// Number of columns to fill
        columns: usize,
    },

    /// Insert a blank cell at a column for every stored row
    AddColumn {
        /// Column index (0-based) of the new cells
        columns_count: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, warnings) = config::load_config(cli.config.as_deref());
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.log.level.as_str()),
    )
    .init();

    let path = cli.file.unwrap_or_else(|| config.storage.file.clone());
    let mut doc = Document::with_file(Some(path.clone()), config.eval_options())
        .with_context(|| format!("Failed to open {}", path.display()))?;

    match cli.command {
        Commands::Set {
            cell,
            value,
            formula,
        } => {
            let cell_ref = parse_cell(&cell)?;
            let mut write = CellWrite::new(cell_ref, value);
            if let Some(formula) = formula {
                write = write.with_formula(formula);
            }
            let stored = doc
                .write_cell(&write)
                .with_context(|| format!("Failed to write {}", cell))?;
            save(&mut doc)?;
            println!("{}", serde_json::to_string(&stored)?);
        }
        Commands::Eval { formula } => {
            let evaluation = doc.evaluate(&formula)?;
            println!("{}", evaluation.value);
        }
        Commands::Show { json } => {
            let table = doc.table()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&table)?);
            } else {
                for stored in &table {
                    println!("{}", table_line(stored));
                }
            }
        }
        Commands::AddRow { row, columns } => {
            let inserted = doc.add_row(row, columns);
            save(&mut doc)?;
            println!("Inserted {} cells", inserted?);
        }
        Commands::AddColumn { columns_count } => {
            let inserted = doc.add_column(columns_count);
            save(&mut doc)?;
            println!("Inserted {} cells", inserted?);
        }
    }

    Ok(())
}

fn parse_cell(name: &str) -> Result<CellRef> {
    name.parse::<CellRef>().map_err(anyhow::Error::msg)
}

/// Batch inserts keep what succeeded, so the grid is saved even when the
/// batch reports failures.
fn save(doc: &mut Document) -> Result<()> {
    if !doc.modified {
        return Ok(());
    }
    let path = doc.save_file().context("Failed to save grid")?;
    log::debug!("saved {}", path.display());
    Ok(())
}

/// `REF<TAB>TYPE<TAB>VALUE<TAB>FORMULA`
fn table_line(stored: &StoredCell) -> String {
    let cell = Cell {
        value: stored.value.clone(),
        kind: stored.kind,
        formula: stored.formula.clone(),
    };
    format!(
        "{}\t{}\t{}\t{}",
        stored.cell_ref(),
        stored.kind.as_str(),
        format_cell_value(&cell),
        stored.formula.as_deref().unwrap_or("")
    )
}
