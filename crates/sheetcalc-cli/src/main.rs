//! sheetcalc CLI - drive a spreadsheet from a command script

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use sheetcalc::prelude::*;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sheetcalc")]
#[command(author, version, about = "Spreadsheet computation harness")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command script against a spreadsheet
    ///
    /// One command per line: `set A1 10`, `relocate A1:B2 C1`, `resize 20 20`,
    /// `undo`, `redo`, `type A1:A5 numeric`, `trim A1:A5`, `upper A1:A5`,
    /// `lower A1:A5`, `dedupe A1:C9`, `replace A1:C9 PATTERN REPLACEMENT`,
    /// `show A1:C3`. Lines starting with `#` are ignored.
    Run {
        /// Script file (default: stdin)
        script: Option<PathBuf>,

        /// Start from a saved snapshot instead of an empty grid
        #[arg(short, long)]
        load: Option<PathBuf>,

        /// Print the final snapshot as JSON
        #[arg(short, long)]
        snapshot: bool,

        /// Write the final snapshot to a file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show information about a saved snapshot
    Info {
        /// Snapshot file (JSON)
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            script,
            load,
            snapshot,
            output,
        } => run(script.as_deref(), load.as_deref(), snapshot, output.as_deref()),
        Commands::Info { input } => show_info(&input),
    }
}

fn run(
    script: Option<&Path>,
    load: Option<&Path>,
    print_snapshot: bool,
    output: Option<&Path>,
) -> Result<()> {
    let text = match script {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read '{}'", path.display()))?,
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read script from stdin")?;
            buf
        }
    };

    let mut sheet = Spreadsheet::new();
    if let Some(path) = load {
        sheet.restore(&read_snapshot(path)?)?;
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run_script(&mut sheet, &text, &mut out)?;

    let json = sheet.snapshot().to_json()?;
    if print_snapshot {
        writeln!(out, "{}", json).context("Failed to write to stdout")?;
    }
    if let Some(path) = output {
        std::fs::write(path, &json)
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
        eprintln!("Wrote snapshot to '{}'", path.display());
    }

    Ok(())
}

/// Execute every line of a script, stopping at the first failure
fn run_script<W: Write>(sheet: &mut Spreadsheet, script: &str, out: &mut W) -> Result<()> {
    for (index, line) in script.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        execute(sheet, line, out).with_context(|| format!("line {}: {}", index + 1, line))?;
    }
    Ok(())
}

fn execute<W: Write>(sheet: &mut Spreadsheet, line: &str, out: &mut W) -> Result<()> {
    let (command, rest) = split_word(line);

    match command.to_ascii_lowercase().as_str() {
        "set" => {
            let (address, raw) = split_word(rest);
            match sheet.edit(address, raw) {
                // Rejected input is reported, the script goes on
                Err(e @ Error::Validation { .. }) => eprintln!("warning: {}", e),
                other => other?,
            }
        }
        "relocate" => {
            let (source, target) = two_args(rest)?;
            sheet.relocate(source, target)?;
        }
        "resize" => {
            let (rows, cols) = two_args(rest)?;
            let rows = rows
                .parse::<u32>()
                .with_context(|| format!("bad row count '{}'", rows))?;
            let cols = cols
                .parse::<u32>()
                .with_context(|| format!("bad column count '{}'", cols))?;
            sheet.resize(rows, cols)?;
        }
        "undo" => {
            if !sheet.undo() {
                eprintln!("warning: nothing to undo");
            }
        }
        "redo" => {
            if !sheet.redo() {
                eprintln!("warning: nothing to redo");
            }
        }
        "type" => {
            let (range, name) = two_args(rest)?;
            let cell_type =
                CellType::from_name(name).ok_or_else(|| anyhow!("unknown cell type '{}'", name))?;
            sheet.set_cell_type(range, cell_type)?;
        }
        "trim" | "upper" | "lower" => {
            let transform = TextTransform::from_name(command)
                .ok_or_else(|| anyhow!("unknown transform '{}'", command))?;
            sheet.apply_text_transform(rest, transform)?;
        }
        "dedupe" => {
            let removed = sheet.remove_duplicate_rows(rest)?;
            eprintln!("Removed {} duplicate rows", removed);
        }
        "replace" => {
            let (range, rest) = split_word(rest);
            let (pattern, replacement) = split_word(rest);
            let changed = sheet.find_replace(range, pattern, replacement)?;
            eprintln!("Replaced in {} cells", changed);
        }
        "show" => show(sheet, rest, out)?,
        other => bail!("unknown command '{}'", other),
    }

    Ok(())
}

/// Print a range as tab-separated rows of displayed values
fn show<W: Write>(sheet: &Spreadsheet, range: &str, out: &mut W) -> Result<()> {
    let range = if range.is_empty() {
        sheet.store().bounds()
    } else {
        CellRange::parse(range)?
    };

    for row in range.start.row..=range.end.row {
        let line: Vec<String> = (range.start.col..=range.end.col)
            .map(|col| sheet.display_at(CellAddress::new(row, col)))
            .collect();
        writeln!(out, "{}", line.join("\t")).context("Failed to write output")?;
    }
    Ok(())
}

fn show_info(input: &Path) -> Result<()> {
    let snapshot = read_snapshot(input)?;
    let mut sheet = Spreadsheet::new();
    sheet.restore(&snapshot)?;

    let formula_count = sheet.store().formula_cells().count();
    let stats = sheet.last_stats();

    println!("File: {}", input.display());
    println!("Grid: {} rows x {} columns", sheet.rows(), sheet.cols());
    println!("Cells: {}", snapshot.cells.len());
    println!("Formulas: {}", formula_count);
    println!(
        "Errors: {} ({} circular)",
        stats.errors, stats.circular_cells
    );

    Ok(())
}

fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    Snapshot::from_json(&json).with_context(|| format!("Failed to decode '{}'", path.display()))
}

/// Split off the first whitespace-separated word
fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim_start()),
        None => (s, ""),
    }
}

fn two_args(s: &str) -> Result<(&str, &str)> {
    let (first, rest) = split_word(s);
    let (second, extra) = split_word(rest);
    if first.is_empty() || second.is_empty() || !extra.is_empty() {
        bail!("expected two arguments");
    }
    Ok((first, second))
}
