//! gridtruth CLI - table structure ground truth from color-coded renders

use std::collections::BTreeSet;
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

use gridtruth::output::to_json;
use gridtruth::pipeline::{DocumentOutcome, PrerenderedProvider, RenderDirs};
use gridtruth::{
    BatchRunner, ColorTable, FsSink, Gridtruth, JsonFormat, LineBuilder, PageId,
    TableLocator,
};

#[derive(Parser)]
#[command(name = "gridtruth")]
#[command(version)]
#[command(about = "Recover table structure ground truth from color-coded page renders", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a table of unique cell colors
    Colors {
        /// Number of colors
        #[arg(short = 'n', long, default_value = "100000")]
        count: usize,

        /// Allocation seed
        #[arg(long, env = "GRIDTRUTH_SEED", default_value = "0")]
        seed: u64,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Write JSON instead of CSV
        #[arg(long)]
        json: bool,
    },

    /// Locate tables on a page from two border renders
    Locate {
        /// Render with borders in the marker color
        #[arg(value_name = "MARKED")]
        marked: PathBuf,

        /// Render with borders in the second color
        #[arg(value_name = "SECOND")]
        second: PathBuf,

        /// Page id as <document>_<page> (defaults to the file stem)
        #[arg(long)]
        page_id: Option<String>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Recover cells and grid lines from a table image with colored cells
    Cells {
        /// Cropped table image
        #[arg(value_name = "TABLE")]
        table: PathBuf,

        /// Color table (CSV or JSON)
        #[arg(short, long, value_name = "FILE")]
        colors: PathBuf,

        /// Largest cell count of any table in the document
        #[arg(short, long)]
        max_cells: usize,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,
    },

    /// Run the full pipeline over pre-rendered documents
    Truth {
        /// Directory of renders with borders in the marker color
        #[arg(long, value_name = "DIR")]
        border_a: PathBuf,

        /// Directory of renders with borders in the second color
        #[arg(long, value_name = "DIR")]
        border_b: PathBuf,

        /// Directory of renders with colored cells
        #[arg(long, value_name = "DIR")]
        cells: PathBuf,

        /// Color table the cell renders were made with (allocated from --seed if absent)
        #[arg(long, value_name = "FILE")]
        colors: Option<PathBuf>,

        /// Allocation seed
        #[arg(long, env = "GRIDTRUTH_SEED", default_value = "0")]
        seed: u64,

        /// Number of colors to allocate
        #[arg(long, default_value = "100000")]
        pool: usize,

        /// Largest cell count of any table, per document
        #[arg(short, long)]
        max_cells: usize,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: PathBuf,

        /// Seconds allowed per render step
        #[arg(long, env = "GRIDTRUTH_TIMEOUT", default_value = "300")]
        timeout: u64,

        /// Process documents one at a time
        #[arg(long)]
        sequential: bool,

        /// Write cell and line overlays
        #[arg(long)]
        debug: bool,

        /// Skip documents already recorded in the output directory
        #[arg(long)]
        resume: bool,

        /// Document ids (all documents in --border-a if none given)
        #[arg(value_name = "DOC_ID")]
        documents: Vec<String>,
    },

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Colors {
            count,
            seed,
            output,
            json,
        } => cmd_colors(count, seed, output.as_deref(), json),
        Commands::Locate {
            marked,
            second,
            page_id,
            compact,
        } => cmd_locate(&marked, &second, page_id.as_deref(), compact),
        Commands::Cells {
            table,
            colors,
            max_cells,
            compact,
        } => cmd_cells(&table, &colors, max_cells, compact),
        Commands::Truth {
            border_a,
            border_b,
            cells,
            colors,
            seed,
            pool,
            max_cells,
            output,
            timeout,
            sequential,
            debug,
            resume,
            documents,
        } => cmd_truth(TruthArgs {
            dirs: RenderDirs {
                marked: border_a,
                second: border_b,
                cells,
            },
            colors,
            seed,
            pool,
            max_cells,
            output,
            timeout: Duration::from_secs(timeout),
            sequential,
            debug,
            resume,
            documents,
        }),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn json_format(compact: bool) -> JsonFormat {
    if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    }
}

fn cmd_colors(
    count: usize,
    seed: u64,
    output: Option<&Path>,
    as_json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let table = gridtruth::allocate(count, seed)?;

    let mut buf = Vec::new();
    if as_json {
        buf.extend(to_json(&table, JsonFormat::Pretty)?.into_bytes());
    } else {
        table.write_csv(&mut buf)?;
    }

    if let Some(path) = output {
        fs::write(path, &buf)?;
        println!("{} {} colors to {}", "Saved".green(), table.len(), path.display());
    } else {
        print!("{}", String::from_utf8_lossy(&buf));
    }

    Ok(())
}

/// Parse `<document>_<page>`, falling back to page 0.
fn parse_page_id(text: &str) -> PageId {
    match text.rsplit_once('_') {
        Some((document, page)) if !document.is_empty() => match page.parse() {
            Ok(page) => PageId::new(document, page),
            Err(_) => PageId::new(text, 0),
        },
        _ => PageId::new(text, 0),
    }
}

fn cmd_locate(
    marked: &Path,
    second: &Path,
    page_id: Option<&str>,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let page = match page_id {
        Some(id) => parse_page_id(id),
        None => parse_page_id(&marked.file_stem().unwrap_or_default().to_string_lossy()),
    };

    let marked = image::open(marked)?.to_rgb8();
    let second = image::open(second)?.to_rgb8();
    let located = TableLocator::new().locate(&page, &marked, &second)?;

    let entry = |t: &gridtruth::LocatedTable| json!({ "key": t.key.to_string(), "bbox": t.bbox });
    let value = json!({
        "page": page.to_string(),
        "tables": located.tables.iter().map(entry).collect::<Vec<_>>(),
        "rejected": located.rejected.iter().map(entry).collect::<Vec<_>>(),
    });
    println!("{}", to_json(&value, json_format(compact))?);

    Ok(())
}

fn load_colors(path: &Path) -> Result<ColorTable, Box<dyn std::error::Error>> {
    let is_json = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if is_json {
        Ok(serde_json::from_str(&fs::read_to_string(path)?)?)
    } else {
        Ok(ColorTable::read_csv(BufReader::new(fs::File::open(path)?))?)
    }
}

fn cmd_cells(
    table: &Path,
    colors: &Path,
    max_cells: usize,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let colors = load_colors(colors)?;
    let image = image::open(table)?.to_rgb8();

    let scan = gridtruth::CellDetector::new().scan(&image, colors.colors(), max_cells);
    let builder = LineBuilder::new();
    let lines = builder.build(&scan.cells);
    let key = parse_page_id(&table.file_stem().unwrap_or_default().to_string_lossy()).table(0);
    let accepted = builder.check(&key, &lines).is_ok();

    let value = json!({
        "cells": scan.cells,
        "colors_scanned": scan.scanned,
        "horizontal_lines": lines.horizontal,
        "vertical_lines": lines.vertical,
        "accepted": accepted,
    });
    println!("{}", to_json(&value, json_format(compact))?);

    if !accepted {
        eprintln!(
            "{} grid too small ({} horizontal, {} vertical lines)",
            "Rejected:".yellow(),
            lines.horizontal.len(),
            lines.vertical.len()
        );
    }
    Ok(())
}

struct TruthArgs {
    dirs: RenderDirs,
    colors: Option<PathBuf>,
    seed: u64,
    pool: usize,
    max_cells: usize,
    output: PathBuf,
    timeout: Duration,
    sequential: bool,
    debug: bool,
    resume: bool,
    documents: Vec<String>,
}

/// Document ids with at least one page in `dir`.
fn discover_documents(dir: &Path) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let mut documents = BTreeSet::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("png") {
            continue;
        }
        let stem = path.file_stem().unwrap_or_default().to_string_lossy();
        if let Some((document, page)) = stem.rsplit_once('_') {
            if !document.is_empty() && page.parse::<u32>().is_ok() {
                documents.insert(document.to_string());
            }
        }
    }
    Ok(documents.into_iter().collect())
}

fn cmd_truth(args: TruthArgs) -> Result<(), Box<dyn std::error::Error>> {
    let documents = if args.documents.is_empty() {
        discover_documents(&args.dirs.marked)?
    } else {
        args.documents
    };
    if documents.is_empty() {
        println!("{}", "No documents found".yellow());
        return Ok(());
    }

    let mut builder = Gridtruth::new()
        .with_seed(args.seed)
        .with_color_pool(args.pool)
        .with_timeout(args.timeout)
        .with_scratch_root(args.output.join(".scratch"));
    if args.sequential {
        builder = builder.sequential();
    }
    if args.debug {
        builder = builder.with_debug_overlays();
    }
    if args.resume {
        builder = builder.resume();
    }

    let runner = match &args.colors {
        Some(path) => BatchRunner::with_colors(
            builder.options().clone(),
            load_colors(path)?,
            args.output.join(".scratch"),
        ),
        None => builder.runner()?,
    };

    let sink = FsSink::create(&args.output)?;
    let provider = PrerenderedProvider::new(args.dirs, args.max_cells);

    let pb = ProgressBar::new(documents.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let report = runner.run(&documents, &provider, &sink, |outcome| {
        pb.set_message(outcome.document().to_string());
        pb.inc(1);
    });
    pb.finish_with_message("Done!");

    println!("\n{}", "Summary".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Succeeded".bold(), report.succeeded().to_string().green());
    println!("{}: {}", "Failed".bold(), report.failed().to_string().red());
    println!("{}: {}", "Skipped".bold(), report.skipped());
    for (category, count) in report.failures_by_category() {
        println!("  {} {}: {}", "├─".dimmed(), category, count);
    }

    let tables: usize = report
        .outcomes
        .iter()
        .map(|o| match o {
            DocumentOutcome::Succeeded { tables, .. } => *tables,
            _ => 0,
        })
        .sum();
    println!("{}: {}", "Tables".bold(), tables);
    println!("{}: {:.1?}", "Elapsed".bold(), report.elapsed);
    println!("{} {}", "Output:".green(), sink.root().display());

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "gridtruth".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Table structure ground truth from color-coded renders");
    println!();
    println!(
        "Color space: {} colors",
        gridtruth::recover::COLOR_SPACE_SIZE.to_string().dimmed()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_id() {
        assert_eq!(parse_page_id("doc_3"), PageId::new("doc", 3));
        assert_eq!(parse_page_id("my_doc_12"), PageId::new("my_doc", 12));
        assert_eq!(parse_page_id("plain"), PageId::new("plain", 0));
        assert_eq!(parse_page_id("doc_x"), PageId::new("doc_x", 0));
    }

    #[test]
    fn test_discover_documents() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a_0.png", "a_1.png", "b_c_0.png", "notes.txt", "loose.png"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        let docs = discover_documents(dir.path()).unwrap();
        assert_eq!(docs, vec!["a".to_string(), "b_c".to_string()]);
    }

    #[test]
    fn test_load_colors_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("colors.csv");
        let table = gridtruth::allocate(5, 1).unwrap();
        let mut buf = Vec::new();
        table.write_csv(&mut buf).unwrap();
        fs::write(&path, buf).unwrap();

        assert_eq!(load_colors(&path).unwrap(), table);
    }

    #[test]
    fn test_cli_parses_truth() {
        let cli = Cli::try_parse_from([
            "gridtruth", "truth", "--border-a", "a", "--border-b", "b", "--cells", "c",
            "--max-cells", "12", "--output", "out", "doc1", "doc2",
        ])
        .unwrap();
        match cli.command {
            Commands::Truth {
                max_cells,
                documents,
                ..
            } => {
                assert_eq!(max_cells, 12);
                assert_eq!(documents, vec!["doc1", "doc2"]);
            }
            _ => panic!("expected truth"),
        }
    }
}
