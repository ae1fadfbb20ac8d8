//! ratchange CLI - change detection over region attribute tables

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use ratchange_algorithms::change::{
    define_class_names, ChangeDetector, ChangeVariableSpec, PlotTarget, ResolvedVariable,
    ThresholdDirection, ThresholdMeasure, TiffHistogramSink,
};
use ratchange_algorithms::statistics::{class_statistic, class_summary, RegionStatistic};
use ratchange_core::io::{read_rat, write_rat, RatWriteOptions};
use ratchange_core::{AttributeStore, AttributeTable, ClassValue};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "ratchange")]
#[command(author, version, about = "Change detection over region attribute tables", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Table to update and the class of interest
#[derive(clap::Args)]
struct ClassArgs {
    /// Input attribute table (JSON)
    input: PathBuf,
    /// Column holding the class of each region
    #[arg(long)]
    class_col: String,
    /// Class of interest (number or name)
    #[arg(long)]
    class: ClassValue,
    /// Write the updated table here instead of over the input
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the columns of an attribute table
    Info {
        /// Input attribute table (JSON)
        input: PathBuf,
        /// Summarize this column over one class
        #[arg(long, requires_all = ["class_col", "class"])]
        column: Option<String>,
        #[arg(long)]
        class_col: Option<String>,
        #[arg(long)]
        class: Option<ClassValue>,
        /// Print one aggregation (min, max, mean, sum, stddev) instead of the summary
        #[arg(long, requires = "column")]
        stat: Option<RegionStatistic>,
    },
    /// Search the no-change range of one variable and label change
    Change {
        #[command(flatten)]
        target: ClassArgs,
        /// Change variable column; repeat to reduce several by PCA
        #[arg(short, long = "column", required = true)]
        columns: Vec<String>,
        /// Integer column receiving the labels
        #[arg(long)]
        output_column: String,
        /// Threshold measure: kurtosis, skewness, combined, auto
        #[arg(short, long, default_value = "auto")]
        measure: ThresholdMeasure,
        /// Change direction: lower, upper, lowerupper
        #[arg(short, long, default_value = "lower")]
        direction: ThresholdDirection,
        /// Value treated as missing; may be repeated
        #[arg(long = "no-data", allow_negative_numbers = true)]
        no_data: Vec<f64>,
        /// Write a histogram figure (TIFF) here
        #[arg(long)]
        plot: Option<PathBuf>,
        /// Mark all three candidate threshold pairs in the figure
        #[arg(long, requires = "plot")]
        show_all: bool,
    },
    /// Search several variables and count the ones flagging change
    Vote {
        #[command(flatten)]
        target: ClassArgs,
        /// JSON list of change variable definitions
        #[arg(long)]
        vars: PathBuf,
        /// Integer column receiving the vote count
        #[arg(long)]
        output_column: String,
        /// Write the variables with their thresholds here (JSON)
        #[arg(long)]
        resolved: Option<PathBuf>,
    },
    /// Mark regions inside every resolved no-change range
    Within {
        #[command(flatten)]
        target: ClassArgs,
        /// Resolved variables written by `vote`
        #[arg(long)]
        resolved: PathBuf,
        /// Integer column receiving the 0/1 labels
        #[arg(long)]
        output_column: String,
    },
    /// Write a class name column from class numbers
    ClassNames {
        /// Input attribute table (JSON)
        input: PathBuf,
        /// Integer class number column
        #[arg(long)]
        class_num_col: String,
        /// String column to write
        #[arg(long)]
        class_name_col: String,
        /// Names as `number=name` pairs separated by commas
        #[arg(long)]
        names: String,
        /// Write the updated table here instead of over the input
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_table(path: &Path) -> Result<AttributeTable> {
    let pb = spinner("Reading attribute table...");
    let table = read_rat(path)
        .with_context(|| format!("Failed to read attribute table {}", path.display()))?;
    pb.finish_and_clear();
    info!("Input: {} regions, {} columns", table.num_rows(), table.num_columns());
    Ok(table)
}

fn write_table(table: &AttributeTable, path: &Path) -> Result<()> {
    let pb = spinner("Writing attribute table...");
    write_rat(table, path, Some(RatWriteOptions::default()))
        .context("Failed to write attribute table")?;
    pb.finish_and_clear();
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} {}", what, path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid {} in {}", what, path.display()))
}

fn detector() -> ChangeDetector {
    ChangeDetector::default().with_plot_sink(Box::new(TiffHistogramSink::default()))
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn parse_names(s: &str) -> Result<HashMap<i64, String>> {
    s.split(',')
        .filter(|pair| !pair.trim().is_empty())
        .map(|pair| {
            let Some((num, name)) = pair.split_once('=') else {
                anyhow::bail!("Class name must be 'number=name', got: {}", pair);
            };
            let num: i64 = num.trim().parse().context("Invalid class number")?;
            Ok((num, name.trim().to_string()))
        })
        .collect()
}

fn print_thresholds(name: &str, thresholds: Option<(f64, f64)>) {
    match thresholds {
        Some((lower, upper)) => println!("  {}: [{:.6}, {:.6}]", name, lower, upper),
        None => println!("  {}: no regions", name),
    }
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        // ── Info ─────────────────────────────────────────────────────
        Commands::Info {
            input,
            column,
            class_col,
            class,
            stat,
        } => {
            let table = read_table(&input)?;
            println!("File: {}", input.display());
            println!("Regions: {}", table.num_rows());
            println!("\nColumns:");
            for (name, kind) in table.schema() {
                println!("  {:<24} {}", name, kind);
            }

            if let (Some(column), Some(class_col), Some(class)) = (column, class_col, class) {
                println!("\n{} where {} = {}:", column, class_col, class);
                if let Some(stat) = stat {
                    match class_statistic(&table, &class_col, &class, &column, stat)
                        .context("Failed to aggregate column")?
                    {
                        Some(value) => println!("  {:?}: {:.4}", stat, value),
                        None => println!("  no finite values"),
                    }
                    return Ok(());
                }
                match class_summary(&table, &class_col, &class, &column)? {
                    Some(s) => {
                        println!("  Count: {}", s.count);
                        println!("  Min: {:.4}", s.min);
                        println!("  Max: {:.4}", s.max);
                        println!("  Mean: {:.4}", s.mean);
                        println!("  Std dev: {:.4}", s.std_dev);
                    }
                    None => println!("  no finite values"),
                }
            }
        }

        // ── Change ───────────────────────────────────────────────────
        Commands::Change {
            target,
            columns,
            output_column,
            measure,
            direction,
            no_data,
            plot,
            show_all,
        } => {
            let mut table = read_table(&target.input)?;
            let spec = ChangeVariableSpec {
                columns,
                output_column,
                no_data,
                measure,
                direction,
                plot: plot.map(|path| PlotTarget { path, show_all }),
            };

            let start = Instant::now();
            let outcome = detector()
                .find_change(&mut table, &target.class_col, &target.class, &spec)
                .context("Failed to find change")?;
            let elapsed = start.elapsed();

            let changed = outcome.labels.iter().filter(|&&l| l != 0).count();
            println!("No-change range ({} of {} regions changed):", changed, outcome.sample_size);
            print_thresholds(
                &spec.output_column,
                outcome.thresholds.map(|t| (t.lower, t.upper)),
            );

            let out = target.output.unwrap_or(target.input);
            write_table(&table, &out)?;
            done("Change labels", &out, elapsed);
        }

        // ── Vote ─────────────────────────────────────────────────────
        Commands::Vote {
            target,
            vars,
            output_column,
            resolved,
        } => {
            let specs: Vec<ChangeVariableSpec> = read_json(&vars, "change variables")?;
            let mut table = read_table(&target.input)?;

            let start = Instant::now();
            let outcome = detector()
                .combine_by_vote(
                    &mut table,
                    &target.class_col,
                    &target.class,
                    &specs,
                    &output_column,
                )
                .context("Failed to combine change variables")?;
            let elapsed = start.elapsed();

            println!("No-change ranges:");
            for var in &outcome.resolved {
                print_thresholds(
                    &var.spec.output_column,
                    var.thresholds.map(|t| (t.lower, t.upper)),
                );
            }

            if let Some(path) = resolved {
                let json = serde_json::to_string_pretty(&outcome.resolved)?;
                std::fs::write(&path, json)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("Resolved variables saved to: {}", path.display());
            }

            let out = target.output.unwrap_or(target.input);
            write_table(&table, &out)?;
            done("Votes", &out, elapsed);
        }

        // ── Within ───────────────────────────────────────────────────
        Commands::Within {
            target,
            resolved,
            output_column,
        } => {
            let resolved: Vec<ResolvedVariable> = read_json(&resolved, "resolved variables")?;
            let mut table = read_table(&target.input)?;

            let start = Instant::now();
            let within = detector()
                .combine_by_containment(
                    &mut table,
                    &target.class_col,
                    &target.class,
                    &resolved,
                    &output_column,
                )
                .context("Failed to combine no-change ranges")?;
            let elapsed = start.elapsed();

            let inside = within.iter().filter(|&&v| v == 1).count();
            println!("{} regions inside all {} ranges", inside, resolved.len());

            let out = target.output.unwrap_or(target.input);
            write_table(&table, &out)?;
            done("Containment labels", &out, elapsed);
        }

        // ── Class names ──────────────────────────────────────────────
        Commands::ClassNames {
            input,
            class_num_col,
            class_name_col,
            names,
            output,
        } => {
            let names = parse_names(&names)?;
            let mut table = read_table(&input)?;

            let start = Instant::now();
            define_class_names(&mut table, &class_num_col, &class_name_col, &names)
                .context("Failed to define class names")?;
            let elapsed = start.elapsed();

            let out = output.unwrap_or(input);
            write_table(&table, &out)?;
            done("Class names", &out, elapsed);
        }
    }

    Ok(())
}
