//! Shardsort CLI — distribute, sort, and merge integer datasets from the
//! command line.

use clap::{Parser as ClapParser, Subcommand};
use serde::Serialize;
use shardsort_core::dataset;
use shardsort_core::plan::PartitionPlan;
use shardsort_runtime::group;
use shardsort_runtime::protocol;
use std::error::Error;
use std::process::ExitCode;

// ANSI color helpers
fn green(s: &str) -> String {
    format!("\x1b[32m{}\x1b[0m", s)
}
fn red(s: &str) -> String {
    format!("\x1b[31m{}\x1b[0m", s)
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{}\x1b[0m", s)
}
fn status_label(label: &str) -> String {
    format!("\x1b[1;32m{:>10}\x1b[0m", label)
}

#[derive(ClapParser)]
#[command(name = "shardsort", version, about = "Rank-distributed integer sorting")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a dataset, sort it across a local rank group, print the result
    Run {
        /// Number of elements to generate
        #[arg(long, default_value_t = 50)]
        count: usize,

        /// Number of ranks, coordinator included (0 = one per available CPU)
        #[arg(long, default_value_t = 6)]
        workers: usize,

        /// Seed for the deterministic generator
        #[arg(long, default_value_t = 0)]
        seed: u32,

        /// Emit a JSON run summary instead of human-readable output
        #[arg(long)]
        json: bool,

        /// Suppress the unsorted/sorted array printouts
        #[arg(long)]
        quiet: bool,
    },
    /// Print the partition table for a dataset size and rank count
    Plan {
        /// Number of elements to partition
        #[arg(long, default_value_t = 50)]
        count: usize,

        /// Number of ranks (0 = one per available CPU)
        #[arg(long, default_value_t = 6)]
        workers: usize,
    },
}

/// Machine-readable summary of one `run` invocation.
#[derive(Serialize)]
struct RunSummary {
    count: usize,
    workers: usize,
    seed: u32,
    sorted: Vec<i64>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            count,
            workers,
            seed,
            json,
            quiet,
        } => cmd_run(count, workers, seed, json, quiet),
        Commands::Plan { count, workers } => cmd_plan(count, workers),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {}", red("error:"), err);
            ExitCode::FAILURE
        }
    }
}

fn cmd_run(
    count: usize,
    workers: usize,
    seed: u32,
    json: bool,
    quiet: bool,
) -> Result<(), Box<dyn Error>> {
    let workers = group::resolve_world(workers);
    let input = dataset::generate(count, seed);

    if !json && !quiet {
        println!("{}\t{}", bold("Unsorted:"), join_values(&input));
    }

    let sorted = protocol::run_local(input, workers)?;

    if json {
        let summary = RunSummary {
            count,
            workers,
            seed,
            sorted,
        };
        println!("{}", serde_json::to_string(&summary)?);
        return Ok(());
    }

    if !quiet {
        println!("{}\t{}", bold("Sorted:"), join_values(&sorted));
    }
    println!(
        "{} {} elements across {} ranks",
        status_label("Sorted"),
        count,
        workers
    );
    Ok(())
}

fn cmd_plan(count: usize, workers: usize) -> Result<(), Box<dyn Error>> {
    let workers = group::resolve_world(workers);
    let plan = PartitionPlan::new(count, workers)?;

    println!(
        "{} {} elements across {} ranks",
        bold("plan:"),
        plan.total(),
        plan.workers()
    );
    for (rank, part) in plan.parts().iter().enumerate() {
        println!("  rank {:>3}  size {:>8}  offset {:>8}", rank, part.size, part.offset);
    }
    println!("{} partition table only, nothing was sorted", green("ok"));
    Ok(())
}

fn join_values(values: &[i64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
