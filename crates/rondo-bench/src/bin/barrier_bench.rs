//! Barrier latency benchmark CLI.
//!
//! ```text
//! barrier-bench <centralized|tree_local|tree_global> <output-path>
//! ```
//!
//! Runs the default experiment grid (threads 1..=8, workloads {1, 10, 100},
//! 30 trials of 10 000 episodes) for the chosen algorithm and writes the
//! tab-separated result table to the output path. Exit code 0 on success,
//! 2 for malformed arguments, 1 for OS or I/O failures.

use std::env;
use std::path::Path;
use std::process::ExitCode;

use rondo_bench::{run_experiment, write_report, Algorithm, ExperimentConfig};
use rondo_error::{Result, RondoError};

fn run(args: &[String]) -> Result<()> {
    let [tag, output] = args else {
        return Err(RondoError::Usage);
    };
    let algorithm: Algorithm = tag.parse()?;
    let config = ExperimentConfig::default();

    tracing::info!(
        target: "rondo.cli",
        %algorithm,
        output = %output,
        max_threads = config.max_threads,
        trials = config.trials,
        "starting benchmark"
    );

    let report = run_experiment(algorithm, &config)?;
    write_report(Path::new(output), &report)?;
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("barrier-bench: {err}");
            ExitCode::from(err.exit_code())
        }
    }
}
