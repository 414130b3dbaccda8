//! Experiment driver: algorithms × thread counts × workloads × trials.
//!
//! One trial pins `threads` workers to cores `0..threads`, wipes the
//! caches, releases the workers through a per-trial start flag, and
//! measures wall-clock time until the last worker joins. Each worker runs a
//! fixed number of episodes of `{ random busy-work; barrier wait }`. A
//! fresh barrier (and, for the tree variants, fresh nodes) is built for
//! every trial; per-thread workload seeds are derived once per cell so all
//! trials of a cell replay the same work.

use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use rondo_core::{
    Backoff, CentralizedBarrier, GlobalTreeBarrier, Locality, TreeBarrier,
};
use rondo_error::{Result, RondoError};

use crate::affinity;
use crate::cache_wiper::CacheWiper;
use crate::meanconf::{ConfidenceInterval, LatencyTriple};

/// Which barrier a run exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Centralized sense-reversing barrier.
    Centralized,
    /// Static tree barrier with local departure.
    TreeLocal,
    /// Static tree barrier with a global departure flag.
    TreeGlobal,
}

impl Algorithm {
    /// The CLI tag naming this algorithm.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Centralized => "centralized",
            Self::TreeLocal => "tree_local",
            Self::TreeGlobal => "tree_global",
        }
    }
}

impl FromStr for Algorithm {
    type Err = RondoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "centralized" => Ok(Self::Centralized),
            "tree_local" => Ok(Self::TreeLocal),
            "tree_global" => Ok(Self::TreeGlobal),
            other => Err(RondoError::UnknownAlgorithm {
                tag: other.to_owned(),
            }),
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Knobs for one experiment run.
#[derive(Debug, Clone)]
pub struct ExperimentConfig {
    /// Thread counts 1..=`max_threads` are measured.
    pub max_threads: usize,
    /// Workload parameters per thread count. The report header always names
    /// the full axis; this default mirrors the subset the measurements
    /// actually exercise.
    pub workloads: Vec<u64>,
    /// Trials per cell feeding the confidence interval.
    pub trials: usize,
    /// Barrier episodes per worker per trial.
    pub episodes: usize,
    /// Tree layout placement preference.
    pub locality: Locality,
    /// Master seed for the per-thread workload seeds.
    pub seed: u64,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            max_threads: 8,
            workloads: vec![1, 10, 100],
            trials: 30,
            episodes: 10_000,
            locality: Locality::Good,
            seed: 1337,
        }
    }
}

impl ExperimentConfig {
    fn validate(&self) -> Result<()> {
        if self.max_threads == 0 {
            return Err(RondoError::ZeroFanout);
        }
        if self.workloads.iter().any(|&w| w == 0) {
            return Err(RondoError::ZeroWorkload);
        }
        if self.trials < 2 {
            return Err(RondoError::NotEnoughSamples {
                needed: 2,
                have: self.trials,
            });
        }
        Ok(())
    }
}

/// One row of the result grid: a thread count and its per-workload triples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub threads: usize,
    pub cells: Vec<LatencyTriple>,
}

/// The full result grid of one experiment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentReport {
    pub algorithm: Algorithm,
    pub workloads: Vec<u64>,
    pub rows: Vec<ReportRow>,
}

// Start-flag states. Workers spin on WAIT; ABORT releases them without
// running their bodies when setup fails partway.
const WAIT: u8 = 0;
const RUN: u8 = 1;
const ABORT: u8 = 2;

/// Spawn one worker per entry, pin worker `j` to core `j`, release them
/// together, and return the wall-clock nanoseconds from release to the last
/// join.
fn measure_trial(workers: Vec<Box<dyn FnOnce() + Send>>) -> Result<f64> {
    let start = Arc::new(AtomicU8::new(WAIT));
    let mut handles = Vec::with_capacity(workers.len());
    let mut setup_error = None;

    for (core, body) in workers.into_iter().enumerate() {
        let start = Arc::clone(&start);
        let handle = thread::spawn(move || {
            let mut backoff = Backoff::default();
            loop {
                match start.load(Ordering::Acquire) {
                    WAIT => backoff.snooze(),
                    RUN => break,
                    _ => return,
                }
            }
            body();
        });
        let pinned = affinity::pin_thread(&handle, core);
        handles.push(handle);
        if let Err(err) = pinned {
            setup_error = Some(err);
            break;
        }
    }

    if let Some(err) = setup_error {
        start.store(ABORT, Ordering::Release);
        for handle in handles {
            let _ = handle.join();
        }
        return Err(err);
    }

    let begin = Instant::now();
    start.store(RUN, Ordering::Release);
    for handle in handles {
        handle.join().map_err(|_| RondoError::WorkerPanicked)?;
    }
    #[allow(clippy::cast_precision_loss)]
    let elapsed_ns = begin.elapsed().as_nanos() as f64;
    Ok(elapsed_ns)
}

/// Worker loop shared by all algorithms: the per-episode body over any
/// barrier wait.
fn episode_loop(
    episodes: usize,
    mut work: crate::workload::RandomWorkload,
    mut wait: impl FnMut(),
) {
    for _ in 0..episodes {
        work.run();
        wait();
    }
}

fn build_workers(
    algorithm: Algorithm,
    threads: usize,
    workload: u64,
    seeds: &[u64],
    episodes: usize,
    locality: Locality,
) -> Result<Vec<Box<dyn FnOnce() + Send>>> {
    match algorithm {
        Algorithm::Centralized => {
            let barrier = CentralizedBarrier::new(threads)?;
            let mut participants: Vec<_> = (0..threads - 1).map(|_| barrier.clone()).collect();
            participants.push(barrier);
            participants
                .into_iter()
                .zip(seeds)
                .map(|(mut b, &seed)| {
                    let work = crate::workload::RandomWorkload::new(workload, seed)?;
                    Ok(Box::new(move || {
                        episode_loop(episodes, work, || {
                            b.wait();
                        });
                    }) as Box<dyn FnOnce() + Send>)
                })
                .collect()
        }
        Algorithm::TreeLocal => TreeBarrier::with_layout(threads, locality)?
            .into_iter()
            .zip(seeds)
            .map(|(mut w, &seed)| {
                let work = crate::workload::RandomWorkload::new(workload, seed)?;
                Ok(Box::new(move || {
                    episode_loop(episodes, work, || {
                        w.wait();
                    });
                }) as Box<dyn FnOnce() + Send>)
            })
            .collect(),
        Algorithm::TreeGlobal => GlobalTreeBarrier::with_layout(threads, locality)?
            .into_iter()
            .zip(seeds)
            .map(|(mut w, &seed)| {
                let work = crate::workload::RandomWorkload::new(workload, seed)?;
                Ok(Box::new(move || {
                    episode_loop(episodes, work, || {
                        w.wait();
                    });
                }) as Box<dyn FnOnce() + Send>)
            })
            .collect(),
    }
}

/// Run the full grid for `algorithm` and return the result table.
///
/// # Errors
///
/// Configuration errors before any thread is spawned; affinity or worker
/// failures abort the run.
pub fn run_experiment(algorithm: Algorithm, config: &ExperimentConfig) -> Result<ExperimentReport> {
    config.validate()?;

    let mut wiper = CacheWiper::new();
    let mut rows = Vec::with_capacity(config.max_threads);

    for threads in 1..=config.max_threads {
        let mut cells = Vec::with_capacity(config.workloads.len());
        for &workload in &config.workloads {
            tracing::info!(
                target: "rondo.harness",
                %algorithm,
                threads,
                workload,
                trials = config.trials,
                episodes = config.episodes,
                "running cell"
            );

            // Every trial of this cell replays the same per-thread seeds.
            let mut rng = StdRng::seed_from_u64(config.seed);
            let seeds: Vec<u64> = (0..threads).map(|_| rng.gen()).collect();

            let mut interval = ConfidenceInterval::new(config.trials);
            for trial in 0..config.trials {
                wiper.clear_caches();
                let workers = build_workers(
                    algorithm,
                    threads,
                    workload,
                    &seeds,
                    config.episodes,
                    config.locality,
                )?;
                let elapsed_ns = measure_trial(workers)?;
                tracing::debug!(
                    target: "rondo.harness",
                    trial,
                    elapsed_ns,
                    "trial complete"
                );
                interval.add(elapsed_ns);
            }
            cells.push(interval.summary()?);
        }
        rows.push(ReportRow { threads, cells });
    }

    Ok(ExperimentReport {
        algorithm,
        workloads: config.workloads.clone(),
        rows,
    })
}
