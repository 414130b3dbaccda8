//! Latency benchmark harness for the rondo barriers.
//!
//! Drives the experiment grid from the barrier papers: for each algorithm,
//! each thread count, and each workload parameter, run repeated trials of
//! many barrier episodes on pinned, cold-cache threads and report the mean
//! latency with a Student-t confidence interval.
//!
//! The harness is deliberately separate from `rondo-core`: the barriers know
//! nothing about pinning, cache wiping, or statistics, and the harness
//! reaches them only through their public wait interfaces.

pub mod affinity;
pub mod cache_wiper;
pub mod harness;
pub mod meanconf;
pub mod report;
pub mod workload;

pub use affinity::{pin_current_thread, pin_thread};
pub use cache_wiper::{CacheWiper, WIPE_BUFFER_BYTES};
pub use harness::{run_experiment, Algorithm, ExperimentConfig, ExperimentReport, ReportRow};
pub use meanconf::{ConfidenceInterval, LatencyTriple};
pub use report::{write_report, write_report_json, WORKLOAD_AXIS};
pub use workload::RandomWorkload;
