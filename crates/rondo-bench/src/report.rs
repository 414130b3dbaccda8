//! Result-file writers.
//!
//! The primary format is the tab-separated table consumed by the plotting
//! scripts: a fixed header naming the full workload axis, then one line per
//! thread count carrying space-separated `lower mean upper` triples. A JSON
//! rendering of the same report is available as a machine-readable
//! artifact.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use rondo_error::Result;

use crate::harness::ExperimentReport;

/// The workload axis named by the report header. Measurements default to
/// the `{1, 10, 100}` prefix; the header always lists the full axis.
pub const WORKLOAD_AXIS: [u64; 7] = [1, 10, 100, 1_000, 10_000, 100_000, 1_000_000];

/// Write the tab-separated result table.
///
/// # Errors
///
/// Any I/O failure creating or writing the file. The file handle is closed
/// on all exit paths.
pub fn write_report(path: &Path, report: &ExperimentReport) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);

    let axis: Vec<String> = WORKLOAD_AXIS.iter().map(u64::to_string).collect();
    writeln!(out, "NumberOfThreads\\Workload {}", axis.join("\t\t"))?;

    for row in &report.rows {
        write!(out, "{}", row.threads)?;
        for cell in &row.cells {
            write!(out, "\t{} {} {}", cell.lower, cell.mean, cell.upper)?;
        }
        writeln!(out)?;
    }

    out.flush()?;
    tracing::info!(
        target: "rondo.report",
        path = %path.display(),
        rows = report.rows.len(),
        "report written"
    );
    Ok(())
}

/// Write the report as pretty-printed JSON.
///
/// # Errors
///
/// Any I/O failure creating or writing the file.
pub fn write_report_json(path: &Path, report: &ExperimentReport) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(report).map_err(std::io::Error::from)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::{Algorithm, ReportRow};
    use crate::meanconf::LatencyTriple;

    fn sample_report() -> ExperimentReport {
        let cell = |base: f64| LatencyTriple {
            lower: base - 1.0,
            mean: base,
            upper: base + 1.0,
        };
        ExperimentReport {
            algorithm: Algorithm::TreeGlobal,
            workloads: vec![1, 10],
            rows: vec![
                ReportRow {
                    threads: 1,
                    cells: vec![cell(10.0), cell(20.0)],
                },
                ReportRow {
                    threads: 2,
                    cells: vec![cell(30.0), cell(40.0)],
                },
            ],
        }
    }

    #[test]
    fn tab_separated_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tsv");
        write_report(&path, &sample_report()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "NumberOfThreads\\Workload 1\t\t10\t\t100\t\t1000\t\t10000\t\t100000\t\t1000000"
        );
        assert_eq!(lines[1], "1\t9 10 11\t19 20 21");
        assert_eq!(lines[2], "2\t29 30 31\t39 40 41");
    }

    #[test]
    fn one_triple_per_workload_cell() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tsv");
        write_report(&path, &sample_report()).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        for line in text.lines().skip(1) {
            let fields: Vec<&str> = line.split('\t').collect();
            assert_eq!(fields.len(), 3, "thread count plus two cells");
            for cell in &fields[1..] {
                assert_eq!(cell.split(' ').count(), 3, "lower mean upper");
            }
        }
    }

    #[test]
    fn json_artifact_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let report = sample_report();
        write_report_json(&path, &report).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let back: ExperimentReport = serde_json::from_str(&text).unwrap();
        assert_eq!(back, report);
        assert!(text.contains("\"tree_global\""));
    }

    #[test]
    fn unwritable_path_surfaces_io_error() {
        let report = sample_report();
        let err = write_report(Path::new("/nonexistent-dir/out.tsv"), &report).unwrap_err();
        assert!(matches!(err, rondo_error::RondoError::Io(_)));
    }
}
