//! Output writer for clustered tables, cluster traces and the run report

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::cluster::{ClusterError, ClusterRun, ClusteringStats, ProfileSummary, Strategy};
use crate::utils::format_bytes;

/// Member and prototype rows
pub const CLUSTERED_TABLE_FILE: &str = "entity_cluster.jsonl";

/// One debug record per cluster
pub const CLUSTER_TRACE_FILE: &str = "entity_cluster.cluster.jsonl";

/// Statistics and stage timings
pub const RUN_REPORT_FILE: &str = "run_report.json";

/// Contents of `run_report.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub strategy: Strategy,
    pub stats: ClusteringStats,
    pub profile: ProfileSummary,
}

impl RunReport {
    pub fn new(run: &ClusterRun, strategy: Strategy) -> Self {
        Self {
            generated_at: Utc::now(),
            strategy,
            stats: run.stats.clone(),
            profile: run.profile.clone(),
        }
    }
}

/// Paths written for one run
#[derive(Debug, Clone)]
pub struct WrittenFiles {
    pub table: PathBuf,
    pub trace: PathBuf,
    pub report: PathBuf,
    pub bytes: u64,
}

impl WrittenFiles {
    pub fn summary(&self) -> String {
        format!(
            "Wrote {} ({}), {}, {}",
            self.table.display(),
            format_bytes(self.bytes),
            self.trace.display(),
            self.report.display()
        )
    }
}

/// Writes run outputs into one directory
///
/// Every file is written to `{name}.tmp` first and renamed into place, so
/// readers never see a partially written output.
pub struct OutputWriter {
    output_dir: PathBuf,
}

impl OutputWriter {
    /// Create the writer, creating `output_dir` if needed
    pub fn new(output_dir: &Path) -> Result<Self> {
        fs::create_dir_all(output_dir).with_context(|| {
            format!("Failed to create output directory: {}", output_dir.display())
        })?;

        Ok(Self {
            output_dir: output_dir.to_path_buf(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write the clustered table, the trace and the report
    pub fn write_run(&self, run: &ClusterRun, strategy: Strategy) -> Result<WrittenFiles> {
        let table = self.write_jsonl(CLUSTERED_TABLE_FILE, &run.export.rows)?;
        let trace = self.write_jsonl(CLUSTER_TRACE_FILE, &run.export.trace)?;
        let report = self.write_report(&RunReport::new(run, strategy))?;

        let bytes = [&table, &trace, &report]
            .iter()
            .filter_map(|p| fs::metadata(p).ok())
            .map(|m| m.len())
            .sum();

        tracing::info!(
            dir = %self.output_dir.display(),
            rows = run.export.rows.len(),
            clusters = run.export.trace.len(),
            size = %format_bytes(bytes),
            "Outputs written"
        );

        Ok(WrittenFiles {
            table,
            trace,
            report,
            bytes,
        })
    }

    /// Write `items` as JSON Lines to `filename`
    pub fn write_jsonl<T: Serialize>(&self, filename: &str, items: &[T]) -> Result<PathBuf> {
        self.write_atomic(filename, |writer| {
            for item in items {
                serde_json::to_writer(&mut *writer, item)
                    .with_context(|| format!("Failed to serialize row for {filename}"))?;
                writer.write_all(b"\n")?;
            }
            Ok(())
        })
    }

    /// Write the pretty-printed run report
    pub fn write_report(&self, report: &RunReport) -> Result<PathBuf> {
        self.write_atomic(RUN_REPORT_FILE, |writer| {
            serde_json::to_writer_pretty(&mut *writer, report)
                .context("Failed to serialize run report")?;
            Ok(())
        })
    }

    fn write_atomic<F>(&self, filename: &str, write: F) -> Result<PathBuf>
    where
        F: FnOnce(&mut BufWriter<File>) -> Result<()>,
    {
        let filepath = self.output_dir.join(filename);
        let temp_path = self.output_dir.join(format!("{filename}.tmp"));

        let file = File::create(&temp_path)
            .map_err(|e| ClusterError::table_write_failed(&temp_path, e.to_string()))?;
        let mut writer = BufWriter::new(file);

        write(&mut writer)
            .map_err(|e| ClusterError::table_write_failed(&temp_path, format!("{e:#}")))?;
        writer
            .flush()
            .map_err(|e| ClusterError::table_write_failed(&temp_path, e.to_string()))?;
        drop(writer);

        fs::rename(&temp_path, &filepath)
            .map_err(|e| ClusterError::table_write_failed(&filepath, e.to_string()))?;

        tracing::debug!(path = %filepath.display(), "Output file written");
        Ok(filepath)
    }
}

/// Read a previously written run report
pub fn read_report(path: &Path) -> Result<RunReport> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open run report: {}", path.display()))?;
    serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("Failed to parse run report: {}", path.display()))
}
