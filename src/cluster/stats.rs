//! Statistics and profiling for a clustering run
//!
//! # Features
//!
//! - Linking statistics (records, exclusions, KB and Wikidata coverage)
//! - Cluster counts by origin and a size histogram
//! - Per-stage timings

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use super::builder::BuildReport;
use super::confidence::ResolvedCluster;
use super::record::Ingestion;

// ============================================================================
// Clustering Statistics
// ============================================================================

/// Statistics for one clustering run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusteringStats {
    /// Rows in the input table
    pub input_rows: usize,

    /// Records admitted to clustering
    pub records: usize,

    /// Rows excluded by type or missing names
    pub excluded: usize,

    /// Exclusion counts by reason
    pub excluded_by_reason: BTreeMap<String, usize>,

    /// Rows whose id repeats an earlier row
    pub duplicate_rows: usize,

    /// Records with a selected KB link
    pub kb_linked: usize,

    /// Records with a selected Wikidata link
    pub wikidata_linked: usize,

    /// Records with both links
    pub both_linked: usize,

    /// Builder counters
    pub build: BuildReport,

    /// Final cluster count
    pub clusters: usize,

    /// Final clusters by origin
    pub clusters_by_origin: BTreeMap<String, usize>,

    /// Number of clusters per member count
    pub size_histogram: BTreeMap<usize, usize>,

    /// Largest cluster
    pub max_cluster_size: usize,

    /// Mean member confidence over all clustered records
    pub avg_confidence: f64,

    /// Clustering duration in milliseconds
    pub duration_ms: u64,
}

impl ClusteringStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Record ingestion counts
    pub fn record_ingestion(&mut self, input_rows: usize, ingestion: &Ingestion) {
        self.input_rows = input_rows;
        self.records = ingestion.store.len();
        self.excluded = ingestion.excluded.len();
        self.duplicate_rows = ingestion.duplicate_rows;

        for ex in &ingestion.excluded {
            *self
                .excluded_by_reason
                .entry(ex.reason.as_str().to_string())
                .or_insert(0) += 1;
        }

        for record in ingestion.store.iter() {
            let kb = record.has_kb_link();
            let wd = record.selected_wikidata_index().is_some();
            if kb {
                self.kb_linked += 1;
            }
            if wd {
                self.wikidata_linked += 1;
            }
            if kb && wd {
                self.both_linked += 1;
            }
        }
    }

    /// Record final clusters
    pub fn record_clusters(&mut self, report: &BuildReport, clusters: &[ResolvedCluster]) {
        self.build = report.clone();
        self.clusters = clusters.len();

        let mut confidence_sum = 0.0;
        let mut confidence_count = 0usize;
        for cluster in clusters {
            *self
                .clusters_by_origin
                .entry(cluster.origin().as_str().to_string())
                .or_insert(0) += 1;
            *self.size_histogram.entry(cluster.len()).or_insert(0) += 1;
            self.max_cluster_size = self.max_cluster_size.max(cluster.len());
            for score in cluster.member_confidence().values() {
                confidence_sum += score;
                confidence_count += 1;
            }
        }
        self.avg_confidence = if confidence_count == 0 {
            0.0
        } else {
            confidence_sum / confidence_count as f64
        };
    }

    /// Set duration from Instant
    pub fn set_duration(&mut self, start: Instant) {
        self.duration_ms = start.elapsed().as_millis() as u64;
    }

    /// Share of records with a KB link, as percentage
    pub fn kb_link_rate(&self) -> f64 {
        percentage(self.kb_linked, self.records)
    }

    /// Share of records with a Wikidata link, as percentage
    pub fn wikidata_link_rate(&self) -> f64 {
        percentage(self.wikidata_linked, self.records)
    }

    /// Records per cluster, placeholders included
    pub fn avg_cluster_size(&self) -> f64 {
        if self.clusters == 0 {
            0.0
        } else {
            (self.records + self.excluded) as f64 / self.clusters as f64
        }
    }

    /// Number of clusters with exactly one member
    pub fn singletons(&self) -> usize {
        self.size_histogram.get(&1).copied().unwrap_or(0)
    }

    /// Get summary as formatted string
    pub fn summary(&self) -> String {
        format!(
            "Records: {} (+{} excluded, {} duplicate rows) | KB linked: {:.1}% | Wikidata linked: {:.1}% | Clusters: {} ({} singletons) | Integrity violations: {} | Time: {}ms",
            self.records,
            self.excluded,
            self.duplicate_rows,
            self.kb_link_rate(),
            self.wikidata_link_rate(),
            self.clusters,
            self.singletons(),
            self.build.integrity_violations,
            self.duration_ms
        )
    }

    /// Get detailed report
    pub fn detailed_report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Entity Clustering Report ===\n\n");

        report.push_str(&format!("Input Rows: {}\n", self.input_rows));
        report.push_str(&format!("  - Clustered Records: {}\n", self.records));
        report.push_str(&format!("  - Excluded: {}\n", self.excluded));
        for (reason, count) in &self.excluded_by_reason {
            report.push_str(&format!("    - {}: {}\n", reason, count));
        }
        report.push_str(&format!("  - Duplicate Rows: {}\n\n", self.duplicate_rows));

        report.push_str("Linking:\n");
        report.push_str(&format!(
            "  - KB: {} ({:.1}%)\n",
            self.kb_linked,
            self.kb_link_rate()
        ));
        report.push_str(&format!(
            "  - Wikidata: {} ({:.1}%)\n",
            self.wikidata_linked,
            self.wikidata_link_rate()
        ));
        report.push_str(&format!("  - Both: {}\n\n", self.both_linked));

        report.push_str("Construction:\n");
        report.push_str(&format!("  - KB Clusters: {}\n", self.build.kb_clusters));
        report.push_str(&format!(
            "  - Absorbed Wikidata Buckets: {} ({} records)\n",
            self.build.absorbed_buckets, self.build.absorbed_records
        ));
        report.push_str(&format!(
            "  - Wikidata-only Clusters: {}\n",
            self.build.wikidata_only_clusters
        ));
        if self.build.baseline_clusters > 0 {
            report.push_str(&format!(
                "  - Baseline Groups: {} ({} merges)\n",
                self.build.baseline_clusters, self.build.baseline_merges
            ));
        }
        report.push_str(&format!("  - Type Splits: {}\n", self.build.type_splits));
        report.push_str(&format!(
            "  - Residual: {} merged, {} singletons\n",
            self.build.residual_merged, self.build.residual_singletons
        ));
        report.push_str(&format!("  - Placeholders: {}\n", self.build.placeholders));
        report.push_str(&format!(
            "  - Integrity Violations: {}\n\n",
            self.build.integrity_violations
        ));

        report.push_str(&format!("Clusters: {}\n", self.clusters));
        for (origin, count) in &self.clusters_by_origin {
            report.push_str(&format!("  - {}: {}\n", origin, count));
        }
        report.push_str(&format!(
            "  - Avg Size: {:.2} | Max Size: {}\n",
            self.avg_cluster_size(),
            self.max_cluster_size
        ));
        report.push_str(&format!("  - Avg Confidence: {:.3}\n", self.avg_confidence));
        if !self.size_histogram.is_empty() {
            report.push_str("  - Size Histogram:\n");
            for (size, count) in &self.size_histogram {
                report.push_str(&format!("    - {:>4}: {}\n", size, count));
            }
        }

        report.push_str(&format!("\nTotal Time: {}ms\n", self.duration_ms));

        report
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64) * 100.0
    }
}

// ============================================================================
// Stage Timing
// ============================================================================

/// Wall-clock timer for the stages of one run
#[derive(Debug)]
pub struct StageClock {
    started: Instant,
    finished: Vec<(&'static str, Duration)>,
    running: Option<(&'static str, Instant)>,
}

impl StageClock {
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
            finished: Vec::new(),
            running: None,
        }
    }

    /// Close the running stage and open `name`
    pub fn stage(&mut self, name: &'static str) {
        self.close();
        self.running = Some((name, Instant::now()));
    }

    fn close(&mut self) {
        if let Some((name, since)) = self.running.take() {
            self.finished.push((name, since.elapsed()));
        }
    }

    /// Close the running stage and summarize the run
    pub fn finish(mut self) -> ProfileSummary {
        self.close();
        let total = self.started.elapsed();
        let stages = self
            .finished
            .into_iter()
            .map(|(name, took)| StageTiming {
                name: name.to_string(),
                duration_ms: took.as_millis() as u64,
                percentage: if total.is_zero() {
                    0.0
                } else {
                    took.as_secs_f64() / total.as_secs_f64() * 100.0
                },
            })
            .collect();

        ProfileSummary {
            total_ms: total.as_millis() as u64,
            stages,
        }
    }
}

/// Stage timings of a finished run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub total_ms: u64,
    /// In execution order
    pub stages: Vec<StageTiming>,
}

impl ProfileSummary {
    pub fn report(&self) -> String {
        let mut report = format!("Stage Timings (Total: {}ms)\n", self.total_ms);
        for stage in &self.stages {
            report.push_str(&format!(
                "  {:14} {:>6}ms ({:>5.1}%)\n",
                stage.name, stage.duration_ms, stage.percentage
            ));
        }
        report
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTiming {
    pub name: String,
    pub duration_ms: u64,
    /// Share of the whole run
    pub percentage: f64,
}
