//! End-to-end clustering of one entity table

use std::time::Instant;

use tracing::{info, instrument, warn};

use super::blocking::Blocks;
use super::builder::ClusterBuilder;
use super::confidence::{ConfidenceEngine, ResolvedCluster};
use super::config::{ClusterConfig, Strategy};
use super::error::ClusterResult;
use super::export::{export, ExportTable};
use super::record::RecordStore;
use super::stats::{ClusteringStats, ProfileSummary, StageClock};
use crate::models::EntityTable;

/// Everything produced by one run
#[derive(Debug, Clone)]
pub struct ClusterRun {
    pub clusters: Vec<ResolvedCluster>,
    pub export: ExportTable,
    pub stats: ClusteringStats,
    pub profile: ProfileSummary,
}

impl ClusterRun {
    pub fn integrity_violations(&self) -> usize {
        self.stats.build.integrity_violations
    }

    /// Cluster containing `entity`
    pub fn cluster_of(&self, entity: &str) -> Option<&ResolvedCluster> {
        self.clusters
            .iter()
            .find(|c| c.members().iter().any(|m| m == entity))
    }
}

/// Clustering pipeline over in-memory tables
#[derive(Debug, Clone)]
pub struct ClusterPipeline {
    config: ClusterConfig,
}

impl ClusterPipeline {
    /// Create a pipeline after validating the config
    pub fn new(config: ClusterConfig) -> ClusterResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Cluster `table`; problems inside the run are logged, not returned
    #[instrument(skip_all, fields(rows = table.len(), strategy = %self.config.strategy))]
    pub fn run(&self, table: &EntityTable) -> ClusterRun {
        let start = Instant::now();
        let mut clock = StageClock::start();
        let mut stats = ClusteringStats::new();

        clock.stage("ingest");
        let ingestion = RecordStore::ingest(table, &self.config);
        stats.record_ingestion(table.len(), &ingestion);
        info!(
            records = ingestion.store.len(),
            excluded = ingestion.excluded.len(),
            duplicates = ingestion.duplicate_rows,
            "Entity table ingested"
        );

        clock.stage("blocking");
        let kb_blocks = Blocks::by_kb(&ingestion.store);
        let wd_blocks = Blocks::by_wikidata(&ingestion.store);
        info!(
            kb_blocks = kb_blocks.len(),
            wikidata_blocks = wd_blocks.len(),
            "Blocking complete"
        );

        let mut builder = ClusterBuilder::new(&ingestion.store);
        match self.config.strategy {
            Strategy::Layered => {
                clock.stage("seed");
                builder.seed_from_kb_blocks(&kb_blocks);
                clock.stage("reconcile");
                builder.reconcile_wikidata_blocks(&wd_blocks);
            }
            Strategy::Baseline => {
                clock.stage("seed");
                builder.seed_baseline(&kb_blocks);
            }
        }

        clock.stage("type_split");
        builder.split_by_type();

        clock.stage("residual");
        builder.assign_residuals();

        clock.stage("placeholders");
        builder.add_placeholders(&ingestion.excluded);

        clock.stage("verify");
        let violations = builder.verify(&ingestion.excluded);
        if violations > 0 {
            warn!(violations, "Cluster partition is inconsistent");
        }
        let (arena, report) = builder.finish();

        clock.stage("confidence");
        let mut engine = ConfidenceEngine::new(&ingestion.store, &self.config);
        let clusters = engine.resolve_all(arena);

        clock.stage("export");
        let exported = export(table, &clusters);
        let profile = clock.finish();

        stats.record_clusters(&report, &clusters);
        stats.set_duration(start);
        info!(
            clusters = clusters.len(),
            rows = exported.rows.len(),
            duration_ms = stats.duration_ms,
            "Clustering complete"
        );

        ClusterRun {
            clusters,
            export: exported,
            stats,
            profile,
        }
    }
}
