//! Entity mention clustering
//!
//! Groups entity mentions that denote the same real-world entity, elects a
//! canonical Wikidata id per cluster, scores each member and picks a
//! prototype record.
//!
//! # Stages
//!
//! - [`record`] - immutable records with resolved KB and Wikidata links
//! - [`blocking`] - buckets keyed by resolved link
//! - [`builder`] - cluster construction over a [`arena::ClusterArena`]
//! - [`baseline`] - union-find variant of the seeding step
//! - [`confidence`] - member confidence, prototype and cluster id
//! - [`export`] - annotated output rows and debug trace
//!
//! # Example
//!
//! ```
//! use entclust::cluster::{ClusterConfig, ClusterPipeline};
//! use entclust::models::{EntityRow, EntityTable};
//!
//! let table = EntityTable::new(vec![
//!     EntityRow::new("A", "ldcOnt:GPE", &["Paris"]).with_kb("KB1", 0.9, &["Paris"]),
//!     EntityRow::new("B", "ldcOnt:GPE", &["Paris"]).with_kb("KB1", 0.7, &["Paris"]),
//! ]);
//!
//! let pipeline = ClusterPipeline::new(ClusterConfig::default()).unwrap();
//! let run = pipeline.run(&table);
//! assert_eq!(run.clusters.len(), 1);
//! assert_eq!(run.clusters[0].kb_id(), Some("KB1"));
//! ```

pub mod arena;
pub mod baseline;
pub mod blocking;
pub mod builder;
pub mod confidence;
pub mod config;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod record;
pub mod stats;
pub mod union_find;

pub use arena::{Cluster, ClusterArena, ClusterHandle, ClusterOrigin};
pub use blocking::{Block, Blocks};
pub use builder::{BuildReport, ClusterBuilder};
pub use confidence::{ConfidenceEngine, ResolvedCluster};
pub use config::{ClusterConfig, ClusterConfigBuilder, Strategy};
pub use error::{ClusterError, ClusterResult};
pub use export::{export, ClusterTrace, ClusteredRow, ExportTable};
pub use pipeline::{ClusterPipeline, ClusterRun};
pub use record::{
    select_candidate, Candidate, ExcludedRecord, ExclusionReason, Ingestion, Record, RecordStore,
    TypeNormalizer,
};
pub use stats::{ClusteringStats, ProfileSummary, StageClock, StageTiming};
pub use union_find::DisjointSet;
