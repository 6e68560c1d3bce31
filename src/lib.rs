//! entclust - Entity mention clustering for knowledge-base population
//!
//! Groups entity mentions that refer to the same real-world entity, using
//! knowledge-base and Wikidata link candidates plus surface names, and
//! annotates every mention with its cluster and a confidence score.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`models`] - Entity table rows and link candidates
//! - [`cluster`] - Record model, blocking, cluster construction and scoring
//! - [`storage`] - Entity table loading and output writing
//! - [`error`] - Error classification
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use entclust::cluster::ClusterPipeline;
//! use entclust::config::Config;
//! use entclust::storage::{load_tables, OutputWriter};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let table = load_tables(&config.input.paths)?;
//!     let pipeline = ClusterPipeline::new(config.clustering.clone())?;
//!     let run = pipeline.run(&table);
//!     OutputWriter::new(&config.output.dir)?.write_run(&run, config.clustering.strategy)?;
//!     Ok(())
//! }
//! ```

pub mod cluster;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::cluster::{
        ClusterConfig, ClusterPipeline, ClusterRun, ClusteringStats, ResolvedCluster, Strategy,
    };
    pub use crate::config::Config;
    pub use crate::error::{ClusterError, EntclustErrorTrait, ErrorCategory};
    pub use crate::models::{EntityRow, EntityTable, RawCandidate};
    pub use crate::storage::{load_tables, OutputWriter};
}

// Direct re-exports for convenience
pub use models::{EntityRow, EntityTable, RawCandidate};
