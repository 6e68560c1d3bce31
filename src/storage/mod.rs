//! Table storage adapters
//!
//! Reading entity tables from disk and writing clustered output. The
//! clustering core never touches the filesystem; everything here runs
//! before or after a [`crate::cluster::ClusterPipeline`] run.

pub mod loader;
pub mod writer;

pub use loader::{
    discover_tables, load_table, load_tables, parse_table_text, read_table_file,
    ENTITY_TABLE_SUFFIXES,
};
pub use writer::{
    read_report, OutputWriter, RunReport, WrittenFiles, CLUSTERED_TABLE_FILE, CLUSTER_TRACE_FILE,
    RUN_REPORT_FILE,
};
