//! Custom error types for clustering operations
//!
//! Most clustering problems are degraded locally instead of aborting the
//! batch. The variants here are what gets logged or, for the adapters and
//! configuration, returned to the caller.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for clustering operations
pub type ClusterResult<T> = Result<T, ClusterError>;

/// Custom error type for clustering operations
#[derive(Debug, Error)]
pub enum ClusterError {
    // =========================================================================
    // Integrity Errors
    // =========================================================================
    /// Record would belong to more than one cluster
    #[error("Entity '{record}' already belongs to cluster #{existing}, refused for cluster #{attempted}")]
    DuplicateMembership {
        record: String,
        existing: usize,
        attempted: usize,
    },

    /// Record was never placed in any cluster
    #[error("Entity '{record}' is not assigned to any cluster")]
    UnassignedRecord { record: String },

    /// Cluster member that is not part of the input
    #[error("Cluster member '{record}' is not in the entity table")]
    UnknownRecord { record: String },

    /// Cluster handle does not refer to a live cluster
    #[error("Cluster #{handle} does not exist")]
    UnknownCluster { handle: usize },

    /// Live cluster without members
    #[error("Cluster #{handle} has no members")]
    EmptyCluster { handle: usize },

    // =========================================================================
    // Input Errors
    // =========================================================================
    /// Row cannot be turned into a record
    #[error("Invalid entity record '{record}': {reason}")]
    InvalidRecord { record: String, reason: String },

    /// Same entity id seen twice
    #[error("Duplicate entity id: '{record}'")]
    DuplicateRecordId { record: String },

    // =========================================================================
    // Table I/O Errors
    // =========================================================================
    /// Failed to load an entity table
    #[error("Failed to load entity table {path:?}: {reason}")]
    TableLoadFailed { path: PathBuf, reason: String },

    /// Failed to write an output table
    #[error("Failed to write table {path:?}: {reason}")]
    TableWriteFailed { path: PathBuf, reason: String },

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid configuration value
    #[error("Invalid config '{field}' = '{value}': {reason}")]
    InvalidConfig {
        field: String,
        value: String,
        reason: String,
    },

    /// Missing required configuration
    #[error("Missing required config: '{field}'")]
    MissingConfig { field: String },
}

// ============================================================================
// Helper constructors
// ============================================================================

impl ClusterError {
    /// Create a duplicate membership error
    pub fn duplicate_membership(record: impl Into<String>, existing: usize, attempted: usize) -> Self {
        ClusterError::DuplicateMembership {
            record: record.into(),
            existing,
            attempted,
        }
    }

    /// Create an invalid record error
    pub fn invalid_record(record: impl Into<String>, reason: impl Into<String>) -> Self {
        ClusterError::InvalidRecord {
            record: record.into(),
            reason: reason.into(),
        }
    }

    pub fn duplicate_record_id(record: impl Into<String>) -> Self {
        ClusterError::DuplicateRecordId {
            record: record.into(),
        }
    }

    /// Create a table load error
    pub fn table_load_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ClusterError::TableLoadFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a table write error
    pub fn table_write_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ClusterError::TableWriteFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a config validation error
    pub fn invalid_config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ClusterError::InvalidConfig {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Integrity violations describe a broken partition of the entity set
    pub fn is_integrity_violation(&self) -> bool {
        matches!(
            self,
            ClusterError::DuplicateMembership { .. }
                | ClusterError::UnassignedRecord { .. }
                | ClusterError::UnknownRecord { .. }
                | ClusterError::EmptyCluster { .. }
        )
    }

    /// Check if the batch can continue after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ClusterError::DuplicateMembership { .. }
                | ClusterError::UnassignedRecord { .. }
                | ClusterError::UnknownRecord { .. }
                | ClusterError::EmptyCluster { .. }
                | ClusterError::InvalidRecord { .. }
                | ClusterError::DuplicateRecordId { .. }
        )
    }

    /// Short operator-facing description
    pub fn description(&self) -> &'static str {
        match self {
            ClusterError::DuplicateMembership { .. } => "entity in multiple clusters",
            ClusterError::UnassignedRecord { .. } => "entity without cluster",
            ClusterError::UnknownRecord { .. } => "unknown cluster member",
            ClusterError::UnknownCluster { .. } => "unknown cluster",
            ClusterError::EmptyCluster { .. } => "empty cluster",
            ClusterError::InvalidRecord { .. } => "invalid entity record",
            ClusterError::DuplicateRecordId { .. } => "duplicate entity id",
            ClusterError::TableLoadFailed { .. } => "table load failed",
            ClusterError::TableWriteFailed { .. } => "table write failed",
            ClusterError::InvalidConfig { .. } => "invalid configuration",
            ClusterError::MissingConfig { .. } => "missing configuration",
        }
    }
}
