//! Error classification for the entclust crate
//!
//! Clustering and table errors are [`ClusterError`] values. The adapters
//! wrap them in `anyhow` with context, while the cluster builder and the
//! loader log the recoverable ones under their [`ErrorCategory`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use entclust::error::{EntclustErrorTrait, ErrorCategory};
//!
//! if err.is_recoverable() {
//!     tracing::warn!(category = err.category().as_str(), "{}", err.short_desc());
//! }
//! ```

pub use crate::cluster::error::ClusterError;

/// Common trait for all entclust error types
pub trait EntclustErrorTrait: std::error::Error {
    /// Check if the run can continue after this error
    fn is_recoverable(&self) -> bool;

    /// Short operator-facing description
    fn short_desc(&self) -> String;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Broken cluster partition
    Integrity,
    /// Malformed or duplicate input rows
    Input,
    /// Table reads and writes
    Storage,
    /// Configuration and validation errors
    Config,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integrity => "integrity",
            Self::Input => "input",
            Self::Storage => "storage",
            Self::Config => "config",
        }
    }
}

impl EntclustErrorTrait for ClusterError {
    fn is_recoverable(&self) -> bool {
        ClusterError::is_recoverable(self)
    }

    fn short_desc(&self) -> String {
        self.description().to_string()
    }

    fn category(&self) -> ErrorCategory {
        match self {
            ClusterError::DuplicateMembership { .. }
            | ClusterError::UnassignedRecord { .. }
            | ClusterError::UnknownRecord { .. }
            | ClusterError::UnknownCluster { .. }
            | ClusterError::EmptyCluster { .. } => ErrorCategory::Integrity,
            ClusterError::InvalidRecord { .. } | ClusterError::DuplicateRecordId { .. } => {
                ErrorCategory::Input
            }
            ClusterError::TableLoadFailed { .. } | ClusterError::TableWriteFailed { .. } => {
                ErrorCategory::Storage
            }
            ClusterError::InvalidConfig { .. } | ClusterError::MissingConfig { .. } => {
                ErrorCategory::Config
            }
        }
    }
}
