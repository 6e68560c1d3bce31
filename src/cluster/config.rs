//! Clustering configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::ClusterError;

/// How the initial clusters are linked before type split and residual assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// KB blocks first, then Wikidata-only blocks reconciled by election
    #[default]
    Layered,

    /// KB blocks merged on shared Wikidata candidates (union-find)
    Baseline,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Layered => "layered",
            Self::Baseline => "baseline",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "layered" => Ok(Self::Layered),
            "baseline" | "legacy" => Ok(Self::Baseline),
            other => Err(ClusterError::invalid_config(
                "strategy",
                other,
                "Must be 'layered' or 'baseline'",
            )),
        }
    }
}

/// Clustering configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Linking strategy
    pub strategy: Strategy,

    /// Allowed top-level type prefixes; empty admits every type
    pub allowed_type_prefixes: Vec<String>,

    /// Exclude rows whose names column is missing
    pub require_names: bool,

    /// Separator between ontology namespace and type (`ldcOnt:GPE`)
    pub type_namespace_separator: String,

    /// Top-level types collapsed into one geo/location category
    pub geo_loc_types: Vec<String>,

    /// Normalized name of the collapsed geo/location category
    pub geo_loc_label: String,

    /// Text between prototype id and random suffix in `full_id`
    pub cluster_id_infix: String,

    /// Length of the random `full_id` suffix
    pub cluster_id_suffix_len: usize,

    /// Decimal places kept in member confidence
    pub confidence_decimals: u32,

    /// Seed for the suffix generator; `None` draws from OS entropy
    pub seed: Option<u64>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Layered,
            allowed_type_prefixes: vec![
                "GPE".to_string(),
                "LOC".to_string(),
                "ORG".to_string(),
                "PER".to_string(),
            ],
            require_names: true,
            type_namespace_separator: ":".to_string(),
            geo_loc_types: vec![
                "GPE".to_string(),
                "LOC".to_string(),
                "GeopoliticalEntity".to_string(),
                "Location".to_string(),
            ],
            geo_loc_label: "GeoLoc".to_string(),
            cluster_id_infix: "-cluster-".to_string(),
            cluster_id_suffix_len: 10,
            confidence_decimals: 2,
            seed: None,
        }
    }
}

impl ClusterConfig {
    /// Create a new builder for ClusterConfig
    pub fn builder() -> ClusterConfigBuilder {
        ClusterConfigBuilder::default()
    }

    /// Config that admits every row, used when the table is already filtered
    pub fn permissive() -> Self {
        Self {
            allowed_type_prefixes: Vec::new(),
            require_names: false,
            ..Default::default()
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ClusterError> {
        if self.cluster_id_suffix_len == 0 {
            return Err(ClusterError::invalid_config(
                "cluster_id_suffix_len",
                "0",
                "Must be greater than 0",
            ));
        }
        if self.confidence_decimals > 6 {
            return Err(ClusterError::invalid_config(
                "confidence_decimals",
                self.confidence_decimals.to_string(),
                "Must be between 0 and 6",
            ));
        }
        if self.geo_loc_label.trim().is_empty() {
            return Err(ClusterError::MissingConfig {
                field: "geo_loc_label".to_string(),
            });
        }
        if self.type_namespace_separator.is_empty() {
            return Err(ClusterError::invalid_config(
                "type_namespace_separator",
                "",
                "Separator cannot be empty",
            ));
        }
        if let Some(prefix) = self
            .allowed_type_prefixes
            .iter()
            .find(|p| p.trim().is_empty())
        {
            return Err(ClusterError::invalid_config(
                "allowed_type_prefixes",
                prefix.clone(),
                "Prefixes cannot be blank",
            ));
        }
        Ok(())
    }
}

/// Builder for ClusterConfig with fluent API
#[derive(Debug, Clone, Default)]
pub struct ClusterConfigBuilder {
    strategy: Option<Strategy>,
    allowed_type_prefixes: Option<Vec<String>>,
    require_names: Option<bool>,
    geo_loc_types: Option<Vec<String>>,
    geo_loc_label: Option<String>,
    cluster_id_suffix_len: Option<usize>,
    confidence_decimals: Option<u32>,
    seed: Option<u64>,
}

impl ClusterConfigBuilder {
    /// Set linking strategy
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Set allowed top-level type prefixes
    pub fn allowed_type_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_type_prefixes = Some(prefixes.into_iter().map(Into::into).collect());
        self
    }

    /// Exclude rows without a names column
    pub fn require_names(mut self, require: bool) -> Self {
        self.require_names = Some(require);
        self
    }

    /// Set the types collapsed into the geo/location category
    pub fn geo_loc_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.geo_loc_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    /// Set the collapsed geo/location category name
    pub fn geo_loc_label(mut self, label: impl Into<String>) -> Self {
        self.geo_loc_label = Some(label.into());
        self
    }

    /// Set random suffix length of cluster ids
    pub fn cluster_id_suffix_len(mut self, len: usize) -> Self {
        self.cluster_id_suffix_len = Some(len);
        self
    }

    /// Set confidence rounding precision
    pub fn confidence_decimals(mut self, decimals: u32) -> Self {
        self.confidence_decimals = Some(decimals);
        self
    }

    /// Seed the cluster id generator
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build the config with validation
    pub fn build(self) -> Result<ClusterConfig, ClusterError> {
        let config = self.build_unchecked();
        config.validate()?;
        Ok(config)
    }

    /// Build without validation
    pub fn build_unchecked(self) -> ClusterConfig {
        let defaults = ClusterConfig::default();
        ClusterConfig {
            strategy: self.strategy.unwrap_or(defaults.strategy),
            allowed_type_prefixes: self
                .allowed_type_prefixes
                .unwrap_or(defaults.allowed_type_prefixes),
            require_names: self.require_names.unwrap_or(defaults.require_names),
            geo_loc_types: self.geo_loc_types.unwrap_or(defaults.geo_loc_types),
            geo_loc_label: self.geo_loc_label.unwrap_or(defaults.geo_loc_label),
            cluster_id_suffix_len: self
                .cluster_id_suffix_len
                .unwrap_or(defaults.cluster_id_suffix_len),
            confidence_decimals: self
                .confidence_decimals
                .unwrap_or(defaults.confidence_decimals),
            seed: self.seed.or(defaults.seed),
            ..defaults
        }
    }
}
