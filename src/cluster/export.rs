//! Export of cluster assignments back onto the entity table

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::arena::ClusterOrigin;
use super::confidence::ResolvedCluster;
use crate::models::{EntityRow, EntityTable};

/// Columns written by the exporter; stale copies in `extra` are dropped
const RESERVED_COLUMNS: [&str; 3] = ["cluster", "cluster_member_confidence", "synthetic"];

/// Entity row annotated with its cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusteredRow {
    #[serde(flatten)]
    pub row: EntityRow,

    /// Ids of the clusters containing this entity
    pub cluster: Vec<String>,

    /// Confidence in each of those clusters, same order
    pub cluster_member_confidence: Vec<f64>,

    /// True for prototype rows
    pub synthetic: bool,
}

impl ClusteredRow {
    fn new(mut row: EntityRow, cluster: Vec<String>, confidence: Vec<f64>, synthetic: bool) -> Self {
        for column in RESERVED_COLUMNS {
            row.extra.remove(column);
        }
        Self {
            row,
            cluster,
            cluster_member_confidence: confidence,
            synthetic,
        }
    }
}

/// Per-cluster debug record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterTrace {
    pub wd_id: Option<String>,
    pub kb_id: Option<String>,
    pub wd_labels: Option<Vec<String>>,
    pub kb_labels: Option<Vec<String>>,
    pub name_labels: Option<Vec<String>>,
    pub full_id: String,
    pub prototype: String,
    pub all_records: Vec<String>,
    pub member_confidence: BTreeMap<String, f64>,
    #[serde(rename = "type")]
    pub entity_type: Option<String>,
    pub origin: ClusterOrigin,
    pub synthetic: bool,
}

impl From<&ResolvedCluster> for ClusterTrace {
    fn from(c: &ResolvedCluster) -> Self {
        let labels = |set: Option<&BTreeSet<String>>| {
            set.filter(|s| !s.is_empty())
                .map(|s| s.iter().cloned().collect::<Vec<_>>())
        };
        Self {
            wd_id: c.wd_id().map(str::to_string),
            kb_id: c.kb_id().map(str::to_string),
            wd_labels: labels(c.wd_labels()),
            kb_labels: labels(c.kb_labels()),
            name_labels: labels(c.name_labels()),
            full_id: c.full_id().to_string(),
            prototype: c.prototype_id().to_string(),
            all_records: c.members().to_vec(),
            member_confidence: c.member_confidence().clone(),
            entity_type: c.entity_type().map(str::to_string),
            origin: c.origin(),
            synthetic: c.is_synthetic(),
        }
    }
}

/// Final table plus debug trace
#[derive(Debug, Clone, Default)]
pub struct ExportTable {
    pub rows: Vec<ClusteredRow>,
    pub trace: Vec<ClusterTrace>,
}

impl ExportTable {
    /// Rows copied from the input table
    pub fn member_rows(&self) -> impl Iterator<Item = &ClusteredRow> {
        self.rows.iter().filter(|r| !r.synthetic)
    }

    /// One row per cluster representing its prototype
    pub fn prototype_rows(&self) -> impl Iterator<Item = &ClusteredRow> {
        self.rows.iter().filter(|r| r.synthetic)
    }
}

/// Merge cluster assignments onto `table`.
///
/// Every input row is emitted once, in table order, with `synthetic=false`.
/// Rows sharing an id receive the same annotation. After them comes one
/// `synthetic=true` copy of each cluster's prototype row.
pub fn export(table: &EntityTable, clusters: &[ResolvedCluster]) -> ExportTable {
    let mut cluster_of: HashMap<&str, Vec<&ResolvedCluster>> = HashMap::new();
    for cluster in clusters {
        for member in cluster.members() {
            cluster_of.entry(member.as_str()).or_default().push(cluster);
        }
    }

    let mut first_row: HashMap<&str, &EntityRow> = HashMap::new();
    let mut rows = Vec::with_capacity(table.len() + clusters.len());

    for row in &table.rows {
        first_row.entry(row.id.as_str()).or_insert(row);
        let owners = cluster_of.get(row.id.as_str()).map(Vec::as_slice).unwrap_or(&[]);
        if owners.is_empty() {
            warn!(entity = %row.id, "Entity has no cluster");
        }
        let ids = owners.iter().map(|c| c.full_id().to_string()).collect();
        let confidence = owners
            .iter()
            .filter_map(|c| c.confidence_of(&row.id))
            .collect();
        rows.push(ClusteredRow::new(row.clone(), ids, confidence, false));
    }

    for cluster in clusters {
        let Some(row) = first_row.get(cluster.prototype_id()) else {
            warn!(cluster = %cluster.full_id(), prototype = %cluster.prototype_id(), "Prototype row not found");
            continue;
        };
        let mut prototype = (*row).clone();
        prototype.id = cluster.prototype_id().to_string();
        let confidence = cluster.confidence_of(cluster.prototype_id()).into_iter().collect();
        rows.push(ClusteredRow::new(
            prototype,
            vec![cluster.full_id().to_string()],
            confidence,
            true,
        ));
    }

    ExportTable {
        rows,
        trace: clusters.iter().map(ClusterTrace::from).collect(),
    }
}
