//! Record model and candidate resolution
//!
//! A [`Record`] is built once from an [`EntityRow`] and never changes
//! afterwards. The selected KB and Wikidata links and the concatenated label
//! set are derived during construction, so every later stage reads the same
//! values.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::config::ClusterConfig;
use super::error::ClusterError;
use crate::models::{EntityRow, EntityTable, RawCandidate};

// ============================================================================
// Candidates
// ============================================================================

/// Link candidate with its label set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub score: f64,
    pub labels: BTreeSet<String>,
}

impl Candidate {
    /// Number of labels that also appear among `names`
    pub fn overlap(&self, names: &HashSet<&str>) -> usize {
        self.labels
            .iter()
            .filter(|l| names.contains(l.as_str()))
            .count()
    }
}

impl From<&RawCandidate> for Candidate {
    fn from(raw: &RawCandidate) -> Self {
        Self {
            id: raw.id.clone(),
            score: raw.score,
            labels: raw.labels.iter().cloned().collect(),
        }
    }
}

/// Pick the best candidate for a record.
///
/// The highest score wins. Among candidates sharing the exact highest score
/// the one whose labels overlap `names` most is taken, and the earliest one
/// in input order if the overlap is tied as well. NaN scores rank below
/// every real score.
pub fn select_candidate(names: &[String], candidates: &[Candidate]) -> Option<usize> {
    let rank = |c: &Candidate| {
        if c.score.is_nan() {
            f64::NEG_INFINITY
        } else {
            c.score
        }
    };

    let best = candidates
        .iter()
        .map(rank)
        .fold(None, |acc: Option<f64>, s| match acc {
            Some(a) if a >= s => Some(a),
            _ => Some(s),
        })?;

    let tied: Vec<usize> = candidates
        .iter()
        .enumerate()
        .filter(|(_, c)| rank(c) == best)
        .map(|(i, _)| i)
        .collect();

    if tied.len() == 1 {
        return Some(tied[0]);
    }

    let name_set: HashSet<&str> = names.iter().map(String::as_str).collect();
    let mut selected = tied[0];
    let mut max_overlap = 0;
    for &idx in &tied {
        let overlap = candidates[idx].overlap(&name_set);
        if overlap > max_overlap {
            max_overlap = overlap;
            selected = idx;
        }
    }
    Some(selected)
}

// ============================================================================
// Type normalization
// ============================================================================

/// Maps raw ontology type tags onto the coarse types used for clustering
#[derive(Debug, Clone)]
pub struct TypeNormalizer {
    separator: String,
    geo_loc_types: HashSet<String>,
    geo_loc_label: String,
}

impl TypeNormalizer {
    pub fn new(config: &ClusterConfig) -> Self {
        Self {
            separator: config.type_namespace_separator.clone(),
            geo_loc_types: config.geo_loc_types.iter().cloned().collect(),
            geo_loc_label: config.geo_loc_label.clone(),
        }
    }

    /// Top-level segment with the namespace removed
    ///
    /// `ldcOnt:GPE.Country.Country` becomes `GPE`.
    pub fn top_level<'t>(&self, raw: &'t str) -> &'t str {
        let head = raw.split('.').next().unwrap_or(raw);
        match head.rsplit_once(self.separator.as_str()) {
            Some((_, local)) => local,
            None => head,
        }
    }

    /// Normalized type; geopolitical and location types collapse into one
    pub fn normalize(&self, raw: &str) -> String {
        let top = self.top_level(raw);
        if self.geo_loc_types.contains(top) {
            self.geo_loc_label.clone()
        } else {
            top.to_string()
        }
    }
}

// ============================================================================
// Record
// ============================================================================

/// Immutable entity mention with derived link selections
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    id: String,
    entity_type: String,
    normalized_type: String,
    names: Vec<String>,
    kb_candidates: Vec<Candidate>,
    wikidata_candidates: Vec<Candidate>,
    selected_kb: Option<usize>,
    selected_wikidata: Option<usize>,
    concatenated_labels: BTreeSet<String>,
}

impl Record {
    pub fn new(
        id: impl Into<String>,
        entity_type: impl Into<String>,
        names: Vec<String>,
        kb_candidates: Vec<Candidate>,
        wikidata_candidates: Vec<Candidate>,
        normalizer: &TypeNormalizer,
    ) -> Self {
        let entity_type = entity_type.into();
        let normalized_type = normalizer.normalize(&entity_type);
        let selected_kb = select_candidate(&names, &kb_candidates);
        let selected_wikidata = select_candidate(&names, &wikidata_candidates);

        let mut concatenated_labels: BTreeSet<String> = names.iter().cloned().collect();
        if let Some(idx) = selected_kb {
            concatenated_labels.extend(kb_candidates[idx].labels.iter().cloned());
        }
        if let Some(idx) = selected_wikidata {
            concatenated_labels.extend(wikidata_candidates[idx].labels.iter().cloned());
        }

        Self {
            id: id.into(),
            entity_type,
            normalized_type,
            names,
            kb_candidates,
            wikidata_candidates,
            selected_kb,
            selected_wikidata,
            concatenated_labels,
        }
    }

    pub fn from_row(row: &EntityRow, normalizer: &TypeNormalizer) -> Self {
        Self::new(
            row.id.clone(),
            row.entity_type.clone(),
            row.name_slice().to_vec(),
            row.kb_candidates.iter().map(Candidate::from).collect(),
            row.wikidata_candidates.iter().map(Candidate::from).collect(),
            normalizer,
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Raw type tag as delivered upstream
    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn normalized_type(&self) -> &str {
        &self.normalized_type
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn kb_candidates(&self) -> &[Candidate] {
        &self.kb_candidates
    }

    pub fn wikidata_candidates(&self) -> &[Candidate] {
        &self.wikidata_candidates
    }

    pub fn selected_kb_index(&self) -> Option<usize> {
        self.selected_kb
    }

    pub fn selected_wikidata_index(&self) -> Option<usize> {
        self.selected_wikidata
    }

    pub fn selected_kb(&self) -> Option<&Candidate> {
        self.selected_kb.map(|i| &self.kb_candidates[i])
    }

    pub fn selected_wikidata(&self) -> Option<&Candidate> {
        self.selected_wikidata.map(|i| &self.wikidata_candidates[i])
    }

    pub fn selected_kb_id(&self) -> Option<&str> {
        self.selected_kb().map(|c| c.id.as_str())
    }

    pub fn selected_wikidata_id(&self) -> Option<&str> {
        self.selected_wikidata().map(|c| c.id.as_str())
    }

    pub fn has_kb_link(&self) -> bool {
        self.selected_kb.is_some()
    }

    pub fn concatenated_labels(&self) -> &BTreeSet<String> {
        &self.concatenated_labels
    }

    /// Every Wikidata candidate id in input order, without repeats
    pub fn linked_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.wikidata_candidates
            .iter()
            .map(|c| c.id.as_str())
            .filter(|id| seen.insert(*id))
            .collect()
    }
}

// ============================================================================
// Record store
// ============================================================================

/// Why a row was kept out of clustering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionReason {
    TypeNotAllowed,
    MissingNames,
}

impl ExclusionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeNotAllowed => "type_not_allowed",
            Self::MissingNames => "missing_names",
        }
    }
}

impl std::fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row filtered out before clustering; it still receives a placeholder cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedRecord {
    pub id: String,
    pub entity_type: String,
    pub normalized_type: String,
    pub reason: ExclusionReason,
}

/// Read-only set of records, addressed by id
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<Record>,
    index: HashMap<String, usize>,
}

/// Outcome of turning an entity table into a record store
#[derive(Debug, Clone, Default)]
pub struct Ingestion {
    pub store: RecordStore,
    pub excluded: Vec<ExcludedRecord>,
    /// Rows skipped because their id was already seen
    pub duplicate_rows: usize,
}

impl RecordStore {
    /// Build the store from a table, applying the type and name filters
    pub fn ingest(table: &EntityTable, config: &ClusterConfig) -> Ingestion {
        let normalizer = TypeNormalizer::new(config);
        let mut ingestion = Ingestion::default();
        let mut seen: HashSet<&str> = HashSet::with_capacity(table.len());

        for row in &table.rows {
            if !seen.insert(row.id.as_str()) {
                let err = ClusterError::duplicate_record_id(&row.id);
                warn!(entity = %row.id, error = %err, "Duplicate entity id, keeping first row");
                ingestion.duplicate_rows += 1;
                continue;
            }

            if let Some(reason) = exclusion_reason(row, config, &normalizer) {
                debug!(entity = %row.id, entity_type = %row.entity_type, ?reason, "Entity excluded");
                ingestion.excluded.push(ExcludedRecord {
                    id: row.id.clone(),
                    entity_type: row.entity_type.clone(),
                    normalized_type: normalizer.normalize(&row.entity_type),
                    reason,
                });
                continue;
            }

            ingestion.store.push(Record::from_row(row, &normalizer));
        }

        ingestion
    }

    /// Store holding the given records in order; later duplicates are ignored
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Self {
        let mut store = Self::default();
        for record in records {
            if !store.contains(record.id()) {
                store.push(record);
            }
        }
        store
    }

    fn push(&mut self, record: Record) {
        self.index.insert(record.id.clone(), self.records.len());
        self.records.push(record);
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.index.get(id).map(|&i| &self.records[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn by_index(&self, idx: usize) -> &Record {
        &self.records[idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn exclusion_reason(
    row: &EntityRow,
    config: &ClusterConfig,
    normalizer: &TypeNormalizer,
) -> Option<ExclusionReason> {
    if !config.allowed_type_prefixes.is_empty() {
        let top = normalizer.top_level(&row.entity_type);
        let allowed = config
            .allowed_type_prefixes
            .iter()
            .any(|prefix| top.starts_with(prefix.as_str()));
        if !allowed {
            return Some(ExclusionReason::TypeNotAllowed);
        }
    }
    if config.require_names && row.names.is_none() {
        return Some(ExclusionReason::MissingNames);
    }
    None
}
