// Core table structures for entclust

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Raw link candidate as delivered by the upstream linker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RawCandidate {
    /// External identifier (knowledge-base id or Wikidata QID)
    pub id: String,

    /// Linker score, comparable only within one row; `null` reads as NaN
    #[serde(default, deserialize_with = "null_as_nan")]
    pub score: f64,

    /// Labels and aliases known for this identifier
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Vec<String>,
}

impl RawCandidate {
    /// Create a candidate from borrowed parts
    pub fn new(id: &str, score: f64, labels: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            score,
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }
}

/// One row of the entity table
///
/// Columns the clustering engine does not understand are kept in `extra`
/// and written back unchanged on export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRow {
    #[serde(alias = "e")]
    pub id: String,

    /// Raw type tag; a `null` tag reads as empty and is excluded at ingest
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub entity_type: String,

    /// Surface forms; `None` means the column was missing or null upstream
    #[serde(default, alias = "name")]
    pub names: Option<Vec<String>>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub kb_candidates: Vec<RawCandidate>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub wikidata_candidates: Vec<RawCandidate>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EntityRow {
    /// Create a row with names and no candidates
    pub fn new(id: &str, entity_type: &str, names: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            entity_type: entity_type.to_string(),
            names: Some(names.iter().map(|n| n.to_string()).collect()),
            kb_candidates: Vec::new(),
            wikidata_candidates: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Add a knowledge-base candidate
    pub fn with_kb(mut self, id: &str, score: f64, labels: &[&str]) -> Self {
        self.kb_candidates.push(RawCandidate::new(id, score, labels));
        self
    }

    /// Add a Wikidata candidate
    pub fn with_wikidata(mut self, id: &str, score: f64, labels: &[&str]) -> Self {
        self.wikidata_candidates
            .push(RawCandidate::new(id, score, labels));
        self
    }

    /// Drop the names column entirely
    pub fn without_names(mut self) -> Self {
        self.names = None;
        self
    }

    /// Names as a slice, empty when the column is missing
    pub fn name_slice(&self) -> &[String] {
        self.names.as_deref().unwrap_or(&[])
    }
}

/// In-memory entity table, possibly concatenated from several sources
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityTable {
    pub rows: Vec<EntityRow>,
}

impl EntityTable {
    /// Create a table from rows
    pub fn new(rows: Vec<EntityRow>) -> Self {
        Self { rows }
    }

    /// Append all rows of another table
    pub fn extend(&mut self, other: EntityTable) {
        self.rows.extend(other.rows);
    }

    /// Concatenate per-source tables in order
    pub fn concat(tables: impl IntoIterator<Item = EntityTable>) -> Self {
        let mut table = Self::default();
        for t in tables {
            table.extend(t);
        }
        table
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<Vec<EntityRow>> for EntityTable {
    fn from(rows: Vec<EntityRow>) -> Self {
        Self::new(rows)
    }
}

/// Treat an explicit JSON `null` like a missing column
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_nan<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}
