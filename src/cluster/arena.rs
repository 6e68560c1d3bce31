//! Cluster arena
//!
//! Clusters are owned by a [`ClusterArena`] and addressed by [`ClusterHandle`].
//! The arena keeps a record id to handle table that is updated on every
//! membership change and refuses to give a record a second owner.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{ClusterError, ClusterResult};

/// Index of a cluster inside its arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterHandle(pub(crate) usize);

impl ClusterHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ClusterHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which construction step created a cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterOrigin {
    /// Seeded from a KB block
    KnowledgeBase,
    /// Built from a Wikidata-only block
    WikidataOnly,
    /// Singleton opened during residual assignment
    Residual,
    /// Excluded record without a record store
    Placeholder,
    /// Union-find group of the baseline strategy
    Baseline,
}

impl ClusterOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KnowledgeBase => "knowledge_base",
            Self::WikidataOnly => "wikidata_only",
            Self::Residual => "residual",
            Self::Placeholder => "placeholder",
            Self::Baseline => "baseline",
        }
    }
}

/// Mutable cluster under construction
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    members: Vec<String>,
    entity_type: Option<String>,
    kb_id: Option<String>,
    kb_labels: Option<BTreeSet<String>>,
    wikidata_candidates_seen: Vec<(String, BTreeSet<String>)>,
    wd_id: Option<String>,
    wd_labels: Option<BTreeSet<String>>,
    name_labels: Option<BTreeSet<String>>,
    origin: ClusterOrigin,
}

impl Cluster {
    pub fn new(origin: ClusterOrigin) -> Self {
        Self {
            members: Vec::new(),
            entity_type: None,
            kb_id: None,
            kb_labels: None,
            wikidata_candidates_seen: Vec::new(),
            wd_id: None,
            wd_labels: None,
            name_labels: None,
            origin,
        }
    }

    /// Empty cluster of one type carrying this cluster's KB and Wikidata links
    pub fn split_child(&self, entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: Some(entity_type.into()),
            kb_id: self.kb_id.clone(),
            kb_labels: self.kb_labels.clone(),
            wd_id: self.wd_id.clone(),
            wd_labels: self.wd_labels.clone(),
            ..Self::new(self.origin)
        }
    }

    pub fn with_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    pub fn with_name_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.name_labels = Some(labels.into_iter().map(Into::into).collect());
        self
    }

    /// Offer a member's selected KB link.
    ///
    /// The first link with a non-empty label set wins. Until one is offered,
    /// the first KB id seen is kept with its empty labels.
    pub fn offer_kb(&mut self, id: &str, labels: &BTreeSet<String>) {
        let unlabelled = self.kb_labels.as_ref().map_or(true, BTreeSet::is_empty);
        if self.kb_id.is_none() || (unlabelled && !labels.is_empty()) {
            self.kb_id = Some(id.to_string());
            self.kb_labels = Some(labels.clone());
        }
    }

    /// Set the Wikidata link unless one is already present
    pub fn set_wd_if_absent(&mut self, id: &str, labels: &BTreeSet<String>) {
        if self.wd_id.is_none() {
            self.wd_id = Some(id.to_string());
            self.wd_labels = Some(labels.clone());
        }
    }

    /// Remember a member's selected Wikidata link for election.
    /// A repeated id keeps the labels of its first member.
    pub fn record_wikidata_candidate(&mut self, id: &str, labels: &BTreeSet<String>) {
        if !self.wikidata_candidates_seen.iter().any(|(seen, _)| seen == id) {
            self.wikidata_candidates_seen
                .push((id.to_string(), labels.clone()));
        }
    }

    /// Elect `wd_id` from the Wikidata candidates seen so far.
    ///
    /// Picks the candidate whose labels overlap the KB labels most; the
    /// first seen wins ties, including when nothing overlaps or the KB
    /// labels are empty. Skipped when there is no KB link or no candidate.
    pub fn elect_wd_id(&mut self) -> Option<&str> {
        self.kb_id.as_ref()?;
        let empty = BTreeSet::new();
        let kb_labels = self.kb_labels.as_ref().unwrap_or(&empty);
        let mut elected: Option<usize> = None;
        let mut max_overlap = 0;
        for (idx, (_, labels)) in self.wikidata_candidates_seen.iter().enumerate() {
            let overlap = labels.intersection(kb_labels).count();
            if elected.is_none() || overlap > max_overlap {
                elected = Some(idx);
                max_overlap = overlap;
            }
        }

        let (id, labels) = &self.wikidata_candidates_seen[elected?];
        self.wd_id = Some(id.clone());
        self.wd_labels = Some(labels.clone());
        self.wd_id.as_deref()
    }

    /// Union of KB, Wikidata and name labels
    pub fn attractive_labels(&self) -> BTreeSet<&str> {
        [&self.kb_labels, &self.wd_labels, &self.name_labels]
            .into_iter()
            .flatten()
            .flat_map(|set| set.iter().map(String::as_str))
            .collect()
    }

    /// Number of distinct names that are attractive labels of this cluster
    pub fn similarity(&self, names: &[String]) -> usize {
        let attractive = self.attractive_labels();
        let distinct: HashSet<&str> = names.iter().map(String::as_str).collect();
        distinct.iter().filter(|n| attractive.contains(*n)).count()
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn entity_type(&self) -> Option<&str> {
        self.entity_type.as_deref()
    }

    pub fn kb_id(&self) -> Option<&str> {
        self.kb_id.as_deref()
    }

    pub fn kb_labels(&self) -> Option<&BTreeSet<String>> {
        self.kb_labels.as_ref()
    }

    pub fn wd_id(&self) -> Option<&str> {
        self.wd_id.as_deref()
    }

    pub fn wd_labels(&self) -> Option<&BTreeSet<String>> {
        self.wd_labels.as_ref()
    }

    pub fn name_labels(&self) -> Option<&BTreeSet<String>> {
        self.name_labels.as_ref()
    }

    pub fn wikidata_candidates_seen(&self) -> &[(String, BTreeSet<String>)] {
        &self.wikidata_candidates_seen
    }

    pub fn origin(&self) -> ClusterOrigin {
        self.origin
    }

    pub fn is_placeholder(&self) -> bool {
        self.origin == ClusterOrigin::Placeholder
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Owner of all clusters during construction
#[derive(Debug, Clone, Default)]
pub struct ClusterArena {
    slots: Vec<Cluster>,
    owner: HashMap<String, ClusterHandle>,
}

impl ClusterArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move an empty cluster into the arena
    pub fn insert(&mut self, cluster: Cluster) -> ClusterHandle {
        debug_assert!(cluster.is_empty(), "clusters enter the arena empty");
        let handle = ClusterHandle(self.slots.len());
        self.slots.push(cluster);
        handle
    }

    /// Make `record` a member of `handle`.
    ///
    /// Assigning a record to the cluster that already owns it is a no-op.
    /// A record owned by another cluster is refused.
    pub fn assign(&mut self, handle: ClusterHandle, record: &str) -> ClusterResult<()> {
        if handle.0 >= self.slots.len() {
            return Err(ClusterError::UnknownCluster { handle: handle.0 });
        }
        match self.owner.get(record) {
            Some(&existing) if existing == handle => Ok(()),
            Some(&existing) => Err(ClusterError::duplicate_membership(
                record,
                existing.0,
                handle.0,
            )),
            None => {
                self.owner.insert(record.to_string(), handle);
                self.slots[handle.0].members.push(record.to_string());
                Ok(())
            }
        }
    }

    pub fn get(&self, handle: ClusterHandle) -> Option<&Cluster> {
        self.slots.get(handle.0)
    }

    pub fn get_mut(&mut self, handle: ClusterHandle) -> Option<&mut Cluster> {
        self.slots.get_mut(handle.0)
    }

    pub fn owner_of(&self, record: &str) -> Option<ClusterHandle> {
        self.owner.get(record).copied()
    }

    pub fn is_assigned(&self, record: &str) -> bool {
        self.owner.contains_key(record)
    }

    /// Clusters in discovery order
    pub fn iter(&self) -> impl Iterator<Item = (ClusterHandle, &Cluster)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, c)| (ClusterHandle(i), c))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of records with an owner
    pub fn assigned_count(&self) -> usize {
        self.owner.len()
    }

    /// Check that members partition exactly the `expected` record ids
    pub fn verify_partition<'a>(&self, expected: impl IntoIterator<Item = &'a str>) -> Vec<ClusterError> {
        let mut errors = Vec::new();
        let expected: HashSet<&str> = expected.into_iter().collect();

        for id in &expected {
            if !self.owner.contains_key(*id) {
                errors.push(ClusterError::UnassignedRecord {
                    record: id.to_string(),
                });
            }
        }

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (handle, cluster) in self.iter() {
            if cluster.is_empty() {
                errors.push(ClusterError::EmptyCluster { handle: handle.0 });
            }
            for member in &cluster.members {
                if !expected.contains(member.as_str()) {
                    errors.push(ClusterError::UnknownRecord {
                        record: member.clone(),
                    });
                }
                if let Some(first) = seen.insert(member.as_str(), handle.0) {
                    errors.push(ClusterError::duplicate_membership(
                        member.as_str(),
                        first,
                        handle.0,
                    ));
                }
            }
        }

        errors
    }

    /// Release the clusters in discovery order
    pub fn into_clusters(self) -> Vec<Cluster> {
        self.slots
    }
}
