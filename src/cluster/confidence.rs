//! Member confidence, prototype election and cluster ids
//!
//! Runs once per cluster after construction and freezes it into a
//! [`ResolvedCluster`].

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use rand_chacha::ChaCha8Rng;
use serde::Serialize;

use super::arena::{Cluster, ClusterArena, ClusterOrigin};
use super::config::ClusterConfig;
use super::record::RecordStore;
use crate::utils::{id_rng, random_token, round_to};

/// Cluster after confidence and prototype generation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedCluster {
    full_id: String,
    prototype_id: String,
    members: Vec<String>,
    member_confidence: BTreeMap<String, f64>,
    entity_type: Option<String>,
    kb_id: Option<String>,
    kb_labels: Option<BTreeSet<String>>,
    wd_id: Option<String>,
    wd_labels: Option<BTreeSet<String>>,
    name_labels: Option<BTreeSet<String>>,
    origin: ClusterOrigin,
    synthetic: bool,
}

impl ResolvedCluster {
    pub fn full_id(&self) -> &str {
        &self.full_id
    }

    pub fn prototype_id(&self) -> &str {
        &self.prototype_id
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn member_confidence(&self) -> &BTreeMap<String, f64> {
        &self.member_confidence
    }

    pub fn confidence_of(&self, member: &str) -> Option<f64> {
        self.member_confidence.get(member).copied()
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

    pub fn origin(&self) -> ClusterOrigin {
        self.origin
    }

    /// Placeholder cluster of an excluded record
    pub fn is_synthetic(&self) -> bool {
        self.synthetic
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Computes confidence and prototypes, and issues unique cluster ids
pub struct ConfidenceEngine<'a> {
    store: &'a RecordStore,
    decimals: u32,
    infix: String,
    suffix_len: usize,
    rng: ChaCha8Rng,
    issued: HashSet<String>,
}

impl<'a> ConfidenceEngine<'a> {
    pub fn new(store: &'a RecordStore, config: &ClusterConfig) -> Self {
        Self {
            store,
            decimals: config.confidence_decimals,
            infix: config.cluster_id_infix.clone(),
            suffix_len: config.cluster_id_suffix_len,
            rng: id_rng(config.seed),
            issued: HashSet::new(),
        }
    }

    /// Confidence of each member, in member order.
    ///
    /// Each name is weighted by how many distinct members use it. A member
    /// scores the lowest normalized weight among its names that are not
    /// attractive labels of the cluster, or 1.0 if it has none.
    pub fn member_confidence(&self, cluster: &Cluster) -> Vec<(String, f64)> {
        if cluster.is_placeholder() {
            return cluster.members().iter().map(|m| (m.clone(), 1.0)).collect();
        }

        let mut users: HashMap<&str, HashSet<&str>> = HashMap::new();
        for member in cluster.members() {
            for name in self.names_of(member) {
                users.entry(name.as_str()).or_default().insert(member.as_str());
            }
        }
        let total: usize = users.values().map(HashSet::len).sum();
        let attractive = cluster.attractive_labels();

        cluster
            .members()
            .iter()
            .map(|member| {
                let mut score = 1.0_f64;
                for name in self.names_of(member) {
                    if attractive.contains(name.as_str()) {
                        continue;
                    }
                    let freq = users.get(name.as_str()).map_or(0, HashSet::len);
                    if total > 0 {
                        score = score.min(round_to(freq as f64 / total as f64, self.decimals));
                    }
                }
                (member.clone(), score)
            })
            .collect()
    }

    fn names_of(&self, member: &str) -> &'a [String] {
        self.store.get(member).map(|r| r.names()).unwrap_or(&[])
    }

    /// Freeze a cluster, electing its prototype and issuing its id
    pub fn resolve(&mut self, cluster: Cluster) -> ResolvedCluster {
        let confidence = self.member_confidence(&cluster);

        let mut prototype: Option<(&str, f64)> = None;
        for (member, score) in &confidence {
            if prototype.map_or(true, |(_, best)| *score > best) {
                prototype = Some((member.as_str(), *score));
            }
        }
        let prototype_id = prototype.map(|(m, _)| m.to_string()).unwrap_or_default();
        let full_id = self.issue_id(&prototype_id);

        ResolvedCluster {
            full_id,
            prototype_id,
            members: cluster.members().to_vec(),
            member_confidence: confidence.into_iter().collect(),
            entity_type: cluster.entity_type().map(str::to_string),
            kb_id: cluster.kb_id().map(str::to_string),
            kb_labels: cluster.kb_labels().cloned(),
            wd_id: cluster.wd_id().map(str::to_string),
            wd_labels: cluster.wd_labels().cloned(),
            name_labels: cluster.name_labels().cloned(),
            origin: cluster.origin(),
            synthetic: cluster.is_placeholder(),
        }
    }

    /// Resolve every cluster of the arena in discovery order
    pub fn resolve_all(&mut self, arena: ClusterArena) -> Vec<ResolvedCluster> {
        arena
            .into_clusters()
            .into_iter()
            .map(|c| self.resolve(c))
            .collect()
    }

    fn issue_id(&mut self, prototype_id: &str) -> String {
        loop {
            let suffix = random_token(&mut self.rng, self.suffix_len);
            let full_id = format!("{prototype_id}{}{suffix}", self.infix);
            if self.issued.insert(full_id.clone()) {
                return full_id;
            }
        }
    }
}
