//! Cluster construction
//!
//! The builder owns the [`ClusterArena`] while clusters are mutable. Stages
//! run in a fixed order:
//!
//! 1. seed clusters from KB blocks (or the baseline union-find groups)
//! 2. reconcile Wikidata-only blocks
//! 3. split every cluster by normalized type
//! 4. assign residual records
//! 5. add placeholder clusters for excluded records
//! 6. verify that the clusters partition the record set
//!
//! Membership conflicts are logged and counted, never repaired.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::arena::{Cluster, ClusterArena, ClusterHandle, ClusterOrigin};
use super::blocking::Blocks;
use super::record::{ExcludedRecord, RecordStore};
use crate::error::EntclustErrorTrait;

/// Counters collected while building clusters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildReport {
    /// Clusters seeded from KB blocks
    pub kb_clusters: usize,

    /// Wikidata-only buckets absorbed by a KB cluster
    pub absorbed_buckets: usize,

    /// Records added to KB clusters through absorption
    pub absorbed_records: usize,

    /// Clusters created from leftover Wikidata-only buckets
    pub wikidata_only_clusters: usize,

    /// Union-find groups built by the baseline strategy
    pub baseline_clusters: usize,

    /// KB blocks merged into another block's group
    pub baseline_merges: usize,

    /// Extra clusters produced by the type split
    pub type_splits: usize,

    /// Residual records joined to an existing cluster
    pub residual_merged: usize,

    /// Residual records that opened their own cluster
    pub residual_singletons: usize,

    /// Placeholder clusters for excluded records
    pub placeholders: usize,

    /// Membership conflicts and partition defects
    pub integrity_violations: usize,
}

/// Builds clusters over a read-only record store
pub struct ClusterBuilder<'a> {
    pub(super) store: &'a RecordStore,
    pub(super) arena: ClusterArena,
    pub(super) report: BuildReport,
}

impl<'a> ClusterBuilder<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self {
            store,
            arena: ClusterArena::new(),
            report: BuildReport::default(),
        }
    }

    pub fn arena(&self) -> &ClusterArena {
        &self.arena
    }

    pub fn report(&self) -> &BuildReport {
        &self.report
    }

    /// Add `record` to `handle`, logging a refused second owner
    pub(super) fn place(&mut self, handle: ClusterHandle, record: &str) {
        if let Err(e) = self.arena.assign(handle, record) {
            self.report.integrity_violations += 1;
            error!(entity = %record, error = %e, category = e.category().as_str(), "Entity in multiple clusters detected");
        }
    }

    /// One cluster per KB block, followed by Wikidata election
    pub fn seed_from_kb_blocks(&mut self, kb_blocks: &Blocks) {
        let store = self.store;
        for block in kb_blocks.iter() {
            let mut cluster = Cluster::new(ClusterOrigin::KnowledgeBase);
            for &pos in &block.members {
                let record = store.by_index(pos);
                if let Some(kb) = record.selected_kb() {
                    cluster.offer_kb(&kb.id, &kb.labels);
                }
                if let Some(wd) = record.selected_wikidata() {
                    cluster.record_wikidata_candidate(&wd.id, &wd.labels);
                }
            }
            cluster.elect_wd_id();
            debug!(
                kb_id = %block.key,
                wd_id = ?cluster.wd_id(),
                members = block.members.len(),
                "Seeded KB cluster"
            );

            let handle = self.arena.insert(cluster);
            for &pos in &block.members {
                self.place(handle, store.by_index(pos).id());
            }
            self.report.kb_clusters += 1;
        }
        info!(clusters = self.report.kb_clusters, "KB clusters seeded");
    }

    /// Absorb Wikidata-only buckets into KB clusters or turn them into clusters
    pub fn reconcile_wikidata_blocks(&mut self, wd_blocks: &Blocks) {
        let store = self.store;

        let mut buckets: Vec<(&str, Vec<usize>)> = Vec::new();
        for block in wd_blocks.iter() {
            let members: Vec<usize> = block
                .members
                .iter()
                .copied()
                .filter(|&pos| !store.by_index(pos).has_kb_link())
                .collect();
            if !members.is_empty() {
                buckets.push((block.key.as_str(), members));
            }
        }
        let bucket_of: HashMap<&str, usize> = buckets
            .iter()
            .enumerate()
            .map(|(i, (key, _))| (*key, i))
            .collect();
        let mut consumed = vec![false; buckets.len()];

        let elected: Vec<(ClusterHandle, String)> = self
            .arena
            .iter()
            .filter_map(|(h, c)| c.wd_id().map(|wd| (h, wd.to_string())))
            .collect();
        for (handle, wd_id) in elected {
            let Some(&b) = bucket_of.get(wd_id.as_str()) else {
                continue;
            };
            if consumed[b] {
                continue;
            }
            consumed[b] = true;
            for &pos in &buckets[b].1 {
                self.place(handle, store.by_index(pos).id());
            }
            self.report.absorbed_buckets += 1;
            self.report.absorbed_records += buckets[b].1.len();
            debug!(cluster = %handle, wd_id = %wd_id, records = buckets[b].1.len(), "Absorbed Wikidata-only bucket");
        }

        for (b, (key, members)) in buckets.iter().enumerate() {
            if consumed[b] {
                continue;
            }
            let mut cluster = Cluster::new(ClusterOrigin::WikidataOnly);
            if let Some(wd) = store.by_index(members[0]).selected_wikidata() {
                cluster.set_wd_if_absent(&wd.id, &wd.labels);
            }
            let handle = self.arena.insert(cluster);
            for &pos in members {
                self.place(handle, store.by_index(pos).id());
            }
            self.report.wikidata_only_clusters += 1;
            debug!(wd_id = %key, members = members.len(), "Created Wikidata-only cluster");
        }

        info!(
            absorbed = self.report.absorbed_buckets,
            created = self.report.wikidata_only_clusters,
            "Wikidata-only blocks reconciled"
        );
    }

    /// Replace every cluster by one cluster per normalized member type
    pub fn split_by_type(&mut self) {
        let store = self.store;
        let clusters = std::mem::take(&mut self.arena).into_clusters();

        for cluster in clusters {
            let mut by_type: Vec<(&str, ClusterHandle)> = Vec::new();
            for member in cluster.members() {
                let Some(record) = store.get(member) else {
                    error!(entity = %member, "Cluster member missing from record store");
                    self.report.integrity_violations += 1;
                    continue;
                };
                let entity_type = record.normalized_type();
                let handle = match by_type.iter().find(|(t, _)| *t == entity_type) {
                    Some(&(_, h)) => h,
                    None => {
                        let h = self.arena.insert(cluster.split_child(entity_type));
                        by_type.push((entity_type, h));
                        h
                    }
                };
                self.place(handle, member);
            }
            if by_type.len() > 1 {
                self.report.type_splits += by_type.len() - 1;
                debug!(
                    kb_id = ?cluster.kb_id(),
                    wd_id = ?cluster.wd_id(),
                    types = by_type.len(),
                    "Split mixed-type cluster"
                );
            }
        }

        info!(
            clusters = self.arena.len(),
            splits = self.report.type_splits,
            "Clusters split by type"
        );
    }

    /// Place every unassigned record into its most similar cluster of the
    /// same type, or into a new singleton.
    pub fn assign_residuals(&mut self) {
        let store = self.store;

        let mut by_type: HashMap<String, Vec<ClusterHandle>> = HashMap::new();
        for (handle, cluster) in self.arena.iter() {
            if let Some(t) = cluster.entity_type() {
                by_type.entry(t.to_string()).or_default().push(handle);
            }
        }

        for record in store.iter() {
            if self.arena.is_assigned(record.id()) {
                continue;
            }
            let entity_type = record.normalized_type();

            let mut best: Option<(ClusterHandle, usize)> = None;
            for &handle in by_type.get(entity_type).into_iter().flatten() {
                let Some(cluster) = self.arena.get(handle) else {
                    continue;
                };
                let sim = cluster.similarity(record.names());
                if sim > best.map_or(0, |(_, s)| s) {
                    best = Some((handle, sim));
                }
            }

            match best {
                Some((handle, sim)) => {
                    debug!(entity = %record.id(), cluster = %handle, similarity = sim, "Residual joined cluster");
                    self.place(handle, record.id());
                    self.report.residual_merged += 1;
                }
                None => {
                    let cluster = Cluster::new(ClusterOrigin::Residual)
                        .with_type(entity_type)
                        .with_name_labels(record.names().iter().cloned());
                    let handle = self.arena.insert(cluster);
                    self.place(handle, record.id());
                    by_type
                        .entry(entity_type.to_string())
                        .or_default()
                        .push(handle);
                    self.report.residual_singletons += 1;
                }
            }
        }

        info!(
            merged = self.report.residual_merged,
            singletons = self.report.residual_singletons,
            "Residual records assigned"
        );
    }

    /// One isolated cluster per excluded record
    pub fn add_placeholders(&mut self, excluded: &[ExcludedRecord]) {
        for record in excluded {
            let cluster =
                Cluster::new(ClusterOrigin::Placeholder).with_type(record.normalized_type.as_str());
            let handle = self.arena.insert(cluster);
            self.place(handle, &record.id);
            self.report.placeholders += 1;
        }
        if !excluded.is_empty() {
            info!(placeholders = excluded.len(), "Placeholder clusters added");
        }
    }

    /// Check that stored and excluded records are partitioned by the clusters
    pub fn verify(&mut self, excluded: &[ExcludedRecord]) -> usize {
        let expected = self
            .store
            .iter()
            .map(|r| r.id())
            .chain(excluded.iter().map(|r| r.id.as_str()));
        let errors = self.arena.verify_partition(expected);
        for e in &errors {
            error!(
                error = %e,
                kind = e.description(),
                category = e.category().as_str(),
                "Cluster partition violated"
            );
        }
        self.report.integrity_violations += errors.len();
        errors.len()
    }

    pub fn finish(self) -> (ClusterArena, BuildReport) {
        (self.arena, self.report)
    }
}
