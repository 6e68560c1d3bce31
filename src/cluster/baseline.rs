//! Baseline clustering: KB blocks joined through shared Wikidata candidates
//!
//! Every KB block links the Wikidata candidate ids of its members. Blocks
//! that link a common id end up in the same group. Records without a KB
//! link but with candidate ids join the first group that links one of their
//! ids (or is keyed by one), otherwise they open a group keyed by their
//! first candidate. Records with neither are left for residual assignment.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::{debug, info};

use super::arena::{Cluster, ClusterHandle, ClusterOrigin};
use super::blocking::{Block, Blocks};
use super::builder::ClusterBuilder;
use super::union_find::DisjointSet;

impl ClusterBuilder<'_> {
    /// Seed clusters with the baseline strategy
    pub fn seed_baseline(&mut self, kb_blocks: &Blocks) {
        let store = self.store;
        let blocks: Vec<&Block> = kb_blocks.iter().collect();

        let mut sets = DisjointSet::new(blocks.len());
        let mut first_block: HashMap<&str, usize> = HashMap::new();
        for (b, block) in blocks.iter().enumerate() {
            for &pos in &block.members {
                for id in store.by_index(pos).linked_ids() {
                    match first_block.entry(id) {
                        Entry::Occupied(e) => {
                            if sets.union(*e.get(), b) {
                                self.report.baseline_merges += 1;
                                debug!(linked_id = %id, block = %block.key, "Merged KB blocks");
                            }
                        }
                        Entry::Vacant(e) => {
                            e.insert(b);
                        }
                    }
                }
            }
        }

        let mut group_by_linked: HashMap<String, ClusterHandle> = HashMap::new();
        let mut group_by_key: HashMap<String, ClusterHandle> = HashMap::new();

        for group in sets.groups() {
            let lead = blocks[group[0]];
            let mut cluster = Cluster::new(ClusterOrigin::Baseline);
            for &b in &group {
                for &pos in &blocks[b].members {
                    let record = store.by_index(pos);
                    if let Some(kb) = record.selected_kb() {
                        cluster.offer_kb(&kb.id, &kb.labels);
                    }
                    if let Some(wd) = record.selected_wikidata() {
                        cluster.record_wikidata_candidate(&wd.id, &wd.labels);
                    }
                }
            }
            cluster.elect_wd_id();

            let handle = self.arena.insert(cluster);
            group_by_key.insert(lead.key.clone(), handle);
            for &b in &group {
                for &pos in &blocks[b].members {
                    let record = store.by_index(pos);
                    self.place(handle, record.id());
                    for id in record.linked_ids() {
                        group_by_linked.entry(id.to_string()).or_insert(handle);
                    }
                }
            }
            self.report.baseline_clusters += 1;
        }

        for &pos in kb_blocks.unlinked() {
            let record = store.by_index(pos);
            let linked = record.linked_ids();
            let Some(&first_id) = linked.first() else {
                continue;
            };

            let target = linked
                .iter()
                .flat_map(|id| [group_by_linked.get(*id), group_by_key.get(*id)])
                .flatten()
                .min()
                .copied();

            match target {
                Some(handle) => {
                    debug!(entity = %record.id(), cluster = %handle, "Unlinked record joined group");
                    self.place(handle, record.id());
                }
                None => {
                    let mut cluster = Cluster::new(ClusterOrigin::Baseline);
                    if let Some(wd) = record
                        .wikidata_candidates()
                        .iter()
                        .find(|c| c.id == first_id)
                    {
                        cluster.set_wd_if_absent(&wd.id, &wd.labels);
                    }
                    let handle = self.arena.insert(cluster);
                    self.place(handle, record.id());
                    group_by_key.entry(first_id.to_string()).or_insert(handle);
                    for id in linked {
                        group_by_linked.entry(id.to_string()).or_insert(handle);
                    }
                    self.report.baseline_clusters += 1;
                }
            }
        }

        info!(
            clusters = self.report.baseline_clusters,
            merges = self.report.baseline_merges,
            "Baseline groups built"
        );
    }
}
