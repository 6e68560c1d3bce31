//! Key-based blocking of records

use std::collections::HashMap;

use super::record::{Record, RecordStore};

/// One non-empty bucket of records sharing a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub key: String,
    /// Record positions in the store, in input order
    pub members: Vec<usize>,
}

/// Disjoint buckets in first-seen key order plus the records without a key
#[derive(Debug, Clone, Default)]
pub struct Blocks {
    blocks: Vec<Block>,
    index: HashMap<String, usize>,
    unlinked: Vec<usize>,
}

impl Blocks {
    /// Bucket records by their selected KB id
    pub fn by_kb(store: &RecordStore) -> Self {
        Self::build(store, Record::selected_kb_id)
    }

    /// Bucket records by their selected Wikidata id
    pub fn by_wikidata(store: &RecordStore) -> Self {
        Self::build(store, Record::selected_wikidata_id)
    }

    fn build<F>(store: &RecordStore, key_of: F) -> Self
    where
        F: Fn(&Record) -> Option<&str>,
    {
        let mut blocks = Self::default();
        for (pos, record) in store.iter().enumerate() {
            match key_of(record) {
                Some(key) => blocks.push(key, pos),
                None => blocks.unlinked.push(pos),
            }
        }
        blocks
    }

    fn push(&mut self, key: &str, pos: usize) {
        match self.index.get(key) {
            Some(&b) => self.blocks[b].members.push(pos),
            None => {
                self.index.insert(key.to_string(), self.blocks.len());
                self.blocks.push(Block {
                    key: key.to_string(),
                    members: vec![pos],
                });
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Block> {
        self.index.get(key).map(|&b| &self.blocks[b])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.iter()
    }

    /// Records whose key is absent
    pub fn unlinked(&self) -> &[usize] {
        &self.unlinked
    }

    /// Number of keyed buckets
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
