use fnv::FnvHashMap;

use crate::errors::PipelineError;
use crate::types::{IndexedItem, ItemId, ItemIndex};

/// Assigns a dense, stable, zero-based index to every distinct item seen in
/// the input. Indices are handed out in first-seen order, which makes the
/// assignment a pure function of the input stream. Re-observing an item is a
/// no-op, so the build doubles as the idempotent deduplication step that may
/// be applied partially or repeatedly before the index is finalized.
pub struct ItemIndexer {
    id_to_index: FnvHashMap<ItemId, ItemIndex>,
    index_to_id: Vec<ItemId>,
}

impl ItemIndexer {

    pub fn from_preferences<'a, I>(preferences: I) -> Self
        where I: IntoIterator<Item = &'a (i64, i64, f64)> {

        let mut indexer = ItemIndexer {
            id_to_index: FnvHashMap::with_capacity_and_hasher(100, Default::default()),
            index_to_id: Vec::new(),
        };

        for &(_, item, _) in preferences {
            indexer.observe(item);
        }

        indexer
    }

    fn observe(&mut self, item: ItemId) {
        if !self.id_to_index.contains_key(&item) {
            let index = self.index_to_id.len() as ItemIndex;
            self.id_to_index.insert(item, index);
            self.index_to_id.push(item);
        }
    }

    pub fn num_items(&self) -> usize {
        self.index_to_id.len()
    }

    /// Index of a known item. A preference referencing an item the index
    /// pass never saw is an input-consistency error.
    pub fn index_of(&self, item: ItemId) -> Result<ItemIndex, PipelineError> {
        match self.id_to_index.get(&item) {
            Some(&index) => Ok(index),
            None => Err(PipelineError::InputInconsistency(
                format!("preference references unindexed item {}", item))),
        }
    }

    /// Reverse lookup for emitting final output. An index outside the table
    /// means an upstream dataset does not belong to this index.
    pub fn item_at(&self, index: ItemIndex) -> Result<ItemId, PipelineError> {
        match self.index_to_id.get(index as usize) {
            Some(&item) => Ok(item),
            None => Err(PipelineError::InvariantViolation(
                format!("item index {} outside the index table of size {}",
                    index, self.index_to_id.len()))),
        }
    }

    /// The persisted form of the index, sorted by index.
    pub fn to_records(&self) -> Vec<IndexedItem> {
        self.index_to_id.iter()
            .enumerate()
            .map(|(index, &item)| IndexedItem { index: index as ItemIndex, item })
            .collect()
    }

    /// Rebuilds the indexer from a persisted dataset, validating that the
    /// records form a dense zero-based bijection.
    pub fn from_records(records: &[IndexedItem]) -> Result<Self, PipelineError> {

        let mut id_to_index =
            FnvHashMap::with_capacity_and_hasher(records.len(), Default::default());
        let mut index_to_id = Vec::with_capacity(records.len());

        for (position, record) in records.iter().enumerate() {
            if record.index as usize != position {
                return Err(PipelineError::InvariantViolation(
                    format!("item index dataset is not dense: found index {} at position {}",
                        record.index, position)));
            }
            if id_to_index.insert(record.item, record.index).is_some() {
                return Err(PipelineError::InvariantViolation(
                    format!("item {} appears twice in the item index dataset", record.item)));
            }
            index_to_id.push(record.item);
        }

        Ok(ItemIndexer { id_to_index, index_to_id })
    }
}
