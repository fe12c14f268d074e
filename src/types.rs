/**
 * CoocRec
 * Copyright (C) 2019 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use fnv::FnvHashMap;
use serde_derive::{Deserialize, Serialize};

/// External user identifier, taken verbatim from the input.
pub type UserId = i64;

/// External item identifier, taken verbatim from the input.
pub type ItemId = i64;

/// Dense zero-based index assigned to a distinct item by the item indexer.
pub type ItemIndex = u32;

/// Sparse vector over item indices. Indices not present are implicitly zero.
pub type ScoreVector = FnvHashMap<ItemIndex, f64>;

/// A single slot of a pruned user vector. Pruning replaces low-magnitude
/// values with `Excluded` in place instead of removing them, so downstream
/// stages still see that the item exists for the user. An excluded slot must
/// never enter a score computation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Slot {
    Present(f64),
    Excluded,
}

impl Slot {
    /// The preference value, or `None` for an excluded slot.
    pub fn value(&self) -> Option<f64> {
        match *self {
            Slot::Present(value) => Some(value),
            Slot::Excluded => None,
        }
    }
}

/// A user's preferences as built by the vector builder, before pruning.
pub type UserVector = FnvHashMap<ItemIndex, f64>;

/// A user's preferences after pruning, with excluded slots marked.
pub type PrunedVector = FnvHashMap<ItemIndex, Slot>;

/// One entry of the persisted item index dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexedItem {
    pub index: ItemIndex,
    pub item: ItemId,
}

/// One persisted user vector, preferences sorted by item index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserVectorRecord {
    pub user: UserId,
    pub prefs: Vec<(ItemIndex, f64)>,
}

/// One persisted pruned user vector, slots sorted by item index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrunedVectorRecord {
    pub user: UserId,
    pub prefs: Vec<(ItemIndex, Slot)>,
}

/// A single preference re-keyed by item index by the splitter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ItemPrefRecord {
    pub item: ItemIndex,
    pub user: UserId,
    pub value: Slot,
}

/// One persisted co-occurrence column, entries sorted by item index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CooccurrenceRecord {
    pub item: ItemIndex,
    pub column: Vec<(ItemIndex, f64)>,
}

/// Wire representation feeding the joiner. Both producers of the join share
/// one stream keyed by item index, carrying either the co-occurrence column
/// for that item or a single user preference for it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum VectorOrPref {
    Vector(Vec<(ItemIndex, f64)>),
    Pref(UserId, Slot),
}

/// Joined record for one item index: its co-occurrence column and the
/// contributing preferences as ordered-parallel user and value lists.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VectorAndPrefs {
    pub item: ItemIndex,
    pub column: Vec<(ItemIndex, f64)>,
    pub users: Vec<UserId>,
    pub values: Vec<Slot>,
}

/// A single recommended item with its aggregated score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecommendedItem {
    pub item: ItemId,
    pub score: f64,
}

/// Final output record: the top-N recommendations for one user,
/// most-recommended first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub user: UserId,
    pub items: Vec<RecommendedItem>,
}

/// Element-wise sum of sparse vectors, the associative merge underlying all
/// partial aggregation in the pipeline.
pub fn add_to(into: &mut ScoreVector, from: &ScoreVector) {
    for (&index, &value) in from.iter() {
        *into.entry(index).or_insert(0.0) += value;
    }
}

/// Sorted pair form of a sparse vector, used for canonical persisted output.
pub fn to_sorted_pairs(vector: &ScoreVector) -> Vec<(ItemIndex, f64)> {
    let mut pairs: Vec<(ItemIndex, f64)> = vector.iter()
        .map(|(&index, &value)| (index, value))
        .collect();
    pairs.sort_by_key(|&(index, _)| index);
    pairs
}
