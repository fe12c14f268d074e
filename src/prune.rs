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

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use fnv::FnvHashSet;

use crate::types::{ItemPrefRecord, PrunedVector, PrunedVectorRecord, Slot, UserId, UserVector};

/// Heap entry for the bounded min-heap over preference magnitudes.
#[derive(PartialEq, Debug)]
struct Magnitude(f64);

/// Reversed ordering so that the top of the binary max-heap is the smallest
/// magnitude kept so far. There is no total order on floating point numbers,
/// so we need a handwritten implementation.
fn cmp_reverse(magnitude_a: &Magnitude, magnitude_b: &Magnitude) -> Ordering {
    match magnitude_a.0.partial_cmp(&magnitude_b.0) {
        Some(Ordering::Less) => Ordering::Greater,
        Some(Ordering::Greater) => Ordering::Less,
        Some(Ordering::Equal) => Ordering::Equal,
        None => Ordering::Equal,
    }
}

impl Eq for Magnitude {}

impl Ord for Magnitude {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_reverse(self, other)
    }
}

impl PartialOrd for Magnitude {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(cmp_reverse(self, other))
    }
}

/// Finds the smallest magnitude among the `cap` largest magnitudes in one
/// pass, via a bounded heap of size `cap`.
fn smallest_large_magnitude<I>(values: I, cap: usize) -> f64
    where I: Iterator<Item = f64> {

    if cap == 0 {
        return std::f64::INFINITY;
    }

    let mut heap = BinaryHeap::with_capacity(cap);

    for value in values {
        let magnitude = Magnitude(value.abs());

        if heap.len() < cap {
            heap.push(magnitude);
        } else {
            let mut top = heap.peek_mut().unwrap();
            if magnitude < *top {
                *top = magnitude;
            }
        }
    }

    heap.peek().unwrap().0
}

/// Caps the number of preferences considered per user. A vector with at most
/// `cap` entries passes through unchanged. Otherwise every entry whose
/// magnitude is strictly below the smallest of the `cap` largest magnitudes
/// is marked `Excluded` in place. Ties at the threshold are retained, which
/// may keep more than `cap` entries, never fewer.
pub fn prune_user_vector(vector: &UserVector, cap: usize) -> PrunedVector {

    if vector.len() <= cap {
        return vector.iter()
            .map(|(&index, &value)| (index, Slot::Present(value)))
            .collect();
    }

    let threshold = smallest_large_magnitude(vector.values().cloned(), cap);

    vector.iter()
        .map(|(&index, &value)| {
            let slot = if value.abs() < threshold {
                Slot::Excluded
            } else {
                Slot::Present(value)
            };
            (index, slot)
        })
        .collect()
}

/// The persisted form of the pruned vectors, sorted by user and item index.
pub fn to_records(vectors: &[(UserId, PrunedVector)]) -> Vec<PrunedVectorRecord> {
    vectors.iter()
        .map(|(user, vector)| {
            let mut prefs: Vec<(u32, Slot)> = vector.iter()
                .map(|(&index, &slot)| (index, slot))
                .collect();
            prefs.sort_by_key(|&(index, _)| index);

            PrunedVectorRecord { user: *user, prefs }
        })
        .collect()
}

/// Re-emits each user's pruned preferences keyed by item index for the join
/// against the co-occurrence columns. Every slot is emitted, excluded ones
/// included, so the aggregation stage can still see which items a user rated.
/// With a user filter, users not in the filter are skipped entirely and will
/// not receive recommendations, while their co-occurrence evidence remains in
/// the columns.
pub fn split_vectors(
    vectors: &[(UserId, PrunedVector)],
    user_filter: Option<&FnvHashSet<UserId>>,
) -> Vec<ItemPrefRecord> {

    let mut records = Vec::new();

    for (user, vector) in vectors {
        if let Some(filter) = user_filter {
            if !filter.contains(user) {
                continue;
            }
        }

        for (&index, &slot) in vector.iter() {
            records.push(ItemPrefRecord { item: index, user: *user, value: slot });
        }
    }

    records.sort_by_key(|record| (record.item, record.user));

    records
}
