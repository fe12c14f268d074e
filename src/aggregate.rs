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

use fnv::{FnvHashMap, FnvHashSet};
use scoped_pool::Pool;

use crate::errors::PipelineError;
use crate::index::ItemIndexer;
use crate::types::{add_to, ItemId, ItemIndex, RecommendedItem, Recommendations, ScoreVector,
    UserId, VectorAndPrefs};

/// Per-user aggregation state: the summed partial score vectors and the set
/// of items each user is known to have rated. The rated set is fed by every
/// contribution, excluded ones included, which is the whole point of carrying
/// the exclusion sentinel through the join.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserScores {
    pub scores: FnvHashMap<UserId, ScoreVector>,
    pub rated: FnvHashMap<UserId, FnvHashSet<ItemIndex>>,
}

/// Fans each joined record out into one partial score vector per contributing
/// user (preference value times co-occurrence column) and sums them per user.
/// Chunks of records are aggregated by parallel workers and merged in chunk
/// order, so scores are reproducible bit-for-bit.
pub fn partial_scores(joined: &[VectorAndPrefs], pool_size: usize) -> UserScores {

    if joined.is_empty() {
        return UserScores::default();
    }

    let pool_size = pool_size.max(1);
    let chunk_size = (joined.len() + pool_size - 1) / pool_size;

    let chunks: Vec<&[VectorAndPrefs]> = joined.chunks(chunk_size).collect();
    let mut locals: Vec<UserScores> = chunks.iter().map(|_| UserScores::default()).collect();

    let pool = Pool::new(pool_size);

    pool.scoped(|scope| {
        for (chunk, local) in chunks.iter().zip(locals.iter_mut()) {
            scope.execute(move || {
                accumulate_partials(chunk, local);
            });
        }
    });

    let mut merged = UserScores::default();
    for local in locals.iter() {
        merge_user_scores(&mut merged, local);
    }

    merged
}

fn accumulate_partials(joined: &[VectorAndPrefs], into: &mut UserScores) {
    for record in joined {
        for (&user, slot) in record.users.iter().zip(record.values.iter()) {

            into.rated.entry(user).or_default().insert(record.item);

            // an excluded slot marks the item as rated but must never
            // contribute to a score
            if let Some(value) = slot.value() {
                let scores = into.scores.entry(user).or_default();
                for &(index, weight) in record.column.iter() {
                    *scores.entry(index).or_insert(0.0) += value * weight;
                }
            }
        }
    }
}

/// Sums partial aggregation states. Associative and commutative, safe to
/// apply to any sub-grouping of records any number of times before the final
/// consolidation.
pub fn merge_user_scores(into: &mut UserScores, from: &UserScores) {
    for (&user, vector) in from.scores.iter() {
        add_to(into.scores.entry(user).or_default(), vector);
    }
    for (&user, items) in from.rated.iter() {
        into.rated.entry(user).or_default().extend(items.iter().cloned());
    }
}

/// Candidate item during top-N selection, ordered in reverse so that the top
/// of the binary max-heap is the weakest candidate kept so far. Ties in score
/// are broken by ascending item id to keep the output deterministic.
#[derive(PartialEq, Debug)]
struct ScoredItem {
    item: ItemId,
    score: f64,
}

fn cmp_reverse(scored_item_a: &ScoredItem, scored_item_b: &ScoredItem) -> Ordering {
    match scored_item_a.score.partial_cmp(&scored_item_b.score) {
        Some(Ordering::Less) => Ordering::Greater,
        Some(Ordering::Greater) => Ordering::Less,
        _ => scored_item_a.item.cmp(&scored_item_b.item),
    }
}

impl Eq for ScoredItem {}

impl Ord for ScoredItem {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_reverse(self, other)
    }
}

impl PartialOrd for ScoredItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(cmp_reverse(self, other))
    }
}

/// Ranks each user's candidates by score descending, drops every item the
/// user already rated, translates indices back to item ids and keeps the top
/// `n`. Users with no surviving candidate are absent from the result.
pub fn top_n_recommendations(
    user_scores: &UserScores,
    indexer: &ItemIndexer,
    n: usize,
) -> Result<Vec<Recommendations>, PipelineError> {

    let mut users: Vec<UserId> = user_scores.scores.keys().cloned().collect();
    users.sort();

    let no_rated_items = FnvHashSet::default();

    let mut recommendations = Vec::with_capacity(users.len());

    for user in users {
        let scores = &user_scores.scores[&user];
        let rated = user_scores.rated.get(&user).unwrap_or(&no_rated_items);

        let mut heap = BinaryHeap::with_capacity(n);

        for (&index, &score) in scores.iter() {
            if rated.contains(&index) {
                continue;
            }

            let scored_item = ScoredItem { item: indexer.item_at(index)?, score };

            if heap.len() < n {
                heap.push(scored_item);
            } else if let Some(mut top) = heap.peek_mut() {
                if scored_item < *top {
                    *top = scored_item;
                }
            }
        }

        let ranked = heap.into_sorted_vec();

        if ranked.is_empty() {
            continue;
        }

        let items = ranked.into_iter()
            .map(|scored_item| RecommendedItem { item: scored_item.item, score: scored_item.score })
            .collect();

        recommendations.push(Recommendations { user, items });
    }

    Ok(recommendations)
}
