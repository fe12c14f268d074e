use fnv::FnvHashMap;
use scoped_pool::Pool;

use crate::types::{add_to, to_sorted_pairs, CooccurrenceRecord, ItemIndex, PrunedVector,
    ScoreVector, UserId};

/// One sparse column of the item-item co-occurrence matrix per item index.
pub type CooccurrenceColumns = FnvHashMap<ItemIndex, ScoreVector>;

/// Derives the co-occurrence matrix from the pruned user vectors: for every
/// unordered pair of present entries of a user, one unit of evidence is added
/// for both directions. The pair enumeration is quadratic in the number of
/// present entries per user, which is exactly what the upstream pruning cap
/// bounds; the builder itself imposes no cap.
///
/// Workers accumulate disjoint chunks of users into local column maps that
/// are merged in chunk order, so the result does not depend on scheduling.
pub fn build_cooccurrences(
    vectors: &[(UserId, PrunedVector)],
    pool_size: usize,
) -> CooccurrenceColumns {

    if vectors.is_empty() {
        return FnvHashMap::default();
    }

    let pool_size = pool_size.max(1);
    let chunk_size = (vectors.len() + pool_size - 1) / pool_size;

    let chunks: Vec<&[(UserId, PrunedVector)]> = vectors.chunks(chunk_size).collect();
    let mut locals: Vec<(CooccurrenceColumns, u64)> =
        chunks.iter().map(|_| (FnvHashMap::default(), 0)).collect();

    let pool = Pool::new(pool_size);

    pool.scoped(|scope| {
        for (chunk, local) in chunks.iter().zip(locals.iter_mut()) {
            scope.execute(move || {
                let (columns, num_cooccurrences) = local;
                for (_, vector) in chunk.iter() {
                    *num_cooccurrences += accumulate_pairs(vector, columns);
                }
            });
        }
    });

    let mut columns: CooccurrenceColumns = FnvHashMap::default();
    let mut num_cooccurrences_observed: u64 = 0;

    for (local, num_cooccurrences) in locals {
        merge_columns(&mut columns, &local);
        num_cooccurrences_observed += num_cooccurrences;
    }

    println!("{} cooccurrences observed over {} users", num_cooccurrences_observed,
        vectors.len());

    columns
}

/// Emits the symmetric pair evidence of a single user vector. Excluded slots
/// never pair. Returns the number of cooccurrences observed.
fn accumulate_pairs(vector: &PrunedVector, columns: &mut CooccurrenceColumns) -> u64 {

    let present: Vec<ItemIndex> = vector.iter()
        .filter_map(|(&index, &slot)| slot.value().map(|_| index))
        .collect();

    for (position, &item) in present.iter().enumerate() {
        for &other_item in present[position + 1..].iter() {
            *columns.entry(item).or_default().entry(other_item).or_insert(0.0) += 1.0;
            *columns.entry(other_item).or_default().entry(item).or_insert(0.0) += 1.0;
        }
    }

    let num_present = present.len() as u64;
    num_present * num_present.saturating_sub(1)
}

/// Sums two column maps element-wise. Associative and commutative, safe to
/// apply to any sub-grouping of users any number of times.
pub fn merge_columns(into: &mut CooccurrenceColumns, from: &CooccurrenceColumns) {
    for (&item, column) in from.iter() {
        add_to(into.entry(item).or_default(), column);
    }
}

/// The persisted form of the matrix, sorted by item index inside and out.
pub fn to_records(columns: &CooccurrenceColumns) -> Vec<CooccurrenceRecord> {
    let mut records: Vec<CooccurrenceRecord> = columns.iter()
        .map(|(&item, column)| CooccurrenceRecord { item, column: to_sorted_pairs(column) })
        .collect();
    records.sort_by_key(|record| record.item);
    records
}

#[cfg(test)]
mod tests {

    use super::{build_cooccurrences, merge_columns, CooccurrenceColumns};
    use crate::types::{PrunedVector, Slot, UserId};

    fn pruned(entries: &[(u32, Slot)]) -> PrunedVector {
        entries.iter().cloned().collect()
    }

    fn evidence(columns: &CooccurrenceColumns, item: u32, other_item: u32) -> f64 {
        columns.get(&item)
            .and_then(|column| column.get(&other_item))
            .cloned()
            .unwrap_or(0.0)
    }

    #[test]
    fn evidence_is_symmetric() {
        let vectors: Vec<(UserId, PrunedVector)> = vec![
            (1, pruned(&[(0, Slot::Present(1.0)), (1, Slot::Present(2.0)),
                (2, Slot::Present(0.5))])),
            (2, pruned(&[(1, Slot::Present(1.0)), (2, Slot::Present(1.0))])),
            (3, pruned(&[(3, Slot::Present(1.0))])),
        ];

        let columns = build_cooccurrences(&vectors, 2);

        for item in 0..4 {
            for other_item in 0..4 {
                if item != other_item {
                    assert_eq!(
                        evidence(&columns, item, other_item),
                        evidence(&columns, other_item, item),
                    );
                }
            }
        }

        // the (1, 2) pair is backed by two users
        assert_eq!(evidence(&columns, 1, 2), 2.0);
        assert_eq!(evidence(&columns, 0, 1), 1.0);
        // a lone item has no column at all
        assert!(columns.get(&3).is_none());
    }

    #[test]
    fn excluded_slots_produce_no_evidence() {
        let vectors: Vec<(UserId, PrunedVector)> = vec![
            (1, pruned(&[(0, Slot::Present(1.0)), (1, Slot::Excluded),
                (2, Slot::Present(1.0))])),
        ];

        let columns = build_cooccurrences(&vectors, 1);

        assert_eq!(evidence(&columns, 0, 2), 1.0);
        assert_eq!(evidence(&columns, 0, 1), 0.0);
        assert_eq!(evidence(&columns, 1, 2), 0.0);
        assert!(columns.get(&1).is_none());
    }

    #[test]
    fn merging_is_associative() {
        let vectors: Vec<(UserId, PrunedVector)> = vec![
            (1, pruned(&[(0, Slot::Present(1.0)), (1, Slot::Present(1.0))])),
            (2, pruned(&[(0, Slot::Present(1.0)), (1, Slot::Present(1.0))])),
            (3, pruned(&[(1, Slot::Present(1.0)), (2, Slot::Present(1.0))])),
        ];

        let a = build_cooccurrences(&vectors[0..1], 1);
        let b = build_cooccurrences(&vectors[1..2], 1);
        let c = build_cooccurrences(&vectors[2..3], 1);

        let mut left_first = a.clone();
        merge_columns(&mut left_first, &b);
        merge_columns(&mut left_first, &c);

        let mut right_first = b.clone();
        merge_columns(&mut right_first, &c);
        let mut merged = a.clone();
        merge_columns(&mut merged, &right_first);

        assert_eq!(left_first, merged);
        assert_eq!(left_first, build_cooccurrences(&vectors, 3));
    }
}
