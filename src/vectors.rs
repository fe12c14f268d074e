use fnv::FnvHashMap;

use crate::errors::PipelineError;
use crate::index::ItemIndexer;
use crate::types::{UserId, UserVector, UserVectorRecord};

/// Groups raw preferences by user and materializes one sparse vector over
/// item indices per user. Several preferences for the same user and item
/// overwrite each other, last record wins. A preference for an item that is
/// missing from the index table aborts the run.
pub fn build_user_vectors(
    preferences: &[(i64, i64, f64)],
    indexer: &ItemIndexer,
) -> Result<Vec<(UserId, UserVector)>, PipelineError> {

    let mut vectors: FnvHashMap<UserId, UserVector> =
        FnvHashMap::with_capacity_and_hasher(100, Default::default());

    for &(user, item, value) in preferences {
        let index = indexer.index_of(item)?;

        vectors.entry(user)
            .or_insert_with(UserVector::default)
            .insert(index, value);
    }

    let mut vectors: Vec<(UserId, UserVector)> = vectors.into_iter().collect();
    vectors.sort_by_key(|&(user, _)| user);

    Ok(vectors)
}

/// The persisted form of the user vectors, sorted by user and item index.
pub fn to_records(vectors: &[(UserId, UserVector)]) -> Vec<UserVectorRecord> {
    vectors.iter()
        .map(|(user, vector)| {
            let mut prefs: Vec<(u32, f64)> = vector.iter()
                .map(|(&index, &value)| (index, value))
                .collect();
            prefs.sort_by_key(|&(index, _)| index);

            UserVectorRecord { user: *user, prefs }
        })
        .collect()
}

#[cfg(test)]
mod tests {

    use super::build_user_vectors;
    use crate::index::ItemIndexer;

    #[test]
    fn preferences_group_by_user() {
        let preferences = vec![
            (1, 10, 1.0),
            (1, 20, 2.0),
            (2, 20, 0.5),
        ];

        let indexer = ItemIndexer::from_preferences(&preferences);
        let vectors = build_user_vectors(&preferences, &indexer).unwrap();

        assert_eq!(vectors.len(), 2);

        let (user, vector) = &vectors[0];
        assert_eq!(*user, 1);
        assert_eq!(vector.len(), 2);
        assert_eq!(vector[&indexer.index_of(10).unwrap()], 1.0);
        assert_eq!(vector[&indexer.index_of(20).unwrap()], 2.0);

        let (user, vector) = &vectors[1];
        assert_eq!(*user, 2);
        assert_eq!(vector.len(), 1);
    }

    #[test]
    fn repeated_pair_overwrites() {
        let preferences = vec![
            (1, 10, 1.0),
            (1, 10, 4.0),
        ];

        let indexer = ItemIndexer::from_preferences(&preferences);
        let vectors = build_user_vectors(&preferences, &indexer).unwrap();

        assert_eq!(vectors.len(), 1);
        assert_eq!(vectors[0].1[&0], 4.0);
    }

    #[test]
    fn unindexed_item_aborts() {
        let indexed = vec![(1, 10, 1.0)];
        let indexer = ItemIndexer::from_preferences(&indexed);

        let preferences = vec![(1, 10, 1.0), (2, 99, 1.0)];

        assert!(build_user_vectors(&preferences, &indexer).is_err());
    }
}
