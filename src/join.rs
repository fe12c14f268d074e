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

use crate::errors::PipelineError;
use crate::types::{ItemIndex, Slot, UserId, VectorAndPrefs, VectorOrPref};

#[derive(Default)]
struct PartialJoin {
    column: Option<Vec<(ItemIndex, f64)>>,
    users: Vec<UserId>,
    values: Vec<Slot>,
}

/// Joins, per item index, the co-occurrence column with the preferences of
/// the users who rated that item. Both producers arrive on one keyed stream.
///
/// A group without a column is dropped: the item never co-occurred with
/// anything, so it cannot appear in any candidate set. A group without
/// preferences is dropped as well, since no surviving preference can seed a
/// partial product from it. A second column for the same item index means a
/// defective upstream stage and aborts the run.
pub fn to_vector_and_prefs<I>(inputs: I) -> Result<Vec<VectorAndPrefs>, PipelineError>
    where I: IntoIterator<Item = (ItemIndex, VectorOrPref)> {

    let mut groups: FnvHashMap<ItemIndex, PartialJoin> = FnvHashMap::default();

    for (item, value) in inputs {
        let group = groups.entry(item).or_default();

        match value {
            VectorOrPref::Vector(column) => {
                if group.column.is_some() {
                    return Err(PipelineError::InvariantViolation(
                        format!("found two co-occurrence columns for item index {}", item)));
                }
                group.column = Some(column);
            },
            VectorOrPref::Pref(user, slot) => {
                group.users.push(user);
                group.values.push(slot);
            },
        }
    }

    let mut joined: Vec<VectorAndPrefs> = groups.into_iter()
        .filter_map(|(item, group)| {
            let PartialJoin { column, users, values } = group;
            match column {
                Some(column) if !users.is_empty() =>
                    Some(VectorAndPrefs { item, column, users, values }),
                _ => None,
            }
        })
        .collect();

    joined.sort_by_key(|record| record.item);

    Ok(joined)
}

#[cfg(test)]
mod tests {

    use super::to_vector_and_prefs;
    use crate::types::{Slot, VectorOrPref};

    #[test]
    fn column_and_prefs_join_per_item() {
        let inputs = vec![
            (0, VectorOrPref::Vector(vec![(1, 2.0)])),
            (0, VectorOrPref::Pref(10, Slot::Present(1.5))),
            (0, VectorOrPref::Pref(11, Slot::Excluded)),
            (1, VectorOrPref::Vector(vec![(0, 2.0)])),
            (1, VectorOrPref::Pref(10, Slot::Present(0.5))),
        ];

        let joined = to_vector_and_prefs(inputs).unwrap();

        assert_eq!(joined.len(), 2);

        assert_eq!(joined[0].item, 0);
        assert_eq!(joined[0].column, vec![(1, 2.0)]);
        assert_eq!(joined[0].users, vec![10, 11]);
        assert_eq!(joined[0].values, vec![Slot::Present(1.5), Slot::Excluded]);

        assert_eq!(joined[1].item, 1);
        assert_eq!(joined[1].users, vec![10]);
    }

    #[test]
    fn prefs_without_a_column_are_dropped() {
        let inputs = vec![
            (3, VectorOrPref::Pref(10, Slot::Present(1.0))),
        ];

        let joined = to_vector_and_prefs(inputs).unwrap();

        assert!(joined.is_empty());
    }

    #[test]
    fn columns_without_prefs_are_dropped() {
        let inputs = vec![
            (3, VectorOrPref::Vector(vec![(4, 1.0)])),
        ];

        let joined = to_vector_and_prefs(inputs).unwrap();

        assert!(joined.is_empty());
    }

    #[test]
    fn a_second_column_aborts() {
        let inputs = vec![
            (3, VectorOrPref::Vector(vec![(4, 1.0)])),
            (3, VectorOrPref::Pref(10, Slot::Present(1.0))),
            (3, VectorOrPref::Vector(vec![(4, 1.0)])),
        ];

        assert!(to_vector_and_prefs(inputs).is_err());
    }
}
