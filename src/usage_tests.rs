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

#[cfg(test)]
mod tests {

    use std::env;
    use std::fs;
    use std::path::PathBuf;

    use crate::index::ItemIndexer;
    use crate::pipeline::{self, JobConfig, Phase, PipelineState};
    use crate::types::{PrunedVector, RecommendedItem, UserId, VectorOrPref};
    use crate::{aggregate, cooccurrence, io, join, prune, vectors};

    #[test]
    fn programmatic_usage() {

        /* Preferences of three users: Jane likes a mouse (100) and a pc
           (101), Paul a game (102) and the pc, Fred only a disk (103). */
        let preferences = vec![
            (1, 100, 1.0),
            (1, 101, 2.0),
            (2, 102, 1.0),
            (2, 101, 1.0),
            (3, 103, 1.0),
        ];

        /* The index pass assigns dense integer indices to the items, the
           vector pass groups the preferences per user. */
        let indexer = ItemIndexer::from_preferences(&preferences);
        let user_vectors = vectors::build_user_vectors(&preferences, &indexer).unwrap();

        let mouse = indexer.index_of(100).unwrap();
        let pc = indexer.index_of(101).unwrap();
        let game = indexer.index_of(102).unwrap();
        let disk = indexer.index_of(103).unwrap();

        /* With a cap of 10 no vector is large enough to get pruned. */
        let pruned: Vec<(UserId, PrunedVector)> = user_vectors.iter()
            .map(|(user, vector)| (*user, prune::prune_user_vector(vector, 10)))
            .collect();

        /* Co-occurrence evidence is symmetric, and Fred's disk co-occurs
           with nothing. */
        let columns = cooccurrence::build_cooccurrences(&pruned, 2);

        assert_eq!(columns[&mouse][&pc], 1.0);
        assert_eq!(columns[&pc][&mouse], 1.0);
        assert_eq!(columns[&pc][&game], 1.0);
        assert!(columns.get(&disk).is_none());

        /* Both join inputs share one stream keyed by item index. */
        let item_prefs = prune::split_vectors(&pruned, None);

        let inputs = cooccurrence::to_records(&columns).into_iter()
            .map(|record| (record.item, VectorOrPref::Vector(record.column)))
            .chain(item_prefs.into_iter()
                .map(|pref| (pref.item, VectorOrPref::Pref(pref.user, pref.value))));

        let joined = join::to_vector_and_prefs(inputs).unwrap();

        /* Jane's only unrated candidate is the game, reached through the
           pc's co-occurrence column with her preference value of 2, Paul
           gets the mouse the same way, and Fred gets nothing at all. */
        let user_scores = aggregate::partial_scores(&joined, 2);
        let recommendations =
            aggregate::top_n_recommendations(&user_scores, &indexer, 10).unwrap();

        assert_eq!(recommendations.len(), 2);

        assert_eq!(recommendations[0].user, 1);
        assert_eq!(recommendations[0].items,
            vec![RecommendedItem { item: 102, score: 2.0 }]);

        assert_eq!(recommendations[1].user, 2);
        assert_eq!(recommendations[1].items,
            vec![RecommendedItem { item: 100, score: 1.0 }]);
    }

    fn test_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    const INPUT: &str = "1\t100\t1.0\n1\t101\t2.0\n2\t102\t1.0\n2\t101\t1.0\n3\t103\t1.0\n";

    #[test]
    fn rerun_and_resume_reproduce_identical_output() {

        let base = test_dir("coocrec-usage-rerun");

        let input = base.join("preferences.tsv");
        fs::write(&input, INPUT).unwrap();

        let run = |temp_dir: &PathBuf, output: &PathBuf, resume: bool| {
            let mut config =
                JobConfig::new(input.to_str().unwrap(), temp_dir.to_str().unwrap());
            config.output_path = Some(output.to_str().unwrap().to_owned());
            config.resume = resume;
            config.pool_size = 2;
            pipeline::run(&config).unwrap();
            fs::read(output).unwrap()
        };

        let temp_a = base.join("run-a");
        let output_a = base.join("recommendations-a.json");
        let bytes_a = run(&temp_a, &output_a, false);

        /* A from-scratch rerun over unchanged input writes identical bytes. */
        let temp_b = base.join("run-b");
        let output_b = base.join("recommendations-b.json");
        let bytes_b = run(&temp_b, &output_b, false);

        assert_eq!(bytes_a, bytes_b);

        /* Forget the trailing phases of run a but keep its persisted
           datasets, then resume: the re-run trailing phases reproduce the
           same output. */
        let mut state = PipelineState::default();
        state.mark_complete(Phase::ItemIndex);
        state.mark_complete(Phase::UserVectors);
        state.mark_complete(Phase::SplitVectors);
        state.store(&temp_a.join(pipeline::STATE_FILE)).unwrap();

        let output_c = base.join("recommendations-c.json");
        let bytes_c = run(&temp_a, &output_c, true);

        assert_eq!(bytes_a, bytes_c);
    }

    #[test]
    fn users_file_restricts_the_output() {

        let base = test_dir("coocrec-usage-usersfile");

        let input = base.join("preferences.tsv");
        fs::write(&input, INPUT).unwrap();

        let users_file = base.join("users.txt");
        fs::write(&users_file, "2\n").unwrap();

        let output = base.join("recommendations.json");

        let mut config = JobConfig::new(
            input.to_str().unwrap(), base.join("temp").to_str().unwrap());
        config.output_path = Some(output.to_str().unwrap().to_owned());
        config.users_file = Some(users_file.to_str().unwrap().to_owned());
        pipeline::run(&config).unwrap();

        let written = fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = written.lines().collect();

        /* Only Paul is in scope, but his recommendation still rests on the
           co-occurrence evidence of the full population. */
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("\"user\":2"));
        assert!(lines[0].contains("\"item\":100"));
    }

    #[test]
    fn boolean_input_counts_every_preference_as_one() {

        let base = test_dir("coocrec-usage-boolean");

        let input = base.join("interactions.tsv");
        fs::write(&input, "1\t100\n1\t101\n2\t101\n").unwrap();

        let preferences = io::read_preferences(input.to_str().unwrap(), true).unwrap();

        assert_eq!(preferences, vec![(1, 100, 1.0), (1, 101, 1.0), (2, 101, 1.0)]);
    }

    #[test]
    fn a_malformed_record_fails_the_run() {

        let base = test_dir("coocrec-usage-badinput");

        let input = base.join("preferences.tsv");
        fs::write(&input, "1\t100\tnot-a-number\n").unwrap();

        let config = JobConfig::new(
            input.to_str().unwrap(), base.join("temp").to_str().unwrap());

        assert!(pipeline::run(&config).is_err());
    }
}
