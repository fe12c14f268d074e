use std::fs;
use std::path::Path;
use std::time::Instant;

use serde_derive::{Deserialize, Serialize};

use crate::errors::PipelineError;
use crate::index::ItemIndexer;
use crate::types::{CooccurrenceRecord, IndexedItem, ItemPrefRecord, PrunedVector,
    PrunedVectorRecord, UserId, UserVector, UserVectorRecord, VectorAndPrefs, VectorOrPref};
use crate::{aggregate, cooccurrence, io, join, prune, utils, vectors};

pub const ITEM_INDEX_FILE: &str = "item-index.json";
pub const USER_VECTORS_FILE: &str = "user-vectors.json";
pub const PRUNED_VECTORS_FILE: &str = "pruned-vectors.json";
pub const ITEM_PREFS_FILE: &str = "item-prefs.json";
pub const COOCCURRENCE_FILE: &str = "cooccurrence.json";
pub const PARTIAL_MULTIPLY_FILE: &str = "partial-multiply.json";
pub const STATE_FILE: &str = "state.json";

/// The discrete, checkpointed phases of a run, in execution order. Every
/// phase persists its complete output before the next phase starts, which is
/// what makes resuming from a phase boundary possible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    ItemIndex,
    UserVectors,
    SplitVectors,
    Cooccurrence,
    PartialMultiply,
    AggregateAndRecommend,
}

impl Phase {

    pub const ALL: [Phase; 6] = [
        Phase::ItemIndex,
        Phase::UserVectors,
        Phase::SplitVectors,
        Phase::Cooccurrence,
        Phase::PartialMultiply,
        Phase::AggregateAndRecommend,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Phase::ItemIndex => "item-index",
            Phase::UserVectors => "user-vectors",
            Phase::SplitVectors => "split-vectors",
            Phase::Cooccurrence => "cooccurrence",
            Phase::PartialMultiply => "partial-multiply",
            Phase::AggregateAndRecommend => "aggregate-and-recommend",
        }
    }
}

/// Persisted record of which phases of a run have completed, kept in the
/// temp directory next to the phase outputs. A phase is only marked after
/// its output dataset has been fully written, so a resumed run never
/// consumes a partially written dataset.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PipelineState {
    completed: Vec<Phase>,
}

impl PipelineState {

    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        if !path.exists() {
            return Ok(PipelineState::default());
        }

        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn store(&self, path: &Path) -> Result<(), PipelineError> {
        fs::write(path, serde_json::to_string(self)?)?;
        Ok(())
    }

    pub fn is_complete(&self, phase: Phase) -> bool {
        self.completed.contains(&phase)
    }

    pub fn mark_complete(&mut self, phase: Phase) {
        if !self.is_complete(phase) {
            self.completed.push(phase);
        }
    }
}

/// Configuration of a pipeline run.
#[derive(Clone, Debug)]
pub struct JobConfig {
    pub input_path: String,
    /// Where the final recommendations go; stdout if absent.
    pub output_path: Option<String>,
    /// Directory for the per-phase datasets and the state record.
    pub temp_dir: String,
    /// Number of recommendations to emit per user.
    pub num_recommendations: usize,
    /// Maximum number of preferences considered per user, the pruning cap.
    pub max_prefs_per_user: usize,
    /// The input has no value column, every preference counts as 1.0.
    pub boolean_data: bool,
    /// Optional file of user ids to compute recommendations for.
    pub users_file: Option<String>,
    /// Skip leading phases already marked complete in the state record.
    pub resume: bool,
    pub pool_size: usize,
}

impl JobConfig {

    pub fn new(input_path: &str, temp_dir: &str) -> Self {
        JobConfig {
            input_path: input_path.to_owned(),
            output_path: None,
            temp_dir: temp_dir.to_owned(),
            num_recommendations: 10,
            max_prefs_per_user: 10,
            boolean_data: false,
            users_file: None,
            resume: false,
            pool_size: 1,
        }
    }
}

/// Runs the pipeline phase by phase. Each phase reads the persisted output
/// of its predecessors, so a failed or killed run can be resumed from the
/// last completed phase boundary. A failing phase aborts the run without a
/// completion marker.
pub fn run(config: &JobConfig) -> Result<(), PipelineError> {

    fs::create_dir_all(&config.temp_dir)?;
    let temp_dir = Path::new(&config.temp_dir);
    let state_path = temp_dir.join(STATE_FILE);

    let mut state = if config.resume {
        PipelineState::load(&state_path)?
    } else {
        PipelineState::default()
    };

    for &phase in Phase::ALL.iter() {

        if config.resume && state.is_complete(phase) {
            println!("Skipping completed phase {}", phase.name());
            continue;
        }

        let phase_start = Instant::now();

        run_phase(phase, config, temp_dir)?;

        state.mark_complete(phase);
        state.store(&state_path)?;

        println!("Phase {} completed in {}ms", phase.name(),
            utils::to_millis(phase_start.elapsed()));
    }

    Ok(())
}

fn run_phase(phase: Phase, config: &JobConfig, temp_dir: &Path) -> Result<(), PipelineError> {
    match phase {

        Phase::ItemIndex => {
            let preferences = io::read_preferences(&config.input_path, config.boolean_data)?;
            let indexer = ItemIndexer::from_preferences(&preferences);

            println!("Found {} preferences over {} items in {}", preferences.len(),
                indexer.num_items(), config.input_path);

            io::write_records(&temp_dir.join(ITEM_INDEX_FILE), &indexer.to_records())
        },

        Phase::UserVectors => {
            let preferences = io::read_preferences(&config.input_path, config.boolean_data)?;
            let indexer = load_indexer(temp_dir)?;

            let user_vectors = vectors::build_user_vectors(&preferences, &indexer)?;

            io::write_records(&temp_dir.join(USER_VECTORS_FILE),
                &vectors::to_records(&user_vectors))
        },

        Phase::SplitVectors => {
            let records: Vec<UserVectorRecord> =
                io::read_records(&temp_dir.join(USER_VECTORS_FILE))?;

            let pruned: Vec<(UserId, PrunedVector)> = records.iter()
                .map(|record| {
                    let vector: UserVector = record.prefs.iter().cloned().collect();
                    (record.user, prune::prune_user_vector(&vector, config.max_prefs_per_user))
                })
                .collect();

            io::write_records(&temp_dir.join(PRUNED_VECTORS_FILE), &prune::to_records(&pruned))?;

            let user_filter = match &config.users_file {
                Some(path) => Some(io::read_user_filter(path)?),
                None => None,
            };

            let item_prefs = prune::split_vectors(&pruned, user_filter.as_ref());

            io::write_records(&temp_dir.join(ITEM_PREFS_FILE), &item_prefs)
        },

        Phase::Cooccurrence => {
            let records: Vec<PrunedVectorRecord> =
                io::read_records(&temp_dir.join(PRUNED_VECTORS_FILE))?;

            let pruned: Vec<(UserId, PrunedVector)> = records.iter()
                .map(|record| (record.user, record.prefs.iter().cloned().collect()))
                .collect();

            let columns = cooccurrence::build_cooccurrences(&pruned, config.pool_size);

            io::write_records(&temp_dir.join(COOCCURRENCE_FILE),
                &cooccurrence::to_records(&columns))
        },

        Phase::PartialMultiply => {
            let columns: Vec<CooccurrenceRecord> =
                io::read_records(&temp_dir.join(COOCCURRENCE_FILE))?;
            let item_prefs: Vec<ItemPrefRecord> =
                io::read_records(&temp_dir.join(ITEM_PREFS_FILE))?;

            let inputs = columns.into_iter()
                .map(|record| (record.item, VectorOrPref::Vector(record.column)))
                .chain(item_prefs.into_iter()
                    .map(|pref| (pref.item, VectorOrPref::Pref(pref.user, pref.value))));

            let joined = join::to_vector_and_prefs(inputs)?;

            io::write_records(&temp_dir.join(PARTIAL_MULTIPLY_FILE), &joined)
        },

        Phase::AggregateAndRecommend => {
            let joined: Vec<VectorAndPrefs> =
                io::read_records(&temp_dir.join(PARTIAL_MULTIPLY_FILE))?;
            let indexer = load_indexer(temp_dir)?;

            let user_scores = aggregate::partial_scores(&joined, config.pool_size);

            let recommendations = aggregate::top_n_recommendations(
                &user_scores, &indexer, config.num_recommendations)?;

            println!("Computed recommendations for {} users", recommendations.len());

            io::write_recommendations(&recommendations, config.output_path.as_deref())
        },
    }
}

fn load_indexer(temp_dir: &Path) -> Result<ItemIndexer, PipelineError> {
    let records: Vec<IndexedItem> = io::read_records(&temp_dir.join(ITEM_INDEX_FILE))?;
    ItemIndexer::from_records(&records)
}
