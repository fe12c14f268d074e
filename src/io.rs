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

use std::fs::File;
use std::io::prelude::*;
use std::io::{stdout, BufReader, BufWriter};
use std::path::Path;

use fnv::FnvHashSet;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::PipelineError;
use crate::types::{Recommendations, UserId};

/// Reads a preference input file. We expect NO headers, and a tab separated
/// user, item and value per line. With `boolean_data` the value column is
/// absent and every preference counts as 1.0. A record that fails to parse
/// is a fatal input inconsistency, not something to skip over.
pub fn read_preferences(
    path: &str,
    boolean_data: bool,
) -> Result<Vec<(i64, i64, f64)>, PipelineError> {

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b'\t')
        .from_path(path)?;

    let mut preferences = Vec::new();

    if boolean_data {
        for record in reader.deserialize() {
            let (user, item): (i64, i64) = record?;
            preferences.push((user, item, 1.0));
        }
    } else {
        for record in reader.deserialize() {
            let preference: (i64, i64, f64) = record?;
            preferences.push(preference);
        }
    }

    Ok(preferences)
}

/// Reads the optional file of users to restrict the computation to, one user
/// id per line.
pub fn read_user_filter(path: &str) -> Result<FnvHashSet<UserId>, PipelineError> {

    let reader = BufReader::new(File::open(path)?);

    let mut users = FnvHashSet::default();

    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();

        if trimmed.is_empty() {
            continue;
        }

        let user: UserId = trimmed.parse().map_err(|_| {
            PipelineError::InputInconsistency(
                format!("malformed user id '{}' in users file {}", trimmed, path))
        })?;

        users.insert(user);
    }

    Ok(users)
}

/// Persists one phase output dataset as JSON, one record per line. Callers
/// pass records in key order, so the written bytes are canonical.
pub fn write_records<T: Serialize>(path: &Path, records: &[T]) -> Result<(), PipelineError> {

    let mut out = BufWriter::new(File::create(path)?);

    for record in records {
        let line = serde_json::to_string(record)?;
        writeln!(out, "{}", line)?;
    }

    out.flush()?;

    Ok(())
}

/// Loads a phase output dataset written by `write_records`.
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, PipelineError> {

    let reader = BufReader::new(File::open(path)?);

    let mut records = Vec::new();

    for line in reader.lines() {
        let line = line?;
        records.push(serde_json::from_str(&line)?);
    }

    Ok(records)
}

/// Writes the final recommendation lists in JSON format. If an `output_path`
/// is supplied, we write to a file at the specified path, otherwise, we
/// output to stdout.
pub fn write_recommendations(
    recommendations: &[Recommendations],
    output_path: Option<&str>,
) -> Result<(), PipelineError> {

    let mut out: Box<dyn Write> = match output_path {
        Some(path) => Box::new(BufWriter::new(File::create(&Path::new(path))?)),
        _ => Box::new(stdout()),
    };

    for record in recommendations {
        let line = serde_json::to_string(record)?;
        writeln!(out, "{}", line)?;
    }

    out.flush()?;

    Ok(())
}
