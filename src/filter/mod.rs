//! Restrict record batches to the projects of a resolved group.
//!
//! Batches are matched on their `projectName` column. A batch without that
//! column is passed through unchanged and listed in the [`FilterSummary`],
//! so unrelated tables are never dropped silently.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info, warn};

use crate::constants::PROJECT_NAME_COLUMN;
use crate::dataset::{Dataset, RecordBatch};
use crate::resolver::ProjectSet;

/// Names of every project in `projects`.
pub fn to_name_set(projects: &ProjectSet) -> BTreeSet<String> {
    projects.names()
}

/// What [`apply_filter`] did to a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSummary {
    /// Batches that had a `projectName` column
    pub batches_filtered: usize,
    /// Batches without the column, left unchanged
    pub passed_through: Vec<String>,
    pub rows_before: usize,
    pub rows_after: usize,
}

impl FilterSummary {
    /// Share of rows kept, in percent. `None` when there were no rows.
    pub fn retained_percent(&self) -> Option<f64> {
        (self.rows_before > 0).then(|| self.rows_after as f64 / self.rows_before as f64 * 100.0)
    }
}

impl fmt::Display for FilterSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.retained_percent() {
            Some(percent) => write!(
                f,
                "{} rows -> {} rows ({:.1}% retained)",
                self.rows_before, self.rows_after, percent
            ),
            None => f.write_str("no data to filter"),
        }
    }
}

/// Keep only rows whose `projectName` is in `names`.
///
/// Never adds rows. Batches lacking the column come back exactly as given.
pub fn apply_filter(dataset: Dataset, names: &BTreeSet<String>) -> (Dataset, FilterSummary) {
    let mut summary = FilterSummary::default();

    let filtered = dataset
        .into_iter()
        .map(|(name, batch)| {
            summary.rows_before += batch.len();

            let Some(column) = batch.column_index(PROJECT_NAME_COLUMN) else {
                warn!("'{}' column not found in {}, keeping it unfiltered", PROJECT_NAME_COLUMN, name);
                summary.rows_after += batch.len();
                summary.passed_through.push(name.clone());
                return (name, batch);
            };

            let before = batch.len();
            let RecordBatch {
                headers,
                rows,
            } = batch;
            let rows: Vec<_> = rows
                .into_iter()
                .filter(|row| row.get(column).is_some_and(|value| names.contains(value)))
                .collect();

            debug!("{}: {} -> {} rows", name, before, rows.len());
            summary.batches_filtered += 1;
            summary.rows_after += rows.len();
            (name, RecordBatch::new(headers, rows))
        })
        .collect();

    info!("Filtered data: {}", summary);
    (filtered, summary)
}
