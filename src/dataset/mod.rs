//! Tabular record batches loaded from zip archives of CSV files.
//!
//! A [`Dataset`] maps each CSV entry of an archive to a [`RecordBatch`]. The
//! batches are what [`crate::filter`] restricts to a resolved project group;
//! analysis and reporting happen downstream on the written CSV files.
//!
//! ```rust,no_run
//! use bdmetrics::dataset::Dataset;
//! use std::path::{Component, Path, PathBuf};
//!
//! # fn example() -> anyhow::Result<()> {
//! let dataset = Dataset::load_zip(Path::new("heatmap.zip"))?;
//! println!("{} batches, {} rows", dataset.len(), dataset.total_rows());
//! dataset.write_csv_dir(Path::new("out"))?;
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};
use zip::ZipArchive;

use crate::core::HubError;

/// One CSV table: a header row and its records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordBatch {
    pub headers: StringRecord,
    pub rows: Vec<StringRecord>,
}

impl RecordBatch {
    pub fn new(headers: StringRecord, rows: Vec<StringRecord>) -> Self {
        Self {
            headers,
            rows,
        }
    }

    /// Parse CSV text with a header row.
    ///
    /// Rows may have a different number of fields than the header.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed CSV or invalid UTF-8.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers = reader.headers().context("Failed to read CSV header")?.clone();

        let rows = reader
            .records()
            .enumerate()
            .map(|(idx, record)| record.with_context(|| format!("Failed to read row {}", idx + 1)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            headers,
            rows,
        })
    }

    /// Position of column `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    /// Number of records, excluding the header.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write the batch as CSV, header first.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut writer = WriterBuilder::new()
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush().with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

/// Record batches keyed by archive entry name, in name order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dataset {
    batches: BTreeMap<String, RecordBatch>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every `*.csv` entry of the zip archive at `path`.
    ///
    /// Directory entries and other files are skipped, as are entries whose
    /// name would escape the archive root.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened, is not a zip archive,
    /// or contains a CSV entry that does not parse.
    pub fn load_zip(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let mut archive = ZipArchive::new(BufReader::new(file))
            .with_context(|| format!("{} is not a valid zip archive", path.display()))?;

        let mut dataset = Self::new();
        for index in 0..archive.len() {
            let mut entry = archive
                .by_index(index)
                .with_context(|| format!("Failed to read entry {index} of {}", path.display()))?;

            if entry.is_dir() || entry.enclosed_name().is_none() {
                continue;
            }
            let name = entry.name().to_string();
            if !name.to_ascii_lowercase().ends_with(".csv") {
                debug!("Skipping non-CSV entry {}", name);
                continue;
            }

            let mut content = Vec::new();
            entry
                .read_to_end(&mut content)
                .with_context(|| format!("Failed to extract {name} from {}", path.display()))?;
            let batch = RecordBatch::from_reader(content.as_slice())
                .with_context(|| format!("Failed to parse {name} in {}", path.display()))?;

            debug!("Loaded {} ({} rows)", name, batch.len());
            dataset.insert(name, batch);
        }

        if dataset.is_empty() {
            return Err(HubError::Dataset {
                path: path.display().to_string(),
                message: "archive contains no CSV files".to_string(),
            }
            .into());
        }

        info!(
            "Loaded {} CSV file(s) with {} rows from {}",
            dataset.len(),
            dataset.total_rows(),
            path.display()
        );
        Ok(dataset)
    }

    /// Write each batch to `dir/<entry name>`, creating `dir` and any
    /// subdirectories the entry names contain.
    ///
    /// # Errors
    ///
    /// Returns an error if a batch name has no usable relative path, or if a
    /// directory or file cannot be written.
    pub fn write_csv_dir(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

        for (name, batch) in &self.batches {
            let target = dir.join(relative_output_path(name)?);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            batch.write_csv(&target)?;
        }

        info!("Wrote {} CSV file(s) to {}", self.len(), dir.display());
        Ok(())
    }

    /// Add or replace the batch called `name`.
    pub fn insert(&mut self, name: impl Into<String>, batch: RecordBatch) {
        self.batches.insert(name.into(), batch);
    }

    pub fn get(&self, name: &str) -> Option<&RecordBatch> {
        self.batches.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RecordBatch)> {
        self.batches.iter().map(|(name, batch)| (name.as_str(), batch))
    }

    /// Number of batches.
    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    /// Records across all batches.
    pub fn total_rows(&self) -> usize {
        self.batches.values().map(RecordBatch::len).sum()
    }

    /// True when no batch holds a record.
    pub fn is_empty_rows(&self) -> bool {
        self.total_rows() == 0
    }
}

/// The path of batch `name` below an output directory.
///
/// Only plain components are kept, so `a/../b.csv` or `/b.csv` cannot leave the
/// output directory.
fn relative_output_path(name: &str) -> Result<PathBuf> {
    let relative: PathBuf = Path::new(name)
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();

    if relative.as_os_str().is_empty() {
        return Err(HubError::Dataset {
            path: name.to_string(),
            message: "batch name has no file name".to_string(),
        }
        .into());
    }
    Ok(relative)
}

impl FromIterator<(String, RecordBatch)> for Dataset {
    fn from_iter<I: IntoIterator<Item = (String, RecordBatch)>>(iter: I) -> Self {
        Self {
            batches: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Dataset {
    type Item = (String, RecordBatch);
    type IntoIter = std::collections::btree_map::IntoIter<String, RecordBatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.batches.into_iter()
    }
}
