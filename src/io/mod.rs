use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::dataset::Dataset;

mod csv;
mod parquet;

pub use self::csv::{read_csv_from, write_csv_to};

/// Storage-level failures with a meaning of their own
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("input file not found: {0}")]
    NotFound(PathBuf),

    #[error("unsupported data type in column '{column}': {data_type}")]
    UnsupportedType { column: String, data_type: String },
}

/// On-disk table format
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Csv,
    Parquet,
}

impl Format {
    pub fn extension(&self) -> &'static str {
        match self {
            Format::Csv => "csv",
            Format::Parquet => "parquet",
        }
    }

    /// `.parquet` files are Parquet, everything else is read as CSV
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("parquet") => Format::Parquet,
            _ => Format::Csv,
        }
    }
}

/// Load a dataset, picking the reader from the file extension
pub fn read_dataset<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(DatasetError::NotFound(path.to_path_buf()).into());
    }

    let format = Format::from_path(path);
    info!(path = %path.display(), ?format, "Loading dataset");

    let dataset = match format {
        Format::Csv => self::csv::read_csv(path),
        Format::Parquet => self::parquet::read_parquet(path),
    }
    .with_context(|| format!("Failed to load dataset: {:?}", path))?;

    debug!(
        rows = dataset.len(),
        columns = dataset.columns().len(),
        "Dataset loaded"
    );
    Ok(dataset)
}

/// Write a dataset, replacing whatever is at `path`
pub fn write_dataset(dataset: &Dataset, path: &Path, format: Format) -> Result<()> {
    debug!(path = %path.display(), rows = dataset.len(), ?format, "Writing dataset");
    match format {
        Format::Csv => self::csv::write_csv(dataset, path),
        Format::Parquet => self::parquet::write_parquet(dataset, path),
    }
    .with_context(|| format!("Failed to write dataset: {:?}", path))
}

/// Make sure `dir` exists; a no-op when it already does
pub fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        info!(path = %dir.display(), "Creating output directory");
    }
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {:?}", dir))
}
