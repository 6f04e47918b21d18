use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::SplitConfig;
use crate::dataset::Dataset;
use crate::io::{self, Format};
use crate::partition::{Partition, Partitioner};

mod manifest;
pub use manifest::{Manifest, SubsetManifest};

/// Row counts and file locations of a finished run
#[derive(Debug, Clone)]
pub struct SplitReport {
    pub train_rows: usize,
    pub val_rows: usize,
    pub test_rows: usize,
    pub files: Vec<PathBuf>,
    pub manifest_path: Option<PathBuf>,
}

/// Load, partition and write one dataset.
///
/// Output is all-or-nothing: the three subsets and the manifest are first
/// written to hidden staging files and only renamed into place once every
/// one of them has been written. A failed rename rolls back the files
/// already moved.
pub fn run_split(config: &SplitConfig) -> Result<SplitReport> {
    config.validate()?;

    let dataset = io::read_dataset(&config.input_path)?;
    info!(
        rows = dataset.len(),
        columns = dataset.columns().len(),
        "Loaded dataset"
    );

    let partition = Partitioner::new()
        .partition(&dataset, &config.options())
        .with_context(|| format!("Failed to split dataset: {:?}", config.input_path))?;
    info!(
        train = partition.train.len(),
        val = partition.val.len(),
        test = partition.test.len(),
        stratify = ?config.target_column,
        "Partition ready"
    );

    let dir = &config.output_dir;
    io::ensure_dir(dir)?;
    let subsets = [
        ("train", &partition.train),
        ("val", &partition.val),
        ("test", &partition.test),
    ];
    let mut staged = stage_subsets(&subsets, dir, config.format)?;
    let files: Vec<PathBuf> = staged.iter().map(|(_, target)| target.clone()).collect();

    let manifest_path = if config.manifest {
        let path = dir.join("manifest.json");
        let staging = dir.join(".manifest.json.tmp");
        let written = build_manifest(config, dataset.len(), &subsets, &files)
            .write_to_file(&staging)
            .with_context(|| format!("Failed to write manifest: {:?}", path));
        staged.push((staging, path.clone()));
        if let Err(e) = written {
            discard(&staged);
            return Err(e);
        }
        Some(path)
    } else {
        None
    };

    commit(&staged)?;
    if let Some(path) = &manifest_path {
        info!(path = %path.display(), "Manifest written");
    }

    Ok(report(&partition, files, manifest_path))
}

fn report(partition: &Partition, files: Vec<PathBuf>, manifest_path: Option<PathBuf>) -> SplitReport {
    SplitReport {
        train_rows: partition.train.len(),
        val_rows: partition.val.len(),
        test_rows: partition.test.len(),
        files,
        manifest_path,
    }
}

/// Write every subset to a staging file next to its final location.
/// Returns `(staging, target)` pairs; nothing is left behind on failure.
fn stage_subsets(
    subsets: &[(&str, &Dataset)],
    dir: &Path,
    format: Format,
) -> Result<Vec<(PathBuf, PathBuf)>> {
    let pb = ProgressBar::new(subsets.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")?,
    );

    let mut staged: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(subsets.len() + 1);
    for (name, subset) in subsets {
        let file_name = format!("{}.{}", name, format.extension());
        let target = dir.join(&file_name);
        let staging = dir.join(format!(".{}.tmp", file_name));
        pb.set_message(file_name);

        if let Err(e) = io::write_dataset(subset, &staging, format) {
            pb.abandon();
            staged.push((staging, target));
            discard(&staged);
            return Err(e);
        }
        staged.push((staging, target));
        pb.inc(1);
    }
    pb.finish_with_message("staged");

    Ok(staged)
}

/// Rename staged files into place. On failure the files already moved are
/// removed and the remaining staging files are discarded.
fn commit(staged: &[(PathBuf, PathBuf)]) -> Result<()> {
    for (idx, (staging, target)) in staged.iter().enumerate() {
        if let Err(e) = fs::rename(staging, target) {
            for (_, committed) in &staged[..idx] {
                remove_quietly(committed);
            }
            discard(&staged[idx..]);
            return Err(e).with_context(|| format!("Failed to move {:?} into place", target));
        }
        debug!(path = %target.display(), "Committed");
    }
    Ok(())
}

fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (staging, _) in staged {
        remove_quietly(staging);
    }
}

fn remove_quietly(path: &Path) {
    if path.is_file() {
        if let Err(e) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "Failed to remove file");
        }
    }
}

fn build_manifest(
    config: &SplitConfig,
    total_rows: usize,
    subsets: &[(&str, &Dataset)],
    files: &[PathBuf],
) -> Manifest {
    let mut manifest = Manifest {
        input_path: config.input_path.to_string_lossy().to_string(),
        output_dir: config.output_dir.to_string_lossy().to_string(),
        format: config.format,
        target_column: config.target_column.clone(),
        test_size: config.test_size,
        val_size: config.val_size,
        random_seed: config.random_seed,
        total_rows,
        subsets: Vec::new(),
    };

    for ((name, subset), path) in subsets.iter().zip(files) {
        manifest.add_subset(SubsetManifest {
            name: name.to_string(),
            path: path.to_string_lossy().to_string(),
            rows: subset.len(),
            label_counts: config
                .target_column
                .as_deref()
                .map(|column| subset.label_counts(column)),
        });
    }

    manifest
}
