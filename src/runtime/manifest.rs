use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::io::Format;

/// Record of one split run, written next to the output files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub input_path: String,
    pub output_dir: String,
    pub format: Format,
    pub target_column: Option<String>,
    pub test_size: f64,
    pub val_size: f64,
    pub random_seed: i64,
    pub total_rows: usize,
    pub subsets: Vec<SubsetManifest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubsetManifest {
    pub name: String,
    pub path: String,
    pub rows: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_counts: Option<BTreeMap<String, usize>>, // Only for stratified runs
}

impl Manifest {
    pub fn add_subset(&mut self, subset: SubsetManifest) {
        self.subsets.push(subset);
    }

    pub fn write_to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    pub fn read_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str(&json)?)
    }
}
