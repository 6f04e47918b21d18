use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::io::Format;
use crate::partition::{SplitOptions, DEFAULT_SEED, DEFAULT_TEST_SIZE, DEFAULT_VAL_SIZE};

/// Everything needed for one split run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// May come from the command line instead; checked by `validate`
    #[serde(default)]
    pub input_path: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Column to stratify on; no stratification when absent
    #[serde(default)]
    pub target_column: Option<String>,
    /// Fraction of the dataset for validation + test
    #[serde(default = "default_test_size")]
    pub test_size: f64,
    /// Fraction of the validation + test part that goes to validation
    #[serde(default = "default_val_size")]
    pub val_size: f64,
    #[serde(default = "default_random_seed")]
    pub random_seed: i64,
    #[serde(default)]
    pub format: Format,
    /// Write manifest.json next to the splits
    #[serde(default = "default_manifest")]
    pub manifest: bool,
}

/// Values given on the command line; each one replaces the configured value
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub input_path: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub target_column: Option<String>,
    pub test_size: Option<f64>,
    pub val_size: Option<f64>,
    pub random_seed: Option<i64>,
    pub format: Option<Format>,
    pub no_manifest: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("splits")
}

fn default_test_size() -> f64 {
    DEFAULT_TEST_SIZE
}

fn default_val_size() -> f64 {
    DEFAULT_VAL_SIZE
}

fn default_random_seed() -> i64 {
    DEFAULT_SEED
}

fn default_manifest() -> bool {
    true
}

impl SplitConfig {
    pub fn new(input_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_dir: default_output_dir(),
            target_column: None,
            test_size: DEFAULT_TEST_SIZE,
            val_size: DEFAULT_VAL_SIZE,
            random_seed: DEFAULT_SEED,
            format: Format::default(),
            manifest: true,
        }
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: SplitConfig =
            serde_yaml::from_str(content).context("Failed to parse YAML configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from an optional YAML file plus command-line
    /// overrides, validating the merged result.
    pub fn resolve(file: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let mut config = match (file, &overrides.input_path) {
            (Some(path), _) => {
                let content = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {:?}", path))?;
                serde_yaml::from_str(&content).context("Failed to parse YAML configuration")?
            }
            (None, Some(input)) => SplitConfig::new(input.clone()),
            (None, None) => anyhow::bail!("An input path is required (use --input or --config)"),
        };
        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(input_path) = overrides.input_path {
            self.input_path = input_path;
        }
        if let Some(output_dir) = overrides.output_dir {
            self.output_dir = output_dir;
        }
        if overrides.target_column.is_some() {
            self.target_column = overrides.target_column;
        }
        if let Some(test_size) = overrides.test_size {
            self.test_size = test_size;
        }
        if let Some(val_size) = overrides.val_size {
            self.val_size = val_size;
        }
        if let Some(seed) = overrides.random_seed {
            self.random_seed = seed;
        }
        if let Some(format) = overrides.format {
            self.format = format;
        }
        if overrides.no_manifest {
            self.manifest = false;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_path.as_os_str().is_empty() {
            anyhow::bail!("input_path must not be empty");
        }
        if matches!(&self.target_column, Some(column) if column.is_empty()) {
            anyhow::bail!("target_column must not be empty when set");
        }

        self.options().validate()?;
        Ok(())
    }

    pub fn options(&self) -> SplitOptions {
        SplitOptions {
            stratify: self.target_column.clone(),
            test_size: self.test_size,
            val_size: self.val_size,
            seed: self.random_seed,
        }
    }
}
