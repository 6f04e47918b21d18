//! Deterministic train/validation/test partitioning.
//!
//! A partition is computed in two stages: the whole dataset is first split
//! into a training part and a temporary holdout of `test_size`, then the
//! holdout is split again so that `val_size` of it becomes validation and the
//! rest becomes test. With stratification each label group is split on its
//! own so every subset keeps the label ratios of its source.

use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::dataset::Dataset;

mod error;
mod shuffle;

pub use error::{ErrorKind, SplitError, SplitResult};
pub use shuffle::{SeededShuffle, Shuffle};

pub const DEFAULT_TEST_SIZE: f64 = 0.2;
pub const DEFAULT_VAL_SIZE: f64 = 0.5;
pub const DEFAULT_SEED: i64 = 42;

/// Parameters of a single partition call
#[derive(Debug, Clone, PartialEq)]
pub struct SplitOptions {
    /// Column whose values are used as class labels
    pub stratify: Option<String>,
    /// Fraction of the dataset routed to the holdout (validation + test)
    pub test_size: f64,
    /// Fraction of the holdout routed to validation
    pub val_size: f64,
    pub seed: i64,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            stratify: None,
            test_size: DEFAULT_TEST_SIZE,
            val_size: DEFAULT_VAL_SIZE,
            seed: DEFAULT_SEED,
        }
    }
}

impl SplitOptions {
    pub fn validate(&self) -> SplitResult<()> {
        check_proportion("test_size", self.test_size)?;
        check_proportion("val_size", self.val_size)?;
        Ok(())
    }
}

fn check_proportion(parameter: &'static str, value: f64) -> SplitResult<()> {
    if value.is_finite() && value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(SplitError::InvalidProportion { parameter, value })
    }
}

/// Row positions of each subset, relative to the source dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionIndices {
    pub train: Vec<usize>,
    pub val: Vec<usize>,
    pub test: Vec<usize>,
}

/// The three materialized subsets
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    pub train: Dataset,
    pub val: Dataset,
    pub test: Dataset,
}

/// Splits datasets using permutations drawn from a seeded [`Shuffle`] source.
///
/// Each split stage asks the source factory for a fresh shuffle seeded with
/// the same user seed, so the result only depends on the seed and the order
/// of the input rows.
pub struct Partitioner<F = fn(i64) -> SeededShuffle> {
    source: F,
}

impl Partitioner {
    pub fn new() -> Self {
        Self {
            source: SeededShuffle::new,
        }
    }
}

impl Default for Partitioner {
    fn default() -> Self {
        Self::new()
    }
}

impl<F, S> Partitioner<F>
where
    F: Fn(i64) -> S,
    S: Shuffle,
{
    /// Use a custom permutation source instead of the ChaCha-based default
    pub fn with_source(source: F) -> Self {
        Self { source }
    }

    pub fn partition(&self, dataset: &Dataset, options: &SplitOptions) -> SplitResult<Partition> {
        let indices = self.partition_indices(dataset, options)?;
        Ok(Partition {
            train: dataset.select(&indices.train),
            val: dataset.select(&indices.val),
            test: dataset.select(&indices.test),
        })
    }

    pub fn partition_indices(
        &self,
        dataset: &Dataset,
        options: &SplitOptions,
    ) -> SplitResult<PartitionIndices> {
        options.validate()?;

        if dataset.is_empty() {
            return Err(SplitError::EmptyDataset);
        }

        let stratify = options.stratify.as_deref();
        if let Some(column) = stratify {
            if !dataset.has_column(column) {
                return Err(SplitError::UnknownColumn {
                    column: column.to_string(),
                });
            }
        }

        let all: Vec<usize> = (0..dataset.len()).collect();
        let (train, holdout) =
            self.split(dataset, all, options.test_size, stratify, options.seed)?;
        // The holdout side of the second stage is validation
        let (test, val) = self.split(dataset, holdout, options.val_size, stratify, options.seed)?;

        debug!(
            rows = dataset.len(),
            train = train.len(),
            val = val.len(),
            test = test.len(),
            stratify = ?stratify,
            seed = options.seed,
            "Partition computed"
        );

        Ok(PartitionIndices { train, val, test })
    }

    /// Split `indices` into `(kept, holdout)` where the holdout holds
    /// `fraction` of the rows.
    fn split(
        &self,
        dataset: &Dataset,
        mut indices: Vec<usize>,
        fraction: f64,
        stratify: Option<&str>,
        seed: i64,
    ) -> SplitResult<(Vec<usize>, Vec<usize>)> {
        let mut shuffle = (self.source)(seed);

        let Some(column) = stratify else {
            shuffle.shuffle(&mut indices);
            let n_holdout = holdout_len(indices.len(), fraction);
            if n_holdout == 0 || n_holdout == indices.len() {
                warn!(
                    rows = indices.len(),
                    fraction, "Split leaves one side empty; dataset is too small"
                );
            }
            let holdout = indices.split_off(indices.len() - n_holdout);
            return Ok((indices, holdout));
        };

        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for idx in indices {
            groups.entry(dataset.label(idx, column)).or_default().push(idx);
        }

        if let Some((label, members)) = groups.iter().find(|(_, members)| members.len() < 2) {
            return Err(SplitError::TooFewMembers {
                column: column.to_string(),
                label: label.clone(),
                count: members.len(),
            });
        }

        let mut kept = Vec::new();
        let mut holdout = Vec::new();
        for (_, mut members) in groups {
            shuffle.shuffle(&mut members);
            // Both sides keep at least one member of every label
            let n_holdout = holdout_len(members.len(), fraction).clamp(1, members.len() - 1);
            holdout.extend(members.split_off(members.len() - n_holdout));
            kept.extend(members);
        }

        // Groups were concatenated in label order
        shuffle.shuffle(&mut kept);
        shuffle.shuffle(&mut holdout);

        Ok((kept, holdout))
    }
}

fn holdout_len(n: usize, fraction: f64) -> usize {
    (((n as f64) * fraction).round() as usize).min(n)
}

/// Partition `dataset` with the default permutation source.
///
/// `seed` falls back to [`DEFAULT_SEED`] when absent.
pub fn partition(
    dataset: &Dataset,
    stratify: Option<&str>,
    test_size: f64,
    val_size: f64,
    seed: Option<i64>,
) -> SplitResult<Partition> {
    let options = SplitOptions {
        stratify: stratify.map(str::to_string),
        test_size,
        val_size,
        seed: seed.unwrap_or(DEFAULT_SEED),
    };
    Partitioner::new().partition(dataset, &options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Row, Value};
    use std::collections::HashSet;

    fn numbered(n: usize) -> Dataset {
        let rows = (0..n).map(|i| Row::new().with("id", i as i64)).collect();
        Dataset::from_rows(vec!["id".to_string()], rows)
    }

    fn labelled(labels: &[&str]) -> Dataset {
        let rows = labels
            .iter()
            .enumerate()
            .map(|(i, label)| Row::new().with("id", i as i64).with("label", *label))
            .collect();
        Dataset::from_rows(vec!["id".to_string(), "label".to_string()], rows)
    }

    fn imbalanced() -> Dataset {
        let mut labels = vec!["A"; 80];
        labels.extend(vec!["B"; 20]);
        labelled(&labels)
    }

    fn options(stratify: Option<&str>, test_size: f64, val_size: f64, seed: i64) -> SplitOptions {
        SplitOptions {
            stratify: stratify.map(str::to_string),
            test_size,
            val_size,
            seed,
        }
    }

    struct Reverse;

    impl Shuffle for Reverse {
        fn shuffle(&mut self, indices: &mut [usize]) {
            indices.reverse();
        }
    }

    struct KeepOrder;

    impl Shuffle for KeepOrder {
        fn shuffle(&mut self, _indices: &mut [usize]) {}
    }

    fn class_fraction(ds: &Dataset, idx: &[usize], class: &str) -> f64 {
        let hits = idx.iter().filter(|&&i| ds.label(i, "label") == class).count();
        hits as f64 / idx.len() as f64
    }

    #[test]
    fn test_subsets_are_disjoint_and_complete() {
        let ds = numbered(257);
        let parts = Partitioner::new()
            .partition_indices(&ds, &SplitOptions::default())
            .unwrap();

        let train: HashSet<_> = parts.train.iter().copied().collect();
        let val: HashSet<_> = parts.val.iter().copied().collect();
        let test: HashSet<_> = parts.test.iter().copied().collect();
        assert!(train.is_disjoint(&val));
        assert!(train.is_disjoint(&test));
        assert!(val.is_disjoint(&test));

        let mut all: Vec<usize> = parts
            .train
            .iter()
            .chain(&parts.val)
            .chain(&parts.test)
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..257).collect::<Vec<_>>());
    }

    #[test]
    fn test_duplicate_rows_are_kept_as_distinct_entries() {
        let rows = vec![Row::new().with("x", 1i64); 10];
        let ds = Dataset::from_rows(vec!["x".to_string()], rows);
        let parts = partition(&ds, None, 0.2, 0.5, None).unwrap();
        assert_eq!(parts.train.len() + parts.val.len() + parts.test.len(), 10);
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let ds = labelled(&["a", "b", "a", "b", "a", "b", "a", "b", "a", "b"]);
        for stratify in [None, Some("label")] {
            let opts = options(stratify, 0.4, 0.5, 7);
            let first = Partitioner::new().partition(&ds, &opts).unwrap();
            let second = Partitioner::new().partition(&ds, &opts).unwrap();
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_seed_changes_assignment() {
        let ds = numbered(100);
        let sorted_train = |seed| {
            let mut train = Partitioner::new()
                .partition_indices(&ds, &options(None, 0.2, 0.5, seed))
                .unwrap()
                .train;
            train.sort_unstable();
            train
        };
        assert_ne!(sorted_train(1), sorted_train(2));
    }

    #[test]
    fn test_negative_seed_accepted() {
        let ds = numbered(20);
        let parts = partition(&ds, None, 0.2, 0.5, Some(-42)).unwrap();
        assert_eq!(parts.train.len(), 16);
    }

    #[test]
    fn test_proportions_follow_two_stage_rounding() {
        let parts = Partitioner::new()
            .partition_indices(&numbered(1000), &SplitOptions::default())
            .unwrap();
        assert_eq!(parts.train.len(), 800);
        assert_eq!(parts.val.len(), 100);
        assert_eq!(parts.test.len(), 100);

        // 101 rows: holdout = round(20.2) = 20, validation = round(10.0) = 10
        let parts = Partitioner::new()
            .partition_indices(&numbered(101), &SplitOptions::default())
            .unwrap();
        assert_eq!(parts.train.len(), 81);
        assert_eq!(parts.val.len(), 10);
        assert_eq!(parts.test.len(), 10);
    }

    #[test]
    fn test_val_size_is_fraction_of_holdout() {
        // holdout = 50 rows, validation = 0.2 of that
        let parts = Partitioner::new()
            .partition_indices(&numbered(100), &options(None, 0.5, 0.2, 42))
            .unwrap();
        assert_eq!(parts.train.len(), 50);
        assert_eq!(parts.val.len(), 10);
        assert_eq!(parts.test.len(), 40);
    }

    #[test]
    fn test_minimal_dataset_splits_two_one_one() {
        let parts = partition(&numbered(4), None, 0.5, 0.5, Some(42)).unwrap();
        assert_eq!(parts.train.len(), 2);
        assert_eq!(parts.val.len(), 1);
        assert_eq!(parts.test.len(), 1);
    }

    #[test]
    fn test_golden_split_with_fixed_permutation() {
        let parts = Partitioner::with_source(|_| Reverse)
            .partition_indices(&numbered(4), &options(None, 0.5, 0.5, 42))
            .unwrap();
        assert_eq!(parts.train, vec![3, 2]);
        assert_eq!(parts.val, vec![1]);
        assert_eq!(parts.test, vec![0]);
    }

    #[test]
    fn test_golden_stratified_split_with_fixed_permutation() {
        let ds = labelled(&["a", "b", "a", "b", "a", "b", "a", "b"]);
        let parts = Partitioner::with_source(|_| KeepOrder)
            .partition_indices(&ds, &options(Some("label"), 0.5, 0.5, 42))
            .unwrap();
        assert_eq!(parts.train, vec![0, 2, 1, 3]);
        assert_eq!(parts.val, vec![6, 7]);
        assert_eq!(parts.test, vec![4, 5]);
    }

    #[test]
    fn test_stratification_preserves_class_ratio() {
        let ds = imbalanced();
        let parts = Partitioner::new()
            .partition_indices(&ds, &options(Some("label"), 0.2, 0.5, 42))
            .unwrap();

        assert_eq!(parts.train.len(), 80);
        assert_eq!(parts.val.len(), 10);
        assert_eq!(parts.test.len(), 10);
        for subset in [&parts.train, &parts.val, &parts.test] {
            assert!((class_fraction(&ds, subset, "A") - 0.8).abs() < 1e-9);
        }
    }

    #[test]
    fn test_stratified_ratio_within_one_row_per_group() {
        let mut labels = vec!["x"; 37];
        labels.extend(vec!["y"; 23]);
        labels.extend(vec!["z"; 11]);
        let ds = labelled(&labels);
        let parts = Partitioner::new()
            .partition_indices(&ds, &options(Some("label"), 0.3, 0.5, 3))
            .unwrap();

        let holdout: Vec<usize> = parts.val.iter().chain(&parts.test).copied().collect();
        for (class, total) in [("x", 37.0), ("y", 23.0), ("z", 11.0)] {
            let held = holdout.iter().filter(|&&i| ds.label(i, "label") == class).count();
            assert!((held as f64 - total * 0.3).abs() <= 1.0, "{class}: {held}");
        }
    }

    #[test]
    fn test_missing_labels_form_their_own_group() {
        let rows = (0..10)
            .map(|i| {
                let label = if i % 2 == 0 { Value::Null } else { Value::from("a") };
                Row::new().with("label", label)
            })
            .collect();
        let ds = Dataset::from_rows(vec!["label".to_string()], rows);
        let parts = Partitioner::new()
            .partition_indices(&ds, &options(Some("label"), 0.4, 0.5, 1))
            .unwrap();
        assert_eq!(parts.train.len(), 6);
        assert_eq!(parts.val.len() + parts.test.len(), 4);
    }

    #[test]
    fn test_empty_dataset_rejected() {
        let err = partition(&numbered(0), None, 0.2, 0.5, None).unwrap_err();
        assert_eq!(err, SplitError::EmptyDataset);
        assert_eq!(err.kind(), ErrorKind::EmptyDataset);
    }

    #[test]
    fn test_unknown_stratify_column_rejected() {
        let err = partition(&numbered(10), Some("label"), 0.2, 0.5, None).unwrap_err();
        assert_eq!(
            err,
            SplitError::UnknownColumn {
                column: "label".to_string()
            }
        );
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_invalid_proportions_rejected() {
        let ds = numbered(10);
        for (test_size, val_size, parameter) in [
            (0.0, 0.5, "test_size"),
            (1.0, 0.5, "test_size"),
            (-0.2, 0.5, "test_size"),
            (f64::NAN, 0.5, "test_size"),
            (0.2, 0.0, "val_size"),
            (0.2, 1.5, "val_size"),
        ] {
            let err = partition(&ds, None, test_size, val_size, None).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Configuration);
            assert!(
                matches!(err, SplitError::InvalidProportion { parameter: p, .. } if p == parameter)
            );
        }
    }

    #[test]
    fn test_single_member_label_rejected() {
        let ds = labelled(&["a", "a", "a", "a", "a", "b"]);
        let err = partition(&ds, Some("label"), 0.2, 0.5, None).unwrap_err();
        assert_eq!(
            err,
            SplitError::TooFewMembers {
                column: "label".to_string(),
                label: "b".to_string(),
                count: 1,
            }
        );
        assert_eq!(err.kind(), ErrorKind::Stratification);
    }

    #[test]
    fn test_group_too_small_for_second_split_rejected() {
        // "b" sends one row to the holdout, which then cannot be split again
        let ds = labelled(&["a", "a", "a", "a", "a", "a", "a", "a", "a", "a", "b", "b", "b"]);
        let err = partition(&ds, Some("label"), 0.2, 0.5, None).unwrap_err();
        assert!(matches!(err, SplitError::TooFewMembers { ref label, count: 1, .. } if label == "b"));
    }

    #[test]
    fn test_single_row_leaves_holdout_empty() {
        let parts = partition(&numbered(1), None, 0.2, 0.5, None).unwrap();
        assert_eq!(parts.train.len(), 1);
        assert!(parts.val.is_empty());
        assert!(parts.test.is_empty());
    }
}
