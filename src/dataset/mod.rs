//! In-memory tabular dataset: ordered columns plus rows of typed values.

use std::collections::BTreeMap;

mod row;
pub use row::{Row, Value};

/// Ordered rows sharing one column set.
///
/// Row position is the row's identity: two rows holding equal values are
/// still distinct entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Dataset {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn from_rows(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Label of a row in `column`, as used for stratification
    pub fn label(&self, index: usize, column: &str) -> String {
        self.rows[index]
            .get(column)
            .map(Value::render)
            .unwrap_or_default()
    }

    /// Build a new dataset from the rows at `indices`, in that order
    pub fn select(&self, indices: &[usize]) -> Dataset {
        Dataset {
            columns: self.columns.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Number of rows per distinct label of `column`
    pub fn label_counts(&self, column: &str) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for idx in 0..self.rows.len() {
            *counts.entry(self.label(idx, column)).or_insert(0) += 1;
        }
        counts
    }
}
