use anyhow::{Context, Result};
use csv::{ReaderBuilder, StringRecord, Writer};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::dataset::{Dataset, Row, Value};

/// Type shared by every non-empty cell of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int64,
    Float64,
    Bool,
    String,
}

pub fn read_csv(path: &Path) -> Result<Dataset> {
    let file = File::open(path).with_context(|| format!("Failed to open file: {:?}", path))?;
    read_csv_from(file)
}

/// Parse CSV with a header row. Column types are inferred from the data;
/// empty cells become [`Value::Null`].
pub fn read_csv_from<R: Read>(reader: R) -> Result<Dataset> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);

    let columns: Vec<String> = reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .map(str::to_string)
        .collect();

    let mut records: Vec<StringRecord> = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        // +2: 1-based, header on line 1
        records.push(record.with_context(|| format!("Failed to parse CSV record {}", idx + 2))?);
    }

    let kinds: Vec<ColumnKind> = (0..columns.len())
        .map(|col| infer_kind(records.iter().filter_map(|r| r.get(col))))
        .collect();

    let mut dataset = Dataset::new(columns.clone());
    for record in &records {
        let mut row = Row::new();
        for (col, (name, kind)) in columns.iter().zip(&kinds).enumerate() {
            row.insert(name.clone(), parse_cell(record.get(col).unwrap_or(""), *kind));
        }
        dataset.push(row);
    }

    Ok(dataset)
}

pub fn write_csv(dataset: &Dataset, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create file: {:?}", path))?;
    write_csv_to(dataset, file)
}

pub fn write_csv_to<W: Write>(dataset: &Dataset, writer: W) -> Result<()> {
    let mut writer = Writer::from_writer(writer);
    writer.write_record(dataset.columns())?;

    for row in dataset.rows() {
        writer.write_record(
            dataset
                .columns()
                .iter()
                .map(|column| row.get(column).map(Value::render).unwrap_or_default()),
        )?;
    }

    writer.flush()?;
    Ok(())
}

fn infer_kind<'a>(cells: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut seen = false;
    let (mut int, mut float, mut boolean) = (true, true, true);

    for cell in cells.filter(|c| !c.is_empty()) {
        seen = true;
        int &= cell.parse::<i64>().is_ok();
        float &= cell.parse::<f64>().is_ok();
        boolean &= parse_bool(cell).is_some();
        if !(int || float || boolean) {
            break;
        }
    }

    match (seen, int, float, boolean) {
        (false, ..) => ColumnKind::String,
        (_, true, _, _) => ColumnKind::Int64,
        (_, _, true, _) => ColumnKind::Float64,
        (_, _, _, true) => ColumnKind::Bool,
        _ => ColumnKind::String,
    }
}

fn parse_bool(cell: &str) -> Option<bool> {
    if cell.eq_ignore_ascii_case("true") {
        Some(true)
    } else if cell.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_cell(cell: &str, kind: ColumnKind) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    let parsed = match kind {
        ColumnKind::Int64 => cell.parse().ok().map(Value::Int64),
        ColumnKind::Float64 => cell.parse().ok().map(Value::Float64),
        ColumnKind::Bool => parse_bool(cell).map(Value::Bool),
        ColumnKind::String => None,
    };
    parsed.unwrap_or_else(|| Value::String(cell.to_string()))
}
