use anyhow::Result;
use arrow::array::*;
use arrow::compute::cast;
use arrow::datatypes::*;
use arrow::record_batch::RecordBatch;
use parquet::arrow::{ArrowReader, ArrowWriter, ParquetFileArrowReader};
use parquet::file::properties::WriterProperties;
use parquet::file::reader::SerializedFileReader;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use super::DatasetError;
use crate::dataset::{Dataset, Row, Value};

const READ_BATCH_SIZE: usize = 64 * 1024;

pub fn read_parquet(path: &Path) -> Result<Dataset> {
    let file = File::open(path)?;
    let file_reader = Arc::new(SerializedFileReader::new(file)?);
    let mut arrow_reader = ParquetFileArrowReader::new(file_reader);

    let schema = arrow_reader.get_schema()?;
    let columns = schema.fields().iter().map(|f| f.name().clone()).collect();
    let mut dataset = Dataset::new(columns);

    let reader_iter = ArrowReader::get_record_reader(&mut arrow_reader, READ_BATCH_SIZE)?;
    for batch in reader_iter {
        for row in batch_to_rows(&batch?)? {
            dataset.push(row);
        }
    }

    Ok(dataset)
}

pub fn write_parquet(dataset: &Dataset, path: &Path) -> Result<()> {
    let batch = dataset_to_batch(dataset)?;

    let file = File::create(path)?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(())
}

/// Convert a RecordBatch to a vector of Rows
fn batch_to_rows(batch: &RecordBatch) -> Result<Vec<Row>> {
    let schema = batch.schema();
    let columns = batch
        .columns()
        .iter()
        .zip(schema.fields())
        .map(|(array, field)| widen(array, field.name()))
        .collect::<Result<Vec<_>>>()?;
    let mut rows = Vec::with_capacity(batch.num_rows());

    for row_idx in 0..batch.num_rows() {
        let mut row = Row::new();
        for (field, column) in schema.fields().iter().zip(&columns) {
            let value = extract_value(column, row_idx, field.name())?;
            row.insert(field.name().clone(), value);
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Widen narrow numeric columns to the 64-bit types rows hold.
/// Columns with no lossless row form (dates, timestamps, nested, UInt64)
/// are rejected rather than read as nulls.
fn widen(array: &ArrayRef, column: &str) -> Result<ArrayRef> {
    let target = match array.data_type() {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32 => DataType::Int64,
        DataType::Float32 => DataType::Float64,
        DataType::Utf8
        | DataType::LargeUtf8
        | DataType::Float64
        | DataType::Int64
        | DataType::Boolean => return Ok(array.clone()),
        other => return Err(unsupported(column, other)),
    };
    Ok(cast(array, &target)?)
}

/// Build a single RecordBatch holding every row of the dataset.
/// Each column takes the type of its first non-null value.
fn dataset_to_batch(dataset: &Dataset) -> Result<RecordBatch> {
    let mut fields = Vec::with_capacity(dataset.columns().len());
    let mut columns = Vec::with_capacity(dataset.columns().len());

    for name in dataset.columns() {
        let data_type = infer_data_type(dataset.rows(), name);
        columns.push(build_array(dataset.rows(), name, &data_type)?);
        fields.push(Field::new(name, data_type, true));
    }

    RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)
        .map_err(|e| anyhow::anyhow!("Failed to create RecordBatch: {}", e))
}

fn infer_data_type(rows: &[Row], column: &str) -> DataType {
    let first = rows
        .iter()
        .filter_map(|row| row.get(column))
        .find(|value| !value.is_null());

    match first {
        Some(Value::Float64(_)) => DataType::Float64,
        Some(Value::Int64(_)) => DataType::Int64,
        Some(Value::Bool(_)) => DataType::Boolean,
        _ => DataType::Utf8,
    }
}

/// Extract a value from an Arrow array at a specific row index
fn extract_value(array: &ArrayRef, row_idx: usize, column: &str) -> Result<Value> {
    if !array.is_valid(row_idx) {
        return Ok(Value::Null);
    }

    match array.data_type() {
        DataType::Utf8 => {
            let string_array = array
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| anyhow::anyhow!("Expected StringArray"))?;
            Ok(Value::String(string_array.value(row_idx).to_string()))
        }
        DataType::LargeUtf8 => {
            let string_array = array
                .as_any()
                .downcast_ref::<LargeStringArray>()
                .ok_or_else(|| anyhow::anyhow!("Expected LargeStringArray"))?;
            Ok(Value::String(string_array.value(row_idx).to_string()))
        }
        DataType::Float64 => {
            let float_array = array
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| anyhow::anyhow!("Expected Float64Array"))?;
            Ok(Value::Float64(float_array.value(row_idx)))
        }
        DataType::Int64 => {
            let int_array = array
                .as_any()
                .downcast_ref::<Int64Array>()
                .ok_or_else(|| anyhow::anyhow!("Expected Int64Array"))?;
            Ok(Value::Int64(int_array.value(row_idx)))
        }
        DataType::Boolean => {
            let bool_array = array
                .as_any()
                .downcast_ref::<BooleanArray>()
                .ok_or_else(|| anyhow::anyhow!("Expected BooleanArray"))?;
            Ok(Value::Bool(bool_array.value(row_idx)))
        }
        other => Err(unsupported(column, other)),
    }
}

/// Build an Arrow array from rows for a specific column
fn build_array(rows: &[Row], column: &str, data_type: &DataType) -> Result<ArrayRef> {
    match data_type {
        DataType::Utf8 => {
            let values: Vec<Option<String>> = rows
                .iter()
                .map(|row| row.get_string(column).map(|s| s.to_string()))
                .collect();
            Ok(Arc::new(StringArray::from_iter(values)))
        }
        DataType::Float64 => {
            let values: Vec<Option<f64>> = rows.iter().map(|row| row.get_f64(column)).collect();
            Ok(Arc::new(Float64Array::from_iter(values)))
        }
        DataType::Int64 => {
            let values: Vec<Option<i64>> = rows.iter().map(|row| row.get_i64(column)).collect();
            Ok(Arc::new(Int64Array::from_iter(values)))
        }
        DataType::Boolean => {
            let values: Vec<Option<bool>> = rows.iter().map(|row| row.get_bool(column)).collect();
            Ok(Arc::new(BooleanArray::from_iter(values)))
        }
        other => Err(unsupported(column, other)),
    }
}

fn unsupported(column: &str, data_type: &DataType) -> anyhow::Error {
    DatasetError::UnsupportedType {
        column: column.to_string(),
        data_type: format!("{:?}", data_type),
    }
    .into()
}
