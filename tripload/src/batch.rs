//! Bounded slices of tabular rows.

use std::fmt;

use arrow::{
    array::ArrayRef,
    datatypes::{DataType, SchemaRef},
    record_batch::RecordBatch,
};

use crate::common::*;

/// The maximum number of rows we put in a single batch.
pub const BATCH_SIZE: usize = 100_000;

/// An ordered run of rows, stored as named, typed columns.
///
/// Every reader produces this same shape, whether the source file was
/// Parquet or CSV, so downstream code never needs to know where rows came
/// from. Batches own their data and never refer to each other.
#[derive(Clone, PartialEq)]
pub struct RowBatch {
    data: RecordBatch,
}

impl RowBatch {
    /// Wrap an Arrow record batch.
    pub fn new(data: RecordBatch) -> Self {
        RowBatch { data }
    }

    /// How many rows are in this batch?
    pub fn num_rows(&self) -> usize {
        self.data.num_rows()
    }

    /// The column names and types.
    pub fn schema(&self) -> SchemaRef {
        self.data.schema()
    }

    /// Iterate over `(name, type)` pairs, in column order.
    pub fn column_types(&self) -> impl Iterator<Item = (&str, &DataType)> + '_ {
        self.data
            .schema_ref()
            .fields()
            .iter()
            .map(|field| (field.name().as_str(), field.data_type()))
    }

    /// The column values, in column order.
    pub fn columns(&self) -> &[ArrayRef] {
        self.data.columns()
    }

    /// The underlying Arrow data.
    pub fn as_record_batch(&self) -> &RecordBatch {
        &self.data
    }

    /// Convert into the underlying Arrow data.
    pub fn into_record_batch(self) -> RecordBatch {
        self.data
    }
}

impl From<RecordBatch> for RowBatch {
    fn from(data: RecordBatch) -> Self {
        RowBatch::new(data)
    }
}

impl fmt::Debug for RowBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowBatch")
            .field("num_rows", &self.num_rows())
            .field("schema", &self.data.schema_ref())
            .finish()
    }
}

/// Split an in-memory table into consecutive batches of at most
/// `batch_size` rows. Only the last batch may be short, and an empty table
/// produces no batches at all.
///
/// Slicing is zero-copy: each batch shares buffers with `table`.
pub fn split_into_batches(table: &RecordBatch, batch_size: usize) -> Result<Vec<RowBatch>> {
    check_batch_size(batch_size)?;
    let len = table.num_rows();
    let batches = (0..len)
        .step_by(batch_size)
        .map(|offset| RowBatch::new(table.slice(offset, batch_size.min(len - offset))))
        .collect();
    Ok(batches)
}

/// Refuse batch sizes that would never make progress.
pub(crate) fn check_batch_size(batch_size: usize) -> Result<()> {
    if batch_size == 0 {
        Err(format_err!("batch size must be greater than zero"))
    } else {
        Ok(())
    }
}

/// Glue the rows of several batches back together, in order. Used to check
/// that batching neither loses nor reorders anything.
pub fn concat_batches(schema: &SchemaRef, batches: &[RowBatch]) -> Result<RecordBatch> {
    let record_batches = batches.iter().map(RowBatch::as_record_batch);
    Ok(arrow::compute::concat_batches(schema, record_batches)?)
}

/// A small two-column table with `num_rows` rows, for tests.
#[cfg(test)]
pub(crate) fn test_table(num_rows: usize) -> RecordBatch {
    use std::sync::Arc;

    use arrow::{
        array::{Int64Array, StringArray},
        datatypes::{Field, Schema},
    };
    let schema = Arc::new(Schema::new(vec![
        Field::new("trip_id", DataType::Int64, false),
        Field::new("store_and_fwd_flag", DataType::Utf8, true),
    ]));
    let ids = Int64Array::from_iter_values(0..num_rows as i64);
    let flags = StringArray::from_iter_values((0..num_rows).map(|i| {
        if i % 2 == 0 {
            "N"
        } else {
            "Y"
        }
    }));
    RecordBatch::try_new(schema, vec![Arc::new(ids), Arc::new(flags)]).unwrap()
}
