//! Reading staged files as a sequence of [`RowBatch`]es.
//!
//! Parquet files are loaded into memory whole and then sliced. CSV files are
//! streamed, so only one batch is materialized at a time. Either way the
//! caller sees a forward-only iterator which cannot be restarted.

use crate::common::*;

mod csv;
mod parquet;

pub use self::csv::{csv_batches, infer_csv_schema};
pub use self::parquet::{parquet_batches, read_parquet_table};

#[cfg(test)]
pub(crate) use self::parquet::write_test_parquet;

/// A single-pass sequence of batches.
pub type BatchIter = Box<dyn Iterator<Item = Result<RowBatch>> + Send>;

/// Open `path` as `format`, yielding batches of at most `batch_size` rows.
#[instrument(level = "debug", skip(path), fields(path = %path.display()))]
pub fn open_batches(path: &Path, format: DataFormat, batch_size: usize) -> Result<BatchIter> {
    match format {
        DataFormat::Parquet => parquet_batches(path, batch_size),
        DataFormat::Csv => csv_batches(path, false, batch_size),
        DataFormat::CsvGz => csv_batches(path, true, batch_size),
    }
}
