//! Parquet input.

use std::fs::File;

use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::BatchIter;
use crate::batch::split_into_batches;
use crate::common::*;

/// Read every row group of a Parquet file into a single in-memory table.
pub fn read_parquet_table(path: &Path) -> Result<RecordBatch> {
    let file =
        File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("cannot read Parquet metadata from {}", path.display()))?;
    let schema = builder.schema().clone();
    trace!("Parquet schema: {:?}", schema);
    let reader = builder.build()?;
    let parts = reader
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("error reading {}", path.display()))?;
    Ok(arrow::compute::concat_batches(&schema, &parts)?)
}

/// Load a Parquet file and slice it into batches of at most `batch_size` rows.
pub fn parquet_batches(path: &Path, batch_size: usize) -> Result<BatchIter> {
    let table = read_parquet_table(path)?;
    debug!("read {} rows from {}", table.num_rows(), path.display());
    let batches = split_into_batches(&table, batch_size)?;
    Ok(Box::new(batches.into_iter().map(Ok)))
}

#[cfg(test)]
pub(crate) fn write_test_parquet(path: &Path, table: &RecordBatch) {
    use parquet::{arrow::ArrowWriter, file::properties::WriterProperties};

    let file = File::create(path).unwrap();
    // Use several small row groups, so reading has to stitch them together.
    let props = WriterProperties::builder()
        .set_max_row_group_size(7_000)
        .build();
    let mut wtr = ArrowWriter::try_new(file, table.schema(), Some(props)).unwrap();
    wtr.write(table).unwrap();
    wtr.close().unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{concat_batches, test_table};

    #[test]
    fn parquet_is_batched_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.parquet");
        let table = test_table(25_000);
        write_test_parquet(&path, &table);

        let batches = parquet_batches(&path, 10_000)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        let sizes = batches.iter().map(RowBatch::num_rows).collect::<Vec<_>>();
        assert_eq!(sizes, vec![10_000, 10_000, 5_000]);
        assert_eq!(concat_batches(&table.schema(), &batches).unwrap(), table);
    }

    #[test]
    fn garbage_is_not_parquet() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.parquet");
        std::fs::write(&path, b"<html>Access Denied</html>").unwrap();
        assert!(parquet_batches(&path, 10).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_parquet_table(&dir.path().join("nope.parquet")).is_err());
    }
}
