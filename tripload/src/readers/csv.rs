//! CSV input, optionally gzip-compressed.

use std::{
    fs::File,
    io::{BufReader, Read},
    sync::Arc,
};

use arrow::{
    csv::{reader::Format, ReaderBuilder},
    datatypes::Schema,
};
use flate2::read::MultiGzDecoder;

use super::BatchIter;
use crate::batch::check_batch_size;
use crate::common::*;

/// Open `path` for reading, decompressing it on the fly if `gzipped`.
fn open(path: &Path, gzipped: bool) -> Result<Box<dyn Read + Send>> {
    let file =
        File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let rdr = BufReader::new(file);
    if gzipped {
        Ok(Box::new(MultiGzDecoder::new(rdr)))
    } else {
        Ok(Box::new(rdr))
    }
}

/// Work out column names and types from a CSV file with a header row.
///
/// This looks at every record, so a column which is empty for the first
/// million rows still gets the right type.
pub fn infer_csv_schema(path: &Path, gzipped: bool) -> Result<Schema> {
    let rdr = open(path, gzipped)?;
    let (schema, records) = Format::default()
        .with_header(true)
        .infer_schema(rdr, None)
        .with_context(|| format!("cannot infer CSV columns of {}", path.display()))?;
    debug!("inferred CSV schema from {} records: {:?}", records, schema);
    Ok(schema)
}

/// Stream a CSV file as batches of at most `batch_size` rows.
///
/// The file is read twice: once to infer a schema, and once to decode it.
/// Empty fields are read as NULL.
pub fn csv_batches(path: &Path, gzipped: bool, batch_size: usize) -> Result<BatchIter> {
    check_batch_size(batch_size)?;
    let schema = Arc::new(infer_csv_schema(path, gzipped)?);
    let reader = ReaderBuilder::new(schema)
        .with_header(true)
        .with_batch_size(batch_size)
        .build(open(path, gzipped)?)?;
    let display_path = path.display().to_string();
    Ok(Box::new(reader.map(move |batch| {
        let batch =
            batch.with_context(|| format!("error reading CSV from {}", display_path))?;
        Ok(RowBatch::new(batch))
    })))
}
