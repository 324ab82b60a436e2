//! Ingest: load one remote file into a database table, batch by batch.

use std::{io::Write, time::Instant};

use tokio::fs;

use crate::common::*;
use crate::fetch::Fetcher;
use crate::normalize::normalize_timestamps;
use crate::readers::open_batches;
use crate::sink::TableSink;

/// What happened during an ingest run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestSummary {
    /// The number of rows in each appended batch, in order.
    pub batch_rows: Vec<usize>,
}

impl IngestSummary {
    /// The total number of rows appended.
    pub fn total_rows(&self) -> usize {
        self.batch_rows.iter().sum()
    }
}

/// Download `source` into `staging_dir`, then append it to `table_sink` in
/// batches of at most `batch_size` rows.
///
/// Any failure ends the run. Batches appended before the failure stay
/// appended. The staged file is left in place afterwards.
#[instrument(level = "debug", skip_all, fields(url = %source.url(), table = %source.destination()))]
pub async fn run_ingest<W>(
    source: &SourceDescriptor,
    fetcher: &dyn Fetcher,
    table_sink: &mut dyn TableSink,
    staging_dir: &Path,
    batch_size: usize,
    out: &mut W,
) -> Result<IngestSummary>
where
    W: Write + Send,
{
    fs::create_dir_all(staging_dir)
        .await
        .with_context(|| format!("cannot create directory {}", staging_dir.display()))?;
    let local_path = staging_dir.join(source.file_name());

    writeln!(out, "Downloading {}...", source.url())?;
    let written = fetcher
        .fetch(source.url(), &local_path)
        .await
        .with_context(|| format!("could not download {}", source.url()))?;
    debug!("staged {} bytes at {}", written, local_path.display());

    writeln!(out, "Processing {}...", source.file_name())?;
    let batches = open_batches(&local_path, source.format(), batch_size)?;

    let mut summary = IngestSummary::default();
    for (idx, batch) in batches.enumerate() {
        let batch = batch?;
        let start = Instant::now();
        let batch = normalize_timestamps(batch)
            .with_context(|| format!("could not normalize chunk {}", idx + 1))?;
        table_sink
            .append_batch(&batch)
            .await
            .with_context(|| format!("could not insert chunk {}", idx + 1))?;
        summary.batch_rows.push(batch.num_rows());
        writeln!(
            out,
            "Inserted chunk {}, took {:.3} second",
            idx + 1,
            start.elapsed().as_secs_f64(),
        )?;
    }

    writeln!(out, "Finished ingesting data into the postgres database")?;
    Ok(summary)
}
