//! Archive sync: copy each month's trip file into object storage.

use std::io::Write;

use tokio::fs;

use crate::common::*;
use crate::config::ArchiveConfig;
use crate::fetch::Fetcher;
use crate::sink::BlobSink;

/// Width of the `=` rule around the summary.
const RULE_WIDTH: usize = 60;

/// Month names for the report header.
const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// What happened during an archive run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Months which were both downloaded and uploaded.
    pub succeeded: usize,
    /// Months we attempted.
    pub total: usize,
    /// Objects found under the destination prefix afterwards.
    pub listed: Vec<String>,
}

/// Download each configured month and upload it to `blob_sink`.
///
/// A month that fails to download or upload is reported and skipped. The
/// staged copy of a month is deleted once it has been uploaded. Failing to
/// list the bucket at the end is an error.
#[instrument(level = "debug", skip_all, fields(bucket = %config.bucket))]
pub async fn run_archive_sync<W>(
    config: &ArchiveConfig,
    fetcher: &dyn Fetcher,
    blob_sink: &dyn BlobSink,
    out: &mut W,
) -> Result<RunSummary>
where
    W: Write + Send,
{
    config.validate()?;
    fs::create_dir_all(&config.staging_dir)
        .await
        .with_context(|| {
            format!("cannot create directory {}", config.staging_dir.display())
        })?;

    writeln!(
        out,
        "Loading {} Taxi data for {}{} to GCS bucket: {}\n",
        capitalize(&config.color),
        config.year,
        month_range(&config.months),
        config.bucket,
    )?;

    let mut summary = RunSummary {
        total: config.months.len(),
        ..RunSummary::default()
    };
    for month in &config.months {
        let source = SourceDescriptor::for_month(config, month)?;
        if sync_month(config, &source, fetcher, blob_sink, out).await? {
            summary.succeeded += 1;
        }
        writeln!(out)?;
    }

    let rule = "=".repeat(RULE_WIDTH);
    writeln!(out, "\n{}", rule)?;
    writeln!(
        out,
        "Summary: {}/{} files successfully uploaded to GCS",
        summary.succeeded, summary.total,
    )?;
    writeln!(out, "{}", rule)?;

    writeln!(out, "\nFiles in gs://{}/{}:", config.bucket, config.prefix)?;
    summary.listed = blob_sink.list(&config.prefix).await.with_context(|| {
        format!("could not list gs://{}/{}", config.bucket, config.prefix)
    })?;
    for name in &summary.listed {
        writeln!(out, "  - {}", name)?;
    }
    Ok(summary)
}

/// Download and upload a single month. Returns `Ok(false)` if either step
/// failed, having already reported why.
async fn sync_month<W>(
    config: &ArchiveConfig,
    source: &SourceDescriptor,
    fetcher: &dyn Fetcher,
    blob_sink: &dyn BlobSink,
    out: &mut W,
) -> Result<bool>
where
    W: Write + Send,
{
    let local_path = config.staging_dir.join(source.file_name());

    writeln!(out, "Downloading {}...", source.url())?;
    if let Err(err) = fetcher.fetch(source.url(), &local_path).await {
        warn!("download of {} failed: {:?}", source.url(), err);
        writeln!(out, "✗ Error downloading {}: {:#}", source.url(), err)?;
        writeln!(out, "Failed to download {}", source.file_name())?;
        return Ok(false);
    }
    writeln!(out, "✓ Downloaded to {}", local_path.display())?;

    let dest = format!("gs://{}/{}", config.bucket, source.destination());
    writeln!(out, "Uploading {} to {}...", local_path.display(), dest)?;
    if let Err(err) = blob_sink.upload(&local_path, source.destination()).await {
        warn!("upload to {} failed: {:?}", dest, err);
        writeln!(out, "✗ Error uploading to GCS: {:#}", err)?;
        writeln!(out, "Failed to upload {}", source.file_name())?;
        return Ok(false);
    }
    writeln!(out, "✓ Uploaded to {}", dest)?;

    fs::remove_file(&local_path)
        .await
        .with_context(|| format!("cannot remove {}", local_path.display()))?;
    Ok(true)
}

/// `yellow` becomes `Yellow`.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Describe the months we're loading, like ` (Jan-Jun)`.
fn month_range(months: &[String]) -> String {
    let name = |month: &String| {
        month
            .parse::<usize>()
            .ok()
            .and_then(|m| MONTH_ABBREVIATIONS.get(m.wrapping_sub(1)))
            .copied()
            .unwrap_or("?")
    };
    match (months.first(), months.last()) {
        (Some(first), Some(last)) if first == last => format!(" ({})", name(first)),
        (Some(first), Some(last)) => format!(" ({}-{})", name(first), name(last)),
        _ => String::new(),
    }
}
