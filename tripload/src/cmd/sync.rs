//! The `sync` subcommand.

use std::io;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tripload::{
    drivers::gs::GcsBlobSink, pipelines::run_archive_sync, ArchiveConfig,
    Configuration, HttpFetcher,
};

/// Archive sync arguments. Everything else comes from `tripload.toml`.
#[derive(Debug, Parser)]
pub(crate) struct Opt {}

/// Download every configured month and upload it to Cloud Storage.
pub(crate) async fn run(_opt: Opt) -> Result<()> {
    let config = Configuration::try_default()?;
    let archive = ArchiveConfig::from_configuration(&config)?;
    debug!("archive settings: {:?}", archive);

    let fetcher = HttpFetcher::new();
    let blob_sink = GcsBlobSink::new(&archive.bucket, archive.project.as_deref())?;
    let mut out = io::stdout();
    run_archive_sync(&archive, &fetcher, &blob_sink, &mut out).await?;
    Ok(())
}
