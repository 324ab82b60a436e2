//! The `ingest` subcommand.

use std::{io, path::PathBuf};

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tripload::{
    batch::BATCH_SIZE,
    drivers::postgres::{PgTableSink, PostgresTarget},
    pipelines::run_ingest,
    Context, HttpFetcher, SourceDescriptor,
};
use url::Url;

/// Ingest arguments.
#[derive(Debug, Parser)]
pub(crate) struct Opt {
    /// User name for PostgreSQL.
    #[clap(long)]
    user: String,

    /// Password for PostgreSQL.
    #[clap(long)]
    password: String,

    /// Host for PostgreSQL.
    #[clap(long)]
    host: String,

    /// Port for PostgreSQL.
    #[clap(long)]
    port: u16,

    /// Database name for PostgreSQL.
    #[clap(long)]
    db: String,

    /// Name of the table to append the results to.
    #[clap(long = "table_name")]
    table_name: String,

    /// URL of the CSV, CSV.GZ or Parquet file.
    #[clap(long)]
    url: Url,

    /// Directory to download the file into before loading it.
    #[clap(long = "staging-dir", default_value = ".")]
    staging_dir: PathBuf,
}

/// Download `opt.url` and append it to the table.
pub(crate) async fn run(ctx: Context, opt: Opt) -> Result<()> {
    let target = PostgresTarget::from_parts(
        &opt.user,
        &opt.password,
        &opt.host,
        opt.port,
        &opt.db,
        &opt.table_name,
    )?;
    debug!("ingesting {} into {}", opt.url, target);
    let source = SourceDescriptor::for_url(opt.url, &opt.table_name);

    let fetcher = HttpFetcher::new();
    let mut table_sink = PgTableSink::connect(&ctx, &target).await?;
    let mut out = io::stdout();
    let summary = run_ingest(
        &source,
        &fetcher,
        &mut table_sink,
        &opt.staging_dir,
        BATCH_SIZE,
        &mut out,
    )
    .await?;
    debug!("appended {} rows", summary.total_rows());
    Ok(())
}
