//! Command parsing.

use clap::Parser;
use futures::FutureExt;
use tripload::Context;

use crate::logging::LogFormat;

pub(crate) mod config;
pub(crate) mod ingest;
pub(crate) mod sync;

/// A boxed command future.
pub(crate) type BoxFuture<T> = futures::future::BoxFuture<'static, anyhow::Result<T>>;

/// Command-line options, parsed using `clap`.
#[derive(Debug, Parser)]
#[clap(
    name = "tripload",
    version,
    about = "Archive taxi-trip files to Cloud Storage, or load them into PostgreSQL."
)]
pub(crate) struct Opt {
    /// Log format for standard error: indented, flat or json.
    #[clap(long = "log-format", global = true, default_value = "indented")]
    pub(crate) log_format: LogFormat,

    /// The command to run.
    #[clap(subcommand)]
    pub(crate) cmd: Command,
}

/// The command to run.
#[derive(Debug, Parser)]
pub(crate) enum Command {
    /// Update configuration.
    #[clap(name = "config")]
    Config {
        #[clap(flatten)]
        command: config::Opt,
    },

    /// Download one file and append it to a PostgreSQL table.
    #[clap(name = "ingest")]
    #[clap(after_help = r#"EXAMPLE:
    tripload ingest --user root --password root --host localhost --port 5432 \
        --db ny_taxi --table_name yellow_taxi_trips \
        --url https://example.com/yellow_tripdata_2021-01.csv.gz
"#)]
    Ingest {
        #[clap(flatten)]
        command: ingest::Opt,
    },

    /// Copy each month's trip file into a Cloud Storage bucket.
    #[clap(name = "sync")]
    Sync {
        #[clap(flatten)]
        command: sync::Opt,
    },
}

impl Command {
    /// The name of this subcommand.
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Command::Config { .. } => "config",
            Command::Ingest { .. } => "ingest",
            Command::Sync { .. } => "sync",
        }
    }
}

pub(crate) fn run(ctx: Context, opt: Opt) -> BoxFuture<()> {
    match opt.cmd {
        Command::Config { command } => config::run(command).boxed(),
        Command::Ingest { command } => ingest::run(ctx, command).boxed(),
        Command::Sync { command } => sync::run(command).boxed(),
    }
}
