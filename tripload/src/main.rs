//! Command-line tools for archiving taxi-trip files to Google Cloud Storage
//! and loading them into PostgreSQL.

#![warn(rust_2018_idioms, unused_extern_crates, clippy::all)]

use std::process;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tripload::{run_futures_with_runtime, tls::install_crypto_provider, Context};

mod cmd;
mod logging;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {:?}", err);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let opt = cmd::Opt::parse();
    opt.log_format.install()?;
    install_crypto_provider();
    debug!("running {}", opt.cmd.name());

    let (ctx, worker_future) = Context::create();
    let cmd_future = cmd::run(ctx, opt);
    run_futures_with_runtime(cmd_future, worker_future)
}
