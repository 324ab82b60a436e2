//! Run drivers, which sequence fetching, batching and sinking.
//!
//! Each driver writes its human-readable progress report to an `out` writer
//! (standard output, in the CLI). Diagnostics go to `tracing` as usual.

pub mod archive;
pub mod ingest;

#[cfg(test)]
mod fakes;

pub use self::archive::{run_archive_sync, RunSummary};
pub use self::ingest::{run_ingest, IngestSummary};
