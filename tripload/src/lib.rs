//! Batch tools for moving monthly taxi-trip data files around.
//!
//! There are two independent pipelines here, both shaped as *fetch →
//! transform → sink* and run strictly in sequence:
//!
//! - [`pipelines::archive`] downloads one remote Parquet file per configured
//!   month and re-uploads it to a Google Cloud Storage bucket.
//! - [`pipelines::ingest`] downloads a single CSV, gzipped CSV or Parquet file
//!   and appends it to a PostgreSQL table in fixed-size [`RowBatch`]es.
//!
//! The network and database edges are capability traits ([`Fetcher`],
//! [`BlobSink`], [`TableSink`]) so the run drivers can be exercised without
//! either.

#![warn(rust_2018_idioms, unused_extern_crates, clippy::all)]

use std::result;

pub mod batch;
pub(crate) mod clouds;
pub mod config;
pub mod context;
pub mod drivers;
pub mod fetch;
pub mod normalize;
pub mod pipelines;
pub mod readers;
pub mod sink;
pub mod source;
pub mod tls;
pub(crate) mod url_with_hidden_password;

/// Standard error type for this library.
pub use anyhow::Error;

/// Standard result type for this library.
pub type Result<T, E = Error> = result::Result<T, E>;

pub use batch::RowBatch;
pub use config::{ArchiveConfig, Configuration};
pub use context::{run_futures_with_runtime, Context};
pub use fetch::{Fetcher, HttpFetcher};
pub use sink::{BlobSink, TableSink};
pub use source::{DataFormat, SourceDescriptor};

/// Definitions included by all the files in this crate.
///
/// This forms the dialect of Rust we use for implementing our pipelines, with
/// an emphasis on `tokio` and structured logging.
#[allow(unused_imports)]
pub(crate) mod common {
    pub(crate) use anyhow::{format_err, Context as _};
    pub(crate) use async_trait::async_trait;
    pub(crate) use bytes::Bytes;
    pub(crate) use futures::{
        Future, FutureExt, Stream, StreamExt, TryFutureExt, TryStreamExt,
    };
    pub(crate) use std::path::{Path, PathBuf};
    pub(crate) use tokio::sync::mpsc;
    pub(crate) use tracing::{
        debug, debug_span, error, info, instrument, trace, trace_span, warn,
        Instrument,
    };
    pub(crate) use url::Url;

    pub(crate) use crate::{
        batch::RowBatch,
        context::Context,
        source::{DataFormat, SourceDescriptor},
        url_with_hidden_password::UrlWithHiddenPassword,
        Error, Result,
    };

    /// A boxed future using our standard error type. Like `Result`, but for
    /// `async` code.
    pub(crate) type BoxFuture<T, E = Error> =
        futures::future::BoxFuture<'static, Result<T, E>>;
}
