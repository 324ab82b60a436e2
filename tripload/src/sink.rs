//! Where pipeline output goes.

use crate::common::*;

/// An object store we can copy whole files into.
#[async_trait]
pub trait BlobSink: Send + Sync {
    /// Upload the file at `local` as the object `key`, replacing any existing
    /// object with that name.
    async fn upload(&self, local: &Path, key: &str) -> Result<()>;

    /// List the names of all objects starting with `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// A database table we can append rows to.
///
/// Appends are not idempotent. Appending the same batch twice stores its rows
/// twice.
#[async_trait]
pub trait TableSink: Send {
    /// Append the rows of `batch`, creating the table from the batch's columns
    /// if it does not exist yet.
    async fn append_batch(&mut self, batch: &RowBatch) -> Result<()>;
}
