//! In-memory stand-ins for our network and database edges.

use std::{collections::HashMap, sync::Mutex};

use crate::common::*;
use crate::{BlobSink, Fetcher, TableSink};

/// A [`Fetcher`] which serves canned bodies, and fails for any other URL.
#[derive(Default)]
pub(crate) struct FakeFetcher {
    bodies: HashMap<String, Vec<u8>>,
}

impl FakeFetcher {
    /// Serve `body` for `url`.
    pub(crate) fn serve(mut self, url: &str, body: Vec<u8>) -> Self {
        self.bodies.insert(url.to_owned(), body);
        self
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, url: &Url, dest: &Path) -> Result<u64> {
        let body = self
            .bodies
            .get(url.as_str())
            .ok_or_else(|| format_err!("GET {} returned 404 Not Found", url))?;
        tokio::fs::write(dest, body).await?;
        Ok(body.len() as u64)
    }
}

/// A [`BlobSink`] which remembers what was uploaded.
#[derive(Default)]
pub(crate) struct FakeBlobSink {
    /// Keys which refuse uploads.
    pub(crate) reject: Vec<String>,
    /// Fail listings.
    pub(crate) fail_list: bool,
    /// Uploaded keys and the size of the file at upload time.
    pub(crate) uploaded: Mutex<Vec<(String, u64)>>,
}

#[async_trait]
impl BlobSink for FakeBlobSink {
    async fn upload(&self, local: &Path, key: &str) -> Result<()> {
        if self.reject.iter().any(|k| k == key) {
            return Err(format_err!("403 Permission denied"));
        }
        let len = tokio::fs::metadata(local).await?.len();
        self.uploaded
            .lock()
            .map_err(|_| format_err!("lock poisoned"))?
            .push((key.to_owned(), len));
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        if self.fail_list {
            return Err(format_err!("could not list objects"));
        }
        let uploaded = self
            .uploaded
            .lock()
            .map_err(|_| format_err!("lock poisoned"))?;
        Ok(uploaded
            .iter()
            .map(|(key, _)| key.clone())
            .filter(|key| key.starts_with(prefix))
            .collect())
    }
}

/// A [`TableSink`] which keeps every appended batch, in order.
#[derive(Default)]
pub(crate) struct MemoryTableSink {
    pub(crate) batches: Vec<RowBatch>,
}

impl MemoryTableSink {
    pub(crate) fn total_rows(&self) -> usize {
        self.batches.iter().map(RowBatch::num_rows).sum()
    }
}

#[async_trait]
impl TableSink for MemoryTableSink {
    async fn append_batch(&mut self, batch: &RowBatch) -> Result<()> {
        self.batches.push(batch.clone());
        Ok(())
    }
}
