//! Downloading remote files into a staging directory.

use tokio::{
    fs::{self, File},
    io::{AsyncWriteExt, BufWriter},
};

use crate::common::*;
use crate::tls::install_crypto_provider;

/// We write downloads to disk in chunks of this size.
pub const DOWNLOAD_CHUNK_SIZE: usize = 8 * 1024;

/// Something that can copy a remote file to a local path.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Download `url` to `dest`, creating or overwriting it, and return the
    /// number of bytes written.
    ///
    /// On failure, `dest` does not exist afterwards, even if it existed
    /// before the call.
    async fn fetch(&self, url: &Url, dest: &Path) -> Result<u64>;
}

/// A [`Fetcher`] which uses plain HTTP(S) `GET` requests.
///
/// There is deliberately no timeout and no retry.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a new fetcher.
    pub fn new() -> Self {
        install_crypto_provider();
        HttpFetcher {
            client: reqwest::Client::new(),
        }
    }

    /// The body of `fetch`, without cleanup on error.
    async fn fetch_helper(&self, url: &Url, dest: &Path) -> Result<u64> {
        let resp = self
            .client
            .get(url.as_str())
            .send()
            .await
            .with_context(|| format!("could not GET {}", url))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(format_err!("GET {} returned {}", url, status));
        }

        let file = File::create(dest)
            .await
            .with_context(|| format!("cannot create {}", dest.display()))?;
        let mut wtr = BufWriter::with_capacity(DOWNLOAD_CHUNK_SIZE, file);
        let mut stream = resp.bytes_stream();
        let mut written = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk =
                chunk.with_context(|| format!("error reading body of {}", url))?;
            wtr.write_all(&chunk)
                .await
                .with_context(|| format!("error writing to {}", dest.display()))?;
            written += chunk.len() as u64;
        }
        wtr.flush()
            .await
            .with_context(|| format!("error writing to {}", dest.display()))?;
        Ok(written)
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self), fields(url = %url))]
    async fn fetch(&self, url: &Url, dest: &Path) -> Result<u64> {
        match self.fetch_helper(url, dest).await {
            Ok(written) => {
                debug!("downloaded {} bytes to {}", written, dest.display());
                Ok(written)
            }
            Err(err) => {
                // This also removes any older file at `dest`.
                if fs::remove_file(dest).await.is_ok() {
                    trace!("removed {} after failed download", dest.display());
                }
                Err(err)
            }
        }
    }
}
