//! Copying files into Google Cloud Storage.

use crate::clouds::gcloud::{
    storage::{self, StorageObject},
    Client, ClientError,
};
use crate::common::*;
use crate::sink::BlobSink;

/// A [`BlobSink`] which writes objects into one Google Cloud Storage bucket.
///
/// Credentials are found the usual way (see `gcloud auth
/// application-default login`), but not until the first request.
pub struct GcsBlobSink {
    client: Client,
    bucket: String,
}

impl GcsBlobSink {
    /// Write to `bucket`, billing requests to `project` if given.
    pub fn new(bucket: &str, project: Option<&str>) -> Result<Self> {
        if bucket.is_empty() || bucket.contains('/') {
            return Err(format_err!("invalid bucket name {:?}", bucket));
        }
        Ok(GcsBlobSink {
            client: Client::new(project)?,
            bucket: bucket.to_owned(),
        })
    }

    /// The bucket we write to.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Turn a client error into something that mentions our bucket.
    fn bucket_error(&self, err: ClientError) -> Error {
        match err {
            ClientError::NotFound { .. } => {
                format_err!("bucket gs://{} does not exist", self.bucket)
            }
            ClientError::Other(err) => err,
        }
    }
}

#[async_trait]
impl BlobSink for GcsBlobSink {
    #[instrument(
        level = "debug",
        name = "gs::upload",
        skip_all,
        fields(key = %key)
    )]
    async fn upload(&self, local: &Path, key: &str) -> Result<()> {
        let obj: StorageObject = storage::upload_file(&self.client, local, &self.bucket, key)
            .await
            .map_err(|err| self.bucket_error(err))?;
        debug!("uploaded {} ({} bytes)", obj.to_url_string(), obj.size()?);
        Ok(())
    }

    #[instrument(
        level = "debug",
        name = "gs::list",
        skip_all,
        fields(prefix = %prefix)
    )]
    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        storage::ls(&self.client, &self.bucket, prefix)
            .await
            .map_err(|err| self.bucket_error(err))
    }
}

#[test]
fn bucket_names_are_checked() {
    assert!(GcsBlobSink::new("", None).is_err());
    assert!(GcsBlobSink::new("gs://bucket", None).is_err());
    let sink = GcsBlobSink::new("nytaxi-485607-yellow_taxi", Some("nytaxi-485607")).unwrap();
    assert_eq!(sink.bucket(), "nytaxi-485607-yellow_taxi");
}

#[test]
fn missing_bucket_is_reported_by_name() {
    let sink = GcsBlobSink::new("no-such-bucket", None).unwrap();
    let err = sink.bucket_error(ClientError::NotFound {
        method: reqwest::Method::GET,
        url: "https://storage.googleapis.com/storage/v1/b/no-such-bucket/o"
            .parse()
            .unwrap(),
    });
    assert_eq!(err.to_string(), "bucket gs://no-such-bucket does not exist");
}
