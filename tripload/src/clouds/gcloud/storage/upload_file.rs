//! Upload a local file to Google Cloud Storage.

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use serde_derive::Serialize;
use tokio::fs::File;
use tokio_util::codec::{BytesCodec, FramedRead};

use super::{
    super::{percent_encode, Client, ClientError},
    StorageObject,
};
use crate::common::*;

/// Parameters for an upload query.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadQuery<'a> {
    /// The type of the upload we're performing.
    upload_type: &'static str,

    /// The name of the object we're creating.
    name: &'a str,
}

/// Upload the file at `local` as `object` in `bucket`, streaming it from disk.
///
/// Docs: https://cloud.google.com/storage/docs/json_api/v1/objects/insert
#[instrument(level = "debug", skip(client, local), fields(local = %local.display()))]
pub(crate) async fn upload_file(
    client: &Client,
    local: &Path,
    bucket: &str,
    object: &str,
) -> Result<StorageObject, ClientError> {
    let file = File::open(local)
        .await
        .with_context(|| format!("cannot open {}", local.display()))?;
    let len = file
        .metadata()
        .await
        .with_context(|| format!("cannot get size of {}", local.display()))?
        .len();

    let mut headers = HeaderMap::default();
    headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    let body = reqwest::Body::wrap_stream(FramedRead::new(file, BytesCodec::new()));

    let url = format!(
        "https://storage.googleapis.com/upload/storage/v1/b/{}/o",
        percent_encode(bucket),
    );
    let query = UploadQuery {
        upload_type: "media",
        name: object,
    };
    client.post_stream(&url, query, body, headers).await
}
