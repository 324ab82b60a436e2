//! Listing objects in a bucket.

use serde_derive::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{
    super::{percent_encode, Client, ClientError},
    StorageObject,
};
use crate::common::*;

/// URL query parameters.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery<'a> {
    prefix: &'a str,

    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<String>,
}

/// Response body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    next_page_token: Option<String>,

    #[serde(default)]
    items: Vec<StorageObject>,
}

/// List the names of all objects in `bucket` which start with `prefix`.
///
/// This is a plain prefix match. Unlike a file system, `raw/a` matches
/// `raw/abc`.
///
/// See the [documentation][list].
///
/// [list]: https://cloud.google.com/storage/docs/json_api/v1/objects/list
#[instrument(level = "debug", skip(client))]
pub(crate) async fn ls(
    client: &Client,
    bucket: &str,
    prefix: &str,
) -> Result<Vec<String>, ClientError> {
    let req_url = format!(
        "https://storage.googleapis.com/storage/v1/b/{}/o",
        percent_encode(bucket),
    );

    // Keep track of names that we've seen.
    let mut seen = HashSet::new();
    let mut names = vec![];

    // Keep asking for results until there are no more.
    let mut page_token = None;
    loop {
        let query = ListQuery { prefix, page_token };
        let mut res = client.get::<ListResponse, _, _>(&req_url, query).await?;
        page_token = res.next_page_token.take();

        for item in res.items {
            // Pages shouldn't overlap, but don't report anything twice if they do.
            if seen.insert(item.name.clone()) {
                names.push(item.name);
            }
        }

        // Exit if this is the last page of results.
        if page_token.is_none() {
            break;
        }
        trace!("fetching another page of results for {:?}", prefix);
    }
    debug!("found {} objects", names.len());
    Ok(names)
}

#[test]
fn list_response_is_parsed() {
    let json = r#"{
        "kind": "storage#objects",
        "nextPageToken": "CiVyYXcv",
        "items": [
            { "bucket": "b", "name": "raw/yellow_tripdata_2024-01.parquet", "size": "10" },
            { "bucket": "b", "name": "raw/yellow_tripdata_2024-02.parquet", "size": "20" }
        ]
    }"#;
    let res = serde_json::from_str::<ListResponse>(json).unwrap();
    assert_eq!(res.next_page_token.as_deref(), Some("CiVyYXcv"));
    assert_eq!(res.items.len(), 2);

    // An empty listing has no `items` at all.
    let res = serde_json::from_str::<ListResponse>(r#"{"kind": "storage#objects"}"#)
        .unwrap();
    assert!(res.next_page_token.is_none());
    assert!(res.items.is_empty());
}
