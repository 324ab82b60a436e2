//! Cloud Storage objects: uploading and listing.

use serde_derive::Deserialize;

use crate::common::*;

mod ls;
mod upload_file;

pub(crate) use ls::ls;
pub(crate) use upload_file::upload_file;

/// The fields we use from a Cloud Storage object resource.
#[derive(Debug, Deserialize)]
pub(crate) struct StorageObject {
    pub(crate) bucket: String,
    /// The object key, such as `raw/yellow_tripdata_2024-01.parquet`.
    pub(crate) name: String,
    /// Byte count. The JSON API sends this as a decimal string.
    size: String,
}

impl StorageObject {
    /// The `gs://bucket/key` form of this object's location.
    pub(crate) fn to_url_string(&self) -> String {
        format!("gs://{}/{}", self.bucket, self.name)
    }

    /// The object's size in bytes.
    pub(crate) fn size(&self) -> Result<u64> {
        self.size
            .parse()
            .with_context(|| format!("bad size {:?} for {}", self.size, self.name))
    }
}

#[test]
fn storage_object_is_parsed() {
    let json = r#"{
        "kind": "storage#object",
        "bucket": "nytaxi-485607-yellow_taxi",
        "name": "raw/yellow_tripdata_2024-01.parquet",
        "size": "49961641"
    }"#;
    let obj = serde_json::from_str::<StorageObject>(json).unwrap();
    assert_eq!(
        obj.to_url_string(),
        "gs://nytaxi-485607-yellow_taxi/raw/yellow_tripdata_2024-01.parquet"
    );
    assert_eq!(obj.size().unwrap(), 49_961_641);
}
