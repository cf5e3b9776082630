//! Object storage access for the upload bucket

mod error;
mod oss;

pub use aws_sdk_s3::primitives::ByteStream;
pub use error::{StorageError, StorageResult};
pub use oss::OssBucket;

/// One page of a delimiter listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderPage {
    /// Common prefixes rolled up at the delimiter, e.g. `raspi/20240601/`
    pub common_prefixes: Vec<String>,
    /// Whether more pages follow
    pub is_truncated: bool,
    /// Marker to pass to the next call, when the server supplied one
    pub next_marker: Option<String>,
}

/// Operations the sweeper and uploader need from a bucket
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Lists one page of common prefixes under `prefix`, starting after `marker`
    async fn list_folders(
        &self,
        prefix: &str,
        delimiter: &str,
        marker: Option<&str>,
    ) -> StorageResult<FolderPage>;

    /// Lists the keys under `prefix`
    ///
    /// Only the first page is returned.
    async fn list_keys(&self, prefix: &str) -> StorageResult<Vec<String>>;

    /// Deletes `keys` in one batch request. An empty batch is a no-op.
    async fn delete_keys(&self, keys: &[String]) -> StorageResult<()>;

    /// Streams `body` into the object at `key`
    async fn put_object(&self, key: &str, body: ByteStream) -> StorageResult<()>;
}
