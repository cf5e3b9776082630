//! Uploads one local file into today's folder

use std::fmt::Display;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use thiserror::Error;
use tracing::info;

use crate::config::OssSettings;
use crate::storage::{ByteStream, ObjectStore, StorageError};
use crate::sweeper::{FOLDER_DATE_FORMAT, FOLDER_ROOT};

/// Result type for upload operations
pub type UploadResult<T> = Result<T, UploadError>;

/// Errors that can occur while uploading a file
#[derive(Error, Debug)]
pub enum UploadError {
    /// The local file could not be opened or read
    #[error("failed to open file {path}")]
    Io {
        /// Local path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The bucket rejected the upload
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A stored object and where it can be viewed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    /// Object key inside the bucket
    pub key: String,
    /// `https://{bucket}.{endpoint}/{key}`
    pub public_url: String,
}

/// Builds `raspi/{YYYYMMDD}/{millisecond}_{basename}` for a file uploaded at `now`
#[must_use]
pub fn object_key<Tz>(now: &DateTime<Tz>, path: &Path) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let base_name = path
        .file_name()
        .map_or_else(|| path.to_string_lossy(), |name| name.to_string_lossy());
    // Leap seconds report 1000..=1999 here
    let millis = now.timestamp_subsec_millis() % 1000;

    format!(
        "{FOLDER_ROOT}{}/{millis}_{base_name}",
        now.format(FOLDER_DATE_FORMAT)
    )
}

/// Public URL of `key`; assumes the bucket allows anonymous reads
#[must_use]
pub fn public_url(settings: &OssSettings, key: &str) -> String {
    format!(
        "https://{}.{}/{key}",
        settings.bucket_name, settings.endpoint
    )
}

/// Uploads the file at `path` under the key derived from `now`
///
/// # Errors
///
/// Returns `UploadError::Io` if the file cannot be opened
/// Returns `UploadError::Storage` if the bucket rejects the object
pub async fn upload_file<S, Tz>(
    store: &S,
    settings: &OssSettings,
    path: &Path,
    now: &DateTime<Tz>,
) -> UploadResult<UploadedObject>
where
    S: ObjectStore + ?Sized,
    Tz: TimeZone,
    Tz::Offset: Display,
{
    // Streamed from disk; only the file length is checked up front
    let body = ByteStream::from_path(path)
        .await
        .map_err(|e| UploadError::Io {
            path: path.to_path_buf(),
            source: std::io::Error::other(e),
        })?;

    let key = object_key(now, path);
    store.put_object(&key, body).await?;

    let public_url = public_url(settings, &key);
    info!("Uploaded {} to {}", path.display(), public_url);

    Ok(UploadedObject { key, public_url })
}
