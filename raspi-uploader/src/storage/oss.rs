//! S3-compatible client for the OSS bucket

use aws_config::{retry::RetryConfig, BehaviorVersion, Region};
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::RequestChecksumCalculation,
    primitives::ByteStream,
    types::{Delete, ObjectIdentifier},
    Client,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use md5::{Digest, Md5};
use tracing::{debug, info};

use super::{FolderPage, ObjectStore, StorageError, StorageResult};
use crate::config::OssSettings;

const CREDENTIALS_PROVIDER_NAME: &str = "raspi-uploader-config";

/// Bucket client backed by `aws-sdk-s3`
pub struct OssBucket {
    client: Client,
    bucket_name: String,
}

impl OssBucket {
    /// Builds a client for the configured endpoint and resolves the bucket
    ///
    /// SDK retries are disabled; every failure surfaces on the first attempt.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Client` if the endpoint is missing
    /// Returns `StorageError::Bucket` if the bucket name is not a valid bucket name
    pub async fn connect(settings: &OssSettings) -> StorageResult<Self> {
        if settings.endpoint.trim().is_empty() {
            return Err(StorageError::Client("endpoint is not set".to_string()));
        }
        if settings.endpoint.chars().any(char::is_whitespace) {
            return Err(StorageError::Client(format!(
                "invalid endpoint: {:?}",
                settings.endpoint
            )));
        }
        validate_bucket_name(&settings.bucket_name)?;

        let credentials = Credentials::new(
            settings.access_key_id.clone(),
            settings.access_key_secret.clone(),
            None,
            None,
            CREDENTIALS_PROVIDER_NAME,
        );

        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(settings.signing_region()))
            .endpoint_url(settings.endpoint_url())
            .credentials_provider(credentials)
            .retry_config(RetryConfig::disabled())
            .load()
            .await;

        // OSS serves buckets as `{bucket}.{endpoint}`; path style is for local S3 stand-ins
        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(settings.path_style)
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .build();

        info!(
            "Initialized storage client for bucket {} at {}",
            settings.bucket_name, settings.endpoint
        );

        Ok(Self {
            client: Client::from_conf(s3_config),
            bucket_name: settings.bucket_name.clone(),
        })
    }
}

/// `Content-MD5` header value: base64 of the body's MD5 digest
fn content_md5(body: &[u8]) -> String {
    STANDARD.encode(Md5::digest(body))
}

/// Checks the bucket naming rules: 3-63 chars of `[a-z0-9-]`, no leading or trailing hyphen
fn validate_bucket_name(name: &str) -> StorageResult<()> {
    let valid_chars = name
        .bytes()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-');

    if (3..=63).contains(&name.len())
        && valid_chars
        && !name.starts_with('-')
        && !name.ends_with('-')
    {
        Ok(())
    } else {
        Err(StorageError::Bucket(format!("invalid bucket name: {name:?}")))
    }
}

#[async_trait::async_trait]
impl ObjectStore for OssBucket {
    async fn list_folders(
        &self,
        prefix: &str,
        delimiter: &str,
        marker: Option<&str>,
    ) -> StorageResult<FolderPage> {
        debug!("Listing folders under {} after {:?}", prefix, marker);

        let output = self
            .client
            .list_objects()
            .bucket(&self.bucket_name)
            .prefix(prefix)
            .delimiter(delimiter)
            .set_marker(marker.map(str::to_string))
            .send()
            .await?;

        Ok(FolderPage {
            common_prefixes: output
                .common_prefixes()
                .iter()
                .filter_map(|p| p.prefix().map(str::to_string))
                .collect(),
            is_truncated: output.is_truncated().unwrap_or(false),
            next_marker: output.next_marker().map(str::to_string),
        })
    }

    async fn list_keys(&self, prefix: &str) -> StorageResult<Vec<String>> {
        let output = self
            .client
            .list_objects()
            .bucket(&self.bucket_name)
            .prefix(prefix)
            .send()
            .await?;

        Ok(output
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_string))
            .collect())
    }

    async fn delete_keys(&self, keys: &[String]) -> StorageResult<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let objects = keys
            .iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect::<Result<Vec<_>, _>>()?;
        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(true)
            .build()?;

        let output = self
            .client
            .delete_objects()
            .bucket(&self.bucket_name)
            .delete(delete)
            .customize()
            // OSS rejects batch deletes without Content-MD5; the SDK only adds its CRC32 checksum
            .mutate_request(|request| {
                if let Some(body) = request.body().bytes() {
                    let digest = content_md5(body);
                    request.headers_mut().insert("Content-MD5", digest);
                }
            })
            .send()
            .await?;

        // Quiet mode only reports the keys that failed
        if let Some(failed) = output.errors().first() {
            return Err(StorageError::Delete(format!(
                "{} ({}): {}",
                failed.key().unwrap_or_default(),
                failed.code().unwrap_or_default(),
                failed.message().unwrap_or_default()
            )));
        }

        Ok(())
    }

    async fn put_object(&self, key: &str, body: ByteStream) -> StorageResult<()> {
        debug!("Putting object {}", key);

        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .body(body)
            .send()
            .await?;

        Ok(())
    }
}
