//! Settings loaded from the YAML config file

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Config file used when neither `--config` nor the environment names one
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "RASPI_UPLOADER_CONFIG";

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading the config file
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read config file {path}")]
    Read {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// The file is not valid YAML for the expected shape
    #[error("failed to parse config file {path}")]
    Parse {
        /// Path that was parsed
        path: PathBuf,
        /// Underlying YAML error
        source: serde_yaml::Error,
    },
}

/// Object storage settings (`aliyun_oss` section)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OssSettings {
    /// Endpoint host, e.g. `oss-cn-hangzhou.aliyuncs.com`
    pub endpoint: String,
    /// Access key id
    pub access_key_id: String,
    /// Access key secret
    pub access_key_secret: String,
    /// Bucket receiving the uploads
    pub bucket_name: String,
    /// Signing region; derived from the endpoint when empty
    pub region: String,
    /// Address the bucket as `{endpoint}/{bucket}` instead of `{bucket}.{endpoint}`
    pub path_style: bool,
}

/// Chat bot settings (`dingtalk_bot` section)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DingtalkSettings {
    /// Webhook URL, already carrying the `access_token` query parameter
    pub webhook: String,
    /// Secret used to sign each request
    pub secret: String,
}

/// Settings for one run of the uploader
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Object storage settings
    #[serde(rename = "aliyun_oss")]
    pub oss: OssSettings,
    /// Chat bot settings
    #[serde(rename = "dingtalk_bot")]
    pub dingtalk: DingtalkSettings,
}

impl OssSettings {
    /// Region used for request signing
    ///
    /// Falls back to the first DNS label of the endpoint when `region` is unset.
    #[must_use]
    pub fn signing_region(&self) -> String {
        if !self.region.is_empty() {
            return self.region.clone();
        }

        let host = self
            .endpoint
            .split_once("://")
            .map_or(self.endpoint.as_str(), |(_, rest)| rest);
        host.split('.').next().unwrap_or_default().to_string()
    }

    /// Endpoint URL used by the storage client
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        if self.endpoint.contains("://") {
            self.endpoint.clone()
        } else {
            format!("https://{}", self.endpoint)
        }
    }
}

/// Parses settings from YAML text
///
/// # Errors
///
/// Returns `serde_yaml::Error` when the text is not a mapping of the expected shape
pub fn parse_settings(text: &str) -> Result<Settings, serde_yaml::Error> {
    // An empty document deserializes to unit, not to an empty mapping
    if text.trim().is_empty() {
        return Ok(Settings::default());
    }
    serde_yaml::from_str(text)
}

/// Reads and parses the config file at `path`
///
/// Missing keys resolve to empty strings; no further validation happens here.
///
/// # Errors
///
/// Returns `ConfigError::Read` if the file cannot be read
/// Returns `ConfigError::Parse` if the contents are malformed
pub fn load_settings(path: &Path) -> ConfigResult<Settings> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    parse_settings(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
