#![allow(dead_code)]

use std::collections::BTreeMap;
use std::io;
use std::sync::{Arc, Mutex};

use raspi_uploader::config::{DingtalkSettings, OssSettings, Settings};
use raspi_uploader::storage::{ByteStream, FolderPage, ObjectStore, StorageError, StorageResult};

/// Operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    ListFolders,
    ListKeys,
    Delete,
    Put,
}

/// In-memory bucket with S3 delimiter-listing semantics
pub struct MemoryBucket {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    delete_batches: Mutex<Vec<Vec<String>>>,
    page_size: usize,
    omit_next_marker: bool,
    fail_on: Option<FailOn>,
}

impl MemoryBucket {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            delete_batches: Mutex::new(Vec::new()),
            page_size: 1000,
            omit_next_marker: false,
            fail_on: None,
        }
    }

    pub fn with_keys(keys: &[&str]) -> Self {
        let bucket = Self::new();
        for key in keys {
            bucket.insert(key, b"data");
        }
        bucket
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Leaves `next_marker` unset on truncated pages
    pub fn omit_next_marker(mut self) -> Self {
        self.omit_next_marker = true;
        self
    }

    pub fn failing(mut self, fail_on: FailOn) -> Self {
        self.fail_on = Some(fail_on);
        self
    }

    pub fn insert(&self, key: &str, body: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), body.to_vec());
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn delete_batches(&self) -> Vec<Vec<String>> {
        self.delete_batches.lock().unwrap().clone()
    }

    fn check(&self, op: FailOn) -> StorageResult<()> {
        if self.fail_on != Some(op) {
            return Ok(());
        }
        Err(match op {
            FailOn::ListFolders | FailOn::ListKeys => {
                StorageError::List("injected list failure".to_string())
            }
            FailOn::Delete => StorageError::Delete("injected delete failure".to_string()),
            FailOn::Put => StorageError::Put("injected put failure".to_string()),
        })
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryBucket {
    async fn list_folders(
        &self,
        prefix: &str,
        delimiter: &str,
        marker: Option<&str>,
    ) -> StorageResult<FolderPage> {
        self.check(FailOn::ListFolders)?;

        let objects = self.objects.lock().unwrap();
        let mut prefixes: Vec<String> = Vec::new();
        for key in objects.keys() {
            let Some(rest) = key.strip_prefix(prefix) else {
                continue;
            };
            // Keys rolled up into the marker's prefix were already returned
            if let Some(marker) = marker {
                if key.as_str() <= marker || key.starts_with(marker) {
                    continue;
                }
            }
            if let Some(idx) = rest.find(delimiter) {
                let common = format!("{prefix}{}", &rest[..idx + delimiter.len()]);
                if prefixes.last() != Some(&common) {
                    prefixes.push(common);
                }
            }
        }

        let is_truncated = prefixes.len() > self.page_size;
        prefixes.truncate(self.page_size);
        let next_marker = if is_truncated && !self.omit_next_marker {
            prefixes.last().cloned()
        } else {
            None
        };

        Ok(FolderPage {
            common_prefixes: prefixes,
            is_truncated,
            next_marker,
        })
    }

    async fn list_keys(&self, prefix: &str) -> StorageResult<Vec<String>> {
        self.check(FailOn::ListKeys)?;

        Ok(self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }

    async fn delete_keys(&self, keys: &[String]) -> StorageResult<()> {
        self.check(FailOn::Delete)?;

        let mut objects = self.objects.lock().unwrap();
        for key in keys {
            objects.remove(key);
        }
        self.delete_batches.lock().unwrap().push(keys.to_vec());
        Ok(())
    }

    async fn put_object(&self, key: &str, body: ByteStream) -> StorageResult<()> {
        self.check(FailOn::Put)?;

        let body = body
            .collect()
            .await
            .map_err(|e| StorageError::Put(e.to_string()))?
            .into_bytes();
        self.insert(key, &body);
        Ok(())
    }
}

pub fn test_oss_settings() -> OssSettings {
    OssSettings {
        endpoint: "oss-cn-hangzhou.aliyuncs.com".to_string(),
        access_key_id: "AKID".to_string(),
        access_key_secret: "SECRET".to_string(),
        bucket_name: "raspi-camera".to_string(),
        region: String::new(),
        path_style: false,
    }
}

pub fn test_settings(webhook: &str) -> Settings {
    Settings {
        oss: test_oss_settings(),
        dingtalk: DingtalkSettings {
            webhook: webhook.to_string(),
            secret: "secret".to_string(),
        },
    }
}

/// Log output captured from a thread-local subscriber
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Installs the capture as the default subscriber for the current thread
    pub fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let capture = Self::default();
        let writer = capture.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
