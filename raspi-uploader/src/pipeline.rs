//! Sweep, upload and notify, in that order

use std::path::Path;

use anyhow::Context;
use chrono::{Local, Utc};
use tracing::{error, info};

use crate::config::Settings;
use crate::notifier::DingtalkNotifier;
use crate::storage::ObjectStore;
use crate::sweeper::sweep_expired;
use crate::uploader::{upload_file, UploadedObject};

/// Runs one upload of `file`
///
/// A failed sweep is logged and the upload still proceeds.
///
/// # Errors
///
/// Returns an error if the upload or the notification fails
pub async fn run<S>(
    settings: &Settings,
    file: &Path,
    store: &S,
    notifier: &DingtalkNotifier,
) -> anyhow::Result<UploadedObject>
where
    S: ObjectStore + ?Sized,
{
    match sweep_expired(store, Utc::now()).await {
        Ok(report) => info!(
            "Retention sweep finished: {} folders deleted",
            report.deleted.len()
        ),
        Err(e) => error!("Failed to clean up expired folders: {}", e),
    }

    let uploaded = upload_file(store, &settings.oss, file, &Local::now())
        .await
        .context("Failed to upload file")?;

    notifier
        .notify(&uploaded.public_url)
        .await
        .context("Failed to send DingTalk message")?;

    Ok(uploaded)
}
