//! Retention sweep over the dated upload folders

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use tracing::{debug, info};

use crate::storage::{ObjectStore, StorageResult};

/// Key prefix holding one folder per upload day
pub const FOLDER_ROOT: &str = "raspi/";

/// Delimiter used to roll keys up into folders
pub const DELIMITER: &str = "/";

/// Folders older than this are deleted
pub const RETENTION: TimeDelta = TimeDelta::hours(3 * 24);

/// Format of the date segment in a folder name
pub const FOLDER_DATE_FORMAT: &str = "%Y%m%d";

/// Outcome of one sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Folder prefixes whose objects were deleted
    pub deleted: Vec<String>,
    /// Folder prefixes without a date name, left untouched
    pub skipped: Vec<String>,
}

/// Extracts the date encoded in a `raspi/YYYYMMDD/` folder prefix
///
/// Returns `None` for anything that is not exactly eight digits forming a valid date.
#[must_use]
pub fn folder_date(prefix: &str) -> Option<NaiveDate> {
    let segment = prefix.strip_prefix(FOLDER_ROOT).unwrap_or(prefix);
    let segment = segment.strip_suffix(DELIMITER).unwrap_or(segment);

    if segment.len() != 8 || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(segment, FOLDER_DATE_FORMAT).ok()
}

/// Whether a folder dated `date` (midnight UTC) has outlived the retention window at `now`
#[must_use]
pub fn is_expired(date: NaiveDate, now: DateTime<Utc>) -> bool {
    let folder_start = date.and_time(chrono::NaiveTime::MIN).and_utc();
    now.signed_duration_since(folder_start) > RETENTION
}

/// Deletes every dated folder under `raspi/` that is older than the retention window
///
/// Folder listing is paginated; each expired folder's objects are listed once and
/// removed in a single batch. Non-date folders are skipped. The first listing or
/// deletion failure aborts the sweep.
///
/// # Errors
///
/// Returns the `StorageError` of the first failed listing or deletion
pub async fn sweep_expired<S>(store: &S, now: DateTime<Utc>) -> StorageResult<SweepReport>
where
    S: ObjectStore + ?Sized,
{
    let mut report = SweepReport::default();
    let mut marker: Option<String> = None;

    loop {
        let page = store
            .list_folders(FOLDER_ROOT, DELIMITER, marker.as_deref())
            .await?;

        for prefix in &page.common_prefixes {
            let Some(date) = folder_date(prefix) else {
                debug!("Skipping folder without a date name: {}", prefix);
                report.skipped.push(prefix.clone());
                continue;
            };

            if !is_expired(date, now) {
                continue;
            }

            let keys = store.list_keys(prefix).await?;
            store.delete_keys(&keys).await?;

            info!("Deleted expired folder: {} ({} objects)", prefix, keys.len());
            report.deleted.push(prefix.clone());
        }

        if !page.is_truncated {
            break;
        }
        // Some servers omit NextMarker; the last rolled-up prefix resumes the listing
        marker = page
            .next_marker
            .or_else(|| page.common_prefixes.last().cloned());
        if marker.is_none() {
            break;
        }
    }

    Ok(report)
}
