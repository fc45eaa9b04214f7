//! Data directory layout and snapshot persistence.
//!
//! The data directory holds:
//! - `list_repos.json`: the repository URLs of the last run (overwritten)
//! - `<timestamp>-fetched_repo_data.json`: one snapshot per run (never overwritten)
//! - `latest`: the pointer to the newest snapshot

use crate::error::{RefreshError, Result};
use crate::models::{LatestPointer, MetadataSnapshot};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use tracing::{debug, info};

/// Timestamp format embedded in snapshot file names.
pub const SNAPSHOT_TIME_FORMAT: &str = "%Y-%m-%dT%H.%M.%S";
pub const SNAPSHOT_SUFFIX: &str = "-fetched_repo_data.json";
pub const REPO_LIST_FILE: &str = "list_repos.json";
pub const LATEST_FILE: &str = "latest";

/// The directory snapshots are written to.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn latest_path(&self) -> PathBuf {
        self.root.join(LATEST_FILE)
    }

    pub fn repo_list_path(&self) -> PathBuf {
        self.root.join(REPO_LIST_FILE)
    }

    /// Snapshot file name for a run started at `now`.
    pub fn snapshot_path(&self, now: DateTime<Utc>) -> PathBuf {
        self.root.join(format!(
            "{}{}",
            now.format(SNAPSHOT_TIME_FORMAT),
            SNAPSHOT_SUFFIX
        ))
    }

    /// Create the directory if it does not exist yet.
    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| RefreshError::fs(&self.root, e))
    }

    /// Read the latest pointer; `None` when absent or empty.
    pub fn read_pointer(&self) -> Result<Option<LatestPointer>> {
        let path = self.latest_path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(RefreshError::fs(path, e)),
        };

        let content = content.trim();
        if content.is_empty() {
            return Ok(None);
        }

        parse_pointer(content)
            .map(Some)
            .map_err(|reason| RefreshError::Pointer { path, reason })
    }

    /// Overwrite the repository list file.
    pub fn write_repo_list(&self, urls: &[String]) -> Result<PathBuf> {
        self.ensure()?;
        let path = self.repo_list_path();
        let json = serde_json::to_string_pretty(urls)?;
        fs::write(&path, json + "\n").map_err(|e| RefreshError::fs(&path, e))?;
        debug!("Wrote {} repository URLs to {}", urls.len(), path.display());
        Ok(path)
    }

    /// Write the snapshot and repoint `latest` to it.
    ///
    /// The snapshot file must not exist yet. The pointer is written to a
    /// temporary file and renamed over `latest`, so a previous pointer is
    /// replaced in one step.
    pub fn persist(&self, snapshot: &MetadataSnapshot, now: DateTime<Utc>) -> Result<PathBuf> {
        self.ensure()?;

        let snapshot_path = self.snapshot_path(now);
        let json = serde_json::to_string_pretty(snapshot)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&snapshot_path)
            .map_err(|e| RefreshError::fs(&snapshot_path, e))?;
        file.write_all(json.as_bytes())
            .and_then(|_| file.write_all(b"\n"))
            .and_then(|_| file.sync_all())
            .map_err(|e| RefreshError::fs(&snapshot_path, e))?;
        info!("Snapshot saved: {}", snapshot_path.display());

        let pointer = LatestPointer {
            path: snapshot_path.clone(),
            created_at: now,
        };
        self.write_pointer(&pointer)?;

        Ok(snapshot_path)
    }

    fn write_pointer(&self, pointer: &LatestPointer) -> Result<()> {
        let latest = self.latest_path();
        let tmp = latest.with_extension("tmp");

        let json = serde_json::to_string_pretty(pointer)?;
        fs::write(&tmp, json).map_err(|e| RefreshError::fs(&tmp, e))?;
        fs::rename(&tmp, &latest).map_err(|e| RefreshError::fs(&latest, e))?;

        debug!("Pointer {} -> {}", latest.display(), pointer.path.display());
        Ok(())
    }
}

/// Parse pointer content: a JSON record, or a bare snapshot path whose file
/// name carries the timestamp.
///
/// Bare-path pointers come from older runs that named snapshots in local
/// time, so their stamp is read as local time and converted to UTC.
fn parse_pointer(content: &str) -> std::result::Result<LatestPointer, String> {
    if content.starts_with('{') {
        return serde_json::from_str(content).map_err(|e| e.to_string());
    }

    let path = PathBuf::from(content);
    let created_at = path
        .file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.strip_suffix(SNAPSHOT_SUFFIX))
        .and_then(|stamp| NaiveDateTime::parse_from_str(stamp, SNAPSHOT_TIME_FORMAT).ok())
        .and_then(local_to_utc)
        .ok_or_else(|| format!("no snapshot timestamp in '{}'", content))?;

    Ok(LatestPointer { path, created_at })
}

/// Resolve a local wall-clock time; the earlier instant wins inside a DST fold.
fn local_to_utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn at(ts: &str) -> DateTime<Utc> {
        ts.parse().unwrap()
    }

    fn sample_snapshot() -> MetadataSnapshot {
        MetadataSnapshot::new(vec![
            json!({"full_name": "veggiemonk/awesome-docker", "stargazers_count": 25000}),
            json!({"full_name": "weaveworks/weave", "archived": true}),
        ])
    }

    #[test]
    fn test_snapshot_path_format() {
        let dir = DataDir::new("data");
        assert_eq!(
            dir.snapshot_path(at("2024-01-31T23:05:10Z")),
            PathBuf::from("data/2024-01-31T23.05.10-fetched_repo_data.json")
        );
    }

    #[test]
    fn test_missing_pointer_is_none() {
        let temp = TempDir::new().unwrap();
        let dir = DataDir::new(temp.path().join("data"));
        assert!(dir.read_pointer().unwrap().is_none());
    }

    #[test]
    fn test_empty_pointer_is_none() {
        let temp = TempDir::new().unwrap();
        let dir = DataDir::new(temp.path());
        fs::write(dir.latest_path(), "  \n").unwrap();
        assert!(dir.read_pointer().unwrap().is_none());
    }

    #[test]
    fn test_persist_round_trip() {
        let temp = TempDir::new().unwrap();
        let dir = DataDir::new(temp.path().join("data"));
        let snapshot = sample_snapshot();
        let now = at("2024-06-01T08:30:00Z");

        let path = dir.persist(&snapshot, now).unwrap();
        assert_eq!(path, dir.snapshot_path(now));

        let written: MetadataSnapshot =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written, snapshot);

        let pointer = dir.read_pointer().unwrap().unwrap();
        assert_eq!(pointer.path, path);
        assert_eq!(pointer.created_at, now);
        assert!(!dir.latest_path().with_extension("tmp").exists());
    }

    #[test]
    fn test_persist_replaces_pointer() {
        let temp = TempDir::new().unwrap();
        let dir = DataDir::new(temp.path());

        let first = dir.persist(&sample_snapshot(), at("2024-06-01T08:00:00Z")).unwrap();
        let second = dir.persist(&sample_snapshot(), at("2024-06-01T10:00:00Z")).unwrap();

        assert_ne!(first, second);
        assert!(first.exists());
        assert_eq!(dir.read_pointer().unwrap().unwrap().path, second);
    }

    #[test]
    fn test_persist_never_overwrites_snapshot() {
        let temp = TempDir::new().unwrap();
        let dir = DataDir::new(temp.path());
        let now = at("2024-06-01T08:00:00Z");

        dir.persist(&sample_snapshot(), now).unwrap();
        let err = dir.persist(&MetadataSnapshot::default(), now).unwrap_err();
        assert!(matches!(err, RefreshError::Filesystem { .. }));

        let written: MetadataSnapshot =
            serde_json::from_str(&fs::read_to_string(dir.snapshot_path(now)).unwrap()).unwrap();
        assert_eq!(written, sample_snapshot());
    }

    #[test]
    fn test_legacy_pointer_is_parsed_by_file_name() {
        let temp = TempDir::new().unwrap();
        let dir = DataDir::new(temp.path());
        fs::write(
            dir.latest_path(),
            "data/2024-01-31T23.05.10-fetched_repo_data.json",
        )
        .unwrap();

        let pointer = dir.read_pointer().unwrap().unwrap();
        let local = Local
            .with_ymd_and_hms(2024, 1, 31, 23, 5, 10)
            .single()
            .unwrap();
        assert_eq!(pointer.created_at, local.with_timezone(&Utc));
        assert_eq!(
            pointer.path,
            PathBuf::from("data/2024-01-31T23.05.10-fetched_repo_data.json")
        );
    }

    #[test]
    fn test_garbage_pointer_is_error() {
        let temp = TempDir::new().unwrap();
        let dir = DataDir::new(temp.path());
        fs::write(dir.latest_path(), "data/something-else.json").unwrap();
        assert!(matches!(
            dir.read_pointer(),
            Err(RefreshError::Pointer { .. })
        ));

        fs::write(dir.latest_path(), "{ not json").unwrap();
        assert!(matches!(
            dir.read_pointer(),
            Err(RefreshError::Pointer { .. })
        ));
    }

    #[test]
    fn test_write_repo_list_overwrites() {
        let temp = TempDir::new().unwrap();
        let dir = DataDir::new(temp.path().join("nested/data"));

        dir.write_repo_list(&["https://github.com/a/b".to_string()])
            .unwrap();
        let path = dir
            .write_repo_list(&[
                "https://github.com/c/d".to_string(),
                "https://github.com/e/f".to_string(),
            ])
            .unwrap();

        let urls: Vec<String> = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(urls, vec!["https://github.com/c/d", "https://github.com/e/f"]);
    }
}
