//! Content deduplication
//!
//! Groups successful downloads by content hash and removes every physical
//! file but one per group. The survivor is the first record encountered in
//! input order, which keeps the choice deterministic; no modification time
//! or path heuristics are consulted.

use crate::types::{DedupStats, DownloadRecord, Event};
use std::collections::HashSet;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Remove duplicate files among the successful records
///
/// Deletions are best-effort: a failed delete never aborts the scan and the
/// intended survivor is never touched, but failures are counted in
/// [`DedupStats::failed_deletes`] so they stay observable.
pub async fn remove_duplicates(
    records: &[DownloadRecord],
    events: &broadcast::Sender<Event>,
) -> DedupStats {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut stats = DedupStats::default();

    for record in records.iter().filter(|r| r.succeeded) {
        if seen.insert(record.content_hash.as_str()) {
            // First encountered for this hash: this file survives.
            continue;
        }

        match tokio::fs::remove_file(&record.file_path).await {
            Ok(()) => {
                stats.deleted += 1;
                events
                    .send(Event::DuplicateRemoved {
                        file_path: record.file_path.clone(),
                    })
                    .ok();
            }
            Err(err) => {
                stats.failed_deletes += 1;
                debug!(path = %record.file_path.display(), %err, "failed to remove duplicate");
            }
        }
    }

    stats.survivors = seen.len();
    events
        .send(Event::DedupComplete {
            survivors: stats.survivors,
            deleted: stats.deleted,
            failed_deletes: stats.failed_deletes,
        })
        .ok();
    info!(
        survivors = stats.survivors,
        deleted = stats.deleted,
        failed = stats.failed_deletes,
        "deduplication finished"
    );

    stats
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    fn channel() -> broadcast::Sender<Event> {
        broadcast::channel(64).0
    }

    fn record(path: PathBuf, hash: &str, succeeded: bool) -> DownloadRecord {
        DownloadRecord {
            url: format!("https://example.com/{}", path.display()),
            file_path: path,
            content_hash: hash.to_string(),
            succeeded,
            error: None,
        }
    }

    fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    #[tokio::test]
    async fn first_encountered_survives_later_duplicates_removed() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.png", b"same");
        let b = write(dir.path(), "b.png", b"same");
        let c = write(dir.path(), "c.png", b"other");

        let records = vec![
            record(a.clone(), "h1", true),
            record(b.clone(), "h1", true),
            record(c.clone(), "h2", true),
        ];

        let stats = remove_duplicates(&records, &channel()).await;

        assert_eq!(
            stats,
            DedupStats {
                survivors: 2,
                deleted: 1,
                failed_deletes: 0
            }
        );
        assert!(a.exists(), "first-encountered copy must be kept");
        assert!(!b.exists(), "later duplicate must be removed");
        assert!(c.exists());
    }

    #[tokio::test]
    async fn failed_records_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.png", b"same");
        let b = write(dir.path(), "b.png", b"same");

        // Same hash, but the second record failed: nothing may be deleted.
        let records = vec![record(a.clone(), "h1", true), record(b.clone(), "h1", false)];

        let stats = remove_duplicates(&records, &channel()).await;
        assert_eq!(stats.deleted, 0);
        assert_eq!(stats.survivors, 1);
        assert!(a.exists());
        assert!(b.exists());
    }

    #[tokio::test]
    async fn missing_duplicate_counts_as_failed_delete() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.png", b"same");
        let ghost = dir.path().join("already-gone.png");

        let records = vec![record(a.clone(), "h1", true), record(ghost, "h1", true)];

        let stats = remove_duplicates(&records, &channel()).await;
        assert_eq!(stats.deleted, 0);
        assert_eq!(stats.failed_deletes, 1);
        assert_eq!(stats.survivors, 1);
        assert!(a.exists());
    }

    #[tokio::test]
    async fn removal_events_are_emitted() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.png", b"same");
        let b = write(dir.path(), "b.png", b"same");

        let events = channel();
        let mut rx = events.subscribe();
        remove_duplicates(
            &[record(a, "h1", true), record(b.clone(), "h1", true)],
            &events,
        )
        .await;

        assert!(matches!(
            rx.try_recv().unwrap(),
            Event::DuplicateRemoved { file_path } if file_path == b
        ));
        assert!(matches!(
            rx.try_recv().unwrap(),
            Event::DedupComplete { survivors: 1, deleted: 1, failed_deletes: 0 }
        ));
    }
}
