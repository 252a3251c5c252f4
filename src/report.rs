//! Plain-text run report
//!
//! One `report.txt` per run, written into the profile directory, listing
//! every download record with its outcome. The pipeline treats report
//! writing as best-effort; a write failure is logged and swallowed there.

use crate::error::Result;
use crate::types::DownloadRecord;
use chrono::Utc;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// File name of the generated report
pub const REPORT_FILE_NAME: &str = "report.txt";

/// Write the run report into `dir`, returning the report path
pub async fn write_report(dir: &Path, records: &[DownloadRecord]) -> Result<PathBuf> {
    let path = dir.join(REPORT_FILE_NAME);
    let succeeded = records.iter().filter(|r| r.succeeded).count();
    let failed = records.len() - succeeded;

    let mut body = String::new();
    let _ = writeln!(body, "media-dl report generated {}", Utc::now().to_rfc3339());
    let _ = writeln!(body, "{} downloaded, {} failed", succeeded, failed);
    let _ = writeln!(body);
    for record in records {
        match &record.error {
            None => {
                let _ = writeln!(
                    body,
                    "[ok] {} -> {}",
                    record.url,
                    record.file_path.display()
                );
            }
            Some(error) => {
                let _ = writeln!(
                    body,
                    "[failed] {} -> {} ({error})",
                    record.url,
                    record.file_path.display()
                );
            }
        }
    }

    tokio::fs::write(&path, body).await?;
    Ok(path)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn report_lists_every_record_with_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![
            DownloadRecord {
                url: "https://example.com/a.png".to_string(),
                file_path: dir.path().join("a.png"),
                content_hash: "h1".to_string(),
                succeeded: true,
                error: None,
            },
            DownloadRecord {
                url: "https://example.com/b.png".to_string(),
                file_path: dir.path().join("b.png"),
                content_hash: String::new(),
                succeeded: false,
                error: Some("transfer error: HTTP 404".to_string()),
            },
        ];

        let path = write_report(dir.path(), &records).await.unwrap();
        let body = std::fs::read_to_string(path).unwrap();

        assert!(body.contains("1 downloaded, 1 failed"));
        assert!(body.contains("[ok] https://example.com/a.png"));
        assert!(body.contains("[failed] https://example.com/b.png"));
        assert!(body.contains("HTTP 404"));
    }

    #[tokio::test]
    async fn unwritable_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(write_report(&missing, &[]).await.is_err());
    }
}
