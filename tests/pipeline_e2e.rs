//! End-to-end pipeline test over a mock catalog server
//!
//! Exercises the full staged run: catalog listing, bounded-parallel
//! transfer, content dedup, report writing, and image conversion through an
//! injected in-process encoder.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use media_dl::catalog::HttpCatalog;
use media_dl::convert::MediaEncoder;
use media_dl::transfer::HttpTransport;
use media_dl::{Config, Pipeline};
use std::path::Path;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Encoder stub that "transcodes" by writing a fixed body to the output.
struct StubEncoder;

#[async_trait]
impl MediaEncoder for StubEncoder {
    async fn encode(&self, _input: &Path, output: &Path) -> media_dl::Result<()> {
        tokio::fs::write(output, b"encoded").await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

async fn mount_catalog(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/v1/fanwork/user/alice/profile"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "Alice"
        })))
        .mount(server)
        .await;

    let posts = serde_json::json!([
        {"file": {"name": "a.png", "path": "/aa/a.png"}, "attachments": []},
        {"file": {"name": "b.png", "path": "/bb/b.png"}, "attachments": []},
        {"file": {"name": "c.mp4", "path": "/cc/c.mp4"}, "attachments": []},
        {"file": {"name": "d.png", "path": "/dd/d.png"}, "attachments": []},
    ]);
    Mock::given(method("GET"))
        .and(path("/api/v1/fanwork/user/alice"))
        .and(query_param("o", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(posts))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/fanwork/user/alice"))
        .and(query_param("o", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(server)
        .await;

    // Two identical image payloads, one distinct video, one missing file.
    Mock::given(method("GET"))
        .and(path("/data/aa/a.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"same bytes".to_vec()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/bb/b.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"same bytes".to_vec()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/cc/c.mp4"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"video bytes".to_vec()))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/dd/d.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

#[tokio::test]
async fn full_run_downloads_dedups_reports_and_converts() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let download_dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.download.download_dir = download_dir.path().to_path_buf();
    config.catalog.base_url = server.uri();
    config.conversion.convert_images = true;

    let pipeline = Pipeline::with_collaborators(
        config.clone(),
        Arc::new(HttpCatalog::new(&config.catalog)),
        Arc::new(HttpTransport::new()),
        Some(Arc::new(StubEncoder)),
        None,
    )
    .unwrap();

    let summary = pipeline.run("fanwork", "alice").await.unwrap();
    let profile_dir = download_dir.path().join("Alice");

    // One record per catalog item, mixed outcomes.
    assert_eq!(summary.profile_name, "Alice");
    assert_eq!(summary.records.len(), 4);
    assert_eq!(summary.succeeded(), 3);
    let failed: Vec<_> = summary.records.iter().filter(|r| !r.succeeded).collect();
    assert_eq!(failed.len(), 1);
    assert!(failed[0].file_path.ends_with("d.png"));
    assert!(failed[0].error.as_deref().unwrap().contains("404"));

    // Dedup kept one of the identical images plus the video.
    assert_eq!(summary.dedup.deleted, 1);
    assert_eq!(summary.dedup.survivors, 2);
    assert_eq!(summary.dedup.failed_deletes, 0);
    let a_exists = profile_dir.join("a.png").exists();
    let b_exists = profile_dir.join("b.png").exists();
    assert!(profile_dir.join("c.mp4").exists());

    // The surviving image was converted: its .avif replaces the .png.
    assert_eq!(summary.conversions.len(), 1);
    assert!(summary.conversions[0].succeeded);
    assert!(!a_exists && !b_exists, "surviving png should have been converted away");
    let avif_count = [profile_dir.join("a.avif"), profile_dir.join("b.avif")]
        .iter()
        .filter(|p| p.exists())
        .count();
    assert_eq!(avif_count, 1);

    // The failed d.png produced no file and was not converted.
    assert!(!profile_dir.join("d.png").exists());
    assert!(!profile_dir.join("d.avif").exists());

    // Report lists every record.
    let report = std::fs::read_to_string(profile_dir.join("report.txt")).unwrap();
    assert!(report.contains("3 downloaded, 1 failed"));
    assert!(report.contains("a.png"));
    assert!(report.contains("[failed]"));
}

#[tokio::test]
async fn rerun_skips_existing_files_and_stays_stable() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let download_dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.download.download_dir = download_dir.path().to_path_buf();
    config.catalog.base_url = server.uri();

    let pipeline = Pipeline::with_collaborators(
        config.clone(),
        Arc::new(HttpCatalog::new(&config.catalog)),
        Arc::new(HttpTransport::new()),
        None,
        None,
    )
    .unwrap();

    let first = pipeline.run("fanwork", "alice").await.unwrap();
    assert_eq!(first.succeeded(), 3);
    assert_eq!(first.dedup.deleted, 1);

    // Second run: surviving files already exist and are skipped, the
    // duplicate is re-fetched and removed again.
    let second = pipeline.run("fanwork", "alice").await.unwrap();
    assert_eq!(second.records.len(), 4);
    assert_eq!(second.succeeded(), 3);
    assert_eq!(second.dedup.deleted, 1);
}

#[tokio::test]
async fn unknown_user_fails_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/fanwork/user/ghost/profile"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let download_dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.download.download_dir = download_dir.path().to_path_buf();
    config.catalog.base_url = server.uri();

    let pipeline = Pipeline::with_collaborators(
        config.clone(),
        Arc::new(HttpCatalog::new(&config.catalog)),
        Arc::new(HttpTransport::new()),
        None,
        None,
    )
    .unwrap();

    let err = pipeline.run("fanwork", "ghost").await.unwrap_err();
    assert!(err.to_string().contains("ghost"));
}
