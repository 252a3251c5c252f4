//! Transfer worker pool — bounded-parallel batch download
//!
//! Every item in the batch is attempted independently under a semaphore cap;
//! the pool returns only after all attempts finished (full barrier) and
//! always yields exactly one [`DownloadRecord`] per input item. A fetch
//! failure never aborts the batch: it is recorded on the item's record.

use crate::error::{Error, Result};
use crate::hash::sha256_file;
use crate::types::{DownloadRecord, Event, MediaItem};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, Semaphore, broadcast};
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Transport collaborator: one blocking fetch of a URL into a destination path
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `url` into `dest`
    ///
    /// # Errors
    ///
    /// Non-2xx responses and transport-level failures are errors; the caller
    /// records the message on the item's [`DownloadRecord`].
    async fn fetch(&self, url: &str, dest: &Path) -> Result<()>;
}

/// HTTP transport backed by a shared reqwest client
#[derive(Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport with a fresh client
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        let mut response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Transfer(format!("HTTP {}", status.as_u16())));
        }
        // Stream the body chunk by chunk; media files can be multi-GB and
        // must never be buffered whole in memory.
        let mut file = tokio::fs::File::create(dest).await?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }
}

/// Download every item under a concurrency cap of `parallel`
///
/// Assumes `parallel >= 1`; the 1-5 policy range is a caller concern
/// ([`crate::config::Config::validate`]). Emits one
/// [`Event::FileCompleted`] per item regardless of outcome. The returned
/// order is completion order and carries no guarantee.
pub async fn download_all(
    items: Vec<MediaItem>,
    parallel: usize,
    transport: Arc<dyn Transport>,
    events: &broadcast::Sender<Event>,
) -> Vec<DownloadRecord> {
    let total = items.len();
    events.send(Event::BatchStarted { total }).ok();

    let semaphore = Arc::new(Semaphore::new(parallel));
    let records: Arc<Mutex<Vec<DownloadRecord>>> = Arc::new(Mutex::new(Vec::with_capacity(total)));
    let mut tasks = JoinSet::new();

    for item in items {
        let semaphore = Arc::clone(&semaphore);
        let records = Arc::clone(&records);
        let transport = Arc::clone(&transport);
        let events = events.clone();

        tasks.spawn(async move {
            let (record, skipped) = match semaphore.acquire_owned().await {
                // The permit is held across fetch and hashing, so the cap
                // bounds the whole per-item attempt.
                Ok(_permit) => fetch_one(transport.as_ref(), &item).await,
                // The semaphore is owned by this call and never closed; if
                // acquisition fails anyway the item is recorded as failed
                // rather than dropped, preserving one record per item.
                Err(_) => (
                    DownloadRecord {
                        url: item.url.clone(),
                        file_path: item.file_path.clone(),
                        content_hash: String::new(),
                        succeeded: false,
                        error: Some("download slot unavailable".to_string()),
                    },
                    false,
                ),
            };

            events
                .send(Event::FileCompleted {
                    file_path: record.file_path.clone(),
                    succeeded: record.succeeded,
                    skipped,
                })
                .ok();

            records.lock().await.push(record);
        });
    }

    // Barrier: the accumulator is only exposed after every worker joined.
    while tasks.join_next().await.is_some() {}

    let records = match Arc::try_unwrap(records) {
        Ok(mutex) => mutex.into_inner(),
        Err(shared) => shared.lock().await.split_off(0),
    };

    let succeeded = records.iter().filter(|r| r.succeeded).count();
    let failed = records.len() - succeeded;
    events
        .send(Event::TransferComplete { succeeded, failed })
        .ok();
    debug!(total, succeeded, failed, "transfer stage drained");

    records
}

/// Attempt one item: skip if the destination exists, otherwise fetch, then
/// hash whatever ended up on disk. Returns the record and whether the fetch
/// was skipped.
async fn fetch_one(transport: &dyn Transport, item: &MediaItem) -> (DownloadRecord, bool) {
    let mut skipped = false;

    let result = if tokio::fs::try_exists(&item.file_path).await.unwrap_or(false) {
        // Existing files are treated as successes and never overwritten or
        // re-validated, making re-runs idempotent.
        debug!(path = %item.file_path.display(), "destination exists, skipping fetch");
        skipped = true;
        Ok(())
    } else {
        transport.fetch(&item.url, &item.file_path).await
    };

    if let Err(err) = &result {
        warn!(url = %item.url, %err, "download failed");
    }

    // Hash reflects whatever bytes exist after the attempt; failed records
    // are excluded from dedup/conversion regardless of this value.
    let content_hash = sha256_file(&item.file_path).await.unwrap_or_default();

    let record = DownloadRecord {
        url: item.url.clone(),
        file_path: item.file_path.clone(),
        content_hash,
        succeeded: result.is_ok(),
        error: result.err().map(|err| err.to_string()),
    };
    (record, skipped)
}
