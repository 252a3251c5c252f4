//! Conversion worker pool
//!
//! Re-encodes surviving files of one media class by invoking an external
//! encoder, under its own concurrency cap. Success is decided purely by
//! filesystem inspection: the source is deleted iff the derived output
//! exists with size > 0 afterward. Encoder exit status is logged but never
//! trusted beyond that, and a corrupt-but-nonempty output counts as success.

use crate::error::{Error, Result};
use crate::types::{ConversionOutcome, DownloadRecord, Event, MediaClass};
use crate::utils::{file_size, replace_extension};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::{Mutex, Semaphore, broadcast};
use tokio::task::JoinSet;
use tracing::{debug, info};

/// Encoder collaborator: transcodes one file into another format
///
/// Implementations wrap external executables; the pool only inspects the
/// filesystem afterward, never the process's structured output.
#[async_trait]
pub trait MediaEncoder: Send + Sync {
    /// Encode `input` into `output`
    ///
    /// # Errors
    ///
    /// Returns an error when the process cannot be spawned or exits
    /// non-zero. Callers treat this as advisory only; deletion of the
    /// source is driven by the output file check.
    async fn encode(&self, input: &Path, output: &Path) -> Result<()>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// ffmpeg-based encoder for one media class
///
/// Images become AVIF still pictures (libaom-av1), videos become AV1 in a
/// Matroska container (libsvtav1).
pub struct FfmpegEncoder {
    binary_path: PathBuf,
    class: MediaClass,
}

impl FfmpegEncoder {
    /// Create an encoder with an explicit ffmpeg path
    pub fn new(binary_path: PathBuf, class: MediaClass) -> Self {
        Self { binary_path, class }
    }

    /// Attempt to find ffmpeg in PATH
    pub fn from_path(class: MediaClass) -> Option<Self> {
        which::which("ffmpeg").ok().map(|path| Self::new(path, class))
    }
}

#[async_trait]
impl MediaEncoder for FfmpegEncoder {
    async fn encode(&self, input: &Path, output: &Path) -> Result<()> {
        let mut cmd = Command::new(&self.binary_path);
        cmd.arg("-y")
            .arg("-loglevel")
            .arg("error")
            .arg("-i")
            .arg(input);
        match self.class {
            MediaClass::Image => {
                cmd.args(["-c:v", "libaom-av1", "-still-picture", "1"]);
            }
            MediaClass::Video => {
                cmd.args(["-c:v", "libsvtav1"]);
            }
        }
        let result = cmd
            .arg(output)
            .output()
            .await
            .map_err(|err| Error::ExternalTool(format!("failed to execute ffmpeg: {err}")))?;

        if !result.status.success() {
            return Err(Error::ExternalTool(format!(
                "ffmpeg exited with {} for {}",
                result.status,
                input.display()
            )));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "cli-ffmpeg"
    }
}

/// Convert every matching surviving file under a concurrency cap
///
/// Filters the records to successful ones whose extension matches `class`
/// and whose file still exists (duplicates removed by the dedup stage are
/// not re-encoded). Per-item encoder failures never abort the pool; they
/// surface as `succeeded == false` outcomes.
pub async fn convert_all(
    records: &[DownloadRecord],
    class: MediaClass,
    encoder: Arc<dyn MediaEncoder>,
    parallel: usize,
    events: &broadcast::Sender<Event>,
) -> Vec<ConversionOutcome> {
    let mut sources = Vec::new();
    for record in records.iter().filter(|r| r.succeeded && class.matches(&r.file_path)) {
        if tokio::fs::try_exists(&record.file_path).await.unwrap_or(false) {
            sources.push(record.file_path.clone());
        }
    }

    if sources.is_empty() {
        return Vec::new();
    }

    let total = sources.len();
    events.send(Event::ConversionStarted { class, total }).ok();
    info!(%class, total, encoder = encoder.name(), "starting conversion");

    let semaphore = Arc::new(Semaphore::new(parallel));
    let outcomes: Arc<Mutex<Vec<ConversionOutcome>>> =
        Arc::new(Mutex::new(Vec::with_capacity(total)));
    let mut tasks = JoinSet::new();

    for source in sources {
        let semaphore = Arc::clone(&semaphore);
        let outcomes = Arc::clone(&outcomes);
        let encoder = Arc::clone(&encoder);
        let events = events.clone();

        tasks.spawn(async move {
            let outcome = match semaphore.acquire_owned().await {
                Ok(_permit) => convert_one(encoder.as_ref(), class, source).await,
                // Never closed by this pool; recorded as unconverted if it
                // fails regardless.
                Err(_) => {
                    let target = replace_extension(&source, class.target_extension());
                    ConversionOutcome {
                        source_path: source,
                        target_path: target,
                        succeeded: false,
                    }
                }
            };

            events
                .send(Event::FileConverted {
                    source_path: outcome.source_path.clone(),
                    target_path: outcome.target_path.clone(),
                    succeeded: outcome.succeeded,
                })
                .ok();

            outcomes.lock().await.push(outcome);
        });
    }

    // Barrier before the outcomes are exposed.
    while tasks.join_next().await.is_some() {}

    let outcomes = match Arc::try_unwrap(outcomes) {
        Ok(mutex) => mutex.into_inner(),
        Err(shared) => shared.lock().await.split_off(0),
    };

    let converted = outcomes.iter().filter(|o| o.succeeded).count();
    events.send(Event::ConversionComplete { class, converted }).ok();
    info!(%class, converted, total, "conversion finished");

    outcomes
}

/// Run the encoder for one file and decide success from the output file
async fn convert_one(
    encoder: &dyn MediaEncoder,
    class: MediaClass,
    source: PathBuf,
) -> ConversionOutcome {
    let target = replace_extension(&source, class.target_extension());

    if let Err(err) = encoder.encode(&source, &target).await {
        debug!(source = %source.display(), %err, "encoder invocation failed");
    }

    // Sole success signal: the output exists with nonzero size.
    let succeeded = file_size(&target).await.is_some_and(|size| size > 0);

    if succeeded {
        if let Err(err) = tokio::fs::remove_file(&source).await {
            debug!(source = %source.display(), %err, "failed to remove converted source");
        }
    }

    ConversionOutcome {
        source_path: source,
        target_path: target,
        succeeded,
    }
}
