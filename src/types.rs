//! Core types for media-dl

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One remote media item and its local destination path
///
/// Produced by the catalog collaborator and consumed exactly once by the
/// transfer worker pool. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaItem {
    /// Remote URL the bytes are fetched from
    pub url: String,
    /// Local path the bytes are written to (unique per item by construction)
    pub file_path: PathBuf,
}

/// Outcome of one fetch attempt
///
/// Exactly one record exists per input [`MediaItem`], regardless of whether
/// the fetch succeeded. The record set is the sole input to the dedup and
/// conversion stages; records with `succeeded == false` are excluded there.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadRecord {
    /// Remote URL that was fetched
    pub url: String,
    /// Local path of the (possibly partial or absent) file
    pub file_path: PathBuf,
    /// Lowercase hex SHA-256 over the bytes on disk after the attempt;
    /// empty when the file is absent or unreadable
    pub content_hash: String,
    /// Whether the fetch (or skip-on-existing) succeeded
    pub succeeded: bool,
    /// Human-readable cause when `succeeded` is false
    pub error: Option<String>,
}

/// Media class handled by a conversion worker pool instance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaClass {
    /// Still images (jpg/jpeg/png), converted to AVIF
    Image,
    /// Videos and animations (gif/mp4/m4v), converted to AV1 in mkv
    Video,
}

impl MediaClass {
    /// File extensions (lowercase, no dot) recognized for this class
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            MediaClass::Image => &["jpg", "jpeg", "png"],
            MediaClass::Video => &["gif", "mp4", "m4v"],
        }
    }

    /// Extension (no dot) of the conversion output for this class
    pub fn target_extension(&self) -> &'static str {
        match self {
            MediaClass::Image => "avif",
            MediaClass::Video => "mkv",
        }
    }

    /// Display name of the target codec, for progress output
    pub fn codec_name(&self) -> &'static str {
        match self {
            MediaClass::Image => "AVIF",
            MediaClass::Video => "AV1",
        }
    }

    /// Whether `path` has an extension recognized for this class
    ///
    /// Matching is case-insensitive on the extension.
    pub fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .is_some_and(|ext| self.extensions().contains(&ext.as_str()))
    }
}

impl std::fmt::Display for MediaClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaClass::Image => write!(f, "image"),
            MediaClass::Video => write!(f, "video"),
        }
    }
}

/// Counters returned by the deduplication stage
///
/// `failed_deletes` keeps best-effort deletion observable: a failed delete
/// never aborts the scan, but it is counted rather than discarded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupStats {
    /// Distinct content hashes among the successful records (files kept)
    pub survivors: usize,
    /// Duplicate files removed from disk
    pub deleted: usize,
    /// Duplicate files whose removal failed
    pub failed_deletes: usize,
}

/// Outcome of one conversion attempt, derived purely from filesystem
/// inspection after the encoder ran
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConversionOutcome {
    /// Input file handed to the encoder
    pub source_path: PathBuf,
    /// Derived output path (source with the class target extension)
    pub target_path: PathBuf,
    /// True iff the output exists with size > 0; the source was deleted
    pub succeeded: bool,
}

/// Aggregate result of one pipeline run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    /// Display name of the profile the files were downloaded from
    pub profile_name: String,
    /// One record per catalog item, in completion order
    pub records: Vec<DownloadRecord>,
    /// Deduplication counters
    pub dedup: DedupStats,
    /// Per-file conversion outcomes (empty when conversion was disabled)
    pub conversions: Vec<ConversionOutcome>,
}

impl RunSummary {
    /// Number of records that downloaded successfully
    pub fn succeeded(&self) -> usize {
        self.records.iter().filter(|r| r.succeeded).count()
    }

    /// Number of records that failed to download
    pub fn failed(&self) -> usize {
        self.records.len() - self.succeeded()
    }
}

/// Event emitted on the pipeline's broadcast channel
///
/// Consumers subscribe via [`crate::pipeline::Pipeline::subscribe`]; the
/// pipeline itself never formats progress output.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Transfer stage started
    BatchStarted {
        /// Number of items in the batch
        total: usize,
    },

    /// One item finished its transfer attempt (success, failure, or skip)
    FileCompleted {
        /// Destination path of the item
        file_path: PathBuf,
        /// Whether the attempt succeeded
        succeeded: bool,
        /// True when the fetch was skipped because the file already existed
        skipped: bool,
    },

    /// Transfer stage drained
    TransferComplete {
        /// Records with `succeeded == true`
        succeeded: usize,
        /// Records with `succeeded == false`
        failed: usize,
    },

    /// A duplicate file was removed from disk
    DuplicateRemoved {
        /// Path of the removed duplicate
        file_path: PathBuf,
    },

    /// Deduplication stage finished
    DedupComplete {
        /// Distinct content hashes kept
        survivors: usize,
        /// Duplicates removed
        deleted: usize,
        /// Removals that failed
        failed_deletes: usize,
    },

    /// A conversion worker pool started
    ConversionStarted {
        /// Media class being converted
        class: MediaClass,
        /// Number of matching files
        total: usize,
    },

    /// One file finished its conversion attempt
    FileConverted {
        /// Input file
        source_path: PathBuf,
        /// Derived output file
        target_path: PathBuf,
        /// True iff the output exists with size > 0
        succeeded: bool,
    },

    /// A conversion worker pool drained
    ConversionComplete {
        /// Media class that was converted
        class: MediaClass,
        /// Number of files converted successfully
        converted: usize,
    },
}
