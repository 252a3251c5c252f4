//! # media-dl
//!
//! Concurrent batch downloader for remote media catalogs: lists a creator's
//! media through an HTTP catalog API, downloads the batch under a bounded
//! concurrency cap, removes content duplicates by SHA-256, and optionally
//! transcodes the survivors (images to AVIF, videos to AV1) through an
//! external ffmpeg binary.
//!
//! ## Design
//!
//! - **Staged pipeline** - catalog listing, transfer, dedup, and conversion
//!   run strictly in sequence; each stage fully drains before the next
//! - **Bounded concurrency** - a semaphore caps in-flight work per stage
//! - **Failures are data** - a failed item never aborts the batch; it shows
//!   up as an unsuccessful record or an unconverted file
//! - **Event-driven progress** - consumers subscribe to a broadcast channel,
//!   the pipeline never formats output itself
//!
//! ## Quick Start
//!
//! ```no_run
//! use media_dl::{Config, Pipeline};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.download.download_dir = "./downloads".into();
//!
//!     let pipeline = Pipeline::new(config)?;
//!
//!     // Subscribe to progress events
//!     let mut events = pipeline.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("{event:?}");
//!         }
//!     });
//!
//!     let summary = pipeline.run("fanwork", "alice").await?;
//!     println!(
//!         "{} files, {} duplicates removed",
//!         summary.records.len(),
//!         summary.dedup.deleted
//!     );
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Remote catalog listing
pub mod catalog;
/// Configuration types
pub mod config;
/// Conversion worker pool and encoder collaborators
pub mod convert;
/// Content deduplication
pub mod dedup;
/// Error types
pub mod error;
/// SHA-256 file hashing
pub mod hash;
/// Pipeline orchestration
pub mod pipeline;
/// Run report writing
pub mod report;
/// Usage telemetry
pub mod telemetry;
/// Transfer worker pool and transport collaborators
pub mod transfer;
/// Core types
pub mod types;
/// Path and file helpers
pub mod utils;

pub use config::Config;
pub use error::{Error, Result};
pub use pipeline::Pipeline;
pub use types::{
    ConversionOutcome, DedupStats, DownloadRecord, Event, MediaClass, MediaItem, RunSummary,
};
