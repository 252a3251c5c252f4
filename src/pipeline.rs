//! Pipeline orchestration
//!
//! Drives the stages strictly in sequence: catalog listing, transfer,
//! deduplication, report, then the optional conversion pools. Each stage
//! fully drains before the next begins; there is no cross-stage pipelining.
//! Per-item failures degrade to unsuccessful/unconverted items and never
//! fail the run as a whole.

use crate::catalog::{HttpCatalog, MediaCatalog};
use crate::config::{Config, ConversionConfig};
use crate::convert::{self, FfmpegEncoder, MediaEncoder};
use crate::dedup;
use crate::error::{Error, Result};
use crate::report;
use crate::telemetry::TelemetryClient;
use crate::transfer::{self, HttpTransport, Transport};
use crate::types::{Event, MediaClass, RunSummary};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// The download/dedup/convert pipeline
///
/// Collaborators are trait objects so tests can inject instrumented stubs
/// via [`Pipeline::with_collaborators`].
pub struct Pipeline {
    config: Config,
    catalog: Arc<dyn MediaCatalog>,
    transport: Arc<dyn Transport>,
    image_encoder: Option<Arc<dyn MediaEncoder>>,
    video_encoder: Option<Arc<dyn MediaEncoder>>,
    telemetry: TelemetryClient,
    event_tx: broadcast::Sender<Event>,
}

impl Pipeline {
    /// Create a pipeline with the default HTTP collaborators
    ///
    /// # Errors
    ///
    /// Fails when the configuration is invalid, or when conversion is
    /// enabled but no ffmpeg binary can be resolved.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let catalog = Arc::new(HttpCatalog::new(&config.catalog));
        let transport = Arc::new(HttpTransport::new());
        let image_encoder = if config.conversion.convert_images {
            Some(resolve_encoder(&config.conversion, MediaClass::Image)?)
        } else {
            None
        };
        let video_encoder = if config.conversion.convert_videos {
            Some(resolve_encoder(&config.conversion, MediaClass::Video)?)
        } else {
            None
        };
        let telemetry = TelemetryClient::new(&config.telemetry);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            config,
            catalog,
            transport,
            image_encoder,
            video_encoder,
            telemetry,
            event_tx,
        })
    }

    /// Create a pipeline with injected collaborators
    ///
    /// Conversion for a class runs only when the corresponding encoder is
    /// supplied and enabled in `config.conversion`.
    pub fn with_collaborators(
        config: Config,
        catalog: Arc<dyn MediaCatalog>,
        transport: Arc<dyn Transport>,
        image_encoder: Option<Arc<dyn MediaEncoder>>,
        video_encoder: Option<Arc<dyn MediaEncoder>>,
    ) -> Result<Self> {
        config.validate()?;
        let telemetry = TelemetryClient::new(&config.telemetry);
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            config,
            catalog,
            transport,
            image_encoder,
            video_encoder,
            telemetry,
            event_tx,
        })
    }

    /// Subscribe to pipeline progress events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Run the full pipeline for one service/user pair
    ///
    /// # Errors
    ///
    /// Only setup-level problems fail the run: unknown user, unreachable
    /// catalog, or an unwritable download directory. Individual download
    /// and conversion failures are reported through the summary instead.
    pub async fn run(&self, service: &str, user: &str) -> Result<RunSummary> {
        let profile_name = self.catalog.profile_name(service, user).await?;
        let dir = self.config.download.download_dir.join(&profile_name);
        tokio::fs::create_dir_all(&dir).await?;

        self.telemetry
            .track_start(
                service,
                &profile_name,
                self.config.download.max_concurrent_downloads,
                self.config.download.limit,
            )
            .await;

        let items = self
            .catalog
            .list_media(service, user, &dir, self.config.download.limit)
            .await?;
        info!(profile = %profile_name, items = items.len(), "catalog listed");

        let records = transfer::download_all(
            items,
            self.config.download.max_concurrent_downloads,
            Arc::clone(&self.transport),
            &self.event_tx,
        )
        .await;

        let dedup = dedup::remove_duplicates(&records, &self.event_tx).await;

        if let Err(err) = report::write_report(&dir, &records).await {
            warn!(%err, dir = %dir.display(), "failed to write report");
        }

        let mut conversions = Vec::new();
        if let Some(encoder) = &self.image_encoder {
            conversions.extend(
                convert::convert_all(
                    &records,
                    MediaClass::Image,
                    Arc::clone(encoder),
                    self.config.conversion.max_concurrent,
                    &self.event_tx,
                )
                .await,
            );
        }
        if let Some(encoder) = &self.video_encoder {
            conversions.extend(
                convert::convert_all(
                    &records,
                    MediaClass::Video,
                    Arc::clone(encoder),
                    self.config.conversion.max_concurrent,
                    &self.event_tx,
                )
                .await,
            );
        }

        let failed = records.iter().filter(|r| !r.succeeded).count();
        self.telemetry
            .track_end(service, &profile_name, records.len(), failed, dedup.deleted)
            .await;

        Ok(RunSummary {
            profile_name,
            records,
            dedup,
            conversions,
        })
    }
}

fn resolve_encoder(config: &ConversionConfig, class: MediaClass) -> Result<Arc<dyn MediaEncoder>> {
    if let Some(path) = &config.ffmpeg_path {
        return Ok(Arc::new(FfmpegEncoder::new(path.clone(), class)));
    }
    if config.search_path {
        if let Some(encoder) = FfmpegEncoder::from_path(class) {
            return Ok(Arc::new(encoder));
        }
    }
    Err(Error::ExternalTool(
        "ffmpeg not found; install it or set conversion.ffmpeg_path".to_string(),
    ))
}
