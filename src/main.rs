//! media-dl command-line interface

use clap::{Args, Parser, Subcommand};
use media_dl::{Config, Error, Event, Pipeline};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Top-level CLI for media-dl
#[derive(Debug, Parser)]
#[command(name = "media-dl", version)]
#[command(about = "Mirror a creator's media catalog to local disk", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check that external dependencies (ffmpeg) are installed
    CheckDeps,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// Service the files are hosted on (catalog service slug)
    #[arg(short, long, env = "MEDIA_DL_SERVICE")]
    service: Option<String>,

    /// User whose files should be downloaded
    #[arg(short, long, env = "MEDIA_DL_USER")]
    user: Option<String>,

    /// Directory where the files will be saved
    #[arg(short, long, env = "MEDIA_DL_DIR", default_value = ".")]
    dir: PathBuf,

    /// Number of parallel downloads (1-5)
    #[arg(
        short,
        long,
        env = "MEDIA_DL_PARALLEL",
        default_value_t = 3,
        value_parser = clap::value_parser!(u8).range(1..=5)
    )]
    parallel: u8,

    /// Maximum number of files to download
    #[arg(long, env = "MEDIA_DL_LIMIT")]
    limit: Option<usize>,

    /// Catalog base URL
    #[arg(long, env = "MEDIA_DL_BASE_URL")]
    base_url: Option<String>,

    /// Disable telemetry
    #[arg(long, env = "MEDIA_DL_NO_TELEMETRY")]
    no_telemetry: bool,

    /// Convert downloaded images to AVIF (requires ffmpeg)
    #[arg(long, env = "MEDIA_DL_CONVERT_IMAGES")]
    convert_images: bool,

    /// Convert downloaded videos to AV1 (requires ffmpeg)
    #[arg(long, env = "MEDIA_DL_CONVERT_VIDEOS")]
    convert_videos: bool,
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,media_dl=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        eprintln!("media-dl error: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> media_dl::Result<()> {
    if let Some(Command::CheckDeps) = cli.command {
        check_deps();
        return Ok(());
    }

    let args = cli.run;
    let service = args.service.ok_or_else(|| {
        Error::config("required flag '--service' / '-s' is missing", "service")
    })?;
    let user = args
        .user
        .ok_or_else(|| Error::config("required flag '--user' / '-u' is missing", "user"))?;

    let mut config = Config::default();
    config.download.download_dir = media_dl::utils::expand_tilde(&args.dir);
    config.download.max_concurrent_downloads = args.parallel as usize;
    if let Some(limit) = args.limit {
        config.download.limit = limit;
    }
    if let Some(base_url) = args.base_url {
        config.catalog.base_url = base_url;
    }
    config.telemetry.enabled = !args.no_telemetry;
    config.conversion.convert_images = args.convert_images;
    config.conversion.convert_videos = args.convert_videos;

    let pipeline = Pipeline::new(config)?;
    let printer = spawn_event_printer(pipeline.subscribe());

    let result = pipeline.run(&service, &user).await;
    drop(pipeline); // closes the event channel so the printer drains and exits
    printer.await.ok();

    let summary = result?;
    println!(
        "\nDone! {} files ({} failed), {} duplicates removed, {} converted.",
        summary.records.len(),
        summary.failed(),
        summary.dedup.deleted,
        summary.conversions.iter().filter(|c| c.succeeded).count(),
    );
    Ok(())
}

fn spawn_event_printer(
    mut events: tokio::sync::broadcast::Receiver<Event>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut done = 0usize;
        let mut total = 0usize;
        while let Ok(event) = events.recv().await {
            match event {
                Event::BatchStarted { total: n } => {
                    total = n;
                    println!("Downloading {n} files...");
                }
                Event::FileCompleted {
                    file_path,
                    succeeded,
                    skipped,
                } => {
                    done += 1;
                    let mark = if skipped {
                        "skipped"
                    } else if succeeded {
                        "ok"
                    } else {
                        "failed"
                    };
                    println!("[{done}/{total}] {} ({mark})", file_path.display());
                }
                Event::DuplicateRemoved { file_path } => {
                    println!("[dup] removed {}", file_path.display());
                }
                Event::DedupComplete {
                    survivors, deleted, ..
                } => {
                    println!("Removed {deleted} duplicates, kept {survivors} unique files.");
                }
                Event::ConversionStarted { class, total } => {
                    println!("Converting {total} {class} files to {}...", class.codec_name());
                }
                Event::FileConverted {
                    source_path,
                    succeeded,
                    ..
                } => {
                    if succeeded {
                        println!("[convert] {}", source_path.display());
                    }
                }
                _ => {}
            }
        }
    })
}

fn check_deps() {
    match which::which("ffmpeg") {
        Ok(path) => println!("ffmpeg: {}", path.display()),
        Err(_) => {
            println!("ffmpeg: NOT FOUND (required for --convert-images / --convert-videos)");
        }
    }
}
