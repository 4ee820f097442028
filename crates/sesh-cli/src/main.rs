//! sesh CLI: list venues and upload a surf session from local media files.
//!
//! Set SESH_API_TOKEN and SESH_API_URL for the backend. FFMPEG_PATH and
//! FFPROBE_PATH override tool lookup for video previews.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;

use sesh_cli::{content_type_for, init_tracing};
use sesh_client::ApiClient;
use sesh_core::{IngestConfig, ItemState, PublishGate, SessionDraft, SessionKind, VenueRef};
use sesh_ingest::{
    Dispatcher, IngestionQueue, MediaItemProcessor, RawFile, SessionAssembler,
};
use sesh_processing::image::CoverThumbnailGenerator;

#[derive(Parser)]
#[command(name = "sesh", about = "Session ingestion CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List venues (surf spots, or schools with --schools)
    Venues {
        /// List surf schools instead of locations
        #[arg(long)]
        schools: bool,
    },
    /// Validate, process and submit a session from local media files
    Upload(UploadArgs),
}

#[derive(Args)]
struct UploadArgs {
    /// Media files (photos and videos) to ingest
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// Session kind: freeSurf or lesson
    #[arg(long, default_value = "freeSurf")]
    kind: SessionKind,
    /// Venue id (a location for freeSurf, a school for lesson)
    #[arg(long)]
    venue: String,
    /// Session date (YYYY-MM-DD)
    #[arg(long)]
    date: NaiveDate,
    /// First hour of the session (0-23)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=23))]
    start_hour: u8,
    /// Last hour of the session (0-23)
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=23))]
    end_hour: u8,
    /// Price per photo
    #[arg(long, default_value = "0")]
    photo_price: Decimal,
    /// Price per video
    #[arg(long, default_value = "0")]
    video_price: Decimal,
    /// Photographer credit on image watermarks
    #[arg(long)]
    photographer: Option<String>,
    /// Process and assemble without submitting
    #[arg(long)]
    dry_run: bool,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn api_client() -> anyhow::Result<ApiClient> {
    ApiClient::from_env().context("Failed to create API client. Set SESH_API_TOKEN and SESH_API_URL")
}

async fn run_upload(args: UploadArgs) -> anyhow::Result<()> {
    let mut config = IngestConfig::from_env();
    if let Some(photographer) = args.photographer {
        config.photographer = photographer;
    }

    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(str::to_string)
            .unwrap_or_else(|| "item".to_string());
        let content_type = content_type_for(&file_name)
            .unwrap_or("application/octet-stream")
            .to_string();

        files.push(RawFile {
            file_name,
            content_type,
            bytes: data.into(),
        });
    }

    let queue = IngestionQueue::new(&config);
    let processor = MediaItemProcessor::new(&config)?;
    let ids = queue.admit_batch(files)?;
    println!("Processing {} files...", ids.len());

    let (settled_tx, mut settled_rx) = tokio::sync::mpsc::channel(ids.len().max(1));
    let dispatcher = Dispatcher::new(queue.clone(), Arc::new(processor), config.max_workers)
        .with_settled_notifications(settled_tx);
    dispatcher.dispatch_all(&ids);

    while queue.items().iter().any(|item| item.state.is_pending()) {
        if settled_rx.recv().await.is_none() {
            break;
        }
    }

    let items = queue.items();
    for item in &items {
        match &item.state {
            ItemState::Ready(asset) => match &asset.quality {
                Some(issue) => println!("  {}  ready ({})", item.source.file_name, issue),
                None => println!("  {}  ready", item.source.file_name),
            },
            ItemState::Failed { reason } => {
                println!("  {}  failed: {}", item.source.file_name, reason)
            }
            state => println!("  {}  {}", item.source.file_name, state),
        }
    }

    let mut draft = SessionDraft::new(args.kind);
    draft.venue = Some(match args.kind {
        SessionKind::FreeSurf => VenueRef::Location { id: args.venue },
        SessionKind::Lesson => VenueRef::School { id: args.venue },
    });
    draft.date = Some(args.date);
    draft.start_hour = Some(args.start_hour);
    draft.end_hour = Some(args.end_hour);
    draft.photo_price = args.photo_price;
    draft.video_price = args.video_price;

    let blockers = PublishGate::evaluate(&draft, &items);
    if !blockers.is_empty() {
        for reason in &blockers {
            println!("  blocked: {}", reason);
        }
        bail!("Session is not ready to submit");
    }

    let assembler = SessionAssembler::new(CoverThumbnailGenerator::new(&config));
    let payload = assembler.assemble(&draft, &items)?;
    println!(
        "Assembled {} items ({} photos, {} videos), {} cover thumbnails",
        payload.item_count(),
        payload.fields.photo_count,
        payload.fields.video_count,
        payload.thumbnails.len()
    );

    if args.dry_run {
        println!("Dry run: skipping submission");
        return Ok(());
    }

    let response = api_client()?.submit_session(&payload).await?;
    println!("{}", response.message);
    if let Some(id) = response.session_id {
        println!("Session id: {}", id);
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Venues { schools } => {
            let client = api_client()?;
            let venues = if schools {
                client.list_schools().await?
            } else {
                client.list_locations().await?
            };
            print_json(&venues)?;
        }
        Commands::Upload(args) => run_upload(args).await?,
    }

    Ok(())
}
