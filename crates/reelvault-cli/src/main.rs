//! Reelvault CLI: ingest local video files and resolve persisted locators.
//!
//! Storage, limits and tool paths come from the environment (see `.env`).

use anyhow::Context;
use clap::{Parser, Subcommand};
use reelvault_cli::{init_tracing, upload_request_from_file, IngestReport};
use reelvault_core::{Config, ErrorMetadata, VideoRecord};
use reelvault_processing::{
    sign_video_record, FFmpegTool, InMemoryVideoRecords, IngestionPipeline, PresignedUrlIssuer,
};
use reelvault_storage::create_storage;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "reelvault", about = "Video ingestion CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a file through the ingestion pipeline and store it
    Ingest {
        /// Path to the video file
        file: std::path::PathBuf,
        /// Declared media type of the file
        #[arg(long, default_value = "video/mp4")]
        content_type: String,
        /// Owning user (random when omitted)
        #[arg(long)]
        user_id: Option<Uuid>,
        /// Target video record (random when omitted)
        #[arg(long)]
        video_id: Option<Uuid>,
        /// Title for the video record
        #[arg(long, default_value = "untitled")]
        title: String,
    },
    /// Print a signed URL for a persisted locator field
    Resolve {
        /// Persisted field, e.g. "my-bucket,landscape/<key>.mp4"
        field: String,
    },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env().context("Invalid configuration")?;
    let storage = create_storage(&config)
        .await
        .context("Failed to initialize storage backend")?;
    let issuer = PresignedUrlIssuer::new(config.presigned_url_ttl()).with_store(storage.clone());

    match cli.command {
        Commands::Ingest {
            file,
            content_type,
            user_id,
            video_id,
            title,
        } => {
            let user_id = user_id.unwrap_or_else(Uuid::new_v4);
            let video_id = video_id.unwrap_or_else(Uuid::new_v4);

            let records = Arc::new(InMemoryVideoRecords::new());
            records.insert(VideoRecord::new(video_id, user_id, title))?;

            let tool = FFmpegTool::new(config.ffmpeg_path(), config.ffprobe_path())?;
            let pipeline =
                IngestionPipeline::from_config(&config, Arc::new(tool), storage, records);

            let request = upload_request_from_file(&file, &content_type, user_id, video_id).await?;
            let outcome = match pipeline.ingest(request).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    anyhow::bail!(
                        "{} ({}, stage: {}): {}",
                        e.client_message(),
                        e.error_code(),
                        e.stage(),
                        e
                    );
                }
            };

            let video = sign_video_record(&issuer, &outcome.record).await?;
            print_json(&IngestReport::new(&outcome, video))?;
        }
        Commands::Resolve { field } => {
            let url = issuer.resolve(&field).await?;
            println!("{}", url);
        }
    }

    Ok(())
}
