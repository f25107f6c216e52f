//! `adsurf` command-line driver.

use std::path::PathBuf;
use std::sync::Arc;

use adsurf_media::{check_ffmpeg, check_ffprobe, FfmpegBackend};
use adsurf_models::{ConfirmedSubset, PipelineStatus};
use adsurf_pipeline::{
    init_tracing, PipelineConfig, PipelineContext, PipelineOrchestrator, TuningStore,
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "adsurf",
    about = "Find stable surfaces in a video and insert a logo into them"
)]
struct Cli {
    /// Workspace root (defaults to ADSURF_WORK_DIR or the current directory).
    #[arg(long, global = true)]
    work_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan and detect, then stop for review of the previews.
    Scan(Inputs),
    /// Insert into the reviewed surfaces.
    Insert {
        #[command(flatten)]
        inputs: Inputs,
        /// Instance indices to keep; defaults to the previews left on disk.
        #[arg(long, value_delimiter = ',')]
        keep: Option<Vec<usize>>,
    },
    /// Scan, detect and insert without a review pause.
    Run {
        #[command(flatten)]
        inputs: Inputs,
        /// Instance indices to keep; defaults to every instance.
        #[arg(long, value_delimiter = ',')]
        keep: Option<Vec<usize>>,
    },
}

#[derive(clap::Args, Debug)]
struct Inputs {
    /// Source video, relative paths resolve against the input directory.
    #[arg(long)]
    video: PathBuf,
    /// Logo image (PNG or JPEG, RGB or RGBA).
    #[arg(long)]
    logo: PathBuf,
}

fn print_status(status: &PipelineStatus) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(status)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();
    let cli = Cli::parse();

    let mut config = PipelineConfig::from_env();
    if let Some(dir) = cli.work_dir {
        let overridden = PipelineConfig::with_work_dir(dir);
        config.work_dir = overridden.work_dir;
        config.input_dir = overridden.input_dir;
        config.default_conf_path = overridden.default_conf_path;
        config.user_conf_path = overridden.user_conf_path;
    }
    info!("Pipeline config: {:?}", config);

    check_ffmpeg().context("ffmpeg is required")?;
    check_ffprobe().context("ffprobe is required")?;

    let tuning = TuningStore::from_config(&config)
        .load()
        .context("load tuning configuration")?;
    let backend = FfmpegBackend::new(config.encode.clone()).with_timeout(config.ffmpeg_timeout_secs);
    let orchestrator = PipelineOrchestrator::new(Arc::new(backend), config);

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received interrupt, cancelling at the next frame");
            cancel_tx.send(true).ok();
        }
    });
    let mut ctx: PipelineContext = orchestrator.context().with_cancel(cancel_rx);

    match cli.command {
        Command::Scan(inputs) => {
            let status = orchestrator
                .scan(&mut ctx, &inputs.video, &inputs.logo, &tuning)
                .await?;
            print_status(&status)?;
        }
        Command::Insert { inputs, keep } => {
            let confirmed = keep.map(ConfirmedSubset::from_iter);
            let status = orchestrator
                .insert(&mut ctx, &inputs.video, &inputs.logo, confirmed)
                .await?;
            print_status(&status)?;
        }
        Command::Run { inputs, keep } => {
            let scanned = orchestrator
                .scan(&mut ctx, &inputs.video, &inputs.logo, &tuning)
                .await?;
            if scanned.instances.is_empty() {
                return print_status(&scanned);
            }
            let confirmed = keep
                .map(ConfirmedSubset::from_iter)
                .unwrap_or_else(|| ConfirmedSubset::all(scanned.instances.len()));
            let status = orchestrator
                .insert(&mut ctx, &inputs.video, &inputs.logo, Some(confirmed))
                .await?;
            print_status(&status)?;
        }
    }
    Ok(())
}
