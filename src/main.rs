use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::error;

use frame_dedup::api::video::{resolve_frame, VideoDeduplicator};
use frame_dedup::core::video::PipelineConfig;

#[derive(Debug, Parser)]
#[command(name = "frame-dedup")]
#[command(about = "Reduce a video to its visually unique frames plus a frame remap index")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract, encode and deduplicate frames
    Run {
        /// JSON config file; flags below override it
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        input: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Maximum concurrent frame units
        #[arg(long)]
        concurrency: Option<usize>,
    },
    /// Print the stored frame a frame number resolves to
    Resolve {
        #[arg(long, default_value = "Output/data.json")]
        index: PathBuf,
        frame: u32,
    },
}

fn main() -> ExitCode {
    frame_dedup::init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            config,
            input,
            output,
            concurrency,
        } => run(config, input, output, concurrency),
        Commands::Resolve { index, frame } => resolve(index, frame),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(
    config_path: Option<PathBuf>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    concurrency: Option<usize>,
) -> Result<()> {
    let mut config = match &config_path {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(input) = input {
        config.input = input;
    }
    if let Some(output) = output {
        config.output_dir = output;
    }
    if let Some(concurrency) = concurrency {
        config.max_concurrency = concurrency;
    }

    let report = VideoDeduplicator::create(config)?
        .run()
        .context("pipeline run failed")?;

    println!(
        "Wrote {} ({} frames, {} unique, {} duplicates, {} omitted) in {:.2?}",
        report.index_path.display(),
        report.total_frames(),
        report.canonical_frames,
        report.duplicate_frames,
        report.omitted.len(),
        report.elapsed
    );
    Ok(())
}

fn resolve(index: PathBuf, frame: u32) -> Result<()> {
    match resolve_frame(&index, frame)
        .with_context(|| format!("failed to read index {}", index.display()))?
    {
        Some(target) => println!("{}", target),
        None => println!("frame {} is not in the index", frame),
    }
    Ok(())
}
