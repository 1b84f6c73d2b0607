//! Renderkit CLI: resolve render settings and queue renders.
//!
//! Usage:
//!   renderkit compositions            List compositions and the modes they allow
//!   renderkit still <ID> [OPTIONS]    Queue a still render
//!   renderkit video <ID> [OPTIONS]    Queue a video render
//!   renderkit audio <ID> [OPTIONS]    Queue an audio render
//!   renderkit jobs                    List queued render jobs
//!   renderkit config [--init]         Show (or write) the configuration

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "renderkit",
    about = "Resolve render settings for compositions and queue render jobs",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Composition list (JSON array of {id, durationInFrames})
    #[arg(long, global = true, default_value = "compositions.json")]
    compositions: PathBuf,

    /// Job queue directory (defaults to the configured jobs_dir)
    #[arg(long, global = true)]
    jobs_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available compositions
    Compositions,

    /// Queue a single-frame render
    Still {
        /// Composition id
        id: String,

        /// Frame to render (clamped to the composition)
        #[arg(long)]
        frame: Option<String>,

        /// Image format: png|jpeg
        #[arg(long)]
        format: Option<String>,

        #[command(flatten)]
        common: CommonRenderArgs,
    },

    /// Queue a video render
    Video {
        /// Composition id
        id: String,

        /// Video codec: h264|h265|vp8|vp9|prores|h264-mkv|gif
        #[arg(long)]
        codec: Option<String>,

        /// Frame format for the intermediate frames: png|jpeg
        #[arg(long)]
        image_format: Option<String>,

        /// Constant Rate Factor (clamped to the codec's range)
        #[arg(long)]
        crf: Option<u32>,

        #[command(flatten)]
        range: RangeArgs,

        #[command(flatten)]
        common: CommonRenderArgs,
    },

    /// Queue an audio-only render
    Audio {
        /// Composition id
        id: String,

        /// Audio codec: mp3|aac|wav
        #[arg(long)]
        codec: Option<String>,

        #[command(flatten)]
        range: RangeArgs,

        #[command(flatten)]
        common: CommonRenderArgs,
    },

    /// List queued render jobs
    Jobs {
        /// Print jobs as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config {
        /// Write the configuration file if it does not exist yet
        #[arg(long)]
        init: bool,
    },
}

/// Options shared by every render kind.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonRenderArgs {
    /// Output file name (suffix follows the format/codec unless given here)
    #[arg(short, long)]
    pub output: Option<String>,

    /// JPEG quality
    #[arg(long)]
    pub quality: Option<u8>,

    /// Output scale factor
    #[arg(long)]
    pub scale: Option<f64>,

    /// Pass verbose logging on to the renderer
    #[arg(long)]
    pub render_verbose: bool,
}

/// Frame range and parallelism for sequence renders.
#[derive(Args, Debug, Clone, Default)]
pub struct RangeArgs {
    /// First frame
    #[arg(long)]
    pub start: Option<String>,

    /// Last frame
    #[arg(long)]
    pub end: Option<String>,

    /// Frames rendered in parallel (clamped to the configured bounds)
    #[arg(long)]
    pub concurrency: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = renderkit_common::config::AppConfig::load();
    if let Some(dir) = cli.jobs_dir {
        config.jobs_dir = dir;
    }
    renderkit_common::logging::init_cli_logging(&config.logging, cli.verbose);

    match cli.command {
        Commands::Compositions => commands::compositions::run(&cli.compositions),
        Commands::Still {
            id,
            frame,
            format,
            common,
        } => {
            let request = commands::render::RenderRequest::still(id, frame, format, common);
            commands::render::run(&config, &cli.compositions, request).await
        }
        Commands::Video {
            id,
            codec,
            image_format,
            crf,
            range,
            common,
        } => {
            let request =
                commands::render::RenderRequest::video(id, codec, image_format, crf, range, common);
            commands::render::run(&config, &cli.compositions, request).await
        }
        Commands::Audio {
            id,
            codec,
            range,
            common,
        } => {
            let request = commands::render::RenderRequest::audio(id, codec, range, common);
            commands::render::run(&config, &cli.compositions, request).await
        }
        Commands::Jobs { json } => commands::jobs::run(&config, json),
        Commands::Config { init } => commands::config::run(&config, init),
    }
}
