//! Panframe CLI: headless access to the dynamic-crop pipeline.
//!
//! Usage:
//!   panframe probe <INPUT>                 Show video track information
//!   panframe interpolate <PATH> --at <T>   Print the crop rect at media times
//!   panframe smooth <PATH> -o <OUT>        Smooth a saved pan path
//!   panframe export <INPUT> [OPTIONS]      Export a cropped clip

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "panframe",
    about = "Record, smooth and render dynamic crop paths over video",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show video track information
    Probe {
        /// Media file to inspect
        input: PathBuf,
    },

    /// Print the interpolated crop rect of a pan path
    Interpolate {
        /// Pan path JSON file
        path: PathBuf,

        /// Media times to sample (seconds or [HH:]MM:SS.fff)
        #[arg(long = "at", num_args = 1.., required_unless_present = "fps")]
        at: Vec<String>,

        /// Sample the whole path at this rate instead of --at
        #[arg(long)]
        fps: Option<f64>,
    },

    /// Apply the moving-average smoother to a pan path
    Smooth {
        /// Pan path JSON file
        path: PathBuf,

        /// Output file (defaults to overwriting the input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Averaging window in keyframes
        #[arg(short, long)]
        window: Option<usize>,
    },

    /// Export a clip with a crop applied
    Export {
        /// Source media file
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Crop mode: none|static|spotlight|max-size
        #[arg(short, long, default_value = "none")]
        mode: String,

        /// Pan path JSON file for spotlight/max-size
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Static crop rectangle as x,y,width,height
        #[arg(long)]
        rect: Option<String>,

        /// Trim start (seconds or timecode)
        #[arg(long)]
        start: Option<String>,

        /// Trim end (seconds or timecode)
        #[arg(long)]
        end: Option<String>,

        /// Output format: mp4-h264|webm
        #[arg(long)]
        format: Option<String>,

        /// Smooth the pan path before rendering
        #[arg(long)]
        smooth: bool,

        /// Black background instead of the blurred frame
        #[arg(long)]
        no_blur: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = panframe_common::config::AppConfig::load();
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    panframe_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Probe { input } => commands::probe::run(input),
        Commands::Interpolate { path, at, fps } => commands::interpolate::run(path, at, fps),
        Commands::Smooth {
            path,
            output,
            window,
        } => commands::smooth::run(path, output, window.unwrap_or(config.export.smoothing_window)),
        Commands::Export {
            input,
            output,
            mode,
            path,
            rect,
            start,
            end,
            format,
            smooth,
            no_blur,
        } => {
            commands::export::run(
                &config,
                commands::export::ExportArgs {
                    input,
                    output,
                    mode,
                    path,
                    rect,
                    start,
                    end,
                    format,
                    smooth,
                    no_blur,
                },
            )
            .await
        }
    }
}
