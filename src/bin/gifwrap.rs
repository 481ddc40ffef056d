use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use gifwrap::ffmpeg::FfmpegOpener;
use gifwrap::{
    ConvertOptions, DisposalMethod, GifConverter, PipelineStage, ProgressCallback, ProgressInfo,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  gifwrap clip.mov\n  gifwrap clip.mov --fps 10 --width 480 --height 270 --out gifs\n  gifwrap a.mov b.mp4 --progress --json";

#[derive(Debug, Parser)]
#[command(
    name = "gifwrap",
    version,
    about = "Convert short video clips into optimized animated GIFs",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Input clips (MOV/MP4). Each becomes <out>/<stem>.gif.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output directory for the finished GIFs (created if missing).
    #[arg(long, default_value = "gifs")]
    out: PathBuf,

    /// Sampling rate in frames per second.
    #[arg(long, default_value_t = 15.0)]
    fps: f64,

    /// Disposal method for the finished GIF (0-6; 2 = restore to background).
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(0..=6))]
    disposal: u8,

    /// Output width in pixels.
    #[arg(long, default_value_t = 320)]
    width: u32,

    /// Output height in pixels.
    #[arg(long, default_value_t = 180)]
    height: u32,

    /// Recompression quality (0.0 = smallest file, 1.0 = best fidelity).
    #[arg(long, default_value_t = 0.0)]
    quality: f32,

    /// How many times the GIF repeats (0 = forever).
    #[arg(long, default_value_t = 0)]
    loops: u16,

    /// Delete each source clip after its GIF is written.
    #[arg(long)]
    remove_source: bool,

    /// Show a progress bar per clip.
    #[arg(long)]
    progress: bool,

    /// Print results as machine-readable JSON.
    #[arg(long)]
    json: bool,
}

/// Bridges pipeline progress onto an indicatif bar.
struct BarProgress {
    bar: ProgressBar,
}

impl ProgressCallback for BarProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        match info.stage {
            PipelineStage::Sampling => {
                if let Some(total) = info.total {
                    self.bar.set_length(total);
                }
                self.bar.set_position(info.current);
                self.bar.set_message("sampling");
            }
            PipelineStage::Transforming => self.bar.set_message("transforming"),
            PipelineStage::Assembling => self.bar.set_message("assembling"),
            PipelineStage::Patching => self.bar.set_message("patching"),
            PipelineStage::Persisting => self.bar.set_message("persisting"),
            _ => {}
        }
    }
}

fn make_progress_bar(enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(1);
    bar.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    bar
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Clap already bounds the value; this keeps the validated type as the
    // single source of truth.
    let disposal = match DisposalMethod::new(cli.disposal) {
        Ok(disposal) => disposal,
        Err(error) => {
            eprintln!("{} {error}", "error:".red().bold());
            return ExitCode::FAILURE;
        }
    };

    let mut results = Vec::new();
    let mut failures = 0usize;

    for input in &cli.inputs {
        let bar = make_progress_bar(cli.progress);
        let options = ConvertOptions::new()
            .with_frame_rate(cli.fps)
            .with_disposal(disposal)
            .with_dimensions(cli.width, cli.height)
            .with_quality(cli.quality)
            .with_loop_count(cli.loops)
            .with_remove_source(cli.remove_source)
            .with_progress(Arc::new(BarProgress { bar: bar.clone() }));
        let converter = GifConverter::new(FfmpegOpener::new()).with_options(options);

        match converter.convert(input, &cli.out).await {
            Ok(report) => {
                bar.finish_and_clear();
                if cli.json {
                    results.push(json!({
                        "input": input.display().to_string(),
                        "output": report.output_path.display().to_string(),
                        "frames_requested": report.frames_requested,
                        "frames_sampled": report.frames_sampled,
                        "frames_encoded": report.frames_encoded,
                    }));
                } else {
                    println!(
                        "{} {} -> {} ({} frames)",
                        "✓".green().bold(),
                        input.display(),
                        report.output_path.display(),
                        report.frames_encoded,
                    );
                }
            }
            Err(error) => {
                bar.finish_and_clear();
                failures += 1;
                if cli.json {
                    results.push(json!({
                        "input": input.display().to_string(),
                        "error": error.to_string(),
                    }));
                } else {
                    eprintln!("{} {}: {error}", "✗".red().bold(), input.display());
                }
            }
        }
    }

    if cli.json {
        match serde_json::to_string_pretty(&results) {
            Ok(rendered) => println!("{rendered}"),
            Err(error) => eprintln!("{} failed to render JSON: {error}", "error:".red().bold()),
        }
    }

    if failures > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
