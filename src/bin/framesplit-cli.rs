use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use framesplit::{
    DEFAULT_WORKERS, ExtractionConfig, ExtractionSummary, FfmpegLogLevel, FfmpegSourceFactory,
    FrameExtractor, ImageFormat, ProgressRenderer, SourceFactory, partition,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  framesplit extract input.mp4 --out frames --every 10 --workers 8\n  framesplit plan 1234 5\n  framesplit probe input.mp4 --json\n  framesplit completions zsh > _framesplit";

#[derive(Debug, Parser)]
#[command(
    name = "framesplit",
    version,
    about = "Split a video into frame images with parallel decode workers",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Print per-worker reports.
    #[arg(long)]
    verbose: bool,

    /// Allow writing into an output directory that already has files.
    #[arg(long)]
    overwrite: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract frames into `<out>/<video stem>/`.
    #[command(
        about = "Extract video frames",
        after_help = "Examples:\n  framesplit extract input.mp4 --out frames\n  framesplit extract input.mp4 --out frames --every 30 --ext jpg --sequential"
    )]
    Extract {
        /// Input video path.
        input: PathBuf,
        /// Base output directory.
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// Write every Nth frame.
        #[arg(long, default_value_t = 1)]
        every: u64,
        /// Number of concurrent decode workers.
        #[arg(long, default_value_t = DEFAULT_WORKERS)]
        workers: usize,
        /// Output image extension (png, jpg, jpeg, bmp, tif, tiff).
        #[arg(long, default_value = "png")]
        ext: String,
        /// Hide the progress bar.
        #[arg(long)]
        no_progress: bool,
        /// Decode each worker's prefix instead of seeking.
        #[arg(long)]
        sequential: bool,
        /// Print the summary as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show how frames would be divided among workers.
    #[command(about = "Print a partition plan")]
    Plan {
        /// Total number of frames.
        #[arg(allow_negative_numbers = true)]
        total_frames: i64,
        /// Number of workers.
        #[arg(allow_negative_numbers = true)]
        workers: i64,
    },

    /// Print video stream information (alias: info).
    #[command(about = "Print video metadata", visible_alias = "info")]
    Probe {
        /// Input video path.
        input: PathBuf,
        /// Worker count to show a plan for.
        #[arg(long, default_value_t = DEFAULT_WORKERS)]
        workers: usize,
        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

/// Progress renderer backed by an `indicatif` bar.
struct IndicatifRenderer {
    bar: ProgressBar,
}

impl IndicatifRenderer {
    fn new(total: u64) -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(total);
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {per_sec} eta {eta}",
        )?;
        bar.set_style(style.progress_chars("=>-"));
        Ok(Self { bar })
    }
}

impl ProgressRenderer for IndicatifRenderer {
    fn render(&self, current: u64, _total: u64) {
        self.bar.set_position(current);
    }

    fn finish(&self) {
        self.bar.finish_with_message("done");
    }
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    // Several decoders warning at once would tear the progress bar apart.
    let level = match &global.log_level {
        Some(level) => level.parse::<FfmpegLogLevel>()?,
        None => FfmpegLogLevel::Error,
    };
    framesplit::set_ffmpeg_log_level(level);
    Ok(())
}

fn ensure_output_directory(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    let occupied = path.is_dir() && fs::read_dir(path)?.next().is_some();
    if !occupied {
        return Ok(());
    }
    if !overwrite {
        return Err(format!(
            "output directory is not empty: {} (use --overwrite)",
            path.display()
        )
        .into());
    }
    eprintln!(
        "{} {}",
        "warning:".yellow().bold(),
        format!("writing into existing directory {}", path.display()).yellow()
    );
    Ok(())
}

fn summary_json(summary: &ExtractionSummary) -> serde_json::Value {
    json!({
        "output_dir": summary.output_dir.display().to_string(),
        "total_frames": summary.total_frames,
        "frames_visited": summary.frames_visited,
        "frames_written": summary.frames_written,
        "decode_failures": summary.decode_failures,
        "write_failures": summary.write_failures,
        "elapsed_seconds": summary.elapsed.as_secs_f64(),
        "workers": summary.workers.iter().map(|report| json!({
            "worker": report.worker,
            "start": report.range.start,
            "stop": report.range.end,
            "frames_visited": report.frames_visited,
            "frames_written": report.frames_written,
            "seeked": report.seeked,
            "ended_early": report.ended_early,
        })).collect::<Vec<_>>(),
    })
}

fn print_ranges(boundaries: &[u64]) {
    for (worker, pair) in boundaries.windows(2).enumerate() {
        println!(
            "  worker {worker}: [{}, {}) {} frame(s)",
            pair[0],
            pair[1],
            pair[1] - pair[0]
        );
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Extract {
            input,
            out,
            every,
            workers,
            ext,
            no_progress,
            sequential,
            json,
        } => {
            let image_format = ext.parse::<ImageFormat>()?;
            ensure_output_directory(
                &framesplit::output_directory(&out, &input)?,
                cli.global.overwrite,
            )?;

            let factory = FfmpegSourceFactory::new(&input)?;
            let total_frames = factory.frame_count()?;

            let mut config = ExtractionConfig::new(&input)
                .with_save_dir(&out)
                .with_frame_interval(every)
                .with_workers(workers)
                .with_image_format(image_format)
                .with_seek(!sequential)
                .with_show_progress(!no_progress && !json);
            if !no_progress && !json {
                config = config.with_renderer(Arc::new(IndicatifRenderer::new(total_frames)?));
            }

            let extractor = FrameExtractor::with_factory(config, factory)?;
            let summary = extractor.run()?;

            if json {
                println!("{}", serde_json::to_string_pretty(&summary_json(&summary))?);
                return Ok(());
            }

            if cli.global.verbose {
                for report in &summary.workers {
                    eprintln!(
                        "worker {} [{}, {}): visited {}, wrote {}, {} decode / {} write failure(s){}{}",
                        report.worker,
                        report.range.start,
                        report.range.end,
                        report.frames_visited,
                        report.frames_written,
                        report.decode_failures,
                        report.write_failures,
                        if report.seeked { ", seeked" } else { "" },
                        if report.ended_early { ", ended early" } else { "" },
                    );
                }
            }

            if !summary.is_complete() {
                eprintln!(
                    "{} {}",
                    "warning:".yellow().bold(),
                    format!(
                        "stream ended after {} of {} frames",
                        summary.frames_visited, summary.total_frames
                    )
                    .yellow()
                );
            }

            println!(
                "{} {}",
                "success:".green().bold(),
                format!(
                    "Extracted {} frame(s) to {}",
                    summary.frames_written,
                    summary.output_dir.display()
                )
                .green()
            );
        }
        Commands::Plan {
            total_frames,
            workers,
        } => {
            let plan = partition(total_frames, workers)?;
            println!("Boundaries: {:?}", plan.boundaries());
            print_ranges(plan.boundaries());
        }
        Commands::Probe {
            input,
            workers,
            json,
        } => {
            let factory = FfmpegSourceFactory::new(&input)?;
            let metadata = factory.metadata();
            let plan = partition(
                i64::try_from(metadata.frame_count)?,
                i64::try_from(workers)?,
            )
            .ok();

            if json {
                let payload = json!({
                    "format": metadata.format,
                    "codec": metadata.codec,
                    "width": metadata.width,
                    "height": metadata.height,
                    "fps": metadata.frames_per_second,
                    "frame_count": metadata.frame_count,
                    "duration_seconds": metadata.duration.as_secs_f64(),
                    "boundaries": plan.as_ref().map(|plan| plan.boundaries().to_vec()),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Format: {}", metadata.format);
                println!(
                    "Video: {}x{} @ {:.2} fps [{}]",
                    metadata.width, metadata.height, metadata.frames_per_second, metadata.codec,
                );
                println!("Duration: {:?}", metadata.duration);
                println!("Frames: {}", metadata.frame_count);
                match plan {
                    Some(plan) => {
                        println!("Plan for {workers} worker(s):");
                        print_ranges(plan.boundaries());
                    }
                    None => println!("Plan: unavailable"),
                }
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "framesplit", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
