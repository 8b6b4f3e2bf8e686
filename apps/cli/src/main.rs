use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::Result;
use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressFinish, ProgressStyle};

use vidseo_core::{
    AnalysisResult, Config, FfmpegFrameSource, GeminiClient, default_report_path,
    format_report_readable, format_timestamp, json_report_path, sample_frames, save_report,
    save_report_json,
};

mod cards;
mod logging;

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        format!("{:.0}m {:.0}s", (secs / 60.0).floor(), secs % 60.0)
    }
}

#[derive(Parser)]
#[command(name = "vidseo")]
#[command(
    about = "Sample frames from a video and generate AI-powered SEO recommendations with Gemini"
)]
struct Cli {
    /// Video file to analyze
    video: PathBuf,

    /// Number of evenly spaced frames to send (defaults to VIDSEO_FRAME_COUNT or 8)
    #[arg(short = 'n', long)]
    frames: Option<usize>,

    /// Gemini model identifier (defaults to VIDSEO_MODEL)
    #[arg(short, long)]
    model: Option<String>,

    /// Where to write the plain-text report (defaults to vidseo-report-<video>.txt)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the raw analysis as JSON instead of cards, and save JSON next to the report
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Exit status after Ctrl-C, as a shell reports SIGINT.
const INTERRUPTED_EXIT_CODE: i32 = 130;

fn create_spinner(msg: &str) -> ProgressBar {
    // Cleared when dropped unfinished, e.g. on Ctrl-C.
    let pb = ProgressBar::new_spinner().with_finish(ProgressFinish::AndClear);
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn fail(err: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", style("Error:").red().bold(), err);
    std::process::exit(1);
}

/// Sample frames and analyze them, one spinner per step.
async fn run_pipeline(
    config: &Config,
    client: &GeminiClient<'_>,
    source: &FfmpegFrameSource,
    video: &Path,
) -> vidseo_core::Result<AnalysisResult> {
    // Step 1: Sample frames
    let step_start = Instant::now();
    let spinner = create_spinner(&format!(
        "Sampling {} frames from {}...",
        config.sampler.frame_count,
        video.display()
    ));
    let frames = sample_frames(
        source,
        video,
        config.sampler.frame_count,
        config.sampler.jpeg_quality,
    )
    .await?;
    let span = frames
        .last()
        .map(|f| format_timestamp(f.timestamp))
        .unwrap_or_default();
    spinner.finish_with_message(format!(
        "{} Sampled {} frames (00:00 → {}) {}",
        style("✓").green().bold(),
        frames.len(),
        span,
        style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
    ));

    // Step 2: Analyze
    let step_start = Instant::now();
    let spinner = create_spinner(&format!(
        "Analyzing with {}...",
        style(&config.analysis.model).yellow()
    ));
    let result = client.analyze(&frames).await?;
    spinner.finish_with_message(format!(
        "{} Analysis complete ({}) {}",
        style("✓").green().bold(),
        config.analysis.model,
        style(format!("[{}]", format_duration(step_start.elapsed()))).dim()
    ));

    Ok(result)
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut config = Config::from_env();
    if let Some(frames) = cli.frames {
        config.sampler.frame_count = frames;
    }
    if let Some(model) = cli.model {
        config.analysis.model = model;
    }

    // Validate API key early
    let client = match GeminiClient::new(&config.analysis) {
        Ok(client) => client,
        Err(e) => fail(e),
    };

    let source = match FfmpegFrameSource::new() {
        Ok(source) => source,
        Err(e) => fail(e),
    };

    println!(
        "\n{}  {}\n",
        style("vidseo").cyan().bold(),
        style("Video SEO Analyzer").dim()
    );

    let total_start = Instant::now();

    // Dropping the pipeline on Ctrl-C kills a running ffmpeg, aborts the
    // request and removes the frame directory before exiting.
    let outcome = tokio::select! {
        result = run_pipeline(&config, &client, &source, &cli.video) => Some(result),
        _ = tokio::signal::ctrl_c() => None,
    };
    let result = match outcome {
        Some(Ok(result)) => result,
        Some(Err(e)) => fail(e),
        None => {
            eprintln!("\n{}", style("Interrupted").yellow().bold());
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    };

    // Step 3: Save report
    let report_path = cli
        .output
        .unwrap_or_else(|| default_report_path(&cli.video));
    save_report(&result, &report_path).await?;
    if cli.json {
        save_report_json(&result, &json_report_path(&report_path)).await?;
    }

    println!(
        "\n{} {}\n",
        style("Total time:").dim(),
        style(format_duration(total_start.elapsed())).cyan().bold()
    );
    println!(
        "{} {}\n",
        style("Saved:").dim(),
        style(report_path.display()).cyan()
    );
    println!("{}", style("─".repeat(60)).dim());

    print_result(&result, cli.json)?;

    Ok(())
}

fn print_result(result: &AnalysisResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else if console::Term::stdout().is_term() {
        println!("{}", cards::render(result));
    } else {
        println!("{}", format_report_readable(result));
    }
    Ok(())
}
