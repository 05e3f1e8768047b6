use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use jump_trainer::config::AppConfig;
use jump_trainer::error::{log_analysis_error, log_recording_error, AnalysisError};
use jump_trainer::fixtures::{PoseRecording, RecordingCatalog};
use jump_trainer::pipeline::{run_height_pipeline, run_phase_pipeline, JumpAnalyzer};
use jump_trainer::testing::SyntheticJump;
use serde::Serialize;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "jump_cli",
    about = "Deterministic pose recording harness for Jump Trainer"
)]
struct Cli {
    /// Override directory containing recordings (defaults to the bundled fixtures)
    #[arg(long, global = true)]
    recordings_dir: Option<PathBuf>,
    /// Log filter written to stderr (e.g. info, debug, jump_trainer=trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run both pipelines and print the merged jump report
    Analyze(RecordingArgs),
    /// Stream one phase update per frame as JSON lines
    Phases(RecordingArgs),
    /// Run only the flight-time height estimator
    Height(RecordingArgs),
    /// Write a synthetic jump recording
    Synth(SynthArgs),
    /// List available recordings on disk
    List,
}

#[derive(Args, Debug, Clone)]
struct RecordingArgs {
    /// Recording name in the catalog, or a path to a recording file
    #[arg(long)]
    recording: String,
    /// JSON configuration file; missing or invalid files fall back to defaults
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write the JSON result here instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
struct SynthArgs {
    #[arg(long)]
    output: PathBuf,
    #[arg(long, default_value_t = 12)]
    air_frames: usize,
    #[arg(long, default_value_t = 0x5A5A_FFF0)]
    seed: u64,
    /// Maximum pixel noise per coordinate
    #[arg(long, default_value_t = 0.0)]
    jitter: f64,
    #[arg(long)]
    name: Option<String>,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let catalog = cli
        .recordings_dir
        .map(RecordingCatalog::new)
        .unwrap_or_default();

    match cli.command {
        Commands::Analyze(args) => run_analyze(&catalog, &args),
        Commands::Phases(args) => run_phases(&catalog, &args),
        Commands::Height(args) => run_height(&catalog, &args),
        Commands::Synth(args) => run_synth(&args),
        Commands::List => run_list(&catalog),
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn load_inputs(
    catalog: &RecordingCatalog,
    args: &RecordingArgs,
) -> Result<(PoseRecording, AppConfig)> {
    let config = args
        .config
        .as_ref()
        .map(AppConfig::load_from_file)
        .unwrap_or_default();
    let recording = catalog
        .load(&args.recording)
        .map_err(|err| {
            log_recording_error(&err, "load_inputs");
            err
        })
        .with_context(|| format!("loading recording {}", args.recording))?;
    Ok((recording, config))
}

fn run_analyze(catalog: &RecordingCatalog, args: &RecordingArgs) -> Result<ExitCode> {
    let (recording, config) = load_inputs(catalog, args)?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("building tokio runtime")?;

    let report = runtime
        .block_on(JumpAnalyzer::new(config).analyze(recording))
        .map_err(|err| logged(err, "analyze"))?;
    emit_json(&report, args.output.as_deref())?;
    Ok(ExitCode::SUCCESS)
}

fn run_phases(catalog: &RecordingCatalog, args: &RecordingArgs) -> Result<ExitCode> {
    let (recording, config) = load_inputs(catalog, args)?;
    let fps = config.video.resolve_fps(recording.fps);

    let mut lines = Vec::with_capacity(recording.landmark_frames.len());
    let mut encode_error = None;
    run_phase_pipeline(&recording, fps, &config, |update| {
        match serde_json::to_string(update) {
            Ok(line) => lines.push(line),
            Err(err) => {
                encode_error.get_or_insert(err);
            }
        }
    })
    .map_err(|err| logged(err, "phases"))?;
    if let Some(err) = encode_error {
        return Err(err.into());
    }

    let mut body = lines.join("\n");
    body.push('\n');
    emit_text(&body, args.output.as_deref())?;
    Ok(ExitCode::SUCCESS)
}

fn run_height(catalog: &RecordingCatalog, args: &RecordingArgs) -> Result<ExitCode> {
    let (recording, config) = load_inputs(catalog, args)?;
    let fps = config.video.resolve_fps(recording.fps);
    let summary = run_height_pipeline(&recording, fps, &config.height)
        .map_err(|err| logged(err, "height"))?;

    let payload = HeightPayload {
        recording: &recording.name,
        fps,
        jump_height_m: summary.best_height_m,
        jump_count: summary.jumps.len(),
        summary: &summary,
    };
    emit_json(&payload, args.output.as_deref())?;
    Ok(ExitCode::SUCCESS)
}

fn run_synth(args: &SynthArgs) -> Result<ExitCode> {
    let mut jump = SyntheticJump::default()
        .with_air_frames(args.air_frames)
        .with_seed(args.seed)
        .with_jitter(args.jitter);
    if let Some(name) = &args.name {
        jump = jump.with_name(name.clone());
    }

    let recording = jump.generate();
    recording
        .save(&args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    println!(
        "{} -> {} ({} frames, expected height {:.3} m)",
        recording.name,
        args.output.display(),
        recording.frame_count(),
        jump.expected_height_m()
    );
    Ok(ExitCode::SUCCESS)
}

fn run_list(catalog: &RecordingCatalog) -> Result<ExitCode> {
    let recordings = catalog.discover()?;
    if recordings.is_empty() {
        println!("No recordings found under {}", catalog.root().display());
        return Ok(ExitCode::SUCCESS);
    }

    for metadata in recordings {
        println!("{} -> {}", metadata.name, metadata.path.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn logged(err: AnalysisError, context: &str) -> anyhow::Error {
    log_analysis_error(&err, context);
    err.into()
}

fn emit_json<T: Serialize>(value: &T, output_path: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    emit_text(&json, output_path)
}

fn emit_text(body: &str, output_path: Option<&Path>) -> Result<()> {
    if let Some(path) = output_path {
        fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{}", body.trim_end());
    }
    Ok(())
}

#[derive(Serialize)]
struct HeightPayload<'a> {
    recording: &'a str,
    fps: f64,
    jump_height_m: Option<f64>,
    jump_count: usize,
    summary: &'a jump_trainer::height::HeightSummary,
}
