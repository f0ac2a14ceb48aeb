use anyhow::{Context as _, bail};
use audioscribe::{
    AudioAsset, Config, ExportFormat, Phase, ProgressEvents, TranscriptionController,
    TranscriptionSettings,
};
use clap::Parser;
use dotenvy::dotenv;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Transcribe an audio file with a hosted speech-to-text service.
///
/// Reads the API key from ASSEMBLYAI_API_KEY (a .env file works too).
#[derive(Parser, Debug)]
#[command(name = "audioscribe", version)]
struct Args {
    /// Audio file to transcribe (mp3, wav, m4a, ogg; up to 100MB)
    file: PathBuf,

    /// Split the transcript by speaker, expecting this many speakers (2 to 10)
    #[arg(long, value_name = "COUNT", value_parser = clap::value_parser!(u32).range(2..=10))]
    speakers: Option<u32>,

    /// Output format: text, srt, json or json-pretty
    #[arg(long, default_value = "text")]
    format: ExportFormat,

    /// Write the transcript here instead of stdout
    #[arg(long, short, conflicts_with = "save")]
    output: Option<PathBuf>,

    /// Write the transcript next to the audio file, named after the format
    #[arg(long)]
    save: bool,
}

impl Args {
    fn output_path(&self) -> Option<PathBuf> {
        match &self.output {
            Some(path) => Some(path.clone()),
            None if self.save => Some(self.file.with_extension(self.format.extension())),
            None => None,
        }
    }
}

async fn render_progress(mut events: ProgressEvents) {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb.enable_steady_tick(Duration::from_millis(120));

    while let Some(event) = events.next().await {
        pb.set_position(event.overall.round() as u64);
        pb.set_message(event.phase.to_string());
    }

    pb.finish_and_clear();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::from_env().context("Set ASSEMBLYAI_API_KEY environment variable")?;

    let asset = AudioAsset::from_path(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    asset.validate()?;

    let settings = match args.speakers {
        Some(count) => TranscriptionSettings::with_speakers(count),
        None => TranscriptionSettings::default(),
    };

    let controller = TranscriptionController::from_config(&config);
    controller.select_asset(Some(asset));

    let progress = tokio::spawn(render_progress(controller.progress_events()));

    let interrupted = tokio::select! {
        _ = controller.start(settings) => false,
        _ = tokio::signal::ctrl_c() => true,
    };

    if interrupted {
        warn!("Interrupted, abandoning transcription");
        controller.reset();
        progress.abort();
        bail!("Transcription interrupted");
    }
    let _ = progress.await;

    let state = controller.state();
    if state.phase != Phase::Completed {
        bail!(
            "{}",
            state.error.unwrap_or_else(|| "Transcription failed".to_string())
        );
    }

    let result = state
        .result
        .context("Transcription completed without a transcript")?;

    info!(
        "Transcribed {:.1}s of audio: ~{} words, confidence {:.2}",
        result.audio_duration_secs,
        result.text.split_whitespace().count(),
        result.confidence
    );
    if result.has_speakers() {
        info!("Speakers: {}", result.speakers().len());
    }

    match args.output_path() {
        Some(path) => {
            result
                .save_to_file(&path, args.format)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Transcript written to {}", path.display());
        }
        None => println!("{}", result.export(args.format)),
    }

    Ok(())
}
