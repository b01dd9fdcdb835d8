use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use voicecraft::client::{download_file_name, SpeechClient};
use voicecraft::config::DEFAULT_FUNCTION_PATH;
use voicecraft::synthesis::DEFAULT_VOICE_ID;

/// Convert text to an MP3 file through a running voicecraft server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input text to convert to speech
    #[arg(value_name = "TEXT")]
    input_text: String,

    /// Path to output MP3 file (default: voicecraft-<timestamp>.mp3)
    #[arg(value_name = "OUTPUT")]
    output_file: Option<PathBuf>,

    /// Voice identifier
    #[arg(short, long, default_value = DEFAULT_VOICE_ID)]
    voice: String,

    /// Server base URL
    #[arg(short, long, default_value = "http://127.0.0.1:8888")]
    server: String,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .ok();
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).try_init().ok();

    let url = format!(
        "{}{}",
        args.server.trim_end_matches('/'),
        DEFAULT_FUNCTION_PATH
    );
    let output_file = args
        .output_file
        .unwrap_or_else(|| PathBuf::from(download_file_name()));
    info!("Converting text to speech: '{}'", args.input_text);
    info!("Voice: {} via {}", args.voice, url);

    let client = SpeechClient::new(url);
    let audio = client
        .generate(&args.input_text, &args.voice)
        .await
        .context("Speech generation failed")?;

    tokio::fs::write(&output_file, &audio)
        .await
        .with_context(|| format!("Failed to write {}", output_file.display()))?;
    info!(
        "Successfully created MP3 file: {} ({} bytes)",
        output_file.display(),
        audio.len()
    );
    Ok(())
}
