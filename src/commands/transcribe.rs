//! Transcribe a local audio file without starting the server.
//!
//! Runs the same client the HTTP endpoint uses, which makes it handy for
//! checking an API key or a config file from the shell.

use std::path::PathBuf;

use crate::config::{self, SttdConfig};
use crate::transcription::{AssemblyAiClient, Transcriber};

/// Handles transcription of a pre-recorded audio file.
///
/// # Arguments
/// * `config` - Loaded application configuration
/// * `file` - Path to the audio file to transcribe
/// * `output_file` - Optional file path to write output to instead of stdout
pub async fn handle_transcribe(
    config: SttdConfig,
    file: PathBuf,
    output_file: Option<PathBuf>,
) -> Result<(), anyhow::Error> {
    tracing::info!("=== sttd Transcribe Command ===");

    if !file.exists() {
        return Err(anyhow::anyhow!("Audio file not found: {}", file.display()));
    }

    let api_key = config::get_api_key(&config.assemblyai)?;
    let client = AssemblyAiClient::new(config.assemblyai.transcription_config(api_key))?;

    tracing::info!("Transcribing file: {}", file.display());
    let text = client.transcribe(&file).await.map_err(|e| {
        tracing::error!("Transcription failed: {e}");
        anyhow::anyhow!("Transcription failed: {e}")
    })?;

    if let Some(path) = output_file {
        std::fs::write(&path, &text)
            .map_err(|e| anyhow::anyhow!("Failed to write to file '{}': {e}", path.display()))?;
        tracing::debug!("Transcribed text written to file: {}", path.display());
    } else {
        println!("{text}");
    }

    Ok(())
}
