//! Run the HTTP transcription server.

use std::sync::Arc;

use crate::config::{self, SttdConfig};
use crate::server;
use crate::transcription::AssemblyAiClient;

/// Starts the server with the loaded configuration.
///
/// `host` and `port` override the config file when given.
///
/// # Errors
/// - If no API key can be resolved
/// - If the HTTP client cannot be built
/// - If the server fails to start
pub async fn handle_serve(
    mut config: SttdConfig,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), anyhow::Error> {
    tracing::info!("=== sttd Serve Command ===");

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let api_key = config::get_api_key(&config.assemblyai)?;
    let transcription_config = config.assemblyai.transcription_config(api_key);
    tracing::debug!(?transcription_config, "Transcription client configured");

    let client = AssemblyAiClient::new(transcription_config)?;
    server::serve(&config.server, Arc::new(client)).await
}
