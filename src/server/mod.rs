//! HTTP front end: accepts audio uploads and answers with transcripts.

pub mod handlers;
pub mod request_id;
pub mod router;
pub mod state;
pub mod temp_audio;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::transcription::Transcriber;

pub use router::create_router;
pub use state::AppState;
pub use temp_audio::TempAudioFile;

/// Prepares the upload directory, binds the listener and serves until Ctrl-C / SIGTERM.
///
/// # Errors
/// - If the upload directory cannot be created
/// - If the address cannot be bound
pub async fn serve(config: &ServerConfig, transcriber: Arc<dyn Transcriber>) -> anyhow::Result<()> {
    prepare_upload_dir(&config.upload_dir).await?;

    let state = AppState::new(transcriber, config.upload_dir.clone());
    let router = create_router(state, config.max_upload_bytes());

    let address = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;

    tracing::info!(
        address = %listener.local_addr()?,
        upload_dir = %config.upload_dir.display(),
        max_upload_mb = config.max_upload_mb,
        "Listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Creates the upload directory, including missing parents, if it is absent.
pub(crate) async fn prepare_upload_dir(dir: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create upload directory {}", dir.display()))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
