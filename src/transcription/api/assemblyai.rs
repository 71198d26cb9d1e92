//! AssemblyAI API implementation.
//!
//! AssemblyAI transcribes asynchronously, so one transcription is three kinds of call:
//! 1. Upload the audio bytes to get an upload URL
//! 2. Create a transcription job referencing that URL
//! 3. Poll the job until it is `completed` or `error`
//!
//! Uploads are retried with exponential backoff on transient failures. Polling
//! follows the configured [`PollPolicy`](crate::transcription::PollPolicy).

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::TranscriptionConfig;
use crate::transcription::job::JobSnapshot;
use crate::transcription::poll::poll_until_terminal;
use crate::transcription::{Transcriber, TranscriptionError};

/// Response from the upload endpoint
#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload_url: String,
}

/// Request body for the transcription endpoint
#[derive(Debug, Serialize)]
struct TranscriptRequest<'a> {
    audio_url: &'a str,
    speech_model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    punctuate: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    format_text: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language_detection: Option<bool>,
}

/// Response from the job creation endpoint
#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: String,
}

/// Client for AssemblyAI's asynchronous transcription API.
///
/// Holds one pooled `reqwest::Client`; share it behind an `Arc` across requests.
pub struct AssemblyAiClient {
    client: reqwest::Client,
    config: TranscriptionConfig,
}

impl AssemblyAiClient {
    /// Builds the HTTP client with the configured timeouts.
    ///
    /// # Errors
    /// - If the underlying TLS backend cannot be initialized
    pub fn new(config: TranscriptionConfig) -> Result<Self, TranscriptionError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| TranscriptionError::ClientBuild(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &TranscriptionConfig {
        &self.config
    }

    /// Uploads audio, retrying transient failures with exponential backoff.
    pub async fn upload(&self, audio_data: &[u8]) -> Result<String, TranscriptionError> {
        let max_attempts = self.config.upload_retries.saturating_add(1);
        let mut delay = self.config.upload_retry_delay;
        let mut attempt: u32 = 1;

        loop {
            tracing::debug!(attempt, max_attempts, bytes = audio_data.len(), "Uploading audio to AssemblyAI");

            match self.try_upload(audio_data).await {
                Ok(upload_url) => return Ok(upload_url),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    tracing::warn!(
                        "Upload attempt {} failed: {}. Retrying in {}ms...",
                        attempt,
                        e,
                        delay.as_millis()
                    );
                    tokio::time::sleep(delay).await;
                    delay = next_retry_delay(delay);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_upload(&self, audio_data: &[u8]) -> Result<String, TranscriptionError> {
        let response = self
            .client
            .post(format!("{}/upload", self.config.base_url))
            .header("authorization", &self.config.api_key)
            .header("content-type", "application/octet-stream")
            .body(audio_data.to_vec())
            .send()
            .await
            .map_err(|e| network_error(e, "uploading audio"))?;

        let upload: UploadResponse = read_json(response, "upload").await?;
        tracing::debug!("Audio uploaded successfully");
        Ok(upload.upload_url)
    }

    /// Creates a transcription job for previously uploaded audio and returns its id.
    pub async fn submit(&self, audio_url: &str) -> Result<String, TranscriptionError> {
        let options = &self.config.options;
        let request = TranscriptRequest {
            audio_url,
            speech_model: &self.config.speech_model,
            punctuate: options.punctuate,
            format_text: options.format_text,
            language_detection: options.language_detection,
        };

        tracing::debug!(speech_model = %self.config.speech_model, "Submitting transcription request");
        let response = self
            .client
            .post(format!("{}/transcript", self.config.base_url))
            .header("authorization", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| network_error(e, "creating the transcription job"))?;

        let submitted: SubmitResponse = read_json(response, "transcript").await?;
        tracing::info!(transcript_id = %submitted.id, "Transcription job created");
        Ok(submitted.id)
    }

    /// Fetches the current state of a transcription job.
    pub async fn status(&self, transcript_id: &str) -> Result<JobSnapshot, TranscriptionError> {
        let response = self
            .client
            .get(format!("{}/transcript/{transcript_id}", self.config.base_url))
            .header("authorization", &self.config.api_key)
            .send()
            .await
            .map_err(|e| network_error(e, "polling the transcription job"))?;

        read_json(response, "poll").await
    }
}

#[async_trait]
impl Transcriber for AssemblyAiClient {
    async fn transcribe(&self, audio_path: &Path) -> Result<String, TranscriptionError> {
        let audio_data = tokio::fs::read(audio_path).await?;
        tracing::info!(
            path = %audio_path.display(),
            bytes = audio_data.len(),
            "Transcribing with AssemblyAI"
        );

        let upload_url = self.upload(&audio_data).await?;
        let transcript_id = self.submit(&upload_url).await?;

        let text = poll_until_terminal(&self.config.poll, |_| self.status(&transcript_id)).await?;
        tracing::info!(transcript_id = %transcript_id, chars = text.len(), "Transcription completed");
        Ok(text)
    }
}

/// Checks the status code and decodes the body, keeping "service said no"
/// apart from "service answered with something we can't read".
async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    endpoint: &str,
) -> Result<T, TranscriptionError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| network_error(e, "reading the response"))?;

    if !status.is_success() {
        return Err(TranscriptionError::Api {
            status: status.as_u16(),
            message: format_error(status.as_u16(), &body),
        });
    }

    serde_json::from_str(&body)
        .map_err(|e| TranscriptionError::MalformedResponse(format!("{endpoint} endpoint: {e}")))
}

fn next_retry_delay(delay: Duration) -> Duration {
    delay.saturating_mul(2)
}

fn network_error(e: reqwest::Error, during: &str) -> TranscriptionError {
    let message = if e.is_connect() {
        format!("Failed to connect to AssemblyAI API server while {during}. Check your internet connection.")
    } else if e.is_timeout() {
        format!("Request to AssemblyAI timed out while {during}. The API server is not responding.")
    } else {
        format!("AssemblyAI network error while {during}: {e}")
    };
    TranscriptionError::Network(message)
}

/// Formats HTTP error codes into human-readable messages.
fn format_error(status: u16, error_body: &str) -> String {
    match status {
        401 => "AssemblyAI API key is invalid or expired. Check ASSEMBLYAI_API_KEY.".to_string(),
        403 => "You don't have permission to use AssemblyAI's API. Check your API key and account status.".to_string(),
        429 => "Too many requests to AssemblyAI. You've hit the API rate limit. Please wait and try again.".to_string(),
        500 | 502 | 503 | 504 => "AssemblyAI API server is experiencing issues. Please try again later.".to_string(),
        _ => format!("AssemblyAI API error (status {status}): {error_body}"),
    }
}
