//! Transcription service for audio-to-text conversion.
//!
//! The HTTP layer only depends on the [`Transcriber`] trait. [`AssemblyAiClient`]
//! is the implementation used in production; tests swap in their own.

pub mod api;
pub mod error;
pub mod job;
pub mod poll;

use std::path::Path;

use async_trait::async_trait;

pub use api::{AssemblyAiClient, TranscriptOptions, TranscriptionConfig};
pub use error::TranscriptionError;
pub use job::{JobSnapshot, JobStatus};
pub use poll::PollPolicy;

/// Turns a local audio file into transcript text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio_path: &Path) -> Result<String, TranscriptionError>;
}
