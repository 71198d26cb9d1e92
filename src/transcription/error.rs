//! Error kinds produced by the transcription client.

/// Everything that can go wrong between reading the local audio file and
/// receiving a finished transcript.
#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("Failed to read audio file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(String),
    #[error("{0}")]
    Network(String),
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("Malformed AssemblyAI response: {0}")]
    MalformedResponse(String),
    #[error("Transcription failed: {0}")]
    JobFailed(String),
    #[error("AssemblyAI transcription did not finish after {attempts} status checks")]
    PollTimeout { attempts: u32 },
}

impl TranscriptionError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
