//! Remote transcription API clients.
//!
//! Holds the request-level configuration shared by the client and the
//! AssemblyAI implementation of the upload→transcribe→poll flow.

mod assemblyai;

use std::time::Duration;

use super::poll::PollPolicy;

pub use assemblyai::AssemblyAiClient;

/// AssemblyAI v2 REST API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.assemblyai.com/v2";

/// Speech model requested when creating a job ('best' or 'nano')
pub const DEFAULT_SPEECH_MODEL: &str = "best";

/// Optional transcript formatting switches; unset fields are left to the service default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptOptions {
    pub punctuate: Option<bool>,
    pub format_text: Option<bool>,
    pub language_detection: Option<bool>,
}

/// Configuration for transcription requests, resolved once at startup.
#[derive(Clone)]
pub struct TranscriptionConfig {
    /// The API key sent in the authorization header
    pub api_key: String,
    /// Base URL of the API, without a trailing slash
    pub base_url: String,
    /// Model name sent as `speech_model`
    pub speech_model: String,
    pub options: TranscriptOptions,
    pub poll: PollPolicy,
    /// Timeout for any single HTTP request
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    /// Extra attempts for transient upload failures
    pub upload_retries: u32,
    /// First retry delay, doubled after every failed attempt
    pub upload_retry_delay: Duration,
}

impl TranscriptionConfig {
    /// Creates a configuration with AssemblyAI defaults for everything but the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            speech_model: DEFAULT_SPEECH_MODEL.to_string(),
            options: TranscriptOptions::default(),
            poll: PollPolicy::default(),
            request_timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            upload_retries: 3,
            upload_retry_delay: Duration::from_millis(1000),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }
}

impl std::fmt::Debug for TranscriptionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscriptionConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("speech_model", &self.speech_model)
            .field("options", &self.options)
            .field("poll", &self.poll)
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("upload_retries", &self.upload_retries)
            .finish()
    }
}
