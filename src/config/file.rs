//! Configuration file management for sttd.
//!
//! Configuration is read once at startup from a TOML file. Every field has a
//! default, so a missing file or a partial file is valid.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::transcription::api::{DEFAULT_BASE_URL, DEFAULT_SPEECH_MODEL};
use crate::transcription::poll::{DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_MAX_POLL_INTERVAL, DEFAULT_POLL_INTERVAL};
use crate::transcription::{PollPolicy, TranscriptOptions, TranscriptionConfig};

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory for request-scoped temporary audio files, created at startup
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Largest accepted request body in megabytes
    #[serde(default = "default_max_upload_mb")]
    pub max_upload_mb: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("temp_audio")
}

fn default_max_upload_mb() -> usize {
    100
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            upload_dir: default_upload_dir(),
            max_upload_mb: default_max_upload_mb(),
        }
    }
}

impl ServerConfig {
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

/// Job polling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub interval_secs: u64,
    /// Status checks before giving up; 0 polls until the job finishes
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// 1.0 keeps a fixed interval
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
    #[serde(default = "default_max_interval_secs")]
    pub max_interval_secs: u64,
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL.as_secs()
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_POLL_ATTEMPTS
}

fn default_backoff_multiplier() -> f64 {
    1.0
}

fn default_max_interval_secs() -> u64 {
    DEFAULT_MAX_POLL_INTERVAL.as_secs()
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval_secs(),
            max_attempts: default_max_attempts(),
            backoff_multiplier: default_backoff_multiplier(),
            max_interval_secs: default_max_interval_secs(),
        }
    }
}

impl PollConfig {
    pub fn policy(&self) -> PollPolicy {
        PollPolicy {
            interval: Duration::from_secs(self.interval_secs),
            max_attempts: (self.max_attempts > 0).then_some(self.max_attempts),
            backoff_multiplier: self.backoff_multiplier,
            max_interval: Duration::from_secs(self.max_interval_secs),
        }
    }
}

/// AssemblyAI API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyAiConfig {
    /// API key; the ASSEMBLYAI_API_KEY / API_KEY environment variables take precedence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_speech_model")]
    pub speech_model: String,
    /// Add punctuation to the transcript
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub punctuate: Option<bool>,
    /// Apply casing and text formatting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_text: Option<bool>,
    /// Detect the spoken language automatically
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_detection: Option<bool>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Extra attempts for transient upload failures
    #[serde(default = "default_upload_retries")]
    pub upload_retries: u32,
    #[serde(default)]
    pub poll: PollConfig,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_speech_model() -> String {
    DEFAULT_SPEECH_MODEL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_upload_retries() -> u32 {
    3
}

impl Default for AssemblyAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            speech_model: default_speech_model(),
            punctuate: None,
            format_text: None,
            language_detection: None,
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            upload_retries: default_upload_retries(),
            poll: PollConfig::default(),
        }
    }
}

impl AssemblyAiConfig {
    /// Builds the client configuration around an already resolved API key.
    pub fn transcription_config(&self, api_key: String) -> TranscriptionConfig {
        let mut config = TranscriptionConfig::new(api_key)
            .with_base_url(self.base_url.clone())
            .with_poll_policy(self.poll.policy());
        config.speech_model = self.speech_model.clone();
        config.options = TranscriptOptions {
            punctuate: self.punctuate,
            format_text: self.format_text,
            language_detection: self.language_detection,
        };
        config.request_timeout = Duration::from_secs(self.request_timeout_secs);
        config.connect_timeout = Duration::from_secs(self.connect_timeout_secs);
        config.upload_retries = self.upload_retries;
        config
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SttdConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub assemblyai: AssemblyAiConfig,
}

impl SttdConfig {
    /// Loads configuration from `path`, or from the default location when `None`.
    ///
    /// An explicitly given file must exist; a missing default file yields defaults.
    ///
    /// # Errors
    /// - If an explicit config file cannot be read
    /// - If the TOML is malformed
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => {
                    tracing::debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let config_content = fs::read_to_string(&config_path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file {}: {e}", config_path.display())
        })?;
        let config = Self::from_toml(&config_content).map_err(|e| {
            anyhow::anyhow!("Invalid config file {}: {e}", config_path.display())
        })?;

        tracing::info!("Loaded configuration from {}", config_path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// `~/.config/sttd/sttd.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("sttd").join("sttd.toml"))
}
