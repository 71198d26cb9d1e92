//! Configuration management for sttd.
//!
//! This module handles loading application configuration from a TOML file and
//! resolving the API credential from the environment.

pub mod file;
pub mod secrets;

pub use file::{default_config_path, AssemblyAiConfig, PollConfig, ServerConfig, SttdConfig};
pub use secrets::get_api_key;
