//! API key resolution.
//!
//! The key is looked up once at startup and then handed to the client
//! explicitly; nothing reads the environment after that.

use super::file::AssemblyAiConfig;

/// Preferred environment variable for the AssemblyAI key
pub const API_KEY_ENV: &str = "ASSEMBLYAI_API_KEY";

/// Generic fallback variable
pub const FALLBACK_API_KEY_ENV: &str = "API_KEY";

/// Returns the API key from the environment or the config file.
///
/// # Errors
/// - If no non-empty key is found anywhere
pub fn get_api_key(config: &AssemblyAiConfig) -> anyhow::Result<String> {
    resolve_api_key(|name| std::env::var(name).ok(), config.api_key.as_deref()).ok_or_else(|| {
        anyhow::anyhow!(
            "No AssemblyAI API key found. Set {API_KEY_ENV} or add api_key under [assemblyai] in the config file"
        )
    })
}

/// Environment first (`ASSEMBLYAI_API_KEY`, then `API_KEY`), then the file. Blank values are skipped.
pub fn resolve_api_key(
    lookup_env: impl Fn(&str) -> Option<String>,
    file_key: Option<&str>,
) -> Option<String> {
    [API_KEY_ENV, FALLBACK_API_KEY_ENV]
        .iter()
        .filter_map(|name| lookup_env(*name))
        .chain(file_key.map(str::to_string))
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
}
