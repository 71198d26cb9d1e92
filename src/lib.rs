//! sttd: accepts audio uploads over HTTP and returns AssemblyAI transcripts.

pub mod app;
pub mod commands;
pub mod config;
pub mod logging;
pub mod server;
pub mod transcription;
