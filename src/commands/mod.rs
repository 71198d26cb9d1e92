//! Application command handlers for sttd.
//!
//! # Commands
//! - `serve`: Run the HTTP transcription server (default)
//! - `transcribe`: Transcribe a local audio file once
//! - `logs`: Display recent log entries

pub mod logs;
pub mod serve;
pub mod transcribe;

pub use logs::handle_logs;
pub use serve::handle_serve;
pub use transcribe::handle_transcribe;
