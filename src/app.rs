//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::commands;
use crate::config::SttdConfig;
use crate::logging;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

/// Speech-to-text relay: upload audio over HTTP, get a transcript back
#[derive(Parser)]
#[command(name = "sttd")]
#[command(version)]
#[command(long_about = "Speech-to-text relay: upload audio over HTTP, get a transcript back.\n\nDEFAULT COMMAND:\n    If no command is specified, 'serve' is used by default.\n\nEXAMPLES:\n    # Start the server on the configured address (default 127.0.0.1:5000)\n    $ ASSEMBLYAI_API_KEY=... sttd\n\n    # Start on another port\n    $ sttd serve --port 8080\n\n    # Upload a recording\n    $ curl -F audio=@memo.webm http://127.0.0.1:5000/upload-audio\n\n    # Transcribe a file once and print the text\n    $ sttd transcribe memo.webm")]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/sttd/sttd.toml\n    API key:            ASSEMBLYAI_API_KEY (or API_KEY)\n    Logs:               ~/.local/state/sttd/sttd.log.*"
)]
struct Cli {
    /// Path to the config file (defaults to ~/.config/sttd/sttd.toml)
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    ///
    /// Accepts POST /upload-audio with a multipart field named 'audio'
    /// and answers with {"transcript": "..."}.
    #[command(visible_alias = "s")]
    Serve {
        /// Address to bind, overrides the config file
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on, overrides the config file
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Transcribe a local audio file and print the text
    ///
    /// Examples:
    ///   sttd transcribe recording.webm
    ///   sttd transcribe meeting.wav -o transcript.txt
    #[command(visible_alias = "t")]
    Transcribe {
        /// Path to the audio file to transcribe
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Write transcription to file instead of stdout
        #[arg(short, long, value_name = "OUTPUT")]
        output: Option<PathBuf>,
    },

    /// Show recent log entries from the application
    Logs,

    /// Generate shell completion script
    ///
    /// Examples:
    ///   sttd completions bash > sttd.bash
    ///   sttd completions zsh > _sttd
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Errors
/// - If logging initialization fails
/// - If the configuration cannot be loaded
/// - If command execution fails
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Handle commands that don't need logging or config
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "sttd", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::Logs) => return commands::handle_logs(),
        _ => {}
    }

    logging::init_logging()?;

    let config = SttdConfig::load(cli.config.as_deref()).map_err(|e| {
        tracing::error!("Failed to load configuration: {e}");
        e
    })?;

    match cli.command {
        None => commands::handle_serve(config, None, None).await?,
        Some(Commands::Serve { host, port }) => commands::handle_serve(config, host, port).await?,
        Some(Commands::Transcribe { file, output }) => {
            commands::handle_transcribe(config, file, output).await?
        }
        Some(Commands::Completions { .. }) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}
