//! Utility functions for CLI commands.

use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use voiceid_gateway::Client;
use voiceid_session::{acquire_picked, AudioAsset};

use crate::Cli;

/// Creates a backend client from the global options.
pub fn create_client(cli: &Cli) -> anyhow::Result<Client> {
    let client = Client::builder(&cli.base_url)
        .timeout(Duration::from_secs(cli.timeout))
        .build()?;
    Ok(client)
}

/// Loads an audio file and stages it through the acquirer, so a non-WAV
/// path is rejected before any request is issued.
pub fn load_audio(path: &str) -> anyhow::Result<AudioAsset> {
    let bytes = Bytes::from(std::fs::read(path)?);

    let name = Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
        .to_string();

    let media_type = match Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("wav") => "audio/wav",
        _ => "application/octet-stream",
    };

    Ok(acquire_picked(bytes, media_type, name)?)
}

/// Prints verbose output if enabled.
pub fn print_verbose(cli: &Cli, msg: &str) {
    if cli.verbose {
        eprintln!("[verbose] {}", msg);
    }
}

/// Prints success message.
pub fn print_success(msg: &str) {
    eprintln!("\x1b[32m✓\x1b[0m {}", msg);
}

/// Prints error message.
pub fn print_error(msg: &str) {
    eprintln!("\x1b[31m✗\x1b[0m {}", msg);
}

/// Prints warning message.
pub fn print_warning(msg: &str) {
    eprintln!("\x1b[33m!\x1b[0m {}", msg);
}
