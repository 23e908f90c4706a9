//! voiceid CLI - enroll and verify voice samples against a recognition backend.

use clap::{Parser, Subcommand};

mod commands;

use commands::{EnrollCommand, UsersCommand, VerifyCommand};

/// voiceid CLI - enroll and verify voice samples.
///
/// The backend trains one voice model per enrolled name and matches
/// submitted WAV samples against a chosen name. This tool drives the same
/// session controller the client application uses:
///   - List enrolled users
///   - Enroll ("train") a WAV sample under a name
///   - Verify ("predict") a WAV sample against an enrolled name
#[derive(Parser)]
#[command(name = "voiceid")]
#[command(about = "Voice enrollment and verification CLI")]
#[command(version)]
pub struct Cli {
    /// Backend base URL
    #[arg(long, global = true, default_value = voiceid_gateway::DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = 120)]
    pub timeout: u64,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List enrolled users
    Users(UsersCommand),
    /// Enroll a voice sample under a name
    Enroll(EnrollCommand),
    /// Verify a voice sample against an enrolled name
    Verify(VerifyCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(false)
            .init();
    }

    match &cli.command {
        Commands::Users(cmd) => cmd.run(&cli).await,
        Commands::Enroll(cmd) => cmd.run(&cli).await,
        Commands::Verify(cmd) => cmd.run(&cli).await,
    }
}
