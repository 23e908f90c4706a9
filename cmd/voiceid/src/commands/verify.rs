//! Verification command.

use clap::Args;
use voiceid_session::{Mode, Outcome, SessionController};

use super::{create_client, load_audio, print_error, print_success, print_verbose, print_warning};
use crate::Cli;

/// Verify a WAV sample against an enrolled name ("predict").
#[derive(Args)]
pub struct VerifyCommand {
    /// Enrolled name to match against
    #[arg(long)]
    pub name: String,

    /// Path to a WAV file
    #[arg(long)]
    pub file: String,
}

impl VerifyCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        print_verbose(cli, &format!("Backend: {}", cli.base_url));
        print_verbose(cli, &format!("Verifying {} from {}", self.name, self.file));

        let client = create_client(cli)?;
        let handle = SessionController::new(client).spawn();

        // Verify mode degrades to an empty name set if the directory is
        // unavailable; the submit below then rejects locally.
        if let Err(e) = handle.reload_directory().await {
            print_warning(&format!("{e}"));
        }
        handle.switch_mode(Mode::Verify).await?;

        handle.stage(load_audio(&self.file)?).await?;
        handle.set_subject(&self.name).await?;

        let outcome = handle.submit().await?;
        match &outcome {
            Some(Outcome::Matched) => print_success("voice match confirmed"),
            Some(Outcome::NotMatched) => print_error("voice match failed"),
            other => anyhow::bail!("unexpected verification outcome: {other:?}"),
        }

        if cli.json {
            let snapshot = handle.snapshot().await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }

        Ok(())
    }
}
