//! Enrollment command.

use clap::Args;
use voiceid_session::{Outcome, SessionController};

use super::{create_client, load_audio, print_success, print_verbose, print_warning};
use crate::Cli;

/// Enroll a WAV sample under a name ("train").
#[derive(Args)]
pub struct EnrollCommand {
    /// Name to enroll the sample under
    #[arg(long)]
    pub name: String,

    /// Path to a WAV file
    #[arg(long)]
    pub file: String,
}

impl EnrollCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        print_verbose(cli, &format!("Backend: {}", cli.base_url));
        print_verbose(cli, &format!("Enrolling {} from {}", self.name, self.file));

        let client = create_client(cli)?;
        let handle = SessionController::new(client).spawn();

        // Directory load is non-fatal for enrollment.
        if let Err(e) = handle.reload_directory().await {
            print_warning(&format!("{e}"));
        }

        handle.stage(load_audio(&self.file)?).await?;
        handle.set_subject(&self.name).await?;

        match handle.submit().await? {
            Some(Outcome::Enrolled { message }) => print_success(&message),
            other => anyhow::bail!("unexpected enrollment outcome: {other:?}"),
        }

        if cli.json {
            let snapshot = handle.snapshot().await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }

        Ok(())
    }
}
