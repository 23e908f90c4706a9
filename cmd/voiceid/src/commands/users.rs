//! User listing command.

use clap::Args;
use serde_json::json;
use voiceid_session::Directory;

use super::{create_client, print_verbose};
use crate::Cli;

/// List the names with an enrolled voice model.
#[derive(Args)]
pub struct UsersCommand {}

impl UsersCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        print_verbose(cli, &format!("Backend: {}", cli.base_url));

        let client = create_client(cli)?;
        let mut directory = Directory::new();
        directory.load(&client).await?;

        let names = directory.names();
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&json!({ "users": names }))?);
        } else if names.is_empty() {
            println!("no enrolled users");
        } else {
            for name in names {
                println!("{name}");
            }
        }

        Ok(())
    }
}
