use crate::config::Config;
use anyhow::Result;
use clap::Args;
use silo_core::Repository;
use std::path::PathBuf;
use tracing::info;

#[derive(Args)]
pub struct InitCommand {
    #[arg(help = "Repository path")]
    path: Option<PathBuf>,
}

impl InitCommand {
    pub async fn run(&self, cli: &crate::Cli) -> Result<()> {
        let path = match &self.path {
            Some(path) => path.clone(),
            None => Config::load(cli.config.as_deref())?.repository_path(cli.repo.as_deref())?,
        };

        let existed = path.exists();
        info!("Initializing repository at: {}", path.display());
        let repo = Repository::open(&path).await?;

        if existed {
            println!("Using existing Silo repository in {}", repo.path().display());
        } else {
            println!("Initialized empty Silo repository in {}", repo.path().display());
        }
        Ok(())
    }
}
