use super::open_repository;
use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

#[derive(Args)]
pub struct RestoreCommand {
    #[arg(required = true, help = "Paths inside the repository")]
    files: Vec<String>,

    #[arg(long, default_value = ".", help = "Directory to restore into")]
    prefix: PathBuf,
}

impl RestoreCommand {
    pub async fn run(&self, cli: &crate::Cli) -> Result<()> {
        let repo = open_repository(cli).await?;

        let mut total = 0;
        for file in &self.files {
            total += repo.restore(file, &self.prefix).await?;
        }

        println!("Restored {} file(s) into {}", total, self.prefix.display());
        Ok(())
    }
}
