use super::open_repository;
use crate::config::Config;
use anyhow::{Result, anyhow};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Args)]
pub struct AddCommand {
    #[arg(required = true, help = "Files or directories to add")]
    files: Vec<PathBuf>,

    #[arg(long, help = "Directory inside the repository to add into")]
    prefix: Option<String>,
}

impl AddCommand {
    pub async fn run(&self, cli: &crate::Cli) -> Result<()> {
        let config = Config::load(cli.config.as_deref())?;
        let prefix = self
            .prefix
            .clone()
            .or(config.repository.prefix)
            .unwrap_or_else(|| "/".to_string());

        for file in &self.files {
            if !file.exists() {
                return Err(anyhow!("Path does not exist: {}", file.display()));
            }
        }

        let repo = open_repository(cli).await?;

        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(100));

        for file in &self.files {
            pb.set_message(format!("Adding {}", file.display()));
            let id = repo.add(file, &prefix).await?;
            pb.println(format!("{} {}", id.short_string(), file.display()));
        }

        pb.finish_and_clear();
        println!("Added {} path(s) into '{}'", self.files.len(), prefix);
        Ok(())
    }
}
