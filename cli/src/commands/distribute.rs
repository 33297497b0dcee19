use super::open_repository;
use anyhow::Result;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

#[derive(Args)]
pub struct DistributeCommand;

impl DistributeCommand {
    pub async fn run(&self, cli: &crate::Cli) -> Result<()> {
        let repo = open_repository(cli).await?;

        let count = repo.remotes().count();
        if count == 0 {
            println!("No remotes configured");
            return Ok(());
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message(format!("Pushing to {} remote(s)", count));

        let report = repo.distribute().await;
        pb.finish_and_clear();

        for name in &report.pushed {
            println!("ok     {}", name);
        }
        for failure in &report.failed {
            println!("failed {}: {}", failure.remote, failure.message);
        }

        report.into_result()?;
        Ok(())
    }
}
