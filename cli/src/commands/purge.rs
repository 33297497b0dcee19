use super::open_repository;
use anyhow::Result;
use clap::Args;

#[derive(Args)]
pub struct PurgeCommand {
    #[arg(required = true, help = "Paths to erase from every snapshot")]
    paths: Vec<String>,

    #[arg(long, help = "Keep snapshots that end up changing nothing")]
    no_clean: bool,
}

impl PurgeCommand {
    pub async fn run(&self, cli: &crate::Cli) -> Result<()> {
        let repo = open_repository(cli).await?;

        for path in &self.paths {
            let summary = repo.purge(path, !self.no_clean)?;
            println!(
                "Purged {}: {} snapshot(s) rewritten, {} dropped, head is now {}",
                path,
                summary.rewritten,
                summary.dropped,
                summary.head.short_string()
            );
        }
        Ok(())
    }
}
