use super::open_repository;
use anyhow::Result;
use clap::Args;

#[derive(Args)]
pub struct RemoveCommand {
    #[arg(required = true, help = "Paths inside the repository")]
    paths: Vec<String>,
}

impl RemoveCommand {
    pub async fn run(&self, cli: &crate::Cli) -> Result<()> {
        let repo = open_repository(cli).await?;

        for path in &self.paths {
            let id = repo.remove(path)?;
            println!("{} removed {}", id.short_string(), path);
        }
        Ok(())
    }
}
