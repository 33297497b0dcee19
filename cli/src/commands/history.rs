use super::open_repository;
use anyhow::{Result, anyhow};
use clap::Args;

#[derive(Args)]
pub struct HistoryCommand {
    #[arg(help = "Only snapshots that changed this path")]
    path: Option<String>,

    #[arg(long, help = "Output format (table, json)")]
    format: Option<String>,
}

impl HistoryCommand {
    pub async fn run(&self, cli: &crate::Cli) -> Result<()> {
        let repo = open_repository(cli).await?;
        let snapshots = repo.history(self.path.as_deref())?;
        let format = self.format.as_deref().unwrap_or("table");

        match format {
            "table" => {
                if snapshots.is_empty() {
                    println!("No snapshots found");
                    return Ok(());
                }

                println!("{:<10} {:<20} {:<20} {}", "ID", "Date", "Author", "Message");
                println!("{:-<100}", "");
                for snapshot in &snapshots {
                    let summary = snapshot.message.lines().next().unwrap_or_default();
                    println!(
                        "{:<10} {:<20} {:<20} {}",
                        snapshot.short_id(),
                        snapshot.time.format("%Y-%m-%d %H:%M:%S"),
                        snapshot.author,
                        summary
                    );
                }
            }
            "json" => {
                let json = serde_json::to_string_pretty(&snapshots)?;
                println!("{}", json);
            }
            _ => {
                return Err(anyhow!("Unsupported format: {}", format));
            }
        }

        Ok(())
    }
}
