use super::open_repository;
use anyhow::Result;
use clap::Args;

#[derive(Args)]
pub struct InfoCommand {
    #[arg(required = true, help = "Paths inside the repository")]
    paths: Vec<String>,
}

impl InfoCommand {
    pub async fn run(&self, cli: &crate::Cli) -> Result<()> {
        let repo = open_repository(cli).await?;

        for (index, path) in self.paths.iter().enumerate() {
            let info = repo.info(path)?;
            if index > 0 {
                println!();
            }

            println!("Path:         {}", info.path);
            println!("Type:         {}", info.kind);
            println!("Object:       {}", info.id);
            println!("Mode:         {}", info.mode_string());
            if let Some(size) = info.size {
                println!("Size:         {} bytes", size);
            }
            if let Some(mime_type) = &info.mime_type {
                println!("MIME type:    {}", mime_type);
            }
            println!("First commit: {}", info.first_commit.format("%Y-%m-%d %H:%M:%S UTC"));
            println!("Last commit:  {}", info.last_commit.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        Ok(())
    }
}
