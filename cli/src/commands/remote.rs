use super::open_repository;
use anyhow::{Result, anyhow};
use clap::Args;

const USAGE: &str = "usage: silo remote [add <name> <url> | rm <name>]";

#[derive(Args)]
pub struct RemoteCommand {
    #[arg(help = "add <name> <url> | rm <name>; lists remotes when empty")]
    args: Vec<String>,
}

impl RemoteCommand {
    pub async fn run(&self, cli: &crate::Cli) -> Result<()> {
        let mut repo = open_repository(cli).await?;
        let args: Vec<&str> = self.args.iter().map(String::as_str).collect();

        match args.as_slice() {
            [] => {
                for remote in repo.remotes() {
                    println!("{}\t{}", remote.name, remote.url);
                }
            }
            ["add", name, url] => {
                repo.add_remote(name, url)?;
                println!("Added remote {} ({})", name, url);
            }
            ["rm", name] => {
                let remote = repo.remove_remote(name)?;
                println!("Removed remote {} ({})", remote.name, remote.url);
            }
            _ => return Err(anyhow!(USAGE)),
        }

        Ok(())
    }
}
