use super::open_repository;
use anyhow::Result;
use clap::Args;
use silo_core::Error;
use std::collections::HashSet;

const DEFAULT_WIDTH: usize = 80;

#[derive(Args)]
pub struct ListCommand {
    #[arg(help = "Paths inside the repository (default: everything)")]
    paths: Vec<String>,

    #[arg(short, long, help = "One path per line")]
    long: bool,

    #[arg(short, long, help = "Reverse the order")]
    reverse: bool,
}

impl ListCommand {
    pub async fn run(&self, cli: &crate::Cli) -> Result<()> {
        let repo = open_repository(cli).await?;

        let roots = if self.paths.is_empty() {
            vec!["/".to_string()]
        } else {
            self.paths.clone()
        };

        let mut seen = HashSet::new();
        let mut listing = Vec::new();
        for root in &roots {
            for path in repo.contents(root)? {
                if seen.insert(path.clone()) {
                    listing.push(path);
                }
            }
        }

        if listing.is_empty() {
            return Err(Error::FileNotFound {
                path: roots.join(", "),
            }
            .into());
        }

        if self.reverse {
            listing.reverse();
        }

        if self.long {
            for path in &listing {
                println!("{}", path);
            }
        } else {
            let width = std::env::var("COLUMNS")
                .ok()
                .and_then(|columns| columns.parse().ok())
                .unwrap_or(DEFAULT_WIDTH);
            for line in columnize(&listing, width) {
                println!("{}", line);
            }
        }
        Ok(())
    }
}

/// Lays `items` out column-major in as many columns as fit in `width`.
fn columnize(items: &[String], width: usize) -> Vec<String> {
    let cell = items.iter().map(|item| item.chars().count()).max().unwrap_or(0) + 2;
    let columns = (width / cell).max(1);
    let rows = items.len().div_ceil(columns);

    (0..rows)
        .map(|row| {
            let mut line = String::new();
            for column in 0..columns {
                if let Some(item) = items.get(column * rows + row) {
                    line.push_str(&format!("{:<cell$}", item, cell = cell));
                }
            }
            line.trim_end().to_string()
        })
        .collect()
}
