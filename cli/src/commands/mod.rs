pub mod add;
pub mod distribute;
pub mod history;
pub mod info;
pub mod init;
pub mod list;
pub mod purge;
pub mod remote;
pub mod remove;
pub mod restore;

use crate::Cli;
use crate::config::Config;
use anyhow::Result;
use silo_core::{OpenOptions, Repository};
use tracing::info;

/// Opens the repository named by `--repo` or the configuration file.
/// Commands other than `init` never create a store, but an existing
/// empty store is prepared on first use.
pub async fn open_repository(cli: &Cli) -> Result<Repository> {
    let config = Config::load(cli.config.as_deref())?;
    let path = config.repository_path(cli.repo.as_deref())?;

    info!("Opening repository at: {}", path.display());
    let repo = Repository::open_with(&path, OpenOptions::new().create(false)).await?;
    Ok(repo)
}
