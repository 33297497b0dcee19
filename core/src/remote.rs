use crate::error::PushFailure;
use crate::repository::Repository;
use crate::retry::{RetryConfig, retry_with_backoff};
use crate::store::Store;
use crate::{Error, Result};
use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// A mirror target receiving the full repository history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Remote {
    pub name: String,
    pub url: String,
}

impl Remote {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Moves the history of a store to one remote.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn push(&self, store: &Path, remote: &Remote) -> Result<()>;
}

/// Pushes with git, one blocking task per push, retrying transient
/// failures.
#[derive(Debug, Clone, Default)]
pub struct GitTransport {
    retry: RetryConfig,
}

impl GitTransport {
    pub fn new(retry: RetryConfig) -> Self {
        Self { retry }
    }
}

#[async_trait]
impl Transport for GitTransport {
    async fn push(&self, store: &Path, remote: &Remote) -> Result<()> {
        retry_with_backoff(&self.retry, "push", || {
            let store: PathBuf = store.to_path_buf();
            let name = remote.name.clone();
            async move {
                tokio::task::spawn_blocking(move || Store::open(&store)?.push(&name))
                    .await
                    .map_err(|e| Error::Other(format!("Push task failed: {}", e)))?
            }
        })
        .await
    }
}

/// Per-remote outcome of [`Repository::distribute`], in registration order.
#[derive(Debug, Default)]
pub struct DistributionReport {
    pub pushed: Vec<String>,
    pub failed: Vec<PushFailure>,
}

impl DistributionReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Fails with `DistributionFailed` if any push failed.
    pub fn into_result(self) -> Result<Vec<String>> {
        if self.failed.is_empty() {
            Ok(self.pushed)
        } else {
            Err(Error::DistributionFailed {
                failures: self.failed,
            })
        }
    }
}

impl Repository {
    /// Registered remotes in registration order.
    pub fn remotes(&self) -> impl Iterator<Item = &Remote> {
        self.remotes.values()
    }

    pub fn remote(&self, name: &str) -> Option<&Remote> {
        self.remotes.get(name)
    }

    /// Registers `url` as a push mirror named `name`.
    ///
    /// # Errors
    ///
    /// `Error::DuplicateRemote` if a remote with that name already exists.
    pub fn add_remote(&mut self, name: &str, url: &str) -> Result<&Remote> {
        if self.remotes.contains_key(name) {
            return Err(Error::DuplicateRemote {
                name: name.to_string(),
            });
        }

        self.store().add_mirror_remote(name, url)?;
        info!("Added mirror remote {} ({})", name, url);
        let remote = self
            .remotes
            .entry(name.to_string())
            .or_insert_with(|| Remote::new(name, url));
        Ok(remote)
    }

    pub fn remove_remote(&mut self, name: &str) -> Result<Remote> {
        if !self.remotes.contains_key(name) {
            return Err(Error::UndefinedRemote {
                name: name.to_string(),
            });
        }

        self.store().remove_remote(name)?;
        info!("Removed remote {}", name);
        self.remotes
            .shift_remove(name)
            .ok_or_else(|| Error::UndefinedRemote {
                name: name.to_string(),
            })
    }

    /// Pushes the full history to every registered remote concurrently. A
    /// failing remote does not stop the others.
    pub async fn distribute(&self) -> DistributionReport {
        let pushes = self.remotes.values().map(|remote| {
            let transport = self.transport.clone();
            async move {
                let result = transport.push(self.path(), remote).await;
                (remote.name.clone(), result)
            }
        });

        let mut report = DistributionReport::default();
        for (name, result) in join_all(pushes).await {
            match result {
                Ok(()) => {
                    info!(remote = %name, "Pushed history");
                    report.pushed.push(name);
                }
                Err(error) => {
                    warn!(remote = %name, error = %error, "Push failed");
                    report.failed.push(PushFailure {
                        remote: name,
                        message: error.to_string(),
                    });
                }
            }
        }
        report
    }
}
