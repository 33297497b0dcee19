use crate::path::{RepoPath, local_file_name};
use crate::{Error, Result};
use bytes::Bytes;
use git2::FileMode;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tokio::fs;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// A file read from disk, waiting to be committed.
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub path: RepoPath,
    pub content: Bytes,
    pub executable: bool,
}

impl StagedFile {
    pub fn mode(&self) -> i32 {
        if self.executable {
            i32::from(FileMode::BlobExecutable)
        } else {
            i32::from(FileMode::Blob)
        }
    }
}

/// Names the directory entries are staged from.
///
/// Paths inside the repository are derived relative to the working
/// directory, so staging `<work_dir>/docs` with prefix `backup` produces
/// `backup/docs/...`. A scratch context owns a temporary working directory
/// that is deleted when the context is dropped.
#[derive(Debug)]
pub struct StagingContext {
    work_dir: PathBuf,
    _scratch: Option<TempDir>,
}

impl StagingContext {
    /// Context whose working directory is the parent of `source`.
    /// Returns the context and the name of `source` inside it. A source
    /// ending in `..` is resolved first.
    pub fn for_source(source: &Path) -> Result<(Self, String)> {
        let source = std::path::absolute(source)?;
        let source = match source.file_name() {
            Some(_) => source,
            None => std::fs::canonicalize(&source)?,
        };
        let name = local_file_name(&source)?;
        let work_dir = source
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::InvalidPath {
                path: source.display().to_string(),
            })?;

        Ok((
            Self {
                work_dir,
                _scratch: None,
            },
            name,
        ))
    }

    /// Context backed by a fresh temporary directory.
    pub fn scratch() -> Result<Self> {
        let scratch = tempfile::Builder::new().prefix("silo-staging-").tempdir()?;
        Ok(Self {
            work_dir: scratch.path().to_path_buf(),
            _scratch: Some(scratch),
        })
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Reads every regular file at or below `<work_dir>/<name>`, depth-first
    /// and sorted by name, placing each under `prefix`.
    pub async fn collect(&self, name: &str, prefix: &RepoPath) -> Result<Vec<StagedFile>> {
        let root = self.work_dir.join(name);
        let mut staged = Vec::new();

        for entry in WalkDir::new(&root).follow_links(false).sort_by_file_name() {
            let entry = entry?;
            let file_type = entry.file_type();
            if file_type.is_dir() {
                continue;
            }
            if !file_type.is_file() {
                warn!("Skipping special file {}", entry.path().display());
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.work_dir)
                .map_err(|_| Error::InvalidPath {
                    path: entry.path().display().to_string(),
                })?;
            let path = relative
                .components()
                .fold(prefix.clone(), |path, component| {
                    path.join(&component.as_os_str().to_string_lossy())
                });

            let executable = is_executable(&entry.metadata()?);
            let content = fs::read(entry.path()).await?;
            debug!("Staging {} ({} bytes)", path, content.len());

            staged.push(StagedFile {
                path,
                content: Bytes::from(content),
                executable,
            });
        }

        Ok(staged)
    }
}

#[cfg(unix)]
fn is_executable(metadata: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &Metadata) -> bool {
    false
}
