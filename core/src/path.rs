use crate::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Name of the marker file proving a store is managed by Silo.
pub const MARKER_FILE: &str = ".silo";

/// A normalized, slash-separated path inside a repository tree.
///
/// The root is the empty path. Leading, trailing and repeated slashes as
/// well as `.` segments are dropped; `..` is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RepoPath {
    segments: Vec<String>,
}

impl RepoPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(path: &str) -> Result<Self> {
        let mut segments = Vec::new();
        for segment in path.split('/') {
            match segment {
                "" | "." => continue,
                ".." => {
                    return Err(Error::InvalidPath {
                        path: path.to_string(),
                    });
                }
                name => segments.push(name.to_string()),
            }
        }
        Ok(Self { segments })
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn join(&self, name: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Self { segments }
    }

    /// True for the marker file at the repository root.
    pub fn is_marker(&self) -> bool {
        self.segments.len() == 1 && self.segments[0] == MARKER_FILE
    }

    /// True for the marker file and anything that would be placed below it.
    pub fn touches_marker(&self) -> bool {
        self.segments.first().is_some_and(|first| first == MARKER_FILE)
    }

    pub fn as_path(&self) -> PathBuf {
        self.segments.iter().collect()
    }

    /// Renders the root as `/`, used in generated snapshot messages.
    pub fn display_prefix(&self) -> String {
        if self.is_root() {
            "/".to_string()
        } else {
            self.to_string()
        }
    }
}

impl fmt::Display for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

/// Final component of a local filesystem path, if it has one.
pub(crate) fn local_file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| Error::InvalidPath {
            path: path.display().to_string(),
        })
}
