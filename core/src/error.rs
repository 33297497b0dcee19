use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("No such path: {path}")]
    NoSuchPath { path: String },

    #[error("Invalid store at {path}: {reason}")]
    InvalidStore { path: String, reason: String },

    #[error("Repository at {path} has already been prepared for Silo")]
    AlreadyPrepared { path: String },

    #[error("File not found in repository: {path}")]
    FileNotFound { path: String },

    #[error("Invalid repository path: {path}")]
    InvalidPath { path: String },

    #[error("Refusing to remove protected path: {path}")]
    ProtectedPath { path: String },

    #[error("Undefined remote: {name}")]
    UndefinedRemote { name: String },

    #[error("Remote already defined: {name}")]
    DuplicateRemote { name: String },

    #[error("Push to {remote} failed: {message}")]
    Push { remote: String, message: String },

    #[error("Distribution failed for {}", failures.iter().map(|f| f.remote.as_str()).collect::<Vec<_>>().join(", "))]
    DistributionFailed { failures: Vec<PushFailure> },

    #[error("{0}")]
    Other(String),
}

/// A push that did not succeed during distribution.
#[derive(Debug, Clone)]
pub struct PushFailure {
    pub remote: String,
    pub message: String,
}

pub type Result<T> = std::result::Result<T, Error>;
