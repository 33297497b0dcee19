pub mod error;
pub mod path;
pub mod purge;
pub mod remote;
pub mod repository;
pub mod retry;
pub mod snapshot;
pub mod staging;
pub mod store;
pub mod tree;
pub mod types;

pub use error::{Error, PushFailure, Result};
pub use path::{MARKER_FILE, RepoPath};
pub use purge::PurgeSummary;
pub use remote::{DistributionReport, GitTransport, Remote, Transport};
pub use repository::{OpenOptions, PREPARE_MESSAGE, Repository};
pub use retry::RetryConfig;
pub use snapshot::Snapshot;
pub use types::*;
