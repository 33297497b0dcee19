use crate::types::ObjectId;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A commit in the repository history.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub id: ObjectId,
    pub tree: ObjectId,
    pub parents: Vec<ObjectId>,
    pub message: String,
    pub author: String,
    pub email: String,
    pub time: DateTime<Utc>,
}

impl Snapshot {
    pub fn from_commit(commit: &git2::Commit<'_>) -> Self {
        let author = commit.author();
        let time = DateTime::from_timestamp(commit.time().seconds(), 0).unwrap_or_default();

        Self {
            id: commit.id().into(),
            tree: commit.tree_id().into(),
            parents: commit.parent_ids().map(ObjectId::from).collect(),
            message: String::from_utf8_lossy(commit.message_bytes())
                .trim_end()
                .to_string(),
            author: String::from_utf8_lossy(author.name_bytes()).into_owned(),
            email: String::from_utf8_lossy(author.email_bytes()).into_owned(),
            time,
        }
    }

    pub fn short_id(&self) -> String {
        self.id.short_string()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} {} {}",
            self.short_id(),
            self.time.format("%Y-%m-%d %H:%M:%S UTC"),
            self.message
        )
    }
}
