//! Hard removal of a path from the entire history.
//!
//! Every commit is replayed oldest first onto a tree with the path stripped.
//! Tree identities are recomputed bottom-up, so each commit from the first
//! one that contained the path onward gets a new identifier, and every
//! later commit is re-parented onto the rewritten chain.

use crate::path::RepoPath;
use crate::repository::{Repository, ensure_removable};
use crate::tree::strip_path;
use crate::{Error, ObjectId, Result};
use git2::Oid;
use std::collections::HashMap;
use tracing::{debug, info};

/// Outcome of a purge.
#[derive(Debug, Clone)]
pub struct PurgeSummary {
    /// Commits that received a new identifier.
    pub rewritten: usize,
    /// Commits elided because they no longer changed anything.
    pub dropped: usize,
    pub head: ObjectId,
}

impl Repository {
    /// Erases `path` from every snapshot. With `prune_empty`, snapshots
    /// whose tree ends up identical to their parent's are dropped.
    ///
    /// This cannot be undone: the previous history is no longer reachable
    /// from the repository head.
    pub fn purge(&self, path: &str, prune_empty: bool) -> Result<PurgeSummary> {
        let path = RepoPath::parse(path)?;
        ensure_removable(&path)?;
        self.require(&path)?;

        let store = self.store();
        let git = store.git();
        let commits = store.walk(true)?;

        let mut trees: HashMap<Oid, Oid> = HashMap::new();
        let mut rewritten: HashMap<Oid, Option<Oid>> = HashMap::new();
        let mut summary = PurgeSummary {
            rewritten: 0,
            dropped: 0,
            head: ObjectId::new(Oid::zero()),
        };

        for id in &commits {
            let commit = git.find_commit(*id)?;

            let tree = match trees.get(&commit.tree_id()) {
                Some(tree) => *tree,
                None => {
                    let stripped = strip_path(git, &commit.tree()?, &path)?;
                    trees.insert(commit.tree_id(), stripped);
                    stripped
                }
            };

            let mut parents: Vec<Oid> = Vec::new();
            for parent in commit.parent_ids() {
                if let Some(Some(new_parent)) = rewritten.get(&parent) {
                    if !parents.contains(new_parent) {
                        parents.push(*new_parent);
                    }
                }
            }

            if prune_empty {
                if let [parent] = parents.as_slice() {
                    if git.find_commit(*parent)?.tree_id() == tree {
                        debug!("Dropping commit {} which no longer changes anything", id);
                        rewritten.insert(*id, Some(*parent));
                        summary.dropped += 1;
                        continue;
                    }
                }
            }

            let new_id = store.recommit(&commit, tree, &parents)?;
            if new_id != *id {
                summary.rewritten += 1;
            }
            rewritten.insert(*id, Some(new_id));
        }

        let head = commits
            .last()
            .and_then(|id| rewritten.get(id).copied().flatten())
            .ok_or_else(|| Error::Other("purge left no commits".to_string()))?;
        store.move_head(head, &format!("silo: purge {}", path))?;
        summary.head = head.into();

        info!(
            "Purged {} from history ({} commits rewritten, {} dropped)",
            path, summary.rewritten, summary.dropped
        );
        Ok(summary)
    }
}
