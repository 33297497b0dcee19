//! Thin adapter over the bare git repository backing a Silo repository.

use crate::path::RepoPath;
use crate::types::Entry;
use crate::{Error, Result};
use git2::{
    Commit, Cred, CredentialType, ErrorCode, ObjectType, Oid, PushOptions, RemoteCallbacks,
    Signature, Sort, Tree,
};
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Push refspec stored for mirror remotes.
pub const MIRROR_REFSPEC: &str = "+refs/*:refs/*";

pub struct Store {
    git: git2::Repository,
    path: PathBuf,
}

impl Store {
    /// Opens the bare repository at `path`, initializing it when the path is
    /// missing (and `create` is set) or is an empty directory.
    pub fn open_or_init(path: &Path, create: bool) -> Result<Self> {
        let git = if path.exists() {
            if !path.is_dir() {
                return Err(invalid_store(path, "not a directory"));
            }
            if fs::read_dir(path)?.next().is_none() {
                info!("Initializing bare repository in empty directory {}", path.display());
                git2::Repository::init_bare(path)?
            } else {
                if !looks_like_bare_repository(path) {
                    return Err(invalid_store(path, "not a bare git repository"));
                }
                git2::Repository::open_bare(path)?
            }
        } else if create {
            info!("Creating bare repository at {}", path.display());
            fs::create_dir_all(path)?;
            git2::Repository::init_bare(path)?
        } else {
            return Err(Error::NoSuchPath {
                path: path.display().to_string(),
            });
        };

        Ok(Self {
            git,
            path: path.to_path_buf(),
        })
    }

    /// Opens an existing store without any validation or creation.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            git: git2::Repository::open_bare(path)?,
            path: path.to_path_buf(),
        })
    }

    pub fn git(&self) -> &git2::Repository {
        &self.git
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn head_commit(&self) -> Result<Option<Commit<'_>>> {
        match self.git.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            Err(err) if err.code() == ErrorCode::UnbornBranch || err.code() == ErrorCode::NotFound => {
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn head_tree(&self) -> Result<Option<Tree<'_>>> {
        match self.head_commit()? {
            Some(commit) => Ok(Some(commit.tree()?)),
            None => Ok(None),
        }
    }

    pub fn commit_count(&self) -> Result<usize> {
        Ok(self.walk(false)?.len())
    }

    /// Commit identifiers reachable from HEAD, newest first unless
    /// `oldest_first` is set.
    pub fn walk(&self, oldest_first: bool) -> Result<Vec<Oid>> {
        if self.head_commit()?.is_none() {
            return Ok(Vec::new());
        }

        let mut revwalk = self.git.revwalk()?;
        let mut sorting = Sort::TOPOLOGICAL | Sort::TIME;
        if oldest_first {
            sorting |= Sort::REVERSE;
        }
        revwalk.set_sorting(sorting)?;
        revwalk.push_head()?;
        revwalk.map(|id| id.map_err(Error::from)).collect()
    }

    pub fn resolve(&self, tree: Option<&Tree<'_>>, path: &RepoPath) -> Result<Option<Entry>> {
        let Some(tree) = tree else {
            return Ok(path.is_root().then(|| Entry::Tree {
                id: empty_tree_id().into(),
            }));
        };

        if path.is_root() {
            return Ok(Some(Entry::Tree {
                id: tree.id().into(),
            }));
        }

        match tree.get_path(&path.as_path()) {
            Ok(entry) => Ok(entry_of(&entry)),
            Err(err) if err.code() == ErrorCode::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    pub fn write_blob(&self, data: &[u8]) -> Result<Oid> {
        Ok(self.git.blob(data)?)
    }

    /// Commits `tree` on top of the current head and advances HEAD.
    pub fn commit(&self, tree: Oid, message: &str) -> Result<Oid> {
        let tree = self.git.find_tree(tree)?;
        let parent = self.head_commit()?;
        let parents: Vec<&Commit<'_>> = parent.iter().collect();
        let signature = self.signature()?;

        let id = self
            .git
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        debug!("Created commit {} ({})", id, message);
        Ok(id)
    }

    /// Writes a copy of `original` with a new tree and parents, keeping its
    /// author, committer and message. No reference is updated.
    pub fn recommit(&self, original: &Commit<'_>, tree: Oid, parents: &[Oid]) -> Result<Oid> {
        let tree = self.git.find_tree(tree)?;
        let parents = parents
            .iter()
            .map(|id| self.git.find_commit(*id))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let parents: Vec<&Commit<'_>> = parents.iter().collect();
        let message = String::from_utf8_lossy(original.message_bytes()).into_owned();

        Ok(self.git.commit(
            None,
            &original.author(),
            &original.committer(),
            &message,
            &tree,
            &parents,
        )?)
    }

    /// Points the branch HEAD refers to at `target`.
    pub fn move_head(&self, target: Oid, log_message: &str) -> Result<()> {
        let head = self.git.find_reference("HEAD")?;
        match head.symbolic_target() {
            Some(branch) => {
                let branch = branch.to_string();
                self.git.reference(&branch, target, true, log_message)?;
            }
            None => self.git.set_head_detached(target)?,
        }
        Ok(())
    }

    /// Configured remotes as (name, url) pairs in configuration order.
    pub fn remotes(&self) -> Result<Vec<(String, String)>> {
        let names = self.git.remotes()?;
        let mut remotes = Vec::new();
        for name in names.iter().flatten() {
            let remote = self.git.find_remote(name)?;
            remotes.push((name.to_string(), remote.url().unwrap_or_default().to_string()));
        }
        Ok(remotes)
    }

    /// Configures `name` as a push mirror of this repository.
    pub fn add_mirror_remote(&self, name: &str, url: &str) -> Result<()> {
        if !git2::Remote::is_valid_name(name) {
            return Err(Error::Other(format!("Invalid remote name: {}", name)));
        }

        let mut config = self.git.config()?;
        config.set_str(&format!("remote.{}.url", name), url)?;
        config.set_bool(&format!("remote.{}.mirror", name), true)?;
        self.git.remote_add_push(name, MIRROR_REFSPEC)?;
        Ok(())
    }

    pub fn remove_remote(&self, name: &str) -> Result<()> {
        Ok(self.git.remote_delete(name)?)
    }

    /// Pushes every local reference to the remote `name`, overwriting the
    /// remote's copies.
    pub fn push(&self, name: &str) -> Result<()> {
        let mut remote = self.git.find_remote(name)?;
        let refspecs = self.mirror_refspecs()?;
        if refspecs.is_empty() {
            debug!(remote = name, "Nothing to push");
            return Ok(());
        }

        let rejected = RefCell::new(Vec::new());
        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(|url, username, allowed| {
            if allowed.contains(CredentialType::SSH_KEY) {
                if let Some(username) = username {
                    return Cred::ssh_key_from_agent(username);
                }
            }
            if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
                let config = git2::Config::open_default()?;
                return Cred::credential_helper(&config, url, username);
            }
            Cred::default()
        });
        callbacks.push_update_reference(|refname, status| {
            if let Some(status) = status {
                rejected.borrow_mut().push(format!("{}: {}", refname, status));
            }
            Ok(())
        });

        let mut options = PushOptions::new();
        options.remote_callbacks(callbacks);
        remote.push(&refspecs, Some(&mut options))?;
        drop(options);

        let rejected = rejected.into_inner();
        if !rejected.is_empty() {
            return Err(Error::Push {
                remote: name.to_string(),
                message: rejected.join("; "),
            });
        }
        Ok(())
    }

    fn mirror_refspecs(&self) -> Result<Vec<String>> {
        let mut refspecs = Vec::new();
        for reference in self.git.references()? {
            let reference = reference?;
            if reference.symbolic_target().is_some() {
                continue;
            }
            if let Some(name) = reference.name() {
                refspecs.push(format!("+{}:{}", name, name));
            }
        }
        Ok(refspecs)
    }

    fn signature(&self) -> Result<Signature<'static>> {
        if let Ok(signature) = self.git.signature() {
            return Ok(signature);
        }

        let username = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "silo".to_string());
        let hostname = hostname::get()
            .map(|h| h.to_string_lossy().to_string())
            .unwrap_or_else(|_| "localhost".to_string());

        Ok(Signature::now(&username, &format!("{}@{}", username, hostname))?)
    }
}

pub(crate) fn entry_of(entry: &git2::TreeEntry<'_>) -> Option<Entry> {
    match entry.kind() {
        Some(ObjectType::Tree) => Some(Entry::Tree {
            id: entry.id().into(),
        }),
        Some(ObjectType::Blob) => Some(Entry::Blob {
            id: entry.id().into(),
            mode: entry.filemode(),
        }),
        _ => None,
    }
}

pub(crate) fn entry_name(entry: &git2::TreeEntry<'_>) -> String {
    String::from_utf8_lossy(entry.name_bytes()).into_owned()
}

fn empty_tree_id() -> Oid {
    Oid::hash_object(ObjectType::Tree, &[]).unwrap_or_else(|_| Oid::zero())
}

fn looks_like_bare_repository(path: &Path) -> bool {
    path.join("HEAD").is_file() && path.join("objects").is_dir() && path.join("refs").is_dir()
}

fn invalid_store(path: &Path, reason: &str) -> Error {
    Error::InvalidStore {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_missing_without_create() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");

        assert!(matches!(
            Store::open_or_init(&missing, false),
            Err(Error::NoSuchPath { .. })
        ));
        assert!(!missing.exists());
    }

    #[test]
    fn test_open_rejects_foreign_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.txt"), b"not a repository").unwrap();

        assert!(matches!(
            Store::open_or_init(dir.path(), true),
            Err(Error::InvalidStore { .. })
        ));
    }

    #[test]
    fn test_fresh_store_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = Store::open_or_init(&dir.path().join("store"), true).unwrap();

        assert!(store.head_commit().unwrap().is_none());
        assert_eq!(store.commit_count().unwrap(), 0);

        let root = store.resolve(None, &RepoPath::root()).unwrap().unwrap();
        assert!(root.is_tree());
        assert_eq!(root.id().to_hex(), "4b825dc642cb6eb9a060e54bf8d69288fbee4904");
        assert!(store.resolve(None, &RepoPath::parse("x").unwrap()).unwrap().is_none());
    }

    #[test]
    fn test_mirror_remote_configuration() {
        let dir = TempDir::new().unwrap();
        let store = Store::open_or_init(dir.path(), true).unwrap();

        store.add_mirror_remote("backup", "/srv/backup.git").unwrap();
        assert_eq!(
            store.remotes().unwrap(),
            vec![("backup".to_string(), "/srv/backup.git".to_string())]
        );

        let config = store.git().config().unwrap();
        assert!(config.get_bool("remote.backup.mirror").unwrap());

        store.remove_remote("backup").unwrap();
        assert!(store.remotes().unwrap().is_empty());
    }
}
