use crate::path::{MARKER_FILE, RepoPath};
use crate::remote::{GitTransport, Remote, Transport};
use crate::snapshot::Snapshot;
use crate::staging::{StagedFile, StagingContext};
use crate::store::{Store, entry_name, entry_of};
use crate::tree::TreeEditor;
use crate::{Entry, EntryInfo, EntryKind, Error, ObjectId, Result};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};

/// Message of the snapshot that marks a store as managed by Silo.
pub const PREPARE_MESSAGE: &str = "Enabled Silo for this repository";

/// Options for [`Repository::open_with`].
#[derive(Debug, Clone)]
pub struct OpenOptions {
    /// Create the backing store if the path does not exist.
    pub create: bool,
    /// Add the marker snapshot if the store is not prepared yet.
    pub prepare: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            create: true,
            prepare: true,
        }
    }
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(mut self, create: bool) -> Self {
        self.create = create;
        self
    }

    pub fn prepare(mut self, prepare: bool) -> Self {
        self.prepare = prepare;
        self
    }
}

/// A Silo backup repository.
///
/// Files and directories are stored in a bare git repository. Every `add`
/// and `remove` produces exactly one commit on a single linear history;
/// `purge` rewrites that history to erase a path from every commit.
///
/// # Examples
///
/// ```no_run
/// use silo_core::Repository;
///
/// #[tokio::main]
/// async fn main() -> silo_core::Result<()> {
///     let repo = Repository::open("./backups").await?;
///     repo.add("./notes.txt", "/").await?;
///     repo.restore("notes.txt", "./restored").await?;
///     Ok(())
/// }
/// ```
pub struct Repository {
    path: PathBuf,
    store: Store,
    pub(crate) remotes: IndexMap<String, Remote>,
    pub(crate) transport: Arc<dyn Transport>,
}

impl Repository {
    /// Opens the repository at `path`, creating and preparing it as needed.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, OpenOptions::default()).await
    }

    /// Opens the repository at `path`.
    ///
    /// # Errors
    ///
    /// * `Error::NoSuchPath` - the path is missing and `create` is off
    /// * `Error::InvalidStore` - the path holds something other than a bare
    ///   git repository, or a git repository with history but no marker
    pub async fn open_with<P: AsRef<Path>>(path: P, options: OpenOptions) -> Result<Self> {
        let path = std::path::absolute(path.as_ref())?;
        let store = Store::open_or_init(&path, options.create)?;

        let remotes = store
            .remotes()?
            .into_iter()
            .map(|(name, url)| (name.clone(), Remote::new(name, url)))
            .collect();

        let mut repo = Self {
            path,
            store,
            remotes,
            transport: Arc::new(GitTransport::default()),
        };

        let prepared = repo.is_prepared()?;
        if !prepared && repo.commit_count()? > 0 {
            return Err(Error::InvalidStore {
                path: repo.path.display().to_string(),
                reason: "repository contains data not managed by Silo".to_string(),
            });
        }

        if options.prepare && !prepared {
            repo.prepare().await?;
        }

        Ok(repo)
    }

    /// Replaces the transport used by [`Repository::distribute`].
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Commits the marker file that proves this store is managed by Silo.
    pub async fn prepare(&mut self) -> Result<ObjectId> {
        if self.is_prepared()? {
            return Err(Error::AlreadyPrepared {
                path: self.path.display().to_string(),
            });
        }

        let staging = StagingContext::scratch()?;
        fs::write(staging.work_dir().join(MARKER_FILE), b"").await?;
        let files = staging.collect(MARKER_FILE, &RepoPath::root()).await?;

        info!("Preparing {} for Silo", self.path.display());
        self.commit_staged(files, PREPARE_MESSAGE)
    }

    pub fn is_prepared(&self) -> Result<bool> {
        let marker = RepoPath::root().join(MARKER_FILE);
        Ok(self.resolve_path(&marker)?.is_some_and(|entry| entry.is_blob()))
    }

    pub fn commit_count(&self) -> Result<usize> {
        self.store.commit_count()
    }

    pub fn head(&self) -> Result<Option<Snapshot>> {
        Ok(self.store.head_commit()?.as_ref().map(Snapshot::from_commit))
    }

    /// Resolves `path` against the latest snapshot.
    pub fn resolve(&self, path: &str) -> Result<Option<Entry>> {
        self.resolve_path(&RepoPath::parse(path)?)
    }

    /// Like [`Repository::resolve`], failing with `FileNotFound` when the
    /// path does not exist.
    pub fn resolve_required(&self, path: &str) -> Result<Entry> {
        self.require(&RepoPath::parse(path)?)
    }

    /// Resolves `path` against an arbitrary snapshot.
    pub fn resolve_at(&self, snapshot: &ObjectId, path: &str) -> Result<Option<Entry>> {
        let path = RepoPath::parse(path)?;
        let commit = self.store.git().find_commit(snapshot.oid())?;
        let tree = commit.tree()?;
        self.store.resolve(Some(&tree), &path)
    }

    pub(crate) fn resolve_path(&self, path: &RepoPath) -> Result<Option<Entry>> {
        let tree = self.store.head_tree()?;
        self.store.resolve(tree.as_ref(), path)
    }

    pub(crate) fn require(&self, path: &RepoPath) -> Result<Entry> {
        self.resolve_path(path)?.ok_or_else(|| Error::FileNotFound {
            path: path.to_string(),
        })
    }

    /// Stores the file or directory `source` under `prefix` in a single new
    /// snapshot. Existing content at the same paths is overwritten.
    pub async fn add<P: AsRef<Path>>(&self, source: P, prefix: &str) -> Result<ObjectId> {
        let source = source.as_ref();
        let prefix = RepoPath::parse(prefix)?;
        if prefix.touches_marker() {
            return Err(Error::ProtectedPath {
                path: prefix.display_prefix(),
            });
        }

        let metadata = fs::metadata(source).await?;
        let kind = if metadata.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        };

        let (staging, name) = StagingContext::for_source(source)?;
        let files = staging.collect(&name, &prefix).await?;
        if let Some(file) = files.iter().find(|file| file.path.touches_marker()) {
            return Err(Error::ProtectedPath {
                path: file.path.to_string(),
            });
        }
        info!(
            "Adding {} {} ({} files) into '{}'",
            kind,
            source.display(),
            files.len(),
            prefix.display_prefix()
        );

        let message = format!(
            "Added {} {} into '{}'",
            kind,
            source.display(),
            prefix.display_prefix()
        );
        self.commit_staged(files, &message)
    }

    /// Every path at or below `path`, parents before children. Directories
    /// end with `/`. A path that does not exist yields an empty listing.
    pub fn contents(&self, path: &str) -> Result<Vec<String>> {
        let path = RepoPath::parse(path)?;
        let Some(entry) = self.resolve_path(&path)? else {
            return Ok(Vec::new());
        };

        let git = self.store.git();
        let mut listing = Vec::new();
        let mut pending = Vec::new();
        if path.is_root() {
            pending.extend(self.children(&path, entry.id())?.into_iter().rev());
        } else {
            pending.push((path, entry));
        }

        while let Some((path, entry)) = pending.pop() {
            match entry {
                Entry::Blob { .. } => listing.push(path.to_string()),
                Entry::Tree { id } => {
                    listing.push(format!("{}/", path));
                    let tree = git.find_tree(id.oid())?;
                    for child in tree.iter().collect::<Vec<_>>().into_iter().rev() {
                        if let Some(child_entry) = entry_of(&child) {
                            pending.push((path.join(&entry_name(&child)), child_entry));
                        }
                    }
                }
            }
        }

        Ok(listing)
    }

    /// Metadata about `path` in the latest snapshot.
    pub fn info(&self, path: &str) -> Result<EntryInfo> {
        let repo_path = RepoPath::parse(path)?;
        let entry = self.require(&repo_path)?;

        let history = self.history_of(Some(&repo_path))?;
        let (Some(last), Some(first)) = (history.first(), history.last()) else {
            return Err(Error::FileNotFound {
                path: repo_path.to_string(),
            });
        };

        let (size, mime_type) = match entry {
            Entry::Blob { id, .. } => {
                let blob = self.store.git().find_blob(id.oid())?;
                let mime_type = mime_guess::from_path(repo_path.as_path())
                    .first()
                    .map(|mime| mime.essence_str().to_string())
                    .unwrap_or_else(|| {
                        if blob.is_binary() {
                            "application/octet-stream".to_string()
                        } else {
                            "text/plain".to_string()
                        }
                    });
                (Some(blob.size() as u64), Some(mime_type))
            }
            Entry::Tree { .. } => (None, None),
        };

        Ok(EntryInfo {
            path: repo_path.display_prefix(),
            kind: entry.kind(),
            id: entry.id(),
            mode: entry.mode(),
            size,
            mime_type,
            first_commit: first.time,
            last_commit: last.time,
        })
    }

    /// Snapshots that modified `path`, newest first; every snapshot when no
    /// path is given.
    pub fn history(&self, path: Option<&str>) -> Result<Vec<Snapshot>> {
        let path = path.map(RepoPath::parse).transpose()?;
        self.history_of(path.as_ref())
    }

    fn history_of(&self, path: Option<&RepoPath>) -> Result<Vec<Snapshot>> {
        let git = self.store.git();
        let mut snapshots = Vec::new();

        for id in self.store.walk(false)? {
            let commit = git.find_commit(id)?;
            if let Some(path) = path {
                if !self.modifies(&commit, path)? {
                    continue;
                }
            }
            snapshots.push(Snapshot::from_commit(&commit));
        }

        Ok(snapshots)
    }

    fn modifies(&self, commit: &git2::Commit<'_>, path: &RepoPath) -> Result<bool> {
        let current = self.store.resolve(Some(&commit.tree()?), path)?.map(|e| e.id());
        if commit.parent_count() == 0 {
            return Ok(current.is_some());
        }

        for parent in commit.parents() {
            let previous = self.store.resolve(Some(&parent.tree()?), path)?.map(|e| e.id());
            if previous == current {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Writes `path` from the latest snapshot into `destination`, creating
    /// it if needed. Returns the number of files written.
    pub async fn restore<P: AsRef<Path>>(&self, path: &str, destination: P) -> Result<usize> {
        let repo_path = RepoPath::parse(path)?;
        let entry = self.require(&repo_path)?;
        let destination = destination.as_ref();
        fs::create_dir_all(destination).await?;

        let mut pending: Vec<(PathBuf, Entry)> = Vec::new();
        match repo_path.file_name() {
            Some(name) => pending.push((destination.join(name), entry)),
            None => {
                for (child, child_entry) in self.children(&repo_path, entry.id())? {
                    if let Some(name) = child.file_name() {
                        pending.push((destination.join(name), child_entry));
                    }
                }
            }
        }

        let mut written = 0;
        while let Some((target, entry)) = pending.pop() {
            match entry {
                Entry::Blob { id, mode } => {
                    let content = self.store.git().find_blob(id.oid())?.content().to_vec();
                    fs::write(&target, &content).await?;
                    set_mode(&target, mode).await?;
                    debug!("Restored {} ({} bytes)", target.display(), content.len());
                    written += 1;
                }
                Entry::Tree { id } => {
                    fs::create_dir_all(&target).await?;
                    let children = self.tree_entries(id)?;
                    pending.extend(
                        children
                            .into_iter()
                            .map(|(name, child)| (target.join(name), child)),
                    );
                }
            }
        }

        info!("Restored {} files from '{}' into {}", written, repo_path.display_prefix(), destination.display());
        Ok(written)
    }

    /// Commits a snapshot without `path`. Earlier snapshots keep it.
    pub fn remove(&self, path: &str) -> Result<ObjectId> {
        let path = RepoPath::parse(path)?;
        ensure_removable(&path)?;
        let entry = self.require(&path)?;

        let base = self.store.head_tree()?;
        let mut editor = TreeEditor::new(self.store.git(), base.as_ref());
        editor.remove(&path)?;
        let tree = editor.write()?;

        let message = format!("Removed {} {}", entry.kind(), path);
        let id = self.store.commit(tree, &message)?;
        info!("{}", message);
        Ok(id.into())
    }

    /// Stages `files` on top of the latest tree and commits them as one
    /// snapshot.
    pub(crate) fn commit_staged(&self, files: Vec<StagedFile>, message: &str) -> Result<ObjectId> {
        let git = self.store.git();
        let base = self.store.head_tree()?;
        let mut editor = TreeEditor::new(git, base.as_ref());

        for file in &files {
            let id = self.store.write_blob(&file.content)?;
            editor.insert(&file.path, id, file.mode())?;
        }

        let tree = editor.write()?;
        let id = self.store.commit(tree, message)?;
        Ok(id.into())
    }

    /// Direct children of the tree `id`, skipping the marker at the root.
    fn children(&self, parent: &RepoPath, id: ObjectId) -> Result<Vec<(RepoPath, Entry)>> {
        Ok(self
            .tree_entries(id)?
            .into_iter()
            .map(|(name, entry)| (parent.join(&name), entry))
            .filter(|(path, _)| !path.is_marker())
            .collect())
    }

    fn tree_entries(&self, id: ObjectId) -> Result<Vec<(String, Entry)>> {
        let tree = self.store.git().find_tree(id.oid())?;
        Ok(tree
            .iter()
            .filter_map(|child| entry_of(&child).map(|entry| (entry_name(&child), entry)))
            .collect())
    }
}

/// The root and the marker file must survive removal and purging.
pub(crate) fn ensure_removable(path: &RepoPath) -> Result<()> {
    if path.is_root() || path.is_marker() {
        return Err(Error::ProtectedPath {
            path: path.display_prefix(),
        });
    }
    Ok(())
}

#[cfg(unix)]
async fn set_mode(target: &Path, mode: i32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let permissions = if mode == i32::from(git2::FileMode::BlobExecutable) {
        0o755
    } else {
        0o644
    };
    fs::set_permissions(target, std::fs::Permissions::from_mode(permissions)).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn set_mode(_target: &Path, _mode: i32) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn fresh_repo(dir: &TempDir) -> Repository {
        Repository::open(dir.path().join("store")).await.unwrap()
    }

    fn write_file(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_new_repository_is_prepared() {
        let dir = TempDir::new().unwrap();
        let repo = fresh_repo(&dir).await;

        assert!(repo.is_prepared().unwrap());
        assert_eq!(repo.commit_count().unwrap(), 1);
        assert_eq!(repo.head().unwrap().unwrap().message, PREPARE_MESSAGE);
        assert!(repo.path().is_absolute());
    }

    #[tokio::test]
    async fn test_open_without_prepare() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::open_with(dir.path().join("store"), OpenOptions::new().prepare(false))
            .await
            .unwrap();

        assert!(!repo.is_prepared().unwrap());
        assert_eq!(repo.commit_count().unwrap(), 0);
        assert!(repo.resolve("/").unwrap().unwrap().is_tree());
    }

    #[tokio::test]
    async fn test_open_missing_without_create_fails() {
        let dir = TempDir::new().unwrap();
        let result = Repository::open_with(dir.path().join("store"), OpenOptions::new().create(false)).await;

        assert!(matches!(result, Err(Error::NoSuchPath { .. })));
    }

    #[tokio::test]
    async fn test_reprepare_fails() {
        let dir = TempDir::new().unwrap();
        let mut repo = fresh_repo(&dir).await;

        assert!(matches!(repo.prepare().await, Err(Error::AlreadyPrepared { .. })));
        assert_eq!(repo.commit_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_foreign_git_history_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store");
        {
            let store = Store::open_or_init(&path, true).unwrap();
            let mut editor = TreeEditor::new(store.git(), None);
            let blob = store.write_blob(b"foreign").unwrap();
            editor
                .insert(&RepoPath::parse("README").unwrap(), blob, 0o100644)
                .unwrap();
            store.commit(editor.write().unwrap(), "Initial commit").unwrap();
        }

        let result = Repository::open(&path).await;
        assert!(matches!(result, Err(Error::InvalidStore { .. })));
    }

    #[tokio::test]
    async fn test_reopen_existing_repository() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store");
        drop(Repository::open(&path).await.unwrap());

        let repo = Repository::open_with(&path, OpenOptions::new().create(false))
            .await
            .unwrap();
        assert!(repo.is_prepared().unwrap());
        assert_eq!(repo.commit_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_add_restore_remove_scenario() {
        let dir = TempDir::new().unwrap();
        let repo = fresh_repo(&dir).await;
        let source = write_file(&dir.path().join("src"), "file1", b"hi");

        repo.add(&source, "/").await.unwrap();
        assert_eq!(repo.commit_count().unwrap(), 2);
        assert!(repo.resolve("file1").unwrap().unwrap().is_blob());
        assert_eq!(
            repo.head().unwrap().unwrap().message,
            format!("Added file {} into '/'", source.display())
        );

        let dest = dir.path().join("restored");
        assert_eq!(repo.restore("file1", &dest).await.unwrap(), 1);
        assert_eq!(std::fs::read(dest.join("file1")).unwrap(), b"hi");

        repo.remove("file1").unwrap();
        assert_eq!(repo.commit_count().unwrap(), 3);
        assert!(repo.resolve("file1").unwrap().is_none());
        assert_eq!(repo.head().unwrap().unwrap().message, "Removed file file1");

        let history = repo.history(Some("file1")).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].message, "Removed file file1");
        assert!(history[1].message.starts_with("Added file"));
    }

    #[tokio::test]
    async fn test_readd_identical_content_keeps_blob_id() {
        let dir = TempDir::new().unwrap();
        let repo = fresh_repo(&dir).await;
        let source = write_file(dir.path(), "same.txt", b"identical");

        repo.add(&source, "/").await.unwrap();
        let first = repo.resolve_required("same.txt").unwrap();
        repo.add(&source, "/").await.unwrap();
        let second = repo.resolve_required("same.txt").unwrap();

        assert_eq!(first.id(), second.id());
        assert_eq!(repo.commit_count().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_add_directory_is_one_commit() {
        let dir = TempDir::new().unwrap();
        let repo = fresh_repo(&dir).await;
        let source = dir.path().join("photos");
        write_file(&source, "a.jpg", b"a");
        write_file(&source, "b.jpg", b"b");
        write_file(&source, "2020/c.jpg", b"c");

        repo.add(&source, "media").await.unwrap();

        assert_eq!(repo.commit_count().unwrap(), 2);
        assert_eq!(
            repo.head().unwrap().unwrap().message,
            format!("Added directory {} into 'media'", source.display())
        );
        assert_eq!(
            repo.contents("media").unwrap(),
            vec![
                "media/",
                "media/photos/",
                "media/photos/2020/",
                "media/photos/2020/c.jpg",
                "media/photos/a.jpg",
                "media/photos/b.jpg",
            ]
        );
    }

    #[tokio::test]
    async fn test_prefix_isolation() {
        let dir = TempDir::new().unwrap();
        let repo = fresh_repo(&dir).await;
        let source = write_file(dir.path(), "f", b"data");

        repo.add(&source, "a").await.unwrap();
        repo.add(&source, "b").await.unwrap();

        assert_eq!(repo.commit_count().unwrap(), 3);
        let a = repo.resolve_required("a/f").unwrap();
        let b = repo.resolve_required("b/f").unwrap();
        assert_eq!(a.id(), b.id());
        assert_eq!(repo.contents("/").unwrap(), vec!["a/", "a/f", "b/", "b/f"]);
    }

    #[tokio::test]
    async fn test_add_missing_source_fails() {
        let dir = TempDir::new().unwrap();
        let repo = fresh_repo(&dir).await;

        let result = repo.add(dir.path().join("missing"), "/").await;
        assert!(matches!(result, Err(Error::Io(_))));
        assert_eq!(repo.commit_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_contents_of_missing_path_is_empty() {
        let dir = TempDir::new().unwrap();
        let repo = fresh_repo(&dir).await;

        assert!(repo.contents("nothing/here").unwrap().is_empty());
        assert!(repo.contents("/").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_paths_raise_file_not_found() {
        let dir = TempDir::new().unwrap();
        let repo = fresh_repo(&dir).await;

        assert!(matches!(repo.info("ghost"), Err(Error::FileNotFound { .. })));
        assert!(matches!(repo.remove("ghost"), Err(Error::FileNotFound { .. })));
        assert!(matches!(
            repo.restore("ghost", dir.path().join("out")).await,
            Err(Error::FileNotFound { .. })
        ));
        assert!(matches!(
            repo.resolve_required("ghost"),
            Err(Error::FileNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_marker_cannot_be_removed() {
        let dir = TempDir::new().unwrap();
        let repo = fresh_repo(&dir).await;

        assert!(matches!(repo.remove(".silo"), Err(Error::ProtectedPath { .. })));
        assert!(matches!(repo.remove("/"), Err(Error::ProtectedPath { .. })));
        assert!(repo.is_prepared().unwrap());
    }

    #[tokio::test]
    async fn test_add_into_marker_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store");
        let repo = Repository::open(&path).await.unwrap();
        let source = write_file(dir.path(), "f", b"data");

        assert!(matches!(
            repo.add(&source, ".silo").await,
            Err(Error::ProtectedPath { .. })
        ));
        assert!(matches!(
            repo.add(&source, "/.silo/nested").await,
            Err(Error::ProtectedPath { .. })
        ));

        assert!(repo.is_prepared().unwrap());
        assert_eq!(repo.commit_count().unwrap(), 1);
        drop(repo);
        assert!(Repository::open(&path).await.is_ok());
    }

    #[tokio::test]
    async fn test_add_source_named_like_marker_is_rejected() {
        let dir = TempDir::new().unwrap();
        let repo = fresh_repo(&dir).await;
        let source = dir.path().join("src").join(".silo");
        write_file(&source, "inner", b"inner");

        assert!(matches!(
            repo.add(&source, "/").await,
            Err(Error::ProtectedPath { .. })
        ));
        assert!(repo.is_prepared().unwrap());
        assert_eq!(repo.commit_count().unwrap(), 1);

        repo.add(&source, "nested").await.unwrap();
        assert!(repo.resolve("nested/.silo/inner").unwrap().is_some());
        assert!(repo.is_prepared().unwrap());
    }

    #[tokio::test]
    async fn test_add_source_ending_in_parent_dir() {
        let dir = TempDir::new().unwrap();
        let repo = fresh_repo(&dir).await;
        let data = dir.path().join("data");
        write_file(&data, "sub/a.txt", b"a");

        let source = data.join("sub").join("..");
        repo.add(&source, "/").await.unwrap();

        assert!(repo.resolve("data/sub/a.txt").unwrap().unwrap().is_blob());
        assert_eq!(
            repo.head().unwrap().unwrap().message,
            format!("Added directory {} into '/'", source.display())
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_restore_clears_stale_executable_bit() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let repo = fresh_repo(&dir).await;
        let source = write_file(dir.path(), "plain.txt", b"plain");
        std::fs::set_permissions(&source, std::fs::Permissions::from_mode(0o644)).unwrap();
        repo.add(&source, "/").await.unwrap();

        let dest = dir.path().join("out");
        let target = write_file(&dest, "plain.txt", b"old");
        std::fs::set_permissions(&target, std::fs::Permissions::from_mode(0o755)).unwrap();

        repo.restore("plain.txt", &dest).await.unwrap();

        let mode = std::fs::metadata(&target).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0);
        assert_eq!(std::fs::read(&target).unwrap(), b"plain");
    }

    #[tokio::test]
    async fn test_restore_directory_tree() {
        let dir = TempDir::new().unwrap();
        let repo = fresh_repo(&dir).await;
        let source = dir.path().join("project");
        write_file(&source, "README", b"readme");
        write_file(&source, "src/main.rs", b"fn main() {}");

        repo.add(&source, "/").await.unwrap();

        let dest = dir.path().join("out");
        assert_eq!(repo.restore("project", &dest).await.unwrap(), 2);
        assert_eq!(std::fs::read(dest.join("project/README")).unwrap(), b"readme");
        assert_eq!(
            std::fs::read(dest.join("project/src/main.rs")).unwrap(),
            b"fn main() {}"
        );

        let everything = dir.path().join("everything");
        repo.restore("/", &everything).await.unwrap();
        assert!(everything.join("project/src/main.rs").is_file());
        assert!(!everything.join(".silo").exists());
    }

    #[tokio::test]
    async fn test_remove_directory_keeps_siblings() {
        let dir = TempDir::new().unwrap();
        let repo = fresh_repo(&dir).await;
        let source = dir.path().join("data");
        write_file(&source, "keep/a", b"a");
        write_file(&source, "drop/b", b"b");

        repo.add(&source, "/").await.unwrap();
        repo.remove("data/drop").unwrap();

        assert_eq!(repo.head().unwrap().unwrap().message, "Removed directory data/drop");
        assert!(repo.resolve("data/drop").unwrap().is_none());
        assert!(repo.resolve("data/keep/a").unwrap().is_some());
    }

    #[tokio::test]
    async fn test_info_reports_metadata() {
        let dir = TempDir::new().unwrap();
        let repo = fresh_repo(&dir).await;
        let source = write_file(dir.path(), "notes.txt", b"hello world");

        repo.add(&source, "docs").await.unwrap();
        repo.add(&source, "docs").await.unwrap();

        let info = repo.info("docs/notes.txt").unwrap();
        assert_eq!(info.kind, EntryKind::File);
        assert_eq!(info.size, Some(11));
        assert_eq!(info.mime_type.as_deref(), Some("text/plain"));
        assert_eq!(info.mode_string(), "100644");
        assert!(info.first_commit <= info.last_commit);

        let dir_info = repo.info("docs").unwrap();
        assert_eq!(dir_info.kind, EntryKind::Directory);
        assert_eq!(dir_info.size, None);
        assert_eq!(dir_info.mode_string(), "040000");
    }

    #[tokio::test]
    async fn test_history_without_path_lists_everything() {
        let dir = TempDir::new().unwrap();
        let repo = fresh_repo(&dir).await;
        let source = write_file(dir.path(), "x", b"x");

        repo.add(&source, "/").await.unwrap();
        let history = repo.history(None).unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history[1].message, PREPARE_MESSAGE);
        assert_eq!(history[0].parents, vec![history[1].id]);
    }
}
