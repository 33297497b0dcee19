//! In-memory editing of snapshot trees.
//!
//! A [`TreeEditor`] starts from a stored tree and only loads the subtrees
//! touched by an edit. Writing it back re-derives the identity of every
//! edited tree from the leaves upward; untouched subtrees keep their stored
//! identifiers.

use crate::path::RepoPath;
use crate::{Error, Result};
use git2::{FileMode, ObjectType, Oid};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub enum Node {
    /// File content, or any other non-tree entry carried over unchanged.
    Blob { id: Oid, mode: i32 },
    /// A subtree still in the store, not yet loaded.
    Stored(Oid),
    Tree(BTreeMap<String, Node>),
}

pub struct TreeEditor<'r> {
    git: &'r git2::Repository,
    root: BTreeMap<String, Node>,
}

impl<'r> TreeEditor<'r> {
    /// Starts from `base`, or from an empty tree when there is none.
    pub fn new(git: &'r git2::Repository, base: Option<&git2::Tree<'_>>) -> Self {
        let root = base.map(load_children).unwrap_or_default();
        Self { git, root }
    }

    /// Places a blob at `path`, creating intermediate trees. Files standing
    /// where a directory is needed are replaced.
    pub fn insert(&mut self, path: &RepoPath, id: Oid, mode: i32) -> Result<()> {
        let Some((name, parents)) = path.segments().split_last() else {
            return Err(Error::InvalidPath {
                path: path.to_string(),
            });
        };

        let mut current = &mut self.root;
        for segment in parents {
            let node = current
                .entry(segment.clone())
                .or_insert_with(|| Node::Tree(BTreeMap::new()));
            current = expand(self.git, node)?;
        }
        current.insert(name.clone(), Node::Blob { id, mode });
        Ok(())
    }

    /// Removes `path` and returns whether it was present. Trees left empty
    /// by the removal are dropped from their parents.
    pub fn remove(&mut self, path: &RepoPath) -> Result<bool> {
        remove_from(self.git, &mut self.root, path.segments())
    }

    pub fn write(self) -> Result<Oid> {
        match write_children(self.git, &self.root)? {
            Some(id) => Ok(id),
            None => Ok(self.git.treebuilder(None)?.write()?),
        }
    }
}

/// Returns the tree obtained by stripping `path` from `tree`, which is
/// `tree` itself when the path is absent.
pub fn strip_path(git: &git2::Repository, tree: &git2::Tree<'_>, path: &RepoPath) -> Result<Oid> {
    let mut editor = TreeEditor::new(git, Some(tree));
    if editor.remove(path)? {
        editor.write()
    } else {
        Ok(tree.id())
    }
}

fn load_children(tree: &git2::Tree<'_>) -> BTreeMap<String, Node> {
    tree.iter()
        .map(|entry| {
            let name = String::from_utf8_lossy(entry.name_bytes()).into_owned();
            let node = match entry.kind() {
                Some(ObjectType::Tree) => Node::Stored(entry.id()),
                _ => Node::Blob {
                    id: entry.id(),
                    mode: entry.filemode(),
                },
            };
            (name, node)
        })
        .collect()
}

fn expand<'n>(
    git: &git2::Repository,
    node: &'n mut Node,
) -> Result<&'n mut BTreeMap<String, Node>> {
    let replacement = match node {
        Node::Tree(_) => None,
        Node::Stored(id) => Some(load_children(&git.find_tree(*id)?)),
        Node::Blob { .. } => Some(BTreeMap::new()),
    };
    if let Some(children) = replacement {
        *node = Node::Tree(children);
    }

    match node {
        Node::Tree(children) => Ok(children),
        Node::Stored(_) | Node::Blob { .. } => {
            Err(Error::Other("failed to expand tree node".to_string()))
        }
    }
}

fn remove_from(
    git: &git2::Repository,
    children: &mut BTreeMap<String, Node>,
    segments: &[String],
) -> Result<bool> {
    let Some((name, rest)) = segments.split_first() else {
        return Ok(false);
    };
    if rest.is_empty() {
        return Ok(children.remove(name).is_some());
    }

    let Some(node) = children.get_mut(name) else {
        return Ok(false);
    };
    if let Node::Blob { .. } = node {
        return Ok(false);
    }

    let subtree = expand(git, node)?;
    let removed = remove_from(git, subtree, rest)?;
    if removed && subtree.is_empty() {
        children.remove(name);
    }
    Ok(removed)
}

fn write_children(git: &git2::Repository, children: &BTreeMap<String, Node>) -> Result<Option<Oid>> {
    let mut builder = git.treebuilder(None)?;
    for (name, node) in children {
        match node {
            Node::Blob { id, mode } => {
                builder.insert(name, *id, *mode)?;
            }
            Node::Stored(id) => {
                builder.insert(name, *id, i32::from(FileMode::Tree))?;
            }
            Node::Tree(subtree) => {
                if let Some(id) = write_children(git, subtree)? {
                    builder.insert(name, id, i32::from(FileMode::Tree))?;
                }
            }
        }
    }

    if builder.len() == 0 {
        return Ok(None);
    }
    Ok(Some(builder.write()?))
}
