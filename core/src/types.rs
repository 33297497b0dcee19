use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Content-derived identifier of a blob, tree or commit in the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(git2::Oid);

impl ObjectId {
    pub fn new(oid: git2::Oid) -> Self {
        Self(oid)
    }

    pub fn oid(&self) -> git2::Oid {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn to_hex(&self) -> String {
        self.0.to_string()
    }

    pub fn short_string(&self) -> String {
        self.to_hex().chars().take(8).collect()
    }
}

impl From<git2::Oid> for ObjectId {
    fn from(oid: git2::Oid) -> Self {
        Self(oid)
    }
}

impl FromStr for ObjectId {
    type Err = git2::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        git2::Oid::from_str(s).map(Self)
    }
}

impl Serialize for ObjectId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

impl EntryKind {
    /// The word used in generated snapshot messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved object inside a snapshot tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry {
    Blob { id: ObjectId, mode: i32 },
    Tree { id: ObjectId },
}

impl Entry {
    pub fn id(&self) -> ObjectId {
        match self {
            Entry::Blob { id, .. } | Entry::Tree { id } => *id,
        }
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::Blob { .. } => EntryKind::File,
            Entry::Tree { .. } => EntryKind::Directory,
        }
    }

    pub fn mode(&self) -> i32 {
        match self {
            Entry::Blob { mode, .. } => *mode,
            Entry::Tree { .. } => i32::from(git2::FileMode::Tree),
        }
    }

    pub fn is_blob(&self) -> bool {
        matches!(self, Entry::Blob { .. })
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, Entry::Tree { .. })
    }
}

/// Descriptive metadata about a path in the latest snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct EntryInfo {
    pub path: String,
    pub kind: EntryKind,
    pub id: ObjectId,
    pub mode: i32,
    /// Files only.
    pub size: Option<u64>,
    /// Files only, guessed from the file name.
    pub mime_type: Option<String>,
    pub first_commit: DateTime<Utc>,
    pub last_commit: DateTime<Utc>,
}

impl EntryInfo {
    pub fn mode_string(&self) -> String {
        format!("{:06o}", self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_hex_roundtrip() {
        let oid = git2::Oid::hash_object(git2::ObjectType::Blob, b"hi").unwrap();
        let id = ObjectId::from(oid);

        assert_eq!(id.to_hex().len(), 40);
        assert_eq!(id.short_string().len(), 8);
        assert_eq!(id.to_hex().parse::<ObjectId>().unwrap(), id);
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            format!("\"{}\"", id.to_hex())
        );
    }

    #[test]
    fn test_entry_modes() {
        let oid = git2::Oid::hash_object(git2::ObjectType::Blob, b"hi").unwrap();
        let blob = Entry::Blob {
            id: oid.into(),
            mode: 0o100644,
        };
        let tree = Entry::Tree { id: oid.into() };

        assert_eq!(blob.kind(), EntryKind::File);
        assert_eq!(tree.kind(), EntryKind::Directory);
        assert_eq!(tree.mode(), 0o040000);
        assert_eq!(EntryKind::Directory.to_string(), "directory");
    }
}
