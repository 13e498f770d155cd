//! Core types for remote directory listings
//!
//! A listing call returns a set of [`DirectoryEntry`] values plus an
//! optional recorded failure. Entries are transient: they are produced per
//! API call, consumed by the walker, and never persisted.

use serde::Deserialize;

/// Which remote filesystem namespace an adapter talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamespaceKind {
    /// DBFS data files (`/api/2.0/dbfs/list`) - reports exact sizes
    Dbfs,
    /// Workspace notebooks and files (`/api/2.0/workspace/list`) - no sizes
    Workspace,
}

impl NamespaceKind {
    /// Short lowercase label used in logs and the source breakdown
    pub fn as_str(&self) -> &'static str {
        match self {
            NamespaceKind::Dbfs => "dbfs",
            NamespaceKind::Workspace => "workspace",
        }
    }
}

impl std::fmt::Display for NamespaceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One item returned by a single listing call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Absolute remote path
    pub path: String,

    /// Leaf name
    pub name: String,

    /// Whether this entry is a directory
    pub is_directory: bool,

    /// Exact byte size; `None` in namespaces that do not report sizes
    pub size_bytes: Option<u64>,
}

impl DirectoryEntry {
    /// Create a file entry
    pub fn file(path: impl Into<String>, size_bytes: Option<u64>) -> Self {
        let path = path.into();
        let name = leaf_name(&path);
        Self {
            path,
            name,
            is_directory: false,
            size_bytes,
        }
    }

    /// Create a directory entry
    pub fn directory(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = leaf_name(&path);
        Self {
            path,
            name,
            is_directory: true,
            size_bytes: None,
        }
    }
}

/// Extract the last path component
pub fn leaf_name(path: &str) -> String {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path)
        .to_string()
}

/// Result of listing the children of one path
///
/// A not-found path and an empty directory both produce an empty listing
/// with no failure - neither is an error. `failure` is set when the call
/// gave up (retries exhausted, unexpected status, malformed body); the
/// caller decides what that means for the traversal.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    /// Entries in the order the backend returned them
    pub entries: Vec<DirectoryEntry>,

    /// Recorded failure description, if the call gave up
    pub failure: Option<String>,
}

impl Listing {
    /// An empty, successful listing (not-found or genuinely empty)
    pub fn empty() -> Self {
        Self::default()
    }

    /// A listing that failed; carries the reason for the caller
    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            entries: Vec::new(),
            failure: Some(detail.into()),
        }
    }
}

/// Wire shape of a DBFS list response
#[derive(Debug, Deserialize)]
pub struct DbfsListResponse {
    #[serde(default)]
    pub files: Vec<DbfsFileInfo>,
}

/// One DBFS entry on the wire
#[derive(Debug, Deserialize)]
pub struct DbfsFileInfo {
    pub path: String,
    #[serde(default)]
    pub is_dir: bool,
    #[serde(default)]
    pub file_size: u64,
}

impl From<DbfsFileInfo> for DirectoryEntry {
    fn from(info: DbfsFileInfo) -> Self {
        if info.is_dir {
            DirectoryEntry::directory(info.path)
        } else {
            DirectoryEntry::file(info.path, Some(info.file_size))
        }
    }
}

/// Wire shape of a workspace list response
#[derive(Debug, Deserialize)]
pub struct WorkspaceListResponse {
    #[serde(default)]
    pub objects: Vec<WorkspaceObject>,
}

/// One workspace object on the wire
///
/// `object_type` is `DIRECTORY`, `NOTEBOOK`, `FILE`, `LIBRARY` or `REPO`;
/// everything that is not a directory is counted as a file. The workspace
/// API does not report sizes.
#[derive(Debug, Deserialize)]
pub struct WorkspaceObject {
    pub path: String,
    #[serde(default)]
    pub object_type: String,
}

impl From<WorkspaceObject> for DirectoryEntry {
    fn from(obj: WorkspaceObject) -> Self {
        if obj.object_type == "DIRECTORY" {
            DirectoryEntry::directory(obj.path)
        } else {
            DirectoryEntry::file(obj.path, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_name() {
        assert_eq!(leaf_name("/Users/a@b.com/notes.py"), "notes.py");
        assert_eq!(leaf_name("/Users/a@b.com/dir/"), "dir");
        assert_eq!(leaf_name("top"), "top");
    }

    #[test]
    fn test_dbfs_entry_conversion() {
        let entry: DirectoryEntry = DbfsFileInfo {
            path: "/Users/a@b.com/data.parquet".into(),
            is_dir: false,
            file_size: 4096,
        }
        .into();
        assert!(!entry.is_directory);
        assert_eq!(entry.size_bytes, Some(4096));
        assert_eq!(entry.name, "data.parquet");

        let dir: DirectoryEntry = DbfsFileInfo {
            path: "/Users/a@b.com/models".into(),
            is_dir: true,
            file_size: 0,
        }
        .into();
        assert!(dir.is_directory);
        assert_eq!(dir.size_bytes, None);
    }

    #[test]
    fn test_workspace_entry_conversion() {
        let nb: DirectoryEntry = WorkspaceObject {
            path: "/Users/a@b.com/etl".into(),
            object_type: "NOTEBOOK".into(),
        }
        .into();
        assert!(!nb.is_directory);
        assert_eq!(nb.size_bytes, None);

        let dir: DirectoryEntry = WorkspaceObject {
            path: "/Users/a@b.com/projects".into(),
            object_type: "DIRECTORY".into(),
        }
        .into();
        assert!(dir.is_directory);
    }

    #[test]
    fn test_decode_dbfs_response() {
        let body = serde_json::json!({
            "files": [
                {"path": "/Users/u/one.txt", "is_dir": false, "file_size": 10},
                {"path": "/Users/u/sub", "is_dir": true}
            ]
        });
        let decoded: DbfsListResponse = serde_json::from_value(body).unwrap();
        assert_eq!(decoded.files.len(), 2);
        assert!(decoded.files[1].is_dir);
    }

    #[test]
    fn test_decode_empty_response() {
        // The API omits the array entirely for empty directories
        let decoded: DbfsListResponse = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(decoded.files.is_empty());

        let decoded: WorkspaceListResponse =
            serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(decoded.objects.is_empty());
    }
}
