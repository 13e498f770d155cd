//! Recursive directory walker
//!
//! Depth-first traversal over one namespace: parent before children,
//! siblings in the order the backend returned them. Counts and sizes are
//! accumulated in an explicit [`WalkStats`] threaded through the recursion.
//!
//! Failure handling follows the inventory's degrade-don't-abort rule: a
//! listing that gave up below the root is recorded and its subtree skipped;
//! only a failed listing of the root itself fails the walk, because then
//! there is nothing to enumerate at all.

use crate::api::namespace::Namespace;
use crate::api::types::Listing;
use crate::error::ApiError;
use tracing::debug;

/// Fixed per-file size estimate for namespaces that report no sizes (10 KiB)
pub const SIZE_ESTIMATE_BYTES: u64 = 10 * 1024;

/// Default traversal depth bound
pub const DEFAULT_MAX_DEPTH: u32 = 10;

/// Accumulated statistics for one namespace walk
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WalkStats {
    /// Files seen
    pub file_count: u64,

    /// Directories seen
    pub dir_count: u64,

    /// Sum of file sizes; estimated for size-less namespaces
    pub total_size_bytes: u64,

    /// True if any subtree was cut off by the depth bound
    pub truncated: bool,

    /// Listings below the root that gave up (their subtrees were skipped)
    pub failed_listings: u64,
}

impl WalkStats {
    /// Merge another walk's totals into this one
    pub fn merge(&mut self, other: &WalkStats) {
        self.file_count += other.file_count;
        self.dir_count += other.dir_count;
        self.total_size_bytes += other.total_size_bytes;
        self.truncated |= other.truncated;
        self.failed_listings += other.failed_listings;
    }
}

/// Depth-bounded recursive walker over a [`Namespace`]
pub struct Walker {
    max_depth: u32,
}

impl Walker {
    pub fn new(max_depth: u32) -> Self {
        Self { max_depth }
    }

    /// Walk the tree rooted at `root`
    ///
    /// Returns `Err` only when the root listing itself failed; everything
    /// deeper degrades into the stats.
    pub fn walk(&self, namespace: &dyn Namespace, root: &str) -> Result<WalkStats, ApiError> {
        let mut stats = WalkStats::default();

        let listing = namespace.list_children(root);
        if let Some(detail) = listing.failure {
            return Err(ApiError::ListingFailed {
                path: root.to_string(),
                detail,
            });
        }

        self.consume(namespace, listing, 0, &mut stats);
        Ok(stats)
    }

    /// Fold one directory's entries into the stats, recursing into branches
    fn consume(
        &self,
        namespace: &dyn Namespace,
        listing: Listing,
        depth: u32,
        stats: &mut WalkStats,
    ) {
        for entry in listing.entries {
            if entry.is_directory {
                stats.dir_count += 1;
                self.walk_dir(namespace, &entry.path, depth + 1, stats);
            } else {
                stats.file_count += 1;
                stats.total_size_bytes += entry.size_bytes.unwrap_or(SIZE_ESTIMATE_BYTES);
            }
        }
    }

    fn walk_dir(&self, namespace: &dyn Namespace, path: &str, depth: u32, stats: &mut WalkStats) {
        if depth > self.max_depth {
            stats.truncated = true;
            return;
        }

        let listing = namespace.list_children(path);
        if let Some(detail) = listing.failure {
            stats.failed_listings += 1;
            debug!(path = %path, detail = %detail, "listing failed, skipping subtree");
            return;
        }

        self.consume(namespace, listing, depth, stats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{DirectoryEntry, NamespaceKind};
    use std::collections::HashMap;

    /// In-memory namespace: path -> children, plus paths that fail to list
    struct FakeNamespace {
        kind: NamespaceKind,
        tree: HashMap<String, Vec<DirectoryEntry>>,
        failing: Vec<String>,
    }

    impl FakeNamespace {
        fn new(kind: NamespaceKind) -> Self {
            Self {
                kind,
                tree: HashMap::new(),
                failing: Vec::new(),
            }
        }

        fn with_dir(mut self, path: &str, children: Vec<DirectoryEntry>) -> Self {
            self.tree.insert(path.to_string(), children);
            self
        }

        fn with_failure(mut self, path: &str) -> Self {
            self.failing.push(path.to_string());
            self
        }
    }

    impl Namespace for FakeNamespace {
        fn kind(&self) -> NamespaceKind {
            self.kind
        }

        fn list_children(&self, path: &str) -> Listing {
            if self.failing.iter().any(|p| p == path) {
                return Listing::failed("simulated failure");
            }
            Listing {
                entries: self.tree.get(path).cloned().unwrap_or_default(),
                failure: None,
            }
        }
    }

    /// A linear tree: root -> d1 -> d2 -> ... -> d_depth, one file per level
    fn chain(depth: u32) -> FakeNamespace {
        let mut ns = FakeNamespace::new(NamespaceKind::Dbfs);
        let mut parent = "/root".to_string();
        ns.tree.insert(parent.clone(), Vec::new());
        for level in 1..=depth {
            let dir = format!("/root/d{level}");
            let file = DirectoryEntry::file(format!("{dir}.txt"), Some(100));
            let entries = vec![DirectoryEntry::directory(dir.clone()), file];
            ns.tree.insert(parent.clone(), entries);
            parent = dir;
        }
        ns.tree.insert(parent, Vec::new());
        ns
    }

    #[test]
    fn test_flat_directory_counts() {
        let ns = FakeNamespace::new(NamespaceKind::Dbfs).with_dir(
            "/root",
            vec![
                DirectoryEntry::file("/root/a.txt", Some(10)),
                DirectoryEntry::file("/root/b.txt", Some(20)),
                DirectoryEntry::directory("/root/sub"),
            ],
        );

        let stats = Walker::new(10).walk(&ns, "/root").unwrap();
        assert_eq!(stats.file_count, 2);
        assert_eq!(stats.dir_count, 1);
        assert_eq!(stats.total_size_bytes, 30);
        assert!(!stats.truncated);
        assert_eq!(stats.failed_listings, 0);
    }

    #[test]
    fn test_size_estimate_for_sizeless_files() {
        let ns = FakeNamespace::new(NamespaceKind::Workspace).with_dir(
            "/root",
            vec![
                DirectoryEntry::file("/root/nb1", None),
                DirectoryEntry::file("/root/nb2", None),
            ],
        );

        let stats = Walker::new(10).walk(&ns, "/root").unwrap();
        assert_eq!(stats.file_count, 2);
        assert_eq!(stats.total_size_bytes, 2 * SIZE_ESTIMATE_BYTES);
    }

    #[test]
    fn test_depth_bound_truncates_silently() {
        // Tree of depth 5 walked with max_depth 4: the file inside d5 is
        // excluded, no error, truncation flagged.
        let ns = chain(5);

        let full = Walker::new(10).walk(&ns, "/root").unwrap();
        assert_eq!(full.file_count, 5);
        assert!(!full.truncated);

        let bounded = Walker::new(4).walk(&ns, "/root").unwrap();
        assert_eq!(bounded.file_count, 5); // files live beside the dirs
        assert_eq!(bounded.dir_count, 5); // d5 is still counted as an entry
        assert!(bounded.truncated); // but its contents were cut off
    }

    #[test]
    fn test_deep_files_excluded_by_bound() {
        // Files strictly below the bound are not counted
        let ns = FakeNamespace::new(NamespaceKind::Dbfs)
            .with_dir("/root", vec![DirectoryEntry::directory("/root/a")])
            .with_dir("/root/a", vec![DirectoryEntry::directory("/root/a/b")])
            .with_dir(
                "/root/a/b",
                vec![DirectoryEntry::file("/root/a/b/deep.txt", Some(1))],
            );

        let stats = Walker::new(1).walk(&ns, "/root").unwrap();
        assert_eq!(stats.file_count, 0);
        assert!(stats.truncated);
    }

    #[test]
    fn test_subtree_failure_is_absorbed() {
        let ns = FakeNamespace::new(NamespaceKind::Dbfs)
            .with_dir(
                "/root",
                vec![
                    DirectoryEntry::directory("/root/bad"),
                    DirectoryEntry::file("/root/ok.txt", Some(7)),
                ],
            )
            .with_failure("/root/bad");

        let stats = Walker::new(10).walk(&ns, "/root").unwrap();
        assert_eq!(stats.file_count, 1);
        assert_eq!(stats.total_size_bytes, 7);
        assert_eq!(stats.failed_listings, 1);
    }

    #[test]
    fn test_root_failure_is_an_error() {
        let ns = FakeNamespace::new(NamespaceKind::Dbfs).with_failure("/root");
        let err = Walker::new(10).walk(&ns, "/root").unwrap_err();
        assert!(err.is_listing_failure());
    }

    #[test]
    fn test_missing_root_is_empty_not_error() {
        let ns = FakeNamespace::new(NamespaceKind::Dbfs);
        let stats = Walker::new(10).walk(&ns, "/Users/nobody").unwrap();
        assert_eq!(stats, WalkStats::default());
    }

    #[test]
    fn test_merge() {
        let mut a = WalkStats {
            file_count: 1,
            dir_count: 2,
            total_size_bytes: 100,
            truncated: false,
            failed_listings: 0,
        };
        let b = WalkStats {
            file_count: 3,
            dir_count: 0,
            total_size_bytes: 50,
            truncated: true,
            failed_listings: 2,
        };
        a.merge(&b);
        assert_eq!(a.file_count, 4);
        assert_eq!(a.total_size_bytes, 150);
        assert!(a.truncated);
        assert_eq!(a.failed_listings, 2);
    }
}
