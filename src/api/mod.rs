//! REST API access: rate-limited client, namespace adapters and wire types

pub mod client;
pub mod namespace;
pub mod types;

pub use client::{ApiClient, Fetch, DEFAULT_REQUEST_TIMEOUT_SECS, MAX_ATTEMPTS};
pub use namespace::{DbfsNamespace, Namespace, WorkspaceNamespace};
pub use types::{DirectoryEntry, Listing, NamespaceKind};
