//! Namespace adapters
//!
//! The two remote filesystems are enumerated through one capability
//! interface: [`Namespace`]. The walker and the per-subject task are
//! written once against the trait; each adapter only knows its endpoint,
//! its wire shape and its home-directory convention.

use crate::api::client::{ApiClient, Fetch};
use crate::api::types::{
    DbfsListResponse, Listing, NamespaceKind, WorkspaceListResponse,
};

/// DBFS listing endpoint
const DBFS_LIST_ENDPOINT: &str = "/api/2.0/dbfs/list";

/// Workspace listing endpoint
const WORKSPACE_LIST_ENDPOINT: &str = "/api/2.0/workspace/list";

/// A remote filesystem root that can list the children of a path
pub trait Namespace {
    /// Which namespace this adapter serves
    fn kind(&self) -> NamespaceKind;

    /// Home directory for a subject within this namespace
    fn home_path(&self, subject_id: &str) -> String {
        format!("/Users/{subject_id}")
    }

    /// List the immediate children of an absolute path
    ///
    /// Not-found and empty directories both return an empty listing with no
    /// failure. A listing whose call gave up carries the failure detail.
    fn list_children(&self, path: &str) -> Listing;
}

/// DBFS data-file namespace; sizes are exact
pub struct DbfsNamespace<'a> {
    client: &'a ApiClient,
}

impl<'a> DbfsNamespace<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }
}

impl Namespace for DbfsNamespace<'_> {
    fn kind(&self) -> NamespaceKind {
        NamespaceKind::Dbfs
    }

    fn list_children(&self, path: &str) -> Listing {
        match self.client.fetch_listing(DBFS_LIST_ENDPOINT, path) {
            Fetch::Success(body) => match serde_json::from_value::<DbfsListResponse>(body) {
                Ok(decoded) => Listing {
                    entries: decoded.files.into_iter().map(Into::into).collect(),
                    failure: None,
                },
                Err(e) => Listing::failed(format!("unexpected dbfs listing shape: {e}")),
            },
            Fetch::Missing => Listing::empty(),
            Fetch::Failed(detail) => Listing::failed(detail),
        }
    }
}

/// Workspace notebook/file namespace; the API reports no sizes, so files
/// surface with `size_bytes = None` and the walker applies its estimate
pub struct WorkspaceNamespace<'a> {
    client: &'a ApiClient,
}

impl<'a> WorkspaceNamespace<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }
}

impl Namespace for WorkspaceNamespace<'_> {
    fn kind(&self) -> NamespaceKind {
        NamespaceKind::Workspace
    }

    fn list_children(&self, path: &str) -> Listing {
        match self.client.fetch_listing(WORKSPACE_LIST_ENDPOINT, path) {
            Fetch::Success(body) => match serde_json::from_value::<WorkspaceListResponse>(body) {
                Ok(decoded) => Listing {
                    entries: decoded.objects.into_iter().map(Into::into).collect(),
                    failure: None,
                },
                Err(e) => Listing::failed(format!("unexpected workspace listing shape: {e}")),
            },
            Fetch::Missing => Listing::empty(),
            Fetch::Failed(detail) => Listing::failed(detail),
        }
    }
}
