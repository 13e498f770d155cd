//! Workspace user enumeration via the SCIM API
//!
//! Produces the subject list the scan consumes: one username per line,
//! suitable for feeding straight back in as a subjects file.

use crate::api::ApiClient;
use crate::error::{ApiError, ApiResult};
use serde::Deserialize;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

const SCIM_USERS_ENDPOINT: &str = "/api/2.0/preview/scim/v2/Users";

/// SCIM page size
const PAGE_SIZE: usize = 100;

/// One workspace user as returned by SCIM
#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceUser {
    #[serde(rename = "userName")]
    pub user_name: String,

    #[serde(default, rename = "displayName")]
    pub display_name: Option<String>,

    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct ScimPage {
    #[serde(default, rename = "Resources")]
    resources: Vec<WorkspaceUser>,
}

/// Fetch all workspace users, stopping early at `max_users` if given
pub fn list_users(client: &ApiClient, max_users: Option<usize>) -> ApiResult<Vec<WorkspaceUser>> {
    let mut users = Vec::new();
    let mut start_index = 1usize;

    loop {
        debug!(start_index = start_index, count = PAGE_SIZE, "requesting users page");
        let body = client.get_json(
            SCIM_USERS_ENDPOINT,
            &[
                ("startIndex", start_index.to_string()),
                ("count", PAGE_SIZE.to_string()),
            ],
        )?;

        let page: ScimPage = serde_json::from_value(body).map_err(|e| ApiError::Decode {
            endpoint: SCIM_USERS_ENDPOINT.to_string(),
            detail: e.to_string(),
        })?;

        if page.resources.is_empty() {
            break;
        }

        for user in page.resources {
            users.push(user);
            if let Some(max) = max_users {
                if users.len() >= max {
                    info!(users = users.len(), "stopping early at requested maximum");
                    return Ok(users);
                }
            }
        }

        start_index += PAGE_SIZE;
    }

    info!(users = users.len(), "user enumeration complete");
    Ok(users)
}

/// Write usernames one per line to a file, or to stdout when no path given
pub fn write_user_list(users: &[WorkspaceUser], output: Option<&Path>) -> std::io::Result<()> {
    match output {
        Some(path) => {
            let mut file = std::fs::File::create(path)?;
            for user in users {
                writeln!(file, "{}", user.user_name)?;
            }
            info!(path = %path.display(), users = users.len(), "user list written");
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            for user in users {
                writeln!(out, "{}", user.user_name)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_decode_scim_page() {
        let body = serde_json::json!({
            "totalResults": 2,
            "Resources": [
                {"userName": "alice@example.com", "displayName": "Alice", "active": true},
                {"userName": "bob@example.com"}
            ]
        });
        let page: ScimPage = serde_json::from_value(body).unwrap();
        assert_eq!(page.resources.len(), 2);
        assert_eq!(page.resources[0].display_name.as_deref(), Some("Alice"));
        assert!(page.resources[1].active);
        assert_eq!(page.resources[1].display_name, None);
    }

    #[test]
    fn test_decode_empty_page() {
        let page: ScimPage = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(page.resources.is_empty());
    }

    #[test]
    fn test_write_user_list_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("users.txt");

        let users = vec![
            WorkspaceUser {
                user_name: "alice@example.com".into(),
                display_name: None,
                active: true,
            },
            WorkspaceUser {
                user_name: "bob@example.com".into(),
                display_name: None,
                active: true,
            },
        ];
        write_user_list(&users, Some(&path)).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "alice@example.com\nbob@example.com\n");
    }
}
