//! Credential resolution
//!
//! Workspace URL and token are resolved once, before any worker starts,
//! from precedence-ordered sources:
//!
//! 1. Explicit CLI flags
//! 2. A profile in `~/.databrickscfg` (selected by `--profile`, then the
//!    `DATABRICKS_CONFIG_PROFILE` environment variable, then `DEFAULT`,
//!    then the first profile in the file)
//! 3. `DATABRICKS_HOST` / `DATABRICKS_WORKSPACE_URL` and `DATABRICKS_TOKEN`
//!    environment variables
//!
//! The resolved [`Credentials`] value is passed explicitly into the request
//! client; nothing below this module reads ambient state.

use crate::error::CredentialError;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Resolved workspace credentials
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Normalized workspace URL (`https://...`, no trailing slash)
    pub workspace_url: String,

    /// Personal access token
    pub token: String,
}

/// One profile from `~/.databrickscfg`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileConfig {
    pub host: Option<String>,
    pub token: Option<String>,
    pub cluster_id: Option<String>,
}

impl Credentials {
    /// Resolve credentials from flags, profile file and environment
    pub fn resolve(
        explicit_url: Option<&str>,
        explicit_token: Option<&str>,
        profile: Option<&str>,
    ) -> Result<Self, CredentialError> {
        let profile_cfg = load_profile_config(profile)?;
        let env_host = std::env::var("DATABRICKS_HOST")
            .or_else(|_| std::env::var("DATABRICKS_WORKSPACE_URL"))
            .ok();
        let env_token = std::env::var("DATABRICKS_TOKEN").ok();

        from_sources(
            explicit_url,
            explicit_token,
            profile_cfg.as_ref(),
            env_host.as_deref(),
            env_token.as_deref(),
        )
    }
}

/// Combine the precedence-ordered sources into one credentials value
pub fn from_sources(
    explicit_url: Option<&str>,
    explicit_token: Option<&str>,
    profile: Option<&ProfileConfig>,
    env_host: Option<&str>,
    env_token: Option<&str>,
) -> Result<Credentials, CredentialError> {
    let raw_url = explicit_url
        .map(str::to_string)
        .or_else(|| profile.and_then(|p| p.host.clone()))
        .or_else(|| env_host.map(str::to_string))
        .ok_or(CredentialError::Missing {
            what: "workspace URL",
        })?;

    let token = explicit_token
        .map(str::to_string)
        .or_else(|| profile.and_then(|p| p.token.clone()))
        .or_else(|| env_token.map(str::to_string))
        .ok_or(CredentialError::Missing { what: "token" })?;

    Ok(Credentials {
        workspace_url: normalize_workspace_url(&raw_url)?,
        token,
    })
}

/// Normalize a host into `https://host` with no trailing slash
pub fn normalize_workspace_url(raw: &str) -> Result<String, CredentialError> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(CredentialError::InvalidUrl {
            url: raw.to_string(),
            reason: "empty host".into(),
        });
    }
    if trimmed.starts_with("https://") || trimmed.starts_with("http://") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("https://{trimmed}"))
    }
}

/// Load the selected profile from `~/.databrickscfg`, if the file exists
pub fn load_profile_config(
    profile: Option<&str>,
) -> Result<Option<ProfileConfig>, CredentialError> {
    let Some(home) = dirs::home_dir() else {
        return Ok(None);
    };
    let path = home.join(".databrickscfg");
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path).map_err(|e| CredentialError::ProfileFile {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let requested = profile
        .map(str::to_string)
        .or_else(|| std::env::var("DATABRICKS_CONFIG_PROFILE").ok());

    Ok(select_profile(
        &parse_profile_file(&content),
        requested.as_deref(),
        &path,
    ))
}

/// Parse the INI-style profile file into named profiles
///
/// Sections are `[NAME]`; keys are lowercased; `#` and `;` lines are
/// comments. Keys outside any section are ignored.
pub fn parse_profile_file(content: &str) -> Vec<(String, ProfileConfig)> {
    let mut profiles: Vec<(String, ProfileConfig)> = Vec::new();
    let mut sections: HashMap<String, usize> = HashMap::new();
    let mut current: Option<usize> = None;

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim().to_string();
            let idx = *sections.entry(name.clone()).or_insert_with(|| {
                profiles.push((name, ProfileConfig::default()));
                profiles.len() - 1
            });
            current = Some(idx);
            continue;
        }

        let Some(idx) = current else { continue };
        if let Some((key, value)) = line.split_once('=') {
            let key = key.trim().to_lowercase();
            let value = value.trim().to_string();
            let cfg = &mut profiles[idx].1;
            match key.as_str() {
                "host" => cfg.host = Some(value),
                "token" => cfg.token = Some(value),
                "cluster_id" => cfg.cluster_id = Some(value),
                _ => {}
            }
        }
    }

    profiles
}

/// Pick the requested profile, falling back to `DEFAULT`, then the first
fn select_profile(
    profiles: &[(String, ProfileConfig)],
    requested: Option<&str>,
    path: &Path,
) -> Option<ProfileConfig> {
    if profiles.is_empty() {
        return None;
    }

    if let Some(name) = requested {
        if let Some((_, cfg)) = profiles.iter().find(|(n, _)| n == name) {
            debug!(profile = %name, "using requested profile");
            return Some(cfg.clone());
        }
        warn!(
            profile = %name,
            path = %path.display(),
            "profile not found, falling back"
        );
    }

    if let Some((_, cfg)) = profiles.iter().find(|(n, _)| n == "DEFAULT") {
        return Some(cfg.clone());
    }

    profiles.first().map(|(_, cfg)| cfg.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# comment line
[DEFAULT]
host = my-workspace.cloud.databricks.com
token = dapi-default

[PROD]
host = https://prod.cloud.databricks.com/
token = dapi-prod
cluster_id = 0101-123456-abcdef
; trailing comment
";

    #[test]
    fn test_parse_profiles() {
        let profiles = parse_profile_file(SAMPLE);
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].0, "DEFAULT");
        assert_eq!(
            profiles[1].1.cluster_id.as_deref(),
            Some("0101-123456-abcdef")
        );
    }

    #[test]
    fn test_select_requested_then_default_then_first() {
        let profiles = parse_profile_file(SAMPLE);
        let path = Path::new("/tmp/.databrickscfg");

        let prod = select_profile(&profiles, Some("PROD"), path).unwrap();
        assert_eq!(prod.token.as_deref(), Some("dapi-prod"));

        // Unknown profile falls back to DEFAULT
        let fallback = select_profile(&profiles, Some("STAGING"), path).unwrap();
        assert_eq!(fallback.token.as_deref(), Some("dapi-default"));

        // No DEFAULT: first profile wins
        let only_prod: Vec<_> = profiles.into_iter().filter(|(n, _)| n == "PROD").collect();
        let first = select_profile(&only_prod, None, path).unwrap();
        assert_eq!(first.token.as_deref(), Some("dapi-prod"));
    }

    #[test]
    fn test_precedence_explicit_over_profile_over_env() {
        let profile = ProfileConfig {
            host: Some("profile.cloud.databricks.com".into()),
            token: Some("dapi-profile".into()),
            cluster_id: None,
        };

        let creds = from_sources(
            Some("https://flag.cloud.databricks.com"),
            Some("dapi-flag"),
            Some(&profile),
            Some("env.cloud.databricks.com"),
            Some("dapi-env"),
        )
        .unwrap();
        assert_eq!(creds.workspace_url, "https://flag.cloud.databricks.com");
        assert_eq!(creds.token, "dapi-flag");

        let creds = from_sources(
            None,
            None,
            Some(&profile),
            Some("env.cloud.databricks.com"),
            Some("dapi-env"),
        )
        .unwrap();
        assert_eq!(creds.workspace_url, "https://profile.cloud.databricks.com");
        assert_eq!(creds.token, "dapi-profile");

        let creds =
            from_sources(None, None, None, Some("env.cloud.databricks.com"), Some("dapi-env"))
                .unwrap();
        assert_eq!(creds.workspace_url, "https://env.cloud.databricks.com");
    }

    #[test]
    fn test_missing_sources() {
        let err = from_sources(None, None, None, None, None).unwrap_err();
        assert!(matches!(
            err,
            CredentialError::Missing {
                what: "workspace URL"
            }
        ));

        let err = from_sources(Some("host"), None, None, None, None).unwrap_err();
        assert!(matches!(err, CredentialError::Missing { what: "token" }));
    }

    #[test]
    fn test_normalize_workspace_url() {
        assert_eq!(
            normalize_workspace_url("my.cloud.databricks.com").unwrap(),
            "https://my.cloud.databricks.com"
        );
        assert_eq!(
            normalize_workspace_url("https://my.cloud.databricks.com/").unwrap(),
            "https://my.cloud.databricks.com"
        );
        assert!(normalize_workspace_url("   ").is_err());
    }
}
