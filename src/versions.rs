//! Cluster runtime version reporting
//!
//! Helps align local tooling with a remote cluster: fetches the cluster's
//! Databricks Runtime version, infers the server Python release and the
//! matching databricks-connect line from the DBR major, probes the local
//! `python3` best-effort, and prints a compatibility report.

use crate::api::ApiClient;
use crate::error::{ApiError, ApiResult};
use console::style;
use serde::Deserialize;
use std::process::Command;
use tracing::debug;

const CLUSTERS_LIST_ENDPOINT: &str = "/api/2.0/clusters/list";
const CLUSTERS_GET_ENDPOINT: &str = "/api/2.0/clusters/get";

#[derive(Debug, Deserialize)]
struct ClusterList {
    #[serde(default)]
    clusters: Vec<ClusterSummary>,
}

#[derive(Debug, Deserialize)]
struct ClusterSummary {
    cluster_id: String,
    #[serde(default)]
    cluster_name: String,
    #[serde(default)]
    state: String,
}

#[derive(Debug, Deserialize)]
struct ClusterDetail {
    #[serde(default)]
    cluster_name: String,
    #[serde(default)]
    spark_version: String,
    #[serde(default)]
    node_type_id: String,
    #[serde(default)]
    num_workers: u32,
    #[serde(default)]
    state: String,
}

/// Runtime facts about one cluster, with inferred compatibility data
#[derive(Debug)]
pub struct RuntimeReport {
    pub cluster_id: String,
    pub cluster_name: String,
    pub spark_version: String,
    pub node_type: String,
    pub num_workers: u32,
    pub state: String,
    pub inferred_python: Option<&'static str>,
    pub recommended_connect: Option<&'static str>,
}

/// First component of a DBR version string ("14.3.x-scala2.12" -> "14")
pub fn dbr_major(spark_version: &str) -> Option<&str> {
    let major = spark_version.split('.').next()?;
    if major.is_empty() {
        None
    } else {
        Some(major)
    }
}

/// Python release shipped with a DBR major (approximate, as documented)
pub fn infer_python(major: &str) -> Option<&'static str> {
    match major {
        "10" => Some("3.8"),
        "11" => Some("3.9"),
        "12" | "13" => Some("3.10"),
        "14" | "15" | "16" => Some("3.11"),
        _ => None,
    }
}

/// databricks-connect line matching a DBR major
pub fn recommended_connect(major: &str) -> Option<&'static str> {
    match major {
        "10" => Some("10.4.*"),
        "11" => Some("11.3.*"),
        "12" => Some("12.2.*"),
        "13" => Some("13.3.*"),
        "14" => Some("14.3.*"),
        "15" => Some("15.4.*"),
        "16" => Some("16.1.*"),
        _ => None,
    }
}

/// Fetch the runtime report, picking the first RUNNING cluster when no id
/// is given
pub fn fetch_runtime_report(
    client: &ApiClient,
    cluster_id: Option<String>,
) -> ApiResult<RuntimeReport> {
    let cluster_id = match cluster_id {
        Some(id) => id,
        None => {
            let body = client.get_json(CLUSTERS_LIST_ENDPOINT, &[])?;
            let list: ClusterList =
                serde_json::from_value(body).map_err(|e| ApiError::Decode {
                    endpoint: CLUSTERS_LIST_ENDPOINT.to_string(),
                    detail: e.to_string(),
                })?;
            let running = list
                .clusters
                .into_iter()
                .find(|c| c.state == "RUNNING")
                .ok_or_else(|| {
                    ApiError::Other(
                        "no running clusters found; pass --cluster-id explicitly".into(),
                    )
                })?;
            debug!(
                cluster = %running.cluster_name,
                id = %running.cluster_id,
                "using first running cluster"
            );
            running.cluster_id
        }
    };

    let body = client.post_json(
        CLUSTERS_GET_ENDPOINT,
        &serde_json::json!({ "cluster_id": cluster_id }),
    )?;
    let detail: ClusterDetail = serde_json::from_value(body).map_err(|e| ApiError::Decode {
        endpoint: CLUSTERS_GET_ENDPOINT.to_string(),
        detail: e.to_string(),
    })?;

    let major = dbr_major(&detail.spark_version);
    Ok(RuntimeReport {
        cluster_id,
        cluster_name: detail.cluster_name,
        spark_version: detail.spark_version.clone(),
        node_type: detail.node_type_id,
        num_workers: detail.num_workers,
        state: detail.state,
        inferred_python: major.and_then(infer_python),
        recommended_connect: major.and_then(recommended_connect),
    })
}

/// Best-effort probe of the local `python3` release
pub fn local_python_version() -> Option<String> {
    let output = Command::new("python3").arg("--version").output().ok()?;
    let text = String::from_utf8_lossy(&output.stdout);
    let text = if text.trim().is_empty() {
        String::from_utf8_lossy(&output.stderr)
    } else {
        text
    };
    parse_python_version(&text)
}

/// Extract "3.11.2" from "Python 3.11.2"
pub fn parse_python_version(text: &str) -> Option<String> {
    text.trim()
        .strip_prefix("Python ")
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Major.minor prefix of a full version ("3.11.2" -> "3.11")
pub fn minor_version(version: &str) -> String {
    version
        .split('.')
        .take(2)
        .collect::<Vec<_>>()
        .join(".")
}

/// Print the version comparison report
pub fn print_report(workspace_url: &str, report: &RuntimeReport) {
    println!();
    println!("{}", style("Version Compatibility Check").cyan().bold());
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Workspace:").bold(), workspace_url);
    println!();

    println!("{}", style("Local environment").bold());
    let local_python = local_python_version();
    match &local_python {
        Some(version) => println!("  {} {}", style("python3:").bold(), version),
        None => println!("  {} not found", style("python3:").bold()),
    }
    println!(
        "  {} {}",
        style("dbx-inventory:").bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!();

    println!("{}", style("Cluster runtime").bold());
    println!("  {} {}", style("Cluster:").bold(), report.cluster_name);
    println!("  {} {}", style("State:").bold(), report.state);
    println!(
        "  {} {}",
        style("Spark version:").bold(),
        report.spark_version
    );
    println!("  {} {}", style("Node type:").bold(), report.node_type);
    println!("  {} {}", style("Workers:").bold(), report.num_workers);
    println!(
        "  {} {}",
        style("Inferred Python:").bold(),
        report.inferred_python.unwrap_or("unknown")
    );
    println!(
        "  {} {}",
        style("Recommended databricks-connect:").bold(),
        report.recommended_connect.unwrap_or("latest")
    );
    println!();

    if let (Some(local), Some(server)) = (&local_python, report.inferred_python) {
        let local_minor = minor_version(local);
        if local_minor == server {
            println!(
                "  {} Python versions appear compatible ({local_minor})",
                style("✓").green()
            );
        } else {
            println!(
                "  {} Python version mismatch: local {local_minor}, server {server}",
                style("✗").red()
            );
            println!("    Install Python {server} locally or use a matching databricks-connect");
        }
    }
    if let Some(recommended) = report.recommended_connect {
        println!("    pip install databricks-connect=={recommended}");
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dbr_major() {
        assert_eq!(dbr_major("14.3.x-scala2.12"), Some("14"));
        assert_eq!(dbr_major("10.4.x-photon-scala2.12"), Some("10"));
        assert_eq!(dbr_major(""), None);
    }

    #[test]
    fn test_version_maps() {
        assert_eq!(infer_python("13"), Some("3.10"));
        assert_eq!(infer_python("16"), Some("3.11"));
        assert_eq!(infer_python("9"), None);

        assert_eq!(recommended_connect("14"), Some("14.3.*"));
        assert_eq!(recommended_connect("99"), None);
    }

    #[test]
    fn test_parse_python_version() {
        assert_eq!(
            parse_python_version("Python 3.11.2\n"),
            Some("3.11.2".into())
        );
        assert_eq!(parse_python_version("zsh: not found"), None);
        assert_eq!(parse_python_version(""), None);
    }

    #[test]
    fn test_minor_version() {
        assert_eq!(minor_version("3.11.2"), "3.11");
        assert_eq!(minor_version("3.8"), "3.8");
    }

    #[test]
    fn test_decode_cluster_payloads() {
        let list: ClusterList = serde_json::from_value(serde_json::json!({
            "clusters": [
                {"cluster_id": "a", "cluster_name": "etl", "state": "TERMINATED"},
                {"cluster_id": "b", "cluster_name": "adhoc", "state": "RUNNING"}
            ]
        }))
        .unwrap();
        assert_eq!(list.clusters.len(), 2);
        let running = list.clusters.iter().find(|c| c.state == "RUNNING").unwrap();
        assert_eq!(running.cluster_id, "b");

        let detail: ClusterDetail = serde_json::from_value(serde_json::json!({
            "cluster_name": "adhoc",
            "spark_version": "15.4.x-scala2.12",
            "node_type_id": "i3.xlarge",
            "num_workers": 4,
            "state": "RUNNING"
        }))
        .unwrap();
        assert_eq!(dbr_major(&detail.spark_version), Some("15"));
    }
}
