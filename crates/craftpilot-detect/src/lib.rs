//! Discovery of running game-client instances.
//!
//! Scans the process table for Java game clients: `tasklist` on Windows,
//! `ps aux` elsewhere. Side-effect free from the caller's perspective; a
//! failed scan yields an empty list, never an error. Discovery makes no
//! guarantee that a descriptor is safe or even still alive by the time it
//! is used.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One candidate game-client process.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceDescriptor {
    /// Stable identifier the instance is expected to register under.
    pub id: String,
    pub pid: u32,
    pub name: String,
    pub platform: String,
    /// Game version extracted from the process title, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl InstanceDescriptor {
    fn new(pid: u32, name: String, version: Option<String>) -> Self {
        Self {
            id: format!("instance_{}", pid),
            pid,
            name,
            platform: std::env::consts::OS.to_string(),
            version,
        }
    }
}

/// Scan the process table for candidate instances.
pub async fn detect_instances() -> Vec<InstanceDescriptor> {
    match scan().await {
        Ok(instances) => {
            debug!(count = instances.len(), "Instance scan finished");
            instances
        }
        Err(e) => {
            warn!(error = %e, "Instance scan failed");
            Vec::new()
        }
    }
}

#[cfg(target_os = "windows")]
async fn scan() -> std::io::Result<Vec<InstanceDescriptor>> {
    let output = tokio::process::Command::new("tasklist")
        .args(["/FI", "IMAGENAME eq javaw.exe", "/FO", "CSV", "/NH"])
        .output()
        .await?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_tasklist_csv(&stdout)
        .into_iter()
        .map(|(pid, name)| {
            let version = extract_version(&name);
            InstanceDescriptor::new(pid, name, version)
        })
        .collect())
}

#[cfg(not(target_os = "windows"))]
async fn scan() -> std::io::Result<Vec<InstanceDescriptor>> {
    let output = tokio::process::Command::new("ps")
        .args(["aux"])
        .output()
        .await?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_ps_output(&stdout)
        .into_iter()
        .map(|(pid, command)| {
            let version = extract_version(&command);
            InstanceDescriptor::new(pid, "Minecraft".to_string(), version)
        })
        .collect())
}

/// Parse `tasklist /FO CSV /NH` output into (pid, image name) pairs.
///
/// Each row is a quoted CSV record:
/// `"javaw.exe","12345","Console","1","1,024,000 K"`.
fn parse_tasklist_csv(output: &str) -> Vec<(u32, String)> {
    output
        .lines()
        .filter_map(|line| {
            let fields: Vec<&str> = line
                .split("\",\"")
                .map(|field| field.trim_matches(|c| c == '"' || c == '\r'))
                .collect();
            if fields.len() < 2 {
                return None;
            }
            let pid = fields[1].parse::<u32>().ok()?;
            Some((pid, fields[0].to_string()))
        })
        .collect()
}

/// Filter `ps aux` output down to Java processes that look like the game.
fn parse_ps_output(output: &str) -> Vec<(u32, String)> {
    output
        .lines()
        .filter(|line| {
            let lower = line.to_lowercase();
            lower.contains("java") && lower.contains("minecraft") && !lower.contains("grep")
        })
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let _user = fields.next()?;
            let pid = fields.next()?.parse::<u32>().ok()?;
            let command = fields.collect::<Vec<&str>>().join(" ");
            Some((pid, command))
        })
        .collect()
}

/// Pull a dotted version number out of a process or window title.
fn extract_version(title: &str) -> Option<String> {
    let pattern = Regex::new(r"\d+\.\d+(\.\d+)?").ok()?;
    pattern.find(title).map(|m| m.as_str().to_string())
}
