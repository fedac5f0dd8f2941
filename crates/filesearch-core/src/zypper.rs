//! Wrappers around the host `zypper` binary: repository enumeration and
//! system architecture discovery.

use std::{process::Command, sync::OnceLock};

use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::{error::Error, Result};

/// A repository as reported by `zypper --xmlout repos`.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    #[serde(default)]
    pub alias: String,

    #[serde(default)]
    pub name: String,

    /// Repository type; empty means rpm-md.
    #[serde(rename = "type", default)]
    pub repo_type: String,

    #[serde(default, deserialize_with = "deserialize_flag")]
    pub enabled: bool,

    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct RepoList {
    #[serde(rename = "repo", default)]
    repos: Vec<Repository>,
}

/// zypper emits boolean attributes as `1`/`0`.
fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(matches!(value.as_str(), "1" | "true" | "yes"))
}

/// List the repositories configured on the system.
pub fn list_repositories(release_ver: Option<&str>) -> Result<Vec<Repository>> {
    let mut cmd = Command::new("zypper");
    if let Some(ver) = release_ver {
        cmd.arg("--releasever").arg(ver);
    }
    cmd.arg("--xmlout").arg("repos");

    let output = cmd
        .output()
        .map_err(|err| Error::ZypperCommand(err.to_string()))?;
    if !output.status.success() {
        return Err(Error::ZypperCommand(format!(
            "zypper exited with {}",
            output.status
        )));
    }

    let repos = parse_repositories(&output.stdout)?;
    debug!(count = repos.len(), "listed repositories");
    Ok(repos)
}

fn parse_repositories(xml: &[u8]) -> Result<Vec<Repository>> {
    let mut list: RepoList =
        serde_xml_rs::from_reader(xml).map_err(|err| Error::ZypperOutput(err.to_string()))?;
    for repo in &mut list.repos {
        if repo.repo_type.is_empty() {
            // Assume rpm-md if no type given
            repo.repo_type = "rpm-md".to_string();
        }
    }
    Ok(list.repos)
}

static ARCH: OnceLock<std::result::Result<String, String>> = OnceLock::new();

/// The system architecture as reported by `zypper system-architecture`.
///
/// The first result, success or failure, is cached for the lifetime of the
/// process; zypper is invoked at most once.
pub fn arch() -> Result<String> {
    let cached = ARCH.get_or_init(|| {
        let output = Command::new("zypper")
            .arg("system-architecture")
            .output()
            .map_err(|err| err.to_string())?;
        if !output.status.success() {
            return Err(format!("zypper exited with {}", output.status));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    });
    match cached {
        Ok(arch) => Ok(arch.clone()),
        Err(err) => Err(Error::ZypperCommand(err.clone())),
    }
}
