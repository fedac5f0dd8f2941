use serde::Serialize;

/// One row handed to [`super::Database::update_repository`] by the refresh
/// pipeline. A package row must precede the file rows that reference its
/// pkgid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataRow {
    Package {
        pkgid: String,
        name: String,
        arch: String,
        epoch: String,
        version: String,
        release: String,
    },
    File {
        pkgid: String,
        path: String,
    },
}

/// A single query result row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub repository: String,
    pub package: String,
    pub arch: String,
    pub epoch: String,
    pub version: String,
    pub release: String,
    pub path: String,
}

impl SearchResult {
    /// `version-release`, prefixed with `epoch:` unless the epoch is empty
    /// or `0`.
    pub fn display_version(&self) -> String {
        let mut version = self.version.clone();
        if !self.epoch.is_empty() && self.epoch != "0" {
            version = format!("{}:{}", self.epoch, version);
        }
        if !self.release.is_empty() {
            version.push('-');
            version.push_str(&self.release);
        }
        version
    }
}
