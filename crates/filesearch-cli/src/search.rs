//! The file-search command: find packages providing files that match a glob.

use filesearch_core::{
    database::{Database, SearchResult},
    zypper::Repository,
    Error, Result,
};

/// Run a glob search, preferring the detected architecture and enabled
/// repositories but falling back to foreign and disabled cache entries
/// rather than returning nothing.
pub fn run(
    db: &Database,
    repos: &[Repository],
    terms: &[String],
    arch: &str,
) -> Result<Vec<SearchResult>> {
    let [pattern] = terms else {
        return Err(Error::Custom("usage: zypper file-search [pattern]".into()));
    };

    for arch in [arch, ""] {
        for enabled in [true, false] {
            let urls = repo_urls(repos, enabled);
            let results = db.search_file(pattern, arch, &urls)?;
            if !results.is_empty() {
                return Ok(results);
            }
        }
    }
    Ok(Vec::new())
}

pub fn repo_urls(repos: &[Repository], enabled: bool) -> Vec<&str> {
    repos
        .iter()
        .filter(|repo| repo.enabled == enabled)
        .map(|repo| repo.url.as_str())
        .collect()
}
