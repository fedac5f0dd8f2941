//! Read-side queries: glob file search and package file listing.

use rusqlite::{Row, ToSql};
use tracing::warn;

use crate::Result;

use super::{connection::Database, models::SearchResult};

const RESULT_COLUMNS: &str =
    "r.name, p.name, p.arch, p.epoch, p.version, p.release, f.file
     FROM packages p
     JOIN repositories r ON p.repository = r.id
     JOIN files f ON f.pkgid = p.id";

impl Database {
    /// Find packages that provide a file matching the glob `pattern`,
    /// restricted to the repositories with the given URLs.
    ///
    /// An empty `arch` matches every package; otherwise a package matches if
    /// it is `noarch` or its arch is a prefix of the requested one.
    pub fn search_file(
        &self,
        pattern: &str,
        arch: &str,
        repos: &[&str],
    ) -> Result<Vec<SearchResult>> {
        if repos.is_empty() {
            return Ok(Vec::new());
        }

        let mut sql = format!("SELECT {RESULT_COLUMNS} WHERE f.file GLOB ?1");
        let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(pattern.to_string())];
        push_url_filter(&mut sql, &mut params, repos);
        push_arch_filter(&mut sql, &mut params, arch);

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let params_ref: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let results = stmt
            .query_map(params_ref.as_slice(), map_search_result)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(results)
    }

    /// List all files of the packages named by `terms`.
    ///
    /// A term may be `name`, `name-version` or `name-version-release`; the
    /// dashes are ambiguous, so candidate splits are tried from the least
    /// specific to the most specific and the first one that matches any
    /// package wins. Terms that match nothing are logged and skipped.
    pub fn list_package(
        &self,
        arch: &str,
        terms: &[String],
        repos: &[&str],
    ) -> Result<Vec<SearchResult>> {
        if repos.is_empty() {
            return Ok(Vec::new());
        }

        let mut package_ids: Vec<i64> = Vec::new();
        for term in terms {
            let mut found = Vec::new();
            for (name, version, release) in term_candidates(term) {
                found = self.match_packages(&name, version.as_deref(), release.as_deref(), arch, repos)?;
                if !found.is_empty() {
                    break;
                }
            }
            if found.is_empty() {
                warn!(package = %term, "package not found");
                continue;
            }
            package_ids.extend(found);
        }
        if package_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut sql = format!("SELECT {RESULT_COLUMNS} WHERE p.id IN (");
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();
        for (n, id) in package_ids.iter().enumerate() {
            if n > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&format!("?{}", n + 1));
            params.push(Box::new(*id));
        }
        sql.push(')');

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let params_ref: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let results = stmt
            .query_map(params_ref.as_slice(), map_search_result)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(results)
    }

    /// Surrogate ids of the packages matching one candidate split.
    fn match_packages(
        &self,
        name: &str,
        version: Option<&str>,
        release: Option<&str>,
        arch: &str,
        repos: &[&str],
    ) -> Result<Vec<i64>> {
        let mut sql = String::from(
            "SELECT p.id FROM packages p
             JOIN repositories r ON p.repository = r.id
             WHERE p.name = ?1",
        );
        let mut params: Vec<Box<dyn ToSql>> = vec![Box::new(name.to_string())];
        if let Some(version) = version {
            params.push(Box::new(version.to_string()));
            sql.push_str(&format!(" AND p.version = ?{}", params.len()));
        }
        if let Some(release) = release {
            params.push(Box::new(release.to_string()));
            sql.push_str(&format!(" AND p.release = ?{}", params.len()));
        }
        push_url_filter(&mut sql, &mut params, repos);
        push_arch_filter(&mut sql, &mut params, arch);

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let params_ref: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();
        let ids = stmt
            .query_map(params_ref.as_slice(), |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(ids)
    }
}

fn map_search_result(row: &Row) -> rusqlite::Result<SearchResult> {
    Ok(SearchResult {
        repository: row.get(0)?,
        package: row.get(1)?,
        arch: row.get(2)?,
        epoch: row.get(3)?,
        version: row.get(4)?,
        release: row.get(5)?,
        path: row.get(6)?,
    })
}

fn push_url_filter(sql: &mut String, params: &mut Vec<Box<dyn ToSql>>, repos: &[&str]) {
    sql.push_str(" AND r.url IN (");
    for (n, url) in repos.iter().enumerate() {
        if n > 0 {
            sql.push_str(", ");
        }
        params.push(Box::new(url.to_string()));
        sql.push_str(&format!("?{}", params.len()));
    }
    sql.push(')');
}

fn push_arch_filter(sql: &mut String, params: &mut Vec<Box<dyn ToSql>>, arch: &str) {
    if arch.is_empty() {
        return;
    }
    params.push(Box::new(arch.to_string()));
    sql.push_str(&format!(
        " AND (p.arch = 'noarch' OR ?{} LIKE p.arch || '%')",
        params.len()
    ));
}

/// Candidate `(name, version, release)` splits of a package term, taken from
/// the rightmost dashes, least specific first. A single trailing dash is
/// stripped beforehand.
fn term_candidates(term: &str) -> Vec<(String, Option<String>, Option<String>)> {
    let term = term.strip_suffix('-').unwrap_or(term);
    let mut candidates = vec![(term.to_string(), None, None)];
    if let Some((name, version)) = term.rsplit_once('-') {
        candidates.push((name.to_string(), Some(version.to_string()), None));
        if let Some((name, earlier)) = name.rsplit_once('-') {
            candidates.push((
                name.to_string(),
                Some(earlier.to_string()),
                Some(version.to_string()),
            ));
        }
    }
    candidates
}
