//! The file-list command: list the files a package provides.

use filesearch_core::{
    database::{Database, SearchResult},
    zypper::Repository,
    Error, Result,
};

use crate::search::repo_urls;

/// List the files of one or more packages, with the same arch and
/// enablement fallback ladder as the search command.
pub fn run(
    db: &Database,
    repos: &[Repository],
    terms: &[String],
    arch: &str,
) -> Result<Vec<SearchResult>> {
    if terms.is_empty() {
        return Err(Error::Custom("usage: zypper file-list [package...]".into()));
    }

    for arch in [arch, ""] {
        for enabled in [true, false] {
            let urls = repo_urls(repos, enabled);
            let results = db.list_package(arch, terms, &urls)?;
            if !results.is_empty() {
                return Ok(results);
            }
        }
    }
    Ok(Vec::new())
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use filesearch_core::database::{Database, MetadataRow};
    use filesearch_core::zypper::Repository;

    use super::run;

    fn repo(url: &str, enabled: bool) -> Repository {
        Repository {
            alias: "test".into(),
            name: "test".into(),
            repo_type: "rpm-md".into(),
            enabled,
            url: url.into(),
        }
    }

    #[test]
    fn requires_at_least_one_term() {
        let db = Database::open_in_memory().unwrap();
        assert!(run(&db, &[], &[], "x86_64").is_err());
    }

    #[test]
    fn lists_files_for_versioned_terms() {
        let db = Database::open_in_memory().unwrap();
        let enabled = repo("http://enabled.test", true);
        let rows = vec![
            Ok(MetadataRow::Package {
                pkgid: "pkgid-1".into(),
                name: "foo-1.2".into(),
                arch: "x86_64".into(),
                epoch: "0".into(),
                version: "3".into(),
                release: "1".into(),
            }),
            Ok(MetadataRow::File {
                pkgid: "pkgid-1".into(),
                path: "/usr/bin/foo".into(),
            }),
            Ok(MetadataRow::File {
                pkgid: "pkgid-1".into(),
                path: "/usr/share/doc/foo".into(),
            }),
        ];
        let ts = DateTime::from_timestamp(1000, 0).unwrap();
        db.update_repository(&enabled, ts, ts, rows).unwrap();

        // `foo-1.2-3` resolves through the name/version split.
        let repos = [enabled];
        let results = run(&db, &repos, &["foo-1.2-3".to_string()], "x86_64").unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.package == "foo-1.2"));
    }
}
