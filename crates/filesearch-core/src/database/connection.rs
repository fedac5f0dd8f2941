use std::{
    fs,
    path::Path,
    sync::{Arc, Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use tracing::debug;

use crate::{error::Error, utils::xdg_cache_home, zypper::Repository, Result};

use super::models::MetadataRow;

const APPLICATION_ID: i32 = 0x1166_8798;
const USER_VERSION: i32 = 2;

const CACHE_FILE: &str = "zypper-filesearch.db";

/// Schema, applied wholesale whenever the user version does not match. The
/// cache holds no authoritative data, so migrations drop and recreate.
const SCHEMA: &[&str] = &[
    "DROP TABLE IF EXISTS files",
    "DROP TABLE IF EXISTS packages",
    "DROP TABLE IF EXISTS repositories",
    "CREATE TABLE repositories (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        alias TEXT,
        name TEXT,
        url TEXT UNIQUE ON CONFLICT ABORT,
        type TEXT,
        enabled BOOLEAN,
        last_checked DATE,
        last_modified DATE
    )",
    "CREATE TABLE packages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        repository INTEGER REFERENCES repositories(id) ON DELETE CASCADE,
        pkgid TEXT UNIQUE,
        name TEXT,
        arch TEXT,
        epoch TEXT,
        version TEXT,
        release TEXT,
        UNIQUE(repository, name, arch, epoch, version, release)
    )",
    "CREATE TABLE files (
        pkgid INTEGER REFERENCES packages(id) ON DELETE CASCADE,
        file TEXT,
        PRIMARY KEY (pkgid, file)
    )",
];

/// The file-list cache. A single connection shared behind a mutex; all
/// writers queue on it, which keeps repository replacement transactions
/// serialized.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open the cache under the user's cache directory, creating or
    /// re-creating the schema as needed.
    pub fn open() -> Result<Self> {
        Self::open_at(xdg_cache_home().join(CACHE_FILE))
    }

    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                Error::CachePath(format!("{}: {}", parent.display(), err))
            })?;
        }
        Self::from_connection(Connection::open(path)?)
    }

    /// Empty in-memory cache for tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        initialize(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub(super) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        Ok(self.conn.lock()?)
    }

    /// When the repository at `url` was last checked and last modified, if it
    /// has ever been refreshed.
    pub fn timestamps(&self, url: &str) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT last_checked, last_modified FROM repositories WHERE url = ?1")?;
        let mut rows = stmt.query(params![url])?;
        match rows.next()? {
            Some(row) => Ok(Some((row.get(0)?, row.get(1)?))),
            None => Ok(None),
        }
    }

    /// Replace the cached contents of `repo` in a single transaction.
    ///
    /// The REPLACE on `repositories` deletes any previous row for this URL
    /// and, because `recursive_triggers` is enabled, the delete cascades away
    /// all of its packages and files before the new rows are inserted.
    /// Readers see the old row set until the commit.
    ///
    /// `rows` is consumed inside the transaction; its first error rolls
    /// everything back.
    pub fn update_repository<I>(
        &self,
        repo: &Repository,
        last_checked: DateTime<Utc>,
        last_modified: DateTime<Utc>,
        rows: I,
    ) -> Result<()>
    where
        I: IntoIterator<Item = Result<MetadataRow>>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            tx.execute(
                "INSERT OR REPLACE INTO repositories
                 (alias, name, url, type, enabled, last_checked, last_modified)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    repo.alias,
                    repo.name,
                    repo.url,
                    repo.repo_type,
                    repo.enabled,
                    last_checked,
                    last_modified
                ],
            )?;
            let repository_id = tx.last_insert_rowid();

            let mut insert_package = tx.prepare(
                "INSERT OR REPLACE INTO packages
                 (repository, pkgid, name, arch, epoch, version, release)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            let mut insert_file = tx.prepare(
                "INSERT OR REPLACE INTO files (pkgid, file)
                 VALUES ((SELECT id FROM packages WHERE pkgid = ?1), ?2)",
            )?;

            for row in rows {
                match row? {
                    MetadataRow::Package {
                        pkgid,
                        name,
                        arch,
                        epoch,
                        version,
                        release,
                    } => {
                        insert_package.execute(params![
                            repository_id,
                            pkgid,
                            name,
                            arch,
                            epoch,
                            version,
                            release
                        ])?;
                    }
                    MetadataRow::File { pkgid, path } => {
                        insert_file.execute(params![pkgid, path])?;
                    }
                }
            }
        }
        tx.commit()?;
        debug!(repository = %repo.name, "repository cache updated");
        Ok(())
    }
}

fn initialize(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "application_id", APPLICATION_ID)?;
    conn.pragma_update(None, "auto_vacuum", 1)?;
    conn.pragma_update(None, "encoding", "UTF-8")?;
    conn.pragma_update(None, "foreign_keys", 1)?;
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |_row| Ok(()))?;
    conn.pragma_update(None, "recursive_triggers", 1)?;

    let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version == USER_VERSION {
        return Ok(());
    }

    debug!(
        found = version,
        expected = USER_VERSION,
        "schema version mismatch, rebuilding cache"
    );
    for stmt in SCHEMA {
        conn.execute_batch(stmt)?;
    }
    conn.pragma_update(None, "user_version", USER_VERSION)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use rusqlite::Connection;

    use super::{Database, USER_VERSION};
    use crate::database::test_support::{file_row, package_row, test_repo};

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn timestamps_roundtrip() {
        let db = Database::open_in_memory().unwrap();
        let repo = test_repo("http://fake-host.test");

        assert!(db.timestamps(&repo.url).unwrap().is_none());

        let checked = ts(1231469665);
        let modified = ts(1231006505);
        db.update_repository(&repo, checked, modified, std::iter::empty())
            .unwrap();

        let (actual_checked, actual_modified) = db.timestamps(&repo.url).unwrap().unwrap();
        assert_eq!(actual_checked, checked);
        assert_eq!(actual_modified, modified);
    }

    #[test]
    fn replacement_cascades_old_rows() {
        let db = Database::open_in_memory().unwrap();
        let repo = test_repo("http://fake-host.test");

        let mut rows = vec![Ok(package_row("pkg-1", "many-files", "x86_64"))];
        rows.extend((0..100).map(|n| Ok(file_row("pkg-1", &format!("/usr/share/doc/f{n}")))));
        db.update_repository(&repo, ts(1000), ts(1000), rows)
            .unwrap();
        assert_eq!(db.search_file("*", "", &[repo.url.as_str()]).unwrap().len(), 100);

        let rows = vec![
            Ok(package_row("pkg-2", "one-file", "x86_64")),
            Ok(file_row("pkg-2", "/usr/bin/one")),
        ];
        db.update_repository(&repo, ts(2000), ts(2000), rows)
            .unwrap();

        let results = db.search_file("*", "", &[repo.url.as_str()]).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].path, "/usr/bin/one");
    }

    #[test]
    fn failing_row_iterator_rolls_back() {
        let db = Database::open_in_memory().unwrap();
        let repo = test_repo("http://fake-host.test");

        let rows = vec![
            Ok(package_row("pkg-1", "pkg", "x86_64")),
            Ok(file_row("pkg-1", "/usr/bin/pkg")),
        ];
        db.update_repository(&repo, ts(1000), ts(1000), rows)
            .unwrap();

        let rows = vec![
            Ok(package_row("pkg-2", "other", "x86_64")),
            Err(crate::Error::Custom("stream died".into())),
        ];
        assert!(db
            .update_repository(&repo, ts(2000), ts(2000), rows)
            .is_err());

        // The old row set survives intact.
        let results = db.search_file("*", "", &[repo.url.as_str()]).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].path, "/usr/bin/pkg");
        let (checked, _) = db.timestamps(&repo.url).unwrap().unwrap();
        assert_eq!(checked, ts(1000));
    }

    #[test]
    fn version_mismatch_rebuilds_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zypper-filesearch.db");

        let db = Database::open_at(&path).unwrap();
        let repo = test_repo("http://fake-host.test");
        let rows = vec![
            Ok(package_row("pkg-1", "pkg", "x86_64")),
            Ok(file_row("pkg-1", "/usr/bin/pkg")),
        ];
        db.update_repository(&repo, ts(1000), ts(1000), rows)
            .unwrap();
        drop(db);

        let conn = Connection::open(&path).unwrap();
        conn.pragma_update(None, "user_version", USER_VERSION + 1)
            .unwrap();
        drop(conn);

        let db = Database::open_at(&path).unwrap();
        assert!(db.search_file("*", "", &["http://fake-host.test"]).unwrap().is_empty());
        assert!(db.timestamps("http://fake-host.test").unwrap().is_none());

        // All three tables exist again.
        let conn = Connection::open(&path).unwrap();
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('repositories', 'packages', 'files')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 3);
    }

    #[test]
    fn persisted_rows_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zypper-filesearch.db");

        let db = Database::open_at(&path).unwrap();
        let repo = test_repo("http://fake-host.test");
        let rows = vec![
            Ok(package_row("pkg-1", "pkg", "avr32")),
            Ok(file_row("pkg-1", "/some/path")),
        ];
        db.update_repository(&repo, ts(1231469665), ts(1231006505), rows)
            .unwrap();
        drop(db);

        let db = Database::open_at(&path).unwrap();
        let results = db.search_file("/some/path", "", &[repo.url.as_str()]).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].package, "pkg");
        assert_eq!(results[0].arch, "avr32");
    }
}
