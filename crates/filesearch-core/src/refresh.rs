//! Keeps the cache in sync with the remote repositories.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::{
    database::{Database, MetadataRow},
    error::Error,
    fetcher::Fetcher,
    metadata::{self, FileLists, RepoMd},
    zypper::Repository,
    Result,
};

/// Bring the cache up to date, one task per repository.
///
/// Repositories that cannot be refreshed (non-HTTP URL, unknown type, fetch
/// failure while disabled) are skipped with a warning. The first hard
/// failure aborts the remaining tasks and becomes the result.
pub async fn refresh<F>(db: &Database, fetcher: &Arc<F>, repos: &[Repository]) -> Result<()>
where
    F: Fetcher + ?Sized + 'static,
{
    let mut tasks = JoinSet::new();
    for repo in repos {
        let db = db.clone();
        let fetcher = Arc::clone(fetcher);
        let repo = repo.clone();
        tasks.spawn(async move {
            if !repo.url.starts_with("http://") && !repo.url.starts_with("https://") {
                warn!(repository = %repo.name, url = %repo.url, "skipping non-HTTP repository");
                return Ok(());
            }
            update_repository(&db, fetcher.as_ref(), &repo).await
        });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                tasks.abort_all();
                return Err(err);
            }
            Err(err) if err.is_cancelled() => {}
            Err(err) => {
                tasks.abort_all();
                return Err(Error::Task(err.to_string()));
            }
        }
    }
    Ok(())
}

async fn update_repository<F: Fetcher + ?Sized>(
    db: &Database,
    fetcher: &F,
    repo: &Repository,
) -> Result<()> {
    if repo.repo_type != "rpm-md" {
        warn!(repository = %repo.name, r#type = %repo.repo_type,
            "skipping repository of unknown type");
        return Ok(());
    }

    let stamps = db.timestamps(&repo.url)?;
    if let Some((last_checked, _)) = stamps {
        if last_checked + Duration::hours(1) > Utc::now() {
            debug!(repository = %repo.name, %last_checked, "repository does not require update");
            return Ok(());
        }
    }
    let last_modified = stamps.map(|(_, modified)| modified);

    debug!(repository = %repo.name, url = %repo.url, "updating repository");
    let update_start = Utc::now();

    let md_body = match fetcher
        .fetch(&repo.name, "repomd.xml", &[&repo.url, "repodata", "repomd.xml"])
        .await
    {
        Ok(body) => body,
        // Ignore errors from disabled repositories
        Err(_) if !repo.enabled => return Ok(()),
        Err(err) => return Err(err),
    };

    let repomd = RepoMd::parse(&md_body).map_err(|err| Error::MalformedRepoMd {
        repo: repo.name.clone(),
        reason: err.to_string(),
    })?;
    let filelists = repomd
        .filelists()
        .ok_or_else(|| Error::MissingFileList(repo.name.clone()))?;

    let timestamp =
        DateTime::from_timestamp(filelists.timestamp_secs().unwrap_or(0), 0).unwrap_or_default();
    if Some(timestamp) == last_modified {
        debug!(repository = %repo.name, %timestamp, "file list has not changed");
        return Ok(());
    }

    let list_body = match fetcher
        .fetch(
            &repo.name,
            "filelists.xml",
            &[&repo.url, &filelists.location.href],
        )
        .await
    {
        Ok(body) => body,
        Err(_) if !repo.enabled => return Ok(()),
        Err(err) => return Err(err),
    };

    if let Some(checksum) = filelists
        .checksum
        .as_ref()
        .filter(|checksum| checksum.kind == "sha512")
    {
        let actual = metadata::sha512_hex(&list_body);
        if actual != checksum.value {
            warn!(repository = %repo.name, expected = %checksum.value, actual = %actual,
                "file list has incorrect checksum");
        }
    }

    let reader = metadata::decompress(&filelists.location.href, list_body.as_slice())?;
    let lists = FileLists::parse(reader).map_err(|err| Error::MalformedFileList {
        repo: repo.name.clone(),
        reason: err.to_string(),
    })?;

    db.update_repository(repo, update_start, timestamp, rows(lists))?;
    Ok(())
}

/// Flatten the parsed file list into the insertion protocol rows, dropping
/// directory entries and relative paths.
fn rows(lists: FileLists) -> impl Iterator<Item = Result<MetadataRow>> {
    lists.packages.into_iter().flat_map(|pkg| {
        let pkgid = pkg.pkgid;
        let package = MetadataRow::Package {
            pkgid: pkgid.clone(),
            name: pkg.name,
            arch: pkg.arch,
            epoch: pkg.version.epoch,
            version: pkg.version.ver,
            release: pkg.version.rel,
        };
        let files = pkg
            .files
            .into_iter()
            .filter(|file| file.is_kept())
            .map(move |file| {
                Ok(MetadataRow::File {
                    pkgid: pkgid.clone(),
                    path: file.path,
                })
            });
        std::iter::once(Ok(package)).chain(files)
    })
}
