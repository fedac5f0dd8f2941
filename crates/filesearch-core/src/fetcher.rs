//! HTTP retrieval of repository metadata documents.

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::{error::Error, Result};

/// Retrieves a metadata document assembled from URL parts.
///
/// `repo` and `kind` only label diagnostics; the URL is the joined `parts`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, repo: &str, kind: &str, parts: &[&str]) -> Result<Vec<u8>>;
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, repo: &str, kind: &str, parts: &[&str]) -> Result<Vec<u8>> {
        let url = join_url(kind, parts)?;
        debug!(kind, url = %url, "fetching file");

        let request = self
            .client
            .get(url)
            .build()
            .map_err(|source| Error::RequestConstruction {
                kind: kind.to_string(),
                source,
            })?;
        let response =
            self.client
                .execute(request)
                .await
                .map_err(|source| Error::Transport {
                    kind: kind.to_string(),
                    repo: repo.to_string(),
                    source,
                })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::BadStatus {
                kind: kind.to_string(),
                repo: repo.to_string(),
                status: status.as_u16(),
            });
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| Error::Transport {
                kind: kind.to_string(),
                repo: repo.to_string(),
                source,
            })?;
            body.extend_from_slice(&chunk);
        }
        if body.is_empty() {
            return Err(Error::EmptyBody {
                kind: kind.to_string(),
                repo: repo.to_string(),
            });
        }
        Ok(body)
    }
}

/// Join URL parts with single slashes; the first part carries the scheme and
/// host, later parts may themselves contain path segments.
fn join_url(kind: &str, parts: &[&str]) -> Result<Url> {
    let mut joined = String::new();
    for part in parts {
        if joined.is_empty() {
            joined.push_str(part.trim_end_matches('/'));
        } else {
            joined.push('/');
            joined.push_str(part.trim_matches('/'));
        }
    }
    Url::parse(&joined).map_err(|err| Error::UrlConstruction {
        kind: kind.to_string(),
        reason: err.to_string(),
    })
}
