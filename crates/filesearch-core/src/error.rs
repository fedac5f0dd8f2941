use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to run zypper: {0}")]
    ZypperCommand(String),

    #[error("failed to parse zypper output: {0}")]
    ZypperOutput(String),

    #[error("failed to resolve {kind} URL: {reason}")]
    UrlConstruction { kind: String, reason: String },

    #[error("failed to construct HTTP request for {kind}: {source}")]
    RequestConstruction {
        kind: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to fetch {kind} from {repo}: {source}")]
    Transport {
        kind: String,
        repo: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to fetch {kind} from {repo}: status code {status}")]
    BadStatus {
        kind: String,
        repo: String,
        status: u16,
    },

    #[error("failed to fetch {kind} from {repo}: no body")]
    EmptyBody { kind: String, repo: String },

    #[error("failed to parse repomd.xml from {repo}: {reason}")]
    MalformedRepoMd { repo: String, reason: String },

    #[error("repository {0} does not have file lists")]
    MissingFileList(String),

    #[error("failed to parse filelists.xml from {repo}: {reason}")]
    MalformedFileList { repo: String, reason: String },

    #[error("failed to decompress filelists.xml: {0}")]
    Decompression(#[source] std::io::Error),

    #[error("failed to determine cache file path: {0}")]
    CachePath(String),

    #[error("SQLite database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("background task failed: {0}")]
    Task(String),

    #[error("thread lock poison error")]
    Poison,

    #[error("no results found")]
    NoResults,

    #[error("{0}")]
    Custom(String),
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        Self::Poison
    }
}
