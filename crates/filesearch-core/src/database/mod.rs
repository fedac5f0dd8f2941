mod connection;
mod models;
mod query;

pub use connection::Database;
pub use models::{MetadataRow, SearchResult};
