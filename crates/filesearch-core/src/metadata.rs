//! Decoding of rpm-md metadata documents: the `repomd.xml` index and the
//! `filelists.xml` payload, with transparent gzip/zstd decompression.

use std::{
    io::{BufReader, Read},
    path::Path,
};

use flate2::read::GzDecoder;
use serde::Deserialize;
use sha2::{Digest, Sha512};

use crate::{error::Error, Result};

/// The `repomd.xml` repository index.
#[derive(Debug, Deserialize)]
pub struct RepoMd {
    #[serde(rename = "data", default)]
    pub data: Vec<RepoMdData>,
}

/// One payload entry in the index (`primary`, `filelists`, ...).
#[derive(Debug, Deserialize)]
pub struct RepoMdData {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub checksum: Option<Checksum>,

    #[serde(default)]
    pub location: Location,

    #[serde(default)]
    timestamp: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
pub struct Checksum {
    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(rename = "$value", default)]
    pub value: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub href: String,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    #[serde(rename = "$value", default)]
    value: String,
}

impl RepoMd {
    pub fn parse(xml: &[u8]) -> std::result::Result<Self, serde_xml_rs::Error> {
        serde_xml_rs::from_reader(xml)
    }

    /// The `filelists` payload entry, if the repository publishes one.
    pub fn filelists(&self) -> Option<&RepoMdData> {
        self.data.iter().find(|data| data.kind == "filelists")
    }
}

impl RepoMdData {
    /// Payload timestamp in whole seconds. Usually an integer, but some
    /// repositories publish fractional timestamps.
    pub fn timestamp_secs(&self) -> Option<i64> {
        let value = self.timestamp.as_ref()?.value.trim();
        value
            .parse::<i64>()
            .ok()
            .or_else(|| value.parse::<f64>().ok().map(|secs| secs as i64))
    }
}

/// The `filelists.xml` payload.
#[derive(Debug, Deserialize)]
pub struct FileLists {
    #[serde(rename = "package", default)]
    pub packages: Vec<PackageEntry>,
}

#[derive(Debug, Deserialize)]
pub struct PackageEntry {
    #[serde(default)]
    pub pkgid: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub arch: String,

    #[serde(default)]
    pub version: VersionEntry,

    #[serde(rename = "file", default)]
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VersionEntry {
    #[serde(default)]
    pub epoch: String,

    #[serde(default)]
    pub ver: String,

    #[serde(default)]
    pub rel: String,
}

#[derive(Debug, Deserialize)]
pub struct FileEntry {
    /// `dir` and `ghost` entries carry a type attribute; plain files none.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,

    #[serde(rename = "$value", default)]
    pub path: String,
}

impl FileEntry {
    /// Directories and relative paths are never cached.
    pub fn is_kept(&self) -> bool {
        self.kind.as_deref() != Some("dir") && self.path.starts_with('/')
    }
}

impl FileLists {
    pub fn parse<R: Read>(reader: R) -> std::result::Result<Self, serde_xml_rs::Error> {
        serde_xml_rs::from_reader(BufReader::new(reader))
    }
}

/// Wrap `reader` in a decoder chosen by the file name extension of `href`;
/// unknown extensions pass through unchanged.
pub fn decompress<'a, R: Read + 'a>(href: &str, reader: R) -> Result<Box<dyn Read + 'a>> {
    match Path::new(href).extension().and_then(|ext| ext.to_str()) {
        Some("gz") => Ok(Box::new(GzDecoder::new(reader))),
        Some("zst") => Ok(Box::new(
            zstd::stream::read::Decoder::new(reader).map_err(Error::Decompression)?,
        )),
        _ => Ok(Box::new(reader)),
    }
}

/// Lowercase hex SHA-512 digest, the encoding repomd checksums use.
pub fn sha512_hex(data: &[u8]) -> String {
    hex::encode(Sha512::digest(data))
}
