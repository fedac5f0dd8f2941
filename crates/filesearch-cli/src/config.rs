//! Configuration file handling and its merge with command-line flags.

use std::path::PathBuf;

use config::{File, FileFormat};
use filesearch_core::utils::{xdg_config_dirs, xdg_config_home, xdg_data_dirs};
use serde::Deserialize;

use crate::cli::Args;

const CONFIG_FILE: &str = "zypper-filesearch.conf";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
    Xml,
}

/// Effective settings: configuration files overridden by flags the user
/// explicitly passed.
#[derive(Debug, Clone)]
pub struct Settings {
    pub verbose: bool,
    pub release_ver: String,
    pub format: OutputFormat,
    pub enabled: bool,
}

/// The `[filesearch]` section of zypper-filesearch.conf.
#[derive(Debug, Default, Deserialize)]
struct FileSection {
    #[serde(default)]
    verbose: Option<bool>,

    #[serde(default, alias = "releasever", alias = "releaseVer")]
    release_ver: Option<String>,

    #[serde(default)]
    format: Option<String>,

    #[serde(default)]
    enabled: Option<bool>,
}

impl Settings {
    pub fn load(args: &Args) -> Result<Self, config::ConfigError> {
        Self::load_from(&search_paths(), args)
    }

    fn load_from(paths: &[PathBuf], args: &Args) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        for path in paths {
            builder = builder
                .add_source(File::new(&path.to_string_lossy(), FileFormat::Ini).required(false));
        }
        let loaded = builder.build()?;
        let section: FileSection = loaded.get("filesearch").unwrap_or_default();

        let mut settings = Settings {
            verbose: section.verbose.unwrap_or(false),
            release_ver: section.release_ver.unwrap_or_default(),
            format: match section.format.as_deref() {
                Some("json") => OutputFormat::Json,
                Some("xml") => OutputFormat::Xml,
                _ => OutputFormat::Human,
            },
            enabled: section.enabled.unwrap_or(true),
        };

        if let Some(verbose) = args.verbose {
            settings.verbose = verbose;
        }
        if let Some(ref releasever) = args.releasever {
            settings.release_ver = releasever.clone();
        }
        if let Some(json) = args.json {
            settings.format = if json {
                OutputFormat::Json
            } else {
                OutputFormat::Human
            };
        }
        if let Some(xml) = args.xmlout {
            settings.format = if xml {
                OutputFormat::Xml
            } else {
                OutputFormat::Human
            };
        }
        if let Some(enabled) = args.enabled {
            settings.enabled = enabled;
        }
        Ok(settings)
    }
}

/// Configuration file locations, least important first. The XDG lists put
/// the most important directory first, so they are walked backwards.
fn search_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for dir in xdg_data_dirs().iter().rev() {
        paths.push(dir.join("etc").join(CONFIG_FILE));
    }
    for dir in xdg_config_dirs().iter().rev() {
        paths.push(dir.join(CONFIG_FILE));
    }
    paths.push(PathBuf::from("/etc").join(CONFIG_FILE));
    paths.push(xdg_config_home().join(CONFIG_FILE));
    paths
}
