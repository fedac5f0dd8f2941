use clap::Parser;

/// Both commands share one flag set; the command itself is selected by the
/// name the binary was invoked as.
#[derive(Debug, Default, Parser)]
#[command(version, about)]
pub struct Args {
    /// Enable debug logging
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub verbose: Option<bool>,

    /// Set the value of `zypper --releasever`
    #[arg(long, value_name = "VER")]
    pub releasever: Option<String>,

    /// Enable JSON output
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub json: Option<bool>,

    /// Enable XML output
    #[arg(long = "xmlout", num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub xmlout: Option<bool>,

    /// Use only enabled repositories
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub enabled: Option<bool>,

    /// Glob pattern (file-search) or package terms (file-list)
    #[arg(value_name = "PATTERN")]
    pub terms: Vec<String>,
}
