use std::{env, path::PathBuf};

fn home_dir() -> PathBuf {
    env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}

/// `$XDG_CACHE_HOME`, defaulting to `$HOME/.cache`.
pub fn xdg_cache_home() -> PathBuf {
    env::var("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".cache"))
}

/// `$XDG_CONFIG_HOME`, defaulting to `$HOME/.config`.
pub fn xdg_config_home() -> PathBuf {
    env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// `$XDG_CONFIG_DIRS`, defaulting to `/etc/xdg`. Highest priority first.
pub fn xdg_config_dirs() -> Vec<PathBuf> {
    split_dirs(&env::var("XDG_CONFIG_DIRS").unwrap_or_else(|_| "/etc/xdg".into()))
}

/// `$XDG_DATA_DIRS`, defaulting to `/usr/local/share:/usr/share`. Highest
/// priority first.
pub fn xdg_data_dirs() -> Vec<PathBuf> {
    split_dirs(&env::var("XDG_DATA_DIRS").unwrap_or_else(|_| "/usr/local/share:/usr/share".into()))
}

fn split_dirs(value: &str) -> Vec<PathBuf> {
    value
        .split(':')
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .collect()
}
