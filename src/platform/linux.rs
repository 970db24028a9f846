// Vaultfill platform paths for Linux
// Config: ~/.config/vaultfill
// Data:   ~/.local/share/vaultfill

use std::env;
use std::path::PathBuf;

fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}

/// Uses `$XDG_CONFIG_HOME/vaultfill` if set, otherwise `~/.config/vaultfill`.
pub fn get_config_dir() -> PathBuf {
    match env::var("XDG_CONFIG_HOME") {
        Ok(xdg) => PathBuf::from(xdg).join("vaultfill"),
        Err(_) => home_dir().join(".config").join("vaultfill"),
    }
}

/// Uses `$XDG_DATA_HOME/vaultfill` if set, otherwise `~/.local/share/vaultfill`.
pub fn get_data_dir() -> PathBuf {
    match env::var("XDG_DATA_HOME") {
        Ok(xdg) => PathBuf::from(xdg).join("vaultfill"),
        Err(_) => home_dir().join(".local").join("share").join("vaultfill"),
    }
}
