// Vaultfill platform abstraction
// Resolves where settings and extension-local storage live on each OS.
//
// `VAULTFILL_CONFIG_DIR` and `VAULTFILL_DATA_DIR` override the platform defaults.

use std::env;
use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Returns the configuration directory holding `settings.json`.
///
/// - **Linux**: `~/.config/vaultfill` (or `$XDG_CONFIG_HOME/vaultfill`)
/// - **macOS**: `~/Library/Application Support/Vaultfill`
/// - **Windows**: `%APPDATA%/Vaultfill`
pub fn get_config_dir() -> PathBuf {
    if let Ok(dir) = env::var("VAULTFILL_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    #[cfg(target_os = "linux")]
    {
        linux::get_config_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_config_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_config_dir()
    }
}

/// Returns the data directory holding extension-local storage.
///
/// - **Linux**: `~/.local/share/vaultfill` (or `$XDG_DATA_HOME/vaultfill`)
/// - **macOS**: `~/Library/Application Support/Vaultfill/Storage`
/// - **Windows**: `%LOCALAPPDATA%/Vaultfill`
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = env::var("VAULTFILL_DATA_DIR") {
        return PathBuf::from(dir);
    }
    #[cfg(target_os = "linux")]
    {
        linux::get_data_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_data_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_data_dir()
    }
}
