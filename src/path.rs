// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine platform directories that clonetools needs before it can place
//! anything on disk: where acquired repositories land by default, and where
//! the configuration file lives.

use std::path::PathBuf;

/// Determine absolute path to user's home directory.
///
/// Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(NoWayHome)
}

/// Determine default base directory for acquired repositories.
///
/// Prefers the platform download directory, e.g., `$XDG_DOWNLOAD_DIR` on
/// Linux. Falls back to `$HOME/Downloads` when the platform does not report
/// one. Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn default_base_dir() -> Result<PathBuf> {
    match dirs::download_dir() {
        Some(path) => Ok(path),
        None => home_dir().map(|home| home.join("Downloads")),
    }
}

/// Determine default absolute path to the configuration file.
///
/// Uses `$XDG_CONFIG_HOME/clone-tools/config.toml` on Linux, and the
/// platform equivalent elsewhere.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn default_config_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|path| path.join("clone-tools").join("config.toml"))
        .ok_or(NoWayHome)
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's home directory")]
pub struct NoWayHome;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
