// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration store management.
//!
//! The acquisition pipeline never reads or writes the configuration file on
//! its own. Callers hand it values obtained through a [`ConfigStore`], which
//! offers typed `get` and partial `set` operations over the
//! [`Config`](crate::config::Config) layout.
//!
//! # Store Layout
//!
//! The file-backed store keeps a single TOML file, by default at
//! `$XDG_CONFIG_HOME/clone-tools/config.toml`. A missing file is created with
//! default contents on first read. A file that cannot be read or parsed is
//! reported through the log, and default contents are used in its place.

use crate::config::{Config, ConfigError, ConfigPatch};

use std::{
    fs::{read_to_string, write},
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::{debug, info, instrument, warn};

/// Typed access to application configuration.
pub trait ConfigStore: Send + Sync {
    /// Obtain current configuration.
    fn get(&self) -> Result<Config>;

    /// Merge partial update into current configuration, and persist it.
    ///
    /// Returns the merged configuration.
    fn set(&self, patch: ConfigPatch) -> Result<Config>;
}

/// Configuration store backed by a TOML file.
#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    /// Construct new file-backed store.
    ///
    /// Does not touch the file system until first access.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path to configuration file.
    pub fn path(&self) -> &Path {
        self.path.as_path()
    }

    fn persist(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            mkdirp::mkdirp(parent).map_err(|err| StoreError::CreateDir {
                source: err,
                path: parent.to_path_buf(),
            })?;
        }

        write(&self.path, config.to_string()).map_err(|err| StoreError::Write {
            source: err,
            path: self.path.clone(),
        })?;
        info!("configuration saved to {:?}", self.path.display());

        Ok(())
    }
}

impl ConfigStore for FileConfigStore {
    #[instrument(skip(self), level = "debug")]
    fn get(&self) -> Result<Config> {
        if !self.path.exists() {
            let config = Config::default();
            self.persist(&config)?;
            info!("created new configuration at {:?}", self.path.display());
            return Ok(config);
        }

        let loaded = read_to_string(&self.path)
            .map_err(|err| StoreError::Read {
                source: err,
                path: self.path.clone(),
            })
            .and_then(|data| data.parse::<Config>().map_err(StoreError::from));

        match loaded {
            Ok(config) => {
                debug!("loaded configuration from {:?}", self.path.display());
                Ok(config)
            }
            Err(error) => {
                warn!("failed to load configuration, using defaults: {error}");
                Ok(Config::default())
            }
        }
    }

    #[instrument(skip(self, patch), level = "debug")]
    fn set(&self, patch: ConfigPatch) -> Result<Config> {
        let mut config = self.get()?;
        config.merge(patch);
        self.persist(&config)?;

        Ok(config)
    }
}

/// Configuration store kept in memory.
///
/// Useful for one-off runs that should not touch the user's configuration.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    config: Mutex<Config>,
}

impl MemoryConfigStore {
    /// Construct new in-memory store holding given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config: Mutex::new(config),
        }
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get(&self) -> Result<Config> {
        self.config
            .lock()
            .map(|config| config.clone())
            .map_err(|_| StoreError::Poisoned)
    }

    fn set(&self, patch: ConfigPatch) -> Result<Config> {
        let mut config = self.config.lock().map_err(|_| StoreError::Poisoned)?;
        config.merge(patch);

        Ok(config.clone())
    }
}

/// All possible error types for configuration store interaction.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Configuration directory cannot be created when missing.
    #[error("failed to create configuration directory at {:?}", path.display())]
    CreateDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Configuration file cannot be read from.
    #[error("failed to read configuration file at {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Configuration file cannot be written to.
    #[error("failed to write configuration file at {:?}", path.display())]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Configuration layout is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Another thread panicked while holding the configuration.
    #[error("configuration lock poisoned")]
    Poisoned,
}

/// Friendly result alias :3
pub type Result<T, E = StoreError> = std::result::Result<T, E>;
