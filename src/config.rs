// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout for the configuration file that clonetools uses to
//! simplify the process of serialization and deserialization. File I/O is left
//! to the [`store`](crate::store) module.

use crate::path::default_base_dir;

use serde::{Deserialize, Serialize};
use std::{
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    path::PathBuf,
    str::FromStr,
};

/// Configuration layout.
///
/// # General Layout
///
/// The configuration is composed of two parts: defaults and buttons. The
/// defaults pick where acquired repositories land and which editor opens
/// them. The buttons are the repository descriptors the user configured for
/// one-shot acquisition.
///
/// Any field missing from the file is filled with its default value, so an
/// empty file is a valid configuration.
#[derive(Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Default base directory for acquired repositories.
    pub base_dir: PathBuf,

    /// Editor to open acquired repositories with.
    pub editor: EditorId,

    /// Configured repository buttons.
    pub buttons: Vec<RepositoryDescriptor>,
}

impl Config {
    /// Find configured button by its identifier.
    pub fn button(&self, id: impl AsRef<str>) -> Option<&RepositoryDescriptor> {
        self.buttons.iter().find(|button| button.id == id.as_ref())
    }

    /// Apply partial update on top of current configuration.
    pub fn merge(&mut self, patch: ConfigPatch) {
        if let Some(base_dir) = patch.base_dir {
            self.base_dir = base_dir;
        }

        if let Some(editor) = patch.editor {
            self.editor = editor;
        }

        if let Some(buttons) = patch.buttons {
            self.buttons = buttons;
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir().unwrap_or_else(|_| PathBuf::from("Downloads")),
            editor: EditorId::default(),
            buttons: default_buttons(),
        }
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut config: Config = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Blank base directory means default base directory.
        if config.base_dir.as_os_str().is_empty() {
            config.base_dir = Config::default().base_dir;
        }

        // INVARIANT: Perform shell expansion on base directory field.
        config.base_dir = PathBuf::from(
            shellexpand::full(config.base_dir.to_string_lossy().as_ref())
                .map_err(ConfigError::ShellExpansion)?
                .into_owned(),
        );

        Ok(config)
    }
}

impl Display for Config {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

/// Partial configuration update.
///
/// Fields left as `None` keep their current value.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct ConfigPatch {
    pub base_dir: Option<PathBuf>,
    pub editor: Option<EditorId>,
    pub buttons: Option<Vec<RepositoryDescriptor>>,
}

/// Repository descriptor.
///
/// Describes one repository the user wants to acquire. A descriptor whose
/// URL is blank is __unconfigured__, and cannot be acted upon. Descriptors
/// are never mutated by the acquisition pipeline.
#[derive(Debug, Default, PartialEq, Eq, Clone, Deserialize, Serialize)]
pub struct RepositoryDescriptor {
    /// Identifier unique within the current button set or batch.
    pub id: String,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Source URL: HTTPS remote, SSH remote, or direct zip URL.
    #[serde(default)]
    pub repo_url: String,

    /// Override for destination folder name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_name: Option<String>,

    /// Clone through the SSH form of a GitHub HTTPS URL.
    #[serde(default)]
    pub use_ssh: bool,
}

impl RepositoryDescriptor {
    /// Construct new descriptor for an ad-hoc URL.
    ///
    /// The URL doubles as identifier.
    pub fn from_url(url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            id: url.clone(),
            repo_url: url,
            ..Default::default()
        }
    }

    /// Label if present, identifier otherwise.
    pub fn display_name(&self) -> &str {
        match self.label.as_deref().map(str::trim) {
            Some(label) if !label.is_empty() => label,
            _ => self.id.as_str(),
        }
    }

    /// Folder name override if present and not blank.
    pub fn folder_name(&self) -> Option<&str> {
        self.folder_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Check if descriptor has a usable URL.
    pub fn is_configured(&self) -> bool {
        !self.repo_url.trim().is_empty()
    }
}

/// Editor that acquired repositories are opened with.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum EditorId {
    #[default]
    VsCode,
    Cursor,
    Windsurf,
    Antigravity,
}

impl EditorId {
    /// Identifier as written in the configuration file.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VsCode => "vscode",
            Self::Cursor => "cursor",
            Self::Windsurf => "windsurf",
            Self::Antigravity => "antigravity",
        }
    }

    /// Executable that launches the editor.
    pub fn command(&self) -> &'static str {
        match self {
            Self::VsCode => "code",
            Self::Cursor => "cursor",
            Self::Windsurf => "windsurf",
            Self::Antigravity => "antigravity",
        }
    }
}

impl FromStr for EditorId {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        match data.trim().to_ascii_lowercase().as_str() {
            "vscode" => Ok(Self::VsCode),
            "cursor" => Ok(Self::Cursor),
            "windsurf" => Ok(Self::Windsurf),
            "antigravity" => Ok(Self::Antigravity),
            _ => Err(ConfigError::UnknownEditor(data.to_string())),
        }
    }
}

// INVARIANT: Unknown editor identifiers in a configuration file fall back to VS Code.
impl From<String> for EditorId {
    fn from(data: String) -> Self {
        data.parse().unwrap_or_default()
    }
}

impl From<EditorId> for String {
    fn from(editor: EditorId) -> Self {
        editor.as_str().into()
    }
}

impl Display for EditorId {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(self.as_str())
    }
}

fn default_buttons() -> Vec<RepositoryDescriptor> {
    let mut buttons = vec![
        RepositoryDescriptor {
            id: "A".into(),
            label: Some("Nuxt Starter".into()),
            repo_url: "https://github.com/adydetra/nuxt-starter.git".into(),
            folder_name: Some("nuxt-starter".into()),
            use_ssh: false,
        },
        RepositoryDescriptor {
            id: "B".into(),
            label: Some("React Starter".into()),
            repo_url: "https://github.com/adydetra/react-starter.git".into(),
            folder_name: Some("react-starter".into()),
            use_ssh: false,
        },
    ];

    buttons.extend(["C", "D", "E"].into_iter().map(|id| RepositoryDescriptor {
        id: id.into(),
        label: Some(format!("Button {id}")),
        ..Default::default()
    }));

    buttons
}

/// Configuration error types.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// Editor identifier is not one clonetools knows how to launch.
    #[error("unknown editor {0:?}, expected one of vscode, cursor, windsurf, antigravity")]
    UnknownEditor(String),
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}
