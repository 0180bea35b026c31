// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Repository acquisition.
//!
//! An __acquisition__ materializes a repository's working tree on local disk.
//! Clonetools knows two ways to do that:
//!
//! 1. __Clone via git__: spawn `git clone <url> <target>` and wait for it.
//! 2. __Download and extract zip__: fetch an archive over HTTP, and unpack it
//!    into the base directory.
//!
//! Both strategies map one URL plus a set of [`AcquisitionOptions`] into a
//! terminal [`AcquisitionResult`]: success, duplicate, or error. Neither
//! strategy ever overwrites an existing folder. If the destination already
//! exists, nothing is spawned or downloaded, and the existing location is
//! reported back as a duplicate.
//!
//! # Collaborators
//!
//! The [`Acquirer`] does not talk to the outside world directly. It goes
//! through three ports so that callers and tests can swap them out:
//!
//! - [`GitRunner`] spawns the git binary.
//! - [`ArchiveFetcher`] performs the HTTP GET of an archive.
//! - [`ShellIntegration`] reveals folders and launches editors.
//!
//! # Failure Policy
//!
//! Every failure is converted into [`AcquisitionResult::Error`] at the
//! acquirer boundary. Side effects that happen after the repository is on
//! disk, like removing `.git` or cleaning up a temporary archive, are best
//! effort. Their failures are logged, and never demote a success.

pub mod archive;
pub mod git;
pub mod shell;

pub use archive::{ArchiveFetcher, FetchError, HttpFetcher};
pub use git::{GitRunner, SystemGit};
pub use shell::{Platform, ShellIntegration, SystemShell};

use crate::{
    config::{Config, EditorId},
    remote::{parse_github_repo_and_branch, resolve_target_path},
};

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument, warn};

/// Per-operation acquisition flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionOptions {
    /// Destination root directory.
    pub base_dir: PathBuf,

    /// Remove `.git` after a successful clone. No-op for zip downloads.
    pub delete_git_after_clone: bool,

    /// Destination folder name that wins over the descriptor's own.
    pub custom_folder_name: Option<String>,

    /// Do not reveal the acquired folder in the file manager.
    pub skip_open_folder: bool,

    /// Do not open the acquired folder in the editor.
    pub skip_open_editor: bool,
}

impl AcquisitionOptions {
    /// Construct new options with every flag off.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            delete_git_after_clone: false,
            custom_folder_name: None,
            skip_open_folder: false,
            skip_open_editor: false,
        }
    }

    /// Construct new options rooted at configured base directory.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.base_dir.clone())
    }

    /// Folder name to use given the descriptor's own folder name.
    ///
    /// A non-blank custom folder name takes precedence.
    pub fn folder_name<'a>(&'a self, fallback: Option<&'a str>) -> Option<&'a str> {
        self.custom_folder_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .or(fallback)
    }
}

/// Status of an acquisition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionStatus {
    Success,
    Duplicate,
    Error,
}

impl Display for AcquisitionStatus {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Success => fmt.write_str("success"),
            Self::Duplicate => fmt.write_str("duplicate"),
            Self::Error => fmt.write_str("error"),
        }
    }
}

/// Terminal outcome of one acquisition attempt.
///
/// # Invariant
///
/// - Exactly one status holds per attempt.
/// - Path is present unless the attempt is an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquisitionResult {
    /// Repository was acquired at path.
    Success {
        path: PathBuf,
        message: Option<String>,
    },

    /// Destination already existed at path, so nothing was done.
    Duplicate { path: PathBuf, message: String },

    /// Acquisition failed.
    Error { message: String },
}

impl AcquisitionResult {
    pub fn success(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Success {
            path: path.into(),
            message: Some(message.into()),
        }
    }

    pub fn duplicate(path: impl Into<PathBuf>) -> Self {
        Self::Duplicate {
            path: path.into(),
            message: "folder already exists".into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn status(&self) -> AcquisitionStatus {
        match self {
            Self::Success { .. } => AcquisitionStatus::Success,
            Self::Duplicate { .. } => AcquisitionStatus::Duplicate,
            Self::Error { .. } => AcquisitionStatus::Error,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Success { path, .. } | Self::Duplicate { path, .. } => Some(path.as_path()),
            Self::Error { .. } => None,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Success { message, .. } => message.as_deref(),
            Self::Duplicate { message, .. } | Self::Error { message } => Some(message.as_str()),
        }
    }
}

/// Acquisition backend.
///
/// Holds the collaborators both strategies need, and the editor that
/// acquired repositories are opened with.
#[derive(Debug)]
pub struct Acquirer<G = SystemGit, F = HttpFetcher, S = SystemShell>
where
    G: GitRunner,
    F: ArchiveFetcher,
    S: ShellIntegration,
{
    git: G,
    fetcher: F,
    shell: S,
    editor: EditorId,
    temp_dir: PathBuf,
}

impl Acquirer {
    /// Construct new acquirer backed by the system git, HTTP client, and
    /// platform shell.
    ///
    /// # Errors
    ///
    /// - Return [`FetchError::Client`] if the HTTP client cannot be built.
    pub fn system(editor: EditorId) -> Result<Self, FetchError> {
        Ok(Self::new(
            SystemGit::default(),
            HttpFetcher::new()?,
            SystemShell::current(),
            editor,
        ))
    }
}

impl<G, F, S> Acquirer<G, F, S>
where
    G: GitRunner,
    F: ArchiveFetcher,
    S: ShellIntegration,
{
    /// Construct new acquirer.
    pub fn new(git: G, fetcher: F, shell: S, editor: EditorId) -> Self {
        Self {
            git,
            fetcher,
            shell,
            editor,
            temp_dir: std::env::temp_dir(),
        }
    }

    /// Use a different directory for downloaded archives.
    ///
    /// Defaults to the system temporary directory.
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    /// Editor used for editor-open side effects.
    pub fn editor(&self) -> EditorId {
        self.editor
    }

    /// Reveal path in the file manager.
    pub fn open_folder(&self, path: &Path) {
        self.shell.open_folder(path);
    }

    /// Open path in the configured editor.
    pub fn open_in_editor(&self, path: &Path) {
        self.shell.open_in_editor(path, self.editor);
    }

    /// Open URL in the default browser.
    pub fn open_url(&self, url: &str) {
        self.shell.open_url(url);
    }

    /// Acquire repository by spawning `git clone`.
    ///
    /// The destination is `base_dir` joined with the custom folder name of
    /// the options, else `folder_name`, else a name derived from the URL. The
    /// URL is used as given, so any SSH rewrite must already be applied.
    pub async fn clone_via_git(
        &self,
        url: &str,
        folder_name: Option<&str>,
        options: &AcquisitionOptions,
    ) -> AcquisitionResult {
        match self.try_clone_via_git(url, folder_name, options).await {
            Ok(result) => result,
            Err(error) => {
                warn!("clone of {url} failed: {error}");
                AcquisitionResult::error(error.to_string())
            }
        }
    }

    /// Acquire repository by downloading and extracting a zip archive.
    ///
    /// The URL must already point at an archive. For GitHub branch archives
    /// the extracted `<repo>-<branch>` folder is renamed to the requested
    /// folder name. If that rename fails, the extraction is still reported as
    /// a success at the extracted path.
    pub async fn download_zip(
        &self,
        url: &str,
        folder_name: Option<&str>,
        options: &AcquisitionOptions,
    ) -> AcquisitionResult {
        match self.try_download_zip(url, folder_name, options).await {
            Ok(result) => result,
            Err(error) => {
                warn!("download of {url} failed: {error}");
                AcquisitionResult::error(error.to_string())
            }
        }
    }

    #[instrument(skip(self, options), level = "debug")]
    async fn try_clone_via_git(
        &self,
        url: &str,
        folder_name: Option<&str>,
        options: &AcquisitionOptions,
    ) -> Result<AcquisitionResult> {
        let target = resolve_target_path(&options.base_dir, url, options.folder_name(folder_name));

        // INVARIANT: Never hand git a destination that already exists.
        if exists(&target).await? {
            info!("{:?} already exists, skip clone", target.display());
            return Ok(AcquisitionResult::duplicate(target));
        }

        ensure_dir(&options.base_dir).await?;

        info!("clone {url} into {:?}", target.display());
        let code = self
            .git
            .clone_repo(url, &target)
            .await
            .map_err(AcquireError::Spawn)?;
        if code != 0 {
            return Err(AcquireError::GitExit(code));
        }

        if !options.skip_open_folder {
            self.open_folder(&target);
        }

        if options.delete_git_after_clone {
            remove_git_dir(&target).await;
        }

        if !options.skip_open_editor {
            self.open_in_editor(&target);
        }

        Ok(AcquisitionResult::success(target, "repository cloned"))
    }

    #[instrument(skip(self, options), level = "debug")]
    async fn try_download_zip(
        &self,
        url: &str,
        folder_name: Option<&str>,
        options: &AcquisitionOptions,
    ) -> Result<AcquisitionResult> {
        let base_dir = options.base_dir.as_path();
        ensure_dir(base_dir).await?;

        let folder_name = options.folder_name(folder_name);
        let github = parse_github_repo_and_branch(url);
        let default_extracted_name = match (&github, folder_name) {
            (Some(github), _) => github.archive_folder_name(),
            (None, Some(name)) => name.to_string(),
            (None, None) => "repo".to_string(),
        };
        let target_folder_name = folder_name.unwrap_or(&default_extracted_name);
        let target = base_dir.join(target_folder_name);

        // INVARIANT: Check for duplicates before paying for any network I/O.
        if exists(&target).await? {
            info!("{:?} already exists, skip download", target.display());
            return Ok(AcquisitionResult::duplicate(target));
        }

        info!("download {url}");
        let bytes = self.fetcher.fetch(url).await?;

        let zip_path = archive::temp_archive_path(&self.temp_dir);
        if let Err(error) = tokio::fs::write(&zip_path, &bytes).await {
            remove_temp_archive(&zip_path).await;
            return Err(AcquireError::WriteArchive {
                source: error,
                path: zip_path,
            });
        }

        debug!("extract {:?} into {:?}", zip_path.display(), base_dir.display());
        let extracted = {
            let zip_path = zip_path.clone();
            let base_dir = base_dir.to_path_buf();
            tokio::task::spawn_blocking(move || archive::extract_archive(&zip_path, &base_dir)).await
        };

        remove_temp_archive(&zip_path).await;
        extracted??;

        let mut path = target;
        let mut message = "archive downloaded and extracted";
        if let (Some(_), Some(name)) = (&github, folder_name) {
            if name != default_extracted_name {
                let extracted_path = base_dir.join(&default_extracted_name);
                if let Err(error) = tokio::fs::rename(&extracted_path, &path).await {
                    warn!(
                        "failed to rename {:?} to {:?}, keeping default name: {error}",
                        extracted_path.display(),
                        path.display()
                    );
                    path = extracted_path;
                    message = "archive downloaded and extracted (rename failed, kept default name)";
                }
            }
        }

        if !options.skip_open_folder {
            self.open_folder(&path);
        }

        if !options.skip_open_editor {
            self.open_in_editor(&path);
        }

        Ok(AcquisitionResult::success(path, message))
    }
}

async fn exists(path: &Path) -> Result<bool> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|err| AcquireError::Probe {
            source: err,
            path: path.to_path_buf(),
        })
}

async fn ensure_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|err| AcquireError::CreateDir {
            source: err,
            path: path.to_path_buf(),
        })
}

async fn remove_temp_archive(zip_path: &Path) {
    match tokio::fs::remove_file(zip_path).await {
        Ok(()) => debug!("removed {:?}", zip_path.display()),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
        Err(error) => warn!("failed to remove {:?}: {error}", zip_path.display()),
    }
}

async fn remove_git_dir(target: &Path) {
    let git_dir = target.join(".git");
    match tokio::fs::try_exists(&git_dir).await {
        Ok(true) => {}
        Ok(false) => return,
        Err(error) => {
            warn!("failed to check {:?}: {error}", git_dir.display());
            return;
        }
    }

    match tokio::fs::remove_dir_all(&git_dir).await {
        Ok(()) => info!("deleted .git folder at {:?}", git_dir.display()),
        Err(error) => warn!("failed to delete .git folder at {:?}: {error}", git_dir.display()),
    }
}

/// Acquisition error types.
#[derive(Debug, thiserror::Error)]
pub enum AcquireError {
    /// Git binary cannot be spawned.
    #[error("failed to start git: {0}")]
    Spawn(#[source] std::io::Error),

    /// Git ran, but did not exit cleanly.
    #[error("git clone exited with code {0}")]
    GitExit(i32),

    /// Destination cannot be probed for existence.
    #[error("failed to check {:?}", path.display())]
    Probe {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Base directory cannot be created when missing.
    #[error("failed to create directory {:?}: {source}", path.display())]
    CreateDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Downloaded archive cannot be persisted.
    #[error("failed to write archive to {:?}: {source}", path.display())]
    WriteArchive {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Archive download failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Archive extraction failed.
    #[error(transparent)]
    Extract(#[from] archive::ExtractError),

    /// Blocking extraction task did not run to completion.
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
}

/// Friendly result alias :3
type Result<T, E = AcquireError> = std::result::Result<T, E>;
