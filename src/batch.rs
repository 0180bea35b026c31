// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Batch acquisition.
//!
//! A __batch__ clones a list of repository descriptors one after another
//! through the git strategy of the [`Acquirer`]. Items are never cloned in
//! parallel. A failing item is counted and logged, but never stops the rest
//! of the batch.
//!
//! # Placement Modes
//!
//! In __separate__ mode, each repository lands directly under the base
//! directory. In __group__ mode, every repository lands under a named folder
//! inside the base directory. If that group folder already exists, the batch
//! is cancelled before a single item is touched.
//!
//! Per-item side effects are suppressed during a batch. Once the batch
//! completes, the folder holding the last acquired repository is revealed
//! exactly once. In group mode it is also opened in the editor.

use crate::{
    acquire::{
        AcquisitionOptions, AcquisitionResult, Acquirer, ArchiveFetcher, GitRunner,
        ShellIntegration,
    },
    config::RepositoryDescriptor,
    prompt::{ActivitySink, UserPrompt},
    remote::{parent_dir_of, to_ssh_url},
};

use futures::FutureExt;
use std::{
    any::Any,
    fmt::{Display, Formatter, Result as FmtResult},
    panic::AssertUnwindSafe,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument, warn};

/// Where batch items are placed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum BatchPlacementMode {
    /// Each item directly under the base directory.
    #[default]
    Separate,

    /// Every item under a named folder inside the base directory.
    Group(String),
}

impl BatchPlacementMode {
    /// Directory that batch items are placed under.
    ///
    /// Group folders are joined with `/` regardless of host separator. A
    /// blank group name places items like separate mode does.
    pub fn target_base_dir(&self, base_dir: &Path) -> PathBuf {
        match self.group_name() {
            Some(name) => PathBuf::from(format!("{}/{name}", base_dir.display())),
            None => base_dir.to_path_buf(),
        }
    }

    /// Non-blank group name, if any.
    pub fn group_name(&self) -> Option<&str> {
        match self {
            Self::Group(name) if !name.trim().is_empty() => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }
}

impl Display for BatchPlacementMode {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Separate => fmt.write_str("separate"),
            Self::Group(_) => fmt.write_str("group"),
        }
    }
}

/// Settings shared by every item of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    pub mode: BatchPlacementMode,
    pub delete_git: bool,
    pub use_ssh: bool,
    pub base_dir: PathBuf,
}

impl BatchOptions {
    /// Construct new options for separate placement with every flag off.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            mode: BatchPlacementMode::Separate,
            delete_git: false,
            use_ssh: false,
            base_dir: base_dir.into(),
        }
    }
}

/// Lifecycle of a batch runner.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    #[default]
    Idle,
    Running,
    Completed,
}

/// Counts for a finished batch.
///
/// # Invariant
///
/// - Success and failure counts only count processed items. Skipped
///   unconfigured items and duplicates count toward neither.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BatchRunSummary {
    pub success_count: usize,
    pub fail_count: usize,
    pub last_success_path: Option<PathBuf>,
    pub cancelled: bool,
}

/// Sequential batch runner.
pub struct BatchQueueRunner<'a, G, F, S>
where
    G: GitRunner,
    F: ArchiveFetcher,
    S: ShellIntegration,
{
    acquirer: &'a Acquirer<G, F, S>,
    prompt: &'a dyn UserPrompt,
    activity: &'a dyn ActivitySink,
    state: BatchState,
}

impl<'a, G, F, S> BatchQueueRunner<'a, G, F, S>
where
    G: GitRunner,
    F: ArchiveFetcher,
    S: ShellIntegration,
{
    /// Construct new idle batch runner.
    pub fn new(
        acquirer: &'a Acquirer<G, F, S>,
        prompt: &'a dyn UserPrompt,
        activity: &'a dyn ActivitySink,
    ) -> Self {
        Self {
            acquirer,
            prompt,
            activity,
            state: BatchState::Idle,
        }
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    /// Clone every configured item in order.
    ///
    /// Items without a URL are skipped. A duplicate item counts toward
    /// neither success nor failure, but its path still becomes the location
    /// revealed at the end. A panic while processing an item is contained,
    /// and counted as a failure.
    #[instrument(skip(self, items, options), level = "debug")]
    pub async fn run(
        &mut self,
        items: &[RepositoryDescriptor],
        options: &BatchOptions,
    ) -> BatchRunSummary {
        self.state = BatchState::Running;
        let summary = self.process(items, options).await;
        self.state = BatchState::Completed;
        debug!("batch finished: {summary:?}");

        summary
    }

    async fn process(
        &self,
        items: &[RepositoryDescriptor],
        options: &BatchOptions,
    ) -> BatchRunSummary {
        let mut summary = BatchRunSummary::default();
        self.log(format!(
            "[BATCH] Starting batch clone for {} items. Mode: {}, SSH: {}",
            items.len(),
            options.mode,
            options.use_ssh
        ));

        let target_base_dir = options.mode.target_base_dir(&options.base_dir);
        if let Some(group) = options.mode.group_name() {
            // INVARIANT: Never merge a batch into an existing group folder.
            //   - Folder that cannot be checked counts as existing.
            match tokio::fs::try_exists(&target_base_dir).await {
                Ok(false) => {}
                Ok(true) => {
                    self.prompt.warn(
                        "Folder Exists",
                        &format!("Folder \"{group}\" already exists.\n\nCancelled."),
                    );
                    self.log(format!(
                        "[CANCEL] Batch clone cancelled. Folder \"{group}\" exists."
                    ));
                    summary.cancelled = true;
                    return summary;
                }
                Err(error) => {
                    warn!("failed to check {:?}: {error}", target_base_dir.display());
                    self.prompt.warn(
                        "Folder Check Failed",
                        &format!("Cannot check folder \"{group}\": {error}\n\nCancelled."),
                    );
                    self.log(format!(
                        "[CANCEL] Batch clone cancelled. Cannot check folder \"{group}\": {error}"
                    ));
                    summary.cancelled = true;
                    return summary;
                }
            }
        }

        let item_options = AcquisitionOptions {
            base_dir: target_base_dir,
            delete_git_after_clone: options.delete_git,
            custom_folder_name: None,
            skip_open_folder: true,
            skip_open_editor: true,
        };

        for item in items {
            if !item.is_configured() {
                self.log(format!("[SKIP] Button {} has no Repo URL.", item.id));
                continue;
            }

            let name = item.display_name();
            let url = if options.use_ssh {
                to_ssh_url(item.repo_url.trim())
            } else {
                item.repo_url.trim().to_string()
            };

            self.activity.item_started(item);
            self.log(format!("[QUEUE] Cloning {name}..."));
            let attempt = AssertUnwindSafe(self.acquirer.clone_via_git(
                &url,
                item.folder_name(),
                &item_options,
            ))
            .catch_unwind()
            .await;

            match attempt {
                Ok(AcquisitionResult::Success { path, .. }) => {
                    summary.success_count += 1;
                    summary.last_success_path = Some(path);
                    self.log(format!("[OK] {name} cloned."));
                }
                Ok(AcquisitionResult::Duplicate { path, .. }) => {
                    summary.last_success_path = Some(path);
                    self.log(format!("[SKIP] {name} already exists."));
                }
                Ok(AcquisitionResult::Error { message }) => {
                    summary.fail_count += 1;
                    self.log(format!("[FAIL] {name}: {message}"));
                }
                Err(payload) => {
                    summary.fail_count += 1;
                    self.log(format!("[ERROR] {name}: {}", panic_message(payload.as_ref())));
                }
            }
            self.activity.item_finished(item);
        }

        self.log(format!(
            "[BATCH] Completed. Success: {}, Failed: {}.",
            summary.success_count, summary.fail_count
        ));
        self.reveal(&summary, &options.mode);

        summary
    }

    fn reveal(&self, summary: &BatchRunSummary, mode: &BatchPlacementMode) {
        let Some(parent) = summary
            .last_success_path
            .as_ref()
            .and_then(|path| parent_dir_of(&path.to_string_lossy()))
        else {
            return;
        };

        let parent = PathBuf::from(parent);
        if mode.is_group() {
            self.log(format!("[INFO] Opening Group Folder: {}", parent.display()));
            self.acquirer.open_folder(&parent);
            self.acquirer.open_in_editor(&parent);
        } else {
            self.log(format!("[INFO] Opening Base Directory: {}", parent.display()));
            self.acquirer.open_folder(&parent);
        }
    }

    fn log(&self, line: String) {
        self.activity.append_log(&line);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unexpected panic".into()
    }
}
