// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Single repository acquisition.
//!
//! Drive one acquisition for one repository descriptor, either through git
//! or as a zip download, and report the outcome to the user. A duplicate is
//! surfaced as a blocking notice, so the user knows that nothing was
//! overwritten.

use crate::{
    acquire::{
        AcquisitionOptions, AcquisitionResult, Acquirer, ArchiveFetcher, GitRunner,
        ShellIntegration,
    },
    config::RepositoryDescriptor,
    prompt::{ActivitySink, UserPrompt},
    remote::{to_ssh_url, to_zip_url},
};

use tracing::instrument;

/// Title of the duplicate notice.
const DUPLICATE_TITLE: &str = "Folder already exists";

/// Controller for acquiring one repository at a time.
pub struct SingleCloneController<'a, G, F, S>
where
    G: GitRunner,
    F: ArchiveFetcher,
    S: ShellIntegration,
{
    acquirer: &'a Acquirer<G, F, S>,
    prompt: &'a dyn UserPrompt,
    activity: &'a dyn ActivitySink,
}

impl<'a, G, F, S> SingleCloneController<'a, G, F, S>
where
    G: GitRunner,
    F: ArchiveFetcher,
    S: ShellIntegration,
{
    /// Construct new single clone controller.
    pub fn new(
        acquirer: &'a Acquirer<G, F, S>,
        prompt: &'a dyn UserPrompt,
        activity: &'a dyn ActivitySink,
    ) -> Self {
        Self {
            acquirer,
            prompt,
            activity,
        }
    }

    /// Clone repository of item through git.
    ///
    /// The URL is rewritten into SSH form first when the item asks for it.
    #[instrument(skip(self, item, options), fields(id = %item.id), level = "debug")]
    pub async fn clone(
        &self,
        item: &RepositoryDescriptor,
        options: &AcquisitionOptions,
    ) -> AcquisitionResult {
        if let Some(result) = self.reject_unconfigured(item) {
            return result;
        }

        let url = if item.use_ssh {
            to_ssh_url(item.repo_url.trim())
        } else {
            item.repo_url.trim().to_string()
        };

        self.log_start("Cloning", &url, item, options);
        self.activity.item_started(item);
        let result = self
            .acquirer
            .clone_via_git(&url, item.folder_name(), options)
            .await;
        self.activity.item_finished(item);

        self.report(&result, "Cloned to", "clone cancelled");
        result
    }

    /// Download repository of item as a zip archive, and extract it.
    ///
    /// Plain repository URLs are rewritten into archive URLs of the default
    /// branch. The SSH preference of the item does not apply.
    #[instrument(skip(self, item, options), fields(id = %item.id), level = "debug")]
    pub async fn download_zip(
        &self,
        item: &RepositoryDescriptor,
        options: &AcquisitionOptions,
    ) -> AcquisitionResult {
        if let Some(result) = self.reject_unconfigured(item) {
            return result;
        }

        let url = to_zip_url(&item.repo_url);

        self.log_start("Downloading", &url, item, options);
        self.activity.item_started(item);
        let result = self
            .acquirer
            .download_zip(&url, item.folder_name(), options)
            .await;
        self.activity.item_finished(item);

        self.report(&result, "ZIP extracted to", "download cancelled");
        result
    }

    fn reject_unconfigured(&self, item: &RepositoryDescriptor) -> Option<AcquisitionResult> {
        if item.is_configured() {
            return None;
        }

        self.log(format!("[WARN] Button {} has no URL", item.id));
        Some(AcquisitionResult::error(format!(
            "Button {} has no URL.",
            item.id
        )))
    }

    fn log_start(
        &self,
        verb: &str,
        url: &str,
        item: &RepositoryDescriptor,
        options: &AcquisitionOptions,
    ) {
        let folder = options
            .folder_name(item.folder_name())
            .unwrap_or("[auto]");
        self.log(format!("[INFO] {verb} {url} -> {folder}…"));
    }

    fn report(&self, result: &AcquisitionResult, done: &str, cancelled: &str) {
        match result {
            AcquisitionResult::Success { path, .. } => {
                self.log(format!("[OK] {done}: {}", path.display()));
            }
            AcquisitionResult::Duplicate { path, .. } => {
                self.log(format!("[SKIP] Exists: {}", path.display()));
                self.prompt.confirm(
                    DUPLICATE_TITLE,
                    &format!(
                        "Project folder already exists, {cancelled}.\n\n{}",
                        path.display()
                    ),
                );
            }
            AcquisitionResult::Error { message } => {
                self.log(format!("[ERROR] {message}"));
            }
        }
    }

    fn log(&self, line: String) {
        self.activity.append_log(&line);
    }
}
