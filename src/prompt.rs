// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! User-facing feedback.
//!
//! Controllers report progress through two ports. [`UserPrompt`] presents
//! blocking notices that the user must acknowledge. [`ActivitySink`] receives
//! the human-readable activity log, and per-item progress notifications.

use crate::config::RepositoryDescriptor;

use indicatif::{ProgressBar, ProgressStyle};
use inquire::Confirm;
use std::time::Duration;
use tracing::{info, warn};

/// Blocking notices for the user.
pub trait UserPrompt: Send + Sync {
    /// Present informational notice that the user acknowledges.
    fn confirm(&self, title: &str, message: &str);

    /// Present warning notice that the user acknowledges.
    fn warn(&self, title: &str, message: &str);
}

/// Receiver of activity log lines and progress notifications.
pub trait ActivitySink: Send + Sync {
    /// Append line to activity log.
    fn append_log(&self, line: &str);

    /// Item started processing.
    fn item_started(&self, _item: &RepositoryDescriptor) {}

    /// Item finished processing, whatever the outcome.
    fn item_finished(&self, _item: &RepositoryDescriptor) {}
}

/// Prompt and activity sink that only write to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPrompt;

impl UserPrompt for LogPrompt {
    fn confirm(&self, title: &str, message: &str) {
        info!("{title}: {}", message.replace("\n\n", " "));
    }

    fn warn(&self, title: &str, message: &str) {
        warn!("{title}: {}", message.replace("\n\n", " "));
    }
}

impl ActivitySink for LogPrompt {
    fn append_log(&self, line: &str) {
        info!("{line}");
    }
}

/// Prompt and activity sink for terminal sessions.
///
/// Shows a spinner naming the item currently being processed. Notices are
/// presented through [`inquire`] while the spinner is suspended. Without
/// interactivity, notices are only logged.
#[derive(Debug, Clone)]
pub struct IndicatifPrompter {
    pub(crate) bar: ProgressBar,
    interactive: bool,
}

impl IndicatifPrompter {
    /// Construct new terminal prompter.
    pub fn new(bar: ProgressBar, interactive: bool) -> Self {
        Self { bar, interactive }
    }

    /// Construct new terminal prompter with a spinner.
    ///
    /// # Errors
    ///
    /// - Return [`indicatif::style::TemplateError`] if spinner template is
    ///   invalid.
    pub fn spinner(interactive: bool) -> Result<Self, indicatif::style::TemplateError> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(ProgressStyle::with_template(
            "{elapsed_precise:.green}  {spinner:.cyan} {msg}",
        )?);

        Ok(Self::new(bar, interactive))
    }

    /// Clear spinner from terminal.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    fn notice(&self, title: &str, message: &str) {
        let answer = self.bar.suspend(|| {
            Confirm::new(title)
                .with_default(true)
                .with_help_message(message)
                .prompt()
        });

        if let Err(error) = answer {
            warn!("failed to show notice {title:?}: {error}");
        }
    }
}

impl UserPrompt for IndicatifPrompter {
    fn confirm(&self, title: &str, message: &str) {
        self.bar.suspend(|| LogPrompt.confirm(title, message));
        if self.interactive {
            self.notice(title, message);
        }
    }

    fn warn(&self, title: &str, message: &str) {
        self.bar.suspend(|| UserPrompt::warn(&LogPrompt, title, message));
        if self.interactive {
            self.notice(title, message);
        }
    }
}

impl ActivitySink for IndicatifPrompter {
    fn append_log(&self, line: &str) {
        self.bar.suspend(|| LogPrompt.append_log(line));
    }

    fn item_started(&self, item: &RepositoryDescriptor) {
        self.bar.set_message(item.display_name().to_string());
        self.bar.enable_steady_tick(Duration::from_millis(100));
    }

    fn item_finished(&self, _item: &RepositoryDescriptor) {
        self.bar.disable_steady_tick();
        self.bar.set_message("");
    }
}
