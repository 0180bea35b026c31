// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Git subprocess handling.

use async_trait::async_trait;
use std::{ffi::OsString, path::Path, process::Stdio};
use tokio::process::Command;
use tracing::{debug, instrument, warn};

/// Spawn `git clone` for a single repository.
#[async_trait]
pub trait GitRunner: Send + Sync {
    /// Clone URL into target path, and wait for git to exit.
    ///
    /// Returns the exit code of git. A process terminated by a signal reports
    /// `-1`.
    ///
    /// # Errors
    ///
    /// - Return [`std::io::Error`] if git cannot be spawned at all.
    async fn clone_repo(&self, url: &str, target: &Path) -> std::io::Result<i32>;
}

/// Git runner that shells out to the git binary.
#[derive(Debug, Clone)]
pub struct SystemGit {
    program: OsString,
}

impl SystemGit {
    /// Construct new runner using a specific git binary.
    pub fn with_program(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SystemGit {
    fn default() -> Self {
        Self::with_program("git")
    }
}

#[async_trait]
impl GitRunner for SystemGit {
    #[instrument(skip(self), level = "debug")]
    async fn clone_repo(&self, url: &str, target: &Path) -> std::io::Result<i32> {
        let output = Command::new(&self.program)
            .arg("clone")
            .arg(url)
            .arg(target)
            .stdin(Stdio::null())
            .output()
            .await?;

        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if output.status.success() {
            debug!("git: {}", stderr.trim());
        } else {
            warn!("git clone exited with code {code}: {}", stderr.trim());
        }

        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_program_fails_to_spawn() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let git = SystemGit::with_program("clonetools-no-such-git-binary");

        let result = git
            .clone_repo("https://github.com/acme/widgets.git", &dir.path().join("widgets"))
            .await;
        assert!(result.is_err());

        Ok(())
    }
}
