// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Desktop shell integration.
//!
//! Reveal folders in the file manager, open them in an editor, or open URLs
//! in the default browser. All operations are fire-and-forget. Spawn failures
//! are logged, and never propagated to the caller.

use crate::config::EditorId;

use std::{
    ffi::OsStr,
    path::Path,
    process::{Command, ExitStatus, Stdio},
    thread::JoinHandle,
};
use tracing::{debug, warn};

/// Fire-and-forget desktop side effects.
pub trait ShellIntegration: Send + Sync {
    /// Reveal path in the platform file manager.
    fn open_folder(&self, path: &Path);

    /// Open path in editor.
    fn open_in_editor(&self, path: &Path, editor: EditorId);

    /// Open URL in the default browser.
    fn open_url(&self, url: &str);
}

/// Host platform flavor of shell commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    MacOs,
    Linux,
}

impl Platform {
    /// Platform clonetools was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Linux
        }
    }

    /// Command that opens a folder or URL with the platform default handler.
    pub fn open_command(&self, target: impl AsRef<OsStr>) -> Command {
        let mut command = match self {
            Self::Windows => Command::new("explorer"),
            Self::MacOs => Command::new("open"),
            Self::Linux => Command::new("xdg-open"),
        };
        command.arg(target);
        command
    }

    /// Command that opens a URL in the default browser.
    pub fn browse_command(&self, url: &str) -> Command {
        match self {
            Self::Windows => {
                let mut command = Command::new("cmd");
                command.args(["/C", "start", "", url]);
                command
            }
            _ => self.open_command(url),
        }
    }

    /// Command that opens path in editor.
    ///
    /// Editors are launched through `cmd /C` on Windows so that `.cmd` shims
    /// on `PATH` resolve.
    pub fn editor_command(&self, editor: EditorId, path: &Path) -> Command {
        match self {
            Self::Windows => {
                let mut command = Command::new("cmd");
                command.args(["/C", editor.command()]).arg(path);
                command
            }
            _ => {
                let mut command = Command::new(editor.command());
                command.arg(path);
                command
            }
        }
    }
}

/// Shell integration that spawns platform commands.
#[derive(Debug, Clone, Copy)]
pub struct SystemShell {
    platform: Platform,
}

impl SystemShell {
    /// Construct new shell integration for a specific platform.
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    /// Construct new shell integration for the current platform.
    pub fn current() -> Self {
        Self::new(Platform::current())
    }
}

impl ShellIntegration for SystemShell {
    fn open_folder(&self, path: &Path) {
        spawn_detached(self.platform.open_command(path));
    }

    fn open_in_editor(&self, path: &Path, editor: EditorId) {
        spawn_detached(self.platform.editor_command(editor, path));
    }

    fn open_url(&self, url: &str) {
        spawn_detached(self.platform.browse_command(url));
    }
}

/// Spawn command without blocking the caller.
///
/// The child is waited on by a background thread so it is reaped once it
/// exits. Returns handle of that thread, or `None` if spawning failed.
fn spawn_detached(mut command: Command) -> Option<JoinHandle<Option<ExitStatus>>> {
    let program = command.get_program().to_string_lossy().into_owned();
    let spawned = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    let mut child = match spawned {
        Ok(child) => child,
        Err(error) => {
            warn!("failed to spawn {program}: {error}");
            return None;
        }
    };
    debug!("spawned {program} with pid {}", child.id());

    Some(std::thread::spawn(move || match child.wait() {
        Ok(status) => {
            debug!("{program} exited with {status}");
            Some(status)
        }
        Err(error) => {
            warn!("failed to wait on {program}: {error}");
            None
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use simple_test_case::test_case;

    fn argv(command: &Command) -> Vec<String> {
        std::iter::once(command.get_program())
            .chain(command.get_args())
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test_case(Platform::Windows, &["explorer", "/tmp/ws/widgets"]; "windows")]
    #[test_case(Platform::MacOs, &["open", "/tmp/ws/widgets"]; "macos")]
    #[test_case(Platform::Linux, &["xdg-open", "/tmp/ws/widgets"]; "linux")]
    #[test]
    fn open_command(platform: Platform, expect: &[&str]) {
        let result = argv(&platform.open_command("/tmp/ws/widgets"));
        pretty_assertions::assert_eq!(result, expect);
    }

    #[test_case(Platform::Windows, EditorId::VsCode, &["cmd", "/C", "code", "/tmp/ws/widgets"]; "windows vscode")]
    #[test_case(Platform::MacOs, EditorId::Cursor, &["cursor", "/tmp/ws/widgets"]; "macos cursor")]
    #[test_case(Platform::Linux, EditorId::Windsurf, &["windsurf", "/tmp/ws/widgets"]; "linux windsurf")]
    #[test]
    fn editor_command(platform: Platform, editor: EditorId, expect: &[&str]) {
        let result = argv(&platform.editor_command(editor, Path::new("/tmp/ws/widgets")));
        pretty_assertions::assert_eq!(result, expect);
    }

    #[cfg(unix)]
    #[test]
    fn spawn_detached_reaps_child() {
        let handle = spawn_detached(Command::new("true"));
        let status = handle.and_then(|handle| handle.join().ok()).flatten();
        assert!(status.is_some_and(|status| status.success()));
    }

    #[test]
    fn spawn_detached_missing_program() {
        let result = spawn_detached(Command::new("clonetools-no-such-program"));
        assert!(result.is_none());
    }

    #[test_case(Platform::Windows, &["cmd", "/C", "start", "", "https://github.com/acme/widgets"]; "windows")]
    #[test_case(Platform::Linux, &["xdg-open", "https://github.com/acme/widgets"]; "linux")]
    #[test]
    fn browse_command(platform: Platform, expect: &[&str]) {
        let result = argv(&platform.browse_command("https://github.com/acme/widgets"));
        pretty_assertions::assert_eq!(result, expect);
    }
}
