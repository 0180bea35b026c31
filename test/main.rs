// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT


use clonetools::{
    acquire::{ArchiveFetcher, FetchError, GitRunner, ShellIntegration},
    prompt::{ActivitySink, UserPrompt},
    Acquirer, EditorId, RepositoryDescriptor,
};

use anyhow::Result;
use async_trait::async_trait;
use git2::{IndexEntry, IndexTime, Repository, RepositoryInitOptions};
use std::{
    io::{Cursor, Write},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};
use zip::{write::SimpleFileOptions, ZipWriter};

/// Local git repository to clone from.
pub(crate) struct RepoFixture {
    repo: Repository,
}

impl RepoFixture {
    pub(crate) fn new(path: impl AsRef<Path>) -> Result<Self> {
        let mut opts = RepositoryInitOptions::new();
        opts.initial_head("main");
        let repo = Repository::init_opts(path.as_ref(), &opts)?;

        // INVARIANT: Always provide valid name and email.
        //   - Git will complain if this is not set in CI/CD environments.
        let mut config = repo.config()?;
        config.set_str("user.name", "John Doe")?;
        config.set_str("user.email", "john@doe.com")?;

        Ok(Self { repo })
    }

    pub(crate) fn path(&self) -> &Path {
        self.repo.workdir().unwrap_or(self.repo.path())
    }

    pub(crate) fn stage_and_commit(
        &self,
        filename: impl AsRef<Path>,
        contents: impl AsRef<str>,
    ) -> Result<()> {
        let entry = IndexEntry {
            ctime: IndexTime::new(0, 0),
            mtime: IndexTime::new(0, 0),
            dev: 0,
            ino: 0,
            mode: 0o100644,
            uid: 0,
            gid: 0,
            file_size: contents.as_ref().len() as u32,
            id: self.repo.blob(contents.as_ref().as_bytes())?,
            flags: 0,
            flags_extended: 0,
            path: filename
                .as_ref()
                .as_os_str()
                .to_string_lossy()
                .into_owned()
                .into_bytes(),
        };

        // INVARIANT: Always use new tree produced by index after staging new entry.
        let mut index = self.repo.index()?;
        index.add_frombuffer(&entry, contents.as_ref().as_bytes())?;
        let tree_oid = index.write_tree()?;
        let tree = self.repo.find_tree(tree_oid)?;

        let signature = self.repo.signature()?;
        let mut parents = Vec::new();
        if let Some(parent) = self.repo.head().ok().and_then(|head| head.target()) {
            parents.push(self.repo.find_commit(parent)?);
        }
        let parents = parents.iter().collect::<Vec<_>>();

        self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            format!("chore: add {:?}", filename.as_ref()).as_ref(),
            &tree,
            &parents,
        )?;

        Ok(())
    }
}

/// Check if a git binary is available to spawn.
pub(crate) fn has_git() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .is_ok_and(|output| output.status.success())
}

/// Build zip archive in memory from `(name, contents)` entries.
pub(crate) fn zip_bytes(entries: &[(&str, &str)]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer.start_file(*name, SimpleFileOptions::default())?;
        writer.write_all(contents.as_bytes())?;
    }

    Ok(writer.finish()?.into_inner())
}

pub(crate) fn descriptor(id: &str, label: &str, url: &str) -> RepositoryDescriptor {
    RepositoryDescriptor {
        id: id.into(),
        label: Some(label.into()),
        repo_url: url.into(),
        ..Default::default()
    }
}

#[derive(Debug, Default)]
pub(crate) struct GitState {
    pub(crate) calls: Mutex<Vec<(String, PathBuf)>>,
    pub(crate) fail_on: Vec<String>,
    pub(crate) panic_on: Vec<String>,
    pub(crate) git_file: bool,
}

/// Git runner that materializes a fake working tree instead of cloning.
#[derive(Debug, Default, Clone)]
pub(crate) struct FakeGit {
    pub(crate) state: Arc<GitState>,
}

impl FakeGit {
    pub(crate) fn failing_on(urls: &[&str]) -> Self {
        Self {
            state: Arc::new(GitState {
                fail_on: urls.iter().map(|url| url.to_string()).collect(),
                ..Default::default()
            }),
        }
    }

    pub(crate) fn panicking_on(urls: &[&str]) -> Self {
        Self {
            state: Arc::new(GitState {
                panic_on: urls.iter().map(|url| url.to_string()).collect(),
                ..Default::default()
            }),
        }
    }

    /// Write `.git` as a plain file, the way worktrees and submodules do.
    pub(crate) fn with_git_file() -> Self {
        Self {
            state: Arc::new(GitState {
                git_file: true,
                ..Default::default()
            }),
        }
    }

    pub(crate) fn calls(&self) -> Vec<(String, PathBuf)> {
        self.state.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GitRunner for FakeGit {
    async fn clone_repo(&self, url: &str, target: &Path) -> std::io::Result<i32> {
        self.state
            .calls
            .lock()
            .unwrap()
            .push((url.to_string(), target.to_path_buf()));

        if self.state.panic_on.iter().any(|entry| entry == url) {
            panic!("boom");
        }

        if self.state.fail_on.iter().any(|entry| entry == url) {
            return Ok(128);
        }

        if self.state.git_file {
            std::fs::create_dir_all(target)?;
            std::fs::write(target.join(".git"), "gitdir: ../elsewhere/.git\n")?;
        } else {
            std::fs::create_dir_all(target.join(".git"))?;
        }
        std::fs::write(target.join("README.md"), "# fixture\n")?;

        Ok(0)
    }
}

/// Archive fetcher that serves a canned response.
#[derive(Debug, Clone)]
pub(crate) struct FakeFetcher {
    response: std::result::Result<Vec<u8>, u16>,
    pub(crate) calls: Arc<AtomicUsize>,
}

impl FakeFetcher {
    pub(crate) fn serving(bytes: Vec<u8>) -> Self {
        Self {
            response: Ok(bytes),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn status(code: u16) -> Self {
        Self {
            response: Err(code),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ArchiveFetcher for FakeFetcher {
    async fn fetch(&self, _url: &str) -> std::result::Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.response {
            Ok(bytes) => Ok(bytes.clone()),
            Err(code) => Err(FetchError::Status {
                code: *code,
                reason: "Not Found".into(),
            }),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct ShellState {
    pub(crate) folders: Mutex<Vec<PathBuf>>,
    pub(crate) editors: Mutex<Vec<(PathBuf, EditorId)>>,
    pub(crate) urls: Mutex<Vec<String>>,
}

/// Shell integration that records requests instead of spawning anything.
#[derive(Debug, Default, Clone)]
pub(crate) struct FakeShell {
    pub(crate) state: Arc<ShellState>,
}

impl FakeShell {
    pub(crate) fn folders(&self) -> Vec<PathBuf> {
        self.state.folders.lock().unwrap().clone()
    }

    pub(crate) fn editors(&self) -> Vec<(PathBuf, EditorId)> {
        self.state.editors.lock().unwrap().clone()
    }
}

impl ShellIntegration for FakeShell {
    fn open_folder(&self, path: &Path) {
        self.state.folders.lock().unwrap().push(path.to_path_buf());
    }

    fn open_in_editor(&self, path: &Path, editor: EditorId) {
        self.state
            .editors
            .lock()
            .unwrap()
            .push((path.to_path_buf(), editor));
    }

    fn open_url(&self, url: &str) {
        self.state.urls.lock().unwrap().push(url.to_string());
    }
}

/// Prompt and activity sink that records everything it receives.
#[derive(Debug, Default)]
pub(crate) struct RecordingPrompt {
    pub(crate) notices: Mutex<Vec<(String, String)>>,
    pub(crate) warnings: Mutex<Vec<(String, String)>>,
    pub(crate) log: Mutex<Vec<String>>,
    pub(crate) started: AtomicUsize,
    pub(crate) finished: AtomicUsize,
}

impl RecordingPrompt {
    pub(crate) fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub(crate) fn notices(&self) -> Vec<(String, String)> {
        self.notices.lock().unwrap().clone()
    }

    pub(crate) fn warnings(&self) -> Vec<(String, String)> {
        self.warnings.lock().unwrap().clone()
    }
}

impl UserPrompt for RecordingPrompt {
    fn confirm(&self, title: &str, message: &str) {
        self.notices
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
    }

    fn warn(&self, title: &str, message: &str) {
        self.warnings
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
    }
}

impl ActivitySink for RecordingPrompt {
    fn append_log(&self, line: &str) {
        self.log.lock().unwrap().push(line.to_string());
    }

    fn item_started(&self, _item: &RepositoryDescriptor) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn item_finished(&self, _item: &RepositoryDescriptor) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}

pub(crate) type FakeAcquirer = Acquirer<FakeGit, FakeFetcher, FakeShell>;

pub(crate) fn fake_acquirer(
    git: &FakeGit,
    fetcher: &FakeFetcher,
    shell: &FakeShell,
) -> FakeAcquirer {
    Acquirer::new(git.clone(), fetcher.clone(), shell.clone(), EditorId::VsCode)
}
