// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Remote URL interpretation.
//!
//! Pure helpers that turn a repository URL into something clonetools can act
//! on: the folder name an acquisition should land in, the SSH form of a
//! GitHub remote, or the archive URL GitHub serves for a branch. Nothing in
//! here touches the file system or the network.
//!
//! # GitHub Archive Convention
//!
//! GitHub serves branch snapshots at `/<owner>/<repo>/archive/refs/heads/<branch>.zip`.
//! The archive always holds a single top-level folder named `<repo>-<branch>`,
//! so that is the folder an extraction produces before any rename.

use std::path::{Path, PathBuf};
use url::Url;

const GITHUB_HOST: &str = "github.com";
const ARCHIVE_MARKER: &str = "/archive/refs/heads/";
const DEFAULT_BRANCH: &str = "main";
const FALLBACK_FOLDER: &str = "repo";

/// Owner, repository, and branch of a GitHub URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GithubRepo {
    /// Account or organization owning the repository.
    pub owner: String,

    /// Repository name without any `.git` suffix.
    pub repo: String,

    /// Branch named by an archive URL, or `main` when none is given.
    pub branch: String,

    /// Whether the URL pointed at a branch archive.
    pub archive: bool,
}

impl GithubRepo {
    /// Folder name GitHub uses as the top-level entry of a branch archive.
    pub fn archive_folder_name(&self) -> String {
        format!("{}-{}", self.repo, self.branch)
    }
}

/// Check if URL names a zip archive.
///
/// Matches a `.zip` suffix optionally followed by a query string, ignoring
/// case.
pub fn is_zip_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower
        .match_indices(".zip")
        .any(|(idx, _)| matches!(lower[idx + 4..].chars().next(), None | Some('?')))
}

/// Check if URL is an HTTP(S) GitHub URL.
pub fn is_github_url(url: &str) -> bool {
    parse_http_url(url)
        .map(|parsed| parsed.host_str() == Some(GITHUB_HOST))
        .unwrap_or(false)
}

/// Parse owner, repository, and branch out of a GitHub URL.
///
/// Branch comes from the `archive/refs/heads/<branch>.zip` pattern when
/// present, otherwise it defaults to `main`. Returns `None` for anything that
/// is not an HTTP(S) GitHub URL with at least an owner segment.
pub fn parse_github_repo_and_branch(url: &str) -> Option<GithubRepo> {
    let parsed = parse_http_url(url)?;
    if parsed.host_str() != Some(GITHUB_HOST) {
        return None;
    }

    let mut segments = parsed.path_segments()?.filter(|segment| !segment.is_empty());
    let owner = segments.next()?.to_string();
    let repo = segments
        .next()
        .map(strip_git_suffix)
        .filter(|repo| !repo.is_empty())
        .unwrap_or(FALLBACK_FOLDER)
        .to_string();

    let branch = archive_branch(parsed.path());
    Some(GithubRepo {
        owner,
        repo,
        archive: branch.is_some(),
        branch: branch.unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
    })
}

/// Derive default destination folder name from a repository URL.
///
/// - GitHub branch archive: `<repo>-<branch>`.
/// - Any other GitHub URL: `<repo>` without `.git`.
/// - Bare zip URL: `repo`.
/// - Anything else: last path segment without `.git`, so SSH remotes like
///   `git@host:owner/name.git` yield `name`.
pub fn derive_default_folder_name(url: &str) -> String {
    if let Some(github) = parse_github_repo_and_branch(url) {
        if github.archive {
            return github.archive_folder_name();
        }

        return github.repo;
    }

    if is_zip_url(url) {
        return FALLBACK_FOLDER.into();
    }

    let trimmed = strip_query(url.trim()).trim_end_matches('/');
    let last = trimmed
        .rsplit(['/', ':'])
        .next()
        .map(strip_git_suffix)
        .unwrap_or_default();

    if last.is_empty() {
        FALLBACK_FOLDER.into()
    } else {
        last.into()
    }
}

/// Resolve absolute destination path of an acquisition.
///
/// A non-blank explicit folder name wins over the name derived from the URL.
pub fn resolve_target_path(
    base_dir: impl AsRef<Path>,
    url: &str,
    explicit_folder_name: Option<&str>,
) -> PathBuf {
    let name = match explicit_folder_name.map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => derive_default_folder_name(url),
    };

    base_dir.as_ref().join(name)
}

/// Rewrite HTTPS GitHub URL into its SSH remote form.
///
/// Returns `git@github.com:<owner>/<repo>.git` for GitHub URLs with at least
/// two path segments. Zip URLs, other hosts, short paths, and anything that
/// fails to parse, e.g., an URL that is already in SSH form, come back
/// unchanged.
pub fn to_ssh_url(url: &str) -> String {
    if is_zip_url(url) {
        return url.to_string();
    }

    let Ok(parsed) = Url::parse(url) else {
        return url.to_string();
    };

    if parsed.host_str() != Some(GITHUB_HOST) {
        return url.to_string();
    }

    let Some(segments) = parsed.path_segments() else {
        return url.to_string();
    };

    let segments = segments.filter(|segment| !segment.is_empty()).collect::<Vec<_>>();
    let [owner, repo, ..] = segments.as_slice() else {
        return url.to_string();
    };

    if repo.ends_with(".git") {
        format!("git@{GITHUB_HOST}:{owner}/{repo}")
    } else {
        format!("git@{GITHUB_HOST}:{owner}/{repo}.git")
    }
}

/// Rewrite plain GitHub repository URL into its `main` branch archive URL.
///
/// URLs that already name a zip archive, and non-GitHub URLs, come back
/// unchanged.
pub fn to_zip_url(url: &str) -> String {
    let url = url.trim();
    if !is_github_url(url) || is_zip_url(url) {
        return url.to_string();
    }

    let base = strip_git_suffix(url.trim_end_matches('/'));
    format!("{base}{ARCHIVE_MARKER}{DEFAULT_BRANCH}.zip")
}

/// Web page of a repository URL, i.e., the URL without its `.git` suffix.
pub fn to_browse_url(url: &str) -> String {
    strip_git_suffix(url.trim()).to_string()
}

/// Parent directory of a path string.
///
/// Splits on `\` when the string contains one and on `/` otherwise, because
/// destinations built by string concatenation may not use the host
/// separator. Returns `None` when there is no separator at all.
pub fn parent_dir_of(path: &str) -> Option<String> {
    let separator = if path.contains('\\') { '\\' } else { '/' };

    path.rfind(separator).map(|idx| path[..idx].to_string())
}

fn parse_http_url(url: &str) -> Option<Url> {
    Url::parse(url.trim())
        .ok()
        .filter(|parsed| matches!(parsed.scheme(), "http" | "https"))
}

fn archive_branch(path: &str) -> Option<String> {
    let idx = path.find(ARCHIVE_MARKER)?;
    let rest = &path[idx + ARCHIVE_MARKER.len()..];
    let branch = rest.strip_suffix(".zip")?;

    // INVARIANT: Branch is a single path segment.
    if branch.is_empty() || branch.contains('/') {
        return None;
    }

    Some(branch.to_string())
}

fn strip_git_suffix(value: &str) -> &str {
    value.strip_suffix(".git").unwrap_or(value)
}

fn strip_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}
