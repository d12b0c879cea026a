use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use crate::config::RuntimeConfig;

/// A `host/owner/name` triple identifying the repository whose discussions are searched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub host: String,
    pub owner: String,
    pub name: String,
}

impl Repository {
    /// Parses `owner/name`, `host/owner/name`, or a clone URL (https, ssh, scp-style).
    pub fn parse(raw: &str, default_host: &str) -> Result<Self, RepositoryError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RepositoryError::InvalidFormat(raw.to_string()));
        }

        let path = match strip_url_scheme(trimmed) {
            Some(rest) => rest,
            None => trimmed.to_string(),
        };
        let path = normalize_repo_path(&path);

        let segments: Vec<&str> = path.split('/').collect();
        if segments.iter().any(|segment| segment.trim().is_empty()) {
            return Err(RepositoryError::InvalidFormat(raw.to_string()));
        }

        match segments.as_slice() {
            [owner, name] => Ok(Self {
                host: default_host.to_ascii_lowercase(),
                owner: (*owner).to_string(),
                name: (*name).to_string(),
            }),
            [host, owner, name] => Ok(Self {
                host: canonical_host(host),
                owner: (*owner).to_string(),
                name: (*name).to_string(),
            }),
            _ => Err(RepositoryError::InvalidFormat(raw.to_string())),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Picks the target repository: explicit override, then `GH_REPO`, then the git remotes of `cwd`.
pub fn resolve_repository(
    repo_override: Option<&str>,
    config: &RuntimeConfig,
    cwd: &Path,
) -> Result<Repository, RepositoryError> {
    if let Some(raw) = repo_override.filter(|value| !value.trim().is_empty()) {
        return Repository::parse(raw, &config.host);
    }

    if let Some(raw) = config.repo.as_deref() {
        return Repository::parse(raw, &config.host);
    }

    let remotes = list_git_remotes(cwd)?;
    select_remote_repository(&remotes, &config.host)
        .ok_or_else(|| RepositoryError::NoMatchingRemote(config.host.clone()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRemote {
    pub name: String,
    pub url: String,
}

pub fn list_git_remotes(cwd: &Path) -> Result<Vec<GitRemote>, RepositoryError> {
    let output = Command::new("git")
        .arg("-C")
        .arg(cwd)
        .arg("remote")
        .arg("-v")
        .output()
        .map_err(|error| RepositoryError::GitCommand {
            path: cwd.to_path_buf(),
            message: error.to_string(),
        })?;

    if !output.status.success() {
        return Err(RepositoryError::NotGitRepository(cwd.to_path_buf()));
    }

    Ok(parse_remote_listing(&String::from_utf8_lossy(
        &output.stdout,
    )))
}

/// Parses `git remote -v` output, keeping the fetch URL of each remote.
pub fn parse_remote_listing(listing: &str) -> Vec<GitRemote> {
    let mut remotes: Vec<GitRemote> = Vec::new();

    for line in listing.lines() {
        let mut fields = line.split_whitespace();
        let (Some(name), Some(url)) = (fields.next(), fields.next()) else {
            continue;
        };
        if fields.next().is_some_and(|kind| kind != "(fetch)") {
            continue;
        }
        if remotes.iter().any(|remote| remote.name == name) {
            continue;
        }

        remotes.push(GitRemote {
            name: name.to_string(),
            url: url.to_string(),
        });
    }

    remotes
}

/// Chooses `upstream`, then `github`, then `origin`, then any other remote on `host`.
pub fn select_remote_repository(remotes: &[GitRemote], host: &str) -> Option<Repository> {
    let mut candidates: Vec<(u8, Repository)> = remotes
        .iter()
        .filter_map(|remote| {
            let repository = Repository::parse(&remote.url, host).ok()?;
            if !repository.host.eq_ignore_ascii_case(host) || !looks_like_url(&remote.url) {
                return None;
            }
            Some((remote_priority(&remote.name), repository))
        })
        .collect();

    candidates.sort_by(|left, right| right.0.cmp(&left.0));
    candidates.into_iter().next().map(|(_, repository)| repository)
}

fn remote_priority(name: &str) -> u8 {
    match name {
        "upstream" => 3,
        "github" => 2,
        "origin" => 1,
        _ => 0,
    }
}

fn looks_like_url(raw: &str) -> bool {
    raw.contains("://") || is_scp_style(raw)
}

fn is_scp_style(raw: &str) -> bool {
    raw.split_once(':')
        .is_some_and(|(prefix, _)| prefix.contains('@') && !prefix.contains('/'))
}

fn strip_url_scheme(raw: &str) -> Option<String> {
    if let Some((_, rest)) = raw.split_once("://") {
        let (authority, path) = rest.split_once('/').unwrap_or((rest, ""));
        let host = authority
            .rsplit_once('@')
            .map_or(authority, |(_, host)| host);
        return Some(format!("{host}/{path}"));
    }

    if is_scp_style(raw) {
        let (prefix, path) = raw.split_once(':')?;
        let host = prefix.split_once('@').map_or(prefix, |(_, host)| host);
        return Some(format!("{host}/{path}"));
    }

    None
}

fn normalize_repo_path(raw: &str) -> String {
    raw.trim()
        .trim_end_matches('/')
        .trim_end_matches(".git")
        .to_string()
}

fn canonical_host(raw: &str) -> String {
    let host = raw.to_ascii_lowercase();
    let host = host.split_once(':').map_or(host.as_str(), |(name, _)| name);
    match host {
        "ssh.github.com" | "www.github.com" => "github.com".to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("expected the \"[HOST/]OWNER/REPO\" format, got \"{0}\"")]
    InvalidFormat(String),
    #[error("not a git repository: {0}")]
    NotGitRepository(PathBuf),
    #[error("failed to execute git in {path}: {message}")]
    GitCommand { path: PathBuf, message: String },
    #[error("none of the git remotes point to a known {0} repository")]
    NoMatchingRemote(String),
}
