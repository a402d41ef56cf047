use crate::resolver::GitRemote;
use crate::resolver::RepositoryHost;
use dunce::canonicalize;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use tracing::debug;
use tracing::warn;

/// Repository host backed by the `git` executable.
///
/// Repositories and their remotes are read once, from the workspace folders
/// handed to [`GitCliHost::discover`]; later lookups never spawn `git`.
#[derive(Clone, Debug, Default)]
pub struct GitCliHost {
    repositories: Vec<(PathBuf, Vec<GitRemote>)>,
}

impl GitCliHost {
    pub fn discover(workspace_folders: &[PathBuf]) -> Self {
        let mut repositories: Vec<(PathBuf, Vec<GitRemote>)> = Vec::new();
        for folder in workspace_folders {
            let Some(root) = git_toplevel(folder) else {
                debug!("no git repository at {}", folder.display());
                continue;
            };
            if repositories.iter().any(|(known, _)| *known == root) {
                continue;
            }
            let remotes = read_remotes(&root);
            repositories.push((root, remotes));
        }
        Self { repositories }
    }

    pub fn roots(&self) -> Vec<&Path> {
        self.repositories
            .iter()
            .map(|(root, _)| root.as_path())
            .collect()
    }
}

impl RepositoryHost for GitCliHost {
    fn list_repositories(&self) -> Vec<PathBuf> {
        self.repositories
            .iter()
            .map(|(root, _)| root.clone())
            .collect()
    }

    fn remotes_for(&self, root: &Path) -> Vec<GitRemote> {
        self.repositories
            .iter()
            .find(|(candidate, _)| candidate == root)
            .map(|(_, remotes)| remotes.clone())
            .unwrap_or_default()
    }
}

fn git_toplevel(dir: &Path) -> Option<PathBuf> {
    let output = Command::new("git")
        .arg("rev-parse")
        .arg("--show-toplevel")
        .current_dir(dir)
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let stdout = String::from_utf8(output.stdout).ok()?;
    let root = stdout.trim();
    if root.is_empty() {
        return None;
    }
    canonicalize(root).ok()
}

fn read_remotes(root: &Path) -> Vec<GitRemote> {
    let output = match Command::new("git")
        .arg("remote")
        .arg("-v")
        .current_dir(root)
        .output()
    {
        Ok(output) => output,
        Err(err) => {
            warn!("git remote failed in {}: {err:?}", root.display());
            return Vec::new();
        }
    };
    if !output.status.success() {
        return Vec::new();
    }
    parse_remote_verbose(&String::from_utf8_lossy(&output.stdout))
}

/// Parses `git remote -v` output, keeping the `(fetch)` entries.
fn parse_remote_verbose(stdout: &str) -> Vec<GitRemote> {
    let mut remotes: Vec<GitRemote> = Vec::new();
    for line in stdout.lines() {
        let mut parts = line.split_whitespace();
        let (Some(name), Some(url), Some(kind)) = (parts.next(), parts.next(), parts.next())
        else {
            continue;
        };
        if kind != "(fetch)" {
            continue;
        }
        if remotes.iter().any(|remote| remote.name == name) {
            continue;
        }
        remotes.push(GitRemote::new(name, url));
    }
    remotes
}
