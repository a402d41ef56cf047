use crate::remote::repo_name_from_remote_url;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GitRemote {
    pub name: String,
    pub fetch_url: Option<String>,
}

impl GitRemote {
    pub fn new(name: impl Into<String>, fetch_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fetch_url: Some(fetch_url.into()),
        }
    }
}

/// Enumerates the git repositories the host environment has open.
///
/// Supplied at construction so the resolver never depends on a particular
/// editor or git integration.
pub trait RepositoryHost: Send + Sync {
    fn list_repositories(&self) -> Vec<PathBuf>;

    fn remotes_for(&self, root: &Path) -> Vec<GitRemote>;
}

/// A local checkout together with the Zoekt names its remotes map to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepositoryBinding {
    pub root: PathBuf,
    pub fetch_urls: Vec<String>,
    pub repository_ids: Vec<String>,
}

impl RepositoryBinding {
    pub fn matches(&self, repository_id: &str) -> bool {
        self.repository_ids.iter().any(|id| id == repository_id)
    }
}

#[derive(Clone)]
pub struct RepositoryResolver {
    host: Arc<dyn RepositoryHost>,
}

impl fmt::Debug for RepositoryResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepositoryResolver").finish_non_exhaustive()
    }
}

impl RepositoryResolver {
    pub fn new(host: Arc<dyn RepositoryHost>) -> Self {
        Self { host }
    }

    pub fn bindings(&self) -> Vec<RepositoryBinding> {
        self.host
            .list_repositories()
            .into_iter()
            .map(|root| self.binding_for(root))
            .collect()
    }

    /// First open repository with any remote that normalizes to `repository_id`.
    pub fn find_local_repository(&self, repository_id: &str) -> Option<RepositoryBinding> {
        self.host
            .list_repositories()
            .into_iter()
            .map(|root| self.binding_for(root))
            .find(|binding| binding.matches(repository_id))
    }

    pub fn list_local_repository_ids(&self) -> BTreeSet<String> {
        self.bindings()
            .into_iter()
            .flat_map(|binding| binding.repository_ids)
            .collect()
    }

    pub fn is_local(&self, repository_id: &str) -> bool {
        self.find_local_repository(repository_id).is_some()
    }

    /// Whether any open repository has a remote Zoekt could have indexed.
    pub fn has_local_repositories(&self) -> bool {
        self.bindings()
            .iter()
            .any(|binding| !binding.repository_ids.is_empty())
    }

    fn binding_for(&self, root: PathBuf) -> RepositoryBinding {
        let fetch_urls: Vec<String> = self
            .host
            .remotes_for(&root)
            .into_iter()
            .filter_map(|remote| remote.fetch_url)
            .collect();
        let mut repository_ids: Vec<String> = Vec::new();
        for url in &fetch_urls {
            if let Some(id) = repo_name_from_remote_url(url)
                && !repository_ids.contains(&id)
            {
                repository_ids.push(id);
            }
        }
        RepositoryBinding {
            root,
            fetch_urls,
            repository_ids,
        }
    }
}

/// Fixed set of repositories, for tests and hosts that already know them.
#[derive(Clone, Debug, Default)]
pub struct StaticHost {
    repositories: Vec<(PathBuf, Vec<GitRemote>)>,
}

impl StaticHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repository(mut self, root: impl Into<PathBuf>, remotes: Vec<GitRemote>) -> Self {
        self.repositories.push((root.into(), remotes));
        self
    }
}

impl RepositoryHost for StaticHost {
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
