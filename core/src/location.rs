use crate::remote_uri::RemoteFile;
use crate::results::FileNode;
use crate::results::LineNode;
use crate::url_template::evaluate_file_url_template;
use std::fmt;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use tracing::debug;
use tracing::warn;
use url::Url;
use zoekt_nav_git::RepositoryResolver;
use zoekt_nav_protocol::RepoTemplates;
use zoekt_nav_protocol::SearchResult;

/// Where a file or line match can be opened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Location {
    /// The match's repository is checked out locally; `path` is under `root`.
    SiblingRepoFile { root: PathBuf, path: PathBuf },
    /// A file with the same relative path exists in a workspace folder. The
    /// content is not checked against the indexed version.
    LocalFile(PathBuf),
    WebUrl(String),
    SyntheticRemote(RemoteFile),
}

impl Location {
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            Location::SiblingRepoFile { path, .. } => Some(path),
            Location::LocalFile(path) => Some(path),
            Location::WebUrl(_) | Location::SyntheticRemote(_) => None,
        }
    }

    pub fn is_local_file(&self) -> bool {
        self.local_path().is_some()
    }

    pub fn uri(&self) -> String {
        match self {
            Location::SiblingRepoFile { path, .. } | Location::LocalFile(path) => {
                Url::from_file_path(path)
                    .map(String::from)
                    .unwrap_or_else(|()| path.display().to_string())
            }
            Location::WebUrl(url) => url.clone(),
            Location::SyntheticRemote(remote) => remote.to_uri(),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.local_path() {
            Some(path) => write!(f, "{}", path.display()),
            None => f.write_str(&self.uri()),
        }
    }
}

/// The fields of a file or line node that resolution needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchTarget {
    pub repository: String,
    pub file_name: String,
    pub version: String,
    pub branches: Vec<String>,
    pub line_number: Option<u32>,
}

impl MatchTarget {
    pub fn primary_branch(&self) -> Option<&str> {
        self.branches.first().map(String::as_str)
    }

    pub fn remote_file(&self) -> RemoteFile {
        let mut remote = RemoteFile::new(&self.repository, &self.file_name);
        if !self.version.is_empty() {
            remote = remote.with_version(&self.version);
        }
        if let Some(branch) = self.primary_branch() {
            remote = remote.with_branch(branch);
        }
        if let Some(line_number) = self.line_number.filter(|line| *line > 0) {
            remote = remote.with_line(line_number);
        }
        remote
    }
}

impl From<&FileNode> for MatchTarget {
    fn from(node: &FileNode) -> Self {
        Self {
            repository: node.file.repository.clone(),
            file_name: node.file.file_name.clone(),
            version: node.file.version.clone(),
            branches: node.file.branches.clone(),
            line_number: None,
        }
    }
}

impl From<&LineNode> for MatchTarget {
    fn from(node: &LineNode) -> Self {
        Self {
            repository: node.repository.clone(),
            file_name: node.file_name.clone(),
            version: node.version.clone(),
            branches: node.branches.clone(),
            line_number: Some(node.line.line_number),
        }
    }
}

/// Per-repository URL templates carried by a search response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UrlTemplates {
    pub file_urls: RepoTemplates,
    pub line_fragments: RepoTemplates,
}

impl UrlTemplates {
    pub fn from_result(result: &SearchResult) -> Self {
        Self {
            file_urls: result.repo_urls.clone(),
            line_fragments: result.line_fragments.clone(),
        }
    }

    fn web_url(&self, target: &MatchTarget) -> Option<String> {
        let template = self.file_urls.get(&target.repository)?;
        let line_fragment = target.line_number.and_then(|line_number| {
            self.line_fragments
                .get(&target.repository)
                .map(|fragment| (fragment.as_str(), line_number))
        });
        match evaluate_file_url_template(template, &target.version, &target.file_name, line_fragment)
        {
            Ok(url) => Some(url),
            Err(err) => {
                warn!(
                    "ignoring URL template for {}: {err}",
                    target.repository
                );
                None
            }
        }
    }
}

/// Turns matches into openable locations.
///
/// Precedence, first hit wins: a local checkout of the match's repository, a
/// same-named file in a workspace folder, the repository's URL template, and
/// finally a synthetic remote document.
#[derive(Clone, Debug)]
pub struct LocationResolver {
    repositories: RepositoryResolver,
    workspace_folders: Vec<PathBuf>,
}

impl LocationResolver {
    pub fn new(repositories: RepositoryResolver, workspace_folders: Vec<PathBuf>) -> Self {
        Self {
            repositories,
            workspace_folders,
        }
    }

    pub fn repositories(&self) -> &RepositoryResolver {
        &self.repositories
    }

    pub fn workspace_folders(&self) -> &[PathBuf] {
        &self.workspace_folders
    }

    pub async fn resolve(&self, target: &MatchTarget, templates: &UrlTemplates) -> Location {
        let relative = relative_path(&target.file_name);

        if let Some(binding) = self.repositories.find_local_repository(&target.repository) {
            let path = binding.root.join(relative);
            return Location::SiblingRepoFile {
                root: binding.root,
                path,
            };
        }

        if let Some(path) = self.find_in_workspace(relative).await {
            return Location::LocalFile(path);
        }

        if let Some(url) = templates.web_url(target) {
            return Location::WebUrl(url);
        }

        Location::SyntheticRemote(target.remote_file())
    }

    async fn find_in_workspace(&self, relative: &Path) -> Option<PathBuf> {
        // A name that climbs out with `..` never maps into a workspace folder.
        if relative
            .components()
            .any(|component| matches!(component, Component::ParentDir))
        {
            return None;
        }
        for folder in &self.workspace_folders {
            let candidate = folder.join(relative);
            match tokio::fs::try_exists(&candidate).await {
                Ok(true) => return Some(candidate),
                Ok(false) => {}
                Err(err) => debug!("cannot probe {}: {err}", candidate.display()),
            }
        }
        None
    }
}

fn relative_path(file_name: &str) -> &Path {
    Path::new(file_name.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tempfile::tempdir;
    use zoekt_nav_git::GitRemote;
    use zoekt_nav_git::StaticHost;

    fn target(repository: &str, file_name: &str, line_number: Option<u32>) -> MatchTarget {
        MatchTarget {
            repository: repository.to_string(),
            file_name: file_name.to_string(),
            version: "abc123".to_string(),
            branches: vec!["main".to_string(), "dev".to_string()],
            line_number,
        }
    }

    fn templates() -> UrlTemplates {
        UrlTemplates {
            file_urls: RepoTemplates::from([(
                "github.com/acme/web".to_string(),
                "https://github.com/acme/web/blob/{{.Version}}/{{.Path}}".to_string(),
            )]),
            line_fragments: RepoTemplates::from([(
                "github.com/acme/web".to_string(),
                "#L{{.LineNumber}}".to_string(),
            )]),
        }
    }

    fn resolver(host: StaticHost, folders: Vec<PathBuf>) -> LocationResolver {
        LocationResolver::new(RepositoryResolver::new(Arc::new(host)), folders)
    }

    #[tokio::test]
    async fn local_repository_wins_over_everything() {
        let workspace = tempdir().unwrap();
        std::fs::write(workspace.path().join("README.md"), "hi").unwrap();
        let host = StaticHost::new().with_repository(
            "/src/web",
            vec![GitRemote::new("origin", "git@github.com:acme/web.git")],
        );
        let resolver = resolver(host, vec![workspace.path().to_path_buf()]);

        let location = resolver
            .resolve(&target("github.com/acme/web", "README.md", None), &templates())
            .await;
        assert_eq!(
            location,
            Location::SiblingRepoFile {
                root: PathBuf::from("/src/web"),
                path: PathBuf::from("/src/web/README.md"),
            }
        );
        assert!(location.is_local_file());
    }

    #[tokio::test]
    async fn workspace_file_is_used_when_repository_is_not_open() {
        let workspace = tempdir().unwrap();
        std::fs::create_dir_all(workspace.path().join("src")).unwrap();
        std::fs::write(workspace.path().join("src/lib.rs"), "").unwrap();
        let resolver = resolver(StaticHost::new(), vec![workspace.path().to_path_buf()]);

        let location = resolver
            .resolve(&target("github.com/acme/web", "src/lib.rs", Some(3)), &templates())
            .await;
        assert_eq!(
            location,
            Location::LocalFile(workspace.path().join("src/lib.rs"))
        );
        assert!(location.uri().starts_with("file://"));
    }

    #[tokio::test]
    async fn parent_dir_names_skip_workspace_folders() {
        let root = tempdir().unwrap();
        let workspace = root.path().join("workspace");
        std::fs::create_dir_all(&workspace).unwrap();
        std::fs::write(root.path().join("secret.txt"), "").unwrap();
        let resolver = resolver(StaticHost::new(), vec![workspace]);

        let location = resolver
            .resolve(
                &target("gitlab.com/other/repo", "../secret.txt", None),
                &templates(),
            )
            .await;
        assert!(matches!(location, Location::SyntheticRemote(_)));
    }

    #[tokio::test]
    async fn template_adds_line_fragment_only_for_lines() {
        let resolver = resolver(StaticHost::new(), Vec::new());

        let line = resolver
            .resolve(&target("github.com/acme/web", "src/lib.rs", Some(7)), &templates())
            .await;
        assert_eq!(
            line,
            Location::WebUrl("https://github.com/acme/web/blob/abc123/src/lib.rs#L7".to_string())
        );

        let file = resolver
            .resolve(&target("github.com/acme/web", "src/lib.rs", None), &templates())
            .await;
        assert_eq!(
            file,
            Location::WebUrl("https://github.com/acme/web/blob/abc123/src/lib.rs".to_string())
        );
    }

    #[tokio::test]
    async fn falls_back_to_synthetic_remote() {
        let resolver = resolver(StaticHost::new(), Vec::new());
        let location = resolver
            .resolve(&target("gitlab.com/other/repo", "a.txt", Some(2)), &templates())
            .await;
        assert_eq!(
            location,
            Location::SyntheticRemote(
                RemoteFile::new("gitlab.com/other/repo", "a.txt")
                    .with_version("abc123")
                    .with_branch("main")
                    .with_line(2)
            )
        );
        assert!(!location.is_local_file());
    }

    #[tokio::test]
    async fn broken_template_degrades_to_synthetic_remote() {
        let resolver = resolver(StaticHost::new(), Vec::new());
        let templates = UrlTemplates {
            file_urls: RepoTemplates::from([(
                "github.com/acme/web".to_string(),
                r#"{{URLJoinPath "https://github.com .Path}}"#.to_string(),
            )]),
            line_fragments: RepoTemplates::new(),
        };
        let location = resolver
            .resolve(&target("github.com/acme/web", "a.txt", None), &templates)
            .await;
        assert!(matches!(location, Location::SyntheticRemote(_)));
    }
}
