use crate::error::NavError;
use crate::error::Result;
use blake3::Hasher;
use dunce::canonicalize;
use serde::Deserialize;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

pub const STATE_FILENAME: &str = "state.json";
pub const DEFAULT_HISTORY_LIMIT: usize = 10;
const WORKSPACES_DIR: &str = "workspaces";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CachedQuery {
    pub query: String,
    pub hits: usize,
    pub duration_ms: u64,
    pub search_all_repos: bool,
}

/// Everything persisted for one workspace.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkspaceState {
    #[serde(rename = "zoekt.queryHistory", default)]
    pub query_history: Vec<CachedQuery>,
    #[serde(rename = "zoekt.lastQuery", default)]
    pub last_query: Option<String>,
    #[serde(rename = "zoekt.searchAllRepos", default)]
    pub search_all_repos: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
    limit: usize,
}

impl StateStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    /// Store at `<home>/workspaces/<hash of workspace_root>/state.json`.
    pub fn for_workspace(home: &Path, workspace_root: &Path) -> Result<Self> {
        let hash = hash_workspace_root(workspace_root)?;
        Ok(Self::new(
            home.join(WORKSPACES_DIR).join(hash).join(STATE_FILENAME),
        ))
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Puts `entry` first, dropping older entries for the same query text.
    pub fn record_query(&self, entry: CachedQuery) -> Result<()> {
        let mut state = self.load()?;
        state
            .query_history
            .retain(|existing| existing.query != entry.query);
        state.last_query = Some(entry.query.clone());
        state.search_all_repos = Some(entry.search_all_repos);
        state.query_history.insert(0, entry);
        state.query_history.truncate(self.limit);
        self.save(&state)
    }

    pub fn history(&self) -> Result<Vec<CachedQuery>> {
        Ok(self.load()?.query_history)
    }

    pub fn last_query(&self) -> Result<Option<String>> {
        Ok(self.load()?.last_query)
    }

    pub fn last_search_all_repos(&self) -> Result<Option<bool>> {
        Ok(self.load()?.search_all_repos)
    }

    pub fn set_search_all_repos(&self, search_all_repos: bool) -> Result<()> {
        let mut state = self.load()?;
        state.search_all_repos = Some(search_all_repos);
        self.save(&state)
    }

    pub fn load(&self) -> Result<WorkspaceState> {
        match fs::read(&self.path) {
            Ok(data) => serde_json::from_slice(&data).map_err(|source| NavError::ParseState {
                path: self.path.clone(),
                source,
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Ok(WorkspaceState::default())
            }
            Err(err) => Err(NavError::read(&self.path, err)),
        }
    }

    fn save(&self, state: &WorkspaceState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|err| NavError::write(parent, err))?;
        }
        let data = serde_json::to_vec_pretty(state).map_err(NavError::SerializeState)?;
        fs::write(&self.path, data).map_err(|err| NavError::write(&self.path, err))
    }
}

fn hash_workspace_root(root: &Path) -> Result<String> {
    let canonical = canonicalize(root).map_err(|err| NavError::read(root, err))?;
    let mut hasher = Hasher::new();
    hasher.update(canonical.to_string_lossy().as_bytes());
    let digest = hasher.finalize();
    let mut short = String::with_capacity(16);
    for byte in digest.as_bytes().iter().take(8) {
        let _ = write!(&mut short, "{byte:02x}");
    }
    Ok(short)
}
