use crate::error::ClientError;
use crate::error::Result;
use crate::transport::SearchTransport;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use tracing::info;
use tracing::warn;
use zoekt_nav_core::CachedQuery;
use zoekt_nav_core::NavConfig;
use zoekt_nav_core::ResultEntry;
use zoekt_nav_core::ResultTree;
use zoekt_nav_core::SearchResults;
use zoekt_nav_core::StateStore;
use zoekt_nav_core::build_scoped_query;
use zoekt_nav_core::default_search_all_repos;
use zoekt_nav_git::RepositoryResolver;
use zoekt_nav_protocol::SearchRequest;

/// Runs searches against a transport and feeds the shared [`ResultTree`].
pub struct SearchSession<T> {
    config: NavConfig,
    transport: T,
    repositories: RepositoryResolver,
    tree: Arc<Mutex<ResultTree>>,
    state: Option<StateStore>,
}

impl<T: SearchTransport> SearchSession<T> {
    pub fn new(config: NavConfig, transport: T, repositories: RepositoryResolver) -> Self {
        Self {
            config,
            transport,
            repositories,
            tree: Arc::new(Mutex::new(ResultTree::new())),
            state: None,
        }
    }

    pub fn with_state(mut self, state: StateStore) -> Self {
        self.state = Some(state.with_limit(self.config.history_limit));
        self
    }

    pub fn tree(&self) -> Arc<Mutex<ResultTree>> {
        Arc::clone(&self.tree)
    }

    pub fn state(&self) -> Option<&StateStore> {
        self.state.as_ref()
    }

    pub fn repositories(&self) -> &RepositoryResolver {
        &self.repositories
    }

    /// Scope to use when the caller has not chosen one.
    pub fn default_search_all_repos(&self) -> bool {
        let persisted = self.state.as_ref().and_then(|state| {
            state
                .last_search_all_repos()
                .inspect_err(|err| warn!("ignoring persisted scope: {err}"))
                .ok()
                .flatten()
        });
        default_search_all_repos(&self.repositories, persisted)
    }

    pub fn last_query(&self) -> Option<String> {
        self.state.as_ref().and_then(|state| {
            state
                .last_query()
                .inspect_err(|err| warn!("ignoring persisted query: {err}"))
                .ok()
                .flatten()
        })
    }

    /// Runs `query` and shows its results.
    ///
    /// On a transport error the tree keeps its previous contents. Returns
    /// `Ok(None)` when a newer search or a dismiss-all superseded this one
    /// while the request was in flight.
    pub async fn search(&self, query: &str, search_all_repos: bool) -> Result<Option<SearchResults>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ClientError::EmptyQuery);
        }

        let scoped = if search_all_repos {
            query.to_string()
        } else {
            build_scoped_query(query, self.repositories.list_local_repository_ids())
        };
        let ticket = self.tree.lock().await.begin_search();
        let request = SearchRequest::new(scoped, self.config.search_options());

        let response = self.transport.search(&request).await.inspect_err(|err| {
            warn!("search for {query:?} failed: {err}");
        })?;
        let results = SearchResults::new(response.result, search_all_repos, query);
        info!(
            "{query:?}: {} matches in {} files ({}ms)",
            results.total_matches,
            results.result.files.len(),
            results.duration_ms
        );

        if !self.tree.lock().await.complete_search(ticket, results.clone()) {
            debug!("results for {query:?} arrived after a newer search");
            return Ok(None);
        }

        // Only the search on screen becomes the last query.
        if let Some(state) = &self.state
            && let Err(err) = state.record_query(CachedQuery {
                query: query.to_string(),
                hits: results.total_matches,
                duration_ms: results.duration_ms,
                search_all_repos,
            })
        {
            warn!("failed to persist query history: {err}");
        }
        Ok(Some(results))
    }

    pub async fn dismiss(&self, entry: &ResultEntry) {
        self.tree.lock().await.dismiss(entry);
    }

    pub async fn dismiss_all(&self) {
        self.tree.lock().await.dismiss_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;
    use std::sync::Mutex as StdMutex;
    use tempfile::tempdir;
    use tokio::sync::Notify;
    use zoekt_nav_git::GitRemote;
    use zoekt_nav_git::StaticHost;
    use zoekt_nav_protocol::FileMatch;
    use zoekt_nav_protocol::LineFragment;
    use zoekt_nav_protocol::LineMatch;
    use zoekt_nav_protocol::SearchResponse;
    use zoekt_nav_protocol::SearchResult;

    fn response(file_name: &str, line_numbers: &[u32]) -> SearchResponse {
        let line_matches = line_numbers
            .iter()
            .map(|&line_number| LineMatch {
                line: STANDARD.encode("needle"),
                line_number,
                file_name_match: false,
                line_fragments: vec![LineFragment {
                    line_offset: 0,
                    offset: 0,
                    match_length: 6,
                }],
            })
            .collect();
        SearchResponse {
            result: SearchResult {
                duration: 2_000_000,
                files: vec![FileMatch {
                    file_name: file_name.to_string(),
                    repository: "github.com/acme/web".to_string(),
                    branches: vec!["main".to_string()],
                    version: "v1".to_string(),
                    content: None,
                    line_matches,
                }],
                ..Default::default()
            },
        }
    }

    /// Replies with a fixed response, or a 502 when `fail` is set.
    #[derive(Default)]
    struct FakeTransport {
        fail: bool,
        requests: StdMutex<Vec<String>>,
    }

    #[async_trait]
    impl SearchTransport for FakeTransport {
        async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
            self.requests.lock().unwrap().push(request.query.clone());
            if self.fail {
                return Err(ClientError::Status {
                    status: StatusCode::BAD_GATEWAY,
                    body: "down".to_string(),
                });
            }
            Ok(response("src/a.rs", &[0, 3, 3, 8]))
        }
    }

    fn local_resolver() -> RepositoryResolver {
        RepositoryResolver::new(Arc::new(StaticHost::new().with_repository(
            "/src/web",
            vec![
                GitRemote::new("origin", "git@github.com:acme/web.git"),
                GitRemote::new("fork", "https://github.com/me/web.git"),
            ],
        )))
    }

    fn empty_resolver() -> RepositoryResolver {
        RepositoryResolver::new(Arc::new(StaticHost::new()))
    }

    #[tokio::test]
    async fn search_populates_tree_and_history() {
        let dir = tempdir().unwrap();
        let session = SearchSession::new(
            NavConfig::default(),
            Arc::new(FakeTransport::default()),
            empty_resolver(),
        )
        .with_state(StateStore::new(dir.path().join("state.json")));

        let results = session.search("  needle ", true).await.unwrap().unwrap();
        assert_eq!(results.total_matches, 2);
        assert_eq!(results.query, "needle");

        let tree = session.tree();
        let tree = tree.lock().await;
        assert_eq!(tree.total_matches(), 2);
        assert_eq!(tree.duration_ms(), 2);
        assert!(tree.search_all_repos());

        assert_eq!(
            session.state().unwrap().history().unwrap(),
            vec![CachedQuery {
                query: "needle".to_string(),
                hits: 2,
                duration_ms: 2,
                search_all_repos: true,
            }]
        );
        assert_eq!(session.last_query().as_deref(), Some("needle"));
    }

    #[tokio::test]
    async fn local_scope_appends_repository_terms() {
        let transport = Arc::new(FakeTransport::default());
        let session = SearchSession::new(NavConfig::default(), Arc::clone(&transport), local_resolver());

        session.search("needle", false).await.unwrap();
        session.search("needle", true).await.unwrap();
        assert_eq!(
            *transport.requests.lock().unwrap(),
            vec![
                "(needle) (repo:github.com/acme/web or repo:github.com/me/web)".to_string(),
                "needle".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn transport_error_keeps_previous_results() {
        let session = SearchSession::new(
            NavConfig::default(),
            FakeTransport::default(),
            empty_resolver(),
        );
        session.search("needle", true).await.unwrap();

        let failing = SearchSession {
            transport: FakeTransport {
                fail: true,
                ..Default::default()
            },
            ..session
        };
        let err = failing.search("other", true).await.unwrap_err();
        assert!(matches!(err, ClientError::Status { .. }));

        let tree = failing.tree();
        let tree = tree.lock().await;
        assert_eq!(tree.query(), "needle");
        assert_eq!(tree.total_matches(), 2);
    }

    #[tokio::test]
    async fn empty_query_is_rejected_without_touching_the_tree() {
        let session = SearchSession::new(
            NavConfig::default(),
            FakeTransport::default(),
            empty_resolver(),
        );
        assert!(matches!(
            session.search("   ", true).await,
            Err(ClientError::EmptyQuery)
        ));
        assert!(!session.tree().lock().await.has_searched());
    }

    #[tokio::test]
    async fn default_scope_follows_local_repositories_and_state() {
        let dir = tempdir().unwrap();
        let store = StateStore::new(dir.path().join("state.json"));

        let no_repos = SearchSession::new(
            NavConfig::default(),
            FakeTransport::default(),
            empty_resolver(),
        );
        assert!(no_repos.default_search_all_repos());

        let with_repos = SearchSession::new(
            NavConfig::default(),
            FakeTransport::default(),
            local_resolver(),
        )
        .with_state(store.clone());
        assert!(!with_repos.default_search_all_repos());
        store.set_search_all_repos(true).unwrap();
        assert!(with_repos.default_search_all_repos());
    }

    /// Holds "slow" queries until released.
    struct GatedTransport {
        started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl SearchTransport for GatedTransport {
        async fn search(&self, request: &SearchRequest) -> Result<SearchResponse> {
            if request.query == "slow" {
                self.started.notify_one();
                self.release.notified().await;
                return Ok(response("slow.rs", &[1]));
            }
            Ok(response("fast.rs", &[1, 2]))
        }
    }

    #[tokio::test]
    async fn late_response_is_discarded() {
        let dir = tempdir().unwrap();
        let transport = Arc::new(GatedTransport {
            started: Notify::new(),
            release: Notify::new(),
        });
        let session = Arc::new(
            SearchSession::new(
                NavConfig::default(),
                Arc::clone(&transport),
                empty_resolver(),
            )
            .with_state(StateStore::new(dir.path().join("state.json"))),
        );

        let slow = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.search("slow", true).await }
        });
        transport.started.notified().await;

        assert!(session.search("fast", true).await.unwrap().is_some());
        transport.release.notify_one();
        assert!(slow.await.unwrap().unwrap().is_none());

        let tree = session.tree();
        let tree = tree.lock().await;
        assert_eq!(tree.query(), "fast");
        assert_eq!(tree.files()[0].file_name, "fast.rs");

        assert_eq!(session.last_query().as_deref(), Some("fast"));
        let history: Vec<String> = session
            .state()
            .unwrap()
            .history()
            .unwrap()
            .into_iter()
            .map(|entry| entry.query)
            .collect();
        assert_eq!(history, vec!["fast".to_string()]);
    }
}
