use crate::location::UrlTemplates;
use tokio::sync::watch;
use tracing::debug;
use tracing::warn;
use zoekt_nav_protocol::FileKey;
use zoekt_nav_protocol::FileMatch;
use zoekt_nav_protocol::LineMatch;
use zoekt_nav_protocol::SearchResult;

pub const NO_SEARCH_MESSAGE: &str = "Start a Zoekt search to see results here.";
pub const NO_RESULTS_MESSAGE: &str = "Query had no results. Refine your search.";

/// A completed search, ready to be shown.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchResults {
    pub result: SearchResult,
    pub total_matches: usize,
    pub search_all_repos: bool,
    pub duration_ms: u64,
    pub query: String,
}

impl SearchResults {
    /// Normalizes `result` and counts the line matches that remain.
    pub fn new(mut result: SearchResult, search_all_repos: bool, query: impl Into<String>) -> Self {
        result.normalize();
        Self {
            total_matches: result.count_line_matches(),
            duration_ms: result.duration_ms(),
            result,
            search_all_repos,
            query: query.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SummaryEntry {
    pub query: String,
    pub total_matches: usize,
    pub duration_ms: u64,
    pub search_all_repos: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WelcomeKind {
    NoSearch,
    NoResults,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WelcomeEntry {
    pub kind: WelcomeKind,
}

impl WelcomeEntry {
    pub fn message(self) -> &'static str {
        match self.kind {
            WelcomeKind::NoSearch => NO_SEARCH_MESSAGE,
            WelcomeKind::NoResults => NO_RESULTS_MESSAGE,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileNode {
    pub file: FileMatch,
}

impl FileNode {
    pub fn key(&self) -> FileKey {
        self.file.key()
    }
}

/// A line match carrying its file's identity so it resolves on its own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineNode {
    pub repository: String,
    pub file_name: String,
    pub version: String,
    pub branches: Vec<String>,
    pub line: LineMatch,
}

impl LineNode {
    fn new(file: &FileMatch, line: &LineMatch) -> Self {
        Self {
            repository: file.repository.clone(),
            file_name: file.file_name.clone(),
            version: file.version.clone(),
            branches: file.branches.clone(),
            line: line.clone(),
        }
    }

    pub fn file_key(&self) -> FileKey {
        FileKey::new(&self.repository, &self.file_name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResultEntry {
    Summary(SummaryEntry),
    Welcome(WelcomeEntry),
    File(FileNode),
    Line(LineNode),
}

/// Issued by [`ResultTree::begin_search`]; only the newest ticket may
/// complete.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchTicket {
    generation: u64,
}

impl SearchTicket {
    pub fn generation(self) -> u64 {
        self.generation
    }
}

/// The current result set and its tree projection.
///
/// Entries handed out by [`root_entries`](Self::root_entries) and
/// [`children`](Self::children) are snapshots; mutations go through
/// [`dismiss`](Self::dismiss) and are announced on the revision channel
/// returned by [`subscribe`](Self::subscribe).
#[derive(Debug)]
pub struct ResultTree {
    result: Option<SearchResult>,
    total_matches: usize,
    search_all_repos: bool,
    duration_ms: u64,
    query: String,
    has_searched: bool,
    generation: u64,
    revision: watch::Sender<u64>,
}

impl Default for ResultTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultTree {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            result: None,
            total_matches: 0,
            search_all_repos: false,
            duration_ms: 0,
            query: String::new(),
            has_searched: false,
            generation: 0,
            revision,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    pub fn begin_search(&mut self) -> SearchTicket {
        self.generation += 1;
        SearchTicket {
            generation: self.generation,
        }
    }

    /// Applies `results` if `ticket` is still current. Returns `false` and
    /// leaves the tree untouched for a superseded ticket.
    pub fn complete_search(&mut self, ticket: SearchTicket, results: SearchResults) -> bool {
        if ticket.generation != self.generation {
            debug!(
                "discarding stale results for {:?} (generation {} < {})",
                results.query, ticket.generation, self.generation
            );
            return false;
        }
        self.apply(results);
        true
    }

    /// Replaces the current state unconditionally; outstanding tickets become
    /// stale.
    pub fn set_results(&mut self, results: SearchResults) {
        self.generation += 1;
        self.apply(results);
    }

    fn apply(&mut self, results: SearchResults) {
        let SearchResults {
            mut result,
            total_matches,
            search_all_repos,
            duration_ms,
            query,
        } = results;
        result.normalize();
        let counted = result.count_line_matches();
        if counted != total_matches {
            warn!("match count {total_matches} does not match {counted} listed lines; using {counted}");
        }

        self.result = Some(result);
        self.total_matches = counted;
        self.search_all_repos = search_all_repos;
        self.duration_ms = duration_ms;
        self.query = query;
        self.has_searched = true;
        self.invalidate();
    }

    pub fn root_entries(&self) -> Vec<ResultEntry> {
        let files = self.files();
        if files.is_empty() && self.total_matches == 0 {
            let kind = if self.has_searched {
                WelcomeKind::NoResults
            } else {
                WelcomeKind::NoSearch
            };
            return vec![ResultEntry::Welcome(WelcomeEntry { kind })];
        }

        let mut entries = Vec::with_capacity(files.len() + 1);
        entries.push(ResultEntry::Summary(self.summary()));
        entries.extend(
            files
                .iter()
                .map(|file| ResultEntry::File(FileNode { file: file.clone() })),
        );
        entries
    }

    pub fn children(&self, entry: &ResultEntry) -> Vec<ResultEntry> {
        let ResultEntry::File(node) = entry else {
            return Vec::new();
        };
        let Some(file) = self.find_file(&node.key()) else {
            return Vec::new();
        };
        file.line_matches
            .iter()
            .map(|line| ResultEntry::Line(LineNode::new(file, line)))
            .collect()
    }

    /// Removes a file, or a single line; a file left without lines goes too.
    pub fn dismiss(&mut self, entry: &ResultEntry) {
        if let Some(result) = self.result.as_mut() {
            match entry {
                ResultEntry::File(node) => {
                    let key = node.key();
                    result.files.retain(|file| !file.matches_key(&key));
                }
                ResultEntry::Line(node) => {
                    let key = node.file_key();
                    if let Some(file) = result.find_file_mut(&key) {
                        file.line_matches
                            .retain(|line| line.line_number != node.line.line_number);
                        if file.line_matches.is_empty() {
                            result.files.retain(|file| !file.matches_key(&key));
                        }
                    }
                }
                ResultEntry::Summary(_) | ResultEntry::Welcome(_) => {}
            }
        }
        self.total_matches = self
            .result
            .as_ref()
            .map(SearchResult::count_line_matches)
            .unwrap_or_default();
        self.invalidate();
    }

    pub fn dismiss_all(&mut self) {
        self.generation += 1;
        self.result = None;
        self.total_matches = 0;
        self.duration_ms = 0;
        self.query.clear();
        self.has_searched = false;
        self.invalidate();
    }

    pub fn summary(&self) -> SummaryEntry {
        SummaryEntry {
            query: self.query.clone(),
            total_matches: self.total_matches,
            duration_ms: self.duration_ms,
            search_all_repos: self.search_all_repos,
        }
    }

    pub fn result(&self) -> Option<&SearchResult> {
        self.result.as_ref()
    }

    pub fn files(&self) -> &[FileMatch] {
        self.result
            .as_ref()
            .map(|result| result.files.as_slice())
            .unwrap_or_default()
    }

    pub fn find_file(&self, key: &FileKey) -> Option<&FileMatch> {
        self.result.as_ref()?.find_file(key)
    }

    pub fn templates(&self) -> UrlTemplates {
        self.result
            .as_ref()
            .map(UrlTemplates::from_result)
            .unwrap_or_default()
    }

    pub fn total_matches(&self) -> usize {
        self.total_matches
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn search_all_repos(&self) -> bool {
        self.search_all_repos
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn has_searched(&self) -> bool {
        self.has_searched
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn invalidate(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}
