use serde::Deserialize;
use serde::Serialize;
use serde_with::DefaultOnNull;
use serde_with::serde_as;
use std::collections::HashMap;

/// Repository name -> URL template, as found in `RepoURLs` / `LineFragments`.
pub type RepoTemplates = HashMap<String, String>;

/// Identity of a file inside one response: `(repository, file name)`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileKey {
    pub repository: String,
    pub file_name: String,
}

impl FileKey {
    pub fn new(repository: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            file_name: file_name.into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct SearchOptions {
    pub chunk_matches: bool,
    pub num_context_lines: u32,
    pub max_doc_display_count: u32,
    pub max_match_display_count: u32,
    pub shard_max_match_count: u32,
    pub total_max_match_count: u32,
    #[serde(default)]
    pub whole: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            chunk_matches: false,
            num_context_lines: 0,
            max_doc_display_count: 100,
            max_match_display_count: 1000,
            shard_max_match_count: 10_000,
            total_max_match_count: 100_000,
            whole: false,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchRequest {
    #[serde(rename = "Q")]
    pub query: String,
    #[serde(rename = "Opts")]
    pub options: SearchOptions,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, options: SearchOptions) -> Self {
        Self {
            query: query.into(),
            options,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchResponse {
    #[serde(rename = "Result", default)]
    pub result: SearchResult,
}

#[serde_as]
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct SearchResult {
    /// Backend-side duration in nanoseconds (Go `time.Duration`).
    pub duration: u64,
    pub file_count: u64,
    pub match_count: u64,
    #[serde_as(as = "DefaultOnNull")]
    pub files: Vec<FileMatch>,
    #[serde(rename = "RepoURLs")]
    #[serde_as(as = "DefaultOnNull")]
    pub repo_urls: RepoTemplates,
    #[serde_as(as = "DefaultOnNull")]
    pub line_fragments: RepoTemplates,
}

impl SearchResult {
    pub fn duration_ms(&self) -> u64 {
        self.duration / 1_000_000
    }

    pub fn count_line_matches(&self) -> usize {
        self.files.iter().map(|file| file.line_matches.len()).sum()
    }

    pub fn find_file(&self, key: &FileKey) -> Option<&FileMatch> {
        self.files.iter().find(|file| file.matches_key(key))
    }

    pub fn find_file_mut(&mut self, key: &FileKey) -> Option<&mut FileMatch> {
        self.files.iter_mut().find(|file| file.matches_key(key))
    }

    /// Drops lines that only matched the file name and files left without lines.
    pub fn strip_filename_matches(&mut self) {
        for file in &mut self.files {
            file.line_matches.retain(|line| !line.is_filename_match());
        }
        self.files.retain(|file| !file.line_matches.is_empty());
    }

    /// Keeps one entry per line number: the one with the most fragments.
    pub fn collapse_duplicate_lines(&mut self) {
        for file in &mut self.files {
            file.collapse_duplicate_lines();
        }
    }

    pub fn normalize(&mut self) {
        self.strip_filename_matches();
        self.collapse_duplicate_lines();
    }
}

#[serde_as]
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct FileMatch {
    pub file_name: String,
    pub repository: String,
    #[serde_as(as = "DefaultOnNull")]
    pub branches: Vec<String>,
    pub version: String,
    /// Whole-file content, base64. Only present for `Whole` searches.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde_as(as = "DefaultOnNull")]
    pub line_matches: Vec<LineMatch>,
}

impl FileMatch {
    pub fn key(&self) -> FileKey {
        FileKey::new(self.repository.clone(), self.file_name.clone())
    }

    pub fn matches_key(&self, key: &FileKey) -> bool {
        self.repository == key.repository && self.file_name == key.file_name
    }

    pub fn primary_branch(&self) -> Option<&str> {
        self.branches.first().map(String::as_str)
    }

    fn collapse_duplicate_lines(&mut self) {
        let mut seen: HashMap<u32, usize> = HashMap::new();
        let mut kept: Vec<LineMatch> = Vec::with_capacity(self.line_matches.len());
        for line in self.line_matches.drain(..) {
            match seen.get(&line.line_number) {
                Some(&idx) => {
                    if line.line_fragments.len() > kept[idx].line_fragments.len() {
                        kept[idx] = line;
                    }
                }
                None => {
                    seen.insert(line.line_number, kept.len());
                    kept.push(line);
                }
            }
        }
        self.line_matches = kept;
    }
}

#[serde_as]
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct LineMatch {
    /// Full line content, base64.
    pub line: String,
    /// 1-based; 0 marks a match on the file name rather than its content.
    pub line_number: u32,
    /// Set by Zoekt when the match is in the file name.
    #[serde(rename = "FileName")]
    pub file_name_match: bool,
    #[serde_as(as = "DefaultOnNull")]
    pub line_fragments: Vec<LineFragment>,
}

impl LineMatch {
    pub fn is_filename_match(&self) -> bool {
        self.line_number == 0 || self.file_name_match
    }

    /// `(earliest fragment start, latest fragment end)` in decoded-line bytes.
    pub fn match_range(&self) -> Option<(usize, usize)> {
        let start = self.line_fragments.iter().map(|f| f.line_offset).min()?;
        let end = self
            .line_fragments
            .iter()
            .map(LineFragment::line_end)
            .max()?;
        Some((start, end))
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct LineFragment {
    /// Byte offset within the decoded line.
    pub line_offset: usize,
    /// Byte offset within the whole file.
    pub offset: usize,
    pub match_length: usize,
}

impl LineFragment {
    pub fn line_end(&self) -> usize {
        self.line_offset + self.match_length
    }
}
