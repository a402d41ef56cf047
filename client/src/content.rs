use crate::error::ClientError;
use crate::transport::SearchTransport;
use thiserror::Error;
use tracing::debug;
use zoekt_nav_core::RemoteFile;
use zoekt_nav_core::decode_text;
use zoekt_nav_protocol::SearchOptions;
use zoekt_nav_protocol::SearchRequest;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("invalid zoekt-remote URI {0}; expected zoekt-remote://zoekt/<path>?repo=<repo>&branch=<branch>")]
    InvalidUri(String),

    #[error("file not found in Zoekt: {0}")]
    NotFound(String),

    #[error("file content is empty for {0}")]
    EmptyContent(String),

    #[error("error fetching content from Zoekt: {0}")]
    Transport(#[from] ClientError),
}

/// Query that returns exactly one file with its whole content.
pub fn fetch_file_request(repository: &str, file_name: &str, branch: Option<&str>) -> SearchRequest {
    let mut query = format!(
        "{} {}",
        anchored_term("r", repository),
        anchored_term("f", file_name)
    );
    if let Some(branch) = branch.filter(|branch| !branch.is_empty()) {
        query.push(' ');
        query.push_str(&anchored_term("b", branch));
    }
    let options = SearchOptions {
        whole: true,
        max_doc_display_count: 1,
        ..SearchOptions::default()
    };
    SearchRequest::new(query, options)
}

fn anchored_term(field: &str, value: &str) -> String {
    let pattern = format!("^{}$", regex::escape(value));
    if pattern.contains(|c: char| c.is_whitespace() || c == '"') {
        format!("{field}:\"{}\"", pattern.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        format!("{field}:{pattern}")
    }
}

/// Serves the text of `zoekt-remote://` documents.
#[derive(Clone, Debug)]
pub struct RemoteContentProvider<T> {
    transport: T,
}

impl<T: SearchTransport> RemoteContentProvider<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub async fn provide(&self, uri: &str) -> Result<String, ContentError> {
        let remote =
            RemoteFile::parse(uri).ok_or_else(|| ContentError::InvalidUri(uri.to_string()))?;
        self.fetch(&remote).await
    }

    pub async fn fetch(&self, remote: &RemoteFile) -> Result<String, ContentError> {
        let request = fetch_file_request(
            &remote.repository,
            &remote.file_name,
            remote.branch.as_deref(),
        );
        debug!("fetching {remote} with {:?}", request.query);
        let response = self.transport.search(&request).await?;
        let Some(file) = response.result.files.into_iter().next() else {
            return Err(ContentError::NotFound(remote.to_uri()));
        };
        match file.content.filter(|content| !content.is_empty()) {
            Some(content) => Ok(decode_text(&content)),
            None => Err(ContentError::EmptyContent(remote.to_uri())),
        }
    }
}
