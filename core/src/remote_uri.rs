use crate::url_template::URI_COMPONENT;
use percent_encoding::percent_decode_str;
use percent_encoding::utf8_percent_encode;
use std::borrow::Cow;
use std::fmt;
use url::Url;
use url::form_urlencoded;

pub const REMOTE_SCHEME: &str = "zoekt-remote";
const REMOTE_AUTHORITY: &str = "zoekt";

/// A file that only exists in the Zoekt index, addressed by a
/// `zoekt-remote://zoekt/<path>?repo=<id>&version=..&branch=..&line=..` URI.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RemoteFile {
    pub repository: String,
    pub file_name: String,
    pub version: Option<String>,
    pub branch: Option<String>,
    /// 1-based.
    pub line_number: Option<u32>,
}

impl RemoteFile {
    pub fn new(repository: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            file_name: file_name.into(),
            version: None,
            branch: None,
            line_number: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_line(mut self, line_number: u32) -> Self {
        self.line_number = Some(line_number);
        self
    }

    pub fn to_uri(&self) -> String {
        let path = self
            .file_name
            .split('/')
            .map(|segment| utf8_percent_encode(segment, URI_COMPONENT).to_string())
            .collect::<Vec<_>>()
            .join("/");

        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("repo", &self.repository);
        if let Some(version) = &self.version {
            query.append_pair("version", version);
        }
        if let Some(branch) = &self.branch {
            query.append_pair("branch", branch);
        }
        if let Some(line_number) = self.line_number {
            query.append_pair("line", &line_number.to_string());
        }

        format!(
            "{REMOTE_SCHEME}://{REMOTE_AUTHORITY}/{path}?{}",
            query.finish()
        )
    }

    /// Returns `None` for anything that is not a well-formed remote URI.
    pub fn parse(uri: &str) -> Option<Self> {
        let url = Url::parse(uri).ok()?;
        if url.scheme() != REMOTE_SCHEME {
            return None;
        }

        let encoded = url.path().strip_prefix('/').unwrap_or(url.path());
        let segments = encoded
            .split('/')
            .map(|segment| {
                percent_decode_str(segment)
                    .decode_utf8()
                    .ok()
                    .map(Cow::into_owned)
            })
            .collect::<Option<Vec<_>>>()?;
        let file_name = segments.join("/");
        if file_name.is_empty() {
            return None;
        }

        let mut repository = None;
        let mut version = None;
        let mut branch = None;
        let mut line_number = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "repo" => repository = Some(value.into_owned()),
                "version" => version = Some(value.into_owned()),
                "branch" => branch = Some(value.into_owned()),
                "line" => {
                    let line = value.parse::<u32>().ok().filter(|line| *line > 0)?;
                    line_number = Some(line);
                }
                _ => {}
            }
        }
        let repository = repository.filter(|repo| !repo.is_empty())?;

        Some(Self {
            repository,
            file_name,
            version,
            branch,
            line_number,
        })
    }
}

impl fmt::Display for RemoteFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uri())
    }
}
