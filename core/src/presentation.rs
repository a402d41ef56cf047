//! What a tree view needs to render each [`ResultEntry`].
//!
//! Decoding of the base64 line payloads happens here and only here, so the
//! offset arithmetic in [`trim_label`] works on plain text.

use crate::location::Location;
use crate::location::LocationResolver;
use crate::location::MatchTarget;
use crate::location::UrlTemplates;
use crate::results::FileNode;
use crate::results::LineNode;
use crate::results::ResultEntry;
use crate::results::SummaryEntry;
use crate::results::WelcomeEntry;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::warn;
use zoekt_nav_protocol::LineFragment;

/// Bytes of context kept before the first highlighted fragment.
pub const LOOKBEHIND_MARGIN: usize = 25;
pub const ELLIPSIS: &str = "...";

/// Decodes a base64 payload as lossy UTF-8. Invalid input yields "".
pub fn decode_text(encoded: &str) -> String {
    match STANDARD.decode(encoded) {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(err) => {
            warn!("invalid base64 payload from Zoekt: {err}");
            String::new()
        }
    }
}

pub fn decode_line(encoded: &str) -> String {
    let mut line = decode_text(encoded);
    line.truncate(line.trim_end().len());
    line
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HighlightedLabel {
    pub text: String,
    /// Half-open byte ranges into `text`.
    pub highlights: Vec<(usize, usize)>,
}

/// Cuts `decoded` to start [`LOOKBEHIND_MARGIN`] bytes before the earliest
/// fragment, prefixing [`ELLIPSIS`] when anything was cut, and moves every
/// fragment into the coordinates of the returned text.
pub fn trim_label(decoded: &str, fragments: &[LineFragment]) -> HighlightedLabel {
    let match_start = fragments
        .iter()
        .map(|fragment| fragment.line_offset)
        .min()
        .unwrap_or(0);
    let mut trim_start = match_start.saturating_sub(LOOKBEHIND_MARGIN).min(decoded.len());
    while !decoded.is_char_boundary(trim_start) {
        trim_start -= 1;
    }

    if trim_start == 0 {
        return HighlightedLabel {
            text: decoded.to_string(),
            highlights: fragments
                .iter()
                .map(|fragment| (fragment.line_offset, fragment.line_end()))
                .collect(),
        };
    }

    let text = format!("{ELLIPSIS}{}", &decoded[trim_start..]);
    // Every fragment starts at or after `trim_start`.
    let shift = |offset: usize| offset + ELLIPSIS.len() - trim_start;
    HighlightedLabel {
        text,
        highlights: fragments
            .iter()
            .map(|fragment| (shift(fragment.line_offset), shift(fragment.line_end())))
            .collect(),
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TreeIcon {
    Globe,
    Repo,
    Search,
    File,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collapsible {
    None,
    Expanded,
}

/// Zero-based editor range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    pub start_line: u32,
    pub start_character: usize,
    pub end_line: u32,
    pub end_character: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeCommand {
    Search {
        query: String,
        search_all_repos: bool,
    },
    Open {
        uri: String,
        selection: Option<Selection>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeItem {
    pub label: String,
    pub highlights: Vec<(usize, usize)>,
    pub description: Option<String>,
    pub tooltip: Option<String>,
    pub icon: Option<TreeIcon>,
    pub collapsible: Collapsible,
    pub context_value: &'static str,
    pub command: Option<TreeCommand>,
    /// Resolved target for file and line entries.
    pub location: Option<Location>,
}

impl TreeItem {
    fn new(label: impl Into<String>, context_value: &'static str) -> Self {
        Self {
            label: label.into(),
            highlights: Vec::new(),
            description: None,
            tooltip: None,
            icon: None,
            collapsible: Collapsible::None,
            context_value,
            command: None,
            location: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct TreePresenter {
    resolver: LocationResolver,
}

impl TreePresenter {
    pub fn new(resolver: LocationResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &LocationResolver {
        &self.resolver
    }

    pub async fn tree_item(&self, entry: &ResultEntry, templates: &UrlTemplates) -> TreeItem {
        match entry {
            ResultEntry::Summary(summary) => summary_item(summary),
            ResultEntry::Welcome(welcome) => welcome_item(*welcome),
            ResultEntry::File(node) => self.file_item(node, templates).await,
            ResultEntry::Line(node) => self.line_item(node, templates).await,
        }
    }

    /// `repo/path[:line]`, without the repository when it is checked out
    /// locally.
    pub fn display_file_name(
        &self,
        repository: &str,
        file_name: &str,
        line_number: Option<u32>,
    ) -> String {
        let mut name = if self.resolver.repositories().is_local(repository) {
            file_name.to_string()
        } else {
            format!("{repository}/{file_name}")
        };
        if let Some(line_number) = line_number {
            name.push_str(&format!(":{line_number}"));
        }
        name
    }

    async fn file_item(&self, node: &FileNode, templates: &UrlTemplates) -> TreeItem {
        let location = self
            .resolver
            .resolve(&MatchTarget::from(node), templates)
            .await;
        let directory = node
            .file
            .file_name
            .rsplit_once('/')
            .map(|(directory, _)| directory)
            .unwrap_or_default();

        let mut item = TreeItem::new(location.to_string(), "fileMatch");
        item.description = Some(directory.to_string());
        item.tooltip = Some(self.display_file_name(
            &node.file.repository,
            &node.file.file_name,
            None,
        ));
        item.icon = Some(TreeIcon::File);
        item.collapsible = Collapsible::Expanded;
        item.location = Some(location);
        item
    }

    async fn line_item(&self, node: &LineNode, templates: &UrlTemplates) -> TreeItem {
        let label = trim_label(&decode_line(&node.line.line), &node.line.line_fragments);
        let location = self
            .resolver
            .resolve(&MatchTarget::from(node), templates)
            .await;
        let selection = location.is_local_file().then(|| {
            let (start, end) = node.line.match_range().unwrap_or_default();
            let line = node.line.line_number.saturating_sub(1);
            Selection {
                start_line: line,
                start_character: start,
                end_line: line,
                end_character: end,
            }
        });

        let mut item = TreeItem::new(label.text, "lineMatch");
        item.highlights = label.highlights;
        item.tooltip = Some(self.display_file_name(
            &node.repository,
            &node.file_name,
            Some(node.line.line_number),
        ));
        item.command = Some(TreeCommand::Open {
            uri: location.uri(),
            selection,
        });
        item.location = Some(location);
        item
    }
}

fn summary_item(summary: &SummaryEntry) -> TreeItem {
    let stats = format!(
        "{} hits ({}ms)",
        summary.total_matches, summary.duration_ms
    );
    let mut item = TreeItem::new(summary.query.clone(), "summary");
    item.icon = Some(if summary.search_all_repos {
        TreeIcon::Globe
    } else {
        TreeIcon::Repo
    });
    item.tooltip = Some(format!("Results: {stats}"));
    item.description = Some(stats);
    item.command = Some(TreeCommand::Search {
        query: summary.query.clone(),
        search_all_repos: summary.search_all_repos,
    });
    item
}

fn welcome_item(welcome: WelcomeEntry) -> TreeItem {
    let mut item = TreeItem::new(welcome.message(), "welcome");
    item.icon = Some(TreeIcon::Search);
    item.command = Some(TreeCommand::Search {
        query: String::new(),
        search_all_repos: false,
    });
    item
}
