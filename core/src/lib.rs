//! Result aggregation, tree projection and location resolution for Zoekt
//! search results.
//!
//! The flat [`SearchResult`](zoekt_nav_protocol::SearchResult) returned by
//! the backend is owned by a [`ResultTree`], which projects it into a
//! three-level tree (summary, files, lines) and supports dismissing nodes
//! without re-running the search. Every file or line node can be turned into
//! an openable [`Location`] by the [`LocationResolver`].

mod config;
mod error;
mod location;
mod presentation;
mod remote_uri;
mod results;
mod scope;
mod state;
mod url_template;

pub use config::CONFIG_FILENAME;
pub use config::HOME_ENV_VAR;
pub use config::NavConfig;
pub use config::URL_ENV_VAR;
pub use config::detect_home;
pub use error::NavError;
pub use error::Result;
pub use location::Location;
pub use location::LocationResolver;
pub use location::MatchTarget;
pub use location::UrlTemplates;
pub use presentation::Collapsible;
pub use presentation::ELLIPSIS;
pub use presentation::HighlightedLabel;
pub use presentation::LOOKBEHIND_MARGIN;
pub use presentation::Selection;
pub use presentation::TreeCommand;
pub use presentation::TreeIcon;
pub use presentation::TreeItem;
pub use presentation::TreePresenter;
pub use presentation::decode_line;
pub use presentation::decode_text;
pub use presentation::trim_label;
pub use remote_uri::REMOTE_SCHEME;
pub use remote_uri::RemoteFile;
pub use results::FileNode;
pub use results::LineNode;
pub use results::NO_RESULTS_MESSAGE;
pub use results::NO_SEARCH_MESSAGE;
pub use results::ResultEntry;
pub use results::ResultTree;
pub use results::SearchResults;
pub use results::SearchTicket;
pub use results::SummaryEntry;
pub use results::WelcomeEntry;
pub use results::WelcomeKind;
pub use scope::build_scoped_query;
pub use scope::default_search_all_repos;
pub use state::CachedQuery;
pub use state::DEFAULT_HISTORY_LIMIT;
pub use state::STATE_FILENAME;
pub use state::StateStore;
pub use state::WorkspaceState;
pub use url_template::TemplateError;
pub use url_template::evaluate_commit_url_template;
pub use url_template::evaluate_file_url_template;
pub use url_template::evaluate_line_fragment;
