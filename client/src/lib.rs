//! Talks to a Zoekt web server: runs searches into a shared result tree and
//! serves the content of `zoekt-remote://` documents.

mod content;
mod error;
mod session;
mod transport;

pub use content::ContentError;
pub use content::RemoteContentProvider;
pub use content::fetch_file_request;
pub use error::ClientError;
pub use error::Result;
pub use session::SearchSession;
pub use transport::SearchTransport;
pub use transport::ZoektClient;
