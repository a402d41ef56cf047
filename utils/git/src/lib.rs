//! Maps Zoekt repository names (`host/owner/repo`) to locally checked-out
//! git repositories.

mod cli_host;
mod remote;
mod resolver;

pub use cli_host::GitCliHost;
pub use remote::repo_name_from_remote_url;
pub use resolver::GitRemote;
pub use resolver::RepositoryBinding;
pub use resolver::RepositoryHost;
pub use resolver::RepositoryResolver;
pub use resolver::StaticHost;
