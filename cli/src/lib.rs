mod context;
mod history_cmd;
mod open_cmd;
mod render;
mod search_cmd;

use anyhow::Result;
use clap::Parser;
use clap::Subcommand;

pub use context::CommonArgs;
pub use context::NavContext;
pub use history_cmd::HistoryArgs;
pub use open_cmd::OpenArgs;
pub use search_cmd::SearchArgs;

/// Navigate Zoekt search results from the terminal.
#[derive(Debug, Parser)]
#[command(name = "zoekt-nav", version)]
pub struct Cli {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a query and print the result tree
    Search(SearchArgs),

    /// Print the content of a zoekt-remote:// document
    Open(OpenArgs),

    /// Show this workspace's query history
    History(HistoryArgs),
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let ctx = NavContext::load(&self.common)?;
        match self.command {
            Command::Search(args) => search_cmd::run_search(args, ctx).await,
            Command::Open(args) => open_cmd::run_open(args, ctx).await,
            Command::History(args) => history_cmd::run_history(args, ctx),
        }
    }
}
