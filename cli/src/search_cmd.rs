use crate::context::NavContext;
use crate::render::print_file;
use crate::render::print_line;
use crate::render::print_summary;
use crate::render::print_welcome;
use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use zoekt_nav_client::SearchSession;
use zoekt_nav_client::ZoektClient;
use zoekt_nav_core::LocationResolver;
use zoekt_nav_core::ResultEntry;
use zoekt_nav_core::TreePresenter;

#[derive(Debug, Parser)]
pub struct SearchArgs {
    /// Zoekt query; re-runs the last query of this workspace when omitted
    #[arg(value_name = "QUERY")]
    pub query: Option<String>,

    /// Search every indexed repository
    #[arg(long, conflicts_with = "local")]
    pub all: bool,

    /// Restrict the search to repositories checked out in the workspace
    #[arg(long)]
    pub local: bool,
}

pub async fn run_search(args: SearchArgs, ctx: NavContext) -> Result<()> {
    let client = Arc::new(ZoektClient::from_config(&ctx.config)?);
    let mut session = SearchSession::new(ctx.config, client, ctx.repositories.clone());
    if let Some(state) = ctx.state {
        session = session.with_state(state);
    }

    let query = match args.query {
        Some(query) => query,
        None => session
            .last_query()
            .context("no query given and no previous query in this workspace")?,
    };
    let search_all_repos = if args.all {
        true
    } else if args.local {
        false
    } else {
        session.default_search_all_repos()
    };

    session
        .search(&query, search_all_repos)
        .await
        .context("search failed")?;

    let presenter = TreePresenter::new(LocationResolver::new(
        ctx.repositories,
        ctx.workspace_folders,
    ));
    let tree = session.tree();
    let tree = tree.lock().await;
    let templates = tree.templates();
    for entry in tree.root_entries() {
        let item = presenter.tree_item(&entry, &templates).await;
        match &entry {
            ResultEntry::Summary(_) => print_summary(&item),
            ResultEntry::Welcome(_) => print_welcome(&item),
            ResultEntry::File(_) => {
                print_file(&item);
                for child in tree.children(&entry) {
                    let ResultEntry::Line(line) = &child else {
                        continue;
                    };
                    let line_item = presenter.tree_item(&child, &templates).await;
                    print_line(&line_item, line.line.line_number);
                }
            }
            ResultEntry::Line(_) => {}
        }
    }
    Ok(())
}
