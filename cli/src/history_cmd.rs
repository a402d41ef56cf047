use crate::context::NavContext;
use anyhow::Result;
use clap::Parser;
use owo_colors::OwoColorize;

#[derive(Debug, Parser)]
pub struct HistoryArgs {
    /// Only show the N most recent queries
    #[arg(short = 'n', long, value_name = "N")]
    pub limit: Option<usize>,
}

pub fn run_history(args: HistoryArgs, ctx: NavContext) -> Result<()> {
    let history = match &ctx.state {
        Some(state) => state.history()?,
        None => Vec::new(),
    };
    if history.is_empty() {
        println!("No queries recorded for this workspace.");
        return Ok(());
    }

    let limit = args.limit.unwrap_or(history.len());
    for (idx, entry) in history.iter().take(limit).enumerate() {
        let scope = if entry.search_all_repos { "all" } else { "local" };
        println!(
            "{} {} {} {}",
            format!("{}.", idx + 1).bright_yellow(),
            entry.query.bold(),
            format!("{} hits ({}ms)", entry.hits, entry.duration_ms).bright_cyan(),
            format!("[{scope}]").bright_black()
        );
    }
    Ok(())
}
