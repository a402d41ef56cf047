use crate::context::NavContext;
use anyhow::Result;
use clap::Parser;
use zoekt_nav_client::ContentError;
use zoekt_nav_client::RemoteContentProvider;
use zoekt_nav_client::ZoektClient;
use zoekt_nav_core::RemoteFile;

#[derive(Debug, Parser)]
pub struct OpenArgs {
    /// zoekt-remote:// URI, as printed by `zoekt-nav search`
    #[arg(value_name = "URI")]
    pub uri: String,
}

pub async fn run_open(args: OpenArgs, ctx: NavContext) -> Result<()> {
    let remote = RemoteFile::parse(&args.uri).ok_or(ContentError::InvalidUri(args.uri))?;
    let provider = RemoteContentProvider::new(ZoektClient::from_config(&ctx.config)?);
    let content = provider.fetch(&remote).await?;
    print!("{content}");
    Ok(())
}
