use anyhow::Context;
use anyhow::Result;
use clap::Args;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use zoekt_nav_core::NavConfig;
use zoekt_nav_core::StateStore;
use zoekt_nav_core::detect_home;
use zoekt_nav_git::GitCliHost;
use zoekt_nav_git::RepositoryResolver;

#[derive(Debug, Clone, Default, Args)]
pub struct CommonArgs {
    /// Data directory (defaults to $ZOEKT_NAV_HOME or ~/.zoekt-nav)
    #[arg(long, value_name = "DIR", global = true)]
    pub home: Option<PathBuf>,

    /// Workspace folder; repeat for multi-root workspaces (defaults to the
    /// current directory)
    #[arg(long = "workspace", value_name = "DIR", global = true)]
    pub workspaces: Vec<PathBuf>,
}

/// Everything a command needs, resolved from flags, environment and disk.
pub struct NavContext {
    pub home: PathBuf,
    pub config: NavConfig,
    pub workspace_folders: Vec<PathBuf>,
    pub repositories: RepositoryResolver,
    pub state: Option<StateStore>,
}

impl NavContext {
    pub fn load(args: &CommonArgs) -> Result<Self> {
        let home = detect_home(args.home.as_deref())?;
        let config = NavConfig::load(&home)?;
        config.validate()?;

        let cwd = std::env::current_dir().context("failed to get current directory")?;
        let workspace_folders = if args.workspaces.is_empty() {
            vec![absolute_folder(&cwd, &cwd)]
        } else {
            args.workspaces
                .iter()
                .map(|folder| absolute_folder(&cwd, folder))
                .collect()
        };
        let repositories =
            RepositoryResolver::new(Arc::new(GitCliHost::discover(&workspace_folders)));

        let state = workspace_folders.first().and_then(|root| {
            StateStore::for_workspace(&home, root)
                .map(|store| store.with_limit(config.history_limit))
                .inspect_err(|err| warn!("query history disabled: {err}"))
                .ok()
        });

        Ok(Self {
            home,
            config,
            workspace_folders,
            repositories,
            state,
        })
    }
}

/// Anchors `folder` at `cwd` and canonicalizes it when it exists.
fn absolute_folder(cwd: &Path, folder: &Path) -> PathBuf {
    let joined = cwd.join(folder);
    dunce::canonicalize(&joined).unwrap_or(joined)
}
