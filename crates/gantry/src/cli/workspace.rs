//! Configuration, store and project loading shared by commands

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::debug;

use gantry_core::config::{load_config_or_default, resolve_store_path, Config};
use gantry_core::model::Project;
use gantry_core::Settings;
use gantry_store::FileStore;
use gantry_tasks::Orchestrator;

/// Loaded configuration for the current directory
#[derive(Debug)]
pub struct Workspace {
    pub config: Config,
    pub config_path: Option<PathBuf>,
    pub dir: PathBuf,
}

impl Workspace {
    /// Load configuration from the current directory, falling back to defaults
    pub fn load() -> anyhow::Result<Self> {
        let dir = std::env::current_dir()?;
        let (config, config_path) = load_config_or_default(&dir);
        Ok(Self {
            config,
            config_path,
            dir,
        })
    }

    /// Orchestrator settings derived from the configuration
    pub fn settings(&self) -> Settings {
        Settings::from(&self.config)
    }

    /// Root of the file store
    pub fn store_path(&self) -> PathBuf {
        resolve_store_path(&self.config, self.config_path.as_deref(), &self.dir)
    }

    /// Open the file store
    pub async fn open_store(&self) -> anyhow::Result<Arc<FileStore>> {
        let path = self.store_path();
        debug!(path = %path.display(), "opening store");
        let store = FileStore::open(&path)
            .await
            .with_context(|| format!("failed to open store at {}", path.display()))?;
        Ok(Arc::new(store))
    }

    /// Open the store and build an orchestrator over it
    pub async fn orchestrator(&self) -> anyhow::Result<Orchestrator> {
        let store = self.open_store().await?;
        Ok(Orchestrator::new(store, self.settings()))
    }
}

/// Read and validate a project definition, returning it with its source text
pub fn load_project(path: &Path) -> anyhow::Result<(Project, String)> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read project file {}", path.display()))?;
    let project = Project::from_yaml(&content)
        .with_context(|| format!("invalid project file {}", path.display()))?;
    Ok((project, content))
}

/// Run an async command body on a fresh runtime
pub fn block_on<F: std::future::Future>(future: F) -> anyhow::Result<F::Output> {
    let runtime = tokio::runtime::Runtime::new()?;
    Ok(runtime.block_on(future))
}
