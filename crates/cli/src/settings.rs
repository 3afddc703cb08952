use anyhow::Context;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use tallyscan_core::Config;
use tallyscan_ocr::ResultCache;
use tracing::debug;

const CONFIG_FILE: &str = "config.toml";

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "tallyscan", "tallyscan")
}

/// Where the config is read from when `--config` is not given.
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

/// Effective configuration plus the file it came from, if any.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub config: Config,
    pub source: Option<PathBuf>,
}

impl Settings {
    /// An explicit path must exist. The default path is optional; without it
    /// the built-in defaults apply.
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match default_config_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => {
                debug!("no config file, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn from_file(path: &Path) -> anyhow::Result<Self> {
        let config = Config::load(path).with_context(|| format!("loading config from {}", path.display()))?;
        debug!(path = %path.display(), "config loaded");
        Ok(Self { config, source: Some(path.to_path_buf()) })
    }

    pub fn cache_dir(&self) -> Option<PathBuf> {
        self.config
            .cache
            .dir
            .clone()
            .or_else(|| project_dirs().map(|dirs| dirs.cache_dir().join("results")))
    }

    pub fn result_cache(&self) -> anyhow::Result<ResultCache> {
        let dir = self.cache_dir().context("no cache directory available on this platform")?;
        ResultCache::from_config(&dir, &self.config.cache)
            .with_context(|| format!("opening cache at {}", dir.display()))
    }
}
