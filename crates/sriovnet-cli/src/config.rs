//! Configuration for the sriovnet CLI.
//!
//! Configuration is loaded from `~/.config/sriovnet/config.toml`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use sriovnet::SysfsLayout;

/// Environment variable that re-roots both sysfs trees.
pub const SYSFS_ROOT_ENV: &str = "SRIOVNET_SYSFS_ROOT";

/// Configuration for the sriovnet CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Where sysfs is mounted, if not `/sys`. Takes precedence over the
    /// individual tree paths.
    #[serde(default)]
    pub sysfs_root: Option<PathBuf>,

    /// Individual tree paths.
    #[serde(flatten)]
    pub layout: SysfsLayout,
}

impl CliConfig {
    /// Load the per-user config file.
    ///
    /// A missing file means "read the standard `/sys`", so defaults come back.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content, &path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no sriovnet config, using standard sysfs layout");
                Ok(Self::default())
            }
            Err(e) => Err(e).with_context(|| format!("cannot read sriovnet config {}", path.display())),
        }
    }

    /// Load an explicitly named config file (`--config`); it must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read sriovnet config {}", path.display()))?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .with_context(|| format!("invalid sysfs layout in {}", path.display()))?;
        tracing::debug!(path = %path.display(), ?config, "loaded sriovnet config");
        Ok(config)
    }

    /// `$XDG_CONFIG_HOME/sriovnet/config.toml`, or the platform equivalent.
    pub fn config_path() -> Result<PathBuf> {
        ProjectDirs::from("", "", "sriovnet")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .context("no home directory to look for sriovnet config in")
    }

    /// The layout to resolve against.
    ///
    /// `env_root` (from [`SYSFS_ROOT_ENV`]) beats `sysfs_root`, which beats
    /// the individual tree paths.
    pub fn layout(&self, env_root: Option<PathBuf>) -> SysfsLayout {
        match env_root.or_else(|| self.sysfs_root.clone()) {
            Some(root) => SysfsLayout::rooted_at(root),
            None => self.layout.clone(),
        }
    }
}
