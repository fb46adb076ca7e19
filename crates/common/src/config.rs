//! Tool configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bespoke::BespokeKind;
use crate::error::{Error, Result};
use crate::registry::{ModuleRegistry, ModuleSource, BUILTINS};

/// Top-level configuration shared by the console and the CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Base URL that relative module endpoints resolve against
    pub backend_url: String,

    /// Per-request timeout
    pub request_timeout_secs: u64,

    /// Web console configuration
    pub web: WebConfig,

    /// Modules to register, in sidebar order. Empty means every built-in.
    pub modules: Vec<ModuleConfig>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:8080".to_string(),
            request_timeout_secs: 30,
            web: WebConfig::default(),
            modules: Vec::new(),
        }
    }
}

/// Web console configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Listen address
    pub listen: String,

    /// Serve the demo backend routes from the console itself
    pub mount_demo_backend: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:3000".to_string(),
            mount_demo_backend: false,
        }
    }
}

/// One `[[modules]]` entry: either `builtin = "<id>"` or
/// `path = "<file>"` with an optional `bespoke` kind, never both
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged, try_from = "RawModuleConfig")]
pub enum ModuleConfig {
    Builtin {
        builtin: String,
    },
    File {
        path: PathBuf,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bespoke: Option<BespokeKind>,
    },
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawModuleConfig {
    builtin: Option<String>,
    path: Option<PathBuf>,
    bespoke: Option<BespokeKind>,
}

impl TryFrom<RawModuleConfig> for ModuleConfig {
    type Error = String;

    fn try_from(raw: RawModuleConfig) -> std::result::Result<Self, Self::Error> {
        match (raw.builtin, raw.path) {
            (Some(builtin), None) if raw.bespoke.is_none() => Ok(ModuleConfig::Builtin { builtin }),
            (Some(_), None) => Err("module entry: `bespoke` only applies to `path` entries".into()),
            (None, Some(path)) => Ok(ModuleConfig::File {
                path,
                bespoke: raw.bespoke,
            }),
            (Some(_), Some(_)) => Err("module entry: set either `builtin` or `path`, not both".into()),
            (None, None) => Err("module entry: one of `builtin` or `path` is required".into()),
        }
    }
}

impl ToolConfig {
    /// Load configuration from file. A missing file yields the defaults.
    /// Relative descriptor paths resolve against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        if let Some(base) = path.parent() {
            for module in &mut config.modules {
                if let ModuleConfig::File { path, .. } = module {
                    if path.is_relative() {
                        *path = base.join(&*path);
                    }
                }
            }
        }
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| Error::InvalidConfig(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// The enumerated module source list
    pub fn module_sources(&self) -> Vec<ModuleSource> {
        if self.modules.is_empty() {
            return BUILTINS
                .iter()
                .map(|b| ModuleSource::Builtin(b.id.to_string()))
                .collect();
        }
        self.modules
            .iter()
            .map(|m| match m {
                ModuleConfig::Builtin { builtin } => ModuleSource::Builtin(builtin.clone()),
                ModuleConfig::File { path, bespoke } => ModuleSource::File {
                    path: path.clone(),
                    bespoke: *bespoke,
                },
            })
            .collect()
    }

    /// Build the registry named by this configuration
    pub fn registry(&self) -> Result<ModuleRegistry> {
        ModuleRegistry::from_sources(&self.module_sources())
    }
}
