//! core::config
//!
//! Configuration loading and precedence.
//!
//! # Scopes
//!
//! Refhub has two configuration scopes sharing one schema:
//! - **Global**: user-level settings
//! - **Hub**: per-hub-repository overrides
//!
//! # Precedence
//!
//! Values resolve in this order (later overrides earlier):
//! 1. Built-in defaults
//! 2. Global config file
//! 3. Hub config file
//! 4. CLI flags (not handled here)
//!
//! # Locations
//!
//! Global, searched in order:
//! 1. `$REFHUB_CONFIG` if set
//! 2. `<user config dir>/refhub/config.toml`
//!
//! Hub: `<hub root>/refhub.toml`.
//!
//! Missing files are not errors; malformed or invalid files are.
//!
//! # Example
//!
//! ```no_run
//! use refhub::core::config::Config;
//! use std::path::Path;
//!
//! let loaded = Config::load(Some(Path::new("/path/to/hub"))).unwrap();
//! let config = loaded.config;
//! println!("default branch: {}", config.default_branch());
//! println!("security: {}", config.security_enabled());
//! ```

pub mod schema;

pub use schema::{CacheSection, FallbackSection, HubConfig, ResolverSection};

use crate::core::reference::{SecurityPolicy, DEFAULT_ALLOWED_REPOSITORIES, DEFAULT_BRANCH};
use crate::core::version::CompatibilityRule;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable overriding the global config path.
pub const CONFIG_ENV_VAR: &str = "REFHUB_CONFIG";

/// Hub-local config file name.
pub const HUB_CONFIG_FILE: &str = "refhub.toml";

/// Default hub repository name.
pub const DEFAULT_HUB_REPOSITORY: &str = "assetutilities";

/// Default fallback store directory, relative to the hub root.
pub const DEFAULT_FALLBACK_DIR: &str = ".refhub/fallback";

/// Default persistent cache directory, relative to the hub root.
pub const DEFAULT_CACHE_DIR: &str = ".refhub/cache";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub message: String,
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    pub config: Config,
    pub warnings: Vec<ConfigWarning>,
}

/// Merged configuration from all scopes.
///
/// Accessor methods apply precedence and defaults, so callers never see an
/// `Option` for a value that has a built-in default.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global scope.
    pub global: HubConfig,
    /// Hub scope (when a hub root was given and the file exists).
    pub hub: Option<HubConfig>,
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// Missing files are fine; unreadable, malformed, or invalid files are
    /// errors.
    pub fn load(hub_root: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let global = match global_config_path() {
            Some(path) if path.exists() => Some(read_config_file(&path)?),
            Some(path) if std::env::var_os(CONFIG_ENV_VAR).is_some() => {
                // An explicit override pointing at nothing deserves a note.
                warnings.push(ConfigWarning {
                    message: format!("{CONFIG_ENV_VAR} points at a missing file"),
                    path,
                });
                None
            }
            _ => None,
        };

        let hub = match hub_root {
            Some(root) => {
                let path = root.join(HUB_CONFIG_FILE);
                if path.exists() {
                    Some(read_config_file(&path)?)
                } else {
                    None
                }
            }
            None => None,
        };

        Ok(ConfigLoadResult {
            config: Config {
                global: global.unwrap_or_default(),
                hub,
            },
            warnings,
        })
    }

    fn hub_or_global<T, F>(&self, pick: F) -> Option<T>
    where
        F: Fn(&HubConfig) -> Option<T>,
    {
        self.hub
            .as_ref()
            .and_then(&pick)
            .or_else(|| pick(&self.global))
    }

    /// The hub repository name.
    pub fn hub_repository(&self) -> String {
        self.hub_or_global(|c| c.hub_repository.clone())
            .unwrap_or_else(|| DEFAULT_HUB_REPOSITORY.to_string())
    }

    /// Branch assumed when a reference names none.
    pub fn default_branch(&self) -> String {
        self.hub_or_global(|c| c.default_branch.clone())
            .unwrap_or_else(|| DEFAULT_BRANCH.to_string())
    }

    /// Repositories references may point into.
    pub fn allowed_repositories(&self) -> Vec<String> {
        self.hub_or_global(|c| c.allowed_repositories.clone())
            .unwrap_or_else(|| {
                DEFAULT_ALLOWED_REPOSITORIES
                    .iter()
                    .map(|s| s.to_string())
                    .collect()
            })
    }

    /// Whether the repository allow-list is enforced.
    pub fn security_enabled(&self) -> bool {
        self.hub_or_global(|c| c.security_enabled).unwrap_or(true)
    }

    /// Whether resolutions write through to the persistent cache.
    pub fn cache_enabled(&self) -> bool {
        self.hub_or_global(|c| c.cache_enabled).unwrap_or(true)
    }

    /// Persistent cache budget in megabytes.
    pub fn cache_max_size_mb(&self) -> u64 {
        self.hub_or_global(|c| c.cache.as_ref().and_then(|s| s.max_size_mb))
            .unwrap_or(crate::cache::DEFAULT_MAX_SIZE_MB)
    }

    /// Persistent cache entry TTL in seconds.
    pub fn cache_ttl_secs(&self) -> i64 {
        self.hub_or_global(|c| c.cache.as_ref().and_then(|s| s.ttl_secs))
            .unwrap_or(crate::cache::DEFAULT_TTL_SECS)
    }

    /// Fallback store directory, resolved against `hub_root` when relative.
    pub fn fallback_dir(&self, hub_root: &Path) -> PathBuf {
        let dir = self
            .hub_or_global(|c| c.fallback.as_ref().and_then(|s| s.dir.clone()))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FALLBACK_DIR));
        if dir.is_absolute() {
            dir
        } else {
            hub_root.join(dir)
        }
    }

    /// Persistent cache directory under the hub root.
    pub fn cache_dir(&self, hub_root: &Path) -> PathBuf {
        hub_root.join(DEFAULT_CACHE_DIR)
    }

    /// Whether the reachability probe runs at all.
    pub fn enable_network_check(&self) -> bool {
        self.hub_or_global(|c| c.fallback.as_ref().and_then(|s| s.enable_network_check))
            .unwrap_or(true)
    }

    /// URL the reachability probe targets.
    pub fn probe_url(&self) -> String {
        self.hub_or_global(|c| c.fallback.as_ref().and_then(|s| s.probe_url.clone()))
            .unwrap_or_else(|| crate::fallback::probe::DEFAULT_PROBE_URL.to_string())
    }

    /// Resolver memo bound in entries.
    pub fn memo_capacity(&self) -> usize {
        self.hub_or_global(|c| c.resolver.as_ref().and_then(|s| s.memo_capacity))
            .unwrap_or(crate::resolver::memo::DEFAULT_MEMO_CAPACITY)
    }

    /// Resolver memo freshness bound in seconds.
    pub fn memo_ttl_secs(&self) -> i64 {
        self.hub_or_global(|c| c.resolver.as_ref().and_then(|s| s.memo_ttl_secs))
            .unwrap_or(crate::resolver::DEFAULT_MEMO_TTL_SECS)
    }

    /// Bound on distinct references in one resolution chain.
    pub fn max_depth(&self) -> usize {
        self.hub_or_global(|c| c.resolver.as_ref().and_then(|s| s.max_depth))
            .unwrap_or(crate::resolver::DEFAULT_MAX_DEPTH)
    }

    /// Per-component version constraints, hub scope overriding global
    /// component-by-component.
    pub fn compatibility_rules(&self) -> HashMap<String, CompatibilityRule> {
        let mut rules = self.global.compatibility.clone();
        if let Some(hub) = &self.hub {
            for (component, rule) in &hub.compatibility {
                rules.insert(component.clone(), rule.clone());
            }
        }
        rules
    }

    /// The security policy implied by this configuration.
    pub fn security_policy(&self) -> SecurityPolicy {
        SecurityPolicy {
            enabled: self.security_enabled(),
            allowed_repositories: self.allowed_repositories(),
            default_branch: self.default_branch(),
        }
    }
}

/// The global config path: `$REFHUB_CONFIG`, else the user config dir.
fn global_config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("refhub").join("config.toml"))
}

/// Read, parse, and validate one config file.
fn read_config_file(path: &Path) -> Result<HubConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    let config: HubConfig = toml::from_str(&text).map_err(|err| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    config.validate()?;
    Ok(config)
}
