//! core::config::schema
//!
//! Configuration schema types.
//!
//! One schema serves both scopes: the global file and the hub-local file
//! carry the same shape, and every field is optional so either scope can
//! state only what it overrides.
//!
//! # Validation
//!
//! Values are validated after parsing; a zero TTL or an empty branch name is
//! rejected at load, not discovered mid-operation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use super::ConfigError;
use crate::core::version::CompatibilityRule;

/// Hub configuration (either scope).
///
/// # Example
///
/// ```toml
/// hub_repository = "assetutilities"
/// default_branch = "main"
/// allowed_repositories = ["assetutilities", "shared-templates"]
/// security_enabled = true
/// cache_enabled = true
///
/// [cache]
/// max_size_mb = 100
/// ttl_secs = 3600
///
/// [fallback]
/// dir = ".refhub/fallback"
/// enable_network_check = true
///
/// [resolver]
/// memo_capacity = 100
/// max_depth = 10
///
/// [compatibility.assetutilities]
/// min_version = "1.2.0"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HubConfig {
    /// Repository this hub distributes shared components from.
    pub hub_repository: Option<String>,

    /// Branch assumed when a reference names none.
    pub default_branch: Option<String>,

    /// Repositories references may point into.
    pub allowed_repositories: Option<Vec<String>>,

    /// Whether the repository allow-list is enforced.
    pub security_enabled: Option<bool>,

    /// Whether resolutions are written through to the persistent cache.
    pub cache_enabled: Option<bool>,

    /// Persistent cache bounds.
    pub cache: Option<CacheSection>,

    /// Offline fallback settings.
    pub fallback: Option<FallbackSection>,

    /// Resolver memo and recursion settings.
    pub resolver: Option<ResolverSection>,

    /// Per-component version constraints.
    pub compatibility: HashMap<String, CompatibilityRule>,
}

/// `[cache]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CacheSection {
    /// Store budget in megabytes.
    pub max_size_mb: Option<u64>,

    /// Entry TTL in seconds.
    pub ttl_secs: Option<i64>,
}

/// `[fallback]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FallbackSection {
    /// Fallback store directory, relative to the hub root unless absolute.
    pub dir: Option<PathBuf>,

    /// Whether the reachability probe runs at all.
    pub enable_network_check: Option<bool>,

    /// URL the reachability probe targets.
    pub probe_url: Option<String>,
}

/// `[resolver]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ResolverSection {
    /// In-memory memo bound in entries.
    pub memo_capacity: Option<usize>,

    /// Memo freshness bound in seconds.
    pub memo_ttl_secs: Option<i64>,

    /// Bound on distinct references in one resolution chain.
    pub max_depth: Option<usize>,
}

impl HubConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(branch) = &self.default_branch {
            if branch.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "default_branch cannot be empty".to_string(),
                ));
            }
        }

        if let Some(repo) = &self.hub_repository {
            if repo.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "hub_repository cannot be empty".to_string(),
                ));
            }
        }

        if let Some(cache) = &self.cache {
            if cache.max_size_mb == Some(0) {
                return Err(ConfigError::InvalidValue(
                    "cache.max_size_mb must be at least 1".to_string(),
                ));
            }
            if matches!(cache.ttl_secs, Some(ttl) if ttl <= 0) {
                return Err(ConfigError::InvalidValue(
                    "cache.ttl_secs must be positive".to_string(),
                ));
            }
        }

        if let Some(fallback) = &self.fallback {
            if matches!(&fallback.probe_url, Some(url) if url.trim().is_empty()) {
                return Err(ConfigError::InvalidValue(
                    "fallback.probe_url cannot be empty".to_string(),
                ));
            }
        }

        if let Some(resolver) = &self.resolver {
            if resolver.memo_capacity == Some(0) {
                return Err(ConfigError::InvalidValue(
                    "resolver.memo_capacity must be at least 1".to_string(),
                ));
            }
            if matches!(resolver.memo_ttl_secs, Some(ttl) if ttl <= 0) {
                return Err(ConfigError::InvalidValue(
                    "resolver.memo_ttl_secs must be positive".to_string(),
                ));
            }
            if resolver.max_depth == Some(0) {
                return Err(ConfigError::InvalidValue(
                    "resolver.max_depth must be at least 1".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_is_valid() {
        assert!(HubConfig::default().validate().is_ok());
    }

    #[test]
    fn full_example_parses() {
        let toml = r#"
            hub_repository = "assetutilities"
            default_branch = "main"
            allowed_repositories = ["assetutilities", "shared-templates"]
            security_enabled = true
            cache_enabled = true

            [cache]
            max_size_mb = 50
            ttl_secs = 600

            [fallback]
            dir = ".refhub/fallback"
            enable_network_check = false
            probe_url = "https://example.com"

            [resolver]
            memo_capacity = 32
            memo_ttl_secs = 120
            max_depth = 5

            [compatibility.assetutilities]
            min_version = "1.2.0"
            incompatible = ["1.3.1"]
        "#;
        let config: HubConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.as_ref().unwrap().max_size_mb, Some(50));
        assert_eq!(
            config.compatibility["assetutilities"].min_version.as_deref(),
            Some("1.2.0")
        );
    }

    #[test]
    fn unknown_fields_rejected() {
        assert!(toml::from_str::<HubConfig>("surprise = true").is_err());
        assert!(toml::from_str::<HubConfig>("[cache]\nsurprise = 1").is_err());
    }

    #[test]
    fn zero_ttl_rejected() {
        let config: HubConfig = toml::from_str("[cache]\nttl_secs = 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_depth_rejected() {
        let config: HubConfig = toml::from_str("[resolver]\nmax_depth = 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_branch_rejected() {
        let config: HubConfig = toml::from_str(r#"default_branch = """#).unwrap();
        assert!(config.validate().is_err());
    }
}
