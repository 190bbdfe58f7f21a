//! Configuration management for Casegate
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. Environment variables (CGD_* prefix, `__` between section and key)
//! 2. casegate.local.toml (gitignored, local overrides)
//! 3. casegate.toml (git-tracked, project config)
//! 4. ~/.config/casegate/config.toml (user defaults)
//! 5. Built-in defaults (lowest precedence)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use casegate_rbac::MaskingOptions;

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::Paths;

/// Main Casegate configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CasegateConfig {
    /// Field masking transforms.
    pub masking: MaskingOptions,
    pub claims: ClaimsConfig,
    pub cache: CacheConfig,
    pub audit: AuditConfig,
}

/// Identity-token claim handling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimsConfig {
    /// Role names dropped in addition to the built-in system roles.
    pub extra_ignored_roles: Vec<String>,
    /// Prefix of the identity provider's composite default role.
    pub default_role_prefix: String,
    /// County codes recognized in group names.
    pub county_codes: Vec<String>,
}

impl Default for ClaimsConfig {
    fn default() -> Self {
        Self {
            extra_ignored_roles: Vec::new(),
            default_role_prefix: "default-roles-".to_string(),
            county_codes: vec!["CTA".to_string(), "CTB".to_string(), "CTC".to_string()],
        }
    }
}

/// Rule-set cache in front of the rule provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 256,
        }
    }
}

/// Decision audit logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub enabled: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl CasegateConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    /// Load configuration from specific project directory
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Read a single TOML file, without layering.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::ParseError {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML, e.g. to seed a `casegate.toml`.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Create a development configuration
    pub fn development() -> Self {
        Self {
            cache: CacheConfig {
                enabled: false,
                ..Default::default()
            },
            audit: AuditConfig { enabled: true },
            ..Default::default()
        }
    }

    /// Create a production configuration
    pub fn production() -> Self {
        Self {
            cache: CacheConfig {
                enabled: true,
                capacity: 1024,
            },
            audit: AuditConfig { enabled: true },
            ..Default::default()
        }
    }

    /// Reject settings the engine cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.masking.validate()?;
        if self.cache.enabled && self.cache.capacity == 0 {
            return Err(ConfigError::ValidationError(
                "cache.capacity must be > 0 when the cache is enabled".to_string(),
            ));
        }
        Ok(())
    }
}
