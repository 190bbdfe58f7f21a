//! Configuration loader with multi-source merging

use crate::{CasegateConfig, Paths};
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Configuration loader with builder pattern
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
    user_config: bool,
}

impl ConfigLoader {
    /// Create a new config loader with default project directory (current dir)
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "CGD".to_string(),
            user_config: true,
        }
    }

    /// Set the project directory
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the environment variable prefix (default: "CGD")
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Skip ~/.config/casegate/config.toml
    pub fn without_user_config(mut self) -> Self {
        self.user_config = false;
        self
    }

    /// Load configuration from all sources with proper precedence
    pub fn load(self) -> Result<CasegateConfig> {
        let mut builder = config::Config::builder();

        // 1. Start with built-in defaults
        let defaults = CasegateConfig::default();
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        // 2. User config (~/.config/casegate/config.toml)
        if self.user_config {
            let paths = Paths::new();
            if let Ok(user_config_file) = paths.user_config_file() {
                if user_config_file.exists() {
                    builder = builder.add_source(
                        config::File::from(user_config_file)
                            .required(false)
                            .format(config::FileFormat::Toml),
                    );
                }
            }
        }

        // 3. Project config (casegate.toml)
        let project_config_file = Paths::project_config_file(&self.project_dir);
        if project_config_file.exists() {
            builder = builder.add_source(
                config::File::from(project_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 4. Local config (casegate.local.toml, gitignored)
        let local_config_file = Paths::local_config_file(&self.project_dir);
        if local_config_file.exists() {
            builder = builder.add_source(
                config::File::from(local_config_file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 5. Environment variables (CGD_MASKING__REDACTED_MARKER, ...)
        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("claims.extra_ignored_roles")
                .with_list_parse_key("claims.county_codes")
                .try_parsing(true),
        );

        // Build and deserialize
        let config = builder.build().context("Failed to build configuration")?;

        let casegate_config: CasegateConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        casegate_config
            .validate()
            .context("Configuration failed validation")?;

        Ok(casegate_config)
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default(self) -> CasegateConfig {
        self.load().unwrap_or_default()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn loader(project_dir: &Path) -> ConfigLoader {
        ConfigLoader::new()
            .with_project_dir(project_dir)
            .with_env_prefix("CGD_LOADER_TEST")
            .without_user_config()
    }

    #[test]
    fn test_load_defaults() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config = loader(temp_dir.path()).load().expect("Failed to load config");

        assert_eq!(config, CasegateConfig::default());
    }

    #[test]
    fn test_load_project_config() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        let config_content = r#"
[masking]
redacted_marker = "[withheld]"
aggregate_bucket_width = 5

[claims]
extra_ignored_roles = ["LEGACYLOGINROLE"]

[cache]
capacity = 64
"#;
        fs::write(project_dir.join("casegate.toml"), config_content)
            .expect("Failed to write config");

        let config = loader(project_dir).load().expect("Failed to load config");

        assert_eq!(config.masking.redacted_marker, "[withheld]");
        assert_eq!(config.masking.aggregate_bucket_width, 5);
        assert_eq!(config.masking.partial_visible_suffix, 4);
        assert_eq!(config.claims.extra_ignored_roles, vec!["LEGACYLOGINROLE"]);
        assert_eq!(config.cache.capacity, 64);
        assert!(config.cache.enabled);
    }

    #[test]
    fn test_local_overrides() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(
            project_dir.join("casegate.toml"),
            r#"
[cache]
enabled = true
capacity = 128
"#,
        )
        .expect("Failed to write project config");

        fs::write(
            project_dir.join("casegate.local.toml"),
            r#"
[cache]
enabled = false
"#,
        )
        .expect("Failed to write local config");

        let config = loader(project_dir).load().expect("Failed to load config");

        // Local config should override project config
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.capacity, 128);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(
            project_dir.join("casegate.toml"),
            "[masking]\naggregate_bucket_width = 0\n",
        )
        .expect("Failed to write config");

        assert!(loader(project_dir).load().is_err());
        assert_eq!(
            loader(project_dir).load_or_default(),
            CasegateConfig::default()
        );
    }

    // Environment variables are not exercised here: mutating the process
    // environment needs `unsafe` in edition 2024. In actual usage:
    //
    // CGD_MASKING__REDACTED_MARKER="[hidden]"
    // CGD_CACHE__ENABLED=false
    // CGD_CLAIMS__EXTRA_IGNORED_ROLES=LEGACYLOGINROLE,OLDROLE
}
