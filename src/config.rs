//! Configuration management for the directory schema tools
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (directory-schema.toml)
//! - Environment variables (DIRSCHEMA__*)
//!
//! ## Example config file (directory-schema.toml):
//! ```toml
//! [registry]
//! forward_references = "defer"
//!
//! [loader]
//! paths = ["./schemas/local"]
//! include_core = true
//! skip_prefixes = ["drafts/"]
//!
//! [logging]
//! filter = "directory_schema=debug"
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::registry::ForwardReferencePolicy;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Registry settings
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Schema loading settings
    #[serde(default)]
    pub loader: LoaderConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Registry configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// What to do with superiors that are not registered yet
    #[serde(default)]
    pub forward_references: ForwardReferencePolicy,
}

/// Loader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Schema files or directories to load, in order
    #[serde(default)]
    pub paths: Vec<PathBuf>,

    /// Load the embedded core schema first
    #[serde(default = "default_true")]
    pub include_core: bool,

    /// Path prefixes skipped while walking a directory
    #[serde(default = "default_skip_prefixes")]
    pub skip_prefixes: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing-subscriber` filter directive used when RUST_LOG is unset
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_true() -> bool {
    true
}

fn default_skip_prefixes() -> Vec<String> {
    vec![
        "target/".to_string(),
        ".git/".to_string(),
        "node_modules/".to_string(),
    ]
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            include_core: true,
            skip_prefixes: default_skip_prefixes(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl SchemaConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration, adding a specific file that must exist
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "directory-schema.toml",
            ".directory-schema.toml",
            "config/directory-schema.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        // XDG config directory
        if let Some(config_dir) = directories::ProjectDirs::from("org", "directory", "directory-schema") {
            let xdg_config = config_dir.config_dir().join("directory-schema.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        // DIRSCHEMA__LOADER__INCLUDE_CORE=false
        // DIRSCHEMA__LOADER__PATHS=./schemas/a,./schemas/b
        builder = builder.add_source(
            Environment::with_prefix("DIRSCHEMA")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("loader.paths")
                .with_list_parse_key("loader.skip_prefixes"),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Loader paths with relative entries resolved against the working directory
    pub fn loader_paths(&self) -> Vec<PathBuf> {
        self.loader
            .paths
            .iter()
            .map(|p| {
                if p.is_absolute() {
                    p.clone()
                } else {
                    std::env::current_dir().unwrap_or_default().join(p)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SchemaConfig::default();
        assert_eq!(config.registry.forward_references, ForwardReferencePolicy::Defer);
        assert!(config.loader.include_core);
        assert!(config.loader.paths.is_empty());
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_serialize_config() {
        let config = SchemaConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[registry]"));
        assert!(toml_str.contains("forward_references = \"defer\""));
        assert!(toml_str.contains("[loader]"));
    }

    #[test]
    fn test_explicit_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");

        let mut config = SchemaConfig::default();
        config.registry.forward_references = ForwardReferencePolicy::Reject;
        config.loader.include_core = false;
        config.loader.paths = vec![PathBuf::from("/srv/schemas")];
        config.save(&path).unwrap();

        let loaded = SchemaConfig::load_from(Some(path.as_path())).unwrap();
        assert_eq!(loaded.registry.forward_references, ForwardReferencePolicy::Reject);
        assert!(!loaded.loader.include_core);
        assert_eq!(loaded.loader_paths(), vec![PathBuf::from("/srv/schemas")]);
    }

    #[test]
    fn test_skip_prefixes_from_environment() {
        std::env::set_var("DIRSCHEMA__LOADER__SKIP_PREFIXES", "drafts/,old/");
        let loaded = SchemaConfig::load_from(None);
        std::env::remove_var("DIRSCHEMA__LOADER__SKIP_PREFIXES");

        let loaded = loaded.unwrap();
        assert_eq!(loaded.loader.skip_prefixes, vec!["drafts/".to_string(), "old/".to_string()]);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(SchemaConfig::load_from(Some(dir.path().join("absent.toml").as_path())).is_err());
    }
}
