use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// Element and attribute names used for painted markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    pub tag_name: String,
    pub ids_attribute: String,
    pub primary_attribute: String,
    pub active_attribute: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            tag_name: "mark".to_string(),
            ids_attribute: "data-highlight-ids".to_string(),
            primary_attribute: "data-highlight-id".to_string(),
            active_attribute: "data-highlight-active".to_string(),
        }
    }
}

/// Hover delays, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    pub hover_debounce_ms: u64,
    pub leave_grace_ms: u64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            hover_debounce_ms: 50,
            leave_grace_ms: 150,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Where saved highlights are kept.
    #[serde(default = "Config::default_store_path")]
    pub store_path: PathBuf,
    #[serde(default)]
    pub marker: MarkerConfig,
    #[serde(default)]
    pub interaction: InteractionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: Self::default_store_path(),
            marker: MarkerConfig::default(),
            interaction: InteractionConfig::default(),
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the store location
        config.store_path = Self::expand_path(&config.store_path).unwrap_or(config.store_path);

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// The saved config, or the defaults when there is none.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        Ok(Self::load()?.unwrap_or_default())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/pagemark");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    fn default_store_path() -> PathBuf {
        let data_dir = shellexpand::tilde("~/.local/share/pagemark");
        PathBuf::from(data_dir.as_ref()).join("highlights.toml")
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/pagemark/config.toml"));
    }

    #[test]
    fn test_default_store_path_is_expanded() {
        let config = Config::default();
        let path_str = config.store_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".local/share/pagemark/highlights.toml"));
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config_content = r#"
store_path = "/tmp/highlights.toml"

[marker]
tag_name = "span"

[interaction]
leave_grace_ms = 300
"#;

        let config: Config = toml::from_str(config_content).unwrap();

        assert_eq!(config.store_path, PathBuf::from("/tmp/highlights.toml"));
        assert_eq!(config.marker.tag_name, "span");
        assert_eq!(config.marker.ids_attribute, "data-highlight-ids");
        assert_eq!(config.interaction.hover_debounce_ms, 50);
        assert_eq!(config.interaction.leave_grace_ms, 300);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test/path");
        let expanded = Config::expand_path(&path);

        assert!(expanded.is_some());
        let expanded = expanded.unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_with_env_var() {
        unsafe {
            env::set_var("PAGEMARK_TEST_VAR", "/test/env/path");
        }

        let path = PathBuf::from("$PAGEMARK_TEST_VAR/subdir");
        let expanded = Config::expand_path(&path);

        assert_eq!(expanded, Some(PathBuf::from("/test/env/path/subdir")));

        unsafe {
            env::remove_var("PAGEMARK_TEST_VAR");
        }
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let test_config = Config {
            store_path: PathBuf::from("/tmp/test-highlights.toml"),
            interaction: InteractionConfig {
                hover_debounce_ms: 10,
                leave_grace_ms: 20,
            },
            ..Config::default()
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }

    #[test]
    fn test_store_path_with_env_var_in_file() {
        unsafe {
            env::set_var("PAGEMARK_DATA", "/custom/data");
        }
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "store_path = \"$PAGEMARK_DATA/highlights.toml\"\n").unwrap();

        let config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(config.store_path, PathBuf::from("/custom/data/highlights.toml"));

        unsafe {
            env::remove_var("PAGEMARK_DATA");
        }
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "store_path = [").unwrap();

        let err = Config::load_from_path(&config_file).unwrap_err();

        assert!(matches!(err, ConfigError::ConfigParseError { .. }));
    }
}
