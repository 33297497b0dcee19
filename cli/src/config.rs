use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const LOCAL_CONFIG_FILE: &str = ".silo.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub repository: RepositoryConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub path: Option<PathBuf>,
    /// Default prefix for `add`.
    pub prefix: Option<String>,
}

impl Config {
    /// Loads the configuration.
    ///
    /// An explicitly named file must exist. Otherwise `.silo.toml` in the
    /// current directory is tried, then `config.toml` in the platform
    /// configuration directory, and a missing file yields the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        let candidates = std::iter::once(PathBuf::from(LOCAL_CONFIG_FILE))
            .chain(ProjectDirs::from("", "", "silo").map(|dirs| dirs.config_dir().join("config.toml")));

        for candidate in candidates {
            if candidate.is_file() {
                return Self::from_file(&candidate);
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// The repository path, preferring `flag` over the configured one.
    pub fn repository_path(&self, flag: Option<&Path>) -> Result<PathBuf> {
        flag.map(Path::to_path_buf)
            .or_else(|| self.repository.path.clone())
            .ok_or_else(|| anyhow!("Repository path required (--repo, SILO_REPO or a config file)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_repository_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[repository]\npath = \"/srv/backups\"\nprefix = \"laptop\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.repository.path, Some(PathBuf::from("/srv/backups")));
        assert_eq!(config.repository.prefix.as_deref(), Some("laptop"));
    }

    #[test]
    fn test_flag_overrides_config() {
        let config = Config {
            repository: RepositoryConfig {
                path: Some(PathBuf::from("/from/config")),
                prefix: None,
            },
        };

        assert_eq!(
            config.repository_path(Some(Path::new("/from/flag"))).unwrap(),
            PathBuf::from("/from/flag")
        );
        assert_eq!(config.repository_path(None).unwrap(), PathBuf::from("/from/config"));
        assert!(Config::default().repository_path(None).is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert!(config.repository.path.is_none());
    }
}
