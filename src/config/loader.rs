use super::Config;
use crate::error::ConfigError;
use anyhow::{Context, Result};
use directories::UserDirs;
use std::fs;
use std::path::{Path, PathBuf};

impl Config {
    /// `~/.planwright/config.toml`, if a home directory can be found.
    pub fn default_path() -> Option<PathBuf> {
        UserDirs::new().map(|dirs| dirs.home_dir().join(".planwright").join("config.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(ConfigError::Io)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: Config = toml::from_str(&contents)
            .map_err(|err| ConfigError::Load(err.to_string()))
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.config_path = path.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    /// Reads the default config file when present, otherwise built-in
    /// defaults. Environment overrides are applied either way.
    pub fn load_or_default() -> Result<Self> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::default(),
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&self.config_path, toml_str).context("Failed to write config file")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::OverallCheckMode;
    use tempfile::TempDir;

    #[test]
    fn save_then_load_preserves_sections() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config {
            config_path: tmp.path().join("nested").join("config.toml"),
            ..Config::default()
        };
        config.execution.verbose = true;
        config.execution.overall_checks = OverallCheckMode::JoinAtEnd;
        config.replan.max_attempts = 5;
        config.save().unwrap();

        let loaded = Config::load_from(&config.config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn load_from_reports_parse_errors_with_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[execution]\ndry_run = \"sometimes\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("config.toml"));
        assert!(err.downcast_ref::<ConfigError>().is_some());
    }

    #[test]
    fn load_from_rejects_invalid_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[logging]\nlevel = \"chatty\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(Config::load_from(&tmp.path().join("absent.toml")).is_err());
    }
}
