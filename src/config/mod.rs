use std::fs::File;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::policy::{DEFAULT_LOCKOUT_DURATION_MINUTES, DEFAULT_MAX_FAILED_ATTEMPTS};
use crate::security::password::DEFAULT_MEMORY_COST;

/// Account store configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StoreConfig {
    /// Path to the JSON snapshot file
    pub path: String,
}

/// Security configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SecurityConfig {
    /// Maximum failed login attempts before account lockout
    pub max_failed_attempts: u32,
    /// Account lockout duration in minutes
    pub lockout_duration_minutes: i64,
    /// Argon2id memory cost in kibibytes
    pub argon2_memory_cost: u32,
    /// Minimum password length for registration
    pub min_password_length: usize,
}

/// Application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    pub store: StoreConfig,
    pub security: SecurityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                path: "data/accounts.json".to_string(),
            },
            security: SecurityConfig {
                max_failed_attempts: DEFAULT_MAX_FAILED_ATTEMPTS,
                lockout_duration_minutes: DEFAULT_LOCKOUT_DURATION_MINUTES,
                argon2_memory_cost: DEFAULT_MEMORY_COST,
                min_password_length: 8,
            },
        }
    }
}

/// Load configuration from a TOML or JSON file. On first run the default
/// configuration is written to `path` and returned.
pub fn load_config(path: &str) -> Result<Config> {
    if !Path::new(path).exists() {
        let config = Config::default();
        save_config(path, &config)?;
        return Ok(config);
    }

    let mut file = File::open(path).context(format!("Failed to open config file: {}", path))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .context("Failed to read config file")?;

    let config: Config = match path.ends_with(".toml") {
        true => toml::from_str(&contents).context("Failed to parse TOML config")?,
        false => serde_json::from_str(&contents).context("Failed to parse JSON config")?,
    };

    Ok(config)
}

/// Save configuration to file.
pub fn save_config(path: &str, config: &Config) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
    }

    let serialized = match path.ends_with(".toml") {
        true => toml::to_string_pretty(config).context("Failed to serialize config to TOML")?,
        false => {
            serde_json::to_string_pretty(config).context("Failed to serialize config to JSON")?
        }
    };

    std::fs::write(path, serialized).context(format!("Failed to write config to file: {}", path))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.security.max_failed_attempts, 5);
        assert_eq!(config.security.lockout_duration_minutes, 5);
        assert_eq!(config.store.path, "data/accounts.json");
    }

    #[test]
    fn test_load_save_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("test_config.toml");
        let config_path_str = config_path.to_str().unwrap();

        let mut config = Config::default();
        config.security.max_failed_attempts = 3;
        save_config(config_path_str, &config).unwrap();

        let loaded = load_config(config_path_str).unwrap();
        assert_eq!(loaded.security.max_failed_attempts, 3);
        assert_eq!(loaded.store.path, config.store.path);
    }

    #[test]
    fn test_first_run_writes_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        let config_path_str = config_path.to_str().unwrap();

        let config = load_config(config_path_str).unwrap();

        assert!(config_path.exists());
        assert_eq!(config.security.max_failed_attempts, 5);
    }
}
