use crate::error::{CropSyncError, Result};
use dialoguer::{Confirm, Input};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Forget local overrides for crops the catalog no longer lists.
    #[serde(default = "default_prune")]
    pub prune_orphaned_overrides: bool,
}

fn default_prune() -> bool {
    true
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            prune_orphaned_overrides: default_prune(),
        }
    }
}

impl Config {
    pub fn load(config_override: Option<PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) => p,
            None => Self::find_config_path()?,
        };

        if !config_path.exists() {
            return Err(CropSyncError::Config(format!(
                "Config file not found at {:?}. Run `cropsync init` to set up.",
                config_path
            )));
        }

        Self::from_file(&config_path)
    }

    /// Load the config if one exists, otherwise fall back to defaults.
    pub fn load_or_default(config_override: Option<PathBuf>) -> Result<Self> {
        if Self::exists(config_override.as_ref()) {
            return Self::load(config_override);
        }

        tracing::warn!("No configuration found, using defaults. Run `cropsync init` to set up.");
        Ok(Self::default())
    }

    fn from_file(path: &Path) -> Result<Self> {
        let config_str = std::fs::read_to_string(path)
            .map_err(|e| CropSyncError::Config(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&config_str)
    }

    fn from_yaml(content: &str) -> Result<Self> {
        let content = Self::substitute_env_vars(content);

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|e| CropSyncError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let url = self.api.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(CropSyncError::Config(format!(
                "api.base_url must start with http:// or https:// (got '{}')",
                self.api.base_url
            )));
        }
        if self.api.timeout_secs == 0 {
            return Err(CropSyncError::Config(
                "api.timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Search for config.yaml in standard locations.
    /// Returns the path of the first found config, or the XDG default path if none found.
    fn find_config_path() -> Result<PathBuf> {
        let local_config = PathBuf::from("config/config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("cropsync").join("config.yaml");
            if xdg_config.exists() {
                return Ok(xdg_config);
            }
        }

        Self::default_config_path()
    }

    pub fn exists(config_override: Option<&PathBuf>) -> bool {
        match config_override {
            Some(p) => p.exists(),
            None => Self::find_config_path()
                .map(|p| p.exists())
                .unwrap_or(false),
        }
    }

    /// Default path for writing new config files (~/.config/cropsync/config.yaml).
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CropSyncError::Config("Cannot determine config directory".into()))?
            .join("cropsync");
        Ok(config_dir.join("config.yaml"))
    }

    /// Run interactive setup prompts and write config to disk.
    /// Returns the loaded Config and the path it was written to.
    pub fn setup_interactive(config_override: Option<PathBuf>) -> Result<(Self, PathBuf)> {
        println!();
        println!("Let's set up cropsync!");
        println!();

        let defaults = Self::default();

        println!("Irrigation API");
        let base_url: String = Input::new()
            .with_prompt("  Base URL")
            .default(defaults.api.base_url.clone())
            .interact_text()
            .map_err(|e| CropSyncError::Config(format!("Input error: {}", e)))?;

        let timeout_secs: u64 = Input::new()
            .with_prompt("  Request timeout (seconds)")
            .default(defaults.api.timeout_secs)
            .interact_text()
            .map_err(|e| CropSyncError::Config(format!("Input error: {}", e)))?;

        println!();

        println!("Local storage");
        let prune_orphaned_overrides = Confirm::new()
            .with_prompt("  Forget edits for crops removed from the catalog?")
            .default(true)
            .interact()
            .map_err(|e| CropSyncError::Config(format!("Input error: {}", e)))?;

        println!();

        let config = Config {
            api: ApiConfig {
                base_url,
                timeout_secs,
            },
            storage: StorageConfig {
                prune_orphaned_overrides,
            },
        };
        config.validate()?;

        let config_path = match config_override {
            Some(p) => p,
            None => Self::default_config_path()?,
        };
        config.write_to(&config_path)?;

        println!("Configuration saved to {}", config_path.display());
        println!();

        Ok((config, config_path))
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(self)
            .map_err(|e| CropSyncError::Config(format!("Failed to serialize config: {}", e)))?;

        let content = format!(
            "# cropsync configuration\n# Generated by `cropsync init`\n# Environment variable substitution (${{VAR}}) is supported.\n\n{}",
            yaml
        );
        std::fs::write(path, content)?;
        Ok(())
    }

    fn substitute_env_vars(content: &str) -> String {
        let mut result = content.to_string();

        let Ok(re) = regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}") else {
            return result;
        };

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];
            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(placeholder, &value);
            }
        }

        result
    }

    pub fn data_dir(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        // CLI override takes priority
        if let Some(dir) = data_dir_override {
            std::fs::create_dir_all(dir)?;
            return Ok(dir.clone());
        }

        if let Ok(dir) = std::env::var("CROPSYNC_DATA_DIR") {
            let p = PathBuf::from(dir);
            std::fs::create_dir_all(&p)?;
            return Ok(p);
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| CropSyncError::Config("Cannot determine data directory".into()))?
            .join("cropsync");

        std::fs::create_dir_all(&data_dir)?;
        Ok(data_dir)
    }

    pub fn db_path(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        Ok(Self::data_dir(data_dir_override)?.join("cropsync.db"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: "http://localhost:8080".into(),
                timeout_secs: default_timeout_secs(),
            },
            storage: StorageConfig::default(),
        }
    }
}
