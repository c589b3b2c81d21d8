use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::domain::{entities::AppConfig, ports::ConfigRepository};

#[derive(Debug, Clone)]
pub struct LocalConfigAdapter {
    config_root: PathBuf,
    config_path: PathBuf,
}

impl LocalConfigAdapter {
    pub fn new() -> Result<Self> {
        let root = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lineanchor");
        Self::with_root(root)
    }

    pub fn with_root(root: PathBuf) -> Result<Self> {
        let config_path = root.join("config.json");

        fs::create_dir_all(&root)
            .with_context(|| format!("failed to create config dir: {}", root.display()))?;

        if !config_path.exists() {
            let initial = serde_json::to_string_pretty(&AppConfig::default())?;
            fs::write(&config_path, initial).with_context(|| {
                format!("failed to initialize config file: {}", config_path.display())
            })?;
        }

        Ok(Self {
            config_root: root,
            config_path,
        })
    }

    pub fn auth_token_path(&self) -> PathBuf {
        self.config_root.join("auth_token")
    }
}

impl ConfigRepository for LocalConfigAdapter {
    fn load_config(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.config_path)
            .with_context(|| format!("failed to read {}", self.config_path.display()))?;
        let cfg: AppConfig =
            serde_json::from_str(&raw).with_context(|| "invalid config.json format".to_string())?;
        Ok(cfg)
    }

    fn save_config(&self, config: &AppConfig) -> Result<()> {
        let raw = serde_json::to_string_pretty(config)?;
        fs::write(&self.config_path, raw)
            .with_context(|| format!("failed to write {}", self.config_path.display()))?;
        Ok(())
    }

    fn config_path(&self) -> &Path {
        &self.config_path
    }
}
