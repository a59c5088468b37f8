//! Application configuration management.
//!
//! Configuration is stored at `~/.config/purchasedesk/config.json` and can be
//! overridden from the environment (including a `.env` file loaded by the
//! binary):
//!
//! - `PURCHASEDESK_API_URL`: base URL of the purchase API
//! - `PURCHASEDESK_EMAIL`: email to prefill on the login screen
//! - `PURCHASEDESK_PASSWORD`: password to prefill on the login screen

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::api::DEFAULT_BASE_URL;
use crate::auth::{FileTokenMirror, KeyringTokenMirror, NoMirror, TokenMirror};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "purchasedesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const ENV_API_URL: &str = "PURCHASEDESK_API_URL";
pub const ENV_EMAIL: &str = "PURCHASEDESK_EMAIL";
pub const ENV_PASSWORD: &str = "PURCHASEDESK_PASSWORD";

/// Where the session token is mirrored between runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorKind {
    #[default]
    File,
    Keyring,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub last_email: Option<String>,
    pub token_mirror: MirrorKind,
    pub restore_session: bool,
    /// Prefilled password; taken from the environment only, never saved
    #[serde(skip)]
    pub password: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_BASE_URL.to_string(),
            last_email: None,
            token_mirror: MirrorKind::default(),
            restore_session: true,
            password: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply overrides from a key lookup (the process environment in practice)
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty(ENV_API_URL) {
            self.api_base_url = url;
        }
        if let Some(email) = non_empty(ENV_EMAIL) {
            self.last_email = Some(email);
        }
        if let Some(password) = non_empty(ENV_PASSWORD) {
            self.password = Some(password);
        }
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    /// Mirror used for the session between runs. With `restore_session`
    /// off nothing is written or read back.
    pub fn session_mirror(&self, cache_dir: PathBuf) -> Arc<dyn TokenMirror> {
        if self.restore_session {
            self.token_mirror(cache_dir)
        } else {
            Arc::new(NoMirror)
        }
    }

    /// Build the configured token mirror
    pub fn token_mirror(&self, cache_dir: PathBuf) -> Arc<dyn TokenMirror> {
        match self.token_mirror {
            MirrorKind::File => Arc::new(FileTokenMirror::new(cache_dir)),
            MirrorKind::Keyring => Arc::new(KeyringTokenMirror::new(APP_NAME)),
            MirrorKind::None => Arc::new(NoMirror),
        }
    }
}
