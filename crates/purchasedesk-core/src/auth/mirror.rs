// Persisted copies of the session token.
//
// The in-memory SessionStore is always the source of truth; a mirror only
// lets a later process pick the token back up.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use keyring::Entry;
use serde::{Deserialize, Serialize};

/// Mirror file name in cache directory
const MIRROR_FILE: &str = "token.json";

const SERVICE_NAME: &str = "purchasedesk";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirroredToken {
    pub email: String,
    pub token: String,
    pub written_at: DateTime<Utc>,
}

pub trait TokenMirror: Send + Sync {
    fn write(&self, email: &str, token: &str) -> Result<()>;
    fn read(&self) -> Result<Option<MirroredToken>>;
    fn clear(&self) -> Result<()>;
}

/// JSON file in the cache directory
pub struct FileTokenMirror {
    cache_dir: PathBuf,
}

impl FileTokenMirror {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    fn mirror_path(&self) -> PathBuf {
        self.cache_dir.join(MIRROR_FILE)
    }
}

impl TokenMirror for FileTokenMirror {
    fn write(&self, email: &str, token: &str) -> Result<()> {
        let path = self.mirror_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mirrored = MirroredToken {
            email: email.to_string(),
            token: token.to_string(),
            written_at: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&mirrored)?;
        std::fs::write(path, contents).context("Failed to write token mirror")?;
        Ok(())
    }

    fn read(&self) -> Result<Option<MirroredToken>> {
        let path = self.mirror_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read token mirror")?;
        let mirrored = serde_json::from_str(&contents).context("Failed to parse token mirror")?;
        Ok(Some(mirrored))
    }

    fn clear(&self) -> Result<()> {
        let path = self.mirror_path();
        if path.exists() {
            std::fs::remove_file(path).context("Failed to remove token mirror")?;
        }
        Ok(())
    }
}

/// OS keychain entry, one per configured account
pub struct KeyringTokenMirror {
    account: String,
}

impl KeyringTokenMirror {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(SERVICE_NAME, &self.account).context("Failed to create keyring entry")
    }
}

impl TokenMirror for KeyringTokenMirror {
    fn write(&self, email: &str, token: &str) -> Result<()> {
        let mirrored = MirroredToken {
            email: email.to_string(),
            token: token.to_string(),
            written_at: Utc::now(),
        };
        let secret = serde_json::to_string(&mirrored)?;
        self.entry()?
            .set_password(&secret)
            .context("Failed to store token in keychain")?;
        Ok(())
    }

    fn read(&self) -> Result<Option<MirroredToken>> {
        match self.entry()?.get_password() {
            Ok(secret) => {
                let mirrored =
                    serde_json::from_str(&secret).context("Failed to parse keychain token")?;
                Ok(Some(mirrored))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to read token from keychain"),
        }
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}

/// Keeps nothing
pub struct NoMirror;

impl TokenMirror for NoMirror {
    fn write(&self, _email: &str, _token: &str) -> Result<()> {
        Ok(())
    }

    fn read(&self) -> Result<Option<MirroredToken>> {
        Ok(None)
    }

    fn clear(&self) -> Result<()> {
        Ok(())
    }
}
