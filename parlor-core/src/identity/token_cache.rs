use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use crate::error::{ParlorError, ParlorResult};

/// Provider tokens kept between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CachedTokens {
    /// Client token the provider rotates on every response.
    pub client_token: Option<String>,
    pub session_id: Option<String>,
}

pub trait TokenCache: Send + Sync {
    fn load(&self) -> ParlorResult<CachedTokens>;

    fn save(&self, tokens: &CachedTokens) -> ParlorResult<()>;

    fn clear(&self) -> ParlorResult<()>;
}

/// JSON file under the user data directory.
pub struct FileTokenCache {
    path: PathBuf,
}

impl FileTokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> ParlorResult<Self> {
        let dir = crate::config::ensure_data_dir()?;
        Ok(Self::new(dir.join("session.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenCache for FileTokenCache {
    fn load(&self) -> ParlorResult<CachedTokens> {
        if !self.path.exists() {
            return Ok(CachedTokens::default());
        }
        let raw = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn save(&self, tokens: &CachedTokens) -> ParlorResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(tokens)?)?;
        debug!(path = %self.path.display(), "Saved session tokens");
        Ok(())
    }

    fn clear(&self) -> ParlorResult<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryTokenCache {
    tokens: Mutex<CachedTokens>,
}

impl TokenCache for MemoryTokenCache {
    fn load(&self) -> ParlorResult<CachedTokens> {
        self.tokens
            .lock()
            .map(|t| t.clone())
            .map_err(|_| ParlorError::Internal("token cache lock poisoned".to_string()))
    }

    fn save(&self, tokens: &CachedTokens) -> ParlorResult<()> {
        let mut guard = self
            .tokens
            .lock()
            .map_err(|_| ParlorError::Internal("token cache lock poisoned".to_string()))?;
        *guard = tokens.clone();
        Ok(())
    }

    fn clear(&self) -> ParlorResult<()> {
        self.save(&CachedTokens::default())
    }
}
