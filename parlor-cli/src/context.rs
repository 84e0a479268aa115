use anyhow::{Context, Result};
use parlor_core::identity::{FileTokenCache, IdentityProvider, TokenCache};
use parlor_core::{
    ensure_data_dir, ClerkClient, ParlorConfig, ParlorError, ServiceContext, SsoChallenge, User,
};
use std::path::PathBuf;
use std::sync::Arc;

const PENDING_SIGN_IN_FILE: &str = "pending_sign_in.json";

/// Everything a command needs: validated config, backend services and the identity client.
pub struct CliContext {
    pub config: ParlorConfig,
    pub services: ServiceContext,
    pub identity: ClerkClient,
}

impl CliContext {
    pub fn load() -> Result<Self> {
        let config = ParlorConfig::load().map_err(ParlorError::from)?;
        let services = ServiceContext::from_config(&config)?;
        let identity = identity_client(&config)?;
        Ok(Self {
            config,
            services,
            identity,
        })
    }

    /// The signed-in account, or a hint to sign in first.
    pub async fn viewer(&self) -> Result<User> {
        match self.identity.current_session().await? {
            Some(session) => Ok(session.user),
            None => Err(ParlorError::NotSignedIn.into()),
        }
    }
}

pub fn identity_client(config: &ParlorConfig) -> Result<ClerkClient> {
    let cache: Arc<dyn TokenCache> = Arc::new(FileTokenCache::default_location()?);
    Ok(ClerkClient::new(&config.identity, cache)?)
}

fn pending_path() -> Result<PathBuf> {
    let dir = ensure_data_dir().context("Failed to create data directory")?;
    Ok(dir.join(PENDING_SIGN_IN_FILE))
}

pub fn save_pending(challenge: &SsoChallenge) -> Result<()> {
    let path = pending_path()?;
    std::fs::write(&path, serde_json::to_string_pretty(challenge)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

pub fn load_pending() -> Result<Option<SsoChallenge>> {
    let path = pending_path()?;
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(&path)?;
    Ok(Some(serde_json::from_str(&raw)?))
}

pub fn clear_pending() -> Result<()> {
    let path = pending_path()?;
    if path.exists() {
        std::fs::remove_file(&path)?;
    }
    Ok(())
}

pub fn is_json(format: &str) -> bool {
    format.eq_ignore_ascii_case("json")
}

/// Shortens text for table cells, counting characters rather than bytes.
pub fn truncate(text: &str, max: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max {
        return flat;
    }
    let cut: String = flat.chars().take(max.saturating_sub(1)).collect();
    format!("{}…", cut)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a long line of text", 6), "a lon…");
        assert_eq!(truncate("two\nlines", 20), "two lines");
    }
}
