//! Sign-in through the hosted identity provider.
//!
//! The provider runs an OAuth redirect flow in the user's browser. A terminal
//! client cannot receive the redirect, so the flow is split in two:
//! [`IdentityProvider::begin_sign_in`] returns the URL to open and
//! [`IdentityProvider::complete_sign_in`] checks the attempt once. Nothing here
//! retries; a failed attempt is restarted by the user.

mod clerk;
mod local;
mod token_cache;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{ParlorError, ParlorResult};
use crate::models::User;

pub use clerk::{frontend_api_from_key, ClerkClient};
pub use local::LocalIdentity;
pub use token_cache::{CachedTokens, FileTokenCache, MemoryTokenCache, TokenCache};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SsoStrategy {
    OauthGoogle,
    Passkey,
}

impl SsoStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SsoStrategy::OauthGoogle => "oauth_google",
            SsoStrategy::Passkey => "passkey",
        }
    }
}

impl std::fmt::Display for SsoStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SsoStrategy::OauthGoogle => write!(f, "Google"),
            SsoStrategy::Passkey => write!(f, "Passkey"),
        }
    }
}

impl std::str::FromStr for SsoStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "google" | "oauth_google" => Ok(SsoStrategy::OauthGoogle),
            "passkey" => Ok(SsoStrategy::Passkey),
            other => Err(format!("unknown sign-in strategy '{}'", other)),
        }
    }
}

/// A started sign-in the user still has to finish in the browser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SsoChallenge {
    pub sign_in_id: String,
    pub authorize_url: String,
    pub strategy: SsoStrategy,
}

/// Active session with the identity it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user: User,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn begin_sign_in(&self, strategy: SsoStrategy) -> ParlorResult<SsoChallenge>;

    /// Returns the created session once the provider reports the attempt complete.
    async fn complete_sign_in(&self, challenge: &SsoChallenge) -> ParlorResult<Session>;

    /// Session restored from the token cache, if any.
    async fn current_session(&self) -> ParlorResult<Option<Session>>;

    async fn sign_out(&self) -> ParlorResult<()>;
}

/// Which area a surface may show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    SignIn,
    Main,
}

/// Signed-in flag and current identity shared with every screen.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    session: Option<Session>,
    errors: Vec<String>,
}

impl AuthState {
    pub fn signed_in(session: Session) -> Self {
        Self {
            session: Some(session),
            errors: Vec::new(),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }

    pub fn user(&self) -> Option<&User> {
        self.session.as_ref().map(|s| &s.user)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.id.as_str())
    }

    pub fn gate(&self) -> Gate {
        if self.is_signed_in() {
            Gate::Main
        } else {
            Gate::SignIn
        }
    }

    /// Records the outcome of a sign-in attempt. Errors become provider codes.
    pub fn apply(&mut self, outcome: ParlorResult<Session>) {
        match outcome {
            Ok(session) => {
                self.session = Some(session);
                self.errors.clear();
            }
            Err(err) => {
                err.log();
                self.errors = err.auth_codes();
                if self.errors.is_empty() {
                    self.errors.push(err.error_code().to_string());
                }
            }
        }
    }

    pub fn sign_out(&mut self) {
        self.session = None;
        self.errors.clear();
    }

    /// Error codes from the last failed attempt.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}

/// Fails with the provider's wording for strategies this client cannot run.
pub(crate) fn ensure_supported(strategy: SsoStrategy) -> ParlorResult<()> {
    match strategy {
        SsoStrategy::OauthGoogle => Ok(()),
        SsoStrategy::Passkey => Err(ParlorError::StrategyUnavailable("Passkeys".to_string())),
    }
}
