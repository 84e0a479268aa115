use async_trait::async_trait;
use std::sync::Mutex;

use super::{ensure_supported, IdentityProvider, Session, SsoChallenge, SsoStrategy};
use crate::error::{ParlorError, ParlorResult};
use crate::models::User;

/// Identity used with the in-memory backend: every sign-in succeeds as one fixed user.
pub struct LocalIdentity {
    user: User,
    session: Mutex<Option<Session>>,
}

impl LocalIdentity {
    pub fn new(user: User) -> Self {
        Self {
            user,
            session: Mutex::new(None),
        }
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentity {
    async fn begin_sign_in(&self, strategy: SsoStrategy) -> ParlorResult<SsoChallenge> {
        ensure_supported(strategy)?;
        Ok(SsoChallenge {
            sign_in_id: "local".to_string(),
            authorize_url: "about:blank".to_string(),
            strategy,
        })
    }

    async fn complete_sign_in(&self, _challenge: &SsoChallenge) -> ParlorResult<Session> {
        let session = Session {
            id: format!("local_{}", self.user.id),
            user: self.user.clone(),
        };
        *self
            .session
            .lock()
            .map_err(|_| ParlorError::Internal("session lock poisoned".to_string()))? =
            Some(session.clone());
        Ok(session)
    }

    async fn current_session(&self) -> ParlorResult<Option<Session>> {
        self.session
            .lock()
            .map(|s| s.clone())
            .map_err(|_| ParlorError::Internal("session lock poisoned".to_string()))
    }

    async fn sign_out(&self) -> ParlorResult<()> {
        if let Ok(mut session) = self.session.lock() {
            *session = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_flow() {
        let identity = LocalIdentity::new(User::new("me").with_name("Me"));
        assert!(identity.current_session().await.unwrap().is_none());

        let challenge = identity.begin_sign_in(SsoStrategy::OauthGoogle).await.unwrap();
        let session = identity.complete_sign_in(&challenge).await.unwrap();
        assert_eq!(session.user.id, "me");
        assert!(identity.current_session().await.unwrap().is_some());

        identity.sign_out().await.unwrap();
        assert!(identity.current_session().await.unwrap().is_none());
        assert!(identity.begin_sign_in(SsoStrategy::Passkey).await.is_err());
    }
}
