use async_trait::async_trait;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{
    ensure_supported, CachedTokens, IdentityProvider, Session, SsoChallenge, SsoStrategy,
    TokenCache,
};
use crate::config::IdentityConfig;
use crate::error::{ParlorError, ParlorResult};
use crate::models::User;

/// Frontend API client for the hosted identity provider.
pub struct ClerkClient {
    http: Client,
    frontend_api: String,
    redirect_url: String,
    cache: Arc<dyn TokenCache>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    response: Option<T>,
    client: Option<ClientResource>,
}

#[derive(Debug, Deserialize)]
struct ErrorsBody {
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    #[serde(default)]
    long_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SignInAttempt {
    id: String,
    status: String,
    #[serde(default)]
    first_factor_verification: Option<Verification>,
    #[serde(default)]
    created_session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Verification {
    #[serde(default)]
    external_verification_redirect_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ClientResource {
    #[serde(default)]
    sessions: Vec<SessionResource>,
    #[serde(default)]
    last_active_session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SessionResource {
    id: String,
    user: UserResource,
}

#[derive(Debug, Deserialize)]
struct UserResource {
    id: String,
    first_name: Option<String>,
    last_name: Option<String>,
    #[serde(default)]
    email_addresses: Vec<EmailAddress>,
    primary_email_address_id: Option<String>,
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmailAddress {
    id: String,
    email_address: String,
}

impl From<UserResource> for User {
    fn from(resource: UserResource) -> Self {
        let full_name = match (resource.first_name, resource.last_name) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            (Some(first), None) => Some(first),
            (None, Some(last)) => Some(last),
            (None, None) => None,
        };
        let email = resource
            .email_addresses
            .iter()
            .find(|e| Some(&e.id) == resource.primary_email_address_id.as_ref())
            .or_else(|| resource.email_addresses.first())
            .map(|e| e.email_address.clone());
        User {
            id: resource.id,
            full_name,
            email,
            image_url: resource.image_url,
        }
    }
}

/// Decodes `pk_<env>_<base64(host$)>` into `https://host`.
pub fn frontend_api_from_key(publishable_key: &str) -> ParlorResult<String> {
    let encoded = publishable_key
        .strip_prefix("pk_test_")
        .or_else(|| publishable_key.strip_prefix("pk_live_"))
        .ok_or_else(|| ParlorError::InvalidPublishableKey("unknown key prefix".to_string()))?;

    let decoded = STANDARD
        .decode(encoded)
        .or_else(|_| STANDARD_NO_PAD.decode(encoded))
        .map_err(|e| ParlorError::InvalidPublishableKey(e.to_string()))?;
    let host = String::from_utf8(decoded)
        .map_err(|e| ParlorError::InvalidPublishableKey(e.to_string()))?;
    let host = host.trim_end_matches('$');
    if host.is_empty() {
        return Err(ParlorError::InvalidPublishableKey("empty host".to_string()));
    }
    Ok(format!("https://{}", host))
}

impl ClerkClient {
    pub fn new(config: &IdentityConfig, cache: Arc<dyn TokenCache>) -> ParlorResult<Self> {
        let frontend_api = match &config.frontend_api_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => frontend_api_from_key(&config.publishable_key)?,
        };
        let http = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            http,
            frontend_api,
            redirect_url: config.redirect_url.clone(),
            cache,
        })
    }

    pub fn frontend_api(&self) -> &str {
        &self.frontend_api
    }

    fn with_client_token(&self, builder: RequestBuilder) -> ParlorResult<RequestBuilder> {
        let tokens = self.cache.load()?;
        let builder = builder.query(&[("_is_native", "true")]);
        Ok(match tokens.client_token {
            Some(token) => builder.header("Authorization", token),
            None => builder,
        })
    }

    /// Stores the rotated client token and decodes the body, or turns provider errors into codes.
    async fn read<T: serde::de::DeserializeOwned>(
        &self,
        response: Response,
    ) -> ParlorResult<Envelope<T>> {
        if let Some(token) = response
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
        {
            let mut tokens = self.cache.load()?;
            tokens.client_token = Some(token.to_string());
            self.cache.save(&tokens)?;
        }

        let status = response.status();
        if !status.is_success() {
            let body = response.json::<ErrorsBody>().await.unwrap_or(ErrorsBody {
                errors: Vec::new(),
            });
            for error in &body.errors {
                debug!(code = %error.code, detail = ?error.long_message, "Identity provider error");
            }
            let mut codes: Vec<String> = body.errors.into_iter().map(|e| e.code).collect();
            if codes.is_empty() {
                codes.push(format!("http_{}", status.as_u16()));
            }
            return Err(ParlorError::AuthenticationFailed { codes });
        }

        response
            .json::<Envelope<T>>()
            .await
            .map_err(|e| ParlorError::BackendParseError(e.to_string()))
    }

    fn session_from_client(client: ClientResource, wanted: Option<&str>) -> Option<Session> {
        let target = wanted
            .map(str::to_string)
            .or(client.last_active_session_id.clone())?;
        client
            .sessions
            .into_iter()
            .find(|s| s.id == target)
            .map(|s| Session {
                id: s.id,
                user: s.user.into(),
            })
    }
}

#[async_trait]
impl IdentityProvider for ClerkClient {
    async fn begin_sign_in(&self, strategy: SsoStrategy) -> ParlorResult<SsoChallenge> {
        ensure_supported(strategy)?;

        let url = format!("{}/v1/client/sign_ins", self.frontend_api);
        let request = self.with_client_token(self.http.post(&url))?.form(&[
            ("strategy", strategy.as_str()),
            ("redirect_url", self.redirect_url.as_str()),
        ]);
        let envelope: Envelope<SignInAttempt> = self.read(request.send().await?).await?;
        let attempt = envelope.response.ok_or_else(|| {
            ParlorError::BackendParseError("sign-in response missing".to_string())
        })?;

        let authorize_url = attempt
            .first_factor_verification
            .and_then(|v| v.external_verification_redirect_url)
            .ok_or_else(|| ParlorError::AuthenticationFailed {
                codes: vec!["missing_redirect_url".to_string()],
            })?;

        info!(sign_in = %attempt.id, strategy = %strategy, "Sign-in started");
        Ok(SsoChallenge {
            sign_in_id: attempt.id,
            authorize_url,
            strategy,
        })
    }

    async fn complete_sign_in(&self, challenge: &SsoChallenge) -> ParlorResult<Session> {
        let url = format!(
            "{}/v1/client/sign_ins/{}",
            self.frontend_api, challenge.sign_in_id
        );
        let request = self.with_client_token(self.http.get(&url))?;
        let envelope: Envelope<SignInAttempt> = self.read(request.send().await?).await?;
        let attempt = envelope.response.ok_or_else(|| {
            ParlorError::BackendParseError("sign-in response missing".to_string())
        })?;

        let session_id = match (attempt.status.as_str(), attempt.created_session_id) {
            ("complete", Some(id)) => id,
            (status, _) => return Err(ParlorError::SignInIncomplete(status.to_string())),
        };

        let client = envelope.client.unwrap_or_default();
        let session = Self::session_from_client(client, Some(&session_id)).ok_or_else(|| {
            ParlorError::AuthenticationFailed {
                codes: vec!["session_not_found".to_string()],
            }
        })?;

        let mut tokens = self.cache.load()?;
        tokens.session_id = Some(session.id.clone());
        self.cache.save(&tokens)?;
        info!(session = %session.id, user = %session.user.id, "Signed in");
        Ok(session)
    }

    async fn current_session(&self) -> ParlorResult<Option<Session>> {
        let tokens = self.cache.load()?;
        if tokens.client_token.is_none() {
            return Ok(None);
        }

        let url = format!("{}/v1/client", self.frontend_api);
        let request = self.with_client_token(self.http.get(&url))?;
        let envelope: Envelope<ClientResource> = self.read(request.send().await?).await?;
        let client = envelope.response.or(envelope.client).unwrap_or_default();
        Ok(Self::session_from_client(client, tokens.session_id.as_deref()))
    }

    async fn sign_out(&self) -> ParlorResult<()> {
        let tokens = self.cache.load()?;
        if let Some(session_id) = &tokens.session_id {
            let url = format!(
                "{}/v1/client/sessions/{}/remove",
                self.frontend_api, session_id
            );
            let request = self.with_client_token(self.http.post(&url))?;
            match request.send().await {
                Ok(response) => {
                    if let Err(e) = self.read::<serde_json::Value>(response).await {
                        warn!("Provider did not confirm sign-out: {}", e);
                    }
                }
                Err(e) => warn!("Sign-out request failed: {}", e),
            }
        }
        self.cache.clear()
    }
}
