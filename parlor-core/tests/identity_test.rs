use parlor_core::error::ParlorError;
use parlor_core::identity::{
    CachedTokens, ClerkClient, IdentityProvider, MemoryTokenCache, SsoStrategy, TokenCache,
};
use parlor_core::IdentityConfig;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> IdentityConfig {
    IdentityConfig {
        publishable_key: "pk_test_unused".to_string(),
        redirect_url: "parlor://sso-callback".to_string(),
        frontend_api_url: Some(server.uri()),
    }
}

fn client_resource() -> serde_json::Value {
    json!({
        "object": "client",
        "id": "client_1",
        "last_active_session_id": "sess_1",
        "sessions": [{
            "id": "sess_1",
            "status": "active",
            "user": {
                "id": "user_a",
                "first_name": "Ada",
                "last_name": "Lovelace",
                "primary_email_address_id": "e1",
                "email_addresses": [{"id": "e1", "email_address": "ada@example.com"}],
                "image_url": "https://img.example.com/ada.png"
            }
        }]
    })
}

#[tokio::test]
async fn test_begin_sign_in_returns_authorize_url_and_rotates_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/client/sign_ins"))
        .and(query_param("_is_native", "true"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("authorization", "client-token-1")
                .set_body_json(json!({
                    "response": {
                        "id": "sia_1",
                        "status": "needs_first_factor",
                        "first_factor_verification": {
                            "status": "unverified",
                            "strategy": "oauth_google",
                            "external_verification_redirect_url": "https://accounts.google.com/o/oauth2/auth?x=1"
                        }
                    },
                    "client": null
                })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(MemoryTokenCache::default());
    let clerk = ClerkClient::new(&config_for(&server), cache.clone()).unwrap();
    let challenge = clerk.begin_sign_in(SsoStrategy::OauthGoogle).await.unwrap();

    assert_eq!(challenge.sign_in_id, "sia_1");
    assert!(challenge.authorize_url.starts_with("https://accounts.google.com"));
    assert_eq!(
        cache.load().unwrap().client_token.as_deref(),
        Some("client-token-1")
    );
}

#[tokio::test]
async fn test_complete_sign_in_yields_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/client/sign_ins/sia_1"))
        .and(header("authorization", "client-token-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {
                "id": "sia_1",
                "status": "complete",
                "created_session_id": "sess_1"
            },
            "client": client_resource()
        })))
        .mount(&server)
        .await;

    let cache = Arc::new(MemoryTokenCache::default());
    cache
        .save(&CachedTokens {
            client_token: Some("client-token-1".to_string()),
            session_id: None,
        })
        .unwrap();
    let clerk = ClerkClient::new(&config_for(&server), cache.clone()).unwrap();
    let challenge = parlor_core::SsoChallenge {
        sign_in_id: "sia_1".to_string(),
        authorize_url: String::new(),
        strategy: SsoStrategy::OauthGoogle,
    };

    let session = clerk.complete_sign_in(&challenge).await.unwrap();
    assert_eq!(session.id, "sess_1");
    assert_eq!(session.user.display_name(), "Ada Lovelace");
    assert_eq!(session.user.email.as_deref(), Some("ada@example.com"));
    assert_eq!(cache.load().unwrap().session_id.as_deref(), Some("sess_1"));
}

#[tokio::test]
async fn test_incomplete_attempt_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/client/sign_ins/sia_2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {"id": "sia_2", "status": "needs_first_factor"},
            "client": null
        })))
        .mount(&server)
        .await;

    let clerk = ClerkClient::new(
        &config_for(&server),
        Arc::new(MemoryTokenCache::default()),
    )
    .unwrap();
    let challenge = parlor_core::SsoChallenge {
        sign_in_id: "sia_2".to_string(),
        authorize_url: String::new(),
        strategy: SsoStrategy::OauthGoogle,
    };

    let err = clerk.complete_sign_in(&challenge).await.unwrap_err();
    assert!(matches!(err, ParlorError::SignInIncomplete(ref s) if s == "needs_first_factor"));
}

#[tokio::test]
async fn test_provider_errors_become_codes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/client/sign_ins"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "errors": [
                {"code": "strategy_for_user_invalid", "message": "invalid", "long_message": "Invalid strategy"},
                {"code": "form_param_missing", "message": "missing"}
            ]
        })))
        .mount(&server)
        .await;

    let clerk = ClerkClient::new(
        &config_for(&server),
        Arc::new(MemoryTokenCache::default()),
    )
    .unwrap();
    let err = clerk
        .begin_sign_in(SsoStrategy::OauthGoogle)
        .await
        .unwrap_err();

    assert_eq!(
        err.auth_codes(),
        vec!["strategy_for_user_invalid", "form_param_missing"]
    );
    assert_eq!(
        err.to_string(),
        "[E3002] Sign-in failed: strategy_for_user_invalid, form_param_missing"
    );
}

#[tokio::test]
async fn test_passkey_is_refused_without_a_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let clerk = ClerkClient::new(
        &config_for(&server),
        Arc::new(MemoryTokenCache::default()),
    )
    .unwrap();
    let err = clerk.begin_sign_in(SsoStrategy::Passkey).await.unwrap_err();
    assert_eq!(err.to_string(), "[E3004] Passkeys not available");
}

#[tokio::test]
async fn test_restore_and_sign_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/client"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": client_resource(),
            "client": null
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/client/sessions/sess_1/remove"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "response": {"id": "sess_1", "status": "removed"},
            "client": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cache = Arc::new(MemoryTokenCache::default());
    let clerk = ClerkClient::new(&config_for(&server), cache.clone()).unwrap();
    assert!(clerk.current_session().await.unwrap().is_none());

    cache
        .save(&CachedTokens {
            client_token: Some("client-token-1".to_string()),
            session_id: Some("sess_1".to_string()),
        })
        .unwrap();
    let restored = clerk.current_session().await.unwrap().unwrap();
    assert_eq!(restored.user.id, "user_a");

    clerk.sign_out().await.unwrap();
    assert_eq!(cache.load().unwrap(), CachedTokens::default());
}
