//! Wires the core services for either the hosted backend or the offline store.

use std::sync::Arc;

use parlor_core::identity::IdentityProvider;
use parlor_core::models::NewMessage;
use parlor_core::{
    AssistantClient, ClerkClient, FileTokenCache, GeminiClient, InMemoryBackend, LocalIdentity,
    NewChatRoom, ParlorConfig, ParlorError, ParlorResult, ServiceContext, User,
};
use serde_json::Value;
use tracing::info;

/// Rooms created in the offline store on startup.
const SEED_ROOMS: &[(&str, &str)] = &[
    ("General", "Anything goes"),
    ("Random", "Links, jokes and off-topic chatter"),
    ("Support", "Ask @ai for help"),
];

pub struct Services {
    pub ctx: ServiceContext,
    pub identity: Arc<dyn IdentityProvider>,
    store: Option<Arc<InMemoryBackend>>,
}

impl Services {
    /// Hosted backend with the cached identity session.
    pub fn connect(config: &ParlorConfig) -> ParlorResult<Self> {
        let cache = Arc::new(FileTokenCache::default_location()?);
        let identity = ClerkClient::new(&config.identity, cache)?;
        info!(endpoint = %config.backend.endpoint, "Using hosted backend");
        Ok(Self {
            ctx: ServiceContext::from_config(config)?,
            identity: Arc::new(identity),
            store: None,
        })
    }

    /// In-memory backend seeded with a few rooms and a local identity.
    pub fn offline(config: &ParlorConfig) -> ParlorResult<Self> {
        let backend = Arc::new(InMemoryBackend::new(
            config.backend.database_id.clone(),
            config.backend.bucket_id.clone(),
        ));
        seed(&backend, config)?;

        let assistant: Arc<dyn AssistantClient> = Arc::new(GeminiClient::new(&config.assistant));
        let viewer = User::new("local-user").with_name("You");
        info!("Using offline backend");
        Ok(Self {
            ctx: ServiceContext::in_memory(config, backend.clone(), assistant),
            identity: Arc::new(LocalIdentity::new(viewer)),
            store: Some(backend),
        })
    }

    pub fn is_offline(&self) -> bool {
        self.store.is_some()
    }

    /// The in-memory store behind offline mode.
    pub fn offline_store(&self) -> Option<&Arc<InMemoryBackend>> {
        self.store.as_ref()
    }
}

fn seed(backend: &InMemoryBackend, config: &ParlorConfig) -> ParlorResult<()> {
    let rooms = &config.backend.chatrooms_collection_id;
    let messages = &config.backend.messages_collection_id;

    for (title, description) in SEED_ROOMS {
        let room = backend.insert(
            rooms,
            serde_json::to_value(NewChatRoom::new(*title, *description)?)?,
        )?;
        let room_id = room
            .get("$id")
            .and_then(Value::as_str)
            .ok_or_else(|| ParlorError::Internal("seeded room has no id".to_string()))?;

        let welcome = NewMessage::assistant(
            room_id,
            format!("Welcome to {}. Mention @ai to ask me anything.", title),
        );
        backend.insert(messages, serde_json::to_value(welcome)?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_offline_services_are_seeded() {
        let services = Services::offline(&ParlorConfig::offline()).unwrap();
        assert!(services.is_offline());

        let rooms = services.ctx.list_rooms().await.unwrap();
        assert_eq!(rooms.len(), SEED_ROOMS.len());

        let general = rooms.iter().find(|r| r.title == "General").unwrap();
        let messages = services.ctx.list_messages(general.id()).await.unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].is_assistant());
    }

    #[tokio::test]
    async fn test_offline_identity_signs_in() {
        let services = Services::offline(&ParlorConfig::offline()).unwrap();
        assert!(services.identity.current_session().await.unwrap().is_none());

        let challenge = services
            .identity
            .begin_sign_in(parlor_core::SsoStrategy::OauthGoogle)
            .await
            .unwrap();
        let session = services.identity.complete_sign_in(&challenge).await.unwrap();
        assert_eq!(session.user.display_name(), "You");
    }
}
