use async_trait::async_trait;
use parlor_core::{
    AssistantClient, ChatRoomSession, InMemoryBackend, ParlorConfig, ParlorError, ParlorResult,
    ReplyOptions, RoomDirectory, RoomForm, SendOutcome, ServiceContext, User,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct EchoAssistant {
    prompts: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl AssistantClient for EchoAssistant {
    fn provider_name(&self) -> &str {
        "echo"
    }

    async fn generate_reply(&self, prompt: &str, _options: &ReplyOptions) -> ParlorResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if prompt.is_empty() {
            return Err(ParlorError::AssistantRequestFailed("empty prompt".to_string()));
        }
        Ok(format!("You asked: {}", prompt))
    }
}

struct World {
    backend: Arc<InMemoryBackend>,
    ctx: ServiceContext,
    prompts: Arc<Mutex<Vec<String>>>,
}

fn world() -> World {
    let config = ParlorConfig::offline();
    let backend = Arc::new(InMemoryBackend::new("offline", "media"));
    let prompts = Arc::new(Mutex::new(Vec::new()));
    let assistant = EchoAssistant {
        prompts: prompts.clone(),
    };
    let ctx = ServiceContext::in_memory(&config, backend.clone(), Arc::new(assistant));
    World {
        backend,
        ctx,
        prompts,
    }
}

async fn create_room(w: &World, title: &str) -> String {
    let mut form = RoomForm::new();
    form.title = title.to_string();
    form.set_description("Flow test room");
    form.submit(&w.ctx).await.unwrap().id().to_string()
}

async fn join(w: &World, room_id: &str, user: User) -> ChatRoomSession {
    let mut session = ChatRoomSession::new(w.ctx.clone(), room_id, user);
    session.load().await;
    session.subscribe().await.unwrap();
    session
}

/// Waits until the subscription has delivered at least one event for the room.
async fn settle(session: &mut ChatRoomSession) -> usize {
    let mut handled = 0;
    for _ in 0..50 {
        handled += session.drain_events().await;
        if handled > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    handled
}

#[tokio::test]
async fn test_two_members_chat_with_assistant() {
    let w = world();
    let room_id = create_room(&w, "Lobby").await;

    let mut alice = join(&w, &room_id, User::new("user_a").with_name("Alice")).await;
    let mut bob = join(&w, &room_id, User::new("user_b").with_name("Bob")).await;

    alice.set_draft("hello bob");
    alice.send_text().await.unwrap();
    assert!(settle(&mut bob).await > 0);
    assert_eq!(bob.messages().len(), 1);
    assert_eq!(bob.messages()[0].sender_name, "Alice");

    bob.set_draft("@ai what time is it?");
    let outcome = bob.send_and_reply().await.unwrap();
    match outcome {
        SendOutcome::Sent {
            assistant_prompt, ..
        } => assert_eq!(assistant_prompt.as_deref(), Some("what time is it?")),
        SendOutcome::Ignored => panic!("draft was not sent"),
    }
    assert_eq!(w.prompts.lock().unwrap().as_slice(), ["what time is it?"]);

    let last = bob.messages().last().unwrap();
    assert!(last.is_assistant());
    assert_eq!(last.content, "You asked: what time is it?");

    settle(&mut alice).await;
    assert_eq!(alice.messages().len(), 3);
    assert!(alice.messages().iter().any(|m| m.is_assistant()));

    alice.close();
    bob.close();
}

#[tokio::test]
async fn test_directory_tracks_created_and_deleted_rooms() {
    let w = world();
    let lobby = create_room(&w, "Lobby").await;
    let _random = create_room(&w, "Random").await;

    let mut directory = RoomDirectory::new();
    directory.refresh(&w.ctx).await;
    assert_eq!(directory.rooms().len(), 2);
    assert_eq!(directory.find(&lobby).unwrap().description, "Flow test room");

    let mut session = join(&w, &lobby, User::new("user_a")).await;
    session.set_draft("first");
    session.send_text().await.unwrap();
    session.set_draft("second");
    session.send_text().await.unwrap();

    let outcome = session.delete_room().await.unwrap();
    assert_eq!(outcome.messages_deleted, 2);
    assert_eq!(w.backend.document_count("messages"), 0);

    directory.refresh(&w.ctx).await;
    assert_eq!(directory.rooms().len(), 1);
    assert!(directory.find(&lobby).is_none());
}

#[tokio::test]
async fn test_reopened_room_shows_history_oldest_first() {
    let w = world();
    let room_id = create_room(&w, "History").await;

    let mut first = join(&w, &room_id, User::new("user_a")).await;
    for text in ["one", "two", "three"] {
        first.set_draft(text);
        first.send_text().await.unwrap();
    }
    first.close();

    let reopened = join(&w, &room_id, User::new("user_b")).await;
    let contents: Vec<&str> = reopened
        .messages()
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(contents, ["one", "two", "three"]);
}
