//! Authenticated conversation controller.
//!
//! Tracks which conversation is active (id equality, at most one), keeps the
//! sidebar list view consistent with server state after each mutation, and
//! holds the transcript as explicit `Pending`/`Confirmed` entries so that
//! reconciling an optimistic send is a state transition rather than implicit
//! patching.
//!
//! Operations are not internally serialized; when two mutations race on the
//! same conversation, the last response wins in the local view.

use crate::auth_usecase::SessionExpiry;
use lyra_core::conversation::{ChatMessage, Conversation, ConversationSummary};
use lyra_core::error::{LyraError, Result};
use lyra_core::services::{ChatService, ConversationService};
use lyra_infrastructure::session_store::SessionStore;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mirror of the server-side input limit; enforced locally before sending.
pub const MAX_MESSAGE_LENGTH: usize = 500;

/// A transcript entry, tagged by whether the backend has confirmed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEntry {
    /// Optimistically appended, not yet acknowledged.
    Pending(ChatMessage),
    /// Acknowledged by the backend (or loaded from history).
    Confirmed(ChatMessage),
}

impl TranscriptEntry {
    pub fn message(&self) -> &ChatMessage {
        match self {
            Self::Pending(message) | Self::Confirmed(message) => message,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

/// Local view of the authenticated chat screen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatState {
    /// Id of the conversation outgoing messages target; `None` means a fresh
    /// conversation the backend will allocate on first send.
    pub active_id: Option<i64>,
    /// Displayed transcript, oldest first.
    pub transcript: Vec<TranscriptEntry>,
    /// Last fetched list view, in server order.
    pub conversations: Vec<ConversationSummary>,
}

/// Mediates conversation operations against the backend and keeps the local
/// view consistent.
pub struct ChatController {
    conversations: Arc<dyn ConversationService>,
    chat: Arc<dyn ChatService>,
    store: Arc<SessionStore>,
    expiry: Arc<SessionExpiry>,
    state: RwLock<ChatState>,
}

impl ChatController {
    pub fn new(
        conversations: Arc<dyn ConversationService>,
        chat: Arc<dyn ChatService>,
        store: Arc<SessionStore>,
        expiry: Arc<SessionExpiry>,
    ) -> Self {
        Self {
            conversations,
            chat,
            store,
            expiry,
            state: RwLock::new(ChatState::default()),
        }
    }

    /// A snapshot of the current local view.
    pub async fn state(&self) -> ChatState {
        self.state.read().await.clone()
    }

    pub async fn active_id(&self) -> Option<i64> {
        self.state.read().await.active_id
    }

    /// Fetches the conversation list fresh from the backend (never cached)
    /// and updates the local view. Server order is preserved.
    pub async fn list_conversations(&self) -> Result<Vec<ConversationSummary>> {
        let list = self.note_auth_failure(self.conversations.list().await)?;
        self.state.write().await.conversations = list.clone();
        Ok(list)
    }

    /// Loads a conversation's full history and makes it active.
    pub async fn load_conversation(&self, id: i64) -> Result<Conversation> {
        let conversation = self.note_auth_failure(self.conversations.get(id).await)?;
        {
            let mut state = self.state.write().await;
            state.active_id = Some(id);
            state.transcript = conversation
                .messages
                .iter()
                .cloned()
                .map(TranscriptEntry::Confirmed)
                .collect();
        }
        self.refresh_list_best_effort().await;
        Ok(conversation)
    }

    /// Resets to a fresh conversation. Purely local: the backend allocates a
    /// conversation implicitly on the first message send.
    pub async fn new_conversation(&self) {
        let mut state = self.state.write().await;
        state.active_id = None;
        state.transcript.clear();
    }

    /// Sends a chat turn for the active conversation.
    ///
    /// The user turn is appended as `Pending` before the request goes out;
    /// on success it flips to `Confirmed` and the assistant reply is
    /// appended. If the backend allocated a conversation id, it becomes the
    /// active one and the list is refreshed once. On failure the pending
    /// entry is rolled back and the error surfaces to the caller; there is
    /// no automatic retry.
    pub async fn send_message(&self, text: &str) -> Result<String> {
        let text = crate::validate_message_text(text)?.to_string();
        let language = self.store.language().unwrap_or_default();

        let (pending_index, conversation_id) = {
            let mut state = self.state.write().await;
            state
                .transcript
                .push(TranscriptEntry::Pending(ChatMessage::user(text.clone())));
            (state.transcript.len() - 1, state.active_id)
        };

        let outcome = match self.chat.send(&text, conversation_id, language).await {
            Ok(outcome) => outcome,
            Err(err) => {
                if err.is_auth() {
                    self.expiry.invalidate();
                }
                let mut state = self.state.write().await;
                if state
                    .transcript
                    .get(pending_index)
                    .is_some_and(TranscriptEntry::is_pending)
                {
                    state.transcript.remove(pending_index);
                }
                return Err(err);
            }
        };

        let adopted_new_id = {
            let mut state = self.state.write().await;
            if let Some(entry) = state.transcript.get_mut(pending_index) {
                if let TranscriptEntry::Pending(message) = entry {
                    *entry = TranscriptEntry::Confirmed(message.clone());
                }
            }
            state
                .transcript
                .push(TranscriptEntry::Confirmed(ChatMessage::assistant(
                    outcome.reply.clone(),
                )));

            match (state.active_id, outcome.conversation_id) {
                (None, Some(id)) => {
                    state.active_id = Some(id);
                    true
                }
                _ => false,
            }
        };

        if adopted_new_id {
            self.refresh_list_best_effort().await;
        }

        Ok(outcome.reply)
    }

    pub async fn duplicate_conversation(&self, id: i64) -> Result<()> {
        self.note_auth_failure(self.conversations.duplicate(id).await)?;
        self.refresh_list_best_effort().await;
        Ok(())
    }

    pub async fn rename_conversation(&self, id: i64, title: &str) -> Result<()> {
        let title = title.trim();
        if title.is_empty() {
            return Err(LyraError::validation("title", "title is required"));
        }
        self.note_auth_failure(self.conversations.rename(id, title).await)?;
        self.refresh_list_best_effort().await;
        Ok(())
    }

    /// Deletes a conversation. If it was the active one, the controller
    /// resets to the fresh new-conversation state so the view never targets
    /// a conversation that no longer exists.
    pub async fn delete_conversation(&self, id: i64) -> Result<()> {
        self.note_auth_failure(self.conversations.delete(id).await)?;
        {
            let mut state = self.state.write().await;
            if state.active_id == Some(id) {
                state.active_id = None;
                state.transcript.clear();
            }
        }
        self.refresh_list_best_effort().await;
        Ok(())
    }

    /// List refreshes after mutations are best-effort: the mutation already
    /// succeeded, so a refresh failure is logged rather than surfaced.
    async fn refresh_list_best_effort(&self) {
        if let Err(err) = self.list_conversations().await {
            tracing::warn!(target: "chat", "Could not refresh conversation list: {}", err);
        }
    }

    fn note_auth_failure<T>(&self, result: Result<T>) -> Result<T> {
        if matches!(result, Err(LyraError::Auth)) {
            self.expiry.invalidate();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lyra_core::i18n::LanguageTag;
    use lyra_core::services::ChatOutcome;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn summary(id: i64, title: &str) -> ConversationSummary {
        ConversationSummary {
            id,
            title: Some(title.to_string()),
            created_at: "2025-01-01T00:00:00Z".to_string(),
            updated_at: None,
        }
    }

    /// Backend double implementing both service traits with scripted
    /// responses and call counters.
    struct MockBackend {
        list_calls: AtomicUsize,
        send_calls: AtomicUsize,
        listed: Mutex<Vec<ConversationSummary>>,
        send_result: Mutex<Option<Result<ChatOutcome>>>,
        loaded: Mutex<Option<Conversation>>,
    }

    impl MockBackend {
        fn new() -> Self {
            Self {
                list_calls: AtomicUsize::new(0),
                send_calls: AtomicUsize::new(0),
                listed: Mutex::new(Vec::new()),
                send_result: Mutex::new(None),
                loaded: Mutex::new(None),
            }
        }

        fn script_send(&self, result: Result<ChatOutcome>) {
            *self.send_result.lock().unwrap() = Some(result);
        }
    }

    #[async_trait]
    impl ConversationService for MockBackend {
        async fn list(&self) -> Result<Vec<ConversationSummary>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.listed.lock().unwrap().clone())
        }

        async fn get(&self, _id: i64) -> Result<Conversation> {
            Ok(self.loaded.lock().unwrap().clone().unwrap())
        }

        async fn duplicate(&self, _id: i64) -> Result<()> {
            Ok(())
        }

        async fn rename(&self, _id: i64, _title: &str) -> Result<()> {
            Ok(())
        }

        async fn delete(&self, id: i64) -> Result<()> {
            self.listed.lock().unwrap().retain(|c| c.id != id);
            Ok(())
        }
    }

    #[async_trait]
    impl ChatService for MockBackend {
        async fn send(
            &self,
            _text: &str,
            _conversation_id: Option<i64>,
            _language: LanguageTag,
        ) -> Result<ChatOutcome> {
            self.send_calls.fetch_add(1, Ordering::SeqCst);
            self.send_result.lock().unwrap().take().unwrap()
        }

        async fn send_guest(
            &self,
            _text: &str,
            _history: &[ChatMessage],
            _language: LanguageTag,
        ) -> Result<String> {
            unreachable!("guest flow is not exercised here")
        }
    }

    fn setup() -> (TempDir, Arc<MockBackend>, ChatController, Arc<SessionStore>) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SessionStore::open(dir.path().join("session.toml")));
        let expiry = Arc::new(SessionExpiry::new(store.clone()));
        let backend = Arc::new(MockBackend::new());
        let controller = ChatController::new(
            backend.clone(),
            backend.clone(),
            store.clone(),
            expiry,
        );
        (dir, backend, controller, store)
    }

    #[tokio::test]
    async fn send_adopts_new_conversation_id_and_refreshes_once() {
        let (_dir, backend, controller, _store) = setup();
        backend.script_send(Ok(ChatOutcome {
            reply: "hi".to_string(),
            conversation_id: Some(1),
        }));
        *backend.listed.lock().unwrap() = vec![summary(1, "hello")];

        let reply = controller.send_message("hello").await.unwrap();
        assert_eq!(reply, "hi");

        let state = controller.state().await;
        assert_eq!(state.active_id, Some(1));
        assert_eq!(backend.list_calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            state.transcript,
            vec![
                TranscriptEntry::Confirmed(ChatMessage::user("hello")),
                TranscriptEntry::Confirmed(ChatMessage::assistant("hi")),
            ]
        );
    }

    #[tokio::test]
    async fn send_with_active_conversation_does_not_refresh() {
        let (_dir, backend, controller, _store) = setup();
        *backend.loaded.lock().unwrap() = Some(Conversation {
            id: 5,
            title: Some("t".to_string()),
            created_at: "2025-01-01T00:00:00Z".to_string(),
            updated_at: None,
            messages: vec![ChatMessage::user("old")],
        });
        controller.load_conversation(5).await.unwrap();
        let list_calls_after_load = backend.list_calls.load(Ordering::SeqCst);

        backend.script_send(Ok(ChatOutcome {
            reply: "sure".to_string(),
            conversation_id: Some(5),
        }));
        controller.send_message("more").await.unwrap();

        assert_eq!(controller.active_id().await, Some(5));
        assert_eq!(
            backend.list_calls.load(Ordering::SeqCst),
            list_calls_after_load
        );
    }

    #[tokio::test]
    async fn send_failure_rolls_back_the_pending_entry() {
        let (_dir, backend, controller, _store) = setup();
        backend.script_send(Err(LyraError::transport("connection refused")));

        let err = controller.send_message("hello").await.unwrap_err();
        assert!(matches!(err, LyraError::Transport(_)));

        let state = controller.state().await;
        assert!(state.transcript.is_empty());
        assert_eq!(state.active_id, None);
    }

    #[tokio::test]
    async fn send_rejects_empty_and_oversized_messages_locally() {
        let (_dir, backend, controller, _store) = setup();

        assert!(controller.send_message("   ").await.is_err());
        let oversized = "x".repeat(MAX_MESSAGE_LENGTH + 1);
        assert!(controller.send_message(&oversized).await.is_err());

        // Fail-fast: nothing went out
        assert_eq!(backend.send_calls.load(Ordering::SeqCst), 0);
        assert!(controller.state().await.transcript.is_empty());
    }

    #[tokio::test]
    async fn deleting_the_active_conversation_resets_to_a_fresh_state() {
        let (_dir, backend, controller, _store) = setup();
        *backend.listed.lock().unwrap() = vec![summary(7, "a"), summary(8, "b")];
        *backend.loaded.lock().unwrap() = Some(Conversation {
            id: 7,
            title: Some("a".to_string()),
            created_at: "2025-01-01T00:00:00Z".to_string(),
            updated_at: None,
            messages: vec![ChatMessage::user("oi"), ChatMessage::assistant("olá")],
        });
        controller.load_conversation(7).await.unwrap();

        controller.delete_conversation(7).await.unwrap();

        let state = controller.state().await;
        assert_eq!(state.active_id, None);
        assert!(state.transcript.is_empty());
        assert!(state.conversations.iter().all(|c| c.id != 7));
    }

    #[tokio::test]
    async fn deleting_another_conversation_keeps_the_active_one() {
        let (_dir, backend, controller, _store) = setup();
        *backend.listed.lock().unwrap() = vec![summary(7, "a"), summary(8, "b")];
        *backend.loaded.lock().unwrap() = Some(Conversation {
            id: 7,
            title: Some("a".to_string()),
            created_at: "2025-01-01T00:00:00Z".to_string(),
            updated_at: None,
            messages: vec![],
        });
        controller.load_conversation(7).await.unwrap();

        controller.delete_conversation(8).await.unwrap();

        assert_eq!(controller.active_id().await, Some(7));
    }

    #[tokio::test]
    async fn auth_failure_on_list_invalidates_the_session() {
        let (_dir, _backend, _controller, store) = setup();
        store.set_token("tok");
        let expiry = Arc::new(SessionExpiry::new(store.clone()));

        struct AuthFailing;
        #[async_trait]
        impl ConversationService for AuthFailing {
            async fn list(&self) -> Result<Vec<ConversationSummary>> {
                Err(LyraError::Auth)
            }
            async fn get(&self, _id: i64) -> Result<Conversation> {
                Err(LyraError::Auth)
            }
            async fn duplicate(&self, _id: i64) -> Result<()> {
                Err(LyraError::Auth)
            }
            async fn rename(&self, _id: i64, _title: &str) -> Result<()> {
                Err(LyraError::Auth)
            }
            async fn delete(&self, _id: i64) -> Result<()> {
                Err(LyraError::Auth)
            }
        }
        #[async_trait]
        impl ChatService for AuthFailing {
            async fn send(
                &self,
                _text: &str,
                _conversation_id: Option<i64>,
                _language: LanguageTag,
            ) -> Result<ChatOutcome> {
                Err(LyraError::Auth)
            }
            async fn send_guest(
                &self,
                _text: &str,
                _history: &[ChatMessage],
                _language: LanguageTag,
            ) -> Result<String> {
                Err(LyraError::Auth)
            }
        }

        let failing = Arc::new(AuthFailing);
        let controller =
            ChatController::new(failing.clone(), failing, store.clone(), expiry.clone());

        assert!(controller.list_conversations().await.unwrap_err().is_auth());
        assert!(expiry.has_fired());
        assert!(!store.is_authenticated());
    }
}
