//! Backend service traits.
//!
//! These traits define the contract between the application layer and the
//! remote backend, decoupling use cases from the HTTP transport. The
//! `lyra-client` crate provides the production implementation; tests use
//! in-memory mocks.

use crate::conversation::{ChatMessage, Conversation, ConversationSummary};
use crate::error::Result;
use crate::i18n::LanguageTag;
use crate::user::UserProfile;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Payload for account registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub account_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    /// JSON-encoded list, the form the backend stores.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interests: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    /// `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
}

/// Result of an email availability probe.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EmailAvailability {
    pub available: bool,
    #[serde(default)]
    pub message: String,
}

/// Partial profile update; `None` fields are left untouched server-side.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub nickname: Option<String>,
    pub email: Option<String>,
    pub birth_date: Option<String>,
    pub interests: Option<Vec<String>>,
    /// Path of an avatar image to upload.
    pub image: Option<PathBuf>,
}

/// Outcome of an authenticated chat turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatOutcome {
    pub reply: String,
    /// Set when the backend allocated a conversation for this turn.
    pub conversation_id: Option<i64>,
}

/// Account and profile operations.
#[async_trait]
pub trait AccountService: Send + Sync {
    /// Exchanges credentials for a bearer token.
    async fn login(&self, email: &str, password: &str) -> Result<String>;

    /// Fetches the profile of the authenticated user.
    async fn current_user(&self) -> Result<UserProfile>;

    /// Creates an account and returns the created profile.
    async fn register(&self, request: &RegisterRequest) -> Result<UserProfile>;

    /// Checks whether an email is free to register.
    async fn check_email(&self, email: &str) -> Result<EmailAvailability>;

    /// Updates the authenticated user's profile and returns the new state.
    async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile>;

    /// Permanently deletes the authenticated user's account.
    async fn delete_account(&self) -> Result<()>;
}

/// Conversation management operations.
#[async_trait]
pub trait ConversationService: Send + Sync {
    /// Lists conversation summaries in server-defined order.
    async fn list(&self) -> Result<Vec<ConversationSummary>>;

    /// Fetches one conversation with its full message history.
    async fn get(&self, id: i64) -> Result<Conversation>;

    async fn duplicate(&self, id: i64) -> Result<()>;

    async fn rename(&self, id: i64, title: &str) -> Result<()>;

    async fn delete(&self, id: i64) -> Result<()>;
}

/// Chat turns, authenticated and guest.
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Sends an authenticated chat turn. `conversation_id` is `None` for the
    /// first message of a new conversation; the backend then allocates one.
    async fn send(
        &self,
        text: &str,
        conversation_id: Option<i64>,
        language: LanguageTag,
    ) -> Result<ChatOutcome>;

    /// Sends a guest chat turn carrying the prior client-side history.
    /// A rate-limit rejection surfaces as `LyraError::RateLimited`.
    async fn send_guest(
        &self,
        text: &str,
        history: &[ChatMessage],
        language: LanguageTag,
    ) -> Result<String>;
}
