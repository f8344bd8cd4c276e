//! Use cases for the Lyra client.
//!
//! This crate wires the backend services, the local session store and the
//! clock into the flows the presentation layer drives: authentication and
//! session lifecycle, the authenticated conversation controller, the guest
//! chat with its rate-limit guard, and transient UI coordination.

pub mod auth_usecase;
pub mod chat_controller;
pub mod guest;
pub mod ui_state;

pub use auth_usecase::{AuthUsecase, SessionExpiredHook, SessionExpiry};
pub use chat_controller::{ChatController, ChatState, TranscriptEntry, MAX_MESSAGE_LENGTH};
pub use guest::{GuardTick, GuestChatUsecase, RateLimitGuard, format_remaining};
pub use ui_state::{ModalState, UiAction, UiCoordinator};

use lyra_core::error::{LyraError, Result};

/// Validates outbound chat text for both the guest and authenticated flows:
/// non-empty after trimming and at most [`MAX_MESSAGE_LENGTH`] characters.
pub(crate) fn validate_message_text(text: &str) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(LyraError::validation("message", "message is empty"));
    }
    if trimmed.chars().count() > chat_controller::MAX_MESSAGE_LENGTH {
        return Err(LyraError::validation(
            "message",
            format!(
                "message exceeds {} characters",
                chat_controller::MAX_MESSAGE_LENGTH
            ),
        ));
    }
    Ok(trimmed)
}
