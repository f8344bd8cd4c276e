//! Chat endpoint, authenticated and guest.

use crate::http::{Auth, HttpApi, decode};
use async_trait::async_trait;
use lyra_core::conversation::ChatMessage;
use lyra_core::error::Result;
use lyra_core::i18n::LanguageTag;
use lyra_core::services::{ChatOutcome, ChatService};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct ChatRequest<'a> {
    text: &'a str,
    // Older backend revisions read `content`; both are sent
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    conversation_id: Option<i64>,
    language: &'a str,
}

#[derive(Serialize)]
struct GuestChatRequest<'a> {
    text: &'a str,
    history: &'a [ChatMessage],
    language: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    reply: String,
    #[serde(default)]
    conversation_id: Option<i64>,
}

#[async_trait]
impl ChatService for HttpApi {
    async fn send(
        &self,
        text: &str,
        conversation_id: Option<i64>,
        language: LanguageTag,
    ) -> Result<ChatOutcome> {
        let request = ChatRequest {
            text,
            content: text,
            conversation_id,
            language: language.as_str(),
        };
        let body = self.post_json("/chat/", &request, Auth::Required).await?;
        let response: ChatResponse = decode(body)?;
        Ok(ChatOutcome {
            reply: response.reply,
            conversation_id: response.conversation_id,
        })
    }

    async fn send_guest(
        &self,
        text: &str,
        history: &[ChatMessage],
        language: LanguageTag,
    ) -> Result<String> {
        let request = GuestChatRequest {
            text,
            history,
            language: language.as_str(),
        };
        let body = self.post_json("/chat/", &request, Auth::Optional).await?;
        let response: ChatResponse = decode(body)?;
        Ok(response.reply)
    }
}
