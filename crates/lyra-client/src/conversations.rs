//! Conversation management endpoints.

use crate::http::{Auth, HttpApi, decode};
use async_trait::async_trait;
use lyra_core::conversation::{Conversation, ConversationSummary};
use lyra_core::error::Result;
use lyra_core::services::ConversationService;
use serde::Serialize;

#[derive(Serialize)]
struct RenameRequest<'a> {
    title: &'a str,
}

#[async_trait]
impl ConversationService for HttpApi {
    async fn list(&self) -> Result<Vec<ConversationSummary>> {
        let body = self.get_json("/conversations/", Auth::Required).await?;
        decode(body)
    }

    async fn get(&self, id: i64) -> Result<Conversation> {
        let body = self
            .get_json(&format!("/conversations/{id}"), Auth::Required)
            .await?;
        decode(body)
    }

    async fn duplicate(&self, id: i64) -> Result<()> {
        self.post_empty(&format!("/conversations/{id}/duplicate"), Auth::Required)
            .await?;
        Ok(())
    }

    async fn rename(&self, id: i64, title: &str) -> Result<()> {
        self.put_json(
            &format!("/conversations/{id}"),
            &RenameRequest { title },
            Auth::Required,
        )
        .await?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        self.delete(&format!("/conversations/{id}"), Auth::Required)
            .await?;
        Ok(())
    }
}
