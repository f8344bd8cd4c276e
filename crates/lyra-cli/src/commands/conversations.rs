//! One-shot conversation management commands.

use super::{AppContext, prompt_line};
use anyhow::Result;
use colored::Colorize;
use lyra_application::chat_controller::ChatController;
use lyra_core::conversation::MessageRole;

#[derive(clap::Subcommand)]
pub enum ConversationsAction {
    /// List conversations, most recent first (server order)
    List,
    /// Print a conversation's full history
    Show { id: i64 },
    /// Rename a conversation
    Rename { id: i64, title: String },
    /// Duplicate a conversation
    Duplicate { id: i64 },
    /// Delete a conversation
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

pub async fn run(ctx: &AppContext, action: ConversationsAction) -> Result<()> {
    if !ctx.store.is_authenticated() {
        anyhow::bail!("Not logged in. Run `lyra login <email>` first.");
    }

    let controller = ChatController::new(
        ctx.api.clone(),
        ctx.api.clone(),
        ctx.store.clone(),
        ctx.expiry.clone(),
    );

    match action {
        ConversationsAction::List => {
            let list = controller.list_conversations().await?;
            if list.is_empty() {
                println!("No conversations yet.");
            }
            for conversation in &list {
                println!(
                    "[{}] {} ({})",
                    conversation.id,
                    conversation.display_title(),
                    conversation.display_timestamp()
                );
            }
        }
        ConversationsAction::Show { id } => {
            let conversation = controller.load_conversation(id).await?;
            println!(
                "{}",
                conversation.summary().display_title().bold()
            );
            for message in &conversation.messages {
                let label = match message.role {
                    MessageRole::User => "you>".blue().bold(),
                    MessageRole::Assistant => "lyra>".magenta().bold(),
                };
                println!("{label} {}", message.content);
            }
        }
        ConversationsAction::Rename { id, title } => {
            controller.rename_conversation(id, &title).await?;
            println!("Renamed conversation {id}.");
        }
        ConversationsAction::Duplicate { id } => {
            controller.duplicate_conversation(id).await?;
            println!("Duplicated conversation {id}.");
        }
        ConversationsAction::Delete { id, yes } => {
            if !yes {
                let answer = prompt_line(&format!("Delete conversation {id}? [y/N] "))?;
                if !matches!(answer.as_deref(), Some("y") | Some("Y")) {
                    println!("Aborted.");
                    return Ok(());
                }
            }
            controller.delete_conversation(id).await?;
            println!("Deleted conversation {id}.");
        }
    }

    Ok(())
}
