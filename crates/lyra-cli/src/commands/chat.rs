//! Interactive chat loops, authenticated and guest.

use super::{AppContext, prompt_line};
use anyhow::Result;
use colored::Colorize;
use lyra_application::chat_controller::ChatController;
use lyra_application::guest::{GuestChatUsecase, RateLimitGuard, format_remaining};
use lyra_core::clock::SystemClock;
use lyra_core::conversation::{ChatMessage, MessageRole};
use lyra_core::error::LyraError;
use lyra_core::i18n::{IdentityTranslator, Translator};
use std::sync::Arc;

const WELCOME: &str = "Hello! I am Lyra.\nHow can I help you with your studies today?";

/// Resolves the welcome message through the translation seam, falling back
/// to the built-in text when no catalog resolves the key.
fn welcome_text(translator: &dyn Translator) -> String {
    let text = translator.translate("messages.welcome");
    if text == "messages.welcome" {
        WELCOME.to_string()
    } else {
        text
    }
}

fn print_message(message: &ChatMessage) {
    match message.role {
        MessageRole::User => println!("{} {}", "you>".blue().bold(), message.content),
        MessageRole::Assistant => println!("{} {}", "lyra>".magenta().bold(), message.content),
    }
}

fn print_error(err: &LyraError) {
    eprintln!("{}", err.to_string().red());
}

// ===== Authenticated chat =====

pub async fn run_authenticated(ctx: &AppContext) -> Result<()> {
    if !ctx.store.is_authenticated() {
        anyhow::bail!("Not logged in. Run `lyra login <email>` first.");
    }

    let controller = ChatController::new(
        ctx.api.clone(),
        ctx.api.clone(),
        ctx.store.clone(),
        ctx.expiry.clone(),
    );

    println!("{}", welcome_text(&IdentityTranslator).magenta());
    println!("Commands: /list /open <id> /new /rename <id> <title> /duplicate <id> /delete <id> /quit");

    if let Err(err) = controller.list_conversations().await {
        print_error(&err);
        if err.is_auth() {
            return Ok(());
        }
    }

    loop {
        let Some(line) = prompt_line(&format!("{} ", "you>".blue().bold()))? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix('/') {
            if !handle_command(&controller, command).await? {
                break;
            }
            continue;
        }

        match controller.send_message(line).await {
            Ok(reply) => println!("{} {}", "lyra>".magenta().bold(), reply.trim()),
            Err(err) => {
                print_error(&err);
                if err.is_auth() {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Returns `false` when the loop should stop.
async fn handle_command(controller: &ChatController, command: &str) -> Result<bool> {
    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default();

    let result = match name {
        "quit" | "exit" => return Ok(false),
        "new" => {
            controller.new_conversation().await;
            println!("Started a new conversation.");
            Ok(())
        }
        "list" => match controller.list_conversations().await {
            Ok(list) => {
                for conversation in &list {
                    let marker = if controller.active_id().await == Some(conversation.id) {
                        "*"
                    } else {
                        " "
                    };
                    println!(
                        "{marker} [{}] {} ({})",
                        conversation.id,
                        conversation.display_title(),
                        conversation.display_timestamp()
                    );
                }
                Ok(())
            }
            Err(err) => Err(err),
        },
        "open" => match parts.next().and_then(|id| id.parse::<i64>().ok()) {
            Some(id) => match controller.load_conversation(id).await {
                Ok(conversation) => {
                    println!("{}", welcome_text(&IdentityTranslator).magenta());
                    for message in &conversation.messages {
                        print_message(message);
                    }
                    Ok(())
                }
                Err(err) => Err(err),
            },
            None => {
                eprintln!("Usage: /open <id>");
                Ok(())
            }
        },
        "rename" => {
            let id = parts.next().and_then(|id| id.parse::<i64>().ok());
            let title = parts.collect::<Vec<_>>().join(" ");
            match id {
                Some(id) => controller.rename_conversation(id, &title).await,
                None => {
                    eprintln!("Usage: /rename <id> <title>");
                    Ok(())
                }
            }
        }
        "duplicate" => match parts.next().and_then(|id| id.parse::<i64>().ok()) {
            Some(id) => controller.duplicate_conversation(id).await,
            None => {
                eprintln!("Usage: /duplicate <id>");
                Ok(())
            }
        },
        "delete" => match parts.next().and_then(|id| id.parse::<i64>().ok()) {
            Some(id) => controller.delete_conversation(id).await,
            None => {
                eprintln!("Usage: /delete <id>");
                Ok(())
            }
        },
        _ => {
            eprintln!("Unknown command: /{name}");
            Ok(())
        }
    };

    if let Err(err) = result {
        print_error(&err);
        if err.is_auth() {
            return Ok(false);
        }
    }
    Ok(true)
}

// ===== Guest chat =====

pub async fn run_guest(ctx: &AppContext) -> Result<()> {
    let guard = Arc::new(RateLimitGuard::new(
        ctx.store.clone(),
        Arc::new(SystemClock),
    ));
    let guest = GuestChatUsecase::new(ctx.api.clone(), guard.clone());
    let language = ctx.language();

    println!("{}", welcome_text(&IdentityTranslator).magenta());
    println!("You are chatting as a guest. Create an account to keep your history.");

    wait_for_reopen(&guard).await;

    loop {
        let Some(line) = prompt_line(&format!("{} ", "you>".blue().bold()))? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/quit" || line == "/exit" {
            break;
        }

        match guest.send(line, language).await {
            Ok(reply) => println!("{} {}", "lyra>".magenta().bold(), reply.trim()),
            Err(LyraError::RateLimited { .. }) => {
                wait_for_reopen(&guard).await;
            }
            Err(err) => print_error(&err),
        }
    }

    Ok(())
}

/// Blocks until the guard reopens, announcing the remaining wait.
async fn wait_for_reopen(guard: &Arc<RateLimitGuard>) {
    let Some(remaining) = guard.remaining() else {
        return;
    };

    println!(
        "{}",
        format!(
            "Message limit reached. Wait {} to chat again, or create a free account with `lyra register`.",
            format_remaining(remaining)
        )
        .red()
    );

    let handle = guard.spawn_countdown(Arc::new(|remaining| {
        if remaining % 30 == 0 {
            println!("{}", format_remaining(remaining).yellow());
        }
    }));
    let _ = handle.await;

    println!("{}", "You can chat again.".green());
}
