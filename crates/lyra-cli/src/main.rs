use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::AppContext;

#[derive(Parser)]
#[command(name = "lyra")]
#[command(about = "Lyra CLI - terminal client for the Lyra chat assistant", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with email and password
    Login {
        email: String,
        /// Password; prompted when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account
    Register(commands::auth::RegisterArgs),
    /// Check whether an email is free to register
    CheckEmail { email: String },
    /// Clear the local session
    Logout,
    /// Show the authenticated user's profile
    Whoami,
    /// Update profile fields
    UpdateProfile(commands::profile::UpdateProfileArgs),
    /// Permanently delete the account
    DeleteAccount {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Chat without an account (rate limited)
    Guest,
    /// Chat with conversation history
    Chat,
    /// Manage conversations
    Conversations {
        #[command(subcommand)]
        action: commands::conversations::ConversationsAction,
    },
    /// Show or set the preferred language (pt-BR, en-US)
    Language { tag: Option<String> },
    /// Show or set the theme (light, dark)
    Theme { value: Option<String> },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let ctx = AppContext::init()?;

    match cli.command {
        Commands::Login { email, password } => commands::auth::login(&ctx, &email, password).await?,
        Commands::Register(args) => commands::auth::register(&ctx, args).await?,
        Commands::CheckEmail { email } => commands::auth::check_email(&ctx, &email).await?,
        Commands::Logout => commands::auth::logout(&ctx),
        Commands::Whoami => commands::profile::whoami(&ctx).await?,
        Commands::UpdateProfile(args) => commands::profile::update(&ctx, args).await?,
        Commands::DeleteAccount { yes } => commands::profile::delete_account(&ctx, yes).await?,
        Commands::Guest => commands::chat::run_guest(&ctx).await?,
        Commands::Chat => commands::chat::run_authenticated(&ctx).await?,
        Commands::Conversations { action } => commands::conversations::run(&ctx, action).await?,
        Commands::Language { tag } => commands::profile::language(&ctx, tag)?,
        Commands::Theme { value } => commands::profile::theme(&ctx, value)?,
    }

    Ok(())
}
