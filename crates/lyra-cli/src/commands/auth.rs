//! Login, registration and session commands.

use super::{AppContext, prompt_required};
use anyhow::Result;
use colored::Colorize;
use lyra_core::services::RegisterRequest;

pub async fn login(ctx: &AppContext, email: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => prompt_required("Password")?,
    };

    ctx.auth.login(email, &password).await?;

    let greeting = match ctx.auth.cached_profile() {
        Some(profile) => format!("Welcome back, {}!", profile.display_name()),
        None => "Welcome back!".to_string(),
    };
    println!("{}", greeting.green());
    Ok(())
}

#[derive(clap::Args)]
pub struct RegisterArgs {
    #[arg(long)]
    pub email: String,
    /// Password; prompted (with confirmation) when omitted
    #[arg(long)]
    pub password: Option<String>,
    #[arg(long)]
    pub full_name: String,
    #[arg(long, default_value = "student")]
    pub account_type: String,
    #[arg(long)]
    pub nickname: Option<String>,
    #[arg(long)]
    pub gender: Option<String>,
    /// Birth date as YYYY-MM-DD
    #[arg(long)]
    pub birth_date: Option<String>,
    /// Comma-separated interest tags
    #[arg(long, value_delimiter = ',')]
    pub interests: Vec<String>,
}

pub async fn register(ctx: &AppContext, args: RegisterArgs) -> Result<()> {
    let availability = ctx.auth.check_email(&args.email).await?;
    if !availability.available {
        anyhow::bail!("{}", availability.message);
    }

    let (password, confirm) = match args.password {
        Some(password) => (password.clone(), password),
        None => (
            prompt_required("Password")?,
            prompt_required("Confirm password")?,
        ),
    };

    let interests = if args.interests.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&args.interests)?)
    };

    let request = RegisterRequest {
        email: args.email,
        password,
        full_name: args.full_name,
        account_type: args.account_type,
        nickname: args.nickname,
        interests,
        gender: args.gender,
        birth_date: args.birth_date,
    };

    let profile = ctx.auth.register(&request, &confirm).await?;
    println!(
        "{}",
        format!("Account created for {}.", profile.email).green()
    );
    println!("Run `lyra login {}` to sign in.", profile.email);
    Ok(())
}

pub async fn check_email(ctx: &AppContext, email: &str) -> Result<()> {
    let availability = ctx.auth.check_email(email).await?;
    if availability.available {
        println!("{}", "Email is available.".green());
    } else {
        println!("{}", "Email is already registered.".yellow());
    }
    Ok(())
}

pub fn logout(ctx: &AppContext) {
    ctx.auth.logout();
    println!("Logged out.");
}
