//! Profile and preference commands.

use super::{AppContext, prompt_line};
use anyhow::Result;
use colored::Colorize;
use lyra_core::i18n::LanguageTag;
use lyra_core::services::ProfileUpdate;
use lyra_core::theme::Theme;
use std::path::PathBuf;

pub async fn whoami(ctx: &AppContext) -> Result<()> {
    if !ctx.store.is_authenticated() {
        anyhow::bail!("Not logged in. Run `lyra login <email>` first.");
    }

    let profile = ctx.auth.refresh_profile().await?;
    println!("{}", profile.display_name().bold());
    println!("  email:        {}", profile.email);
    println!("  full name:    {}", profile.full_name);
    println!("  account type: {}", profile.account_type);
    if let Some(nickname) = &profile.nickname {
        println!("  nickname:     {nickname}");
    }
    if let Some(birth_date) = &profile.birth_date {
        println!("  birth date:   {birth_date}");
    }
    if !profile.interests.is_empty() {
        println!("  interests:    {}", profile.interests.join(", "));
    }
    if let Some(image) = &profile.profile_image {
        println!("  avatar:       {image}");
    } else {
        println!("  avatar:       (initial '{}')", profile.initial());
    }
    Ok(())
}

#[derive(clap::Args)]
pub struct UpdateProfileArgs {
    #[arg(long)]
    pub full_name: Option<String>,
    #[arg(long)]
    pub nickname: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    /// Birth date as YYYY-MM-DD
    #[arg(long)]
    pub birth_date: Option<String>,
    /// Comma-separated interest tags; replaces the stored set
    #[arg(long, value_delimiter = ',')]
    pub interests: Option<Vec<String>>,
    /// Path to an avatar image to upload
    #[arg(long)]
    pub image: Option<PathBuf>,
}

pub async fn update(ctx: &AppContext, args: UpdateProfileArgs) -> Result<()> {
    if !ctx.store.is_authenticated() {
        anyhow::bail!("Not logged in. Run `lyra login <email>` first.");
    }

    let update = ProfileUpdate {
        full_name: args.full_name,
        nickname: args.nickname,
        email: args.email,
        birth_date: args.birth_date,
        interests: args.interests,
        image: args.image,
    };

    if update == ProfileUpdate::default() {
        anyhow::bail!("Nothing to update; pass at least one field.");
    }

    let profile = ctx.auth.update_profile(&update).await?;
    println!(
        "{}",
        format!("Profile updated for {}.", profile.display_name()).green()
    );
    Ok(())
}

pub async fn delete_account(ctx: &AppContext, yes: bool) -> Result<()> {
    if !ctx.store.is_authenticated() {
        anyhow::bail!("Not logged in.");
    }

    if !yes {
        let answer = prompt_line("Permanently delete your account? [y/N] ")?;
        if !matches!(answer.as_deref(), Some("y") | Some("Y")) {
            println!("Aborted.");
            return Ok(());
        }
    }

    ctx.auth.delete_account().await?;
    println!("{}", "Account deleted.".yellow());
    Ok(())
}

pub fn language(ctx: &AppContext, tag: Option<String>) -> Result<()> {
    match tag {
        None => println!("{}", ctx.language()),
        Some(tag) => match LanguageTag::parse(&tag) {
            Some(language) => {
                ctx.store.set_language(language);
                println!("Language set to {language}.");
            }
            None => anyhow::bail!("Unsupported language: {tag} (expected pt-BR or en-US)"),
        },
    }
    Ok(())
}

pub fn theme(ctx: &AppContext, value: Option<String>) -> Result<()> {
    match value {
        None => println!("{}", ctx.store.theme().as_str()),
        Some(value) => match Theme::parse(&value) {
            Some(theme) => {
                ctx.store.set_theme(theme);
                println!("Theme set to {}.", theme.as_str());
            }
            None => anyhow::bail!("Unsupported theme: {value} (expected light or dark)"),
        },
    }
    Ok(())
}
