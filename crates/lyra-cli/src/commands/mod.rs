pub mod auth;
pub mod chat;
pub mod conversations;
pub mod profile;

use anyhow::Result;
use colored::Colorize;
use lyra_application::auth_usecase::{AuthUsecase, SessionExpiry};
use lyra_client::HttpApi;
use lyra_core::i18n::LanguageTag;
use lyra_infrastructure::config_service::ConfigService;
use lyra_infrastructure::session_store::SessionStore;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

/// Shared wiring for every command: configuration, session store, HTTP
/// client and the auth use case, constructed once per invocation.
pub struct AppContext {
    pub store: Arc<SessionStore>,
    pub api: Arc<HttpApi>,
    pub auth: AuthUsecase,
    pub expiry: Arc<SessionExpiry>,
}

impl AppContext {
    pub fn init() -> Result<Self> {
        let config = ConfigService::new().get_config();
        let store = Arc::new(SessionStore::open_default()?);
        let api = Arc::new(HttpApi::new(&config, store.clone())?);

        let expiry = Arc::new(SessionExpiry::new(store.clone()));
        expiry.set_hook(Arc::new(|| {
            eprintln!(
                "{}",
                "Session expired. Run `lyra login <email>` to sign in again.".red()
            );
        }));

        let auth = AuthUsecase::new(api.clone(), store.clone(), expiry.clone());

        Ok(Self {
            store,
            api,
            auth,
            expiry,
        })
    }

    /// Preferred language: stored preference first, process locale otherwise.
    pub fn language(&self) -> LanguageTag {
        self.store.language().unwrap_or_else(LanguageTag::detect)
    }
}

/// Reads one line from stdin after printing a prompt. `None` on EOF.
pub fn prompt_line(prompt: &str) -> Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
}

/// Prompts for a required value, re-asking while empty.
pub fn prompt_required(label: &str) -> Result<String> {
    loop {
        match prompt_line(&format!("{label}: "))? {
            None => anyhow::bail!("stdin closed"),
            Some(value) if value.trim().is_empty() => continue,
            Some(value) => return Ok(value),
        }
    }
}
