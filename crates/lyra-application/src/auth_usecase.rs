//! Authentication and session lifecycle.
//!
//! Owns login/logout/registration and profile management, and centralizes
//! session invalidation: the first authenticated call that observes a 401
//! clears the whole session and fires the redirect hook exactly once, no
//! matter how many in-flight calls fail with it.

use lyra_core::error::{LyraError, Result};
use lyra_core::services::{AccountService, EmailAvailability, ProfileUpdate, RegisterRequest};
use lyra_core::user::UserProfile;
use lyra_infrastructure::session_store::SessionStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

/// Callback invoked once when the session becomes invalid. The presentation
/// layer uses it to navigate back to the unauthenticated entry point.
pub type SessionExpiredHook = Arc<dyn Fn() + Send + Sync>;

/// One-shot session invalidation.
pub struct SessionExpiry {
    store: Arc<SessionStore>,
    fired: AtomicBool,
    hook: RwLock<Option<SessionExpiredHook>>,
}

impl SessionExpiry {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self {
            store,
            fired: AtomicBool::new(false),
            hook: RwLock::new(None),
        }
    }

    /// Sets the hook invoked on invalidation.
    pub fn set_hook(&self, hook: SessionExpiredHook) {
        *self.hook.write().unwrap() = Some(hook);
    }

    /// Clears the full session and fires the hook. Subsequent calls are
    /// no-ops until [`SessionExpiry::reset`].
    pub fn invalidate(&self) {
        if self.fired.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!(target: "auth", "Session invalidated, clearing local state");
        self.store.clear_all();
        let hook = self.hook.read().unwrap().clone();
        if let Some(hook) = hook {
            hook();
        }
    }

    /// Re-arms the one-shot after a fresh login.
    pub fn reset(&self) {
        self.fired.store(false, Ordering::SeqCst);
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

/// Authentication and profile use case.
pub struct AuthUsecase {
    account: Arc<dyn AccountService>,
    store: Arc<SessionStore>,
    expiry: Arc<SessionExpiry>,
}

impl AuthUsecase {
    pub fn new(
        account: Arc<dyn AccountService>,
        store: Arc<SessionStore>,
        expiry: Arc<SessionExpiry>,
    ) -> Self {
        Self {
            account,
            store,
            expiry,
        }
    }

    /// Logs in, stores the token and caches the profile best-effort.
    ///
    /// A successful login also clears any guest block deadline; the limit
    /// only applies to unauthenticated visitors.
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        let email = email.trim();
        if email.is_empty() {
            return Err(LyraError::validation("email", "email is required"));
        }
        if password.is_empty() {
            return Err(LyraError::validation("password", "password is required"));
        }

        let token = self.account.login(email, password).await?;
        self.store.set_token(&token);
        self.expiry.reset();
        self.store.clear_guest_block_until();

        match self.account.current_user().await {
            Ok(profile) => self.store.set_profile(profile),
            Err(err) => {
                tracing::warn!(target: "auth", "Could not fetch profile after login: {}", err);
            }
        }

        Ok(())
    }

    /// Clears every locally stored session key.
    pub fn logout(&self) {
        tracing::info!(target: "auth", "Logging out");
        self.store.clear_all();
    }

    /// Validates and submits a registration.
    pub async fn register(
        &self,
        request: &RegisterRequest,
        password_confirm: &str,
    ) -> Result<UserProfile> {
        validate_registration(request, password_confirm)?;
        self.account.register(request).await
    }

    pub async fn check_email(&self, email: &str) -> Result<EmailAvailability> {
        if !is_well_formed_email(email.trim()) {
            return Err(LyraError::validation("email", "email address is malformed"));
        }
        self.account.check_email(email.trim()).await
    }

    /// Fetches the latest profile from the backend and re-caches it.
    pub async fn refresh_profile(&self) -> Result<UserProfile> {
        let profile = self.note_auth_failure(self.account.current_user().await)?;
        self.store.set_profile(profile.clone());
        Ok(profile)
    }

    /// Applies a profile update and re-caches the returned state.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<UserProfile> {
        let profile = self.note_auth_failure(self.account.update_profile(update).await)?;
        self.store.set_profile(profile.clone());
        Ok(profile)
    }

    /// Deletes the account and clears all local state.
    pub async fn delete_account(&self) -> Result<()> {
        self.note_auth_failure(self.account.delete_account().await)?;
        self.store.clear_all();
        Ok(())
    }

    /// The cached profile, if any. Advisory only.
    pub fn cached_profile(&self) -> Option<UserProfile> {
        self.store.profile()
    }

    pub fn is_authenticated(&self) -> bool {
        self.store.is_authenticated()
    }

    fn note_auth_failure<T>(&self, result: Result<T>) -> Result<T> {
        if matches!(result, Err(LyraError::Auth)) {
            self.expiry.invalidate();
        }
        result
    }
}

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Local checks applied before the register call.
pub fn validate_registration(request: &RegisterRequest, password_confirm: &str) -> Result<()> {
    if !is_well_formed_email(request.email.trim()) {
        return Err(LyraError::validation("email", "email address is malformed"));
    }
    if request.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(LyraError::validation(
            "password",
            format!("password must have at least {MIN_PASSWORD_LENGTH} characters"),
        ));
    }
    if request.password != password_confirm {
        return Err(LyraError::validation(
            "password",
            "passwords do not match",
        ));
    }
    if request.full_name.trim().is_empty() {
        return Err(LyraError::validation("full_name", "full name is required"));
    }
    if request.account_type.trim().is_empty() {
        return Err(LyraError::validation(
            "account_type",
            "account type is required",
        ));
    }
    Ok(())
}

/// Structural email check: one `@`, non-empty local part, dotted domain,
/// no whitespace.
fn is_well_formed_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
