//! Durable local session store.
//!
//! The Rust counterpart of the browser's local storage slice this client
//! owns: auth token, cached profile, guest block deadline, language and theme
//! preferences. Reads are served from an in-memory image and are total;
//! writes update the image and persist best-effort (persistence failures are
//! logged, never surfaced).

use crate::storage::RecordStorage;
use lyra_core::i18n::LanguageTag;
use lyra_core::theme::Theme;
use lyra_core::user::UserProfile;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::RwLock;

/// Token values that count as "no token". The literal `undefined`/`null`
/// forms guard against serialized junk left behind by older clients.
const EMPTY_TOKEN_SENTINELS: [&str; 3] = ["", "undefined", "null"];

/// The full set of keys the store owns, as persisted on disk.
///
/// Scalar keys come before `profile` so the TOML serializer never emits a
/// value after a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Epoch seconds before which the guest may not send messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_block_until: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<LanguageTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<UserProfile>,
}

/// Durable key/value storage for session state.
///
/// All operations are synchronous, total and idempotent. The disk image is
/// written atomically after each mutation; a corrupt or unreadable file on
/// open yields an empty session rather than a failure.
pub struct SessionStore {
    record: RwLock<SessionRecord>,
    storage: RecordStorage,
}

impl SessionStore {
    /// Opens the store backed by the given file, starting empty if the file
    /// is missing, empty or unreadable.
    pub fn open(path: PathBuf) -> Self {
        let storage = RecordStorage::new(path);
        let record = match storage.load::<SessionRecord>() {
            Ok(Some(record)) => record,
            Ok(None) => SessionRecord::default(),
            Err(err) => {
                tracing::warn!(
                    target: "session_store",
                    "Discarding unreadable session file {}: {}",
                    storage.path().display(),
                    err
                );
                SessionRecord::default()
            }
        };

        Self {
            record: RwLock::new(record),
            storage,
        }
    }

    /// Opens the store at the default platform location.
    pub fn open_default() -> Result<Self, crate::paths::PathError> {
        Ok(Self::open(crate::paths::LyraPaths::session_file()?))
    }

    /// A snapshot of the current record.
    pub fn snapshot(&self) -> SessionRecord {
        self.record.read().unwrap().clone()
    }

    fn mutate(&self, f: impl FnOnce(&mut SessionRecord)) {
        let snapshot = {
            let mut guard = self.record.write().unwrap();
            f(&mut guard);
            guard.clone()
        };
        if let Err(err) = self.storage.save(&snapshot) {
            tracing::warn!(
                target: "session_store",
                "Failed to persist session file {}: {}",
                self.storage.path().display(),
                err
            );
        }
    }

    // ===== Token =====

    pub fn token(&self) -> Option<String> {
        self.record.read().unwrap().access_token.clone()
    }

    /// Stores the bearer token. Sentinel "empty" forms clear instead, so an
    /// unusable token is never persisted.
    pub fn set_token(&self, token: &str) {
        if EMPTY_TOKEN_SENTINELS.contains(&token) {
            self.clear_token();
            return;
        }
        self.mutate(|record| record.access_token = Some(token.to_string()));
    }

    pub fn clear_token(&self) {
        self.mutate(|record| record.access_token = None);
    }

    /// True iff a usable token is present: non-empty and not one of the
    /// literal `undefined`/`null` forms.
    pub fn is_authenticated(&self) -> bool {
        match self.record.read().unwrap().access_token.as_deref() {
            Some(token) => !EMPTY_TOKEN_SENTINELS.contains(&token),
            None => false,
        }
    }

    // ===== Cached profile =====

    pub fn profile(&self) -> Option<UserProfile> {
        self.record.read().unwrap().profile.clone()
    }

    pub fn set_profile(&self, profile: UserProfile) {
        self.mutate(|record| record.profile = Some(profile));
    }

    pub fn clear_profile(&self) {
        self.mutate(|record| record.profile = None);
    }

    // ===== Guest block deadline =====

    pub fn guest_block_until(&self) -> Option<i64> {
        self.record.read().unwrap().guest_block_until
    }

    pub fn set_guest_block_until(&self, deadline: i64) {
        self.mutate(|record| record.guest_block_until = Some(deadline));
    }

    pub fn clear_guest_block_until(&self) {
        self.mutate(|record| record.guest_block_until = None);
    }

    // ===== Preferences =====

    pub fn language(&self) -> Option<LanguageTag> {
        self.record.read().unwrap().language
    }

    pub fn set_language(&self, language: LanguageTag) {
        self.mutate(|record| record.language = Some(language));
    }

    pub fn theme(&self) -> Theme {
        self.record.read().unwrap().theme.unwrap_or_default()
    }

    pub fn set_theme(&self, theme: Theme) {
        self.mutate(|record| record.theme = Some(theme));
    }

    // ===== Lifecycle =====

    /// Removes every key this store owns. Used on logout and on fatal auth
    /// failure; never leaves partial state behind.
    pub fn clear_all(&self) {
        self.mutate(|record| *record = SessionRecord::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> SessionStore {
        SessionStore::open(dir.path().join("session.toml"))
    }

    #[test]
    fn is_authenticated_rejects_sentinel_tokens() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        assert!(!store.is_authenticated());

        for sentinel in ["", "undefined", "null"] {
            store.set_token(sentinel);
            assert!(!store.is_authenticated(), "sentinel {:?}", sentinel);
            assert!(store.token().is_none());
        }

        store.set_token("eyJhbGciOi.header.sig");
        assert!(store.is_authenticated());
    }

    #[test]
    fn state_survives_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let store = open_store(&dir);
            store.set_token("tok-123");
            store.set_guest_block_until(1_900_000_000);
            store.set_language(LanguageTag::EnUs);
            store.set_theme(Theme::Dark);
        }

        let reopened = open_store(&dir);
        assert_eq!(reopened.token().as_deref(), Some("tok-123"));
        assert_eq!(reopened.guest_block_until(), Some(1_900_000_000));
        assert_eq!(reopened.language(), Some(LanguageTag::EnUs));
        assert_eq!(reopened.theme(), Theme::Dark);
    }

    #[test]
    fn profile_round_trips_through_disk() {
        let dir = TempDir::new().unwrap();
        let profile: UserProfile = serde_json::from_value(serde_json::json!({
            "id": 9,
            "email": "ana@example.com",
            "full_name": "Ana Souza",
            "account_type": "student",
            "nickname": "Aninha",
            "interests": ["math", "history"]
        }))
        .unwrap();

        {
            let store = open_store(&dir);
            store.set_profile(profile.clone());
        }

        let reopened = open_store(&dir);
        assert_eq!(reopened.profile(), Some(profile));
    }

    #[test]
    fn clear_all_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        store.set_token("tok");
        store.set_guest_block_until(123);

        store.clear_all();
        let after_first = store.snapshot();
        store.clear_all();
        let after_second = store.snapshot();

        assert_eq!(after_first, SessionRecord::default());
        assert_eq!(after_first, after_second);
        assert!(!store.is_authenticated());
        assert!(store.profile().is_none());
    }

    #[test]
    fn corrupt_file_yields_empty_session() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.toml");
        std::fs::write(&path, "access_token = [broken").unwrap();

        let store = SessionStore::open(path);
        assert_eq!(store.snapshot(), SessionRecord::default());
    }
}
