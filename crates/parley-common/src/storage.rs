//! Persisted client state.
//!
//! Everything that survives a reload (session token, locale, drafts, the
//! post-login redirect) goes through [`PersistedState`]. Backends only
//! store strings; the typed keys live here.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::api::UserInfo;
use crate::error::StorageError;

pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// A JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open `path`, starting empty if the file doesn't exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn update(&self, f: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        f(&mut entries);
        std::fs::write(&self.path, serde_json::to_string_pretty(&*entries)?)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

pub const TOKEN_KEY: &str = "parley.token";
pub const LOCALE_KEY: &str = "parley.locale";
pub const REDIRECT_KEY: &str = "parley.redirect_path";
pub const USER_KEY: &str = "parley.user";
pub const CAPTCHA_KEY: &str = "parley.captcha";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftKind {
    Question,
    Answer,
}

impl DraftKind {
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::Question => "parley.draft.question",
            Self::Answer => "parley.draft.answer",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftSnapshot {
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    /// Answer body when drafting an answer alongside a question edit.
    pub answer: String,
}

impl DraftSnapshot {
    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty()
            && self.content.trim().is_empty()
            && self.tags.is_empty()
            && self.answer.trim().is_empty()
    }
}

/// The one read/write gateway over persisted state. Last write wins.
pub struct PersistedState {
    backend: Box<dyn Storage>,
}

impl std::fmt::Debug for PersistedState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedState").finish_non_exhaustive()
    }
}

impl Default for PersistedState {
    fn default() -> Self {
        Self::new(MemoryStorage::new())
    }
}

impl PersistedState {
    pub fn new(backend: impl Storage + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.backend.get(TOKEN_KEY).filter(|token| !token.is_empty())
    }

    pub fn set_token(&self, token: &str) -> Result<(), StorageError> {
        self.backend.set(TOKEN_KEY, token)
    }

    pub fn clear_token(&self) -> Result<(), StorageError> {
        self.backend.remove(TOKEN_KEY)
    }

    pub fn locale(&self) -> Option<String> {
        self.backend.get(LOCALE_KEY).filter(|locale| !locale.is_empty())
    }

    pub fn set_locale(&self, locale: &str) -> Result<(), StorageError> {
        self.backend.set(LOCALE_KEY, locale)
    }

    pub fn redirect_path(&self) -> Option<String> {
        self.backend.get(REDIRECT_KEY)
    }

    pub fn set_redirect_path(&self, path: &str) -> Result<(), StorageError> {
        self.backend.set(REDIRECT_KEY, path)
    }

    /// Read and forget the post-login redirect.
    pub fn take_redirect_path(&self) -> Result<Option<String>, StorageError> {
        let path = self.redirect_path();
        if path.is_some() {
            self.backend.remove(REDIRECT_KEY)?;
        }
        Ok(path)
    }

    pub fn user(&self) -> Option<UserInfo> {
        self.get_json(USER_KEY)
    }

    pub fn set_user(&self, user: &UserInfo) -> Result<(), StorageError> {
        self.set_json(USER_KEY, user)
    }

    pub fn clear_user(&self) -> Result<(), StorageError> {
        self.backend.remove(USER_KEY)
    }

    pub fn captcha(&self) -> Option<String> {
        self.backend.get(CAPTCHA_KEY)
    }

    pub fn set_captcha(&self, code: &str) -> Result<(), StorageError> {
        self.backend.set(CAPTCHA_KEY, code)
    }

    pub fn draft(&self, kind: DraftKind) -> Option<DraftSnapshot> {
        self.get_json(kind.storage_key())
    }

    /// Store a draft; an empty snapshot removes it instead.
    pub fn save_draft(&self, kind: DraftKind, draft: &DraftSnapshot) -> Result<(), StorageError> {
        if draft.is_empty() {
            return self.clear_draft(kind);
        }
        self.set_json(kind.storage_key(), draft)
    }

    pub fn clear_draft(&self, kind: DraftKind) -> Result<(), StorageError> {
        self.backend.remove(kind.storage_key())
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.backend.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(key, error = %err, "discarding unreadable persisted value");
                None
            }
        }
    }

    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        self.backend.set(key, &serde_json::to_string(value)?)
    }
}

/// Debounce for draft saves: every edit restarts the delay.
#[derive(Debug, Clone)]
pub struct DraftAutosave {
    delay: Duration,
    pending_since: Option<Instant>,
}

impl DraftAutosave {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending_since: None,
        }
    }

    pub fn touch(&mut self, now: Instant) {
        self.pending_since = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    pub fn due(&self, now: Instant) -> bool {
        self.pending_since
            .is_some_and(|since| now.saturating_duration_since(since) >= self.delay)
    }

    pub fn mark_saved(&mut self) {
        self.pending_since = None;
    }

    /// Save `draft` if the debounce has elapsed. Returns whether it saved.
    pub fn flush_if_due(
        &mut self,
        now: Instant,
        state: &PersistedState,
        kind: DraftKind,
        draft: &DraftSnapshot,
    ) -> Result<bool, StorageError> {
        if !self.due(now) {
            return Ok(false);
        }
        state.save_draft(kind, draft)?;
        self.mark_saved();
        tracing::debug!(?kind, "draft saved");
        Ok(true)
    }
}
