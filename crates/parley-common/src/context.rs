//! Application context.
//!
//! Page-wide state the request client and components share: the toast and
//! modal slots, navigation, persisted state, the signed-in user and the
//! mention cache. One [`AppContext`] is built at startup and passed around
//! in an `Arc`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::api::UserInfo;
use crate::config::ClientConfig;
use crate::storage::{PersistedState, Storage};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToastVariant {
    #[default]
    Danger,
    Warning,
    Success,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub msg: String,
    pub variant: ToastVariant,
    pub shown_at: Instant,
}

/// A single toast slot. A new toast replaces the current one and restarts
/// the dismiss timer.
#[derive(Debug)]
pub struct ToastStore {
    slot: Mutex<Option<Toast>>,
    duration: Duration,
}

impl ToastStore {
    pub fn new(duration: Duration) -> Self {
        Self {
            slot: Mutex::new(None),
            duration,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn show(&self, msg: impl Into<String>, variant: ToastVariant) {
        self.show_at(msg, variant, Instant::now());
    }

    pub fn show_at(&self, msg: impl Into<String>, variant: ToastVariant, now: Instant) {
        let toast = Toast {
            msg: msg.into(),
            variant,
            shown_at: now,
        };
        tracing::debug!(msg = %toast.msg, ?variant, "toast");
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(toast);
        }
    }

    /// The toast visible at `now`, if any.
    pub fn current(&self, now: Instant) -> Option<Toast> {
        let slot = self.slot.lock().ok()?;
        slot.as_ref()
            .filter(|toast| now.saturating_duration_since(toast.shown_at) < self.duration)
            .cloned()
    }

    pub fn dismiss(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = None;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modal {
    pub msg: String,
    pub confirm_text: String,
}

/// A single confirmation-modal slot.
#[derive(Debug, Default)]
pub struct ModalStore {
    slot: Mutex<Option<Modal>>,
}

impl ModalStore {
    pub fn show(&self, msg: impl Into<String>, confirm_text: impl Into<String>) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(Modal {
                msg: msg.into(),
                confirm_text: confirm_text.into(),
            });
        }
    }

    pub fn current(&self) -> Option<Modal> {
        self.slot.lock().ok()?.clone()
    }

    /// The user confirmed or closed the modal.
    pub fn close(&self) -> Option<Modal> {
        self.slot.lock().ok()?.take()
    }
}

/// Full-page navigation.
pub trait Navigator: Send + Sync {
    /// Path plus query of the current page.
    fn current_path(&self) -> String;
    fn navigate(&self, path: &str);
}

/// Navigator that only records where it was sent.
#[derive(Debug)]
pub struct HistoryNavigator {
    history: Mutex<Vec<String>>,
}

impl HistoryNavigator {
    pub fn new(start: impl Into<String>) -> Self {
        Self {
            history: Mutex::new(vec![start.into()]),
        }
    }

    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .map(|history| history.clone())
            .unwrap_or_default()
    }
}

impl Default for HistoryNavigator {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for HistoryNavigator {
    fn current_path(&self) -> String {
        self.history
            .lock()
            .ok()
            .and_then(|history| history.last().cloned())
            .unwrap_or_else(|| "/".to_string())
    }

    fn navigate(&self, path: &str) {
        tracing::info!(path, "navigate");
        if let Ok(mut history) = self.history.lock() {
            history.push(path.to_string());
        }
    }
}

#[derive(Debug, Default)]
pub struct CurrentUser {
    user: Mutex<Option<UserInfo>>,
}

impl CurrentUser {
    pub fn get(&self) -> Option<UserInfo> {
        self.user.lock().ok()?.clone()
    }

    pub fn set(&self, user: UserInfo) {
        if let Ok(mut slot) = self.user.lock() {
            *slot = Some(user);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut slot) = self.user.lock() {
            *slot = None;
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.lock().is_ok_and(|user| user.is_some())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionUser {
    pub username: String,
    #[serde(default)]
    pub display_name: String,
}

/// Users seen on the current page, offered as `@` mention candidates.
/// Append-only; lives as long as the page.
#[derive(Debug, Default)]
pub struct MentionCache {
    users: Mutex<Vec<MentionUser>>,
}

impl MentionCache {
    pub fn extend(&self, users: impl IntoIterator<Item = MentionUser>) {
        let Ok(mut cached) = self.users.lock() else {
            return;
        };
        for user in users {
            if !cached.iter().any(|u| u.username == user.username) {
                cached.push(user);
            }
        }
    }

    /// Cached users whose username or display name starts with `prefix`,
    /// case-insensitively.
    pub fn matching(&self, prefix: &str) -> Vec<MentionUser> {
        let prefix = prefix.to_lowercase();
        self.users
            .lock()
            .map(|users| {
                users
                    .iter()
                    .filter(|u| {
                        u.username.to_lowercase().starts_with(&prefix)
                            || u.display_name.to_lowercase().starts_with(&prefix)
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.users.lock().map(|users| users.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct AppContext {
    pub config: ClientConfig,
    pub toast: ToastStore,
    pub modal: ModalStore,
    pub navigator: Arc<dyn Navigator>,
    pub state: PersistedState,
    pub mentions: MentionCache,
    pub user: CurrentUser,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("toast", &self.toast)
            .field("modal", &self.modal)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// In-memory storage and a recording navigator.
    pub fn new(config: ClientConfig) -> Self {
        let toast = ToastStore::new(Duration::from_millis(config.toast_duration_ms));
        Self {
            config,
            toast,
            modal: ModalStore::default(),
            navigator: Arc::new(HistoryNavigator::default()),
            state: PersistedState::default(),
            mentions: MentionCache::default(),
            user: CurrentUser::default(),
        }
    }

    pub fn with_storage(mut self, storage: impl Storage + 'static) -> Self {
        self.state = PersistedState::new(storage);
        if let Some(user) = self.state.user() {
            self.user.set(user);
        }
        self
    }

    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = navigator;
        self
    }

    /// Stored locale, else the configured default.
    pub fn locale(&self) -> String {
        self.state
            .locale()
            .unwrap_or_else(|| self.config.default_locale.clone())
    }

    /// Drop the session: token and user, both in memory and persisted.
    pub fn sign_out(&self) {
        self.user.clear();
        if let Err(err) = self.state.clear_token() {
            tracing::warn!(error = %err, "failed to clear stored token");
        }
        if let Err(err) = self.state.clear_user() {
            tracing::warn!(error = %err, "failed to clear stored user");
        }
    }
}
