//! Parley request client and page state
//!
//! The HTTP client every page uses to talk to the Q&A API, the envelope
//! and error classification behind it, and the shared page state it
//! reports into: toasts, modals, navigation, persisted session data and
//! form field errors.

pub mod api;
pub mod classify;
pub mod client;
pub mod config;
pub mod context;
pub mod envelope;
pub mod error;
pub mod forms;
pub mod storage;
#[cfg(feature = "telemetry")]
pub mod telemetry;
pub mod transport;

pub use classify::{ModalReason, Outcome, PolicyRedirect, classify};
pub use client::RequestClient;
pub use config::{ClientConfig, FileStore, Loader, Routes, Saver};
pub use context::{AppContext, HistoryNavigator, Navigator, ToastStore, ToastVariant};
pub use envelope::{Envelope, ErrorPayload, FieldErrorItem, FieldErrors};
pub use error::{ConfigError, RequestError, StorageError, TransportError};
pub use forms::{CommentForm, FieldSpec, FormField, FormSchema, FormState, Validator, Widget};
pub use storage::{DraftAutosave, DraftKind, DraftSnapshot, PersistedState, Storage};
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};
