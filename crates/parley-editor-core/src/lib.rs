//! parley-editor-core: markdown editing logic without framework dependencies.
//!
//! This crate provides:
//! - `TextBuffer` trait for text storage abstraction
//! - `EditorRope` - ropey-backed implementation
//! - `EditorDocument` - the narrow adapter every editing command works through
//! - `PlainEditor` - field-backed document with change listeners
//! - Cursor-relative commands, toolbar commands and key bindings
//! - Upload placeholders and the editor-instance lifecycle

pub mod commands;
pub mod document;
pub mod error;
pub mod keymap;
pub mod lifecycle;
pub mod markers;
pub mod placeholders;
pub mod text;
pub mod text_helpers;
pub mod toolbar;
pub mod types;
pub mod upload;

pub use commands::{append_block, replace_lines, replace_range, wrap_text};
pub use document::{EditorDocument, PlainEditor};
pub use error::EditorError;
pub use keymap::{Key, KeyCombo, KeydownResult, Keymap, Modifiers};
pub use lifecycle::{EditorEvent, EditorInstance, EditorPhase, WidgetLoader};
pub use placeholders::Placeholders;
pub use smol_str::SmolStr;
pub use text::{EditorRope, TextBuffer};
pub use toolbar::ToolbarCommand;
pub use types::{Position, Selection, SelectionRange};
pub use upload::{PendingUpload, begin_upload, finish_upload};
