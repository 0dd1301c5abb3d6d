//! Errors from the editor-instance lifecycle.
//!
//! Editing commands themselves never fail; only driving an editor that is not
//! (or no longer) attached to a document can.

use miette::Diagnostic;

use crate::lifecycle::EditorPhase;

#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum EditorError {
    /// The editor was torn down; nothing is applied any more.
    #[error("editor has been disposed")]
    #[diagnostic(code(parley::editor::disposed))]
    Disposed,

    /// Loading the text-editing widget failed.
    #[error("failed to load editor widget: {0}")]
    #[diagnostic(
        code(parley::editor::widget_load),
        help("the editor stays in the mounting phase and can be mounted again")
    )]
    WidgetLoad(String),

    #[error("cannot {action} while editor is {phase:?}")]
    #[diagnostic(code(parley::editor::phase))]
    InvalidPhase {
        action: &'static str,
        phase: EditorPhase,
    },
}
