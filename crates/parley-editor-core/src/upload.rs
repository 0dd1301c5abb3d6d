//! Placeholder bookkeeping for asynchronous image uploads.
//!
//! `begin_upload` runs synchronously before the upload is awaited and
//! `finish_upload` synchronously after it, so the document is never locked
//! for the duration of the network round-trip.

use std::fmt::Display;

use crate::commands::replace_range;
use crate::document::EditorDocument;
use crate::text::TextBuffer;
use crate::text_helpers::find_text;
use crate::types::Position;

/// Where an in-flight upload's placeholder was inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub start: Position,
    pub end: Position,
    pub placeholder: String,
}

/// Replace the selection with an `![uploading]()` placeholder.
pub fn begin_upload<D: EditorDocument>(doc: &mut D, uploading_text: &str) -> PendingUpload {
    let sel = doc.selection_or_cursor();
    let placeholder = format!("![{uploading_text}]()");
    doc.replace(sel.start()..sel.end(), &placeholder);

    let end = sel.start() + placeholder.chars().count();
    PendingUpload {
        start: doc.buffer().offset_to_position(sel.start()),
        end: doc.buffer().offset_to_position(end),
        placeholder,
    }
}

/// Swap the placeholder for the uploaded image, or remove it on failure.
///
/// If the user edited the text around the placeholder in the meantime, it is
/// looked up by content instead. Returns false when it can't be found at all,
/// in which case the document is left untouched.
pub fn finish_upload<D, E>(
    doc: &mut D,
    pending: &PendingUpload,
    result: Result<String, E>,
    alt: &str,
) -> bool
where
    D: EditorDocument,
    E: Display,
{
    let replacement = match result {
        Ok(url) => format!("![{alt}]({url})"),
        Err(err) => {
            tracing::warn!(error = %err, "image upload failed, removing placeholder");
            String::new()
        }
    };

    let from = doc.buffer().position_to_offset(pending.start);
    let to = doc.buffer().position_to_offset(pending.end);
    if doc.slice(from..to).as_deref() == Some(pending.placeholder.as_str()) {
        replace_range(doc, &replacement, pending.start, pending.end);
        return true;
    }

    match find_text(doc, &pending.placeholder) {
        Some(at) => {
            let len = pending.placeholder.chars().count();
            doc.replace(at..at + len, &replacement);
            true
        }
        None => {
            tracing::debug!(placeholder = %pending.placeholder, "upload placeholder is gone");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlainEditor;

    #[test]
    fn test_upload_success_replaces_placeholder() {
        let mut editor = PlainEditor::from_text("ab");
        editor.set_cursor(1);
        let pending = begin_upload(&mut editor, "Uploading...");
        assert_eq!(editor.get_value(), "a![Uploading...]()b");
        assert_eq!(pending.start, Position::new(0, 1));

        let done = finish_upload(&mut editor, &pending, Ok::<_, String>("/img/x.png".into()), "x");
        assert!(done);
        assert_eq!(editor.get_value(), "a![x](/img/x.png)b");
    }

    #[test]
    fn test_upload_failure_removes_placeholder() {
        let mut editor = PlainEditor::from_text("one\ntwo");
        editor.set_cursor(4);
        let pending = begin_upload(&mut editor, "Uploading...");
        assert_eq!(pending.start, Position::new(1, 0));

        let done = finish_upload(&mut editor, &pending, Err::<String, _>("413"), "x");
        assert!(done);
        assert_eq!(editor.get_value(), "one\ntwo");
    }

    #[test]
    fn test_moved_placeholder_is_found_by_content() {
        let mut editor = PlainEditor::from_text("ab");
        editor.set_cursor(1);
        let pending = begin_upload(&mut editor, "Uploading...");
        editor.insert(0, "zz");

        let done = finish_upload(&mut editor, &pending, Ok::<_, String>("/u".into()), "x");
        assert!(done);
        assert_eq!(editor.get_value(), "zza![x](/u)b");
    }

    #[test]
    fn test_removed_placeholder_leaves_document_alone() {
        let mut editor = PlainEditor::from_text("");
        let pending = begin_upload(&mut editor, "Uploading...");
        editor.set_value("rewritten");

        let done = finish_upload(&mut editor, &pending, Ok::<_, String>("/u".into()), "x");
        assert!(!done);
        assert_eq!(editor.get_value(), "rewritten");
    }
}
