//! Cursor-relative editing operations.
//!
//! These are the building blocks every toolbar command is made from. None of
//! them can fail: empty documents, empty selections and out-of-range
//! positions are clamped or filled with placeholder text.

use crate::document::EditorDocument;
use crate::text::TextBuffer;
use crate::text_helpers::{find_blank_line_from, selected_lines};
use crate::types::{Position, Selection};

/// Wrap the selection in `before`/`after`, or unwrap it if already wrapped.
///
/// The selection counts as wrapped when either the selected text itself is
/// `before + X + after`, or the characters directly outside the selection
/// are `before` and `after`. Either way only `X` is left, selected.
///
/// Otherwise the selection (or `placeholder` when nothing is selected) is
/// wrapped and the text between the delimiters is selected.
pub fn wrap_text<D: EditorDocument>(doc: &mut D, before: &str, after: &str, placeholder: &str) {
    let sel = doc.selection_or_cursor();
    let (start, end) = (sel.start(), sel.end());
    let before_len = before.chars().count();
    let after_len = after.chars().count();
    let selected = doc.slice(start..end).unwrap_or_default();
    let selected_len = sel.len();

    if selected_len >= before_len + after_len
        && selected_len > 0
        && selected.starts_with(before)
        && selected.ends_with(after)
    {
        let inner: String = selected
            .chars()
            .skip(before_len)
            .take(selected_len - before_len - after_len)
            .collect();
        let inner_len = inner.chars().count();
        doc.replace(start..end, &inner);
        doc.set_selection(Some(Selection::new(start, start + inner_len)));
        tracing::trace!(before, after, "unwrapped selection contents");
        return;
    }

    let outside_before = start
        .checked_sub(before_len)
        .and_then(|from| doc.slice(from..start));
    let outside_after = doc.slice(end..end + after_len);
    if outside_before.as_deref() == Some(before) && outside_after.as_deref() == Some(after) {
        // Remove the trailing delimiter first so `start` stays valid.
        doc.delete(end..end + after_len);
        doc.delete(start - before_len..start);
        doc.set_selection(Some(Selection::new(
            start - before_len,
            end - before_len,
        )));
        tracing::trace!(before, after, "unwrapped surrounding delimiters");
        return;
    }

    let body = if selected.is_empty() {
        placeholder
    } else {
        selected.as_str()
    };
    let body_len = body.chars().count();
    let wrapped = format!("{before}{body}{after}");
    doc.replace(start..end, &wrapped);
    doc.set_selection(Some(Selection::new(
        start + before_len,
        start + before_len + body_len,
    )));
}

/// Rewrite every line spanned by the selection.
///
/// `transform` receives each line and its index within the selection. The
/// new selection covers the rewritten lines, minus `leading_skip` chars at
/// the front so the cursor lands after a freshly inserted marker.
pub fn replace_lines<D, F>(doc: &mut D, mut transform: F, leading_skip: usize)
where
    D: EditorDocument,
    F: FnMut(&str, usize) -> String,
{
    let lines = selected_lines(doc);
    let from = doc.buffer().line_to_char(*lines.start());
    let to = doc.buffer().line_end(*lines.end());
    let original = doc.slice(from..to).unwrap_or_default();

    let rewritten = original
        .split('\n')
        .enumerate()
        .map(|(i, line)| transform(line, i))
        .collect::<Vec<_>>()
        .join("\n");
    let rewritten_len = rewritten.chars().count();

    doc.replace(from..to, &rewritten);
    doc.set_selection(Some(Selection::new(
        from + leading_skip.min(rewritten_len),
        from + rewritten_len,
    )));
}

/// Text of each line spanned by the selection.
pub fn selected_line_texts<D: EditorDocument>(doc: &D) -> Vec<String> {
    selected_lines(doc)
        .map(|line| doc.buffer().line_text(line).to_string())
        .collect()
}

/// Insert a block below the cursor without touching the cursor's line.
///
/// The block goes on its own line after the first blank line at or below the
/// cursor. When there is no such line, one is appended to the document
/// first. The cursor ends up after the inserted content. Returns the index
/// of the blank line used.
pub fn append_block<D: EditorDocument>(doc: &mut D, content: &str) -> usize {
    let cursor_line = doc.buffer().char_to_line(doc.cursor_offset());
    let blank_line = match find_blank_line_from(doc, cursor_line) {
        Some(line) => line,
        None => {
            let end = doc.len_chars();
            doc.insert(end, "\n");
            doc.buffer().len_lines() - 1
        }
    };

    let at = doc.buffer().line_end(blank_line);
    doc.insert(at, &format!("\n{content}"));
    tracing::trace!(blank_line, "appended block");
    blank_line
}

/// Replace the text between two positions; the cursor lands after `value`.
///
/// Positions are clamped into the document, and may be given in either order.
pub fn replace_range<D: EditorDocument>(doc: &mut D, value: &str, start: Position, end: Position) {
    let a = doc.buffer().position_to_offset(start);
    let b = doc.buffer().position_to_offset(end);
    doc.replace(a.min(b)..a.max(b), value);
}
