//! Text navigation and analysis helpers.
//!
//! These functions work with the `EditorDocument` trait to provide line
//! lookups that the editing commands share.

use std::ops::RangeInclusive;

use crate::document::EditorDocument;
use crate::text::TextBuffer;

/// Find start of line containing offset.
pub fn find_line_start<D: EditorDocument>(doc: &D, offset: usize) -> usize {
    let buffer = doc.buffer();
    buffer.line_to_char(buffer.char_to_line(offset))
}

/// Find end of line containing offset (position of newline or end of doc).
pub fn find_line_end<D: EditorDocument>(doc: &D, offset: usize) -> usize {
    let buffer = doc.buffer();
    buffer.line_end(buffer.char_to_line(offset))
}

/// Lines touched by the current selection (or the cursor line).
///
/// A selection that ends exactly at the start of a line does not include that
/// line, matching how a full-line drag selection is usually meant.
pub fn selected_lines<D: EditorDocument>(doc: &D) -> RangeInclusive<usize> {
    let sel = doc.selection_or_cursor();
    let buffer = doc.buffer();
    let first = buffer.char_to_line(sel.start());
    let mut last = buffer.char_to_line(sel.end());
    if last > first && buffer.line_to_char(last) == sel.end() {
        last -= 1;
    }
    first..=last
}

/// Whether a line holds nothing but whitespace.
pub fn is_blank_line<D: EditorDocument>(doc: &D, line: usize) -> bool {
    doc.buffer().line_text(line).trim().is_empty()
}

/// First blank line at or after `from_line`, if any.
pub fn find_blank_line_from<D: EditorDocument>(doc: &D, from_line: usize) -> Option<usize> {
    (from_line..doc.buffer().len_lines()).find(|&line| is_blank_line(doc, line))
}

/// Find the char offset of `needle`, searching the whole document.
pub fn find_text<D: EditorDocument>(doc: &D, needle: &str) -> Option<usize> {
    let text = doc.get_value();
    text.find(needle).map(|byte| text[..byte].chars().count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlainEditor;
    use crate::types::Selection;

    #[test]
    fn test_find_line_start_end() {
        let editor = PlainEditor::from_text("hello\nworld\ntest");

        assert_eq!(find_line_start(&editor, 0), 0);
        assert_eq!(find_line_start(&editor, 5), 0);
        assert_eq!(find_line_start(&editor, 6), 6);
        assert_eq!(find_line_start(&editor, 14), 12);

        assert_eq!(find_line_end(&editor, 3), 5);
        assert_eq!(find_line_end(&editor, 6), 11);
        assert_eq!(find_line_end(&editor, 12), 16);
    }

    #[test]
    fn test_selected_lines() {
        let mut editor = PlainEditor::from_text("a\nb\nc\nd");
        editor.set_cursor(2);
        assert_eq!(selected_lines(&editor), 1..=1);

        editor.set_selection(Some(Selection::new(1, 5)));
        assert_eq!(selected_lines(&editor), 0..=2);

        // Ending at the start of line 2 leaves it out.
        editor.set_selection(Some(Selection::new(0, 4)));
        assert_eq!(selected_lines(&editor), 0..=1);
    }

    #[test]
    fn test_find_blank_line() {
        let editor = PlainEditor::from_text("one\ntwo\n   \nfour\n");
        assert!(is_blank_line(&editor, 2));
        assert_eq!(find_blank_line_from(&editor, 0), Some(2));
        assert_eq!(find_blank_line_from(&editor, 3), Some(4));

        let editor = PlainEditor::from_text("solid\ntext");
        assert_eq!(find_blank_line_from(&editor, 0), None);
    }

    #[test]
    fn test_find_text_counts_chars() {
        let editor = PlainEditor::from_text("日本 ![x]()");
        assert_eq!(find_text(&editor, "![x]()"), Some(3));
        assert_eq!(find_text(&editor, "missing"), None);
    }
}
