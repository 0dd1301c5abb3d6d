//! Editor document trait and the field-backed implementation.
//!
//! `EditorDocument` is the narrow seam between the editing commands and
//! whatever text widget is hosting the content. Commands only ever talk to
//! this trait, so the widget can be swapped without touching them.

use std::fmt;
use std::ops::Range;

use smol_str::SmolStr;

use crate::text::{EditorRope, TextBuffer};
use crate::types::{Position, Selection, SelectionRange};

/// Callback invoked with the full text after every mutation.
pub type ChangeListener = Box<dyn FnMut(&str) + Send>;

/// Core trait for editor documents.
pub trait EditorDocument {
    /// The buffer type used for text storage.
    type Buffer: TextBuffer;

    // === Required: Buffer access ===

    fn buffer(&self) -> &Self::Buffer;

    fn buffer_mut(&mut self) -> &mut Self::Buffer;

    // === Required: Cursor/selection state ===

    /// Current cursor offset (the selection head when a selection exists).
    fn cursor_offset(&self) -> usize;

    /// Set the raw cursor offset. Callers should prefer `set_cursor`, which clamps.
    fn set_cursor_offset_raw(&mut self, offset: usize);

    fn selection(&self) -> Option<Selection>;

    /// Set the raw selection. Callers should prefer `set_selection`, which clamps.
    fn set_selection_raw(&mut self, selection: Option<Selection>);

    // === Required: change notification ===

    /// Called after the text changed.
    fn notify_change(&mut self);

    // === Provided: Convenience accessors ===

    fn len_chars(&self) -> usize {
        self.buffer().len_chars()
    }

    fn is_empty(&self) -> bool {
        self.buffer().is_empty()
    }

    fn slice(&self, range: Range<usize>) -> Option<SmolStr> {
        self.buffer().slice(range)
    }

    fn char_at(&self, offset: usize) -> Option<char> {
        self.buffer().char_at(offset)
    }

    /// Move the cursor, clamped into the document, and drop the selection.
    fn set_cursor(&mut self, offset: usize) {
        let offset = offset.min(self.len_chars());
        self.set_cursor_offset_raw(offset);
        self.set_selection_raw(None);
    }

    /// Set the selection, clamped into the document. The cursor follows the head.
    fn set_selection(&mut self, selection: Option<Selection>) {
        let len = self.len_chars();
        match selection.map(|s| s.clamped(len)) {
            Some(sel) => {
                self.set_cursor_offset_raw(sel.head);
                self.set_selection_raw(Some(sel));
            }
            None => self.set_selection_raw(None),
        }
    }

    /// Current selection, or a collapsed one at the cursor.
    fn selection_or_cursor(&self) -> Selection {
        self.selection()
            .unwrap_or_else(|| Selection::collapsed(self.cursor_offset()))
            .clamped(self.len_chars())
    }

    fn cursor_position(&self) -> Position {
        self.buffer().offset_to_position(self.cursor_offset())
    }

    fn selection_range(&self) -> Option<SelectionRange> {
        self.selection().map(|sel| SelectionRange {
            from: self.buffer().offset_to_position(sel.start()),
            to: self.buffer().offset_to_position(sel.end()),
        })
    }

    // === Provided: adapter surface ===

    fn get_value(&self) -> String {
        self.buffer().to_string()
    }

    /// Replace the whole document. The cursor moves to the end.
    fn set_value(&mut self, value: &str) {
        let len = self.len_chars();
        self.buffer_mut().replace(0..len, value);
        let end = self.len_chars();
        self.set_cursor(end);
        self.notify_change();
    }

    /// Selected text; empty when nothing is selected.
    fn get_selection(&self) -> SmolStr {
        self.selection()
            .and_then(|sel| self.buffer().slice(sel.to_range()))
            .unwrap_or_default()
    }

    /// Replace the selection (or insert at the cursor) and place the cursor after it.
    fn replace_selection(&mut self, text: &str) {
        let range = self.selection_or_cursor().to_range();
        self.replace(range, text);
    }

    // === Provided: Text operations ===

    /// Insert text at a char offset; the cursor lands after it.
    fn insert(&mut self, offset: usize, text: &str) {
        let offset = offset.min(self.len_chars());
        self.buffer_mut().insert(offset, text);
        self.set_cursor(offset + text.chars().count());
        self.notify_change();
    }

    /// Delete a char range; the cursor lands at its start.
    fn delete(&mut self, range: Range<usize>) {
        let len = self.len_chars();
        let start = range.start.min(len);
        let end = range.end.clamp(start, len);
        self.buffer_mut().delete(start..end);
        self.set_cursor(start);
        self.notify_change();
    }

    /// Replace a char range; the cursor lands after the inserted text.
    fn replace(&mut self, range: Range<usize>, text: &str) {
        let len = self.len_chars();
        let start = range.start.min(len);
        let end = range.end.clamp(start, len);
        self.buffer_mut().replace(start..end, text);
        self.set_cursor(start + text.chars().count());
        self.notify_change();
    }
}

/// Field-backed implementation of `EditorDocument`.
///
/// This is the editor buffer used when no external widget is attached and
/// the one every test in the workspace drives.
pub struct PlainEditor<T: TextBuffer = EditorRope> {
    buffer: T,
    cursor: usize,
    selection: Option<Selection>,
    listeners: Vec<ChangeListener>,
}

impl<T: TextBuffer + Default> Default for PlainEditor<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: TextBuffer + fmt::Debug> fmt::Debug for PlainEditor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlainEditor")
            .field("buffer", &self.buffer)
            .field("cursor", &self.cursor)
            .field("selection", &self.selection)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<T: TextBuffer> PlainEditor<T> {
    pub fn new(buffer: T) -> Self {
        Self {
            buffer,
            cursor: 0,
            selection: None,
            listeners: Vec::new(),
        }
    }

    /// Register a change listener; it receives the full text after each edit.
    pub fn on_change(&mut self, listener: impl FnMut(&str) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }
}

impl PlainEditor<EditorRope> {
    pub fn from_text(text: &str) -> Self {
        Self::new(EditorRope::from_str(text))
    }
}

impl<T: TextBuffer> EditorDocument for PlainEditor<T> {
    type Buffer = T;

    fn buffer(&self) -> &Self::Buffer {
        &self.buffer
    }

    fn buffer_mut(&mut self) -> &mut Self::Buffer {
        &mut self.buffer
    }

    fn cursor_offset(&self) -> usize {
        self.cursor
    }

    fn set_cursor_offset_raw(&mut self, offset: usize) {
        self.cursor = offset;
    }

    fn selection(&self) -> Option<Selection> {
        self.selection
    }

    fn set_selection_raw(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }

    fn notify_change(&mut self) {
        if self.listeners.is_empty() {
            return;
        }
        let text = self.buffer.to_string();
        for listener in &mut self.listeners {
            listener(&text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_basic_insert() {
        let mut editor = PlainEditor::from_text("hello");
        editor.insert(5, " world");
        assert_eq!(editor.get_value(), "hello world");
        assert_eq!(editor.cursor_offset(), 11);
    }

    #[test]
    fn test_delete_and_replace() {
        let mut editor = PlainEditor::from_text("hello world");
        editor.delete(5..11);
        assert_eq!(editor.get_value(), "hello");
        assert_eq!(editor.cursor_offset(), 5);

        editor.replace(0..5, "howdy");
        assert_eq!(editor.get_value(), "howdy");
        assert_eq!(editor.cursor_offset(), 5);
    }

    #[test]
    fn test_selection_is_clamped() {
        let mut editor = PlainEditor::from_text("abc");
        editor.set_selection(Some(Selection::new(1, 50)));
        assert_eq!(editor.selection(), Some(Selection::new(1, 3)));
        assert_eq!(editor.cursor_offset(), 3);
        assert_eq!(editor.get_selection(), "bc");
    }

    #[test]
    fn test_replace_selection() {
        let mut editor = PlainEditor::from_text("hello world");
        editor.set_selection(Some(Selection::new(6, 11)));
        editor.replace_selection("rust");
        assert_eq!(editor.get_value(), "hello rust");
        assert!(editor.selection().is_none());

        // No selection inserts at the cursor.
        editor.set_cursor(0);
        editor.replace_selection(">");
        assert_eq!(editor.get_value(), ">hello rust");
    }

    #[test]
    fn test_set_value_moves_cursor_to_end() {
        let mut editor = PlainEditor::from_text("old");
        editor.set_selection(Some(Selection::new(0, 3)));
        editor.set_value("brand new");
        assert_eq!(editor.get_value(), "brand new");
        assert_eq!(editor.cursor_offset(), 9);
        assert!(editor.selection().is_none());
    }

    #[test]
    fn test_change_listener_sees_every_edit() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let mut editor = PlainEditor::from_text("a");
        editor.on_change(move |text| sink.lock().unwrap().push(text.to_string()));

        editor.insert(1, "b");
        editor.delete(0..1);
        assert_eq!(*seen.lock().unwrap(), vec!["ab".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_positions() {
        let mut editor = PlainEditor::from_text("one\ntwo");
        editor.set_selection(Some(Selection::new(1, 6)));
        let range = editor.selection_range().unwrap();
        assert_eq!(range.from, Position::new(0, 1));
        assert_eq!(range.to, Position::new(1, 2));
        assert_eq!(editor.cursor_position(), Position::new(1, 2));
    }
}
