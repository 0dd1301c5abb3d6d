//! Text buffer abstraction for editor storage.
//!
//! The `TextBuffer` trait is what the editing commands see; `EditorRope`
//! is the ropey-backed implementation used by `PlainEditor`.

use smol_str::{SmolStr, ToSmolStr};
use std::ops::Range;

use crate::types::Position;

/// A text buffer that supports editing and line/offset conversion.
///
/// All offsets are in Unicode scalar values (chars), not bytes or UTF-16.
pub trait TextBuffer {
    /// Total length in chars.
    fn len_chars(&self) -> usize;

    /// Number of lines. An empty buffer has one (empty) line, and a trailing
    /// newline starts a new empty line.
    fn len_lines(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len_chars() == 0
    }

    /// Insert text at char offset.
    fn insert(&mut self, char_offset: usize, text: &str);

    /// Delete char range.
    fn delete(&mut self, char_range: Range<usize>);

    /// Replace char range with text.
    fn replace(&mut self, char_range: Range<usize>, text: &str) {
        self.delete(char_range.clone());
        self.insert(char_range.start, text);
    }

    /// Get a slice as SmolStr. Returns None if range is invalid.
    fn slice(&self, char_range: Range<usize>) -> Option<SmolStr>;

    /// Get character at offset. Returns None if out of bounds.
    fn char_at(&self, char_offset: usize) -> Option<char>;

    fn to_string(&self) -> String;

    /// Line index containing the char offset (clamped to the last line).
    fn char_to_line(&self, char_offset: usize) -> usize;

    /// Char offset of the start of a line (clamped to the buffer end).
    fn line_to_char(&self, line: usize) -> usize;

    /// Text of a line without its line terminator.
    fn line_text(&self, line: usize) -> SmolStr {
        let start = self.line_to_char(line);
        let end = self.line_end(line);
        self.slice(start..end).unwrap_or_default()
    }

    /// Char offset of the end of a line, before its newline.
    fn line_end(&self, line: usize) -> usize {
        if line + 1 >= self.len_lines() {
            return self.len_chars();
        }
        // Next line start minus the terminator.
        let start = self.line_to_char(line);
        let mut end = self.line_to_char(line + 1).saturating_sub(1);
        if end > start && self.char_at(end) == Some('\n') && self.char_at(end - 1) == Some('\r') {
            end -= 1;
        }
        end
    }

    /// Convert a char offset into a line/column position.
    fn offset_to_position(&self, offset: usize) -> Position {
        let offset = offset.min(self.len_chars());
        let line = self.char_to_line(offset);
        Position::new(line, offset - self.line_to_char(line))
    }

    /// Convert a position into a char offset. Lines past the end map to the
    /// end of the buffer; columns past a line's end map to that line's end.
    fn position_to_offset(&self, pos: Position) -> usize {
        if pos.line >= self.len_lines() {
            return self.len_chars();
        }
        let start = self.line_to_char(pos.line);
        let end = self.line_end(pos.line);
        (start + pos.column).min(end)
    }
}

/// Ropey-backed text buffer.
#[derive(Clone, Debug, Default)]
pub struct EditorRope {
    rope: ropey::Rope,
}

impl EditorRope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_str(s: &str) -> Self {
        Self {
            rope: ropey::Rope::from_str(s),
        }
    }

    /// Get a reference to the underlying rope (for advanced operations).
    pub fn rope(&self) -> &ropey::Rope {
        &self.rope
    }
}

impl TextBuffer for EditorRope {
    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    fn insert(&mut self, char_offset: usize, text: &str) {
        let offset = char_offset.min(self.rope.len_chars());
        self.rope.insert(offset, text);
    }

    fn delete(&mut self, char_range: Range<usize>) {
        let len = self.rope.len_chars();
        let start = char_range.start.min(len);
        let end = char_range.end.clamp(start, len);
        if start < end {
            self.rope.remove(start..end);
        }
    }

    fn slice(&self, char_range: Range<usize>) -> Option<SmolStr> {
        if char_range.start > char_range.end || char_range.end > self.len_chars() {
            return None;
        }
        Some(self.rope.slice(char_range).to_smolstr())
    }

    fn char_at(&self, char_offset: usize) -> Option<char> {
        if char_offset >= self.len_chars() {
            return None;
        }
        Some(self.rope.char(char_offset))
    }

    fn to_string(&self) -> String {
        self.rope.to_string()
    }

    fn char_to_line(&self, char_offset: usize) -> usize {
        self.rope.char_to_line(char_offset.min(self.rope.len_chars()))
    }

    fn line_to_char(&self, line: usize) -> usize {
        if line >= self.rope.len_lines() {
            return self.rope.len_chars();
        }
        self.rope.line_to_char(line)
    }
}

impl From<&str> for EditorRope {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}

impl From<String> for EditorRope {
    fn from(s: String) -> Self {
        Self::from_str(&s)
    }
}
