//! Toolbar commands.
//!
//! Every button and shortcut maps to one `ToolbarCommand`. Commands carry no
//! state between invocations: each one reads the selection back from the
//! document, rewrites the text and leaves a useful selection behind.

use regex::Regex;

use crate::commands::{append_block, replace_lines, selected_line_texts, wrap_text};
use crate::document::EditorDocument;
use crate::markers::{
    BLOCKQUOTE_RE, HEADING_RE, INDENT, UNORDERED_RE, indent, outdent, toggle_blockquote,
    toggle_heading, toggle_ordered, toggle_unordered,
};
use crate::placeholders::Placeholders;
use crate::types::Selection;

/// A formatting operation triggered from the toolbar or a key binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ToolbarCommand {
    Bold,
    Italic,
    Strikethrough,
    /// Inline code, or a fenced block when the selection spans lines.
    Code,
    InlineFormula,
    BlockFormula,
    /// Heading level, clamped to 1..=6.
    Heading(u8),
    OrderedList,
    UnorderedList,
    Blockquote,
    Indent,
    Outdent,
    HorizontalRule,
    Table,
    Chart,
    Link {
        url: Option<String>,
        title: Option<String>,
    },
    Image {
        url: Option<String>,
    },
}

impl ToolbarCommand {
    /// Stable identifier used in logs and key binding tables.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bold => "bold",
            Self::Italic => "italic",
            Self::Strikethrough => "strikethrough",
            Self::Code => "code",
            Self::InlineFormula => "inline_formula",
            Self::BlockFormula => "block_formula",
            Self::Heading(_) => "heading",
            Self::OrderedList => "ordered_list",
            Self::UnorderedList => "unordered_list",
            Self::Blockquote => "blockquote",
            Self::Indent => "indent",
            Self::Outdent => "outdent",
            Self::HorizontalRule => "horizontal_rule",
            Self::Table => "table",
            Self::Chart => "chart",
            Self::Link { .. } => "link",
            Self::Image { .. } => "image",
        }
    }

    /// Apply the command to `doc`. Never fails; empty selections fall back
    /// to the matching placeholder text.
    pub fn execute<D: EditorDocument>(&self, doc: &mut D, placeholders: &Placeholders) {
        tracing::debug!(command = self.name(), "executing toolbar command");
        match self {
            Self::Bold => wrap_text(doc, "**", "**", &placeholders.bold),
            Self::Italic => wrap_text(doc, "*", "*", &placeholders.italic),
            Self::Strikethrough => wrap_text(doc, "~~", "~~", &placeholders.strikethrough),
            Self::Code => {
                if doc.get_selection().contains('\n') {
                    wrap_text(doc, "```\n", "\n```", &placeholders.code_block)
                } else {
                    wrap_text(doc, "`", "`", &placeholders.code)
                }
            }
            Self::InlineFormula => wrap_text(doc, "$", "$", &placeholders.formula),
            Self::BlockFormula => wrap_text(doc, "$$\n", "\n$$", &placeholders.formula),
            Self::Heading(level) => heading(doc, *level, &placeholders.heading),
            Self::OrderedList => ordered_list(doc, &placeholders.list_item),
            Self::UnorderedList => {
                toggle_each_line(doc, &UNORDERED_RE, toggle_unordered, &placeholders.list_item)
            }
            Self::Blockquote => {
                toggle_each_line(doc, &BLOCKQUOTE_RE, toggle_blockquote, &placeholders.quote)
            }
            Self::Indent => replace_lines(doc, |line, _| indent(line), INDENT.len()),
            Self::Outdent => replace_lines(doc, |line, _| outdent(line), 0),
            Self::HorizontalRule => {
                append_block(doc, "----");
            }
            Self::Table => {
                append_block(doc, &table_template(placeholders));
            }
            Self::Chart => {
                append_block(doc, &format!("```mermaid\n{}\n```", placeholders.chart));
            }
            Self::Link { url, title } => insert_reference(
                doc,
                "[",
                url.as_deref().unwrap_or(&placeholders.link_url),
                title.as_deref(),
                &placeholders.link_text,
            ),
            Self::Image { url } => insert_reference(
                doc,
                "![",
                url.as_deref().unwrap_or(&placeholders.link_url),
                None,
                &placeholders.image_alt,
            ),
        }
    }
}

fn heading<D: EditorDocument>(doc: &mut D, level: u8, placeholder: &str) {
    let level = level.clamp(1, 6);
    let first = selected_line_texts(doc).into_iter().next().unwrap_or_default();
    let removing = HEADING_RE
        .captures(&first)
        .is_some_and(|caps| caps[1].len() == level as usize);
    let skip = if removing { 0 } else { level as usize + 1 };
    replace_lines(doc, |line, _| toggle_heading(line, level, placeholder), skip);
}

/// Toggle a two-char line marker on the selected lines. The first line
/// decides the direction: adding only marks unmarked lines and removing
/// only strips marked ones. A lone empty line gets the placeholder as its
/// content.
fn toggle_each_line<D: EditorDocument>(
    doc: &mut D,
    marker: &Regex,
    toggle: fn(&str) -> String,
    placeholder: &str,
) {
    let lines = selected_line_texts(doc);
    let adding = lines.first().is_some_and(|line| !marker.is_match(line));
    let lone_empty = lines.len() == 1 && lines[0].trim().is_empty();
    let skip = if adding { 2 } else { 0 };
    replace_lines(
        doc,
        |line, _| {
            if lone_empty {
                toggle(placeholder)
            } else if marker.is_match(line) != adding {
                toggle(line)
            } else {
                line.to_string()
            }
        },
        skip,
    );
}

fn ordered_list<D: EditorDocument>(doc: &mut D, placeholder: &str) {
    let mut lines = selected_line_texts(doc);
    if lines.len() == 1 && lines[0].trim().is_empty() {
        lines[0] = placeholder.to_string();
    }
    let numbered = toggle_ordered(&lines);

    // Put the cursor after a freshly added marker on a single line.
    let skip = match (lines.as_slice(), numbered.as_slice()) {
        ([old], [new]) if new.len() > old.len() && new.ends_with(old.as_str()) => {
            new.chars().count() - old.chars().count()
        }
        _ => 0,
    };
    replace_lines(
        doc,
        |line, i| numbered.get(i).cloned().unwrap_or_else(|| line.to_string()),
        skip,
    );
}

fn table_template(placeholders: &Placeholders) -> String {
    let (header, cell) = (&placeholders.table_header, &placeholders.table_cell);
    format!("| {header} 1 | {header} 2 |\n| --- | --- |\n| {cell} | {cell} |")
}

/// Replace the selection with `[text](url "title")` (or the image form) and
/// select `text`.
fn insert_reference<D: EditorDocument>(
    doc: &mut D,
    opener: &str,
    url: &str,
    title: Option<&str>,
    placeholder: &str,
) {
    let sel = doc.selection_or_cursor();
    let selected = doc.get_selection();
    let text = if selected.is_empty() {
        placeholder
    } else {
        selected.as_str()
    };
    let target = match title {
        Some(title) if !title.is_empty() => format!("{url} \"{title}\""),
        _ => url.to_string(),
    };
    doc.replace(sel.start()..sel.end(), &format!("{opener}{text}]({target})"));

    let text_start = sel.start() + opener.chars().count();
    doc.set_selection(Some(Selection::new(
        text_start,
        text_start + text.chars().count(),
    )));
}
