//! Line-leading markdown markers and their toggles.
//!
//! Every toggle here only ever looks at a marker at the start of the line,
//! so text that merely contains `- ` or `1. ` further in is left alone.

use std::sync::LazyLock;

use regex::Regex;

pub static UNORDERED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(-|\*)\s").unwrap());

pub static ORDERED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*(\d+)\.\s").unwrap());

// One whitespace char only, so quoting a line that starts with spaces and
// unquoting it again gives back the same spaces.
pub static BLOCKQUOTE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^>\s").unwrap());

pub static HEADING_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#{1,6})\s").unwrap());

/// Spaces added by one indent step.
pub const INDENT: &str = "    ";

/// Add or remove a `- ` bullet.
pub fn toggle_unordered(line: &str) -> String {
    if UNORDERED_RE.is_match(line) {
        UNORDERED_RE.replace(line, "").into_owned()
    } else {
        format!("- {line}")
    }
}

/// Add or remove a `> ` quote marker.
pub fn toggle_blockquote(line: &str) -> String {
    if BLOCKQUOTE_RE.is_match(line) {
        BLOCKQUOTE_RE.replace(line, "").into_owned()
    } else {
        format!("> {line}")
    }
}

/// Number the lines `1.`..`n.` by position, or strip the numbers when the
/// lines already carry exactly that sequence.
pub fn toggle_ordered<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    let already_numbered = !lines.is_empty()
        && lines.iter().enumerate().all(|(i, line)| {
            ORDERED_RE
                .captures(line.as_ref())
                .and_then(|caps| caps[1].parse::<usize>().ok())
                == Some(i + 1)
        });

    lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let bare = ORDERED_RE.replace(line.as_ref(), "");
            if already_numbered {
                bare.into_owned()
            } else {
                format!("{}. {}", i + 1, bare)
            }
        })
        .collect()
}

/// Set a heading level on a line. Applying the same level again removes it.
pub fn toggle_heading(line: &str, level: u8, placeholder: &str) -> String {
    let level = level.clamp(1, 6) as usize;
    let (current, body) = match HEADING_RE.captures(line) {
        Some(caps) => (caps[1].len(), &line[caps[0].len()..]),
        None => (0, line),
    };
    if current == level {
        return body.to_string();
    }
    let body = if body.trim().is_empty() {
        placeholder
    } else {
        body
    };
    format!("{} {}", "#".repeat(level), body)
}

pub fn indent(line: &str) -> String {
    format!("{INDENT}{line}")
}

/// Remove one tab or up to four leading spaces.
pub fn outdent(line: &str) -> String {
    if let Some(rest) = line.strip_prefix('\t') {
        return rest.to_string();
    }
    let spaces = line
        .chars()
        .take(INDENT.len())
        .take_while(|c| *c == ' ')
        .count();
    line[spaces..].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unordered_toggle_round_trip() {
        for line in ["item", "", "  indented", "1. not a bullet", "-nospace"] {
            assert_eq!(toggle_unordered(&toggle_unordered(line)), line);
        }
        assert_eq!(toggle_unordered("* star"), "star");
        assert_eq!(toggle_unordered("  - nested"), "nested");
    }

    #[test]
    fn test_marker_must_lead_the_line() {
        assert_eq!(toggle_unordered("a - b"), "- a - b");
        assert_eq!(toggle_blockquote("a > b"), "> a > b");
        assert_eq!(toggle_ordered(&["see 1. above"]), vec!["1. see 1. above"]);
    }

    #[test]
    fn test_blockquote_toggle_round_trip() {
        for line in ["quote", "", "   spaced", "-> arrow"] {
            assert_eq!(toggle_blockquote(&toggle_blockquote(line)), line);
        }
    }

    #[test]
    fn test_ordered_renumbers_by_index() {
        let out = toggle_ordered(&["7. g", "3. c", "plain"]);
        assert_eq!(out, vec!["1. g", "2. c", "3. plain"]);
    }

    #[test]
    fn test_ordered_toggle_round_trip() {
        let lines = ["alpha", "beta", "gamma"];
        let numbered = toggle_ordered(&lines);
        assert_eq!(numbered, vec!["1. alpha", "2. beta", "3. gamma"]);
        assert_eq!(toggle_ordered(&numbered), lines);
    }

    #[test]
    fn test_heading() {
        assert_eq!(toggle_heading("title", 2, "Heading"), "## title");
        assert_eq!(toggle_heading("## title", 2, "Heading"), "title");
        assert_eq!(toggle_heading("# title", 3, "Heading"), "### title");
        assert_eq!(toggle_heading("", 1, "Heading"), "# Heading");
        assert_eq!(toggle_heading("#hashtag", 1, "Heading"), "# #hashtag");
    }

    #[test]
    fn test_indent_outdent() {
        assert_eq!(outdent(&indent("code")), "code");
        assert_eq!(outdent("\tcode"), "code");
        assert_eq!(outdent("  two"), "two");
        assert_eq!(outdent("      six"), "  six");
        assert_eq!(outdent("none"), "none");
    }
}
