//! Event-to-HTML writer for the answer/question preview.
//!
//! Raw HTML in the source is never passed through: HTML blocks and inline
//! HTML are written as escaped text. Link and image targets with a scheme
//! outside the allow-list are replaced by `#`.

use std::collections::HashMap;

use markdown_weaver::{
    Alignment, BlockQuoteKind, CodeBlockKind, CowStr, Event, LinkType, Tag, TagEnd,
};
use markdown_weaver_escape::{FmtWriter, StrWrite, escape_href, escape_html, escape_html_body_text};

/// Schemes a link or image may point at. Relative URLs are always allowed.
const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto", "ftp"];

pub enum TableState {
    Head,
    Body,
}

struct PreviewWriter<'a, I, W> {
    /// Iterator supplying events.
    iter: I,

    /// Writer to write to.
    writer: W,

    /// Whether or not the last write wrote a newline.
    end_newline: bool,

    /// Inside a metadata block; text is dropped.
    in_non_writing_block: bool,

    table_state: TableState,
    table_alignments: Vec<Alignment>,
    table_cell_index: usize,
    numbers: HashMap<CowStr<'a>, usize>,
}

impl<'a, I, W> PreviewWriter<'a, I, W>
where
    I: Iterator<Item = Event<'a>>,
    W: StrWrite,
{
    fn new(iter: I, writer: W) -> Self {
        Self {
            iter,
            writer,
            end_newline: true,
            in_non_writing_block: false,
            table_state: TableState::Head,
            table_alignments: vec![],
            table_cell_index: 0,
            numbers: HashMap::new(),
        }
    }

    #[inline]
    fn write_newline(&mut self) -> Result<(), W::Error> {
        self.end_newline = true;
        self.writer.write_str("\n")
    }

    /// Writes a buffer, and tracks whether or not a newline was written.
    #[inline]
    fn write(&mut self, s: &str) -> Result<(), W::Error> {
        self.writer.write_str(s)?;

        if !s.is_empty() {
            self.end_newline = s.ends_with('\n');
        }
        Ok(())
    }

    /// Open a block-level tag on a fresh line.
    fn write_block_open(&mut self, s: &str) -> Result<(), W::Error> {
        if !self.end_newline {
            self.write_newline()?;
        }
        self.write(s)
    }

    fn run(mut self) -> Result<(), W::Error> {
        use markdown_weaver::Event::*;
        while let Some(event) = self.iter.next() {
            match event {
                Start(tag) => {
                    self.start_tag(tag)?;
                }
                End(tag) => {
                    self.end_tag(tag)?;
                }
                Text(text) => {
                    if !self.in_non_writing_block {
                        escape_html_body_text(&mut self.writer, &text)?;
                        self.end_newline = text.ends_with('\n');
                    }
                }
                Code(text) => {
                    self.write("<code>")?;
                    escape_html_body_text(&mut self.writer, &text)?;
                    self.write("</code>")?;
                }
                InlineMath(text) => {
                    self.write(r#"<span class="math math-inline">"#)?;
                    escape_html(&mut self.writer, &text)?;
                    self.write("</span>")?;
                }
                DisplayMath(text) => {
                    self.write(r#"<span class="math math-display">"#)?;
                    escape_html(&mut self.writer, &text)?;
                    self.write("</span>")?;
                }
                Html(html) | InlineHtml(html) => {
                    escape_html_body_text(&mut self.writer, &html)?;
                    self.end_newline = html.ends_with('\n');
                }
                SoftBreak => {
                    self.write_newline()?;
                }
                HardBreak => {
                    self.write("<br />\n")?;
                }
                Rule => {
                    self.write_block_open("<hr />\n")?;
                }
                FootnoteReference(name) => {
                    let len = self.numbers.len() + 1;
                    self.write("<sup class=\"footnote-reference\"><a href=\"#")?;
                    escape_html(&mut self.writer, &name)?;
                    self.write("\">")?;
                    let number = *self.numbers.entry(name).or_insert(len);
                    write!(&mut self.writer, "{}", number)?;
                    self.write("</a></sup>")?;
                }
                TaskListMarker(true) => {
                    self.write("<input disabled=\"\" type=\"checkbox\" checked=\"\"/>\n")?;
                }
                TaskListMarker(false) => {
                    self.write("<input disabled=\"\" type=\"checkbox\"/>\n")?;
                }
                WeaverBlock(_) => {}
            }
        }
        Ok(())
    }

    fn start_tag(&mut self, tag: Tag<'a>) -> Result<(), W::Error> {
        match tag {
            Tag::HtmlBlock => self.write_block_open(""),
            Tag::Paragraph(_) => self.write_block_open("<p>"),
            Tag::Heading {
                level,
                id,
                classes: _,
                attrs: _,
            } => {
                self.write_block_open("<")?;
                write!(&mut self.writer, "{}", level)?;
                if let Some(id) = id {
                    self.write(" id=\"")?;
                    escape_html(&mut self.writer, &id)?;
                    self.write("\"")?;
                }
                self.write(">")
            }
            Tag::Table(alignments) => {
                self.table_alignments = alignments;
                self.write_block_open("<table>")
            }
            Tag::TableHead => {
                self.table_state = TableState::Head;
                self.table_cell_index = 0;
                self.write("<thead><tr>")
            }
            Tag::TableRow => {
                self.table_cell_index = 0;
                self.write("<tr>")
            }
            Tag::TableCell => {
                match self.table_state {
                    TableState::Head => self.write("<th")?,
                    TableState::Body => self.write("<td")?,
                }
                match self.table_alignments.get(self.table_cell_index) {
                    Some(&Alignment::Left) => self.write(" style=\"text-align: left\">"),
                    Some(&Alignment::Center) => self.write(" style=\"text-align: center\">"),
                    Some(&Alignment::Right) => self.write(" style=\"text-align: right\">"),
                    _ => self.write(">"),
                }
            }
            Tag::BlockQuote(kind) => {
                let class_str = match kind {
                    None => "",
                    Some(BlockQuoteKind::Note) => " class=\"markdown-alert-note\"",
                    Some(BlockQuoteKind::Tip) => " class=\"markdown-alert-tip\"",
                    Some(BlockQuoteKind::Important) => " class=\"markdown-alert-important\"",
                    Some(BlockQuoteKind::Warning) => " class=\"markdown-alert-warning\"",
                    Some(BlockQuoteKind::Caution) => " class=\"markdown-alert-caution\"",
                };
                self.write_block_open(&format!("<blockquote{}>\n", class_str))
            }
            Tag::CodeBlock(info) => match info {
                CodeBlockKind::Fenced(info) => {
                    let lang = info.split(' ').next().unwrap_or_default();
                    if lang.is_empty() {
                        self.write_block_open("<pre><code>")
                    } else {
                        self.write_block_open("<pre><code class=\"language-")?;
                        escape_html(&mut self.writer, lang)?;
                        self.write("\">")
                    }
                }
                CodeBlockKind::Indented => self.write_block_open("<pre><code>"),
            },
            Tag::List(Some(1)) => self.write_block_open("<ol>\n"),
            Tag::List(Some(start)) => {
                self.write_block_open("<ol start=\"")?;
                write!(&mut self.writer, "{}", start)?;
                self.write("\">\n")
            }
            Tag::List(None) => self.write_block_open("<ul>\n"),
            Tag::Item => self.write_block_open("<li>"),
            Tag::DefinitionList => self.write_block_open("<dl>\n"),
            Tag::DefinitionListTitle => self.write_block_open("<dt>"),
            Tag::DefinitionListDefinition => self.write_block_open("<dd>"),
            Tag::Subscript => self.write("<sub>"),
            Tag::Superscript => self.write("<sup>"),
            Tag::Emphasis => self.write("<em>"),
            Tag::Strong => self.write("<strong>"),
            Tag::Strikethrough => self.write("<del>"),
            Tag::Link {
                link_type,
                dest_url,
                title,
                id: _,
            } => {
                if link_type == LinkType::Email {
                    self.write("<a href=\"mailto:")?;
                    escape_href(&mut self.writer, &dest_url)?;
                } else {
                    self.write("<a href=\"")?;
                    escape_href(&mut self.writer, safe_url(&dest_url))?;
                }
                if !title.is_empty() {
                    self.write("\" title=\"")?;
                    escape_html(&mut self.writer, &title)?;
                }
                self.write("\">")
            }
            Tag::Image {
                link_type: _,
                dest_url,
                title,
                id: _,
                attrs: _,
            } => {
                self.write("<img src=\"")?;
                escape_href(&mut self.writer, safe_url(&dest_url))?;
                self.write("\" alt=\"")?;
                self.raw_text()?;
                if !title.is_empty() {
                    self.write("\" title=\"")?;
                    escape_html(&mut self.writer, &title)?;
                }
                self.write("\" />")
            }
            Tag::Embed {
                embed_type: _,
                dest_url,
                title,
                id: _,
                attrs: _,
            } => {
                // Embeds degrade to a plain link.
                self.write("<a href=\"")?;
                escape_href(&mut self.writer, safe_url(&dest_url))?;
                self.write("\">")?;
                if title.is_empty() {
                    escape_html_body_text(&mut self.writer, &dest_url)?;
                } else {
                    escape_html_body_text(&mut self.writer, &title)?;
                }
                self.write("</a>")
            }
            Tag::WeaverBlock(_, _) | Tag::MetadataBlock(_) => {
                self.in_non_writing_block = true;
                Ok(())
            }
            Tag::FootnoteDefinition(name) => {
                self.write_block_open("<div class=\"footnote-definition\" id=\"")?;
                escape_html(&mut self.writer, &name)?;
                self.write("\"><sup class=\"footnote-definition-label\">")?;
                let len = self.numbers.len() + 1;
                let number = *self.numbers.entry(name).or_insert(len);
                write!(&mut self.writer, "{}", number)?;
                self.write("</sup>")
            }
        }
    }

    fn end_tag(&mut self, tag: TagEnd) -> Result<(), W::Error> {
        match tag {
            TagEnd::HtmlBlock => {
                if !self.end_newline {
                    self.write_newline()?;
                }
            }
            TagEnd::Paragraph(_) => self.write("</p>\n")?,
            TagEnd::Heading(level) => {
                self.write("</")?;
                write!(&mut self.writer, "{}", level)?;
                self.write(">\n")?;
            }
            TagEnd::Table => self.write("</tbody></table>\n")?,
            TagEnd::TableHead => {
                self.write("</tr></thead><tbody>\n")?;
                self.table_state = TableState::Body;
            }
            TagEnd::TableRow => self.write("</tr>\n")?,
            TagEnd::TableCell => {
                match self.table_state {
                    TableState::Head => self.write("</th>")?,
                    TableState::Body => self.write("</td>")?,
                }
                self.table_cell_index += 1;
            }
            TagEnd::BlockQuote(_) => self.write("</blockquote>\n")?,
            TagEnd::CodeBlock => self.write("</code></pre>\n")?,
            TagEnd::List(true) => self.write("</ol>\n")?,
            TagEnd::List(false) => self.write("</ul>\n")?,
            TagEnd::Item => self.write("</li>\n")?,
            TagEnd::DefinitionList => self.write("</dl>\n")?,
            TagEnd::DefinitionListTitle => self.write("</dt>\n")?,
            TagEnd::DefinitionListDefinition => self.write("</dd>\n")?,
            TagEnd::Emphasis => self.write("</em>")?,
            TagEnd::Superscript => self.write("</sup>")?,
            TagEnd::Subscript => self.write("</sub>")?,
            TagEnd::Strong => self.write("</strong>")?,
            TagEnd::Strikethrough => self.write("</del>")?,
            TagEnd::Link => self.write("</a>")?,
            TagEnd::Image => (), // consumed by raw_text
            TagEnd::Embed => (),
            TagEnd::WeaverBlock(_) | TagEnd::MetadataBlock(_) => {
                self.in_non_writing_block = false;
            }
            TagEnd::FootnoteDefinition => self.write("</div>\n")?,
        }
        Ok(())
    }

    // Write the alt text of an image, consuming its end tag.
    fn raw_text(&mut self) -> Result<(), W::Error> {
        use markdown_weaver::Event::*;
        let mut nest = 0;
        while let Some(event) = self.iter.next() {
            match event {
                Start(_) => nest += 1,
                End(_) => {
                    if nest == 0 {
                        break;
                    }
                    nest -= 1;
                }
                Html(_) => {}
                InlineHtml(text) | Code(text) | Text(text) => {
                    // Attribute context, so escape quotes too.
                    escape_html(&mut self.writer, &text)?;
                    self.end_newline = text.ends_with('\n');
                }
                InlineMath(text) => {
                    self.write("$")?;
                    escape_html(&mut self.writer, &text)?;
                    self.write("$")?;
                }
                DisplayMath(text) => {
                    self.write("$$")?;
                    escape_html(&mut self.writer, &text)?;
                    self.write("$$")?;
                }
                SoftBreak | HardBreak | Rule => {
                    self.write(" ")?;
                }
                FootnoteReference(name) => {
                    let len = self.numbers.len() + 1;
                    let number = *self.numbers.entry(name).or_insert(len);
                    write!(&mut self.writer, "[{}]", number)?;
                }
                TaskListMarker(true) => self.write("[x]")?,
                TaskListMarker(false) => self.write("[ ]")?,
                WeaverBlock(_) => {}
            }
        }
        Ok(())
    }
}

/// `url` if its scheme is allowed (or it has none), otherwise `#`.
pub fn safe_url(url: &str) -> &str {
    let trimmed = url.trim_start();
    let scheme_end = trimmed.find(|c: char| matches!(c, ':' | '/' | '?' | '#'));
    match scheme_end {
        Some(i) if trimmed[i..].starts_with(':') => {
            let scheme = trimmed[..i].to_ascii_lowercase();
            if SAFE_SCHEMES.contains(&scheme.as_str()) {
                url
            } else {
                "#"
            }
        }
        _ => url,
    }
}

/// Render `iter` into any `fmt::Write` sink.
pub fn write_html_fmt<'a, I, W>(writer: W, iter: I) -> core::fmt::Result
where
    I: Iterator<Item = Event<'a>>,
    W: core::fmt::Write,
{
    PreviewWriter::new(iter, FmtWriter(writer)).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use markdown_weaver::{Options, Parser};

    fn html(markdown: &str) -> String {
        let mut out = String::new();
        let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES);
        write_html_fmt(&mut out, parser).unwrap();
        out
    }

    #[test]
    fn test_safe_url() {
        assert_eq!(safe_url("https://example.com"), "https://example.com");
        assert_eq!(safe_url("/questions/1"), "/questions/1");
        assert_eq!(safe_url("#answer-2"), "#answer-2");
        assert_eq!(safe_url("JavaScript:alert(1)"), "#");
        assert_eq!(safe_url("data:text/html,hi"), "#");
        assert_eq!(safe_url("page?next=a:b"), "page?next=a:b");
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let out = html("<script>alert(1)</script>\n\nhi <b>there</b>");
        assert!(!out.contains("<script>"));
        assert!(!out.contains("<b>"));
        assert!(out.contains("&lt;script&gt;"));
        assert!(out.contains("<p>hi &lt;b&gt;there&lt;/b&gt;</p>"));
    }

    #[test]
    fn test_javascript_link_is_neutralized() {
        let out = html("[x](javascript:alert(1))");
        assert_eq!(out, "<p><a href=\"#\">x</a></p>\n");
    }

    #[test]
    fn test_image_alt_text() {
        let out = html("![a \"cat\"](/cat.png)");
        assert_eq!(
            out,
            "<p><img src=\"/cat.png\" alt=\"a &quot;cat&quot;\" /></p>\n"
        );
    }
}
