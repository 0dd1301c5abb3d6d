//! Parley preview renderer
//!
//! Turns the markdown in the editor into the HTML shown in the live preview
//! pane. Raw HTML is escaped rather than passed through, and the output runs
//! through `postprocess` for image, table, link and formula fixups.

use markdown_weaver::{Options, Parser};
use url::Url;

pub mod postprocess;
pub mod writer;

pub use postprocess::post_process;

#[derive(thiserror::Error, Debug, miette::Diagnostic)]
pub enum RenderError {
    #[error("failed to write preview html")]
    #[diagnostic(code(parley::renderer::write))]
    Write(#[from] std::fmt::Error),
}

/// Markdown extensions enabled for the preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewOptions {
    pub tables: bool,
    pub footnotes: bool,
    /// Parse `$...$` into math spans. Off by default: formulas are left as
    /// text for the page's typesetter, which is what the `$$` paragraph
    /// fixup is for.
    pub math: bool,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            tables: true,
            footnotes: true,
            math: false,
        }
    }
}

impl PreviewOptions {
    pub fn md_options(&self) -> Options {
        let mut options = Options::ENABLE_GFM | Options::ENABLE_STRIKETHROUGH;
        if self.tables {
            options |= Options::ENABLE_TABLES;
        }
        if self.footnotes {
            options |= Options::ENABLE_FOOTNOTES;
        }
        if self.math {
            options |= Options::ENABLE_MATH;
        }
        options
    }
}

#[derive(Debug, Clone)]
pub struct PreviewRenderer {
    pub options: PreviewOptions,
    /// Origin of the page hosting the preview; links elsewhere get
    /// `rel="nofollow"`.
    pub page_origin: Url,
}

impl PreviewRenderer {
    pub fn new(page_origin: Url) -> Self {
        Self {
            options: PreviewOptions::default(),
            page_origin,
        }
    }

    pub fn with_options(mut self, options: PreviewOptions) -> Self {
        self.options = options;
        self
    }

    /// Render markdown to post-processed preview HTML.
    pub fn render(&self, markdown: &str) -> Result<String, RenderError> {
        let parser = Parser::new_ext(markdown, self.options.md_options());
        let mut html = String::with_capacity(markdown.len() * 3 / 2);
        writer::write_html_fmt(&mut html, parser)?;
        tracing::trace!(
            input_len = markdown.len(),
            output_len = html.len(),
            "rendered preview"
        );
        Ok(post_process(&html, &self.page_origin))
    }
}
