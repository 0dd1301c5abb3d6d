//! HTML post-processing for the preview pane.
//!
//! Each pass works on the rendered HTML string and is idempotent, so running
//! `post_process` on its own output changes nothing.

use std::sync::LazyLock;

use regex::{Captures, Regex};
use url::Url;

/// Class of the container that lets wide tables scroll horizontally.
pub const TABLE_WRAPPER_OPEN: &str = "<div class=\"table-responsive\">";

static PARAGRAPH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<p>(.*?)</p>").unwrap());

static BREAK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<br\s*/?>\n?").unwrap());

static TABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<table\b.*?</table>").unwrap());

static IMG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<img\b[^>]*>").unwrap());

static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<a\s[^>]*>").unwrap());

/// One `name="value"` attribute. Values never contain a raw `"`, so scanning
/// a tag left to right never starts a match inside a value.
static ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([A-Za-z][\w-]*)="([^"]*)""#).unwrap());

/// Run every pass over `html`. Links are judged external relative to
/// `page_origin`.
pub fn post_process(html: &str, page_origin: &Url) -> String {
    let html = fix_formula_breaks(html);
    let html = wrap_tables(&html);
    let html = strip_image_referrer(&html);
    mark_external_links(&html, page_origin)
}

/// Turn hard breaks back into newlines inside `$$ ... $$` paragraphs so the
/// formula typesetter sees the original lines.
pub fn fix_formula_breaks(html: &str) -> String {
    PARAGRAPH_RE
        .replace_all(html, |caps: &Captures| {
            let inner = caps[1].trim();
            if inner.len() >= 4 && inner.starts_with("$$") && inner.ends_with("$$") {
                format!("<p>{}</p>", BREAK_RE.replace_all(&caps[1], "\n"))
            } else {
                caps[0].to_string()
            }
        })
        .into_owned()
}

/// Wrap every `<table>` that isn't already inside the responsive container.
pub fn wrap_tables(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for table in TABLE_RE.find_iter(html) {
        let before = &html[last..table.start()];
        out.push_str(before);
        let already_wrapped = html[..table.start()]
            .trim_end()
            .ends_with(TABLE_WRAPPER_OPEN);
        if already_wrapped {
            out.push_str(table.as_str());
        } else {
            out.push_str(TABLE_WRAPPER_OPEN);
            out.push_str(table.as_str());
            out.push_str("</div>");
        }
        last = table.end();
    }
    out.push_str(&html[last..]);
    out
}

/// Stop images from sending the page URL to third-party hosts.
pub fn strip_image_referrer(html: &str) -> String {
    IMG_RE
        .replace_all(html, |caps: &Captures| {
            let tag = &caps[0];
            if has_attr(tag, "referrerpolicy") {
                return tag.to_string();
            }
            let body = tag.trim_end_matches('>').trim_end_matches('/').trim_end();
            format!("{body} referrerpolicy=\"no-referrer\" />")
        })
        .into_owned()
}

/// Add `rel="nofollow"` to anchors that leave `page_origin`.
///
/// Anchors that already carry a `rel`, have no `href`, or whose `href`
/// can't be resolved are left untouched.
pub fn mark_external_links(html: &str, page_origin: &Url) -> String {
    ANCHOR_RE
        .replace_all(html, |caps: &Captures| {
            let tag = &caps[0];
            if has_attr(tag, "rel") || !is_external(tag, page_origin) {
                return tag.to_string();
            }
            let body = tag.trim_end_matches('>');
            format!("{body} rel=\"nofollow\">")
        })
        .into_owned()
}

fn attr<'t>(tag: &'t str, name: &str) -> Option<&'t str> {
    ATTR_RE
        .captures_iter(tag)
        .find(|caps| caps[1].eq_ignore_ascii_case(name))
        .and_then(|caps| caps.get(2))
        .map(|value| value.as_str())
}

fn has_attr(tag: &str, name: &str) -> bool {
    attr(tag, name).is_some()
}

fn is_external(tag: &str, page_origin: &Url) -> bool {
    let Some(href) = attr(tag, "href").map(|href| href.replace("&amp;", "&")) else {
        return false;
    };
    match page_origin.join(&href) {
        Ok(target) => target.origin() != page_origin.origin(),
        Err(err) => {
            tracing::debug!(%href, error = %err, "unresolvable link target");
            false
        }
    }
}
