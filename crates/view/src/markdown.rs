//! Markdown rendering for generated answers.
//!
//! Answers come back from the model as Markdown. They are rendered to HTML
//! here and emitted unescaped by the template, so everything the model
//! could use to inject markup is neutralized during rendering: raw HTML
//! becomes text and link targets with a non-web scheme are dropped.

use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

/// Render an answer to HTML.
///
/// # Arguments
/// * `text` - Markdown source as returned by the model
///
/// # Returns
/// An HTML fragment. Inline and block HTML in `text` is escaped, and
/// `javascript:`-style link or image targets are replaced by `#`.
///
/// # Example
/// ```
/// use fsc_view::render_markdown;
///
/// let html = render_markdown("**罰鍰**新臺幣100萬元");
/// assert_eq!(html, "<p><strong>罰鍰</strong>新臺幣100萬元</p>\n");
/// ```
pub fn render_markdown(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let events = Parser::new_ext(text, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    });

    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

/// Keep relative, http(s) and mailto targets; anything else becomes `#`.
fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    let lower = url.trim().to_ascii_lowercase();
    let scheme_end = lower.find(':');
    let path_start = lower.find(['/', '?', '#']);

    let has_scheme = match (scheme_end, path_start) {
        (Some(colon), Some(slash)) => colon < slash,
        (Some(_), None) => true,
        _ => false,
    };

    if !has_scheme
        || lower.starts_with("http:")
        || lower.starts_with("https:")
        || lower.starts_with("mailto:")
    {
        url
    } else {
        CowStr::Borrowed("#")
    }
}
