//! Page rendering for the FSC Q&A web front end.
//!
//! Builds display-ready view models from engine output and renders them
//! with Handlebars. Interpolated text is HTML-escaped; the answer is
//! rendered from Markdown with any raw HTML escaped.

pub mod builder;
pub mod loader;
pub mod markdown;
pub mod questions;
pub mod types;

// Re-export commonly used types
pub use builder::{build_page, result_view, sidebar_view, PAGE_TITLE};
pub use loader::PageRenderer;
pub use markdown::render_markdown;
pub use questions::{prefill_href, EXAMPLE_QUESTIONS};
pub use types::{FormState, Notice, NoticeKind, PageView, ResultView, SidebarView, SourceView};
