//! View models for the question page.
//!
//! Everything here is already formatted for display; templates only place
//! strings, they never compute.

use serde::{Deserialize, Serialize};

/// Form state carried between requests.
///
/// There is no server-side session: the question text round-trips through
/// the form itself (or the `?question=` link of an example button).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    #[serde(default)]
    pub question: String,
}

/// Severity of a banner shown above the result area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Sidebar: store readiness and usage notes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SidebarView {
    pub file_count: usize,
    pub created_time: Option<String>,
    pub model: String,
    pub engine_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceView {
    /// 1-based, as shown to the user
    pub index: usize,
    pub title: String,
    pub excerpt: String,
}

/// Formatted answer block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultView {
    pub latency: String,
    pub cost: String,
    pub confidence: String,
    pub source_count: usize,
    /// Answer rendered from Markdown; raw HTML in the answer is escaped
    pub answer_html: String,
    pub sources: Vec<SourceView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleView {
    pub question: String,
    /// Query-string encoded link that prefills the form
    pub href: String,
}

/// Complete page model handed to the `page` template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageView {
    pub title: String,
    pub question: String,
    pub sidebar: SidebarView,
    pub notice: Option<Notice>,
    pub result: Option<ResultView>,
    /// Shown only while the question box is empty
    pub examples: Vec<ExampleView>,
}
