//! Page model construction.
//!
//! Turns engine output into display strings. Failures are reduced to a
//! short notice here; their causes are logged by the caller, never shown.

use crate::markdown::render_markdown;
use crate::questions::{prefill_href, EXAMPLE_QUESTIONS};
use crate::types::{
    ExampleView, FormState, Notice, NoticeKind, PageView, ResultView, SidebarView, SourceView,
};
use fsc_core::{AppError, AppResult};
use fsc_engine::{EngineStatus, RagResponse};

pub const PAGE_TITLE: &str = "金管會裁罰案件智能問答";

pub const MSG_SUCCESS: &str = "✅ 查詢完成";
pub const MSG_EMPTY_QUESTION: &str = "⚠️ 請輸入問題";
pub const MSG_SERVICE_FAILURE: &str = "❌ 查詢失敗，請稍後再試";
pub const MSG_SYSTEM_FAILURE: &str = "❌ 系統發生錯誤，請聯繫系統管理員";

/// Build the page for the current form state and, if a query ran, its outcome.
///
/// # Arguments
/// * `form` - Question text to show in the input box
/// * `status` - Engine status for the sidebar
/// * `outcome` - `None` when no query ran (first visit, clear); otherwise
///   the query result. Errors become a generic notice.
///
/// # Returns
/// A display-ready `PageView`. Example questions are included only while
/// the question box is empty.
///
/// # Example
/// ```no_run
/// use fsc_engine::QueryEngine;
/// use fsc_view::{build_page, FormState, PageRenderer};
///
/// # async fn example(engine: &dyn QueryEngine) -> Result<(), Box<dyn std::error::Error>> {
/// let form = FormState { question: "金管會對創投公司的裁罰有哪些？".to_string() };
/// let outcome = engine.query(&form.question).await;
/// let page = build_page(&form, &engine.status(), Some(&outcome));
/// let html = PageRenderer::new()?.render_page(&page)?;
/// # Ok(())
/// # }
/// ```
pub fn build_page(
    form: &FormState,
    status: &EngineStatus,
    outcome: Option<&AppResult<RagResponse>>,
) -> PageView {
    let (notice, result) = match outcome {
        None => (None, None),
        Some(Ok(response)) => (
            Some(Notice::new(NoticeKind::Success, MSG_SUCCESS)),
            Some(result_view(response)),
        ),
        Some(Err(err)) => (Some(failure_notice(err)), None),
    };

    let examples = if form.question.trim().is_empty() {
        example_views()
    } else {
        Vec::new()
    };

    PageView {
        title: PAGE_TITLE.to_string(),
        question: form.question.clone(),
        sidebar: sidebar_view(status),
        notice,
        result,
        examples,
    }
}

pub fn sidebar_view(status: &EngineStatus) -> SidebarView {
    SidebarView {
        file_count: status.file_count,
        created_time: status.created_time.clone(),
        model: status.model.clone(),
        engine_name: status.engine_name.clone(),
    }
}

/// Format a response for display.
pub fn result_view(response: &RagResponse) -> ResultView {
    let sources = response
        .sources
        .iter()
        .enumerate()
        .map(|(i, source)| SourceView {
            index: i + 1,
            title: source.title.clone(),
            excerpt: source.excerpt.clone(),
        })
        .collect::<Vec<_>>();

    ResultView {
        latency: format_latency(response.latency),
        cost: format_cost(response.cost_estimate),
        confidence: format_confidence(response.confidence),
        source_count: sources.len(),
        answer_html: render_markdown(&response.answer),
        sources,
    }
}

fn failure_notice(err: &AppError) -> Notice {
    match err {
        AppError::InvalidInput(_) => Notice::new(NoticeKind::Warning, MSG_EMPTY_QUESTION),
        AppError::Service(_) => Notice::new(NoticeKind::Error, MSG_SERVICE_FAILURE),
        _ => Notice::new(NoticeKind::Error, MSG_SYSTEM_FAILURE),
    }
}

fn example_views() -> Vec<ExampleView> {
    EXAMPLE_QUESTIONS
        .iter()
        .map(|q| ExampleView {
            question: q.to_string(),
            href: prefill_href(q),
        })
        .collect()
}

pub fn format_latency(seconds: f64) -> String {
    format!("{:.2} 秒", seconds)
}

pub fn format_cost(usd: f64) -> String {
    format!("${:.6}", usd)
}

pub fn format_confidence(confidence: f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::PageRenderer;
    use fsc_engine::{Source, DEFAULT_CONFIDENCE, ENGINE_NAME};

    fn status() -> EngineStatus {
        EngineStatus {
            engine_name: ENGINE_NAME.to_string(),
            model: "gemini-2.5-flash".to_string(),
            store_id: "fileSearchStores/fsc-penalty-cases".to_string(),
            file_count: 490,
            created_time: Some("2025-11-20 10:00:00".to_string()),
            age_hours: Some(3.0),
        }
    }

    fn source(title: &str, excerpt: &str, rank: usize) -> Source {
        Source {
            title: title.to_string(),
            excerpt: excerpt.to_string(),
            rank,
            document_id: None,
        }
    }

    fn response(answer: &str, sources: Vec<Source>) -> RagResponse {
        RagResponse {
            answer: answer.to_string(),
            sources,
            confidence: DEFAULT_CONFIDENCE,
            latency: 1.234,
            cost_estimate: 0.000123,
            engine_name: ENGINE_NAME.to_string(),
        }
    }

    fn form(question: &str) -> FormState {
        FormState {
            question: question.to_string(),
        }
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_latency(1.234), "1.23 秒");
        assert_eq!(format_cost(0.000123), "$0.000123");
        assert_eq!(format_confidence(0.85), "85.0%");
    }

    #[test]
    fn test_empty_form_shows_examples() {
        let page = build_page(&FormState::default(), &status(), None);

        assert_eq!(page.examples.len(), EXAMPLE_QUESTIONS.len());
        assert!(page.notice.is_none());
        assert!(page.result.is_none());
        assert_eq!(page.sidebar.file_count, 490);
    }

    #[test]
    fn test_success_keeps_source_order() {
        let ok = Ok(response(
            "答案",
            vec![source("b.txt", "乙", 1), source("a.txt", "甲", 2)],
        ));
        let page = build_page(&form("問題"), &status(), Some(&ok));

        assert!(page.examples.is_empty());
        assert_eq!(page.notice.unwrap().kind, NoticeKind::Success);
        let result = page.result.unwrap();
        assert_eq!(result.source_count, 2);
        assert_eq!(result.sources[0].index, 1);
        assert_eq!(result.sources[0].title, "b.txt");
        assert_eq!(result.sources[1].title, "a.txt");
        assert_eq!(result.confidence, "85.0%");
    }

    #[test]
    fn test_failures_map_to_generic_notices() {
        let invalid = Err(AppError::InvalidInput("blank".to_string()));
        let page = build_page(&FormState::default(), &status(), Some(&invalid));
        let notice = page.notice.unwrap();
        assert_eq!(notice.kind, NoticeKind::Warning);
        assert_eq!(notice.message, MSG_EMPTY_QUESTION);

        let service = Err(AppError::Service("HTTP 500: secret detail".to_string()));
        let page = build_page(&form("問題"), &status(), Some(&service));
        let notice = page.notice.unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert!(!notice.message.contains("secret detail"));
        assert!(page.result.is_none());

        let other = Err(AppError::Template("boom".to_string()));
        let page = build_page(&form("問題"), &status(), Some(&other));
        assert_eq!(page.notice.unwrap().message, MSG_SYSTEM_FAILURE);
    }

    #[test]
    fn test_rendered_page_escapes_service_text() {
        let renderer = PageRenderer::new().unwrap();
        let ok = Ok(response(
            "<script>alert(1)</script>",
            vec![source("<b>x</b>.txt", "片段", 1)],
        ));
        let page = build_page(&form("<img src=x>"), &status(), Some(&ok));
        let html = renderer.render_page(&page).unwrap();

        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<b>x</b>"));
        assert!(!html.contains("<img src=x>"));
        assert!(html.contains("📚 參考來源 (1 筆)"));
    }

    #[test]
    fn test_rendered_answer_is_markdown() {
        let renderer = PageRenderer::new().unwrap();
        let ok = Ok(response("**裁罰結果**\n\n- 罰鍰100萬元\n\n<script>x</script>", vec![]));
        let html = renderer
            .render_page(&build_page(&form("問題"), &status(), Some(&ok)))
            .unwrap();

        assert!(html.contains("<strong>裁罰結果</strong>"));
        assert!(html.contains("<li>罰鍰100萬元</li>"));
        assert!(!html.contains("**裁罰結果**"));
        assert!(!html.contains("<script>x</script>"));
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
    }

    #[test]
    fn test_rendered_page_without_sources_warns() {
        let renderer = PageRenderer::new().unwrap();
        let ok = Ok(response("只有答案", vec![]));
        let html = renderer
            .render_page(&build_page(&form("問題"), &status(), Some(&ok)))
            .unwrap();

        assert!(html.contains("未找到參考來源"));
        assert!(html.contains("只有答案"));
        assert!(html.contains("notice success"));
    }

    #[test]
    fn test_rendered_examples_link_to_prefill() {
        let renderer = PageRenderer::new().unwrap();
        let html = renderer
            .render_page(&build_page(&FormState::default(), &status(), None))
            .unwrap();

        // Handlebars escapes '=' inside attributes
        assert!(html.contains("/?question&#x3D;%E9%81%95"));
        assert!(html.contains(EXAMPLE_QUESTIONS[0]));
    }
}
