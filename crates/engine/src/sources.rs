//! Citation extraction.
//!
//! Turns the grounding chunks of a raw response into user-facing sources,
//! replacing internal document ids with the original filenames.

use crate::store::StoreInfo;
use crate::types::Source;
use fsc_llm::GroundingChunk;

/// Maximum excerpt length, in characters.
pub const MAX_EXCERPT_CHARS: usize = 500;

/// Title used when a chunk carries neither a title nor a URI.
pub const UNKNOWN_DOCUMENT: &str = "未知文件";

/// Map grounding chunks to sources, preserving the service's order.
///
/// Unmapped document ids are shown as-is; this is a degraded but valid
/// result, so it is logged rather than reported as an error.
///
/// # Arguments
/// * `chunks` - Grounding chunks in the order the service cited them
/// * `store` - Metadata holding the id-to-filename mapping
///
/// # Returns
/// One `Source` per chunk, ranked from 1, with excerpts cut to
/// `MAX_EXCERPT_CHARS` characters.
pub fn extract_sources(chunks: &[GroundingChunk], store: &StoreInfo) -> Vec<Source> {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let document_id = chunk.document_id();

            let title = match document_id {
                Some(id) => match store.resolve_filename(id) {
                    Some(filename) => filename.to_string(),
                    None => {
                        tracing::warn!(document_id = id, "No filename mapping for document");
                        id.to_string()
                    }
                },
                None => UNKNOWN_DOCUMENT.to_string(),
            };

            Source {
                title,
                excerpt: truncate_excerpt(chunk.text.as_deref().unwrap_or(""), MAX_EXCERPT_CHARS),
                rank: i + 1,
                document_id: document_id.map(str::to_string),
            }
        })
        .collect()
}

/// Truncate to `max_chars` characters, appending an ellipsis when cut.
pub fn truncate_excerpt(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
    }
}
