use kbsearch_core::types::{Candidate, ContentRef, ResultDetail, UnifiedResult};

pub const PREVIEW_ELLIPSIS: &str = "...";

/// Turns ranked candidates into the public result shape.
#[derive(Debug, Clone)]
pub struct Formatter {
    preview_chars: usize,
}

impl Default for Formatter {
    fn default() -> Self { Self::new(200) }
}

impl Formatter {
    pub fn new(preview_chars: usize) -> Self { Self { preview_chars } }

    /// First `preview_chars` characters of `body`, with an ellipsis when cut.
    pub fn preview(&self, body: &str) -> String {
        match body.char_indices().nth(self.preview_chars) {
            Some((cut, _)) => format!("{}{}", &body[..cut], PREVIEW_ELLIPSIS),
            None => body.to_string(),
        }
    }

    pub fn format_one(&self, candidate: Candidate) -> UnifiedResult {
        let detail = match candidate.content {
            ContentRef::Session { session_id } => ResultDetail::Session { session_id, session_title: candidate.title.clone() },
            ContentRef::Segment { segment_id, session_id, session_title } => {
                ResultDetail::Segment { segment_id, session_id, session_title, segment_title: candidate.title.clone() }
            }
        };
        UnifiedResult {
            detail,
            content_preview: self.preview(&candidate.body),
            title: candidate.title,
            score: candidate.score,
            search_type: candidate.source,
            metadata: candidate.metadata,
        }
    }

    pub fn format(&self, candidates: Vec<Candidate>) -> Vec<UnifiedResult> { candidates.into_iter().map(|c| self.format_one(c)).collect() }
}
