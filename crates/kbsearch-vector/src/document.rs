use kbsearch_core::types::ContentType;
use kbsearch_store::records::{iso_datetime, Segment, Session};
use kbsearch_store::KnowledgeStore;

/// One row of the vector index, derived from a session or segment.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDocument {
    pub id: String,
    pub content_type: ContentType,
    pub session_id: i64,
    pub segment_id: Option<i64>,
    pub title: String,
    pub session_title: String,
    pub segment_type: Option<String>,
    pub tags: String,
    pub tag_categories: String,
    pub date: Option<String>,
    pub content: String,
    pub content_hash: String,
}

pub fn document_id(content_type: ContentType, id: i64) -> String { format!("{}_{}", content_type.as_str(), id) }

fn content_hash(s: &str) -> String { blake3::hash(s.as_bytes()).to_hex().to_string() }

fn non_empty(s: Option<&str>) -> Option<&str> { s.filter(|v| !v.trim().is_empty()) }

impl IndexDocument {
    /// Sessions are indexed by title and overview; no overview, no row.
    pub fn from_session(store: &KnowledgeStore, session: &Session) -> Option<Self> {
        let overview = non_empty(session.overview.as_deref())?;
        let content = format!("{}\n\n{}", session.title, overview);
        Some(Self {
            id: document_id(ContentType::Session, session.id),
            content_type: ContentType::Session,
            session_id: session.id,
            segment_id: None,
            title: session.title.clone(),
            session_title: session.title.clone(),
            segment_type: None,
            tags: store.tag_names(&session.tag_ids),
            tag_categories: store.tag_categories(&session.tag_ids),
            date: session.date.as_ref().map(iso_datetime),
            content_hash: content_hash(&content),
            content,
        })
    }

    /// Segments are indexed by title and content; empty segments are skipped.
    pub fn from_segment(store: &KnowledgeStore, segment: &Segment) -> Option<Self> {
        let body = non_empty(segment.content.as_deref())?;
        let content = format!("{}\n\n{}", segment.title.as_deref().unwrap_or(""), body);
        let session_title = store.session(segment.session_id).map(|s| s.title.clone()).unwrap_or_default();
        Some(Self {
            id: document_id(ContentType::Segment, segment.id),
            content_type: ContentType::Segment,
            session_id: segment.session_id,
            segment_id: Some(segment.id),
            title: segment.display_title(),
            session_title,
            segment_type: segment.segment_type.clone(),
            tags: store.tag_names(&segment.tag_ids),
            tag_categories: store.tag_categories(&segment.tag_ids),
            date: None,
            content_hash: content_hash(&content),
            content,
        })
    }
}

/// All indexable documents of the store: sessions first, then segments.
pub fn collect_documents(store: &KnowledgeStore) -> Vec<IndexDocument> {
    let sessions = store.sessions().filter_map(|s| IndexDocument::from_session(store, s));
    let segments = store.segments().filter_map(|g| IndexDocument::from_segment(store, g));
    sessions.chain(segments).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbsearch_store::records::Snapshot;

    fn store() -> KnowledgeStore {
        let snapshot: Snapshot = serde_json::from_value(serde_json::json!({
            "tags": [{"id": 1, "name": "肩頸", "category": "位置"}],
            "sessions": [
                {"id": 1, "title": "肩部評估", "date": "2024-03-01T10:00:00.5", "overview": "常見原因", "tag_ids": [1]},
                {"id": 2, "title": "沒有概述"}
            ],
            "segments": [
                {"id": 5, "session_id": 1, "content": "觸診", "segment_type": "treatment"},
                {"id": 6, "session_id": 1, "title": "空白", "content": "   "}
            ]
        }))
        .unwrap();
        KnowledgeStore::from_snapshot(snapshot).unwrap()
    }

    #[test]
    fn skips_records_without_text() {
        let docs = collect_documents(&store());
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["session_1", "segment_5"]);
    }

    #[test]
    fn content_joins_title_and_body() {
        let docs = collect_documents(&store());
        assert_eq!(docs[0].content, "肩部評估\n\n常見原因");
        assert_eq!(docs[0].tags, "肩頸");
        assert_eq!(docs[0].tag_categories, "位置");
        assert_eq!(docs[0].date.as_deref(), Some("2024-03-01T10:00:00.500000"));
        assert_eq!(docs[1].content, "\n\n觸診");
        assert_eq!(docs[1].title, "段落 5");
        assert_eq!(docs[1].session_title, "肩部評估");
        assert_eq!(docs[1].content_hash.len(), 64);
    }
}
