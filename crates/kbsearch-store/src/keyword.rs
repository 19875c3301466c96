use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use kbsearch_core::config::KeywordSettings;
use kbsearch_core::error::Error;
use kbsearch_core::traits::KeywordSearchProvider;
use kbsearch_core::types::{Candidate, ContentRef, SourceKind};

use crate::records::{iso_datetime, Segment, Session, Tag};
use crate::store::KnowledgeStore;

/// Substring search over sessions, segments and tag names with fixed
/// heuristic scores (session > segment > tag-derived segment).
pub struct KeywordSearch {
    store: Arc<KnowledgeStore>,
    settings: KeywordSettings,
}

/// Split a result budget between sessions and segments so both kinds can
/// appear under a small limit. A limit of one goes to sessions.
pub fn split_limit(limit: usize) -> (usize, usize) {
    let sessions = match limit {
        0 => 0,
        1 => 1,
        n => n / 2,
    };
    (sessions, limit - sessions)
}

struct Needle<'q> {
    raw: &'q str,
    folded: String,
    case_sensitive: bool,
}

impl<'q> Needle<'q> {
    fn new(raw: &'q str, case_sensitive: bool) -> Self { Self { raw, folded: raw.to_ascii_lowercase(), case_sensitive } }

    // ASCII-only folding mirrors SQL LIKE; CJK text is compared as-is.
    fn found_in(&self, haystack: &str) -> bool {
        if self.case_sensitive { haystack.contains(self.raw) } else { haystack.to_ascii_lowercase().contains(&self.folded) }
    }

    fn found_in_opt(&self, haystack: Option<&str>) -> bool { haystack.is_some_and(|h| self.found_in(h)) }
}

impl KeywordSearch {
    pub fn new(store: Arc<KnowledgeStore>, settings: KeywordSettings) -> Self { Self { store, settings } }

    pub fn store(&self) -> &KnowledgeStore { &self.store }

    pub fn search(&self, query: &str, limit: usize) -> Vec<Candidate> {
        let mut results = Vec::new();
        if limit == 0 { return results; }
        let needle = Needle::new(query, self.settings.case_sensitive);
        let (session_limit, segment_limit) = split_limit(limit);

        results.extend(
            self.store
                .sessions()
                .filter(|s| needle.found_in(&s.title) || needle.found_in_opt(s.overview.as_deref()))
                .take(session_limit)
                .map(|s| self.session_candidate(s)),
        );

        let mut emitted: HashSet<i64> = HashSet::new();
        for (segment, session) in self
            .store
            .segments()
            .filter(|g| needle.found_in_opt(g.title.as_deref()) || needle.found_in_opt(g.content.as_deref()))
            .filter_map(|g| self.store.session(g.session_id).map(|s| (g, s)))
            .take(segment_limit)
        {
            emitted.insert(segment.id);
            results.push(self.segment_candidate(segment, &session.title, self.settings.segment_score));
        }

        if results.len() < limit {
            let tags: Vec<&Tag> = self.store.tags().filter(|t| needle.found_in(&t.name)).take(self.settings.max_tags).collect();
            for tag in tags {
                let remaining = limit - results.len();
                if remaining == 0 { break; }
                let tagged: Vec<&Segment> = self.store.segments_tagged(tag.id).filter(|g| !emitted.contains(&g.id)).take(remaining.max(1)).collect();
                for segment in tagged {
                    emitted.insert(segment.id);
                    let session_title = self.store.session(segment.session_id).map(|s| s.title.as_str()).unwrap_or("");
                    results.push(self.segment_candidate(segment, session_title, self.settings.tag_score).with_meta("matched_tag", tag.name.clone()));
                }
            }
        }

        results.truncate(limit);
        debug!(query, limit, hits = results.len(), "keyword search");
        results
    }

    fn session_candidate(&self, session: &Session) -> Candidate {
        let date = session.date.as_ref().map(iso_datetime);
        Candidate::new(
            SourceKind::Keyword,
            ContentRef::session(session.id),
            session.title.clone(),
            session.overview.clone().unwrap_or_default(),
            self.settings.session_score,
        )
        .with_meta("session_id", session.id)
        .with_meta("date", date)
        .with_meta("tags", self.store.tag_names(&session.tag_ids))
    }

    fn segment_candidate(&self, segment: &Segment, session_title: &str, score: f32) -> Candidate {
        Candidate::new(
            SourceKind::Keyword,
            ContentRef::segment(segment.id, segment.session_id, session_title),
            segment.display_title(),
            segment.content.clone().unwrap_or_default(),
            score,
        )
        .with_meta("segment_id", segment.id)
        .with_meta("session_id", segment.session_id)
        .with_meta("session_title", session_title)
        .with_meta("tags", self.store.tag_names(&segment.tag_ids))
    }
}

impl KeywordSearchProvider for KeywordSearch {
    fn keyword_search(&self, query: &str, limit: usize) -> anyhow::Result<Vec<Candidate>> {
        let query = query.trim();
        if query.is_empty() { return Err(Error::EmptyQuery.into()); }
        Ok(self.search(query, limit))
    }
}
