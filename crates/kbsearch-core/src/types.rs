//! Domain types passed between the keyword provider, the vector provider and
//! the unified search orchestrator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

pub type Meta = BTreeMap<String, serde_json::Value>;

/// Number of body characters folded into the fallback identity digest.
pub const IDENTITY_PREFIX_CHARS: usize = 50;

/// The kind of knowledge-base record a result points at.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Session,
    Segment,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Session => "session",
            ContentType::Segment => "segment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "session" => Some(ContentType::Session),
            "segment" => Some(ContentType::Segment),
            _ => None,
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Indicates which provider produced a candidate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Keyword,
    Semantic,
}

/// How the vector provider should answer a query.
///
/// `Semantic` returns nearest neighbours only; `Hybrid` lets the provider mix
/// in its own keyword pass before ranking.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VectorMode {
    Semantic,
    Hybrid,
}

/// The strategy label reported back to callers.
///
/// Only the first three are ever selected up front; the rest describe how a
/// call ended (fallback, failure, or short-circuit on an empty query).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Traditional,
    VectorEnhanced,
    VectorPrimary,
    TraditionalFallback,
    Error,
    None,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Traditional => "traditional",
            Strategy::VectorEnhanced => "vector_enhanced",
            Strategy::VectorPrimary => "vector_primary",
            Strategy::TraditionalFallback => "traditional_fallback",
            Strategy::Error => "error",
            Strategy::None => "none",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// What a candidate refers to. Ids are optional because vector index rows
/// written by older tooling may not carry them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "content_type", rename_all = "snake_case")]
pub enum ContentRef {
    Session {
        session_id: Option<i64>,
    },
    Segment {
        segment_id: Option<i64>,
        session_id: Option<i64>,
        session_title: String,
    },
}

impl ContentRef {
    pub fn session(session_id: i64) -> Self { ContentRef::Session { session_id: Some(session_id) } }

    pub fn segment(segment_id: i64, session_id: i64, session_title: impl Into<String>) -> Self {
        ContentRef::Segment { segment_id: Some(segment_id), session_id: Some(session_id), session_title: session_title.into() }
    }

    pub fn content_type(&self) -> ContentType {
        match self {
            ContentRef::Session { .. } => ContentType::Session,
            ContentRef::Segment { .. } => ContentType::Segment,
        }
    }

    /// The numeric id of the record itself (not its parent).
    pub fn content_id(&self) -> Option<i64> {
        match self {
            ContentRef::Session { session_id } => *session_id,
            ContentRef::Segment { segment_id, .. } => *segment_id,
        }
    }
}

/// Deduplication key for candidates.
///
/// `Digest` is a best-effort key for records without a numeric id: two
/// different records sharing a title and a body prefix collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityKey {
    Record(ContentType, i64),
    Digest(ContentType, u64),
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKey::Record(kind, id) => write!(f, "{}_{}", kind, id),
            IdentityKey::Digest(kind, digest) => write!(f, "{}_~{:016x}", kind, digest),
        }
    }
}

/// A scored hit from one provider, alive only for the duration of a search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub source: SourceKind,
    #[serde(flatten)]
    pub content: ContentRef,
    pub title: String,
    pub body: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: Meta,
}

impl Candidate {
    pub fn new(source: SourceKind, content: ContentRef, title: impl Into<String>, body: impl Into<String>, score: f32) -> Self {
        Self { source, content, title: title.into(), body: body.into(), score, metadata: Meta::new() }
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn content_type(&self) -> ContentType { self.content.content_type() }

    pub fn identity_key(&self) -> IdentityKey {
        let kind = self.content_type();
        match self.content.content_id() {
            Some(id) => IdentityKey::Record(kind, id),
            None => {
                let mut hasher = XxHash64::with_seed(0);
                self.title.hash(&mut hasher);
                let prefix: String = self.body.chars().take(IDENTITY_PREFIX_CHARS).collect();
                prefix.hash(&mut hasher);
                IdentityKey::Digest(kind, hasher.finish())
            }
        }
    }
}

/// Content-type specific convenience fields of a [`UnifiedResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "content_type", rename_all = "snake_case")]
pub enum ResultDetail {
    Session {
        session_id: Option<i64>,
        session_title: String,
    },
    Segment {
        segment_id: Option<i64>,
        session_id: Option<i64>,
        session_title: String,
        segment_title: String,
    },
}

/// The public, provider-agnostic shape of one search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedResult {
    #[serde(flatten)]
    pub detail: ResultDetail,
    pub title: String,
    pub content_preview: String,
    pub score: f32,
    pub search_type: SourceKind,
    pub metadata: Meta,
}

impl UnifiedResult {
    pub fn content_type(&self) -> ContentType {
        match self.detail {
            ResultDetail::Session { .. } => ContentType::Session,
            ResultDetail::Segment { .. } => ContentType::Segment,
        }
    }

    pub fn content_id(&self) -> Option<i64> {
        match self.detail {
            ResultDetail::Session { session_id, .. } => session_id,
            ResultDetail::Segment { segment_id, .. } => segment_id,
        }
    }
}

/// The envelope returned by a unified search call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<UnifiedResult>,
    pub total_count: usize,
    pub search_strategy: Strategy,
    pub query: String,
    pub vector_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResponse {
    pub fn new(results: Vec<UnifiedResult>, strategy: Strategy, query: impl Into<String>, vector_enabled: bool) -> Self {
        Self { total_count: results.len(), results, search_strategy: strategy, query: query.into(), vector_enabled, error: None }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}
