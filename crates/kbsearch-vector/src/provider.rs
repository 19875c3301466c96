use anyhow::{anyhow, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{debug, info};

use kbsearch_core::traits::{Embedder, KeywordSearchProvider, VectorSearchProvider};
use kbsearch_core::types::{Candidate, ContentType, IdentityKey, VectorMode};
use kbsearch_embed::prepare_text;
use kbsearch_store::KnowledgeStore;

use crate::index::{IndexStats, LanceVectorIndex};
use crate::sync::{sync_store, SyncReport};

/// Vector search over a LanceDB table with a loaded embedder.
///
/// Owns a Tokio runtime and blocks on it, so it must not be called from
/// inside another runtime.
pub struct LanceVectorProvider {
    runtime: Runtime,
    index: LanceVectorIndex,
    embedder: Box<dyn Embedder>,
    keyword: Option<Arc<dyn KeywordSearchProvider>>,
    max_chars: usize,
}

impl LanceVectorProvider {
    pub fn open(path: &Path, table: &str, embedder: Box<dyn Embedder>, max_chars: usize) -> Result<Self> {
        let runtime = Runtime::new()?;
        let uri = path.to_string_lossy().to_string();
        let index = runtime.block_on(LanceVectorIndex::open(&uri, table, embedder.dim()))?;
        info!(uri, table, dim = embedder.dim(), "vector provider ready");
        Ok(Self { runtime, index, embedder, keyword: None, max_chars })
    }

    /// Attach the keyword provider used by hybrid mode.
    pub fn with_keyword(mut self, keyword: Arc<dyn KeywordSearchProvider>) -> Self {
        self.keyword = Some(keyword);
        self
    }

    fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        let text = prepare_text(query, self.max_chars);
        self.embedder.embed_batch(&[text])?.into_iter().next().ok_or_else(|| anyhow!("embedder returned no vector"))
    }

    pub fn semantic_search(&self, query: &str, limit: usize, content_type: Option<ContentType>) -> Result<Vec<Candidate>> {
        let vector = self.embed_query(query)?;
        let hits = self.runtime.block_on(self.index.search(vector, limit, content_type))?;
        debug!(query, limit, hits = hits.len(), "semantic search");
        Ok(hits)
    }

    fn hybrid_search(&self, query: &str, limit: usize) -> Result<Vec<Candidate>> {
        let mut all = self.semantic_search(query, limit, None)?;
        if let Some(keyword) = &self.keyword {
            all.extend(keyword.keyword_search(query, limit)?);
        }
        Ok(rank_unique(all, limit))
    }

    pub fn sync(&self, store: &KnowledgeStore) -> Result<SyncReport> {
        self.runtime.block_on(sync_store(&self.index, store, self.embedder.as_ref(), self.max_chars))
    }

    pub fn remove_record(&self, content_type: ContentType, id: i64) -> Result<()> {
        self.runtime.block_on(self.index.remove_record(content_type, id))
    }

    pub fn stats(&self) -> Result<IndexStats> { self.runtime.block_on(self.index.stats()) }
}

/// Sort by score (stable) and keep the best-scoring entry per identity.
fn rank_unique(mut all: Vec<Candidate>, limit: usize) -> Vec<Candidate> {
    all.sort_by(|a, b| b.score.total_cmp(&a.score));
    let mut seen = std::collections::HashSet::<IdentityKey>::new();
    all.retain(|c| seen.insert(c.identity_key()));
    all.truncate(limit);
    all
}

impl VectorSearchProvider for LanceVectorProvider {
    fn is_available(&self) -> bool { true }

    fn vector_search(&self, query: &str, mode: VectorMode, limit: usize) -> Result<Vec<Candidate>> {
        match mode {
            VectorMode::Semantic => self.semantic_search(query, limit, None),
            VectorMode::Hybrid => self.hybrid_search(query, limit),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::rank_unique;
    use kbsearch_core::types::{Candidate, ContentRef, SourceKind};

    #[test]
    fn rank_unique_keeps_highest_score_per_identity() {
        let all = vec![
            Candidate::new(SourceKind::Semantic, ContentRef::session(5), "s5", "", 0.95),
            Candidate::new(SourceKind::Keyword, ContentRef::session(5), "s5", "", 0.8),
            Candidate::new(SourceKind::Keyword, ContentRef::segment(9, 5, "s5"), "g9", "", 0.7),
        ];
        let ranked = rank_unique(all, 10);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].source, SourceKind::Semantic);
        assert!((ranked[0].score - 0.95).abs() < 1e-6);
    }
}
