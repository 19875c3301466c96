use std::sync::Arc;

use crate::error::Error;
use crate::types::{Candidate, VectorMode};

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Substring search over the structured knowledge store.
///
/// Implementations never return more than `limit` candidates and return an
/// empty list, not an error, when nothing matches.
pub trait KeywordSearchProvider: Send + Sync {
    fn keyword_search(&self, query: &str, limit: usize) -> anyhow::Result<Vec<Candidate>>;
}

/// Nearest-neighbour search over the embedding index.
pub trait VectorSearchProvider: Send + Sync {
    /// Whether the backend finished initializing. Checked once by callers.
    fn is_available(&self) -> bool;
    fn vector_search(&self, query: &str, mode: VectorMode, limit: usize) -> anyhow::Result<Vec<Candidate>>;
}

impl<T: KeywordSearchProvider + ?Sized> KeywordSearchProvider for Arc<T> {
    fn keyword_search(&self, query: &str, limit: usize) -> anyhow::Result<Vec<Candidate>> { (**self).keyword_search(query, limit) }
}

impl<T: VectorSearchProvider + ?Sized> VectorSearchProvider for Arc<T> {
    fn is_available(&self) -> bool { (**self).is_available() }
    fn vector_search(&self, query: &str, mode: VectorMode, limit: usize) -> anyhow::Result<Vec<Candidate>> { (**self).vector_search(query, mode, limit) }
}

/// Stand-in installed when the embedding model or index could not be loaded.
#[derive(Debug, Clone)]
pub struct NullVectorProvider {
    reason: String,
}

impl NullVectorProvider {
    pub fn new(reason: impl Into<String>) -> Self { Self { reason: reason.into() } }
}

impl Default for NullVectorProvider {
    fn default() -> Self { Self::new("vector search disabled") }
}

impl VectorSearchProvider for NullVectorProvider {
    fn is_available(&self) -> bool { false }

    fn vector_search(&self, _query: &str, _mode: VectorMode, _limit: usize) -> anyhow::Result<Vec<Candidate>> {
        Err(Error::ProviderUnavailable(self.reason.clone()).into())
    }
}
