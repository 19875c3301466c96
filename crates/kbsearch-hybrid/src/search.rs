use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, error, warn};

use kbsearch_core::config::Settings;
use kbsearch_core::error::Error;
use kbsearch_core::traits::{KeywordSearchProvider, VectorSearchProvider};
use kbsearch_core::types::{Candidate, SearchResponse, Strategy, VectorMode};

use crate::format::Formatter;
use crate::merge::merge;
use crate::strategy::StrategySelector;

/// Half of `limit`, but never zero, so both providers contribute.
pub fn half_limit(limit: usize) -> usize { (limit / 2).max(1) }

/// Entry point for a search request: choose a strategy, run the providers it
/// needs, merge and format. Provider failures degrade to keyword-only search
/// and are reported in the response rather than returned as errors.
pub struct UnifiedSearch {
    keyword: Arc<dyn KeywordSearchProvider>,
    vector: Arc<dyn VectorSearchProvider>,
    vector_enabled: bool,
    selector: StrategySelector,
    formatter: Formatter,
    default_limit: usize,
}

impl UnifiedSearch {
    /// Vector availability is sampled here, once.
    pub fn new(keyword: Arc<dyn KeywordSearchProvider>, vector: Arc<dyn VectorSearchProvider>, settings: &Settings) -> Self {
        let vector_enabled = settings.vector.enabled && vector.is_available();
        debug!(vector_enabled, "unified search ready");
        Self {
            keyword,
            vector,
            vector_enabled,
            selector: StrategySelector::new(settings.strategy.clone()),
            formatter: Formatter::new(settings.search.preview_chars),
            default_limit: settings.search.default_limit,
        }
    }

    pub fn vector_enabled(&self) -> bool { self.vector_enabled }

    pub fn search(&self, query: &str, context: Option<&str>, limit: Option<usize>) -> SearchResponse {
        let query = query.trim();
        if query.is_empty() {
            return SearchResponse::new(Vec::new(), Strategy::None, query, self.vector_enabled);
        }
        let limit = limit.unwrap_or(self.default_limit);
        let strategy = self.selector.select(query, context, self.vector_enabled);
        debug!(query, ?context, limit, %strategy, "search strategy selected");

        match self.execute(strategy, query, limit) {
            Ok(candidates) => SearchResponse::new(self.formatter.format(candidates), strategy, query, self.vector_enabled),
            Err(err) => {
                match err.downcast_ref::<Error>() {
                    Some(Error::ProviderUnavailable(reason)) => warn!(query, %strategy, reason, "vector provider unavailable; falling back"),
                    _ => warn!(query, %strategy, error = %err, "search failed; falling back to keyword search"),
                }
                self.fallback(query, limit, err.to_string())
            }
        }
    }

    fn execute(&self, strategy: Strategy, query: &str, limit: usize) -> Result<Vec<Candidate>> {
        match strategy {
            Strategy::VectorEnhanced => self.vector_enhanced(query, limit),
            Strategy::VectorPrimary => self.vector_primary(query, limit),
            _ => self.traditional(query, limit),
        }
    }

    fn traditional(&self, query: &str, limit: usize) -> Result<Vec<Candidate>> {
        let mut results = merge(self.keyword.keyword_search(query, limit)?, Vec::new());
        results.truncate(limit);
        Ok(results)
    }

    fn vector_enhanced(&self, query: &str, limit: usize) -> Result<Vec<Candidate>> {
        let half = half_limit(limit);
        let keyword = self.keyword.keyword_search(query, half)?;
        let vector = self.vector.vector_search(query, VectorMode::Semantic, half)?;
        let mut results = merge(keyword, vector);
        results.truncate(limit);
        Ok(results)
    }

    fn vector_primary(&self, query: &str, limit: usize) -> Result<Vec<Candidate>> {
        let vector = self.vector.vector_search(query, VectorMode::Hybrid, limit)?;
        let mut results = if vector.len() < limit / 2 {
            let backfill = self.keyword.keyword_search(query, limit - vector.len())?;
            debug!(vector = vector.len(), keyword = backfill.len(), "vector results thin; added keyword hits");
            merge(vector, backfill)
        } else {
            merge(vector, Vec::new())
        };
        results.truncate(limit);
        Ok(results)
    }

    fn fallback(&self, query: &str, limit: usize, cause: String) -> SearchResponse {
        match self.traditional(query, limit) {
            Ok(candidates) => {
                SearchResponse::new(self.formatter.format(candidates), Strategy::TraditionalFallback, query, self.vector_enabled).with_error(cause)
            }
            Err(err) => {
                error!(query, error = %err, "keyword fallback failed too");
                SearchResponse::new(Vec::new(), Strategy::Error, query, self.vector_enabled).with_error(err.to_string())
            }
        }
    }
}
