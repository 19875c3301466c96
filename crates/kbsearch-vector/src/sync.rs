use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::collections::HashSet;
use tracing::info;

use kbsearch_core::traits::Embedder;
use kbsearch_embed::prepare_text;
use kbsearch_store::KnowledgeStore;

use crate::document::{collect_documents, IndexDocument};
use crate::index::LanceVectorIndex;

const EMBED_BATCH: usize = 32;

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SyncReport {
    pub indexed: usize,
    pub skipped: usize,
    pub removed: usize,
}

/// Bring the index in line with the store: embed new or changed documents,
/// leave rows whose content hash is unchanged, drop rows the store no longer has.
pub async fn sync_store(index: &LanceVectorIndex, store: &KnowledgeStore, embedder: &dyn Embedder, max_chars: usize) -> Result<SyncReport> {
    let docs = collect_documents(store);
    let existing = index.content_hashes().await?;
    let live: HashSet<&str> = docs.iter().map(|d| d.id.as_str()).collect();
    let stale: Vec<String> = existing.keys().filter(|id| !live.contains(id.as_str())).cloned().collect();
    let pending: Vec<&IndexDocument> = docs.iter().filter(|d| existing.get(&d.id) != Some(&d.content_hash)).collect();

    let mut report = SyncReport { skipped: docs.len() - pending.len(), removed: stale.len(), ..SyncReport::default() };
    index.remove(&stale).await?;

    if !pending.is_empty() {
        info!(documents = pending.len(), "embedding documents");
        let pb = ProgressBar::new(pending.len() as u64);
        pb.set_style(ProgressStyle::default_bar().template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} docs ({percent}%) {msg}")?.progress_chars("#>-"));
        for chunk in pending.chunks(EMBED_BATCH) {
            let texts: Vec<String> = chunk.iter().map(|d| prepare_text(&d.content, max_chars)).collect();
            let vectors = embedder.embed_batch(&texts)?;
            let owned: Vec<IndexDocument> = chunk.iter().map(|d| (*d).clone()).collect();
            index.upsert(&owned, &vectors).await?;
            report.indexed += chunk.len();
            pb.set_position(report.indexed as u64);
        }
        pb.finish_with_message("done");
    }
    info!(indexed = report.indexed, skipped = report.skipped, removed = report.removed, "vector index synced");
    Ok(report)
}
