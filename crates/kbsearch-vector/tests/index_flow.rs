use std::path::PathBuf;
use std::sync::Arc;

use kbsearch_core::config::KeywordSettings;
use kbsearch_core::error::Error;
use kbsearch_core::traits::{Embedder, VectorSearchProvider};
use kbsearch_core::types::{ContentType, SourceKind, VectorMode};
use kbsearch_embed::{prepare_text, HashEmbedder};
use kbsearch_store::{KeywordSearch, KnowledgeStore};
use kbsearch_vector::{collect_documents, sync_store, LanceVectorIndex, LanceVectorProvider};

const DIM: usize = 64;

fn demo_store() -> KnowledgeStore {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).ancestors().nth(2).unwrap().to_path_buf();
    KnowledgeStore::load_dir(&root.join("demo_data/kb")).expect("demo store")
}

#[tokio::test]
async fn upsert_search_remove_round_trip() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let uri = tmp.path().to_string_lossy().to_string();
    let index = LanceVectorIndex::open(&uri, "documents", DIM).await?;
    assert_eq!(index.count(None).await?, 0);
    assert!(index.search(vec![0.1; DIM], 5, None).await?.is_empty(), "empty table yields no hits");

    let store = demo_store();
    let embedder = HashEmbedder::new(DIM);
    let docs = collect_documents(&store);
    let texts: Vec<String> = docs.iter().map(|d| prepare_text(&d.content, 512)).collect();
    let vectors = embedder.embed_batch(&texts)?;
    index.upsert(&docs, &vectors).await?;
    assert_eq!(index.count(None).await?, docs.len());

    // Upserting the same ids again replaces instead of duplicating.
    index.upsert(&docs, &vectors).await?;
    assert_eq!(index.count(None).await?, docs.len());

    let query = embedder.embed_batch(&[docs[0].content.clone()])?.remove(0);
    let hits = index.search(query.clone(), 3, None).await?;
    assert!(!hits.is_empty() && hits.len() <= 3);
    assert_eq!(hits[0].identity_key().to_string(), docs[0].id, "a document is its own nearest neighbour");
    assert!(hits.iter().all(|h| h.source == SourceKind::Semantic && (0.0..=1.0).contains(&h.score)));
    for pair in hits.windows(2) { assert!(pair[0].score >= pair[1].score); }

    let only_segments = index.search(query, 10, Some(ContentType::Segment)).await?;
    assert!(!only_segments.is_empty());
    assert!(only_segments.iter().all(|h| h.content_type() == ContentType::Segment));
    assert!(only_segments.iter().all(|h| h.metadata.contains_key("session_title")));

    index.remove_record(ContentType::Session, 1).await?;
    assert_eq!(index.count(None).await?, docs.len() - 1);
    let again = index.remove_record(ContentType::Session, 1).await.expect_err("already removed");
    assert!(matches!(again.downcast_ref::<Error>(), Some(Error::NotFound(_))), "{again}");
    assert_eq!(index.count(None).await?, docs.len() - 1);
    let stats = index.stats().await?;
    assert_eq!(stats.total_documents, docs.len() - 1);
    assert_eq!(stats.sessions + stats.segments, stats.total_documents);
    assert_eq!(stats.dim, DIM);
    Ok(())
}

#[tokio::test]
async fn resync_skips_unchanged_and_drops_missing() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let uri = tmp.path().to_string_lossy().to_string();
    let index = LanceVectorIndex::open(&uri, "documents", DIM).await?;
    let embedder = HashEmbedder::new(DIM);
    let store = demo_store();

    let first = sync_store(&index, &store, &embedder, 512).await?;
    assert_eq!(first.indexed, collect_documents(&store).len());
    assert_eq!(first.skipped, 0);

    let second = sync_store(&index, &store, &embedder, 512).await?;
    assert_eq!(second.indexed, 0);
    assert_eq!(second.skipped, first.indexed);

    let empty = KnowledgeStore::new();
    let third = sync_store(&index, &empty, &embedder, 512).await?;
    assert_eq!(third.removed, first.indexed);
    assert_eq!(index.count(None).await?, 0);
    Ok(())
}

// Plain #[test]: the provider owns its own runtime.
#[test]
fn provider_semantic_and_hybrid_modes() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = Arc::new(demo_store());
    let provider = LanceVectorProvider::open(tmp.path(), "documents", Box::new(HashEmbedder::new(DIM)), 512)?;
    provider.sync(&store)?;
    assert!(provider.is_available());

    let semantic = provider.vector_search("肩部疼痛", VectorMode::Semantic, 4)?;
    assert!(!semantic.is_empty() && semantic.len() <= 4);
    assert!(semantic.iter().all(|c| c.source == SourceKind::Semantic));

    let keyword = Arc::new(KeywordSearch::new(store.clone(), KeywordSettings::default()));
    let provider = provider.with_keyword(keyword);
    let hybrid = provider.vector_search("疼痛", VectorMode::Hybrid, 6)?;
    assert!(hybrid.len() <= 6);
    let mut keys: Vec<String> = hybrid.iter().map(|c| c.identity_key().to_string()).collect();
    let n = keys.len();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), n, "hybrid output is unique per identity");
    for pair in hybrid.windows(2) { assert!(pair[0].score >= pair[1].score); }

    assert_eq!(provider.stats()?.total_documents, collect_documents(&store).len());
    Ok(())
}
