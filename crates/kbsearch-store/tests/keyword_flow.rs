use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use kbsearch_core::config::KeywordSettings;
use kbsearch_core::traits::KeywordSearchProvider;
use kbsearch_core::types::ContentType;
use kbsearch_store::{KeywordSearch, KnowledgeStore};
use tempfile::TempDir;

fn demo_dir() -> PathBuf {
    // crates/kbsearch-store -> crates -> repo root
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).ancestors().nth(2).unwrap().to_path_buf();
    root.join("demo_data/kb")
}

#[test]
fn load_dir_reads_demo_snapshot() {
    let store = KnowledgeStore::load_dir(&demo_dir()).expect("load");
    assert_eq!(store.sessions().count(), 2);
    assert_eq!(store.segments().count(), 5);
    assert_eq!(store.tag_names(&[1, 2]), "肩頸,疼痛");
    let ordered: Vec<i64> = store.segments_of(1).iter().map(|s| s.id).collect();
    assert_eq!(ordered, vec![1, 2, 3]);
}

#[test]
fn load_dir_merges_files_and_rejects_duplicates() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("a.json"), r#"{"sessions": [{"id": 1, "title": "A"}]}"#).unwrap();
    fs::create_dir_all(tmp.path().join("nested")).unwrap();
    fs::write(tmp.path().join("nested/b.json"), r#"{"segments": [{"id": 7, "session_id": 1, "content": "alpha"}]}"#).unwrap();
    fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

    let store = KnowledgeStore::load_dir(tmp.path()).expect("merge");
    assert_eq!(store.segments_of(1).len(), 1);

    fs::write(tmp.path().join("c.json"), r#"{"sessions": [{"id": 1, "title": "again"}]}"#).unwrap();
    let err = KnowledgeStore::load_dir(tmp.path()).expect_err("duplicate id");
    assert!(format!("{err:#}").contains("duplicate session id 1"));
}

#[test]
fn unknown_tag_reference_is_a_load_error() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("kb.json");
    fs::write(&file, r#"{"sessions": [{"id": 1, "title": "A", "tag_ids": [42]}]}"#).unwrap();
    assert!(KnowledgeStore::load_file(&file).is_err());
}

#[test]
fn missing_dir_gives_empty_store() {
    let tmp = TempDir::new().unwrap();
    let store = KnowledgeStore::load_dir(&tmp.path().join("absent")).expect("empty");
    assert!(store.is_empty());
}

#[test]
fn keyword_provider_over_demo_data() {
    let store = Arc::new(KnowledgeStore::load_dir(&demo_dir()).expect("load"));
    let provider = KeywordSearch::new(store, KeywordSettings::default());

    let hits = provider.keyword_search("疼痛", 10).expect("search");
    assert!(!hits.is_empty());
    let sessions = hits.iter().filter(|h| h.content_type() == ContentType::Session).count();
    let segments = hits.iter().filter(|h| h.content_type() == ContentType::Segment).count();
    assert_eq!(sessions, 2);
    assert!(segments >= 1);
    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }

    let mut keys: Vec<String> = hits.iter().map(|h| h.identity_key().to_string()).collect();
    let before = keys.len();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), before, "keyword results carry distinct identities");

    let session = &hits[0];
    assert_eq!(session.metadata["session_id"], 1);
    assert_eq!(session.metadata["date"], "2024-03-01T10:00:00");
    assert_eq!(session.metadata["tags"], "肩頸,疼痛");
}

#[test]
fn small_limit_still_mixes_entity_types() {
    let store = Arc::new(KnowledgeStore::load_dir(&demo_dir()).expect("load"));
    let provider = KeywordSearch::new(store, KeywordSettings::default());
    let hits = provider.keyword_search("肩", 2).expect("search");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].content_type(), ContentType::Session);
    assert_eq!(hits[1].content_type(), ContentType::Segment);
}
