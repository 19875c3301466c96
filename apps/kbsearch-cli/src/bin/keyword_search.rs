use std::env;
use std::path::PathBuf;

use kbsearch_core::config::Config;
use kbsearch_core::traits::KeywordSearchProvider;
use kbsearch_store::{KeywordSearch, KnowledgeStore};

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <query> [--limit N] [store_dir]", args[0]);
        eprintln!("Example: {} '肩部疼痛' --limit 5 ./demo_data/kb", args[0]);
        std::process::exit(1);
    }
    let settings = Config::load()?.settings()?;
    let query = &args[1];
    let mut limit = settings.search.default_limit;
    let mut store_dir = settings.data.store_path(&env::current_dir()?);
    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--limit" => match args.get(i + 1).and_then(|v| v.parse::<usize>().ok()) {
                Some(l) => { limit = l; i += 1; }
                None => { eprintln!("Error: --limit requires a number"); std::process::exit(1); }
            },
            other if !other.starts_with('-') => store_dir = PathBuf::from(other),
            _ => {}
        }
        i += 1;
    }

    println!("kbsearch-keyword\n================");
    println!("Query: {}", query);
    println!("Store: {}", store_dir.display());
    let store = KnowledgeStore::load_dir(&store_dir)?;
    let engine = KeywordSearch::new(store.into(), settings.keyword);
    let hits = engine.keyword_search(query, limit)?;
    println!("\nFound {} results for: \"{}\"", hits.len(), query);
    for (n, hit) in hits.iter().enumerate() {
        println!("\n  {}. score={:.2}  {}  {}", n + 1, hit.score, hit.identity_key(), hit.title);
        if let Some(tag) = hit.metadata.get("matched_tag") { println!("     tag: {}", tag); }
        let preview: String = hit.body.chars().take(80).collect();
        println!("     {}", preview);
    }
    Ok(())
}
