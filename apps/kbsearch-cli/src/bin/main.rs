use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use kbsearch_core::config::{Config, Settings};
use kbsearch_core::traits::{KeywordSearchProvider, NullVectorProvider, VectorSearchProvider};
use kbsearch_core::types::ContentType;
use kbsearch_embed::default_embedder;
use kbsearch_hybrid::UnifiedSearch;
use kbsearch_store::{KeywordSearch, KnowledgeStore};
use kbsearch_vector::LanceVectorProvider;

const USAGE: &str = "Usage: kbsearch <search|sync|status|remove> [args...]
  search <query> [--context C] [--limit N] [--keyword-only]
  sync
  status
  remove <session|segment> <id>";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn usage_exit(msg: &str) -> ! {
    eprintln!("Error: {}\n{}", msg, USAGE);
    std::process::exit(1)
}

struct SearchArgs {
    query: String,
    context: Option<String>,
    limit: Option<usize>,
    keyword_only: bool,
}

fn parse_search_args(args: &[String]) -> SearchArgs {
    let mut parsed = SearchArgs { query: String::new(), context: None, limit: None, keyword_only: false };
    let mut words = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--context" => match args.get(i + 1) {
                Some(c) => { parsed.context = Some(c.clone()); i += 1; }
                None => usage_exit("--context requires a value"),
            },
            "--limit" => match args.get(i + 1).and_then(|v| v.parse::<usize>().ok()) {
                Some(n) => { parsed.limit = Some(n); i += 1; }
                None => usage_exit("--limit requires a number"),
            },
            "--keyword-only" => parsed.keyword_only = true,
            other => words.push(other.to_string()),
        }
        i += 1;
    }
    parsed.query = words.join(" ");
    parsed
}

fn open_vector_provider(settings: &Settings, base: &Path) -> Result<LanceVectorProvider> {
    let embedder = default_embedder(&settings.vector)?;
    let path = settings.data.lancedb_path(base);
    std::fs::create_dir_all(&path)?;
    LanceVectorProvider::open(&path, &settings.data.table, embedder, settings.vector.max_chars)
}

/// Real provider when the model and index load, otherwise the null provider.
fn vector_or_null(settings: &Settings, base: &Path, keyword: Arc<dyn KeywordSearchProvider>) -> Arc<dyn VectorSearchProvider> {
    if !settings.vector.enabled {
        return Arc::new(NullVectorProvider::new("vector search disabled in config"));
    }
    match open_vector_provider(settings, base) {
        Ok(provider) => Arc::new(provider.with_keyword(keyword)),
        Err(e) => {
            warn!(error = %e, "vector search unavailable; using keyword search only");
            Arc::new(NullVectorProvider::new(e.to_string()))
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;
    let base: PathBuf = env::current_dir()?;

    let mut args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() { usage_exit("missing command"); }
    let cmd = args.remove(0);

    let store_dir = settings.data.store_path(&base);
    let store = Arc::new(KnowledgeStore::load_dir(&store_dir)?);

    match cmd.as_str() {
        "search" => {
            let search_args = parse_search_args(&args);
            let keyword: Arc<dyn KeywordSearchProvider> = Arc::new(KeywordSearch::new(store.clone(), settings.keyword.clone()));
            let vector = if search_args.keyword_only {
                Arc::new(NullVectorProvider::new("--keyword-only")) as Arc<dyn VectorSearchProvider>
            } else {
                vector_or_null(&settings, &base, keyword.clone())
            };
            let engine = UnifiedSearch::new(keyword, vector, &settings);
            let response = engine.search(&search_args.query, search_args.context.as_deref(), search_args.limit);
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        "sync" => {
            let provider = open_vector_provider(&settings, &base)?;
            let report = provider.sync(&store)?;
            info!(store = %store_dir.display(), "sync finished");
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        "status" => {
            let provider = open_vector_provider(&settings, &base)?;
            let stats = provider.stats()?;
            let status = serde_json::json!({
                "store": {
                    "path": store_dir.display().to_string(),
                    "sessions": store.sessions().count(),
                    "segments": store.segments().count(),
                    "tags": store.tags().count(),
                },
                "index": stats,
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        "remove" => {
            let kind = args.first().and_then(|k| ContentType::parse(k)).unwrap_or_else(|| usage_exit("remove needs session or segment"));
            let id = args.get(1).and_then(|v| v.parse::<i64>().ok()).ok_or_else(|| anyhow!("remove needs a numeric id"))?;
            let provider = open_vector_provider(&settings, &base)?;
            provider.remove_record(kind, id)?;
            println!("removed {}_{}", kind, id);
        }
        other => usage_exit(&format!("unknown command: {}", other)),
    }
    Ok(())
}
