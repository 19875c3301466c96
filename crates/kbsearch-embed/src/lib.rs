//! kbsearch-embed
//!
//! Text embedders behind the `kbsearch_core::traits::Embedder` trait: a local
//! BGE-M3 model on candle, and a hash embedder for tests.
use anyhow::Result;
use tracing::info;

use kbsearch_core::config::VectorSettings;
use kbsearch_core::traits::Embedder;

pub mod device;
pub mod hash;
pub mod model;
pub mod pool;
pub mod preprocess;
pub mod tokenize;

pub use hash::HashEmbedder;
pub use model::{resolve_model_dir, BgeM3Embedder};
pub use pool::masked_mean_l2;
pub use preprocess::prepare_text;

/// BGE-M3 dense output width; the hash embedder uses the same width so both
/// can share one index schema.
pub const EMBEDDING_DIM: usize = 1024;

fn fake_requested_by_env() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS").ok().is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

/// Build the embedder the settings ask for. `APP_USE_FAKE_EMBEDDINGS=1`
/// forces the hash embedder regardless of settings.
pub fn default_embedder(settings: &VectorSettings) -> Result<Box<dyn Embedder>> {
    if settings.fake_embeddings || fake_requested_by_env() {
        info!("using hash embedder");
        return Ok(Box::new(HashEmbedder::new(EMBEDDING_DIM)));
    }
    let dir = resolve_model_dir(settings.model_dir.as_deref())?;
    Ok(Box::new(BgeM3Embedder::load(&dir)?))
}
