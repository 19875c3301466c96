use anyhow::Result;
use std::hash::{Hash, Hasher};
use twox_hash::XxHash64;

use kbsearch_core::traits::Embedder;

/// Deterministic, model-free embedder for tests and offline development.
///
/// Every whitespace token and every character contributes to a hashed bucket,
/// so texts sharing characters (including CJK text without spaces) end up
/// close to each other. Output vectors are L2-normalized.
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self { Self { dim: dim.max(1) } }

    fn bucket(&self, feature: &str) -> (usize, f32) {
        let mut hasher = XxHash64::with_seed(0);
        feature.hash(&mut hasher);
        let h = hasher.finish();
        let idx = (h % self.dim as u64) as usize;
        let weight = 0.5 + ((h >> 32) as u32 as f32) / (u32::MAX as f32);
        (idx, weight)
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        for token in text.split_whitespace() {
            let (idx, w) = self.bucket(token);
            v[idx] += w;
            let mut buf = [0u8; 4];
            for ch in token.chars() {
                let (idx, w) = self.bucket(ch.encode_utf8(&mut buf));
                v[idx] += w * 0.5;
            }
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt().max(1e-6);
        for x in &mut v { *x /= norm; }
        v
    }
}

impl Embedder for HashEmbedder {
    fn dim(&self) -> usize { self.dim }
    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> { Ok(texts.iter().map(|t| self.embed_text(t)).collect()) }
}

#[cfg(test)]
mod tests {
    use super::HashEmbedder;

    fn cosine(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

    #[test]
    fn shared_characters_increase_similarity() {
        let e = HashEmbedder::new(256);
        let q = e.embed_text("肩部疼痛");
        let near = e.embed_text("病人主訴肩部疼痛");
        let far = e.embed_text("收下巴運動");
        assert!(cosine(&q, &near) > cosine(&q, &far));
    }
}
