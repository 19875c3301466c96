use kbsearch_core::config::VectorSettings;
use kbsearch_embed::{default_embedder, HashEmbedder, EMBEDDING_DIM};
use kbsearch_core::traits::Embedder;

#[test]
fn fake_embedder_shapes_and_determinism() {
    // Avoid loading the real model
    let settings = VectorSettings { fake_embeddings: true, ..VectorSettings::default() };
    let embedder = default_embedder(&settings).expect("embedder");
    let texts = vec!["肩部疼痛 評估".to_string(), "肩部疼痛 評估".to_string()];
    let embs = embedder.embed_batch(&texts).expect("embed_batch");
    let (v1, v2) = (&embs[0], &embs[1]);

    assert_eq!(v1.len(), EMBEDDING_DIM);
    assert_eq!(embedder.dim(), EMBEDDING_DIM);

    let norm: f32 = v1.iter().map(|x| x * x).sum::<f32>().sqrt();
    assert!((norm - 1.0).abs() <= 1e-3, "vector is L2-normalized (norm={norm})");

    for (a, b) in v1.iter().zip(v2.iter()) { assert!((a - b).abs() <= 1e-6); }
}

#[test]
fn empty_text_embeds_to_finite_vector() {
    let e = HashEmbedder::new(64);
    let v = e.embed_batch(&[String::new()]).expect("embed");
    assert_eq!(v[0].len(), 64);
    assert!(v[0].iter().all(|x| x.is_finite()));
}

#[test]
fn masked_mean_ignores_padding_rows() {
    use candle_core::{DType, Device, Tensor};
    use kbsearch_embed::masked_mean_l2;

    let dev = Device::Cpu;
    // Batch of two; the second sequence has a padded last token.
    let h = Tensor::from_slice(&[3.0f32, 4.0, 100.0, 100.0, 0.0, 2.0, 9.0, 9.0], (2, 2, 2), &dev).unwrap();
    let mask = Tensor::from_slice(&[1i64, 1, 1, 0], (2, 2), &dev).unwrap().to_dtype(DType::F32).unwrap();
    let out: Vec<Vec<f32>> = masked_mean_l2(&h, &mask).unwrap().to_vec2().unwrap();

    let first_norm = (51.5f32 * 51.5 + 52.0 * 52.0).sqrt();
    assert!((out[0][0] - 51.5 / first_norm).abs() < 1e-5);
    assert!((out[1][0] - 0.0).abs() < 1e-6);
    assert!((out[1][1] - 1.0).abs() < 1e-6);
}
